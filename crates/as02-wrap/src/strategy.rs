//! 素材封装策略.
//!
//! 驱动只有一份, 图像与音频的差异集中在 [`EssenceStrategy`] 的实现里.

use log::{debug, warn};

use as02_core::{As02Error, As02Result, FrameBuffer};
use as02_format::{
    As02Jp2kWriter, As02PcmWriter, ContainerWriter, EssenceParser, J2kSequenceParser,
    PcmParserList,
};

use crate::options::WrapOptions;

/// 读取一帧后的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAction {
    /// 写入该帧
    Write,
    /// 停止循环 (不写入该帧)
    Stop,
}

/// 素材封装策略
pub trait EssenceStrategy {
    /// 解析器类型
    type Parser: EssenceParser;
    /// 写入器类型
    type Writer: ContainerWriter;

    /// 打开输入
    fn open_parser(options: &WrapOptions) -> As02Result<Self::Parser>;

    /// 帧缓冲区容量
    fn frame_capacity(parser: &Self::Parser, options: &WrapOptions) -> usize {
        parser.frame_capacity().unwrap_or(options.fb_size)
    }

    /// 创建写入器
    fn new_writer(options: &WrapOptions) -> Self::Writer;

    /// 容器打开后、写入第一帧之前调整头部元数据
    fn after_open(_writer: &mut Self::Writer, _options: &WrapOptions) -> As02Result<()> {
        Ok(())
    }

    /// 检查并调整刚读到的一帧
    fn prepare_frame(frame: &mut FrameBuffer, options: &WrapOptions) -> FrameAction;
}

/// JPEG 2000 图像素材
pub struct PictureEssence;

impl EssenceStrategy for PictureEssence {
    type Parser = J2kSequenceParser;
    type Writer = As02Jp2kWriter;

    fn open_parser(options: &WrapOptions) -> As02Result<Self::Parser> {
        let parser = J2kSequenceParser::open(&options.inputs, options.pedantic)?;
        debug!("JPEG 2000 序列: {} 个码流", parser.frame_count());
        Ok(parser)
    }

    fn new_writer(options: &WrapOptions) -> Self::Writer {
        As02Jp2kWriter::new(options.index_strategy, options.partition_space)
    }

    fn prepare_frame(frame: &mut FrameBuffer, options: &WrapOptions) -> FrameAction {
        if options.encrypt_header {
            frame.set_plaintext_offset(0);
        }
        FrameAction::Write
    }
}

/// PCM 音频素材
pub struct AudioEssence;

impl EssenceStrategy for AudioEssence {
    type Parser = PcmParserList;
    type Writer = As02PcmWriter;

    fn open_parser(options: &WrapOptions) -> As02Result<Self::Parser> {
        PcmParserList::open(&options.inputs, options.edit_rate)
    }

    fn new_writer(_options: &WrapOptions) -> Self::Writer {
        As02PcmWriter::new()
    }

    fn after_open(writer: &mut Self::Writer, options: &WrapOptions) -> As02Result<()> {
        let Some(label) = options.channel_assignment else {
            return Ok(());
        };
        let wave = writer
            .header_mut()?
            .wave_audio_descriptor_mut()
            .ok_or_else(|| As02Error::Internal("头部元数据中没有 WAVE 音频描述符".into()))?;
        wave.channel_assignment = Some(label);
        debug!("声道分配: {}", label);
        Ok(())
    }

    fn prepare_frame(frame: &mut FrameBuffer, _options: &WrapOptions) -> FrameAction {
        if frame.size() < frame.capacity() {
            warn!(
                "帧 {} 期望 {} 字节, 实际 {} 字节, 可能存在帧错位",
                frame.frame_number(),
                frame.capacity(),
                frame.size()
            );
            return FrameAction::Stop;
        }
        FrameAction::Write
    }
}
