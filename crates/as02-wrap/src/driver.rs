//! 封装驱动.
//!
//! 流程: 识别素材 -> 准备密钥 -> 打开容器 -> 逐帧读取/加密/写入 -> 收尾.
//! 第一个失败即为本次运行的结果, 只有 `Eof` 被视为正常结束.

use log::{debug, info};

use as02_core::{As02Error, As02Result, EssenceType, FrameBuffer};
use as02_crypto::FrameCrypto;
use as02_format::{ContainerWriter, EssenceParser, EssenceRegistry, WriterInfo};

use crate::identity::ProductIdentity;
use crate::keys::{self, CryptoSession};
use crate::options::WrapOptions;
use crate::strategy::{AudioEssence, EssenceStrategy, FrameAction, PictureEssence};

/// 逐帧诊断输出的最大字节数
const DUMP_BYTES: usize = 32;

/// 循环结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 输入已读完
    EndOfInput,
    /// 达到指定帧数
    DurationReached,
    /// 音频尾帧不足一帧
    ShortFrame,
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct WrapReport {
    /// 素材类型
    pub essence_type: EssenceType,
    /// 读取的帧数 (不含跳过的起始帧)
    pub frames_read: u64,
    /// 写入容器的帧数
    pub frames_written: u64,
    /// 循环结束原因
    pub stop: StopReason,
    /// 写入方信息
    pub info: WriterInfo,
    /// 是否生成了输出文件
    pub output_written: bool,
}

/// 封装驱动
pub struct WrapDriver<'a> {
    options: &'a WrapOptions,
    identity: &'a ProductIdentity,
    registry: EssenceRegistry,
}

impl<'a> WrapDriver<'a> {
    /// 创建驱动
    pub fn new(options: &'a WrapOptions, identity: &'a ProductIdentity) -> Self {
        Self {
            options,
            identity,
            registry: EssenceRegistry::with_builtin(),
        }
    }

    /// 识别第一个输入的素材类型
    pub fn classify(&self) -> As02Result<EssenceType> {
        let first = self
            .options
            .inputs
            .first()
            .ok_or_else(|| As02Error::InvalidArgument("至少需要一个输入".into()))?;
        self.registry.classify(first)
    }

    /// 执行封装
    pub fn run(&self) -> As02Result<WrapReport> {
        self.options.validate()?;
        let essence_type = self.classify()?;
        info!("素材类型: {}", essence_type);
        match essence_type {
            EssenceType::Jpeg2000 => self.run_with::<PictureEssence>(essence_type),
            EssenceType::Pcm24b48k | EssenceType::Pcm24b96k => {
                self.run_with::<AudioEssence>(essence_type)
            }
        }
    }

    fn run_with<S: EssenceStrategy>(&self, essence_type: EssenceType) -> As02Result<WrapReport> {
        let opts = self.options;

        let mut parser = S::open_parser(opts)?;
        parser.set_edit_rate(opts.edit_rate)?;
        if opts.verbose {
            debug!("素材描述符:\n{}", parser.descriptor().dump());
        }
        let mut frame = FrameBuffer::new(S::frame_capacity(&parser, opts));

        let mut info = self.identity.writer_info(keys::resolve_asset_id(opts.asset_id));
        let session: Option<CryptoSession> = match &opts.key {
            Some(key) => Some(keys::provision(key, opts.key_id, opts.write_hmac, &mut info)?),
            None => None,
        };

        let mut writer = if opts.no_write {
            debug!("只解析模式, 不创建输出文件");
            None
        } else {
            let mut writer = S::new_writer(opts);
            writer
                .open_write(&opts.output, &info, parser.descriptor())
                .map_err(|e| {
                    As02Error::ContainerOpenFailed(format!("{}: {}", opts.output.display(), e))
                })?;
            S::after_open(&mut writer, opts)?;
            Some(writer)
        };

        parser.reset()?;
        if opts.start_frame > 0 {
            let skipped = parser.skip_frames(opts.start_frame)?;
            debug!("跳过起始 {} 帧 (请求 {})", skipped, opts.start_frame);
        }

        let mut iv = session.as_ref().map(|s| s.initial_iv);
        let mut frames_read = 0u64;
        let mut frames_written = 0u64;
        let stop = loop {
            if opts.duration.is_some_and(|d| frames_read >= d) {
                break StopReason::DurationReached;
            }
            match parser.read_frame(&mut frame) {
                Ok(()) => {}
                Err(e) if e.is_eof() => break StopReason::EndOfInput,
                Err(e) => return Err(e),
            }
            frames_read += 1;

            if S::prepare_frame(&mut frame, opts) == FrameAction::Stop {
                break StopReason::ShortFrame;
            }
            if opts.verbose {
                info!("{}", frame.dump(DUMP_BYTES));
            }

            if let Some(writer) = writer.as_mut() {
                let crypto = match (&session, iv) {
                    (Some(s), Some(current)) => Some(FrameCrypto {
                        cipher: &s.cipher,
                        iv: current,
                        hmac: s.hmac.as_ref(),
                    }),
                    _ => None,
                };
                if let Some(next) = writer.write_frame(&frame, crypto)? {
                    iv = Some(next);
                }
                frames_written += 1;
            }
        };
        debug!("循环结束: {:?}, 读取 {} 帧", stop, frames_read);

        let output_written = match writer.as_mut() {
            Some(writer) => {
                writer.finalize()?;
                info!(
                    "已写入 {} 帧到 {}",
                    writer.frames_written(),
                    opts.output.display()
                );
                true
            }
            None => false,
        };

        Ok(WrapReport {
            essence_type,
            frames_read,
            frames_written,
            stop,
            info,
            output_written,
        })
    }
}
