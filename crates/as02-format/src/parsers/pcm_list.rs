//! 多路 WAV 输入合并为一路多声道 PCM.
//!
//! 每个编辑单元包含 `samples_per_frame` 个采样, 每个采样依次由各输入的
//! 一组声道拼接而成:
//! ```text
//! [输入0 采样0][输入1 采样0] ... [输入0 采样1][输入1 采样1] ...
//! ```

use std::path::PathBuf;

use log::debug;

use as02_core::{As02Error, As02Result, FrameBuffer, Rational};

use crate::descriptor::{AudioDescriptor, EssenceDescriptor};
use crate::parser::EssenceParser;
use crate::parsers::wav::WavReader;
use crate::registry::expand_inputs;

/// PCM 解析器列表
pub struct PcmParserList {
    /// 各路输入
    readers: Vec<WavReader>,
    /// 音频参数
    audio: AudioDescriptor,
    /// 素材描述符 (与 `audio` 同步)
    descriptor: EssenceDescriptor,
    /// 下一帧序号
    frame_number: u64,
    /// 单路读取缓冲
    scratch: Vec<u8>,
}

impl PcmParserList {
    /// 打开全部输入
    ///
    /// 所有输入必须具有相同的采样率与位深, 声道数累加.
    pub fn open(paths: &[PathBuf], edit_rate: Rational) -> As02Result<Self> {
        let files = expand_inputs(paths)?;
        if files.is_empty() {
            return Err(As02Error::InvalidArgument("没有 PCM 输入文件".into()));
        }
        let readers = files
            .iter()
            .map(|p| WavReader::open(p))
            .collect::<As02Result<Vec<_>>>()?;

        let first = *readers[0].format();
        let essence_type = first.essence_type().ok_or_else(|| {
            As02Error::Unsupported(format!(
                "{}: 仅支持 24 位 48k/96k PCM",
                readers[0].path().display()
            ))
        })?;
        let mut channel_count = 0u32;
        let mut block_align = 0u32;
        for reader in &readers {
            let f = reader.format();
            if f.sample_rate != first.sample_rate || f.bits_per_sample != first.bits_per_sample {
                return Err(As02Error::InvalidData(format!(
                    "{} 的音频参数 ({} Hz, {} 位) 与第一路 ({} Hz, {} 位) 不一致",
                    reader.path().display(),
                    f.sample_rate,
                    f.bits_per_sample,
                    first.sample_rate,
                    first.bits_per_sample
                )));
            }
            channel_count += u32::from(f.channels);
            block_align += u32::from(f.block_align);
        }
        let container_duration = readers
            .iter()
            .map(WavReader::total_samples)
            .min()
            .unwrap_or(0);

        let mut audio = AudioDescriptor {
            essence_type,
            edit_rate,
            audio_sampling_rate: Rational::new(first.sample_rate as i32, 1),
            channel_count,
            quantization_bits: u32::from(first.bits_per_sample),
            block_align,
            avg_bytes_per_second: first.sample_rate * block_align,
            // 暂存总采样数, 由 apply_edit_rate 换算为编辑单元数
            container_duration,
            bytes_per_frame: 0,
        };
        apply_edit_rate(&mut audio, container_duration, edit_rate)?;
        debug!(
            "PCM 输入: {} 路, {} 声道, {} Hz, 每帧 {} 字节",
            readers.len(),
            channel_count,
            first.sample_rate,
            audio.bytes_per_frame
        );

        Ok(Self {
            readers,
            descriptor: EssenceDescriptor::Audio(audio.clone()),
            audio,
            frame_number: 0,
            scratch: Vec::new(),
        })
    }

    fn total_samples(&self) -> u64 {
        self.readers
            .iter()
            .map(WavReader::total_samples)
            .min()
            .unwrap_or(0)
    }
}

/// 按编辑速率重新计算每帧字节数与容器时长
fn apply_edit_rate(
    audio: &mut AudioDescriptor,
    total_samples: u64,
    edit_rate: Rational,
) -> As02Result<()> {
    if !edit_rate.is_valid() {
        return Err(As02Error::InvalidArgument(format!(
            "无效的编辑速率: {}",
            edit_rate
        )));
    }
    audio.edit_rate = edit_rate;
    let spf = audio.samples_per_frame();
    if spf == 0 {
        return Err(As02Error::InvalidArgument(format!(
            "编辑速率 {} 下每帧采样数为 0",
            edit_rate
        )));
    }
    audio.bytes_per_frame = u32::try_from(spf * u64::from(audio.block_align))
        .map_err(|_| As02Error::InvalidArgument(format!("编辑速率 {} 过低", edit_rate)))?;
    audio.container_duration = total_samples / spf;
    Ok(())
}

impl EssenceParser for PcmParserList {
    fn name(&self) -> &str {
        "pcm"
    }

    fn descriptor(&self) -> &EssenceDescriptor {
        &self.descriptor
    }

    fn set_edit_rate(&mut self, rate: Rational) -> As02Result<()> {
        let total = self.total_samples();
        apply_edit_rate(&mut self.audio, total, rate)?;
        self.descriptor = EssenceDescriptor::Audio(self.audio.clone());
        Ok(())
    }

    fn frame_capacity(&self) -> Option<usize> {
        Some(self.audio.bytes_per_frame as usize)
    }

    fn reset(&mut self) -> As02Result<()> {
        for reader in &mut self.readers {
            reader.rewind()?;
        }
        self.frame_number = 0;
        Ok(())
    }

    fn skip_frames(&mut self, count: u64) -> As02Result<u64> {
        let spf = self.audio.samples_per_frame();
        let available = self
            .readers
            .iter()
            .map(WavReader::remaining_samples)
            .min()
            .unwrap_or(0);
        // 不足一帧的尾部也算一帧
        let skipped = count.min(available.div_ceil(spf));
        for reader in &mut self.readers {
            let target = reader.total_samples() - reader.remaining_samples() + skipped * spf;
            reader.seek_samples(target)?;
        }
        self.frame_number += skipped;
        Ok(skipped)
    }

    fn read_frame(&mut self, frame: &mut FrameBuffer) -> As02Result<()> {
        let spf = self.audio.samples_per_frame() as usize;
        let frame_align = self.audio.block_align as usize;

        let available = self
            .readers
            .iter()
            .map(WavReader::remaining_samples)
            .min()
            .unwrap_or(0) as usize;
        let samples = spf.min(available);
        if samples == 0 {
            return Err(As02Error::Eof);
        }
        let size = samples * frame_align;
        if size > frame.capacity() {
            return Err(As02Error::SmallBuffer {
                needed: size,
                capacity: frame.capacity(),
            });
        }

        let out = frame.buffer_mut();
        let mut column = 0;
        for reader in &mut self.readers {
            let ba = usize::from(reader.format().block_align);
            self.scratch.resize(samples * ba, 0);
            let got = reader.read_samples(&mut self.scratch, samples)?;
            if got != samples {
                return Err(As02Error::InvalidData(format!(
                    "{}: 读取 {} 个采样, 实际 {}",
                    reader.path().display(),
                    samples,
                    got
                )));
            }
            for (i, sample) in self.scratch.chunks_exact(ba).enumerate() {
                let start = i * frame_align + column;
                out[start..start + ba].copy_from_slice(sample);
            }
            column += ba;
        }

        frame.set_size(size)?;
        frame.set_plaintext_offset(0);
        frame.set_frame_number(self.frame_number);
        self.frame_number += 1;
        Ok(())
    }
}
