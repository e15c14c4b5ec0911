//! WAV (RIFF WAVE) 读取器.
//!
//! 仅支持整数 PCM (格式码 1 与 WAVE_FORMAT_EXTENSIBLE).
//!
//! WAV 文件结构:
//! ```text
//! RIFF header:  "RIFF" + file_size-8 + "WAVE"
//! fmt  chunk:   "fmt " + chunk_size + audio_format + channels + sample_rate
//!              + byte_rate + block_align + bits_per_sample [+ 扩展]
//! data chunk:   "data" + data_size + PCM samples...
//! ```

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use as02_core::{As02Error, As02Result, EssenceType};

use crate::io::IoContext;
use crate::probe::{EssenceProbe, ProbeResult, SCORE_MAX};

/// WAV PCM 格式码
const WAV_FORMAT_PCM: u16 = 0x0001;
/// WAVE_FORMAT_EXTENSIBLE 格式码
const WAV_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// fmt 块中的音频参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    /// 声道数
    pub channels: u16,
    /// 采样率
    pub sample_rate: u32,
    /// 平均每秒字节数
    pub byte_rate: u32,
    /// 块对齐 (所有声道一个采样的字节数)
    pub block_align: u16,
    /// 位深
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// 解析 fmt 块内容
    fn parse(chunk: &[u8]) -> As02Result<Self> {
        if chunk.len() < 16 {
            return Err(As02Error::InvalidData("fmt 块大小不足 16 字节".into()));
        }
        let u16_at = |i: usize| u16::from_le_bytes([chunk[i], chunk[i + 1]]);
        let u32_at = |i: usize| {
            u32::from_le_bytes([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]])
        };

        let audio_format = u16_at(0);
        match audio_format {
            WAV_FORMAT_PCM => {}
            WAV_FORMAT_EXTENSIBLE => {
                // 子格式 GUID 的前两字节即实际格式码
                if chunk.len() < 26 || u16_at(24) != WAV_FORMAT_PCM {
                    return Err(As02Error::Unsupported("扩展 WAV 的子格式不是 PCM".into()));
                }
            }
            other => {
                return Err(As02Error::Unsupported(format!(
                    "不支持的 WAV 格式码: 0x{:04X}",
                    other
                )));
            }
        }

        let format = Self {
            channels: u16_at(2),
            sample_rate: u32_at(4),
            byte_rate: u32_at(8),
            block_align: u16_at(12),
            bits_per_sample: u16_at(14),
        };
        if format.channels == 0 || format.block_align == 0 {
            return Err(As02Error::InvalidData("WAV 声道数或块对齐为 0".into()));
        }
        Ok(format)
    }

    /// 对应的素材类型 (仅 24 位 48k/96k)
    pub fn essence_type(&self) -> Option<EssenceType> {
        match (self.bits_per_sample, self.sample_rate) {
            (24, 48_000) => Some(EssenceType::Pcm24b48k),
            (24, 96_000) => Some(EssenceType::Pcm24b96k),
            _ => None,
        }
    }
}

/// WAV 读取器
///
/// 以采样 (所有声道一组) 为单位读取 data 块.
pub struct WavReader {
    /// 文件路径
    path: PathBuf,
    /// I/O 上下文
    io: IoContext,
    /// 音频参数
    format: WavFormat,
    /// data 块在文件中的起始偏移
    data_offset: u64,
    /// data 块的大小 (字节)
    data_size: u64,
    /// 当前读取位置 (相对于 data 块起始)
    data_pos: u64,
}

impl WavReader {
    /// 打开 WAV 文件并定位到 data 块
    pub fn open(path: &Path) -> As02Result<Self> {
        let mut io = IoContext::open_read(path)?;

        let riff_tag = io.read_tag()?;
        if &riff_tag != b"RIFF" {
            return Err(As02Error::InvalidData(format!(
                "{}: 不是有效的 RIFF 文件",
                path.display()
            )));
        }
        let _file_size = io.read_u32_le()?;
        let wave_tag = io.read_tag()?;
        if &wave_tag != b"WAVE" {
            return Err(As02Error::InvalidData(format!(
                "{}: 不是有效的 WAVE 文件",
                path.display()
            )));
        }

        let mut format = None;
        let (data_offset, data_size) = loop {
            let chunk_id = match io.read_tag() {
                Ok(tag) => tag,
                Err(As02Error::Eof) => {
                    return Err(As02Error::InvalidData(format!(
                        "{}: 未找到 data 块",
                        path.display()
                    )));
                }
                Err(e) => return Err(e),
            };
            let chunk_size = u64::from(io.read_u32_le()?);

            match &chunk_id {
                b"fmt " => {
                    let chunk = io.read_bytes(chunk_size as usize)?;
                    let parsed = WavFormat::parse(&chunk)?;
                    debug!(
                        "fmt: channels={}, rate={}, block_align={}, bits={}",
                        parsed.channels,
                        parsed.sample_rate,
                        parsed.block_align,
                        parsed.bits_per_sample,
                    );
                    format = Some(parsed);
                }
                b"data" => {
                    if format.is_none() {
                        return Err(As02Error::InvalidData("data 块出现在 fmt 块之前".into()));
                    }
                    let offset = io.position()?;
                    // 截断文件: 以实际剩余长度为准
                    let available = io.size().map_or(chunk_size, |s| s.saturating_sub(offset));
                    if available < chunk_size {
                        warn!(
                            "{}: data 块声明 {} 字节, 实际仅 {} 字节",
                            path.display(),
                            chunk_size,
                            available
                        );
                    }
                    break (offset, chunk_size.min(available));
                }
                _ => {
                    debug!(
                        "跳过块: '{}', 大小={}",
                        String::from_utf8_lossy(&chunk_id),
                        chunk_size
                    );
                    io.skip(chunk_size as usize)?;
                }
            }

            // WAV 块要求偶数对齐
            if chunk_size % 2 != 0 {
                io.skip(1)?;
            }
        };

        let format = format.ok_or_else(|| As02Error::InvalidData("未找到 fmt 块".into()))?;
        debug!(
            "WAV 打开完成: {}, {} Hz, {} 声道, {} 位, 总采样数={}",
            path.display(),
            format.sample_rate,
            format.channels,
            format.bits_per_sample,
            data_size / u64::from(format.block_align),
        );

        Ok(Self {
            path: path.to_path_buf(),
            io,
            format,
            data_offset,
            data_size,
            data_pos: 0,
        })
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 音频参数
    pub fn format(&self) -> &WavFormat {
        &self.format
    }

    /// 总采样数
    pub fn total_samples(&self) -> u64 {
        self.data_size / u64::from(self.format.block_align)
    }

    /// 剩余采样数
    pub fn remaining_samples(&self) -> u64 {
        (self.data_size - self.data_pos) / u64::from(self.format.block_align)
    }

    /// 读取最多 `count` 个采样到 `buf`, 返回实际读取的采样数
    pub fn read_samples(&mut self, buf: &mut [u8], count: usize) -> As02Result<usize> {
        let ba = usize::from(self.format.block_align);
        let count = count
            .min(self.remaining_samples() as usize)
            .min(buf.len() / ba);
        if count == 0 {
            return Ok(0);
        }
        let bytes = count * ba;
        self.io.read_exact(&mut buf[..bytes])?;
        self.data_pos += bytes as u64;
        Ok(count)
    }

    /// 定位到第 `sample` 个采样, 超出末尾时停在末尾
    pub fn seek_samples(&mut self, sample: u64) -> As02Result<()> {
        let ba = u64::from(self.format.block_align);
        let offset = sample.saturating_mul(ba).min(self.total_samples() * ba);
        self.io.seek(SeekFrom::Start(self.data_offset + offset))?;
        self.data_pos = offset;
        Ok(())
    }

    /// 回到 data 块起始
    pub fn rewind(&mut self) -> As02Result<()> {
        self.seek_samples(0)
    }
}

/// WAV 素材探测器
///
/// 只接受 24 位 48k/96k PCM.
pub struct WavProbe;

impl EssenceProbe for WavProbe {
    fn probe(&self, data: &[u8]) -> Option<ProbeResult> {
        if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
            return None;
        }
        let mut pos = 12;
        while pos + 8 <= data.len() {
            let id = &data[pos..pos + 4];
            let size =
                u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
                    as usize;
            let start = pos + 8;
            if id == b"fmt " {
                let chunk = data.get(start..start.checked_add(size)?)?;
                let essence_type = WavFormat::parse(chunk).ok()?.essence_type()?;
                return Some(ProbeResult {
                    essence_type,
                    score: SCORE_MAX,
                });
            }
            if id == b"data" {
                return None;
            }
            pos = start.checked_add(size)?.checked_add(size % 2)?;
        }
        None
    }

    fn name(&self) -> &str {
        "wav"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 构建 PCM WAV 文件数据
    pub(crate) fn make_wav(
        channels: u16,
        sample_rate: u32,
        bits: u16,
        pcm_data: &[u8],
    ) -> Vec<u8> {
        let data_size = pcm_data.len() as u32;
        let block_align = channels * (bits / 8);
        let byte_rate = sample_rate * u32::from(block_align);

        let mut buf = Vec::new();
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        buf.extend_from_slice(pcm_data);
        buf
    }

    #[test]
    fn test_探测_24位_48k() {
        let wav = make_wav(2, 48_000, 24, &[0; 12]);
        let result = WavProbe.probe(&wav).unwrap();
        assert_eq!(result.essence_type, EssenceType::Pcm24b48k);
        assert_eq!(result.score, SCORE_MAX);

        let wav = make_wav(1, 96_000, 24, &[0; 3]);
        assert_eq!(
            WavProbe.probe(&wav).unwrap().essence_type,
            EssenceType::Pcm24b96k
        );
    }

    #[test]
    fn test_探测_拒绝其他参数() {
        assert!(WavProbe.probe(&make_wav(2, 44_100, 24, &[0; 12])).is_none());
        assert!(WavProbe.probe(&make_wav(2, 48_000, 16, &[0; 8])).is_none());
        assert!(WavProbe.probe(b"RIFF\0\0\0\0AVI ").is_none());
        assert!(WavProbe.probe(b"not a wav").is_none());
    }

    #[test]
    fn test_跳过未知块() {
        let mut wav = make_wav(1, 48_000, 24, &[1, 2, 3, 4, 5, 6]);
        // 在 fmt 之前插入奇数长度的 LIST 块
        let mut list = b"LIST".to_vec();
        list.extend_from_slice(&3u32.to_le_bytes());
        list.extend_from_slice(&[9, 9, 9, 0]);
        wav.splice(12..12, list);
        assert!(WavProbe.probe(&wav).is_some());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        std::fs::write(&path, &wav).unwrap();
        let mut reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.total_samples(), 2);
        let mut buf = [0u8; 6];
        assert_eq!(reader.read_samples(&mut buf, 10).unwrap(), 2);
        assert_eq!(buf, [1, 2, 3, 4, 5, 6]);
        assert_eq!(reader.read_samples(&mut buf, 10).unwrap(), 0);
    }

    #[test]
    fn test_定位与回绕() {
        let pcm: Vec<u8> = (0..30u8).collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.wav");
        std::fs::write(&path, make_wav(1, 48_000, 24, &pcm)).unwrap();

        let mut reader = WavReader::open(&path).unwrap();
        reader.seek_samples(3).unwrap();
        assert_eq!(reader.remaining_samples(), 7);
        let mut buf = [0u8; 3];
        reader.read_samples(&mut buf, 1).unwrap();
        assert_eq!(buf, [9, 10, 11]);

        reader.seek_samples(100).unwrap();
        assert_eq!(reader.remaining_samples(), 0);
        reader.rewind().unwrap();
        reader.read_samples(&mut buf, 1).unwrap();
        assert_eq!(buf, [0, 1, 2]);
    }
}
