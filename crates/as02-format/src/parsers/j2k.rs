//! JPEG 2000 码流序列解析器.
//!
//! 每个文件是一帧完整码流 (SOC ... EOC). 主头从 SOC 开始, 到第一个 SOT 为止:
//! ```text
//! FF4F (SOC) | FF51 (SIZ) | FF52 (COD) | FF5C (QCD) | ... | FF90 (SOT) ...
//! ```
//! 主头之后的数据才会被加密, 主头长度即帧的明文偏移.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use as02_core::{As02Error, As02Result, EssenceType, FrameBuffer, Rational};

use crate::descriptor::{ComponentSizing, EssenceDescriptor, J2kParams, PictureDescriptor};
use crate::io::IoContext;
use crate::parser::EssenceParser;
use crate::probe::{EssenceProbe, ProbeResult, SCORE_MAX};
use crate::registry::expand_inputs;

const MARKER_SOC: u16 = 0xFF4F;
const MARKER_SIZ: u16 = 0xFF51;
const MARKER_COD: u16 = 0xFF52;
const MARKER_QCD: u16 = 0xFF5C;
const MARKER_SOT: u16 = 0xFF90;

/// 读取主头时先尝试的字节数
const HEADER_PROBE_SIZE: usize = 64 * 1024;

/// 码流主头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct J2kHeader {
    /// SIZ/COD/QCD 参数
    pub params: J2kParams,
    /// 第一个 SOT 标记的偏移 (主头长度)
    pub sot_offset: usize,
}

impl J2kHeader {
    /// 从码流开头解析主头
    ///
    /// 数据中找不到 SOT 时返回 [`As02Error::Eof`], 调用者可读入更多数据重试.
    pub fn parse(data: &[u8]) -> As02Result<Self> {
        if be16(data, 0) != Some(MARKER_SOC) {
            return Err(As02Error::InvalidData("码流不以 SOC 标记开始".into()));
        }
        let mut params = J2kParams::default();
        let mut siz_found = false;
        let mut pos = 2;
        loop {
            let marker = be16(data, pos).ok_or(As02Error::Eof)?;
            if marker == MARKER_SOT {
                break;
            }
            if marker >> 8 != 0xFF {
                return Err(As02Error::InvalidData(format!(
                    "偏移 {} 处不是标记: 0x{:04X}",
                    pos, marker
                )));
            }
            let len = usize::from(be16(data, pos + 2).ok_or(As02Error::Eof)?);
            if len < 2 {
                return Err(As02Error::InvalidData(format!(
                    "标记 0x{:04X} 段长度无效: {}",
                    marker, len
                )));
            }
            let segment = data.get(pos + 4..pos + 2 + len).ok_or(As02Error::Eof)?;
            match marker {
                MARKER_SIZ => {
                    parse_siz(segment, &mut params)?;
                    siz_found = true;
                }
                MARKER_COD => params.cod = segment.to_vec(),
                MARKER_QCD => params.qcd = segment.to_vec(),
                _ => {}
            }
            pos += 2 + len;
        }
        if !siz_found {
            return Err(As02Error::InvalidData("主头缺少 SIZ 段".into()));
        }
        Ok(Self {
            params,
            sot_offset: pos,
        })
    }

    /// 读取文件的主头
    ///
    /// 先读取开头 64 KiB, 主头更长时读入整个文件.
    pub fn read(path: &Path) -> As02Result<Self> {
        let mut io = IoContext::open_read(path)?;
        let mut head = vec![0u8; HEADER_PROBE_SIZE];
        let n = io.read_up_to(&mut head)?;
        head.truncate(n);
        match Self::parse(&head) {
            Err(As02Error::Eof) if n == HEADER_PROBE_SIZE => {
                debug!("{}: 主头超过 {} 字节, 读取整个文件", path.display(), n);
                let whole = std::fs::read(path)?;
                Self::parse(&whole)
            }
            Err(As02Error::Eof) => Err(As02Error::InvalidData(format!(
                "{}: 码流截断, 未找到 SOT",
                path.display()
            ))),
            other => other,
        }
    }
}

fn be16(data: &[u8], pos: usize) -> Option<u16> {
    let b = data.get(pos..pos + 2)?;
    Some(u16::from_be_bytes([b[0], b[1]]))
}

fn be32(data: &[u8], pos: usize) -> Option<u32> {
    let b = data.get(pos..pos + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn parse_siz(seg: &[u8], params: &mut J2kParams) -> As02Result<()> {
    let short = || As02Error::InvalidData("SIZ 段过短".into());
    params.rsiz = be16(seg, 0).ok_or_else(short)?;
    params.xsiz = be32(seg, 2).ok_or_else(short)?;
    params.ysiz = be32(seg, 6).ok_or_else(short)?;
    params.xosiz = be32(seg, 10).ok_or_else(short)?;
    params.yosiz = be32(seg, 14).ok_or_else(short)?;
    params.xtsiz = be32(seg, 18).ok_or_else(short)?;
    params.ytsiz = be32(seg, 22).ok_or_else(short)?;
    params.xtosiz = be32(seg, 26).ok_or_else(short)?;
    params.ytosiz = be32(seg, 30).ok_or_else(short)?;
    let csiz = usize::from(be16(seg, 34).ok_or_else(short)?);
    let comps = seg.get(36..36 + csiz * 3).ok_or_else(short)?;
    params.components = comps
        .chunks_exact(3)
        .map(|c| ComponentSizing {
            ssiz: c[0],
            xrsiz: c[1],
            yrsiz: c[2],
        })
        .collect();
    if params.xsiz <= params.xosiz || params.ysiz <= params.yosiz {
        return Err(As02Error::InvalidData(format!(
            "SIZ 图像尺寸无效: {}x{} 偏移 {}x{}",
            params.xsiz, params.ysiz, params.xosiz, params.yosiz
        )));
    }
    Ok(())
}

/// JPEG 2000 探测器
pub struct J2kProbe;

impl EssenceProbe for J2kProbe {
    fn probe(&self, data: &[u8]) -> Option<ProbeResult> {
        if be16(data, 0)? == MARKER_SOC && be16(data, 2)? == MARKER_SIZ {
            return Some(ProbeResult {
                essence_type: EssenceType::Jpeg2000,
                score: SCORE_MAX,
            });
        }
        None
    }

    fn name(&self) -> &str {
        "jpeg2000"
    }
}

/// JPEG 2000 码流序列解析器
pub struct J2kSequenceParser {
    /// 帧文件列表
    files: Vec<PathBuf>,
    /// 下一帧的下标
    cursor: usize,
    /// 素材描述符
    descriptor: EssenceDescriptor,
}

impl J2kSequenceParser {
    /// 打开码流序列
    ///
    /// 目录展开为其中排序后的普通文件. `pedantic` 为 true 时,
    /// 任一文件的主头参数与第一个文件不同即报错; 否则仅记录警告.
    pub fn open(paths: &[PathBuf], pedantic: bool) -> As02Result<Self> {
        let files = expand_inputs(paths)?;
        let first_path = files
            .first()
            .ok_or_else(|| As02Error::InvalidArgument("没有 JPEG 2000 输入文件".into()))?;
        let first = J2kHeader::read(first_path)?;

        for path in &files[1..] {
            let header = J2kHeader::read(path)?;
            if header.params != first.params {
                let msg = format!(
                    "{} 的码流参数与 {} 不一致",
                    path.display(),
                    first_path.display()
                );
                if pedantic {
                    return Err(As02Error::InvalidData(msg));
                }
                warn!("{}", msg);
            }
        }

        let p = &first.params;
        let width = p.xsiz - p.xosiz;
        let height = p.ysiz - p.yosiz;
        let descriptor = EssenceDescriptor::Picture(PictureDescriptor {
            essence_type: EssenceType::Jpeg2000,
            edit_rate: Rational::EDIT_RATE_24,
            stored_width: width,
            stored_height: height,
            aspect_ratio: Rational::new(width as i32, height as i32).reduce(),
            container_duration: files.len() as u64,
            j2k: first.params.clone(),
        });
        debug!(
            "JPEG 2000 序列: {} 帧, {}x{}, {} 分量",
            files.len(),
            width,
            height,
            p.components.len()
        );

        Ok(Self {
            files,
            cursor: 0,
            descriptor,
        })
    }

    /// 帧数
    pub fn frame_count(&self) -> usize {
        self.files.len()
    }
}

impl EssenceParser for J2kSequenceParser {
    fn name(&self) -> &str {
        "jpeg2000"
    }

    fn descriptor(&self) -> &EssenceDescriptor {
        &self.descriptor
    }

    fn set_edit_rate(&mut self, rate: Rational) -> As02Result<()> {
        if !rate.is_valid() {
            return Err(As02Error::InvalidArgument(format!("无效的编辑速率: {}", rate)));
        }
        if let EssenceDescriptor::Picture(p) = &mut self.descriptor {
            p.edit_rate = rate;
        }
        Ok(())
    }

    fn frame_capacity(&self) -> Option<usize> {
        None
    }

    fn reset(&mut self) -> As02Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn skip_frames(&mut self, count: u64) -> As02Result<u64> {
        let remaining = (self.files.len() - self.cursor) as u64;
        let skipped = count.min(remaining);
        self.cursor += skipped as usize;
        Ok(skipped)
    }

    fn read_frame(&mut self, frame: &mut FrameBuffer) -> As02Result<()> {
        let path = self.files.get(self.cursor).ok_or(As02Error::Eof)?;
        let mut io = IoContext::open_read(path)?;
        let len = io
            .size()
            .ok_or_else(|| As02Error::Internal(format!("无法获取文件大小: {}", path.display())))?
            as usize;
        if len > frame.capacity() {
            return Err(As02Error::SmallBuffer {
                needed: len,
                capacity: frame.capacity(),
            });
        }
        io.read_exact(&mut frame.buffer_mut()[..len])?;
        frame.set_size(len)?;

        let header = J2kHeader::parse(frame.data()).map_err(|e| match e {
            As02Error::Eof => {
                As02Error::InvalidData(format!("{}: 码流截断, 未找到 SOT", path.display()))
            }
            other => other,
        })?;
        frame.set_plaintext_offset(header.sot_offset);
        frame.set_frame_number(self.cursor as u64);
        self.cursor += 1;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 构建一个最小码流: SOC SIZ COD QCD SOT + 数据 + EOC
    pub(crate) fn make_codestream(width: u32, height: u32, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0xFF, 0x4F];
        // SIZ, 单分量
        let mut siz = Vec::new();
        siz.extend_from_slice(&0u16.to_be_bytes());
        for v in [width, height, 0, 0, width, height, 0, 0] {
            siz.extend_from_slice(&v.to_be_bytes());
        }
        siz.extend_from_slice(&1u16.to_be_bytes());
        siz.extend_from_slice(&[7, 1, 1]);
        push_segment(&mut buf, MARKER_SIZ, &siz);
        push_segment(&mut buf, MARKER_COD, &[0, 0, 0, 1, 0, 5, 4, 4, 0, 0]);
        push_segment(&mut buf, MARKER_QCD, &[0x40, 0x48]);
        // SOT
        buf.extend_from_slice(&[0xFF, 0x90, 0x00, 0x0A, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        buf.extend_from_slice(&[0xFF, 0x93]);
        buf.extend_from_slice(payload);
        buf.extend_from_slice(&[0xFF, 0xD9]);
        buf
    }

    fn push_segment(buf: &mut Vec<u8>, marker: u16, body: &[u8]) {
        buf.extend_from_slice(&marker.to_be_bytes());
        buf.extend_from_slice(&((body.len() + 2) as u16).to_be_bytes());
        buf.extend_from_slice(body);
    }

    fn write_sequence(dir: &Path, count: usize, width: u32) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("frame_{:04}.j2c", i));
                std::fs::write(&path, make_codestream(width, 16, &[i as u8; 40])).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_主头解析() {
        let cs = make_codestream(64, 16, &[1, 2, 3]);
        let header = J2kHeader::parse(&cs).unwrap();
        assert_eq!(header.params.xsiz, 64);
        assert_eq!(header.params.components.len(), 1);
        assert_eq!(header.params.components[0].ssiz, 7);
        assert_eq!(header.params.qcd, vec![0x40, 0x48]);
        assert_eq!(be16(&cs, header.sot_offset), Some(MARKER_SOT));
    }

    #[test]
    fn test_主头截断() {
        let cs = make_codestream(64, 16, &[]);
        assert!(matches!(J2kHeader::parse(&cs[..20]), Err(As02Error::Eof)));
        assert!(J2kHeader::parse(b"\x00\x01").is_err());
    }

    #[test]
    fn test_探测() {
        assert!(J2kProbe.probe(&make_codestream(8, 8, &[])).is_some());
        assert!(J2kProbe.probe(&[0xFF, 0x4F, 0xFF, 0x52]).is_none());
        assert!(J2kProbe.probe(&[0xFF]).is_none());
    }

    #[test]
    fn test_目录序列读取() {
        let dir = tempfile::tempdir().unwrap();
        write_sequence(dir.path(), 3, 32);
        let mut parser = J2kSequenceParser::open(&[dir.path().to_path_buf()], true).unwrap();
        assert_eq!(parser.frame_count(), 3);
        assert_eq!(parser.descriptor().container_duration(), 3);

        let mut frame = FrameBuffer::new(4096);
        assert_eq!(parser.skip_frames(1).unwrap(), 1);
        parser.read_frame(&mut frame).unwrap();
        assert_eq!(frame.frame_number(), 1);
        let header = J2kHeader::parse(frame.data()).unwrap();
        assert_eq!(frame.plaintext_offset(), header.sot_offset);
        parser.read_frame(&mut frame).unwrap();
        assert!(matches!(parser.read_frame(&mut frame), Err(As02Error::Eof)));

        parser.reset().unwrap();
        assert_eq!(parser.skip_frames(10).unwrap(), 3);
    }

    #[test]
    fn test_缓冲区不足() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_sequence(dir.path(), 1, 32);
        let mut parser = J2kSequenceParser::open(&files, true).unwrap();
        let mut frame = FrameBuffer::new(16);
        let err = parser.read_frame(&mut frame).unwrap_err();
        assert!(matches!(err, As02Error::SmallBuffer { .. }));
    }

    #[test]
    fn test_参数不一致() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = write_sequence(dir.path(), 2, 32);
        let odd = dir.path().join("odd.j2c");
        std::fs::write(&odd, make_codestream(48, 16, &[0; 8])).unwrap();
        files.push(odd);

        let err = J2kSequenceParser::open(&files, true).err().unwrap();
        assert!(matches!(err, As02Error::InvalidData(_)));
        let parser = J2kSequenceParser::open(&files, false).unwrap();
        assert_eq!(parser.frame_count(), 3);
    }
}
