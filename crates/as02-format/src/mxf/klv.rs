//! KLV (Key-Length-Value) 编解码.
//!
//! MXF 中所有数据都以 KLV 三元组编码:
//! - Key: 16 字节通用标签
//! - Length: BER 编码的值长度
//! - Value: 数据本体

use byteorder::{BigEndian, WriteBytesExt};

use as02_core::{As02Error, As02Result, Ul};

/// 固定 4 字节 BER 长度的编码上限
pub const BER4_MAX: usize = 0x00FF_FFFF;

/// BER 长度编码所需字节数 (最短形式)
pub fn ber_length_size(length: usize) -> usize {
    if length < 0x80 {
        1
    } else if length <= 0xFF {
        2
    } else if length <= 0xFFFF {
        3
    } else if length <= 0xFF_FFFF {
        4
    } else if length <= 0xFFFF_FFFF {
        5
    } else {
        9
    }
}

/// 以最短形式编码 BER 长度
pub fn encode_ber_length(length: usize) -> Vec<u8> {
    let size = ber_length_size(length);
    if size == 1 {
        return vec![length as u8];
    }
    let n = size - 1;
    let mut out = Vec::with_capacity(size);
    out.push(0x80 | n as u8);
    let bytes = (length as u64).to_be_bytes();
    out.extend_from_slice(&bytes[8 - n..]);
    out
}

/// 以固定 4 字节形式编码 BER 长度 (`0x83 xx xx xx`)
///
/// 头部元数据回写时要求长度字段尺寸不变.
pub fn encode_ber4(length: usize) -> As02Result<[u8; 4]> {
    if length > BER4_MAX {
        return Err(As02Error::Internal(format!(
            "长度 {} 超出 4 字节 BER 可表示范围",
            length
        )));
    }
    Ok([
        0x83,
        (length >> 16) as u8,
        (length >> 8) as u8,
        length as u8,
    ])
}

/// 解码 BER 长度, 返回 (长度, 占用字节数)
pub fn decode_ber_length(data: &[u8]) -> As02Result<(usize, usize)> {
    let first = *data
        .first()
        .ok_or_else(|| As02Error::InvalidData("BER 长度为空".into()))?;
    if first < 0x80 {
        return Ok((first as usize, 1));
    }
    let n = (first & 0x7F) as usize;
    if n == 0 || n > 8 {
        return Err(As02Error::InvalidData(format!("不支持的 BER 长度形式: 0x{:02x}", first)));
    }
    if data.len() < 1 + n {
        return Err(As02Error::InvalidData("BER 长度字节不足".into()));
    }
    let mut length: u64 = 0;
    for byte in &data[1..=n] {
        length = (length << 8) | u64::from(*byte);
    }
    Ok((length as usize, 1 + n))
}

/// 写入 KLV (最短 BER 长度)
pub fn write_klv(out: &mut Vec<u8>, key: &Ul, value: &[u8]) {
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(&encode_ber_length(value.len()));
    out.extend_from_slice(value);
}

/// 写入 KLV 头部 (键 + 4 字节 BER 长度)
pub fn write_klv_header4(out: &mut Vec<u8>, key: &Ul, length: usize) -> As02Result<()> {
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(&encode_ber4(length)?);
    Ok(())
}

/// 写入本地集合条目 (2 字节标签, 2 字节长度)
pub fn write_local_item(out: &mut Vec<u8>, tag: u16, value: &[u8]) -> As02Result<()> {
    let len = u16::try_from(value.len()).map_err(|_| {
        As02Error::Internal(format!("本地标签 0x{:04x} 的值过长: {} 字节", tag, value.len()))
    })?;
    out.write_u16::<BigEndian>(tag)?;
    out.write_u16::<BigEndian>(len)?;
    out.extend_from_slice(value);
    Ok(())
}

/// 一个已解析的 KLV 视图
#[derive(Debug, Clone, Copy)]
pub struct KlvRef<'a> {
    /// 键
    pub key: Ul,
    /// 值
    pub value: &'a [u8],
    /// 在数据中的起始偏移
    pub offset: usize,
}

/// KLV 顺序读取器
pub struct KlvReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> KlvReader<'a> {
    /// 创建读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// 当前位置
    pub fn position(&self) -> usize {
        self.position
    }

    /// 读取下一个 KLV, 数据结束时返回 None
    pub fn next_klv(&mut self) -> As02Result<Option<KlvRef<'a>>> {
        if self.position + 17 > self.data.len() {
            return Ok(None);
        }
        let offset = self.position;
        let mut key = [0u8; 16];
        key.copy_from_slice(&self.data[offset..offset + 16]);
        let (length, len_size) = decode_ber_length(&self.data[offset + 16..])?;
        let start = offset + 16 + len_size;
        let end = start
            .checked_add(length)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                As02Error::InvalidData(format!("偏移 {} 处的 KLV 超出数据末尾", offset))
            })?;
        self.position = end;
        Ok(Some(KlvRef {
            key: Ul(key),
            value: &self.data[start..end],
            offset,
        }))
    }
}

/// 解析本地集合条目, 返回 (标签, 值) 列表
pub fn parse_local_items(value: &[u8]) -> As02Result<Vec<(u16, &[u8])>> {
    let mut items = Vec::new();
    let mut pos = 0;
    while pos + 4 <= value.len() {
        let tag = u16::from_be_bytes([value[pos], value[pos + 1]]);
        let len = u16::from_be_bytes([value[pos + 2], value[pos + 3]]) as usize;
        let start = pos + 4;
        if start + len > value.len() {
            return Err(As02Error::InvalidData(format!(
                "本地标签 0x{:04x} 长度越界",
                tag
            )));
        }
        items.push((tag, &value[start..start + len]));
        pos = start + len;
    }
    Ok(items)
}
