//! Primer Pack: 本地标签到通用标签的映射.
//!
//! 静态标签 (< 0x8000) 直接使用, 无静态标签的属性从 0xFFFF 起向下分配动态标签.

use byteorder::{BigEndian, WriteBytesExt};

use as02_core::{As02Error, As02Result, Ul};

use super::items::Item;
use super::klv::{encode_ber4, parse_local_items};
use super::labels;

/// 动态标签起始值
const DYNAMIC_TAG_START: u16 = 0xFFFF;

/// Primer Pack
#[derive(Debug, Clone)]
pub struct Primer {
    entries: Vec<(u16, Ul)>,
    next_dynamic: u16,
}

impl Primer {
    /// 创建空映射
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_dynamic: DYNAMIC_TAG_START,
        }
    }

    /// 登记属性并返回其本地标签
    pub fn register(&mut self, item: &Item) -> u16 {
        if let Some(tag) = self.lookup(&item.ul) {
            return tag;
        }
        let tag = if item.tag != 0 {
            item.tag
        } else {
            let tag = self.next_dynamic;
            self.next_dynamic -= 1;
            tag
        };
        self.entries.push((tag, item.ul));
        tag
    }

    /// 按通用标签查找本地标签
    pub fn lookup(&self, ul: &Ul) -> Option<u16> {
        self.entries.iter().find(|(_, u)| u == ul).map(|(t, _)| *t)
    }

    /// 按本地标签查找通用标签
    pub fn resolve(&self, tag: u16) -> Option<Ul> {
        self.entries.iter().find(|(t, _)| *t == tag).map(|(_, u)| *u)
    }

    /// 条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 序列化为 KLV
    pub fn to_bytes(&self) -> As02Result<Vec<u8>> {
        let value_len = 8 + self.entries.len() * 18;
        let mut out = Vec::with_capacity(20 + value_len);
        out.extend_from_slice(labels::PRIMER_PACK.as_bytes());
        out.extend_from_slice(&encode_ber4(value_len)?);
        out.write_u32::<BigEndian>(self.entries.len() as u32)?;
        out.write_u32::<BigEndian>(18)?;
        for (tag, ul) in &self.entries {
            out.write_u16::<BigEndian>(*tag)?;
            out.extend_from_slice(ul.as_bytes());
        }
        Ok(out)
    }

    /// 从 KLV 值解析
    pub fn parse(value: &[u8]) -> As02Result<Self> {
        if value.len() < 8 {
            return Err(As02Error::InvalidData("Primer Pack 长度不足".into()));
        }
        let count = u32::from_be_bytes([value[0], value[1], value[2], value[3]]) as usize;
        let size = u32::from_be_bytes([value[4], value[5], value[6], value[7]]) as usize;
        if size != 18 || value.len() < 8 + count * 18 {
            return Err(As02Error::InvalidData("Primer Pack 批次格式错误".into()));
        }
        let mut primer = Self::new();
        for chunk in value[8..8 + count * 18].chunks_exact(18) {
            let tag = u16::from_be_bytes([chunk[0], chunk[1]]);
            let mut ul = [0u8; 16];
            ul.copy_from_slice(&chunk[2..]);
            primer.entries.push((tag, Ul(ul)));
            if tag <= primer.next_dynamic && tag >= 0x8000 {
                primer.next_dynamic = tag - 1;
            }
        }
        Ok(primer)
    }

    /// 按通用标签在本地集合中查找属性值
    pub fn find_item<'a>(&self, set_value: &'a [u8], ul: &Ul) -> As02Result<Option<&'a [u8]>> {
        let Some(tag) = self.lookup(ul) else {
            return Ok(None);
        };
        Ok(parse_local_items(set_value)?
            .into_iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v))
    }
}

impl Default for Primer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mxf::items;
    use crate::mxf::klv::KlvReader;

    #[test]
    fn test_静态与动态标签() {
        let mut primer = Primer::new();
        assert_eq!(primer.register(&items::INSTANCE_UID), 0x3c0a);
        let dyn1 = primer.register(&items::CHANNEL_ASSIGNMENT);
        let dyn2 = primer.register(&items::J2K_RSIZ);
        assert_eq!(dyn1, 0xFFFF);
        assert_eq!(dyn2, 0xFFFE);
        // 重复登记返回同一标签
        assert_eq!(primer.register(&items::CHANNEL_ASSIGNMENT), dyn1);
        assert_eq!(primer.len(), 3);
        assert_eq!(primer.resolve(0xFFFE), Some(items::J2K_RSIZ.ul));
    }

    #[test]
    fn test_序列化与解析() {
        let mut primer = Primer::new();
        primer.register(&items::INSTANCE_UID);
        primer.register(&items::CHANNEL_ASSIGNMENT);
        let bytes = primer.to_bytes().unwrap();
        let klv = KlvReader::new(&bytes).next_klv().unwrap().unwrap();
        assert_eq!(klv.key, labels::PRIMER_PACK);
        let mut parsed = Primer::parse(klv.value).unwrap();
        assert_eq!(parsed.lookup(&items::CHANNEL_ASSIGNMENT.ul), Some(0xFFFF));
        // 解析后继续分配不冲突
        assert_eq!(parsed.register(&items::J2K_XSIZ), 0xFFFE);
    }
}
