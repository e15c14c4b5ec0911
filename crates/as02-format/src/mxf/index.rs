//! 索引表段.
//!
//! - VBE (可变字节): 每个编辑单元一个条目, 记录在素材流内的偏移
//! - CBE (恒定字节): 只记录 EditUnitByteCount, 无条目数组
//!
//! 索引表段使用固定本地标签, 不经过 Primer Pack 映射.

use bitflags::bitflags;
use byteorder::{BigEndian, WriteBytesExt};

use as02_core::{As02Error, As02Result, Rational};

use super::items::{self, Item};
use super::klv::{write_klv, write_local_item};
use super::labels;
use super::new_instance_uid;

/// AS-02 固定使用的索引流 ID
pub const INDEX_SID: u32 = 129;

/// 单个 VBE 索引条目字节数
pub const INDEX_ENTRY_LEN: usize = 11;

/// 单个索引表段最多容纳的条目数 (受本地集合 2 字节长度限制)
pub const MAX_ENTRIES_PER_SEGMENT: usize = (u16::MAX as usize - 8) / INDEX_ENTRY_LEN;

bitflags! {
    /// 索引条目标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IndexFlags: u8 {
        /// 可随机访问
        const RANDOM_ACCESS    = 0x80;
        /// 序列头
        const SEQUENCE_HEADER  = 0x40;
        /// 前向预测
        const FORWARD_PREDICT  = 0x20;
        /// 后向预测
        const BACKWARD_PREDICT = 0x10;
    }
}

/// VBE 索引条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// 时间偏移
    pub temporal_offset: i8,
    /// 关键帧偏移
    pub key_frame_offset: i8,
    /// 标志
    pub flags: IndexFlags,
    /// 素材流内偏移
    pub stream_offset: u64,
}

impl IndexEntry {
    /// 帧内编码 (JPEG 2000) 的条目
    pub fn intra(stream_offset: u64) -> Self {
        Self {
            temporal_offset: 0,
            key_frame_offset: 0,
            flags: IndexFlags::RANDOM_ACCESS,
            stream_offset,
        }
    }
}

/// 索引表段
#[derive(Debug, Clone, PartialEq)]
pub struct IndexTableSegment {
    /// 实例 UID
    pub instance_uid: [u8; 16],
    /// 编辑速率
    pub edit_rate: Rational,
    /// 起始位置
    pub start_position: u64,
    /// 时长
    pub duration: u64,
    /// 每编辑单元字节数 (VBE 为 0)
    pub edit_unit_byte_count: u32,
    /// 索引流 ID
    pub index_sid: u32,
    /// 素材流 ID
    pub body_sid: u32,
    /// VBE 条目
    pub entries: Vec<IndexEntry>,
}

impl IndexTableSegment {
    /// 创建 CBE 段
    pub fn cbe(
        edit_rate: Rational,
        edit_unit_byte_count: u32,
        duration: u64,
        body_sid: u32,
    ) -> Self {
        Self {
            instance_uid: new_instance_uid(),
            edit_rate,
            start_position: 0,
            duration,
            edit_unit_byte_count,
            index_sid: INDEX_SID,
            body_sid,
            entries: Vec::new(),
        }
    }

    /// 为一段连续条目创建 VBE 段, 超出单段容量时拆分
    pub fn vbe_segments(
        edit_rate: Rational,
        start_position: u64,
        entries: &[IndexEntry],
        body_sid: u32,
    ) -> Vec<Self> {
        entries
            .chunks(MAX_ENTRIES_PER_SEGMENT)
            .enumerate()
            .map(|(i, chunk)| Self {
                instance_uid: new_instance_uid(),
                edit_rate,
                start_position: start_position + (i * MAX_ENTRIES_PER_SEGMENT) as u64,
                duration: chunk.len() as u64,
                edit_unit_byte_count: 0,
                index_sid: INDEX_SID,
                body_sid,
                entries: chunk.to_vec(),
            })
            .collect()
    }

    /// 序列化为完整 KLV
    pub fn to_bytes(&self) -> As02Result<Vec<u8>> {
        if self.entries.len() > MAX_ENTRIES_PER_SEGMENT {
            return Err(As02Error::Internal(format!(
                "索引表段条目过多: {}",
                self.entries.len()
            )));
        }
        let mut value = Vec::new();
        put(&mut value, items::INSTANCE_UID, &self.instance_uid)?;
        put(&mut value, items::INDEX_EDIT_RATE, &self.edit_rate.to_be_bytes())?;
        put(
            &mut value,
            items::INDEX_START_POSITION,
            &self.start_position.to_be_bytes(),
        )?;
        put(&mut value, items::INDEX_DURATION, &self.duration.to_be_bytes())?;
        put(
            &mut value,
            items::EDIT_UNIT_BYTE_COUNT,
            &self.edit_unit_byte_count.to_be_bytes(),
        )?;
        put(&mut value, items::INDEX_SID, &self.index_sid.to_be_bytes())?;
        put(&mut value, items::BODY_SID, &self.body_sid.to_be_bytes())?;
        put(&mut value, items::SLICE_COUNT, &[0])?;

        if !self.entries.is_empty() {
            let mut array = Vec::with_capacity(8 + self.entries.len() * INDEX_ENTRY_LEN);
            array.write_u32::<BigEndian>(self.entries.len() as u32)?;
            array.write_u32::<BigEndian>(INDEX_ENTRY_LEN as u32)?;
            for e in &self.entries {
                array.write_i8(e.temporal_offset)?;
                array.write_i8(e.key_frame_offset)?;
                array.write_u8(e.flags.bits())?;
                array.write_u64::<BigEndian>(e.stream_offset)?;
            }
            put(&mut value, items::INDEX_ENTRY_ARRAY, &array)?;
        }

        let mut out = Vec::with_capacity(value.len() + 20);
        write_klv(&mut out, &labels::INDEX_TABLE_SEGMENT, &value);
        Ok(out)
    }
}

fn put(out: &mut Vec<u8>, item: Item, value: &[u8]) -> As02Result<()> {
    write_local_item(out, item.tag, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mxf::klv::{KlvReader, parse_local_items};

    #[test]
    fn test_vbe_条目编码() {
        let entries: Vec<IndexEntry> = (0..3).map(|i| IndexEntry::intra(i * 1000)).collect();
        let segments = IndexTableSegment::vbe_segments(Rational::EDIT_RATE_24, 10, &entries, 1);
        assert_eq!(segments.len(), 1);
        let bytes = segments[0].to_bytes().unwrap();

        let klv = KlvReader::new(&bytes).next_klv().unwrap().unwrap();
        assert_eq!(klv.key, labels::INDEX_TABLE_SEGMENT);
        let local = parse_local_items(klv.value).unwrap();
        let (_, array) = local
            .iter()
            .find(|(tag, _)| *tag == items::INDEX_ENTRY_ARRAY.tag)
            .unwrap();
        assert_eq!(&array[..8], &[0, 0, 0, 3, 0, 0, 0, 11]);
        // 第二个条目: 标志 0x80, 偏移 1000
        assert_eq!(array[8 + 11 + 2], 0x80);
        assert_eq!(&array[8 + 11 + 3..8 + 22], &1000u64.to_be_bytes());

        let (_, start) = local
            .iter()
            .find(|(tag, _)| *tag == items::INDEX_START_POSITION.tag)
            .unwrap();
        assert_eq!(*start, &10u64.to_be_bytes());
    }

    #[test]
    fn test_vbe_拆分() {
        let n = MAX_ENTRIES_PER_SEGMENT + 5;
        let entries: Vec<IndexEntry> = (0..n as u64).map(IndexEntry::intra).collect();
        let segments = IndexTableSegment::vbe_segments(Rational::EDIT_RATE_24, 0, &entries, 1);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].start_position, MAX_ENTRIES_PER_SEGMENT as u64);
        assert_eq!(segments[1].duration, 5);
        for s in &segments {
            assert!(s.to_bytes().is_ok());
        }
    }

    #[test]
    fn test_cbe_无条目数组() {
        let seg = IndexTableSegment::cbe(Rational::EDIT_RATE_24, 6000, 42, 1);
        let bytes = seg.to_bytes().unwrap();
        let klv = KlvReader::new(&bytes).next_klv().unwrap().unwrap();
        let local = parse_local_items(klv.value).unwrap();
        assert!(
            local
                .iter()
                .all(|(tag, _)| *tag != items::INDEX_ENTRY_ARRAY.tag)
        );
        let (_, count) = local
            .iter()
            .find(|(tag, _)| *tag == items::EDIT_UNIT_BYTE_COUNT.tag)
            .unwrap();
        assert_eq!(*count, &6000u32.to_be_bytes());
    }
}
