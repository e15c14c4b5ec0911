//! 分区包与随机索引包.
//!
//! AS-02 文件由头分区、若干素材/索引体分区、尾分区和 RIP 组成.

use byteorder::{BigEndian, WriteBytesExt};

use as02_core::{As02Error, As02Result, Ul};

use super::klv::{decode_ber_length, encode_ber_length};
use super::labels;

/// 分区类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKind {
    /// 头分区
    Header,
    /// 体分区
    Body,
    /// 尾分区
    Footer,
}

/// 分区状态
///
/// `closed` 表示元数据已定稿, `complete` 表示元数据完整.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionStatus {
    /// 是否关闭
    pub closed: bool,
    /// 是否完整
    pub complete: bool,
}

impl PartitionStatus {
    /// 打开且不完整 (写入中的头分区)
    pub const OPEN_INCOMPLETE: Self = Self {
        closed: false,
        complete: false,
    };
    /// 关闭且完整
    pub const CLOSED_COMPLETE: Self = Self {
        closed: true,
        complete: true,
    };

    fn code(self) -> u8 {
        match (self.closed, self.complete) {
            (false, false) => 0x01,
            (true, false) => 0x02,
            (false, true) => 0x03,
            (true, true) => 0x04,
        }
    }

    fn from_code(code: u8) -> Self {
        Self {
            closed: code == 0x02 || code == 0x04,
            complete: code == 0x03 || code == 0x04,
        }
    }
}

/// 分区包固定部分长度 (不含素材容器批次内容)
const PARTITION_FIXED_LEN: usize = 88;

/// 分区包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// 分区类型
    pub kind: PartitionKind,
    /// 分区状态
    pub status: PartitionStatus,
    /// 主版本号
    pub major_version: u16,
    /// 次版本号
    pub minor_version: u16,
    /// KAG 大小
    pub kag_size: u32,
    /// 本分区偏移
    pub this_partition: u64,
    /// 上一分区偏移
    pub previous_partition: u64,
    /// 尾分区偏移
    pub footer_partition: u64,
    /// 头部元数据字节数
    pub header_byte_count: u64,
    /// 索引表字节数
    pub index_byte_count: u64,
    /// 索引流 ID
    pub index_sid: u32,
    /// 素材流内偏移
    pub body_offset: u64,
    /// 素材流 ID
    pub body_sid: u32,
    /// 操作模式
    pub operational_pattern: Ul,
    /// 素材容器列表
    pub essence_containers: Vec<Ul>,
}

impl Partition {
    /// 创建指定类型的分区包
    pub fn new(kind: PartitionKind, status: PartitionStatus) -> Self {
        Self {
            kind,
            status,
            major_version: 1,
            minor_version: 3,
            kag_size: 1,
            this_partition: 0,
            previous_partition: 0,
            footer_partition: 0,
            header_byte_count: 0,
            index_byte_count: 0,
            index_sid: 0,
            body_offset: 0,
            body_sid: 0,
            operational_pattern: labels::OP1A,
            essence_containers: Vec::new(),
        }
    }

    /// 分区包键
    pub fn pack_ul(&self) -> Ul {
        let kind = match self.kind {
            PartitionKind::Header => 0x02,
            PartitionKind::Body => 0x03,
            PartitionKind::Footer => 0x04,
        };
        labels::partition_pack(kind, self.status.code())
    }

    fn value_len(&self) -> usize {
        PARTITION_FIXED_LEN + self.essence_containers.len() * 16
    }

    /// 序列化后的总长度
    pub fn encoded_len(&self) -> usize {
        let value = self.value_len();
        16 + encode_ber_length(value).len() + value
    }

    /// 序列化
    pub fn to_bytes(&self) -> As02Result<Vec<u8>> {
        let value_len = self.value_len();
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(self.pack_ul().as_bytes());
        out.extend_from_slice(&encode_ber_length(value_len));
        out.write_u16::<BigEndian>(self.major_version)?;
        out.write_u16::<BigEndian>(self.minor_version)?;
        out.write_u32::<BigEndian>(self.kag_size)?;
        out.write_u64::<BigEndian>(self.this_partition)?;
        out.write_u64::<BigEndian>(self.previous_partition)?;
        out.write_u64::<BigEndian>(self.footer_partition)?;
        out.write_u64::<BigEndian>(self.header_byte_count)?;
        out.write_u64::<BigEndian>(self.index_byte_count)?;
        out.write_u32::<BigEndian>(self.index_sid)?;
        out.write_u64::<BigEndian>(self.body_offset)?;
        out.write_u32::<BigEndian>(self.body_sid)?;
        out.extend_from_slice(self.operational_pattern.as_bytes());
        out.write_u32::<BigEndian>(self.essence_containers.len() as u32)?;
        out.write_u32::<BigEndian>(16)?;
        for ec in &self.essence_containers {
            out.extend_from_slice(ec.as_bytes());
        }
        Ok(out)
    }

    /// 从 KLV 键与值解析
    pub fn parse(key: &Ul, value: &[u8]) -> As02Result<Self> {
        let head = labels::partition_pack(0, 0);
        if key.0[..13] != head.0[..13] {
            return Err(As02Error::InvalidData(format!("不是分区包: {}", key)));
        }
        let kind = match key.0[13] {
            0x02 => PartitionKind::Header,
            0x03 => PartitionKind::Body,
            0x04 => PartitionKind::Footer,
            other => {
                return Err(As02Error::InvalidData(format!(
                    "未知分区类型: 0x{:02x}",
                    other
                )));
            }
        };
        if value.len() < PARTITION_FIXED_LEN {
            return Err(As02Error::InvalidData("分区包长度不足".into()));
        }
        let u16_at = |p: usize| u16::from_be_bytes([value[p], value[p + 1]]);
        let u32_at = |p: usize| {
            u32::from_be_bytes([value[p], value[p + 1], value[p + 2], value[p + 3]])
        };
        let u64_at = |p: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&value[p..p + 8]);
            u64::from_be_bytes(b)
        };
        let mut op = [0u8; 16];
        op.copy_from_slice(&value[64..80]);
        let count = u32_at(80) as usize;
        let mut essence_containers = Vec::with_capacity(count);
        for i in 0..count {
            let p = PARTITION_FIXED_LEN + i * 16;
            if p + 16 > value.len() {
                break;
            }
            let mut ul = [0u8; 16];
            ul.copy_from_slice(&value[p..p + 16]);
            essence_containers.push(Ul(ul));
        }
        Ok(Self {
            kind,
            status: PartitionStatus::from_code(key.0[14]),
            major_version: u16_at(0),
            minor_version: u16_at(2),
            kag_size: u32_at(4),
            this_partition: u64_at(8),
            previous_partition: u64_at(16),
            footer_partition: u64_at(24),
            header_byte_count: u64_at(32),
            index_byte_count: u64_at(40),
            index_sid: u32_at(48),
            body_offset: u64_at(52),
            body_sid: u32_at(60),
            operational_pattern: Ul(op),
            essence_containers,
        })
    }
}

/// RIP 条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RipEntry {
    /// 素材流 ID (头/尾/索引分区为 0)
    pub body_sid: u32,
    /// 分区偏移
    pub byte_offset: u64,
}

/// 随机索引包
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RandomIndexPack {
    /// 条目
    pub entries: Vec<RipEntry>,
}

impl RandomIndexPack {
    /// 添加条目
    pub fn add_entry(&mut self, body_sid: u32, byte_offset: u64) {
        self.entries.push(RipEntry {
            body_sid,
            byte_offset,
        });
    }

    /// 序列化 (末尾 4 字节为 RIP 总长度)
    pub fn to_bytes(&self) -> As02Result<Vec<u8>> {
        let value_len = self.entries.len() * 12 + 4;
        let len_bytes = encode_ber_length(value_len);
        let overall = 16 + len_bytes.len() + value_len;
        let mut out = Vec::with_capacity(overall);
        out.extend_from_slice(labels::RANDOM_INDEX_PACK.as_bytes());
        out.extend_from_slice(&len_bytes);
        for entry in &self.entries {
            out.write_u32::<BigEndian>(entry.body_sid)?;
            out.write_u64::<BigEndian>(entry.byte_offset)?;
        }
        out.write_u32::<BigEndian>(overall as u32)?;
        Ok(out)
    }

    /// 从文件末尾数据解析
    pub fn parse_tail(data: &[u8]) -> As02Result<Self> {
        if data.len() < 4 {
            return Err(As02Error::InvalidData("数据不足以容纳 RIP".into()));
        }
        let tail = &data[data.len() - 4..];
        let overall = u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]) as usize;
        if overall > data.len() || overall < 21 {
            return Err(As02Error::InvalidData(format!("RIP 总长度无效: {}", overall)));
        }
        let rip = &data[data.len() - overall..];
        if rip[..16] != labels::RANDOM_INDEX_PACK.0 {
            return Err(As02Error::InvalidData("文件末尾不是 RIP".into()));
        }
        let (value_len, len_size) = decode_ber_length(&rip[16..])?;
        let body = &rip[16 + len_size..];
        if body.len() != value_len || value_len < 4 {
            return Err(As02Error::InvalidData("RIP 长度不一致".into()));
        }
        let entries = body[..value_len - 4]
            .chunks_exact(12)
            .map(|c| {
                let mut off = [0u8; 8];
                off.copy_from_slice(&c[4..12]);
                RipEntry {
                    body_sid: u32::from_be_bytes([c[0], c[1], c[2], c[3]]),
                    byte_offset: u64::from_be_bytes(off),
                }
            })
            .collect();
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mxf::klv::KlvReader;

    #[test]
    fn test_分区包序列化与解析() {
        let mut part = Partition::new(PartitionKind::Body, PartitionStatus::CLOSED_COMPLETE);
        part.this_partition = 4096;
        part.previous_partition = 0;
        part.body_offset = 1234;
        part.body_sid = 1;
        part.essence_containers.push(labels::ESSENCE_CONTAINER_JPEG2000);

        let bytes = part.to_bytes().unwrap();
        assert_eq!(bytes.len(), part.encoded_len());

        let klv = KlvReader::new(&bytes).next_klv().unwrap().unwrap();
        let parsed = Partition::parse(&klv.key, klv.value).unwrap();
        assert_eq!(parsed, part);
    }

    #[test]
    fn test_分区状态编码() {
        let header = Partition::new(PartitionKind::Header, PartitionStatus::OPEN_INCOMPLETE);
        assert_eq!(header.pack_ul().0[14], 0x01);
        let closed = Partition::new(PartitionKind::Header, PartitionStatus::CLOSED_COMPLETE);
        assert_eq!(closed.pack_ul().0[14], 0x04);
        assert_eq!(PartitionStatus::from_code(0x04), PartitionStatus::CLOSED_COMPLETE);
    }

    #[test]
    fn test_rip() {
        let mut rip = RandomIndexPack::default();
        rip.add_entry(0, 0);
        rip.add_entry(1, 1000);
        rip.add_entry(0, 5000);

        let mut file = vec![0xAAu8; 10];
        file.extend_from_slice(&rip.to_bytes().unwrap());
        let parsed = RandomIndexPack::parse_tail(&file).unwrap();
        assert_eq!(parsed, rip);
    }
}
