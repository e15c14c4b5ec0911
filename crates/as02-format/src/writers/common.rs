//! AS-02 写入器共用的文件级状态.
//!
//! 负责头分区的预留与回写、分区链、RIP 以及素材 KLV (明文或加密三元组).
//!
//! 文件布局:
//! ```text
//! 头分区包 | Primer + 元数据集合 | 填充 | 体分区... | 索引分区... | 尾分区 | RIP
//! ```

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use log::debug;

use as02_core::{As02Error, As02Result, FrameBuffer, Ul};
use as02_crypto::{FrameCrypto, Iv};

use crate::descriptor::EssenceDescriptor;
use crate::io::IoContext;
use crate::mxf::index::INDEX_SID;
use crate::mxf::klv::{encode_ber4, write_klv};
use crate::mxf::labels;
use crate::mxf::metadata::HeaderMetadata;
use crate::mxf::partition::{Partition, PartitionKind, PartitionStatus, RandomIndexPack};
use crate::mxf::triplet::{TripletHeader, encode_triplet};
use crate::writer::WriterInfo;

/// 素材流 ID
pub const BODY_SID: u32 = 1;

/// 头部元数据之后预留的空间, 供收尾时元数据增长
pub const HEADER_HEADROOM: usize = 8192;

/// 填充 KLV 的最小长度 (键 + 4 字节长度)
const FILL_MIN_LEN: usize = 20;

/// 生成总长为 `total` 的填充 KLV
fn fill_klv(total: usize) -> As02Result<Vec<u8>> {
    if total == 0 {
        return Ok(Vec::new());
    }
    if total < FILL_MIN_LEN {
        return Err(As02Error::Internal(format!(
            "剩余 {} 字节不足以写入填充项",
            total
        )));
    }
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(labels::FILL_ITEM.as_bytes());
    out.extend_from_slice(&encode_ber4(total - FILL_MIN_LEN)?);
    out.resize(total, 0);
    Ok(out)
}

/// 写入一帧的结果
#[derive(Debug, Clone, Copy)]
pub struct EssenceWrite {
    /// 素材流中的起始偏移
    pub stream_offset: u64,
    /// 写入的 KLV 总字节数
    pub klv_size: u64,
    /// 下一帧使用的 IV
    pub next_iv: Option<Iv>,
}

/// AS-02 文件写入状态
pub struct As02File {
    /// 输出路径
    path: PathBuf,
    /// I/O 上下文
    io: IoContext,
    /// 写入方信息
    info: WriterInfo,
    /// 头部元数据
    header: HeaderMetadata,
    /// 头分区包
    header_partition: Partition,
    /// 头部元数据区大小 (含填充)
    header_reserved: usize,
    /// 随机索引包
    rip: RandomIndexPack,
    /// 上一个分区的偏移
    last_partition: u64,
    /// 素材流当前偏移
    body_offset: u64,
    /// 已写入帧数
    frames: u64,
    /// 下一个三元组序号
    sequence_number: u64,
}

impl As02File {
    /// 创建文件并写入头分区 (打开、不完整)
    pub fn create(
        path: &Path,
        info: &WriterInfo,
        descriptor: &EssenceDescriptor,
    ) -> As02Result<Self> {
        let header = HeaderMetadata::new(info, descriptor, INDEX_SID, BODY_SID);
        let metadata = header.to_bytes()?;
        let header_reserved = metadata.len() + HEADER_HEADROOM;

        let mut header_partition =
            Partition::new(PartitionKind::Header, PartitionStatus::OPEN_INCOMPLETE);
        header_partition.header_byte_count = header_reserved as u64;
        header_partition.essence_containers = header.essence_containers();

        let mut io = IoContext::create(path)?;
        io.write_all(&header_partition.to_bytes()?)?;
        io.write_all(&metadata)?;
        io.write_all(&fill_klv(HEADER_HEADROOM)?)?;

        let mut rip = RandomIndexPack::default();
        rip.add_entry(0, 0);
        debug!(
            "创建 {}: 头部元数据 {} 字节, 预留 {} 字节",
            path.display(),
            metadata.len(),
            header_reserved
        );

        Ok(Self {
            path: path.to_path_buf(),
            io,
            info: info.clone(),
            header,
            header_partition,
            header_reserved,
            rip,
            last_partition: 0,
            body_offset: 0,
            frames: 0,
            sequence_number: 1,
        })
    }

    /// 头部元数据 (可修改)
    pub fn header_mut(&mut self) -> &mut HeaderMetadata {
        &mut self.header
    }

    /// 已写入帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 写入一个分区包 (体分区或尾分区)
    ///
    /// 返回分区偏移.
    pub fn write_partition(
        &mut self,
        kind: PartitionKind,
        body_sid: u32,
        index_sid: u32,
        index_byte_count: u64,
    ) -> As02Result<u64> {
        let offset = self.io.position()?;
        let status = if kind == PartitionKind::Footer {
            PartitionStatus::CLOSED_COMPLETE
        } else {
            PartitionStatus {
                closed: true,
                complete: false,
            }
        };
        let mut partition = Partition::new(kind, status);
        partition.this_partition = offset;
        partition.previous_partition = self.last_partition;
        if kind == PartitionKind::Footer {
            partition.footer_partition = offset;
        }
        partition.index_byte_count = index_byte_count;
        partition.index_sid = index_sid;
        partition.body_sid = body_sid;
        partition.body_offset = if body_sid == 0 { 0 } else { self.body_offset };
        partition.essence_containers = self.header.essence_containers();

        self.io.write_all(&partition.to_bytes()?)?;
        self.rip.add_entry(body_sid, offset);
        self.last_partition = offset;
        debug!(
            "{:?} 分区 @ {}: BodySID={}, IndexSID={}, 索引 {} 字节",
            kind, offset, body_sid, index_sid, index_byte_count
        );
        Ok(offset)
    }

    /// 写入原始字节 (索引表段等)
    pub fn write_raw(&mut self, data: &[u8]) -> As02Result<()> {
        self.io.write_all(data)
    }

    /// 写入一帧素材
    ///
    /// 提供加密参数时写出加密三元组, 否则写出明文素材元素.
    pub fn write_essence(
        &mut self,
        frame: &FrameBuffer,
        crypto: Option<FrameCrypto<'_>>,
    ) -> As02Result<EssenceWrite> {
        let stream_offset = self.body_offset;
        let element_key: Ul = self.header.element_key;

        let (bytes, next_iv) = match crypto {
            Some(crypto) => {
                if !self.info.encrypted_essence {
                    return Err(As02Error::InvalidArgument(
                        "容器未声明加密, 不能写入加密帧".into(),
                    ));
                }
                let header = TripletHeader {
                    context_id: &self.info.context_id,
                    source_key: &element_key,
                    track_file_id: &self.info.asset_uuid,
                    sequence_number: self.sequence_number,
                };
                let encoded =
                    encode_triplet(&header, frame.data(), frame.plaintext_offset(), &crypto)?;
                self.sequence_number += 1;
                (encoded.bytes, Some(encoded.next_iv))
            }
            None => {
                if self.info.encrypted_essence {
                    return Err(As02Error::InvalidArgument(
                        "容器声明为加密, 缺少加密参数".into(),
                    ));
                }
                let mut out = Vec::with_capacity(frame.size() + 24);
                write_klv(&mut out, &element_key, frame.data());
                (out, None)
            }
        };

        self.io.write_all(&bytes)?;
        let klv_size = bytes.len() as u64;
        self.body_offset += klv_size;
        self.frames += 1;
        Ok(EssenceWrite {
            stream_offset,
            klv_size,
            next_iv,
        })
    }

    /// 写入尾分区 (可附带索引表段) 与 RIP, 并回写头分区
    pub fn finish(&mut self, footer_index: &[u8]) -> As02Result<()> {
        let index_sid = if footer_index.is_empty() { 0 } else { INDEX_SID };
        let footer = self.write_partition(
            PartitionKind::Footer,
            0,
            index_sid,
            footer_index.len() as u64,
        )?;
        self.io.write_all(footer_index)?;
        self.io.write_all(&self.rip.to_bytes()?)?;

        self.rewrite_header(footer)?;
        self.io.flush()?;
        debug!(
            "完成 {}: {} 帧, 素材流 {} 字节",
            self.path.display(),
            self.frames,
            self.body_offset
        );
        Ok(())
    }

    /// 以关闭、完整状态回写头分区
    fn rewrite_header(&mut self, footer_offset: u64) -> As02Result<()> {
        self.header.set_duration(self.frames);
        let metadata = self.header.to_bytes()?;
        if metadata.len() > self.header_reserved {
            return Err(As02Error::Internal(format!(
                "头部元数据 {} 字节超出预留的 {} 字节",
                metadata.len(),
                self.header_reserved
            )));
        }

        self.header_partition.status = PartitionStatus::CLOSED_COMPLETE;
        self.header_partition.footer_partition = footer_offset;
        self.header_partition.essence_containers = self.header.essence_containers();

        let mut region = self.header_partition.to_bytes()?;
        region.extend_from_slice(&metadata);
        region.extend_from_slice(&fill_klv(self.header_reserved - metadata.len())?);

        self.io.seek(SeekFrom::Start(0))?;
        self.io.write_all(&region)?;
        self.io.seek(SeekFrom::End(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_填充项长度() {
        assert!(fill_klv(0).unwrap().is_empty());
        let fill = fill_klv(100).unwrap();
        assert_eq!(fill.len(), 100);
        assert_eq!(&fill[..16], labels::FILL_ITEM.as_bytes());
        assert_eq!(&fill[16..20], &[0x83, 0, 0, 80]);
        assert!(fill_klv(19).is_err());
        assert_eq!(fill_klv(20).unwrap().len(), 20);
    }
}
