//! AS-02 JPEG 2000 写入器.
//!
//! 帧封装: 每帧一个素材元素 (或加密三元组). 每 `partition_space` 秒开启
//! 一个新的体分区, 体分区之后紧跟一个只含 VBE 索引表段的索引分区.

use std::path::Path;

use log::debug;

use as02_core::{As02Error, As02Result, FrameBuffer, Rational};
use as02_crypto::{FrameCrypto, Iv};

use crate::descriptor::EssenceDescriptor;
use crate::mxf::index::{INDEX_SID, IndexEntry, IndexTableSegment};
use crate::mxf::metadata::HeaderMetadata;
use crate::mxf::partition::PartitionKind;
use crate::writer::{ContainerWriter, IndexStrategy, WriterInfo};
use crate::writers::common::{As02File, BODY_SID};

/// AS-02 JPEG 2000 写入器
pub struct As02Jp2kWriter {
    /// 索引策略
    index_strategy: IndexStrategy,
    /// 体分区间隔 (秒)
    partition_space: u32,
    /// 文件状态 (打开后可用)
    file: Option<As02File>,
    /// 编辑速率
    edit_rate: Rational,
    /// 每个体分区的帧数
    frames_per_partition: u64,
    /// 当前体分区已写帧数
    frames_in_partition: u64,
    /// 待写出的索引条目
    pending: Vec<IndexEntry>,
    /// 待写出条目的起始编辑单元
    pending_start: u64,
    /// 完成后的帧数
    finished_frames: u64,
}

impl As02Jp2kWriter {
    /// 创建写入器
    pub fn new(index_strategy: IndexStrategy, partition_space: u32) -> Self {
        Self {
            index_strategy,
            partition_space,
            file: None,
            edit_rate: Rational::EDIT_RATE_24,
            frames_per_partition: 0,
            frames_in_partition: 0,
            pending: Vec::new(),
            pending_start: 0,
            finished_frames: 0,
        }
    }

    fn file_mut(&mut self) -> As02Result<&mut As02File> {
        self.file
            .as_mut()
            .ok_or_else(|| As02Error::InvalidArgument("写入器未打开".into()))
    }

    /// 写出累积的索引条目 (独立的索引分区)
    fn flush_index(&mut self) -> As02Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let segments = IndexTableSegment::vbe_segments(
            self.edit_rate,
            self.pending_start,
            &self.pending,
            BODY_SID,
        );
        let mut bytes = Vec::new();
        for segment in &segments {
            bytes.extend_from_slice(&segment.to_bytes()?);
        }

        let count = self.pending.len() as u64;
        let file = self.file_mut()?;
        file.write_partition(PartitionKind::Body, 0, INDEX_SID, bytes.len() as u64)?;
        file.write_raw(&bytes)?;
        debug!(
            "索引分区: 编辑单元 {}..{}",
            self.pending_start,
            self.pending_start + count
        );
        self.pending_start += count;
        self.pending.clear();
        Ok(())
    }
}

impl ContainerWriter for As02Jp2kWriter {
    fn name(&self) -> &str {
        "as02-jp2k"
    }

    fn open_write(
        &mut self,
        path: &Path,
        info: &WriterInfo,
        descriptor: &EssenceDescriptor,
    ) -> As02Result<()> {
        if self.index_strategy != IndexStrategy::Follow {
            return Err(As02Error::Unsupported(format!(
                "AS-02 仅支持 follow 索引策略, 不支持 {}",
                self.index_strategy
            )));
        }
        if self.partition_space == 0 {
            return Err(As02Error::InvalidArgument("体分区间隔不能为 0".into()));
        }
        let picture = descriptor
            .as_picture()
            .ok_or_else(|| As02Error::InvalidArgument("JPEG 2000 写入器需要图像描述符".into()))?;
        let rate = picture.edit_rate;
        if !rate.is_valid() {
            return Err(As02Error::InvalidArgument(format!("无效的编辑速率: {}", rate)));
        }

        self.edit_rate = rate;
        self.frames_per_partition = (u64::from(self.partition_space) * rate.num as u64)
            .div_ceil(rate.den as u64)
            .max(1);
        self.frames_in_partition = 0;
        self.pending.clear();
        self.pending_start = 0;
        self.file = Some(As02File::create(path, info, descriptor)?);
        debug!("AS-02 JPEG 2000: 每 {} 帧一个体分区", self.frames_per_partition);
        Ok(())
    }

    fn header_mut(&mut self) -> As02Result<&mut HeaderMetadata> {
        Ok(self.file_mut()?.header_mut())
    }

    fn write_frame(
        &mut self,
        frame: &FrameBuffer,
        crypto: Option<FrameCrypto<'_>>,
    ) -> As02Result<Option<Iv>> {
        if self.frames_in_partition == 0 {
            self.file_mut()?.write_partition(PartitionKind::Body, BODY_SID, 0, 0)?;
        }
        let written = self.file_mut()?.write_essence(frame, crypto)?;
        self.pending.push(IndexEntry::intra(written.stream_offset));
        self.frames_in_partition += 1;

        if self.frames_in_partition >= self.frames_per_partition {
            self.flush_index()?;
            self.frames_in_partition = 0;
        }
        Ok(written.next_iv)
    }

    fn frames_written(&self) -> u64 {
        self.file
            .as_ref()
            .map_or(self.finished_frames, As02File::frames)
    }

    fn finalize(&mut self) -> As02Result<()> {
        self.flush_index()?;
        let mut file = self
            .file
            .take()
            .ok_or_else(|| As02Error::InvalidArgument("写入器未打开".into()))?;
        file.finish(&[])?;
        self.finished_frames = file.frames();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{J2kParams, PictureDescriptor};
    use crate::mxf::klv::KlvReader;
    use crate::mxf::labels;
    use crate::mxf::partition::{Partition, PartitionStatus, RandomIndexPack};
    use as02_core::EssenceType;

    fn descriptor() -> EssenceDescriptor {
        EssenceDescriptor::Picture(PictureDescriptor {
            essence_type: EssenceType::Jpeg2000,
            edit_rate: Rational::new(2, 1),
            stored_width: 16,
            stored_height: 16,
            aspect_ratio: Rational::new(1, 1),
            container_duration: 0,
            j2k: J2kParams::default(),
        })
    }

    /// 列出文件中全部分区包
    fn partitions(data: &[u8]) -> Vec<Partition> {
        let mut reader = KlvReader::new(data);
        let mut out = Vec::new();
        while let Some(klv) = reader.next_klv().unwrap() {
            if klv.key.0[..13] == labels::partition_pack(0, 0).0[..13] {
                out.push(Partition::parse(&klv.key, klv.value).unwrap());
            }
        }
        out
    }

    #[test]
    fn test_分区布局() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mxf");
        // 编辑速率 2, 间隔 1 秒 => 每 2 帧一个体分区
        let mut writer = As02Jp2kWriter::new(IndexStrategy::Follow, 1);
        writer
            .open_write(&path, &WriterInfo::default(), &descriptor())
            .unwrap();
        let mut frame = FrameBuffer::new(64);
        for i in 0..5u8 {
            frame.fill_from(&[i; 10]).unwrap();
            assert!(writer.write_frame(&frame, None).unwrap().is_none());
        }
        writer.finalize().unwrap();
        assert_eq!(writer.frames_written(), 5);

        let data = std::fs::read(&path).unwrap();
        let parts = partitions(&data);
        // 头 + 3 x (体 + 索引) + 尾
        assert_eq!(parts.len(), 8);
        assert_eq!(parts[0].kind, PartitionKind::Header);
        assert_eq!(parts[0].status, PartitionStatus::CLOSED_COMPLETE);
        assert_eq!(parts[0].footer_partition, parts[7].this_partition);
        assert_eq!(parts[1].body_sid, BODY_SID);
        assert_eq!(parts[2].index_sid, INDEX_SID);
        assert_eq!(parts[2].body_sid, 0);
        assert_eq!(parts[7].kind, PartitionKind::Footer);
        for pair in parts.windows(2) {
            assert_eq!(pair[1].previous_partition, pair[0].this_partition);
        }
        // 第二个体分区的素材流偏移 = 前两帧 KLV 长度
        assert_eq!(parts[3].body_offset, 2 * (16 + 1 + 10));

        let rip = RandomIndexPack::parse_tail(&data).unwrap();
        assert_eq!(rip.entries.len(), 8);
        assert_eq!(rip.entries[1].body_sid, BODY_SID);
    }

    #[test]
    fn test_拒绝非_follow_策略() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mxf");
        for strategy in [IndexStrategy::Lead, IndexStrategy::Only] {
            let mut writer = As02Jp2kWriter::new(strategy, 60);
            let err = writer
                .open_write(&path, &WriterInfo::default(), &descriptor())
                .unwrap_err();
            assert!(matches!(err, As02Error::Unsupported(_)));
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_未打开时写入失败() {
        let mut writer = As02Jp2kWriter::new(IndexStrategy::Follow, 60);
        let frame = FrameBuffer::new(4);
        assert!(writer.write_frame(&frame, None).is_err());
        assert!(writer.finalize().is_err());
    }
}
