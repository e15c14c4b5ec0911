//! AS-02 PCM 写入器.
//!
//! 每个编辑单元一个 WAVE 素材元素, 全部位于同一个体分区.
//! 编辑单元大小恒定, 尾分区携带一个 CBE 索引表段.

use std::path::Path;

use log::{debug, warn};

use as02_core::{As02Error, As02Result, FrameBuffer, Rational};
use as02_crypto::{FrameCrypto, Iv};

use crate::descriptor::EssenceDescriptor;
use crate::mxf::index::IndexTableSegment;
use crate::mxf::metadata::HeaderMetadata;
use crate::mxf::partition::PartitionKind;
use crate::writer::{ContainerWriter, WriterInfo};
use crate::writers::common::{As02File, BODY_SID};

/// AS-02 PCM 写入器
pub struct As02PcmWriter {
    file: Option<As02File>,
    edit_rate: Rational,
    /// 首个素材 KLV 的字节数
    edit_unit_byte_count: Option<u64>,
    finished_frames: u64,
}

impl As02PcmWriter {
    /// 创建写入器
    pub fn new() -> Self {
        Self {
            file: None,
            edit_rate: Rational::EDIT_RATE_24,
            edit_unit_byte_count: None,
            finished_frames: 0,
        }
    }

    fn file_mut(&mut self) -> As02Result<&mut As02File> {
        self.file
            .as_mut()
            .ok_or_else(|| As02Error::InvalidArgument("写入器未打开".into()))
    }
}

impl Default for As02PcmWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerWriter for As02PcmWriter {
    fn name(&self) -> &str {
        "as02-pcm"
    }

    fn open_write(
        &mut self,
        path: &Path,
        info: &WriterInfo,
        descriptor: &EssenceDescriptor,
    ) -> As02Result<()> {
        let audio = descriptor
            .as_audio()
            .ok_or_else(|| As02Error::InvalidArgument("PCM 写入器需要音频描述符".into()))?;
        if !audio.edit_rate.is_valid() {
            return Err(As02Error::InvalidArgument(format!(
                "无效的编辑速率: {}",
                audio.edit_rate
            )));
        }
        self.edit_rate = audio.edit_rate;
        self.edit_unit_byte_count = None;

        let mut file = As02File::create(path, info, descriptor)?;
        file.write_partition(PartitionKind::Body, BODY_SID, 0, 0)?;
        self.file = Some(file);
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
        let written = self.file_mut()?.write_essence(frame, crypto)?;
        match self.edit_unit_byte_count {
            None => self.edit_unit_byte_count = Some(written.klv_size),
            Some(expected) if expected != written.klv_size => {
                warn!(
                    "编辑单元大小变化: {} -> {} 字节, CBE 索引将不准确",
                    expected, written.klv_size
                );
            }
            Some(_) => {}
        }
        Ok(written.next_iv)
    }

    fn frames_written(&self) -> u64 {
        self.file
            .as_ref()
            .map_or(self.finished_frames, As02File::frames)
    }

    fn finalize(&mut self) -> As02Result<()> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| As02Error::InvalidArgument("写入器未打开".into()))?;
        let frames = file.frames();
        let index = match self.edit_unit_byte_count {
            Some(eubc) => {
                let eubc = u32::try_from(eubc).map_err(|_| {
                    As02Error::Unsupported(format!("编辑单元过大: {} 字节", eubc))
                })?;
                IndexTableSegment::cbe(self.edit_rate, eubc, frames, BODY_SID).to_bytes()?
            }
            None => Vec::new(),
        };
        debug!("PCM CBE 索引: {} 字节, {} 个编辑单元", index.len(), frames);
        file.finish(&index)?;
        self.finished_frames = frames;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::AudioDescriptor;
    use crate::mxf::index::INDEX_SID;
    use crate::mxf::klv::KlvReader;
    use crate::mxf::labels;
    use crate::mxf::partition::{Partition, PartitionStatus, RandomIndexPack};
    use as02_core::EssenceType;

    fn descriptor() -> EssenceDescriptor {
        EssenceDescriptor::Audio(AudioDescriptor {
            essence_type: EssenceType::Pcm24b48k,
            edit_rate: Rational::EDIT_RATE_24,
            audio_sampling_rate: Rational::SAMPLE_RATE_48K,
            channel_count: 1,
            quantization_bits: 24,
            block_align: 3,
            avg_bytes_per_second: 144_000,
            container_duration: 0,
            bytes_per_frame: 6000,
        })
    }

    #[test]
    fn test_单体分区与_cbe_索引() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.mxf");
        let mut writer = As02PcmWriter::new();
        writer
            .open_write(&path, &WriterInfo::default(), &descriptor())
            .unwrap();
        let mut frame = FrameBuffer::new(6000);
        frame.fill_from(&[1; 6000]).unwrap();
        for _ in 0..3 {
            writer.write_frame(&frame, None).unwrap();
        }
        writer.finalize().unwrap();
        assert_eq!(writer.frames_written(), 3);

        let data = std::fs::read(&path).unwrap();
        let mut reader = KlvReader::new(&data);
        let mut parts = Vec::new();
        let mut elements = 0;
        let mut index_segments = 0;
        while let Some(klv) = reader.next_klv().unwrap() {
            if klv.key.0[..13] == labels::partition_pack(0, 0).0[..13] {
                parts.push(Partition::parse(&klv.key, klv.value).unwrap());
            } else if klv.key == labels::ELEMENT_WAVE {
                elements += 1;
                assert_eq!(klv.value.len(), 6000);
            } else if klv.key == labels::INDEX_TABLE_SEGMENT {
                index_segments += 1;
            }
        }
        assert_eq!(elements, 3);
        assert_eq!(index_segments, 1);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].status, PartitionStatus::CLOSED_COMPLETE);
        assert_eq!(parts[1].body_sid, BODY_SID);
        assert_eq!(parts[2].kind, PartitionKind::Footer);
        assert_eq!(parts[2].index_sid, INDEX_SID);
        assert!(parts[2].index_byte_count > 0);

        let rip = RandomIndexPack::parse_tail(&data).unwrap();
        assert_eq!(rip.entries.len(), 3);
    }

    #[test]
    fn test_拒绝图像描述符() {
        use crate::descriptor::{J2kParams, PictureDescriptor};
        let dir = tempfile::tempdir().unwrap();
        let picture = EssenceDescriptor::Picture(PictureDescriptor {
            essence_type: EssenceType::Jpeg2000,
            edit_rate: Rational::EDIT_RATE_24,
            stored_width: 8,
            stored_height: 8,
            aspect_ratio: Rational::new(1, 1),
            container_duration: 0,
            j2k: J2kParams::default(),
        });
        let mut writer = As02PcmWriter::new();
        assert!(
            writer
                .open_write(&dir.path().join("x.mxf"), &WriterInfo::default(), &picture)
                .is_err()
        );
    }
}
