//! 端到端集成测试: PCM WAV 封装为 AS-02 MXF.
//!
//! 测试流程: 生成 24 位 WAV → 封装 → 扫描输出文件 → 验证
//! 素材元素数量、CBE 索引、头部元数据中的时长与声道分配.

use std::path::{Path, PathBuf};

use as02::core::{As02Error, EssenceType, Rational, Ul};
use as02::format::mxf::klv::KlvReader;
use as02::format::mxf::metadata::scan_header;
use as02::format::mxf::partition::{Partition, PartitionKind};
use as02::format::mxf::{items, labels};
use as02::wrap::{ProductIdentity, StopReason, WrapDriver, WrapOptions};

/// 48 kHz 下 24 fps 每帧的采样数
const SAMPLES_PER_FRAME: usize = 2000;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 生成 PCM WAV 文件内容
fn make_wav(channels: u16, sample_rate: u32, bits: u16, pcm: &[u8]) -> Vec<u8> {
    let block_align = channels * (bits / 8);
    let byte_rate = sample_rate * u32::from(block_align);
    let mut buf = Vec::new();
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + pcm.len() as u32).to_le_bytes());
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
    buf.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
    buf.extend_from_slice(pcm);
    buf
}

fn write_wav(dir: &Path, name: &str, channels: u16, bits: u16, bytes: usize) -> PathBuf {
    let pcm: Vec<u8> = (0..bytes).map(|i| (i % 251) as u8).collect();
    let path = dir.join(name);
    std::fs::write(&path, make_wav(channels, 48_000, bits, &pcm)).unwrap();
    path
}

/// 统计 WAVE 素材元素并取出头部元数据区
fn scan(data: &[u8]) -> (Vec<Partition>, Vec<usize>) {
    let mut reader = KlvReader::new(data);
    let mut parts = Vec::new();
    let mut elements = Vec::new();
    while let Some(klv) = reader.next_klv().unwrap() {
        if klv.key.0[..13] == labels::partition_pack(0, 0).0[..13] {
            parts.push(Partition::parse(&klv.key, klv.value).unwrap());
        } else if klv.key == labels::ELEMENT_WAVE {
            elements.push(klv.value.len());
        }
    }
    (parts, elements)
}

fn header_metadata(data: &[u8]) -> &[u8] {
    let mut reader = KlvReader::new(data);
    let pack = reader.next_klv().unwrap().unwrap();
    let partition = Partition::parse(&pack.key, pack.value).unwrap();
    let start = reader.position();
    &data[start..start + partition.header_byte_count as usize]
}

#[test]
fn test_尾帧不足_写入五帧() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    // 立体声 24 位: 每帧 2000 * 6 字节, 第六帧少 10 字节
    let frame_bytes = SAMPLES_PER_FRAME * 6;
    let input = write_wav(dir.path(), "tone.wav", 2, 24, frame_bytes * 6 - 10);
    let out = dir.path().join("audio.mxf");

    let opts = WrapOptions::new(vec![input], &out);
    let identity = ProductIdentity::new();
    let report = WrapDriver::new(&opts, &identity).run().unwrap();
    assert_eq!(report.essence_type, EssenceType::Pcm24b48k);
    assert_eq!(report.frames_written, 5);
    assert_eq!(report.stop, StopReason::ShortFrame);

    let data = std::fs::read(&out).unwrap();
    let (parts, elements) = scan(&data);
    assert_eq!(elements, vec![frame_bytes; 5]);
    // 头 + 单个体分区 + 尾
    assert_eq!(parts.len(), 3);
    let footer = &parts[2];
    assert_eq!(footer.kind, PartitionKind::Footer);
    assert!(footer.index_byte_count > 0);

    let header = scan_header(header_metadata(&data)).unwrap();
    let duration = header
        .find(&labels::WAVE_AUDIO_DESCRIPTOR, &items::CONTAINER_DURATION)
        .unwrap()
        .unwrap();
    assert_eq!(u64::from_be_bytes(duration.try_into().unwrap()), 5);
}

#[test]
fn test_多路输入与声道分配() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let frame_bytes = SAMPLES_PER_FRAME * 3;
    let left = write_wav(dir.path(), "l.wav", 1, 24, frame_bytes * 3);
    let right = write_wav(dir.path(), "r.wav", 1, 24, frame_bytes * 3);
    let out = dir.path().join("audio.mxf");

    let label = Ul::from_hex("060e2b34.0401.010d.04020210.03010000").unwrap();
    let mut opts = WrapOptions::new(vec![left, right], &out);
    opts.channel_assignment = Some(label);
    let identity = ProductIdentity::new();
    let report = WrapDriver::new(&opts, &identity).run().unwrap();
    assert_eq!(report.frames_written, 3);
    assert_eq!(report.stop, StopReason::EndOfInput);

    let data = std::fs::read(&out).unwrap();
    let (_, elements) = scan(&data);
    assert_eq!(elements, vec![frame_bytes * 2; 3]);

    let header = scan_header(header_metadata(&data)).unwrap();
    let stored = header
        .find(&labels::WAVE_AUDIO_DESCRIPTOR, &items::CHANNEL_ASSIGNMENT)
        .unwrap()
        .unwrap();
    assert_eq!(stored, label.as_bytes());
}

#[test]
fn test_编辑速率覆盖() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    // 25 fps: 每帧 1920 个采样
    let input = write_wav(dir.path(), "mono.wav", 1, 24, 1920 * 3 * 4);
    let out = dir.path().join("audio.mxf");

    let mut opts = WrapOptions::new(vec![input], &out);
    opts.edit_rate = Rational::new(25, 1);
    let identity = ProductIdentity::new();
    let report = WrapDriver::new(&opts, &identity).run().unwrap();
    assert_eq!(report.frames_written, 4);

    let data = std::fs::read(&out).unwrap();
    let (_, elements) = scan(&data);
    assert_eq!(elements, vec![1920 * 3; 4]);
}

#[test]
fn test_加密音频() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav(dir.path(), "mono.wav", 1, 24, SAMPLES_PER_FRAME * 3 * 2);
    let out = dir.path().join("audio.mxf");

    let mut opts = WrapOptions::new(vec![input], &out);
    opts.key = Some(vec![0x33; 16]);
    let identity = ProductIdentity::new();
    let report = WrapDriver::new(&opts, &identity).run().unwrap();
    assert_eq!(report.frames_written, 2);

    let data = std::fs::read(&out).unwrap();
    let (_, elements) = scan(&data);
    // 加密后不再有明文 WAVE 元素
    assert!(elements.is_empty());
}

#[test]
fn test_16位_无法识别() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav(dir.path(), "cd.wav", 2, 16, 4 * 1000);
    let out = dir.path().join("audio.mxf");

    let opts = WrapOptions::new(vec![input], &out);
    let identity = ProductIdentity::new();
    let err = WrapDriver::new(&opts, &identity).run().unwrap_err();
    assert!(matches!(err, As02Error::UnrecognizedEssence(_)));
    assert!(!out.exists());
}

#[test]
fn test_采样率不一致() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let a = write_wav(dir.path(), "a.wav", 1, 24, 3000);
    let b = dir.path().join("b.wav");
    std::fs::write(&b, make_wav(1, 96_000, 24, &[0; 3000])).unwrap();
    let out = dir.path().join("audio.mxf");

    let opts = WrapOptions::new(vec![a, b], &out);
    let identity = ProductIdentity::new();
    let err = WrapDriver::new(&opts, &identity).run().unwrap_err();
    assert!(matches!(err, As02Error::InvalidData(_)));
    assert!(!out.exists());
}
