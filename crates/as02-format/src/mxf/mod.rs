//! MXF 容器基础设施.
//!
//! - [`klv`]: KLV 编解码与 BER 长度
//! - [`labels`]: 通用标签常量
//! - [`partition`]: 分区包与随机索引包 (RIP)
//! - [`primer`]: 本地标签映射 (Primer Pack)
//! - [`items`]: 元数据属性字典
//! - [`metadata`]: 头部元数据集合
//! - [`index`]: 索引表段 (VBE / CBE)
//! - [`triplet`]: SMPTE 429-6 加密三元组

pub mod index;
pub mod items;
pub mod klv;
pub mod labels;
pub mod metadata;
pub mod partition;
pub mod primer;
pub mod triplet;

/// MXF 时间戳 (8 字节: 年 u16, 月, 日, 时, 分, 秒, 毫秒/4)
pub fn timestamp_now() -> [u8; 8] {
    use chrono::{Datelike, Timelike, Utc};
    let now = Utc::now();
    let year = u16::try_from(now.year()).unwrap_or(0);
    let [y0, y1] = year.to_be_bytes();
    [
        y0,
        y1,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
        (now.timestamp_subsec_millis() / 4) as u8,
    ]
}

/// 生成 16 字节实例 UID
pub fn new_instance_uid() -> [u8; 16] {
    *uuid::Uuid::new_v4().as_bytes()
}

/// 生成 32 字节 SMPTE UMID (素材编号取随机 UUID)
pub fn new_umid() -> [u8; 32] {
    let mut umid = [0u8; 32];
    umid[..12].copy_from_slice(&[
        0x06, 0x0a, 0x2b, 0x34, 0x01, 0x01, 0x01, 0x05, 0x01, 0x01, 0x0f, 0x20,
    ]);
    // 长度 0x13, 实例号 0
    umid[12] = 0x13;
    umid[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    umid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_umid_布局() {
        let a = new_umid();
        let b = new_umid();
        assert_eq!(&a[..4], &[0x06, 0x0a, 0x2b, 0x34]);
        assert_eq!(a[12], 0x13);
        assert_ne!(a[16..], b[16..]);
    }

    #[test]
    fn test_时间戳() {
        let ts = timestamp_now();
        let year = u16::from_be_bytes([ts[0], ts[1]]);
        assert!(year >= 2024);
        assert!((1..=12).contains(&ts[2]));
    }
}
