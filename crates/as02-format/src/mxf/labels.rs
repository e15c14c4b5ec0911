//! 通用标签 (UL) 常量.
//!
//! 分区包、集合键、素材容器与元素键、加密相关标签.

use as02_core::Ul;

/// SMPTE 标签前缀
pub const SMPTE_PREFIX: [u8; 4] = [0x06, 0x0e, 0x2b, 0x34];

/// 构造 `06.0e.2b.34` 前缀的标签
const fn smpte(tail: [u8; 12]) -> Ul {
    Ul([
        0x06, 0x0e, 0x2b, 0x34, tail[0], tail[1], tail[2], tail[3], tail[4], tail[5], tail[6],
        tail[7], tail[8], tail[9], tail[10], tail[11],
    ])
}

/// 结构元数据集合键 (`06.0e.2b.34.02.53.01.01.0d.01.01.01.01.01.xx.00`)
const fn set_key(id: u8) -> Ul {
    smpte([
        0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, id, 0x00,
    ])
}

/// 分区包键 (`06.0e.2b.34.02.05.01.01.0d.01.02.01.01.kk.ss.00`)
pub const fn partition_pack(kind: u8, status: u8) -> Ul {
    smpte([
        0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, kind, status, 0x00,
    ])
}

// ========================
// 文件结构
// ========================

/// Primer Pack
pub const PRIMER_PACK: Ul = smpte([
    0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x05, 0x01, 0x00,
]);

/// 填充项
pub const FILL_ITEM: Ul = smpte([
    0x01, 0x01, 0x01, 0x02, 0x03, 0x01, 0x02, 0x10, 0x01, 0x00, 0x00, 0x00,
]);

/// 索引表段
pub const INDEX_TABLE_SEGMENT: Ul = smpte([
    0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x10, 0x01, 0x00,
]);

/// 随机索引包
pub const RANDOM_INDEX_PACK: Ul = smpte([
    0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x11, 0x01, 0x00,
]);

/// OP1a 操作模式
pub const OP1A: Ul = smpte([
    0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x01, 0x09, 0x00,
]);

// ========================
// 元数据集合
// ========================

/// Preface
pub const PREFACE: Ul = set_key(0x2f);
/// Identification
pub const IDENTIFICATION: Ul = set_key(0x30);
/// Content Storage
pub const CONTENT_STORAGE: Ul = set_key(0x18);
/// Essence Container Data
pub const ESSENCE_CONTAINER_DATA: Ul = set_key(0x23);
/// Material Package
pub const MATERIAL_PACKAGE: Ul = set_key(0x36);
/// Source Package (File Package)
pub const SOURCE_PACKAGE: Ul = set_key(0x37);
/// Timeline Track
pub const TIMELINE_TRACK: Ul = set_key(0x3b);
/// Static Track
pub const STATIC_TRACK: Ul = set_key(0x3a);
/// Sequence
pub const SEQUENCE: Ul = set_key(0x0f);
/// Source Clip
pub const SOURCE_CLIP: Ul = set_key(0x11);
/// DM Segment
pub const DM_SEGMENT: Ul = set_key(0x41);
/// RGBA 图像描述符
pub const RGBA_DESCRIPTOR: Ul = set_key(0x29);
/// Wave 音频描述符
pub const WAVE_AUDIO_DESCRIPTOR: Ul = set_key(0x48);
/// JPEG 2000 图像子描述符
pub const JPEG2000_SUB_DESCRIPTOR: Ul = set_key(0x5a);

/// 加密框架 (Cryptographic Framework)
pub const CRYPTOGRAPHIC_FRAMEWORK: Ul = smpte([
    0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x04, 0x01, 0x02, 0x01, 0x00, 0x00,
]);

/// 加密上下文 (Cryptographic Context)
pub const CRYPTOGRAPHIC_CONTEXT: Ul = smpte([
    0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x04, 0x01, 0x02, 0x02, 0x00, 0x00,
]);

/// 加密描述性元数据方案
pub const DM_SCHEME_CRYPTOGRAPHIC: Ul = smpte([
    0x04, 0x01, 0x01, 0x07, 0x0d, 0x01, 0x04, 0x01, 0x02, 0x00, 0x00, 0x00,
]);

// ========================
// 数据定义
// ========================

/// 图像数据定义
pub const DATA_DEF_PICTURE: Ul = smpte([
    0x04, 0x01, 0x01, 0x01, 0x01, 0x03, 0x02, 0x02, 0x01, 0x00, 0x00, 0x00,
]);

/// 声音数据定义
pub const DATA_DEF_SOUND: Ul = smpte([
    0x04, 0x01, 0x01, 0x01, 0x01, 0x03, 0x02, 0x02, 0x02, 0x00, 0x00, 0x00,
]);

/// 描述性元数据数据定义
pub const DATA_DEF_DESCRIPTIVE: Ul = smpte([
    0x04, 0x01, 0x01, 0x01, 0x01, 0x03, 0x02, 0x01, 0x10, 0x00, 0x00, 0x00,
]);

// ========================
// 素材容器与元素键
// ========================

/// JPEG 2000 帧封装素材容器
pub const ESSENCE_CONTAINER_JPEG2000: Ul = smpte([
    0x04, 0x01, 0x01, 0x07, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x0c, 0x01, 0x00,
]);

/// WAVE 帧封装素材容器
pub const ESSENCE_CONTAINER_WAVE: Ul = smpte([
    0x04, 0x01, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x06, 0x01, 0x00,
]);

/// 加密素材容器
pub const ESSENCE_CONTAINER_ENCRYPTED: Ul = smpte([
    0x04, 0x01, 0x01, 0x07, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x0b, 0x01, 0x00,
]);

/// JPEG 2000 图像编码
pub const PICTURE_CODING_JPEG2000: Ul = smpte([
    0x04, 0x01, 0x01, 0x07, 0x04, 0x01, 0x02, 0x02, 0x03, 0x01, 0x01, 0x7f,
]);

/// JPEG 2000 图像元素键 (帧封装)
pub const ELEMENT_JPEG2000: Ul = smpte([
    0x01, 0x02, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x15, 0x01, 0x08, 0x01,
]);

/// WAVE 声音元素键 (帧封装)
pub const ELEMENT_WAVE: Ul = smpte([
    0x01, 0x02, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x16, 0x01, 0x01, 0x01,
]);

/// SMPTE 429-6 加密三元组键
pub const ENCRYPTED_TRIPLET: Ul = smpte([
    0x02, 0x04, 0x01, 0x07, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x7e, 0x01, 0x00,
]);

// ========================
// 加密算法
// ========================

/// AES-128-CBC 加密算法
pub const CIPHER_AES_128_CBC: Ul = smpte([
    0x04, 0x01, 0x01, 0x07, 0x02, 0x09, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00,
]);

/// HMAC-SHA1 完整性算法
pub const MIC_HMAC_SHA1: Ul = smpte([
    0x04, 0x01, 0x01, 0x07, 0x02, 0x09, 0x02, 0x02, 0x01, 0x00, 0x00, 0x00,
]);

/// 未使用完整性算法
pub const MIC_NONE: Ul = Ul([0u8; 16]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_集合键布局() {
        assert_eq!(&PREFACE.0[..4], &SMPTE_PREFIX);
        assert_eq!(PREFACE.0[14], 0x2f);
        assert_eq!(WAVE_AUDIO_DESCRIPTOR.0[14], 0x48);
    }

    #[test]
    fn test_分区包键() {
        let ul = partition_pack(0x02, 0x04);
        assert_eq!(ul.0[13], 0x02);
        assert_eq!(ul.0[14], 0x04);
        assert!(ul.matches_ignoring_version(&partition_pack(0x02, 0x04)));
    }
}
