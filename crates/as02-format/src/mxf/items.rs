//! 元数据属性字典.
//!
//! 每个属性由本地标签与通用标签组成; 本地标签为 0 表示需要动态分配.

use as02_core::Ul;

/// 元数据属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    /// 静态本地标签, 0 表示动态
    pub tag: u16,
    /// 通用标签
    pub ul: Ul,
}

/// 数据元素标签 (`06.0e.2b.34.01.01.01.vv.xx...`)
const fn elem(tag: u16, version: u8, t: [u8; 8]) -> Item {
    Item {
        tag,
        ul: Ul([
            0x06, 0x0e, 0x2b, 0x34, 0x01, 0x01, 0x01, version, t[0], t[1], t[2], t[3], t[4], t[5],
            t[6], t[7],
        ]),
    }
}

// 通用
pub const INSTANCE_UID: Item = elem(0x3c0a, 0x01, [0x01, 0x01, 0x15, 0x02, 0, 0, 0, 0]);
pub const GENERATION_UID: Item = elem(0x0102, 0x02, [0x05, 0x20, 0x07, 0x01, 0x08, 0, 0, 0]);

// Preface
pub const LAST_MODIFIED_DATE: Item = elem(0x3b02, 0x02, [0x07, 0x02, 0x01, 0x10, 0x02, 0x04, 0, 0]);
pub const VERSION: Item = elem(0x3b05, 0x02, [0x03, 0x01, 0x02, 0x01, 0x05, 0, 0, 0]);
pub const CONTENT_STORAGE_REF: Item =
    elem(0x3b03, 0x02, [0x06, 0x01, 0x01, 0x04, 0x02, 0x01, 0, 0]);
pub const IDENTIFICATIONS: Item = elem(0x3b06, 0x02, [0x06, 0x01, 0x01, 0x04, 0x06, 0x04, 0, 0]);
pub const OPERATIONAL_PATTERN: Item = elem(0x3b09, 0x05, [0x01, 0x02, 0x02, 0x03, 0, 0, 0, 0]);
pub const ESSENCE_CONTAINERS: Item = elem(0x3b0a, 0x05, [0x01, 0x02, 0x02, 0x10, 0x02, 0x01, 0, 0]);
pub const DM_SCHEMES: Item = elem(0x3b0b, 0x05, [0x01, 0x02, 0x02, 0x10, 0x02, 0x02, 0, 0]);

// Identification
pub const THIS_GENERATION_UID: Item = elem(0x3c09, 0x02, [0x05, 0x20, 0x07, 0x01, 0x01, 0, 0, 0]);
pub const COMPANY_NAME: Item = elem(0x3c01, 0x02, [0x05, 0x20, 0x07, 0x01, 0x02, 0x01, 0, 0]);
pub const PRODUCT_NAME: Item = elem(0x3c02, 0x02, [0x05, 0x20, 0x07, 0x01, 0x03, 0x01, 0, 0]);
pub const VERSION_STRING: Item = elem(0x3c04, 0x02, [0x05, 0x20, 0x07, 0x01, 0x05, 0x01, 0, 0]);
pub const PRODUCT_UID: Item = elem(0x3c05, 0x02, [0x05, 0x20, 0x07, 0x01, 0x07, 0, 0, 0]);
pub const MODIFICATION_DATE: Item = elem(0x3c06, 0x02, [0x07, 0x02, 0x01, 0x10, 0x02, 0x03, 0, 0]);

// Content Storage / Essence Container Data
pub const PACKAGES: Item = elem(0x1901, 0x02, [0x06, 0x01, 0x01, 0x04, 0x05, 0x01, 0, 0]);
pub const ESSENCE_CONTAINER_DATA_REFS: Item =
    elem(0x1902, 0x02, [0x06, 0x01, 0x01, 0x04, 0x05, 0x02, 0, 0]);
pub const LINKED_PACKAGE_UID: Item = elem(0x2701, 0x02, [0x06, 0x01, 0x01, 0x06, 0x01, 0, 0, 0]);
pub const INDEX_SID: Item = elem(0x3f06, 0x04, [0x01, 0x03, 0x04, 0x05, 0, 0, 0, 0]);
pub const BODY_SID: Item = elem(0x3f07, 0x04, [0x01, 0x03, 0x04, 0x04, 0, 0, 0, 0]);

// Package
pub const PACKAGE_UID: Item = elem(0x4401, 0x01, [0x01, 0x01, 0x15, 0x10, 0, 0, 0, 0]);
pub const PACKAGE_CREATION_DATE: Item =
    elem(0x4405, 0x02, [0x07, 0x02, 0x01, 0x10, 0x01, 0x03, 0, 0]);
pub const PACKAGE_MODIFIED_DATE: Item =
    elem(0x4404, 0x02, [0x07, 0x02, 0x01, 0x10, 0x02, 0x05, 0, 0]);
pub const TRACKS: Item = elem(0x4403, 0x02, [0x06, 0x01, 0x01, 0x04, 0x06, 0x05, 0, 0]);
pub const DESCRIPTOR_REF: Item = elem(0x4701, 0x02, [0x06, 0x01, 0x01, 0x04, 0x02, 0x03, 0, 0]);

// Track
pub const TRACK_ID: Item = elem(0x4801, 0x02, [0x01, 0x07, 0x01, 0x01, 0, 0, 0, 0]);
pub const TRACK_NUMBER: Item = elem(0x4804, 0x02, [0x01, 0x04, 0x01, 0x03, 0, 0, 0, 0]);
pub const EDIT_RATE: Item = elem(0x4b01, 0x02, [0x05, 0x30, 0x04, 0x05, 0, 0, 0, 0]);
pub const ORIGIN: Item = elem(0x4b02, 0x02, [0x07, 0x02, 0x01, 0x03, 0x01, 0x03, 0, 0]);
pub const SEQUENCE_REF: Item = elem(0x4803, 0x02, [0x06, 0x01, 0x01, 0x04, 0x02, 0x04, 0, 0]);

// Structural Component / Sequence / Source Clip / DM Segment
pub const DATA_DEFINITION: Item = elem(0x0201, 0x02, [0x04, 0x07, 0x01, 0, 0, 0, 0, 0]);
pub const DURATION: Item = elem(0x0202, 0x02, [0x07, 0x02, 0x02, 0x01, 0x01, 0x03, 0, 0]);
pub const STRUCTURAL_COMPONENTS: Item =
    elem(0x1001, 0x02, [0x06, 0x01, 0x01, 0x04, 0x06, 0x09, 0, 0]);
pub const START_POSITION: Item = elem(0x1201, 0x02, [0x07, 0x02, 0x01, 0x03, 0x01, 0x04, 0, 0]);
pub const SOURCE_PACKAGE_ID: Item = elem(0x1101, 0x02, [0x06, 0x01, 0x01, 0x03, 0x01, 0, 0, 0]);
pub const SOURCE_TRACK_ID: Item = elem(0x1102, 0x02, [0x06, 0x01, 0x01, 0x03, 0x02, 0, 0, 0]);
pub const DM_FRAMEWORK: Item = elem(0x6101, 0x02, [0x06, 0x01, 0x01, 0x04, 0x02, 0x0c, 0, 0]);

// File Descriptor
pub const SAMPLE_RATE: Item = elem(0x3001, 0x01, [0x04, 0x06, 0x01, 0x01, 0, 0, 0, 0]);
pub const CONTAINER_DURATION: Item = elem(0x3002, 0x01, [0x04, 0x06, 0x01, 0x02, 0, 0, 0, 0]);
pub const ESSENCE_CONTAINER: Item = elem(0x3004, 0x02, [0x06, 0x01, 0x01, 0x04, 0x01, 0x02, 0, 0]);
pub const LINKED_TRACK_ID: Item = elem(0x3006, 0x05, [0x06, 0x01, 0x01, 0x03, 0x05, 0, 0, 0]);
pub const SUB_DESCRIPTORS: Item = elem(0, 0x09, [0x06, 0x01, 0x01, 0x04, 0x06, 0x10, 0, 0]);

// Picture Descriptor
pub const PICTURE_ESSENCE_CODING: Item =
    elem(0x3201, 0x02, [0x04, 0x01, 0x06, 0x01, 0, 0, 0, 0]);
pub const STORED_HEIGHT: Item = elem(0x3202, 0x01, [0x04, 0x01, 0x05, 0x02, 0x01, 0, 0, 0]);
pub const STORED_WIDTH: Item = elem(0x3203, 0x01, [0x04, 0x01, 0x05, 0x02, 0x02, 0, 0, 0]);
pub const FRAME_LAYOUT: Item = elem(0x320c, 0x01, [0x04, 0x01, 0x03, 0x01, 0x04, 0, 0, 0]);
pub const ASPECT_RATIO: Item = elem(0x320e, 0x01, [0x04, 0x01, 0x01, 0x01, 0x01, 0, 0, 0]);

// JPEG 2000 子描述符 (动态标签)
pub const J2K_RSIZ: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x01, 0, 0, 0]);
pub const J2K_XSIZ: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x02, 0, 0, 0]);
pub const J2K_YSIZ: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x03, 0, 0, 0]);
pub const J2K_XOSIZ: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x04, 0, 0, 0]);
pub const J2K_YOSIZ: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x05, 0, 0, 0]);
pub const J2K_XTSIZ: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x06, 0, 0, 0]);
pub const J2K_YTSIZ: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x07, 0, 0, 0]);
pub const J2K_XTOSIZ: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x08, 0, 0, 0]);
pub const J2K_YTOSIZ: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x09, 0, 0, 0]);
pub const J2K_CSIZ: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x0a, 0, 0, 0]);
pub const J2K_COMPONENT_SIZING: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x0b, 0, 0, 0]);
pub const J2K_CODING_STYLE_DEFAULT: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x0c, 0, 0, 0]);
pub const J2K_QUANTIZATION_DEFAULT: Item = elem(0, 0x0a, [0x04, 0x01, 0x06, 0x03, 0x0d, 0, 0, 0]);

// Sound / Wave 描述符
pub const AUDIO_SAMPLING_RATE: Item =
    elem(0x3d03, 0x05, [0x04, 0x02, 0x03, 0x01, 0x01, 0x01, 0, 0]);
pub const LOCKED: Item = elem(0x3d02, 0x04, [0x04, 0x02, 0x03, 0x01, 0x04, 0, 0, 0]);
pub const CHANNEL_COUNT: Item = elem(0x3d07, 0x05, [0x04, 0x02, 0x01, 0x01, 0x04, 0, 0, 0]);
pub const QUANTIZATION_BITS: Item = elem(0x3d01, 0x04, [0x04, 0x02, 0x03, 0x03, 0x04, 0, 0, 0]);
pub const BLOCK_ALIGN: Item = elem(0x3d0a, 0x05, [0x04, 0x02, 0x03, 0x02, 0x01, 0, 0, 0]);
pub const AVG_BPS: Item = elem(0x3d09, 0x05, [0x04, 0x02, 0x03, 0x03, 0x05, 0, 0, 0]);
pub const CHANNEL_ASSIGNMENT: Item = elem(0, 0x07, [0x04, 0x02, 0x01, 0x01, 0x05, 0, 0, 0]);

// 加密元数据 (动态标签)
pub const CRYPTOGRAPHIC_CONTEXT_REF: Item =
    elem(0, 0x09, [0x06, 0x01, 0x01, 0x04, 0x02, 0x0d, 0, 0]);
pub const CONTEXT_ID: Item = elem(0, 0x09, [0x01, 0x01, 0x15, 0x11, 0, 0, 0, 0]);
pub const SOURCE_ESSENCE_CONTAINER: Item =
    elem(0, 0x09, [0x06, 0x01, 0x01, 0x02, 0x02, 0, 0, 0]);
pub const CIPHER_ALGORITHM: Item = elem(0, 0x09, [0x02, 0x09, 0x03, 0x01, 0x01, 0, 0, 0]);
pub const MIC_ALGORITHM: Item = elem(0, 0x09, [0x02, 0x09, 0x03, 0x02, 0x01, 0, 0, 0]);
pub const CRYPTOGRAPHIC_KEY_ID: Item = elem(0, 0x09, [0x02, 0x09, 0x03, 0x01, 0x02, 0, 0, 0]);

// 索引表段
pub const INDEX_EDIT_RATE: Item = elem(0x3f0b, 0x05, [0x05, 0x30, 0x04, 0x06, 0, 0, 0, 0]);
pub const INDEX_START_POSITION: Item =
    elem(0x3f0c, 0x05, [0x07, 0x02, 0x01, 0x03, 0x01, 0x0a, 0, 0]);
pub const INDEX_DURATION: Item = elem(0x3f0d, 0x05, [0x07, 0x02, 0x02, 0x01, 0x01, 0x02, 0, 0]);
pub const EDIT_UNIT_BYTE_COUNT: Item = elem(0x3f05, 0x04, [0x04, 0x06, 0x02, 0x01, 0, 0, 0, 0]);
pub const SLICE_COUNT: Item = elem(0x3f08, 0x04, [0x04, 0x04, 0x04, 0x01, 0x01, 0, 0, 0]);
pub const POS_TABLE_COUNT: Item = elem(0x3f0e, 0x05, [0x04, 0x04, 0x04, 0x01, 0x07, 0, 0, 0]);
pub const DELTA_ENTRY_ARRAY: Item = elem(0x3f09, 0x05, [0x04, 0x04, 0x04, 0x01, 0x06, 0, 0, 0]);
pub const INDEX_ENTRY_ARRAY: Item = elem(0x3f0a, 0x05, [0x04, 0x04, 0x04, 0x02, 0x05, 0, 0, 0]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_属性标签唯一() {
        let all = [
            INSTANCE_UID,
            CHANNEL_ASSIGNMENT,
            J2K_RSIZ,
            J2K_XSIZ,
            CONTEXT_ID,
            CRYPTOGRAPHIC_KEY_ID,
            CIPHER_ALGORITHM,
            MIC_ALGORITHM,
            INDEX_SID,
            BODY_SID,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.ul, b.ul);
            }
        }
        assert_eq!(CHANNEL_ASSIGNMENT.tag, 0);
        assert_eq!(&INSTANCE_UID.ul.0[..4], &[0x06, 0x0e, 0x2b, 0x34]);
    }
}
