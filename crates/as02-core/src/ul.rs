//! SMPTE 通用标签 (Universal Label).
//!
//! 16 字节标识, 文本形式为点分十六进制 (如 `060e2b34.0401.0101...`).

use std::fmt;

use crate::{As02Error, As02Result};

/// 16 字节通用标签
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ul(pub [u8; 16]);

impl Ul {
    /// 从字节构建
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// 从十六进制文本解析, 允许 `.` 与 `-` 分隔符
    pub fn from_hex(text: &str) -> As02Result<Self> {
        let digits: String = text
            .chars()
            .filter(|c| *c != '.' && *c != '-')
            .collect();
        let bytes = hex::decode(&digits)
            .map_err(|e| As02Error::InvalidArgument(format!("无效的 UL '{}': {}", text, e)))?;
        let array: [u8; 16] = bytes.try_into().map_err(|b: Vec<u8>| {
            As02Error::InvalidArgument(format!("UL 长度应为 16 字节, 实际 {} 字节", b.len()))
        })?;
        Ok(Self(array))
    }

    /// 原始字节
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// 比较时忽略版本字节 (第 8 字节)
    pub fn matches_ignoring_version(&self, other: &Ul) -> bool {
        self.0[..7] == other.0[..7] && self.0[8..] == other.0[8..]
    }
}

impl fmt::Display for Ul {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{}.{}.{}.{}",
            hex::encode(&b[0..4]),
            hex::encode(&b[4..8]),
            hex::encode(&b[8..12]),
            hex::encode(&b[12..16])
        )
    }
}

impl fmt::Debug for Ul {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ul({})", self)
    }
}
