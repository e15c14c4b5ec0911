//! 产品身份.
//!
//! 启动时构建一次, 显式传给封装驱动.

use as02_core::UUID_LEN;
use as02_crypto::LabelSet;
use as02_format::WriterInfo;

/// 产品 UUID
const PRODUCT_UUID: [u8; UUID_LEN] = [
    0x7d, 0x83, 0x6e, 0x16, 0x37, 0xc7, 0x4c, 0x22, 0xb2, 0xe0, 0x46, 0xa7, 0x17, 0xe8, 0x4f, 0x42,
];

/// 产品身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductIdentity {
    /// 公司名称
    pub company_name: String,
    /// 产品名称
    pub product_name: String,
    /// 产品版本
    pub product_version: String,
    /// 产品 UUID
    pub product_uuid: [u8; UUID_LEN],
}

impl ProductIdentity {
    /// 本工具的身份
    pub fn new() -> Self {
        Self {
            company_name: "WidgetCo".into(),
            product_name: "as-02-wrap".into(),
            product_version: env!("CARGO_PKG_VERSION").into(),
            product_uuid: PRODUCT_UUID,
        }
    }

    /// 生成写入方信息 (未加密, SMPTE 标签集)
    pub fn writer_info(&self, asset_uuid: [u8; UUID_LEN]) -> WriterInfo {
        WriterInfo {
            product_version: self.product_version.clone(),
            company_name: self.company_name.clone(),
            product_name: self.product_name.clone(),
            product_uuid: self.product_uuid,
            asset_uuid,
            label_set: LabelSet::Smpte,
            ..WriterInfo::default()
        }
    }
}

impl Default for ProductIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_产品_uuid() {
        let id = ProductIdentity::new();
        let text = uuid::Uuid::from_bytes(id.product_uuid).hyphenated().to_string();
        assert_eq!(text, "7d836e16-37c7-4c22-b2e0-46a717e84f42");
        assert_eq!(id.company_name, "WidgetCo");
    }

    #[test]
    fn test_写入方信息() {
        let info = ProductIdentity::new().writer_info([9u8; UUID_LEN]);
        assert_eq!(info.asset_uuid, [9u8; UUID_LEN]);
        assert_eq!(info.label_set, LabelSet::Smpte);
        assert!(!info.encrypted_essence);
        assert!(!info.uses_hmac);
    }
}
