//! 密钥材料准备.
//!
//! 仅在请求加密时运行一次, 且在打开输出容器之前完成.
//! 任何失败都会在创建输出文件之前终止运行.

use log::debug;

use as02_core::{As02Result, UUID_LEN};
use as02_crypto::{CipherContext, HmacContext, Iv, random_bytes};
use as02_format::WriterInfo;

/// 一次运行的加密会话
pub struct CryptoSession {
    /// 加密上下文
    pub cipher: CipherContext,
    /// 完整性校验上下文 (禁用 HMAC 时为 None)
    pub hmac: Option<HmacContext>,
    /// 加密上下文 ID
    pub context_id: [u8; UUID_LEN],
    /// 密钥 ID
    pub key_id: [u8; UUID_LEN],
    /// 链式 IV 的起点
    pub initial_iv: Iv,
}

/// 解析资产 ID: 指定则使用, 否则随机生成
pub fn resolve_asset_id(supplied: Option<[u8; UUID_LEN]>) -> [u8; UUID_LEN] {
    supplied.unwrap_or_else(random_bytes)
}

/// 准备密钥材料并标记写入方信息为加密
///
/// 写入方信息中的 `uses_hmac` 与返回会话中 HMAC 上下文是否存在保持一致.
pub fn provision(
    key: &[u8],
    key_id: Option<[u8; UUID_LEN]>,
    write_hmac: bool,
    info: &mut WriterInfo,
) -> As02Result<CryptoSession> {
    let context_id: [u8; UUID_LEN] = random_bytes();
    let key_id = key_id.unwrap_or_else(random_bytes);

    let cipher = CipherContext::new(key)?;
    let initial_iv: Iv = random_bytes();
    let hmac = if write_hmac {
        Some(HmacContext::new(key, info.label_set)?)
    } else {
        None
    };

    info.encrypted_essence = true;
    info.uses_hmac = hmac.is_some();
    info.context_id = context_id;
    info.cryptographic_key_id = key_id;
    debug!(
        "加密已启用: 密钥 ID {}, HMAC {}",
        hex::encode(key_id),
        if info.uses_hmac { "开启" } else { "关闭" }
    );

    Ok(CryptoSession {
        cipher,
        hmac,
        context_id,
        key_id,
        initial_iv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use as02_core::As02Error;

    const KEY: [u8; 16] = [0x11; 16];

    #[test]
    fn test_hmac_标志一致() {
        for write_hmac in [true, false] {
            let mut info = WriterInfo::default();
            let session = provision(&KEY, None, write_hmac, &mut info).unwrap();
            assert!(info.encrypted_essence);
            assert_eq!(info.uses_hmac, write_hmac);
            assert_eq!(info.uses_hmac, session.hmac.is_some());
            assert_eq!(info.context_id, session.context_id);
        }
    }

    #[test]
    fn test_密钥_id() {
        let id = [0x42u8; UUID_LEN];
        let mut a = WriterInfo::default();
        let mut b = WriterInfo::default();
        provision(&KEY, Some(id), true, &mut a).unwrap();
        provision(&KEY, Some(id), true, &mut b).unwrap();
        assert_eq!(a.cryptographic_key_id, b.cryptographic_key_id);
        // 上下文 ID 每次都重新生成
        assert_ne!(a.context_id, b.context_id);

        let mut c = WriterInfo::default();
        let mut d = WriterInfo::default();
        provision(&KEY, None, true, &mut c).unwrap();
        provision(&KEY, None, true, &mut d).unwrap();
        assert_ne!(c.cryptographic_key_id, d.cryptographic_key_id);
    }

    #[test]
    fn test_密钥长度错误() {
        let mut info = WriterInfo::default();
        let err = provision(&[0u8; 15], None, true, &mut info).err().unwrap();
        assert!(matches!(err, As02Error::KeyRejected(_)));
        assert!(!info.encrypted_essence);
    }

    #[test]
    fn test_资产_id() {
        let id = [3u8; UUID_LEN];
        assert_eq!(resolve_asset_id(Some(id)), id);
        assert_ne!(resolve_asset_id(None), resolve_asset_id(None));
    }
}
