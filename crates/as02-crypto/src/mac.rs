//! HMAC-SHA1 消息完整性码.
//!
//! MIC 密钥不直接使用内容密钥, 而是由内容密钥与固定随机数派生,
//! 派生方式随标签集版本不同.

use hmac::{Hmac, Mac};
use log::debug;
use sha1::{Digest, Sha1};

use as02_core::{As02Error, As02Result};

use crate::{KEY_LEN, MIC_LEN};

type HmacSha1 = Hmac<Sha1>;

/// 派生 MIC 密钥使用的固定随机数
const KEY_NONCE: [u8; KEY_LEN] = [
    0xa8, 0xe4, 0x1a, 0x2a, 0x4b, 0x7e, 0xd0, 0xb1, 0x28, 0x61, 0x46, 0x4a, 0xd5, 0xc4, 0x9c, 0x3e,
];

/// 标签集版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelSet {
    /// MXF Interop 标签集
    Interop,
    /// SMPTE 标签集 (AS-02 固定使用)
    #[default]
    Smpte,
}

/// 完整性校验上下文
pub struct HmacContext {
    mic_key: [u8; KEY_LEN],
    label_set: LabelSet,
}

impl HmacContext {
    /// 以内容密钥初始化
    ///
    /// 密钥长度不是 16 字节时返回 [`As02Error::MacKeyRejected`].
    pub fn new(key: &[u8], label_set: LabelSet) -> As02Result<Self> {
        if key.len() != KEY_LEN {
            return Err(As02Error::MacKeyRejected(format!(
                "HMAC 密钥应为 {} 字节, 实际 {} 字节",
                KEY_LEN,
                key.len()
            )));
        }
        let mic_key = derive_mic_key(key, label_set);
        debug!("HMAC 上下文已初始化, 标签集 {:?}", label_set);
        Ok(Self { mic_key, label_set })
    }

    /// 标签集版本
    pub fn label_set(&self) -> LabelSet {
        self.label_set
    }

    /// 对若干字节片段依次计算 MIC
    pub fn mic(&self, parts: &[&[u8]]) -> As02Result<[u8; MIC_LEN]> {
        let mut mac = HmacSha1::new_from_slice(&self.mic_key)
            .map_err(|e| As02Error::Crypto(format!("初始化 HMAC 失败: {}", e)))?;
        for part in parts {
            mac.update(part);
        }
        let digest = mac.finalize().into_bytes();
        let mut out = [0u8; MIC_LEN];
        out.copy_from_slice(&digest);
        Ok(out)
    }
}

/// 由内容密钥派生 MIC 密钥
///
/// - Interop: `SHA1(key | nonce)` 取前 16 字节
/// - SMPTE: 两轮 SHA1 扩展出 40 字节, 取第二段的前 16 字节
fn derive_mic_key(key: &[u8], label_set: LabelSet) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    match label_set {
        LabelSet::Interop => {
            let digest = Sha1::new()
                .chain_update(key)
                .chain_update(KEY_NONCE)
                .finalize();
            out.copy_from_slice(&digest[..KEY_LEN]);
        }
        LabelSet::Smpte => {
            let first = Sha1::new()
                .chain_update(KEY_NONCE)
                .chain_update(key)
                .chain_update([0u8])
                .finalize();
            let second = Sha1::new()
                .chain_update(first)
                .chain_update(key)
                .chain_update([1u8])
                .finalize();
            out.copy_from_slice(&second[..KEY_LEN]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_密钥长度校验() {
        assert!(HmacContext::new(&[1u8; 16], LabelSet::Smpte).is_ok());
        let err = HmacContext::new(&[1u8; 8], LabelSet::Smpte).err().unwrap();
        assert!(matches!(err, As02Error::MacKeyRejected(_)));
    }

    #[test]
    fn test_mic_确定性() {
        let ctx = HmacContext::new(&[3u8; 16], LabelSet::Smpte).unwrap();
        let a = ctx.mic(&[b"hello".as_slice(), b" world".as_slice()]).unwrap();
        let b = ctx.mic(&[b"hello world".as_slice()]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, ctx.mic(&[b"hello".as_slice()]).unwrap());
    }

    #[test]
    fn test_标签集影响派生密钥() {
        let key = [9u8; 16];
        let smpte = HmacContext::new(&key, LabelSet::Smpte).unwrap();
        let interop = HmacContext::new(&key, LabelSet::Interop).unwrap();
        assert_eq!(smpte.label_set(), LabelSet::Smpte);
        let part: &[u8] = b"x";
        assert_ne!(smpte.mic(&[part]).unwrap(), interop.mic(&[part]).unwrap());
    }

    #[test]
    fn test_mic_不等于内容密钥直接计算() {
        let key = [5u8; 16];
        let ctx = HmacContext::new(&key, LabelSet::Smpte).unwrap();
        let mut direct = HmacSha1::new_from_slice(&key).unwrap();
        direct.update(b"data");
        let direct = direct.finalize().into_bytes();
        assert_ne!(&ctx.mic(&[b"data".as_slice()]).unwrap()[..], &direct[..]);
    }
}
