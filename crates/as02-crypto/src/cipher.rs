//! AES-128-CBC 帧加密.
//!
//! 加密后的源值 (Encrypted Source Value) 布局:
//! ```text
//! IV (16) | E(检查值) (16) | 明文前缀 | E(剩余数据 + PKCS#7 填充)
//! ```
//! 检查值与剩余数据在同一条 CBC 链上加密, 最后一个密文分组即下一帧的 IV.

use aes::cipher::{BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use as02_core::{As02Error, As02Result};

use crate::{CBC_BLOCK_SIZE, Iv, KEY_LEN};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

/// 解密端用于验证密钥正确性的固定检查值
pub const CHECK_VALUE: &[u8; CBC_BLOCK_SIZE] = b"CHUKCHUKCHUKCHUK";

/// 一帧加密结果
#[derive(Debug, Clone)]
pub struct EncryptedFrame {
    /// 加密后的源值
    pub value: Vec<u8>,
    /// 下一帧使用的 IV
    pub next_iv: Iv,
}

/// 加密上下文
pub struct CipherContext {
    key: [u8; KEY_LEN],
}

impl CipherContext {
    /// 以原始密钥初始化
    ///
    /// 密钥长度不是 16 字节时返回 [`As02Error::KeyRejected`].
    pub fn new(key: &[u8]) -> As02Result<Self> {
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| {
            As02Error::KeyRejected(format!(
                "AES-128 密钥应为 {} 字节, 实际 {} 字节",
                KEY_LEN,
                key.len()
            ))
        })?;
        Ok(Self { key })
    }

    /// 加密一帧
    ///
    /// 前 `plaintext_offset` 字节保持明文, 其余部分连同检查值一起加密.
    pub fn encrypt_frame(
        &self,
        iv: &Iv,
        frame: &[u8],
        plaintext_offset: usize,
    ) -> As02Result<EncryptedFrame> {
        if plaintext_offset > frame.len() {
            return Err(As02Error::Crypto(format!(
                "明文偏移 {} 超出帧长度 {}",
                plaintext_offset,
                frame.len()
            )));
        }
        let (clear, secret) = frame.split_at(plaintext_offset);

        let mut input = Vec::with_capacity(CBC_BLOCK_SIZE + secret.len());
        input.extend_from_slice(CHECK_VALUE);
        input.extend_from_slice(secret);

        let encryptor = Aes128CbcEnc::new_from_slices(&self.key, iv)
            .map_err(|e| As02Error::Crypto(format!("初始化 CBC 失败: {}", e)))?;
        let cipher_text = encryptor.encrypt_padded_vec_mut::<Pkcs7>(&input);

        let mut next_iv = [0u8; CBC_BLOCK_SIZE];
        next_iv.copy_from_slice(&cipher_text[cipher_text.len() - CBC_BLOCK_SIZE..]);

        // 组装: IV | E(检查值) | 明文前缀 | 其余密文
        let mut value = Vec::with_capacity(Self::encrypted_len(frame.len(), plaintext_offset));
        value.extend_from_slice(iv);
        value.extend_from_slice(&cipher_text[..CBC_BLOCK_SIZE]);
        value.extend_from_slice(clear);
        value.extend_from_slice(&cipher_text[CBC_BLOCK_SIZE..]);

        Ok(EncryptedFrame { value, next_iv })
    }

    /// 计算加密后的源值长度
    pub fn encrypted_len(source_len: usize, plaintext_offset: usize) -> usize {
        let secret = source_len.saturating_sub(plaintext_offset);
        let padded = (secret / CBC_BLOCK_SIZE + 1) * CBC_BLOCK_SIZE;
        CBC_BLOCK_SIZE * 2 + plaintext_offset.min(source_len) + padded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockDecryptMut;

    type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

    const KEY: [u8; 16] = [7u8; 16];

    #[test]
    fn test_密钥长度校验() {
        assert!(CipherContext::new(&KEY).is_ok());
        let err = CipherContext::new(&[0u8; 15]).err().unwrap();
        assert!(matches!(err, As02Error::KeyRejected(_)));
    }

    #[test]
    fn test_加密布局与解密() {
        let ctx = CipherContext::new(&KEY).unwrap();
        let iv = [1u8; 16];
        let frame: Vec<u8> = (0..100u8).collect();
        let out = ctx.encrypt_frame(&iv, &frame, 10).unwrap();

        assert_eq!(out.value.len(), CipherContext::encrypted_len(100, 10));
        assert_eq!(&out.value[..16], &iv);
        assert_eq!(&out.value[32..42], &frame[..10]);
        assert_eq!(&out.value[out.value.len() - 16..], &out.next_iv);

        // 还原密文链并解密
        let mut chain = Vec::new();
        chain.extend_from_slice(&out.value[16..32]);
        chain.extend_from_slice(&out.value[42..]);
        let plain = Aes128CbcDec::new_from_slices(&KEY, &iv)
            .unwrap()
            .decrypt_padded_vec_mut::<Pkcs7>(&chain)
            .unwrap();
        assert_eq!(&plain[..16], CHECK_VALUE);
        assert_eq!(&plain[16..], &frame[10..]);
    }

    #[test]
    fn test_链式_iv_变化() {
        let ctx = CipherContext::new(&KEY).unwrap();
        let iv0 = [0u8; 16];
        let frame = vec![0x55u8; 64];
        let a = ctx.encrypt_frame(&iv0, &frame, 0).unwrap();
        let b = ctx.encrypt_frame(&a.next_iv, &frame, 0).unwrap();
        assert_ne!(a.next_iv, iv0);
        assert_ne!(b.next_iv, a.next_iv);
        assert_ne!(b.next_iv, iv0);
    }

    #[test]
    fn test_明文偏移越界() {
        let ctx = CipherContext::new(&KEY).unwrap();
        let err = ctx.encrypt_frame(&[0u8; 16], &[0u8; 4], 5).unwrap_err();
        assert!(matches!(err, As02Error::Crypto(_)));
    }
}
