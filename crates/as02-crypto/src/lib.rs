//! # as02-crypto
//!
//! AS-02 素材加密库.
//!
//! - [`CipherContext`]: AES-128-CBC 帧加密, 输出下一帧使用的 IV (链式 IV)
//! - [`HmacContext`]: HMAC-SHA1 消息完整性码 (MIC)
//! - [`FrameCrypto`]: 写入一帧时传给容器写入器的加密参数

pub mod cipher;
pub mod mac;

pub use cipher::{CipherContext, EncryptedFrame};
pub use mac::{HmacContext, LabelSet};

use rand::RngCore;

/// AES-128 密钥长度
pub const KEY_LEN: usize = 16;

/// CBC 分组长度
pub const CBC_BLOCK_SIZE: usize = 16;

/// 初始化向量
pub type Iv = [u8; CBC_BLOCK_SIZE];

/// MIC 长度 (SHA-1 摘要长度)
pub const MIC_LEN: usize = 20;

/// 生成 N 字节随机数
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// 单帧加密参数
///
/// 由封装驱动按帧构造, `iv` 为上一帧返回的链式 IV.
pub struct FrameCrypto<'a> {
    /// 加密上下文
    pub cipher: &'a CipherContext,
    /// 本帧起始 IV
    pub iv: Iv,
    /// 完整性校验上下文 (禁用 HMAC 时为 None)
    pub hmac: Option<&'a HmacContext>,
}
