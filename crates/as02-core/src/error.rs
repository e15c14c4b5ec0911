//! 统一错误类型定义.
//!
//! 所有 as02 crate 共用的错误类型, 支持跨模块传播.
//! `Eof` 是正常结束标记, 只有封装驱动会把它转换为成功.

use thiserror::Error;

/// 统一错误类型
#[derive(Debug, Error)]
pub enum As02Error {
    /// 无效参数 (配置错误)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 容器格式错误
    #[error("格式错误: {0}")]
    Format(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达输入末尾
    #[error("已到达输入末尾")]
    Eof,

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 帧缓冲区容量不足
    #[error("帧缓冲区容量不足: 需要 {needed} 字节, 容量 {capacity} 字节")]
    SmallBuffer { needed: usize, capacity: usize },

    /// 无法识别的素材类型
    #[error("无法识别的素材类型: {0}")]
    UnrecognizedEssence(String),

    /// 加密密钥被拒绝
    #[error("加密密钥被拒绝: {0}")]
    KeyRejected(String),

    /// HMAC 密钥被拒绝
    #[error("HMAC 密钥被拒绝: {0}")]
    MacKeyRejected(String),

    /// 无法打开输出容器
    #[error("无法打开输出容器: {0}")]
    ContainerOpenFailed(String),

    /// 加密运算失败
    #[error("加密错误: {0}")]
    Crypto(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

impl As02Error {
    /// 是否为正常结束标记
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }
}

/// 统一 Result 类型
pub type As02Result<T> = Result<T, As02Error>;
