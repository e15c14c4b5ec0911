//! # as02-core
//!
//! AS-02 封装工具核心库, 提供基础类型定义、错误处理和工具函数.
//!
//! 本 crate 为整个工作区提供底层基础设施: 统一错误类型、编辑速率、
//! 素材类型标签、可复用帧缓冲区以及 SMPTE 通用标签 (UL).

pub mod error;
pub mod essence_type;
pub mod frame_buffer;
pub mod rational;
pub mod ul;

// 重导出常用类型
pub use error::{As02Error, As02Result};
pub use essence_type::EssenceType;
pub use frame_buffer::FrameBuffer;
pub use rational::Rational;
pub use ul::Ul;

/// 16 字节 UUID 长度
pub const UUID_LEN: usize = 16;
