//! # as02
//!
//! 纯 Rust 实现的 AS-02 MXF 素材封装工具集.
//!
//! 把 JPEG 2000 码流序列或 24 位 PCM WAV 文件逐帧封装为 AS-02 MXF 文件,
//! 支持 AES-128-CBC 加密 (链式 IV) 与 HMAC-SHA1 完整性校验.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use as02::wrap::{ProductIdentity, WrapDriver, WrapOptions};
//!
//! let options = WrapOptions::new(vec!["frames/".into()], "picture.mxf");
//! let identity = ProductIdentity::new();
//! let report = WrapDriver::new(&options, &identity).run()?;
//! println!("写入 {} 帧", report.frames_written);
//! # Ok::<(), as02::core::As02Error>(())
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `as02-core` | 错误类型、编辑速率、帧缓冲区、UL |
//! | `as02-crypto` | AES-128-CBC 帧加密与 HMAC-SHA1 |
//! | `as02-format` | 素材解析与 AS-02 MXF 写入 |
//! | `as02-wrap` | 运行配置、密钥准备与封装驱动 |

/// 核心类型与工具
pub use as02_core as core;

/// 素材加密
pub use as02_crypto as crypto;

/// 素材解析与容器写入
pub use as02_format as format;

/// 封装驱动
pub use as02_wrap as wrap;
