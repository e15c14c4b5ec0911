//! # as02-wrap
//!
//! AS-02 素材封装驱动.
//!
//! - [`WrapOptions`]: 一次运行的全部配置
//! - [`ProductIdentity`]: 写入容器的产品身份
//! - [`keys`]: 加密密钥材料准备
//! - [`WrapDriver`]: 识别素材并驱动逐帧封装

pub mod driver;
pub mod identity;
pub mod keys;
pub mod options;
pub mod strategy;

pub use driver::{StopReason, WrapDriver, WrapReport};
pub use identity::ProductIdentity;
pub use keys::CryptoSession;
pub use options::WrapOptions;
pub use strategy::{AudioEssence, EssenceStrategy, FrameAction, PictureEssence};
