//! 容器写入器 (Container Writer) trait 定义.
//!
//! 将素材帧写入 AS-02 MXF 容器.

use std::fmt;
use std::path::Path;

use as02_core::{As02Result, FrameBuffer, UUID_LEN};
use as02_crypto::{FrameCrypto, Iv, LabelSet};

use crate::descriptor::EssenceDescriptor;
use crate::mxf::metadata::HeaderMetadata;

/// 写入方身份信息
///
/// 每次运行在打开容器之前创建一次, 之后不再修改.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterInfo {
    /// 产品版本
    pub product_version: String,
    /// 公司名称
    pub company_name: String,
    /// 产品名称
    pub product_name: String,
    /// 产品 UUID
    pub product_uuid: [u8; UUID_LEN],
    /// 资产 UUID (即轨道文件 ID)
    pub asset_uuid: [u8; UUID_LEN],
    /// 标签集版本
    pub label_set: LabelSet,
    /// 素材是否加密
    pub encrypted_essence: bool,
    /// 是否附带 HMAC
    pub uses_hmac: bool,
    /// 加密上下文 ID
    pub context_id: [u8; UUID_LEN],
    /// 加密密钥 ID
    pub cryptographic_key_id: [u8; UUID_LEN],
}

impl Default for WriterInfo {
    fn default() -> Self {
        Self {
            product_version: String::new(),
            company_name: String::new(),
            product_name: String::new(),
            product_uuid: [0u8; UUID_LEN],
            asset_uuid: [0u8; UUID_LEN],
            label_set: LabelSet::Smpte,
            encrypted_essence: false,
            uses_hmac: false,
            context_id: [0u8; UUID_LEN],
            cryptographic_key_id: [0u8; UUID_LEN],
        }
    }
}

/// 索引表写入策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexStrategy {
    /// 索引分区位于对应素材之前
    Lead,
    /// 索引分区紧随对应素材之后
    #[default]
    Follow,
    /// 仅在文件尾写入索引
    Only,
}

impl fmt::Display for IndexStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lead => "lead",
            Self::Follow => "follow",
            Self::Only => "only",
        };
        write!(f, "{}", name)
    }
}

/// 容器写入器 trait
///
/// 使用流程:
/// 1. 调用 `open_write()` 创建文件并写入头分区
/// 2. 可选: 通过 `header_mut()` 调整头部元数据
/// 3. 循环调用 `write_frame()` 写入帧, 返回值为下一帧使用的 IV
/// 4. 调用 `finalize()` 写入索引/尾分区并重写头分区
pub trait ContainerWriter {
    /// 写入器名称
    fn name(&self) -> &str;

    /// 创建输出文件并写入头分区
    fn open_write(
        &mut self,
        path: &Path,
        info: &WriterInfo,
        descriptor: &EssenceDescriptor,
    ) -> As02Result<()>;

    /// 头部元数据 (仅在打开后可用)
    fn header_mut(&mut self) -> As02Result<&mut HeaderMetadata>;

    /// 写入一帧
    ///
    /// 提供加密参数时按 SMPTE 429-6 加密, 返回下一帧的 IV; 否则返回 None.
    fn write_frame(
        &mut self,
        frame: &FrameBuffer,
        crypto: Option<FrameCrypto<'_>>,
    ) -> As02Result<Option<Iv>>;

    /// 已写入帧数
    fn frames_written(&self) -> u64;

    /// 完成封装
    fn finalize(&mut self) -> As02Result<()>;
}
