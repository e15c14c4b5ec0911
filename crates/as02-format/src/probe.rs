//! 素材探测.
//!
//! 通过分析文件头部数据, 自动识别素材类型.

use as02_core::EssenceType;

/// 探测置信度
///
/// 数值越高, 表示对类型判断越有信心.
pub type ProbeScore = u32;

/// 最高探测分数 (魔数与参数完全匹配)
pub const SCORE_MAX: ProbeScore = 100;

/// 探测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    /// 识别出的素材类型
    pub essence_type: EssenceType,
    /// 置信度分数
    pub score: ProbeScore,
}

/// 素材探测器 trait
///
/// 每种素材解析器实现此 trait 以支持自动类型识别.
pub trait EssenceProbe {
    /// 根据文件头部数据探测素材类型
    ///
    /// # 参数
    /// - `data`: 文件开头的若干字节 (通常 8KB)
    ///
    /// # 返回
    /// - `Some(result)`: 识别成功
    /// - `None`: 不是此类素材
    fn probe(&self, data: &[u8]) -> Option<ProbeResult>;

    /// 探测器名称
    fn name(&self) -> &str;
}
