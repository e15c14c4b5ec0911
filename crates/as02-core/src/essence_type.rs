//! 素材类型定义.
//!
//! 识别器给出的素材标签, 决定本次运行使用哪一组解析器/写入器.

use std::fmt;

/// 素材类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EssenceType {
    /// JPEG 2000 码流序列
    Jpeg2000,
    /// 24 位 48kHz PCM
    Pcm24b48k,
    /// 24 位 96kHz PCM
    Pcm24b96k,
}

impl EssenceType {
    /// 是否为图像素材
    pub const fn is_picture(&self) -> bool {
        matches!(self, Self::Jpeg2000)
    }

    /// 是否为音频素材
    pub const fn is_audio(&self) -> bool {
        matches!(self, Self::Pcm24b48k | Self::Pcm24b96k)
    }

    /// 音频采样率 (Hz), 图像素材返回 None
    pub const fn sample_rate(&self) -> Option<u32> {
        match self {
            Self::Jpeg2000 => None,
            Self::Pcm24b48k => Some(48_000),
            Self::Pcm24b96k => Some(96_000),
        }
    }

    /// 素材名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Jpeg2000 => "jpeg2000",
            Self::Pcm24b48k => "pcm_24b_48k",
            Self::Pcm24b96k => "pcm_24b_96k",
        }
    }
}

impl fmt::Display for EssenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
