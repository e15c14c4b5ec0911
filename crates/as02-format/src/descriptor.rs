//! 素材描述符定义.
//!
//! 描述输入素材的类型、编辑速率与几何/音频参数.
//! 由解析器从输入推导, 打开容器前仅编辑速率会被配置覆盖.

use std::fmt::Write;

use as02_core::{EssenceType, Rational};

/// 素材描述符
#[derive(Debug, Clone, PartialEq)]
pub enum EssenceDescriptor {
    /// 图像素材
    Picture(PictureDescriptor),
    /// 音频素材
    Audio(AudioDescriptor),
}

impl EssenceDescriptor {
    /// 素材类型
    pub fn essence_type(&self) -> EssenceType {
        match self {
            Self::Picture(p) => p.essence_type,
            Self::Audio(a) => a.essence_type,
        }
    }

    /// 编辑速率
    pub fn edit_rate(&self) -> Rational {
        match self {
            Self::Picture(p) => p.edit_rate,
            Self::Audio(a) => a.edit_rate,
        }
    }

    /// 容器时长 (编辑单元数)
    pub fn container_duration(&self) -> u64 {
        match self {
            Self::Picture(p) => p.container_duration,
            Self::Audio(a) => a.container_duration,
        }
    }

    /// 获取图像描述符
    pub fn as_picture(&self) -> Option<&PictureDescriptor> {
        match self {
            Self::Picture(p) => Some(p),
            Self::Audio(_) => None,
        }
    }

    /// 获取音频描述符
    pub fn as_audio(&self) -> Option<&AudioDescriptor> {
        match self {
            Self::Audio(a) => Some(a),
            Self::Picture(_) => None,
        }
    }

    /// 生成诊断输出, 每行一个字段
    pub fn dump(&self) -> String {
        let mut out = format!(
            "{:>20}: {}\n{:>20}: {}\n{:>20}: {}",
            "EssenceType",
            self.essence_type(),
            "EditRate",
            self.edit_rate(),
            "ContainerDuration",
            self.container_duration()
        );
        let fields: Vec<(&str, String)> = match self {
            Self::Picture(p) => vec![
                ("StoredWidth", p.stored_width.to_string()),
                ("StoredHeight", p.stored_height.to_string()),
                ("AspectRatio", p.aspect_ratio.to_string()),
                ("Rsiz", p.j2k.rsiz.to_string()),
                ("Csize", p.j2k.components.len().to_string()),
                ("TileSize", format!("{}x{}", p.j2k.xtsiz, p.j2k.ytsiz)),
            ],
            Self::Audio(a) => vec![
                ("AudioSamplingRate", a.audio_sampling_rate.to_string()),
                ("ChannelCount", a.channel_count.to_string()),
                ("QuantizationBits", a.quantization_bits.to_string()),
                ("BlockAlign", a.block_align.to_string()),
                ("AvgBps", a.avg_bytes_per_second.to_string()),
                ("BytesPerFrame", a.bytes_per_frame.to_string()),
            ],
        };
        for (name, value) in fields {
            let _ = write!(out, "\n{:>20}: {}", name, value);
        }
        out
    }
}

/// JPEG 2000 分量采样参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentSizing {
    /// 位深与符号 (Ssiz)
    pub ssiz: u8,
    /// 水平采样间隔
    pub xrsiz: u8,
    /// 垂直采样间隔
    pub yrsiz: u8,
}

/// JPEG 2000 码流主头参数 (SIZ/COD/QCD)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct J2kParams {
    /// 能力 (Rsiz)
    pub rsiz: u16,
    /// 参考网格宽度
    pub xsiz: u32,
    /// 参考网格高度
    pub ysiz: u32,
    /// 图像水平偏移
    pub xosiz: u32,
    /// 图像垂直偏移
    pub yosiz: u32,
    /// 瓦片宽度
    pub xtsiz: u32,
    /// 瓦片高度
    pub ytsiz: u32,
    /// 瓦片水平偏移
    pub xtosiz: u32,
    /// 瓦片垂直偏移
    pub ytosiz: u32,
    /// 分量参数
    pub components: Vec<ComponentSizing>,
    /// COD 段原始字节 (不含标记与长度)
    pub cod: Vec<u8>,
    /// QCD 段原始字节 (不含标记与长度)
    pub qcd: Vec<u8>,
}

/// 图像描述符
#[derive(Debug, Clone, PartialEq)]
pub struct PictureDescriptor {
    /// 素材类型
    pub essence_type: EssenceType,
    /// 编辑速率
    pub edit_rate: Rational,
    /// 存储宽度
    pub stored_width: u32,
    /// 存储高度
    pub stored_height: u32,
    /// 显示宽高比
    pub aspect_ratio: Rational,
    /// 容器时长 (帧数)
    pub container_duration: u64,
    /// JPEG 2000 参数
    pub j2k: J2kParams,
}

/// 音频描述符
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDescriptor {
    /// 素材类型
    pub essence_type: EssenceType,
    /// 编辑速率
    pub edit_rate: Rational,
    /// 音频采样率
    pub audio_sampling_rate: Rational,
    /// 声道数
    pub channel_count: u32,
    /// 量化位数
    pub quantization_bits: u32,
    /// 块对齐 (所有声道一个采样的字节数)
    pub block_align: u32,
    /// 平均每秒字节数
    pub avg_bytes_per_second: u32,
    /// 容器时长 (编辑单元数)
    pub container_duration: u64,
    /// 每个编辑单元的字节数
    pub bytes_per_frame: u32,
}

impl AudioDescriptor {
    /// 每个编辑单元的采样数
    pub fn samples_per_frame(&self) -> u64 {
        self.audio_sampling_rate.units_per(self.edit_rate)
    }
}
