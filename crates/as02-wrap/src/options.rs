//! 运行配置.
//!
//! [`WrapOptions`] 是一次封装运行的全部已解析选项, 运行开始后不再修改.
//! 本模块同时提供命令行文本到强类型值的解析函数, 解析失败一律返回
//! [`As02Error::InvalidArgument`].

use std::path::PathBuf;

use log::warn;

use as02_core::{As02Error, As02Result, Rational, UUID_LEN, Ul};
use as02_format::IndexStrategy;

/// 默认帧缓冲区大小 (4 MiB)
pub const DEFAULT_FB_SIZE: usize = 4 * 1024 * 1024;

/// 默认体分区间隔 (秒)
pub const DEFAULT_PARTITION_SPACE: u32 = 60;

/// 封装运行配置
#[derive(Debug, Clone)]
pub struct WrapOptions {
    /// 输入文件或目录
    pub inputs: Vec<PathBuf>,
    /// 输出 MXF 路径
    pub output: PathBuf,
    /// 起始帧
    pub start_frame: u64,
    /// 处理帧数, None 表示直到输入结束
    pub duration: Option<u64>,
    /// 帧缓冲区大小 (图像素材)
    pub fb_size: usize,
    /// 编辑速率
    pub edit_rate: Rational,
    /// 加密密钥 (提供时启用加密)
    pub key: Option<Vec<u8>>,
    /// 密钥 ID
    pub key_id: Option<[u8; UUID_LEN]>,
    /// 资产 ID
    pub asset_id: Option<[u8; UUID_LEN]>,
    /// 声道分配标签
    pub channel_assignment: Option<Ul>,
    /// 是否加密 JPEG 2000 码流主头
    pub encrypt_header: bool,
    /// 是否生成 HMAC
    pub write_hmac: bool,
    /// 严格比较 JPEG 2000 参数
    pub pedantic: bool,
    /// 只解析不写出
    pub no_write: bool,
    /// 输出逐帧诊断
    pub verbose: bool,
    /// 索引策略
    pub index_strategy: IndexStrategy,
    /// 体分区间隔 (秒)
    pub partition_space: u32,
}

impl WrapOptions {
    /// 以默认值创建
    pub fn new(inputs: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            inputs,
            output: output.into(),
            start_frame: 0,
            duration: None,
            fb_size: DEFAULT_FB_SIZE,
            edit_rate: Rational::EDIT_RATE_24,
            key: None,
            key_id: None,
            asset_id: None,
            channel_assignment: None,
            encrypt_header: true,
            write_hmac: true,
            pedantic: true,
            no_write: false,
            verbose: false,
            index_strategy: IndexStrategy::Follow,
            partition_space: DEFAULT_PARTITION_SPACE,
        }
    }

    /// 是否启用加密
    pub fn encrypting(&self) -> bool {
        self.key.is_some()
    }

    /// 检查选项之间的一致性
    pub fn validate(&self) -> As02Result<()> {
        if self.inputs.is_empty() {
            return Err(As02Error::InvalidArgument("至少需要一个输入".into()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(As02Error::InvalidArgument("缺少输出文件".into()));
        }
        if self.fb_size == 0 {
            return Err(As02Error::InvalidArgument("帧缓冲区大小不能为 0".into()));
        }
        if !self.edit_rate.is_valid() {
            return Err(As02Error::InvalidArgument(format!(
                "无效的编辑速率: {}",
                self.edit_rate
            )));
        }
        if self.partition_space == 0 {
            return Err(As02Error::InvalidArgument("体分区间隔不能为 0".into()));
        }
        if self.key_id.is_some() && !self.encrypting() {
            warn!("未提供密钥, 密钥 ID 将被忽略");
        }
        Ok(())
    }
}

/// 解析十六进制字节串
pub fn parse_hex(name: &str, text: &str) -> As02Result<Vec<u8>> {
    hex::decode(text.trim())
        .map_err(|e| As02Error::InvalidArgument(format!("{} 不是有效的十六进制: {}", name, e)))
}

/// 解析恰好 16 字节的十六进制值
pub fn parse_hex16(name: &str, text: &str) -> As02Result<[u8; UUID_LEN]> {
    let bytes = parse_hex(name, text)?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        As02Error::InvalidArgument(format!(
            "{} 应为 {} 字节, 实际 {} 字节",
            name,
            UUID_LEN,
            b.len()
        ))
    })
}

/// 解析 UUID (32 位十六进制, 允许 `-` 分隔)
pub fn parse_uuid(name: &str, text: &str) -> As02Result<[u8; UUID_LEN]> {
    uuid::Uuid::try_parse(text.trim())
        .map(|u| *u.as_bytes())
        .map_err(|e| As02Error::InvalidArgument(format!("{} 不是有效的 UUID: {}", name, e)))
}

/// 解析编辑速率
///
/// 只使用分子, 分母固定为 1. 带 `/d` 后缀时忽略分母并给出警告.
pub fn parse_edit_rate(text: &str) -> As02Result<Rational> {
    let (num_text, den_text) = match text.split_once('/') {
        Some((n, d)) => (n, Some(d)),
        None => (text, None),
    };
    let num: i32 = num_text
        .trim()
        .parse()
        .map_err(|_| As02Error::InvalidArgument(format!("无效的编辑速率: {}", text)))?;
    if num <= 0 {
        return Err(As02Error::InvalidArgument(format!(
            "编辑速率必须为正数: {}",
            text
        )));
    }
    if let Some(den) = den_text {
        warn!("编辑速率分母 '{}' 被忽略, 使用 {}/1", den, num);
    }
    Ok(Rational::new(num, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_默认值() {
        let opts = WrapOptions::new(vec![PathBuf::from("in")], "out.mxf");
        assert_eq!(opts.edit_rate, Rational::new(24, 1));
        assert_eq!(opts.fb_size, 4 * 1024 * 1024);
        assert_eq!(opts.index_strategy, IndexStrategy::Follow);
        assert_eq!(opts.partition_space, 60);
        assert!(opts.encrypt_header && opts.write_hmac && opts.pedantic);
        assert!(!opts.encrypting());
        opts.validate().unwrap();
    }

    #[test]
    fn test_十六进制长度() {
        let id = parse_hex16("-j", "000102030405060708090a0b0c0d0e0f").unwrap();
        assert_eq!(id[15], 0x0f);
        // 15 字节
        let err = parse_hex16("-j", "000102030405060708090a0b0c0d0e").unwrap_err();
        assert!(matches!(err, As02Error::InvalidArgument(_)));
        assert!(parse_hex16("-j", "zz").is_err());
    }

    #[test]
    fn test_uuid_允许连字符() {
        let a = parse_uuid("-a", "7d836e16-37c7-4c22-b2e0-46a717e84f42").unwrap();
        let b = parse_uuid("-a", "7d836e1637c74c22b2e046a717e84f42").unwrap();
        assert_eq!(a, b);
        assert!(parse_uuid("-a", "7d836e16").is_err());
    }

    #[test]
    fn test_编辑速率() {
        assert_eq!(parse_edit_rate("25").unwrap(), Rational::new(25, 1));
        assert_eq!(parse_edit_rate("30000/1001").unwrap(), Rational::new(30000, 1));
        assert!(parse_edit_rate("0").is_err());
        assert!(parse_edit_rate("abc").is_err());
    }

    #[test]
    fn test_校验失败() {
        let mut opts = WrapOptions::new(Vec::new(), "out.mxf");
        assert!(opts.validate().is_err());
        opts.inputs.push(PathBuf::from("in"));
        opts.fb_size = 0;
        assert!(opts.validate().is_err());
    }
}
