//! 命令行参数.
//!
//! 所有标志彼此独立, 不允许合并书写 (`-vW` 会被拒绝).
//! 位置参数为一个或多个输入, 最后一个为输出文件.

use std::path::PathBuf;

use clap::Parser;

use as02_core::{As02Error, As02Result, Ul};
use as02_wrap::WrapOptions;
use as02_wrap::options::{parse_edit_rate, parse_hex16, parse_uuid};

/// AS-02 素材封装工具
#[derive(Parser, Debug)]
#[command(
    name = "as-02-wrap",
    about = "将 JPEG 2000 码流序列或 PCM WAV 文件封装为 AS-02 MXF",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// 资产 ID (32 位十六进制 UUID)
    #[arg(short = 'a', value_name = "UUID")]
    pub asset_id: Option<String>,

    /// 声道分配标签 (16 字节十六进制 UL)
    #[arg(short = 'C', value_name = "UL")]
    pub channel_assignment: Option<String>,

    /// 加密密钥 ID (16 字节十六进制)
    #[arg(short = 'j', value_name = "HEX")]
    pub key_id: Option<String>,

    /// 加密密钥 (16 字节十六进制), 提供时启用加密
    #[arg(short = 'k', value_name = "HEX")]
    pub key: Option<String>,

    /// 加密 JPEG 2000 码流主头 (默认)
    #[arg(short = 'e', overrides_with = "no_encrypt_header")]
    pub encrypt_header: bool,

    /// 不加密 JPEG 2000 码流主头
    #[arg(short = 'E', overrides_with = "encrypt_header")]
    pub no_encrypt_header: bool,

    /// 不生成 HMAC
    #[arg(short = 'M')]
    pub no_hmac: bool,

    /// 编辑速率 (分母固定为 1)
    #[arg(short = 'p', value_name = "RATE")]
    pub edit_rate: Option<String>,

    /// 帧缓冲区大小 (字节)
    #[arg(short = 'b', value_name = "BYTES")]
    pub fb_size: Option<usize>,

    /// 起始帧
    #[arg(short = 'f', value_name = "N")]
    pub start_frame: Option<u64>,

    /// 处理帧数
    #[arg(short = 'd', value_name = "N")]
    pub duration: Option<u64>,

    /// 严格比较 JPEG 2000 参数 (默认)
    #[arg(short = 'z', overrides_with = "lenient")]
    pub pedantic: bool,

    /// 宽松比较 JPEG 2000 参数
    #[arg(short = 'Z', overrides_with = "pedantic")]
    pub lenient: bool,

    /// 只解析输入, 不写出文件
    #[arg(short = 'W')]
    pub no_write: bool,

    /// 输出详细信息
    #[arg(short = 'v')]
    pub verbose: bool,

    /// 显示帮助
    #[arg(short = 'h')]
    pub help: bool,

    /// 显示版本
    #[arg(short = 'V')]
    pub version: bool,

    /// 输入文件或目录, 最后一个为输出文件
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

/// 预处理参数: `-help` 等价于 `-h`, 拒绝合并书写的短标志
pub fn normalize_args<I>(args: I) -> As02Result<Vec<String>>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    for (i, arg) in args.into_iter().enumerate() {
        if i > 0 && arg == "-help" {
            out.push("-h".to_string());
            continue;
        }
        if i > 0 && arg.starts_with('-') && !arg.starts_with("--") && arg.chars().count() > 2 {
            return Err(As02Error::InvalidArgument(format!(
                "标志不能合并书写: {}",
                arg
            )));
        }
        out.push(arg);
    }
    Ok(out)
}

impl Cli {
    /// 转换为运行配置
    pub fn to_options(&self) -> As02Result<WrapOptions> {
        if self.paths.len() < 2 {
            return Err(As02Error::InvalidArgument(
                "需要至少一个输入和一个输出文件".into(),
            ));
        }
        let (output, inputs) = self
            .paths
            .split_last()
            .ok_or_else(|| As02Error::InvalidArgument("缺少输出文件".into()))?;

        let mut opts = WrapOptions::new(inputs.to_vec(), output.clone());
        if let Some(text) = &self.asset_id {
            opts.asset_id = Some(parse_uuid("-a", text)?);
        }
        if let Some(text) = &self.channel_assignment {
            opts.channel_assignment = Some(Ul::from_hex(text)?);
        }
        if let Some(text) = &self.key_id {
            opts.key_id = Some(parse_hex16("-j", text)?);
        }
        if let Some(text) = &self.key {
            opts.key = Some(parse_hex16("-k", text)?.to_vec());
        }
        if let Some(text) = &self.edit_rate {
            opts.edit_rate = parse_edit_rate(text)?;
        }
        if let Some(size) = self.fb_size {
            opts.fb_size = size;
        }
        if let Some(start) = self.start_frame {
            opts.start_frame = start;
        }
        opts.duration = self.duration;
        opts.encrypt_header = !self.no_encrypt_header;
        opts.write_hmac = !self.no_hmac;
        opts.pedantic = !self.lenient;
        opts.no_write = self.no_write;
        opts.verbose = self.verbose;
        opts.validate()?;
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> As02Result<WrapOptions> {
        let args = normalize_args(args.iter().map(|s| s.to_string()))?;
        let cli = Cli::try_parse_from(args)
            .map_err(|e| As02Error::InvalidArgument(e.to_string()))?;
        cli.to_options()
    }

    #[test]
    fn test_默认选项() {
        let opts = parse(&["as-02-wrap", "in", "out.mxf"]).unwrap();
        assert_eq!(opts.inputs, vec![PathBuf::from("in")]);
        assert_eq!(opts.output, PathBuf::from("out.mxf"));
        assert!(opts.encrypt_header && opts.write_hmac && opts.pedantic);
        assert_eq!(opts.duration, None);
    }

    #[test]
    fn test_完整选项() {
        let opts = parse(&[
            "as-02-wrap",
            "-k",
            "00112233445566778899aabbccddeeff",
            "-j",
            "ffeeddccbbaa99887766554433221100",
            "-E",
            "-M",
            "-Z",
            "-p",
            "25",
            "-f",
            "2",
            "-d",
            "5",
            "-W",
            "a.wav",
            "b.wav",
            "out.mxf",
        ])
        .unwrap();
        assert_eq!(opts.inputs.len(), 2);
        assert!(opts.encrypting());
        assert!(!opts.encrypt_header && !opts.write_hmac && !opts.pedantic);
        assert_eq!(opts.edit_rate.num, 25);
        assert_eq!((opts.start_frame, opts.duration), (2, Some(5)));
        assert!(opts.no_write);
    }

    #[test]
    fn test_后出现的标志生效() {
        let opts = parse(&["as-02-wrap", "-E", "-e", "in", "out.mxf"]).unwrap();
        assert!(opts.encrypt_header);
    }

    #[test]
    fn test_拒绝合并标志() {
        assert!(normalize_args(["as-02-wrap", "-vW"].map(String::from)).is_err());
        let args = normalize_args(["as-02-wrap", "-help"].map(String::from)).unwrap();
        assert_eq!(args[1], "-h");
    }

    #[test]
    fn test_配置错误() {
        // 密钥 ID 只有 15 字节
        let err = parse(&[
            "as-02-wrap",
            "-j",
            "000102030405060708090a0b0c0d0e",
            "in",
            "out.mxf",
        ])
        .unwrap_err();
        assert!(matches!(err, As02Error::InvalidArgument(_)));
        assert!(parse(&["as-02-wrap", "out.mxf"]).is_err());
        assert!(parse(&["as-02-wrap", "-C", "0102", "in", "out.mxf"]).is_err());
    }

    #[test]
    fn test_密钥长度错误() {
        for key in ["000102030405060708090a0b0c0d0e", "000102030405060708090a0b0c0d0e0f10"] {
            let err = parse(&["as-02-wrap", "-k", key, "in", "out.mxf"]).unwrap_err();
            assert!(matches!(err, As02Error::InvalidArgument(_)));
        }
        let opts = parse(&[
            "as-02-wrap",
            "-k",
            "000102030405060708090a0b0c0d0e0f",
            "in",
            "out.mxf",
        ])
        .unwrap();
        assert_eq!(opts.key.as_deref().map(<[u8]>::len), Some(16));
    }
}
