//! as-02-wrap - AS-02 MXF 素材封装命令行工具
//!
//! 把 JPEG 2000 码流序列或一组 24 位 PCM WAV 文件封装为单个 AS-02 MXF 文件,
//! 可选 AES-128 加密与 HMAC 完整性校验.
//!
//! 退出码: 0 成功, 1 处理出错, 3 配置错误, 5 无法识别的素材.

mod args;
mod logging;

use std::process;

use clap::{CommandFactory, Parser};
use log::info;

use as02_core::As02Error;
use as02_wrap::{ProductIdentity, WrapDriver};

use args::{Cli, normalize_args};

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_CONFIG: i32 = 3;
const EXIT_UNRECOGNIZED: i32 = 5;

fn main() {
    process::exit(run(std::env::args()));
}

fn run(args: impl IntoIterator<Item = String>) -> i32 {
    let args = match normalize_args(args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("使用 -h 查看用法");
            return EXIT_CONFIG;
        }
    };
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            return EXIT_CONFIG;
        }
    };

    if cli.help {
        print_usage();
        return EXIT_OK;
    }
    if cli.version {
        print_banner();
        return EXIT_OK;
    }

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("警告: {e:#}");
    }

    let options = match cli.to_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("使用 -h 查看用法");
            return EXIT_CONFIG;
        }
    };

    let identity = ProductIdentity::new();
    match WrapDriver::new(&options, &identity).run() {
        Ok(report) => {
            info!(
                "{}: 读取 {} 帧, 写入 {} 帧 ({:?})",
                report.essence_type, report.frames_read, report.frames_written, report.stop
            );
            EXIT_OK
        }
        Err(e @ As02Error::UnrecognizedEssence(_)) => {
            eprintln!("{e}");
            EXIT_UNRECOGNIZED
        }
        Err(e) => {
            eprintln!("Program stopped on error.");
            eprintln!("{e}");
            EXIT_FAILURE
        }
    }
}

fn print_banner() {
    let identity = ProductIdentity::new();
    println!(
        "{} {} ({}) -- AS-02 素材封装工具",
        identity.product_name, identity.product_version, identity.company_name
    );
}

fn print_usage() {
    print_banner();
    println!();
    println!("{}", Cli::command().render_help());
}
