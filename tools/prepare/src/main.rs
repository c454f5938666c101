//! 准备训练数据: 计算训练集通道均值并持久化, 并检查测试集的滑窗扫描.
//!
//! 参数全部来自环境变量, 见 [`loader::Settings::from_env`].

use std::process::ExitCode;

use log::LevelFilter;
use simple_logger::SimpleLogger;

mod error;
mod loader;
mod report;
mod runner;

fn main() -> ExitCode {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Info).env().init() {
        eprintln!("failed to install logger: {e}");
    }

    match loader::Settings::from_env().and_then(|s| runner::run(&s)) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
