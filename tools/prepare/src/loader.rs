//! 从环境变量解析运行参数.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use edge_berry::consts::{env as vars, MEAN_FILE_NAME};
use edge_berry::dataset::home_dataset_dir_with;

use crate::error::{PrepareError, PrepareResult};

/// 默认验证集比例.
pub const DEFAULT_VALID_FRACTION: f64 = 0.1;

/// 默认 patch 边长.
pub const DEFAULT_PATCH_SIZE: usize = 32;

/// 运行参数.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub train_dir: PathBuf,
    pub test_dir: PathBuf,
    pub valid_fraction: f64,
    pub patch_size: usize,
    pub mean_file: PathBuf,
}

impl Settings {
    /// 从进程环境变量解析.
    ///
    /// 1. 若 `$EDGE_TRAIN_DIR` 非空, 训练集目录取其值; 否则为 `$HOME/dataset/edge/train`;
    /// 2. 若 `$EDGE_TEST_DIR` 非空, 测试集目录取其值; 否则为 `$HOME/dataset/edge/test`;
    /// 3. 若 `$EDGE_MEAN_FILE` 非空, 均值文件取其值; 否则为 `{训练集目录}/sample_mean.npy`.
    #[inline]
    pub fn from_env() -> PrepareResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 用 `lookup` 代替进程环境变量解析. 空字符串视为未设置.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> PrepareResult<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let dir = |name: &'static str, leaf: &str| match var(name) {
            Some(d) => Ok(PathBuf::from(d)),
            None => home_dataset_dir_with(["edge", leaf]).ok_or(PrepareError::NoHomeDir(name)),
        };
        let train_dir = dir(vars::TRAIN_DIR, "train")?;
        let test_dir = dir(vars::TEST_DIR, "test")?;

        let valid_fraction = parse_or(vars::VALID_FRACTION, var(vars::VALID_FRACTION), DEFAULT_VALID_FRACTION)?;
        let patch_size = parse_or(vars::PATCH_SIZE, var(vars::PATCH_SIZE), DEFAULT_PATCH_SIZE)?;

        let mean_file = match var(vars::MEAN_FILE) {
            Some(f) => PathBuf::from(f),
            None => train_dir.join(MEAN_FILE_NAME),
        };

        Ok(Self {
            train_dir,
            test_dir,
            valid_fraction,
            patch_size,
            mean_file,
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, value: Option<String>, default: T) -> PrepareResult<T> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| PrepareError::InvalidVar { name, value: v }),
    }
}
