//! 数据集操作.
//!
//! 提供训练阶段的整图迭代器 ([`TrainingSetIterator`]), 推理阶段的滑窗扫描器
//! ([`ImageScanner`]), 以及划分训练/验证集并计算通道均值的 [`DatasetBuilder`].

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::DEFAULT_CHANNELS;
use crate::data::LoadError;

mod builder;
mod scanner;
mod train;

pub use builder::{average_train_data, prepare_data_set, split_counts, DataSet, DatasetBuilder};
pub use scanner::ImageScanner;
pub use train::TrainingSetIterator;

/// 数据集构建与遍历时的错误.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// 无法列出目录内容.
    #[error("failed to list directory `{path}`: {source}")]
    ReadDir {
        /// 目录路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: std::io::Error,
    },

    /// 单个样本文件加载失败.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// 验证集比例不在 `[0, 1]` 内.
    #[error("validation fraction must lie in [0, 1], got {0}")]
    InvalidFraction(f64),

    /// 通道数为 0.
    #[error("channel count must be positive")]
    ZeroChannels,

    /// patch 边长不是不小于 2 的偶数.
    #[error("patch size must be an even number no less than 2, got {0}")]
    InvalidPatchSize(usize),

    /// 掩码与图像的空间尺寸不一致.
    #[error("`{path}`: mask shape {mask:?} does not match image shape {image:?}")]
    MaskShape {
        /// 文件路径.
        path: PathBuf,
        /// 掩码 (高, 宽).
        mask: (usize, usize),
        /// 图像 (高, 宽).
        image: (usize, usize),
    },

    /// 文件列表为空, 无法迭代.
    #[error("file list is empty")]
    EmptyFileList,
}

/// 数据集操作结果.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// 数据集构建参数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetConfig {
    /// 样本文件所在目录.
    pub dir: PathBuf,

    /// 验证集所占比例, 取值范围 `[0, 1]`.
    pub valid_fraction: f64,

    /// 图像通道数.
    pub channels: usize,

    /// 是否计算训练集通道均值. 为 `false` 时均值为全零.
    pub subtract_mean: bool,
}

impl DatasetConfig {
    /// 单通道, 计算均值.
    pub fn new<P: AsRef<Path>>(dir: P, valid_fraction: f64) -> Self {
        Self {
            dir: dir.as_ref().to_owned(),
            valid_fraction,
            channels: DEFAULT_CHANNELS,
            subtract_mean: true,
        }
    }

    /// 指定通道数.
    #[inline]
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// 指定是否计算均值.
    #[inline]
    pub fn with_subtract_mean(mut self, subtract_mean: bool) -> Self {
        self.subtract_mean = subtract_mean;
        self
    }

    /// 检查参数是否合法.
    pub fn validate(&self) -> DatasetResult<()> {
        if !(0.0..=1.0).contains(&self.valid_fraction) {
            return Err(DatasetError::InvalidFraction(self.valid_fraction));
        }
        if self.channels == 0 {
            return Err(DatasetError::ZeroChannels);
        }
        Ok(())
    }
}

/// 列出 `dir` 下所有扩展名为 `extension` 的文件, 按路径排序.
///
/// 排序使划分结果不依赖于操作系统的目录遍历顺序. 不递归子目录.
pub fn list_sample_files<P: AsRef<Path>>(dir: P, extension: &str) -> DatasetResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let read_dir_err = |source| DatasetError::ReadDir {
        path: dir.to_owned(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sample_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.mat", "a.mat", "b.npz", "notes.txt", "d.MAT"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("sub.mat")).unwrap();

        let files = list_sample_files(dir.path(), "mat").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.mat", "c.mat"]);

        let files = list_sample_files(dir.path(), "npz").unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_list_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_sample_files(dir.path().join("nope"), "mat").unwrap_err();
        assert!(matches!(err, DatasetError::ReadDir { .. }));
    }

    #[test]
    fn test_config_validate() {
        assert!(DatasetConfig::new("x", 0.0).validate().is_ok());
        assert!(DatasetConfig::new("x", 1.0).validate().is_ok());
        assert!(matches!(
            DatasetConfig::new("x", 1.5).validate(),
            Err(DatasetError::InvalidFraction(_))
        ));
        assert!(DatasetConfig::new("x", f64::NAN).validate().is_err());
        assert!(matches!(
            DatasetConfig::new("x", 0.2).with_channels(0).validate(),
            Err(DatasetError::ZeroChannels)
        ));

        let cfg = DatasetConfig::new("x", 0.2)
            .with_channels(3)
            .with_subtract_mean(false);
        assert_eq!(cfg.channels, 3);
        assert!(!cfg.subtract_mean);
    }
}
