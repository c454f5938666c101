//! 样本文件加载错误.

use ndarray_npy::ReadNpzError;
use std::path::PathBuf;
use thiserror::Error;

/// 加载单个样本文件时的错误. 每个变体都带有出错文件的路径.
#[derive(Debug, Error)]
pub enum LoadError {
    /// 底层 I/O 错误.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// 文件路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: std::io::Error,
    },

    /// MAT 文件解析失败.
    #[error("failed to parse mat file `{path}`: {source}")]
    Mat {
        /// 文件路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: matfile::Error,
    },

    /// npz 归档读取失败.
    #[error("failed to read npz archive `{path}`: {source}")]
    Npz {
        /// 文件路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: ReadNpzError,
    },

    /// 文件中缺少指定名称的矩阵.
    #[error("`{path}` has no matrix named `{key}`")]
    MissingKey {
        /// 文件路径.
        path: PathBuf,
        /// 矩阵名.
        key: String,
    },

    /// 矩阵形状无法转换为期望的形状.
    #[error("`{path}`: matrix `{key}` of shape {shape:?} cannot be read as {expected}")]
    Shape {
        /// 文件路径.
        path: PathBuf,
        /// 矩阵名.
        key: String,
        /// 文件中的实际形状.
        shape: Vec<usize>,
        /// 期望形状的描述.
        expected: String,
    },

    /// 标签矩阵含有不能无损转换为 `u8` 的值 (小数, 负数, 大于 255 或 NaN).
    #[error("`{path}`: matrix `{key}` holds {value}, expected an integer in [0, 255]")]
    LabelValue {
        /// 文件路径.
        path: PathBuf,
        /// 矩阵名.
        key: String,
        /// 第一个不合法的值.
        value: f64,
    },

    /// 矩阵元素类型不受支持 (例如 cell, struct, 稀疏矩阵).
    #[error("`{path}`: matrix `{key}` has an unsupported element class")]
    UnsupportedClass {
        /// 文件路径.
        path: PathBuf,
        /// 矩阵名.
        key: String,
    },
}

/// 样本加载结果.
pub type LoadResult<T> = Result<T, LoadError>;
