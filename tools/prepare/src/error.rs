//! 运行错误.

use std::path::PathBuf;

use edge_berry::dataset::DatasetError;
use ndarray_npy::WriteNpyError;
use thiserror::Error;

/// 准备数据时的错误.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// 无法确定用户主目录, 且对应的环境变量未设置.
    #[error("cannot determine home directory, set `{0}` instead")]
    NoHomeDir(&'static str),

    /// 环境变量的值无法解析.
    #[error("environment variable `{name}` has invalid value `{value}`")]
    InvalidVar { name: &'static str, value: String },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// 通道均值写入失败.
    #[error("failed to write mean to `{path}`: {source}")]
    WriteMean {
        path: PathBuf,
        #[source]
        source: WriteNpyError,
    },
}

pub type PrepareResult<T> = Result<T, PrepareError>;
