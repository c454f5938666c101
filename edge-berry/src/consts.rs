//! 通用常量.

/// 样本文件中各矩阵的名称.
pub mod keys {
    /// 边缘检测响应图 (网络输入) 的矩阵名.
    pub const IMAGE: &str = "level1Edge";

    /// 真值标签图的矩阵名.
    pub const LABEL: &str = "GT";

    /// 有效像素掩码的矩阵名.
    pub const MASK: &str = "Mask";
}

/// 样本文件扩展名.
pub mod ext {
    /// MATLAB level-5 文件.
    pub const MAT: &str = "mat";

    /// NumPy 压缩归档.
    pub const NPZ: &str = "npz";
}

/// `tools/prepare` 读取的环境变量名.
pub mod env {
    /// 训练集目录.
    pub const TRAIN_DIR: &str = "EDGE_TRAIN_DIR";

    /// 测试集目录.
    pub const TEST_DIR: &str = "EDGE_TEST_DIR";

    /// 验证集比例.
    pub const VALID_FRACTION: &str = "EDGE_VALID_FRACTION";

    /// 滑窗 patch 边长.
    pub const PATCH_SIZE: &str = "EDGE_PATCH_SIZE";

    /// 通道均值的持久化路径.
    pub const MEAN_FILE: &str = "EDGE_MEAN_FILE";
}

/// 默认通道数. 边缘响应图通常是单通道的.
pub const DEFAULT_CHANNELS: usize = 1;

/// 通道均值默认的持久化文件名.
pub const MEAN_FILE_NAME: &str = "sample_mean.npy";
