#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 为边缘检测网络提供数据输入: 训练阶段的整图迭代, 推理阶段的滑窗 patch 扫描,
//! 以及训练/验证集划分与通道均值计算.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 样本文件
//!
//! 每个样本是一个 MATLAB level-5 `.mat` 文件 (或等价的 `.npz` 归档), 包含三个同尺寸矩阵:
//!
//! 1. `level1Edge`: 网络输入, `[H, W]` 或 `[H, W, C]`;
//! 2. `GT`: 真值标签, `[H, W]`;
//! 3. `Mask`: 有效像素掩码, `[H, W]`, 非零像素有效.
//!
//! 矩阵名称可通过 [`data::SampleKeys`] 修改.
//!
//! # 注意
//!
//! 1. 图像在返回前已减去通道均值. 均值只在训练集上按 "文件均值的均值" 计算一次,
//!   以 [`ChannelMean`] 的形式被训练迭代器和扫描器共享.
//! 2. patch 边长必须是不小于 2 的偶数.
//! 3. 在非期望情况下 (例如越界的 patch 区域), 程序会直接 panic, 而不会导致内存错误.
//!
//! # 功能
//!
//! ### 样本加载 ✅
//!
//! `.mat` 和 `.npz` 两种后端, 都实现 [`SampleLoader`].
//!
//! 实现位于 `edge-berry/src/data`.
//!
//! ### 滑窗寻址 ✅
//!
//! 不可变游标 + 纯函数边界计算, 可并行提取整幅图像的全部 patch.
//!
//! 实现位于 `edge-berry/src/patch`.
//!
//! ### 数据集迭代 ✅
//!
//! 训练迭代器按轮打乱, 扫描器按行优先顺序遍历测试图像.
//!
//! 实现位于 `edge-berry/src/dataset`.

/// 二维索引 `(行, 列)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

pub mod consts;

pub mod data;

pub use data::{ChannelMean, Image, Label, Mask, Patch, Sample, SampleLoader};

pub mod patch;

pub mod dataset;
pub mod prelude;
