//! 样本数据结构与样本文件加载.

use std::path::Path;

use ndarray::{Array3, Array4, ArrayD, Axis, Ix3, Ix4};

use crate::consts::keys;
use crate::Idx2d;

mod error;
mod mat;
pub mod mean;
mod npz;

pub use error::{LoadError, LoadResult};
pub use mat::MatLoader;
pub use mean::ChannelMean;
pub use npz::NpzLoader;

#[cfg(test)]
pub(crate) use mat::fixture as mat_fixture;
#[cfg(test)]
pub(crate) use npz::fixture as npz_fixture;

/// 图像, 形状为 `[1, H, W, C]`, 已 (或将) 减去通道均值.
pub type Image = Array4<f32>;

/// 图像块, 形状为 `[1, P, P, C]`. 内容是图像裁剪区域的转置.
pub type Patch = Array4<f32>;

/// 真值标签图, 形状为 `[1, H, W]`.
pub type Label = Array3<u8>;

/// 有效像素掩码, 形状为 `[1, H, W]`. 非零像素有效.
pub type Mask = Array3<u8>;

/// 一个完整的训练样本.
#[derive(Clone, Debug)]
pub struct Sample {
    /// 输入图像.
    pub image: Image,

    /// 真值标签.
    pub label: Label,

    /// 有效像素掩码.
    pub mask: Mask,
}

impl Sample {
    /// 图像空间尺寸 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let (h, w, _) = image_shape(&self.image);
        (h, w)
    }

    /// 图像通道数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.image.dim().3
    }
}

/// 获取图像的 (高, 宽, 通道数).
#[inline]
pub fn image_shape(image: &Image) -> (usize, usize, usize) {
    let (_, h, w, c) = image.dim();
    (h, w, c)
}

/// 样本文件中三个矩阵的名称. 默认值见 [`crate::consts::keys`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleKeys {
    /// 输入图像.
    pub image: String,

    /// 真值标签.
    pub label: String,

    /// 有效像素掩码.
    pub mask: String,
}

impl Default for SampleKeys {
    fn default() -> Self {
        Self {
            image: keys::IMAGE.to_owned(),
            label: keys::LABEL.to_owned(),
            mask: keys::MASK.to_owned(),
        }
    }
}

/// 样本文件加载器. 遍历逻辑只通过该 trait 接触文件格式.
pub trait SampleLoader {
    /// 该加载器能处理的文件扩展名 (不含 `.`).
    fn extension(&self) -> &str;

    /// 只加载输入图像 (推理阶段使用), 并整理成 `[1, H, W, channels]`.
    fn load_image(&self, path: &Path, channels: usize) -> LoadResult<Image>;

    /// 加载图像, 标签和掩码.
    fn load_sample(&self, path: &Path, channels: usize) -> LoadResult<Sample>;
}

fn shape_error(path: &Path, key: &str, shape: &[usize], expected: String) -> LoadError {
    LoadError::Shape {
        path: path.to_owned(),
        key: key.to_owned(),
        shape: shape.to_vec(),
        expected,
    }
}

/// 将 `[H, W]` (仅当 `channels == 1`) 或 `[H, W, channels]` 的矩阵转换为图像.
pub(crate) fn into_image(
    raw: ArrayD<f32>,
    channels: usize,
    path: &Path,
    key: &str,
) -> LoadResult<Image> {
    let shape = raw.shape().to_vec();
    let expected = || format!("[H, W, {channels}]");
    let raw = match shape.as_slice() {
        [_, _] if channels == 1 => raw.insert_axis(Axis(2)),
        [_, _, c] if *c == channels => raw,
        _ => return Err(shape_error(path, key, &shape, expected())),
    };
    let image = raw
        .insert_axis(Axis(0))
        .into_dimensionality::<Ix4>()
        .map_err(|_| shape_error(path, key, &shape, expected()))?;
    Ok(image.as_standard_layout().into_owned())
}

/// 将 `[H, W]` 的矩阵转换为 `[1, H, W]`.
pub(crate) fn into_plane<A: Clone>(
    raw: ArrayD<A>,
    path: &Path,
    key: &str,
) -> LoadResult<Array3<A>> {
    let shape = raw.shape().to_vec();
    if shape.len() != 2 {
        return Err(shape_error(path, key, &shape, "[H, W]".to_owned()));
    }
    let plane = raw
        .insert_axis(Axis(0))
        .into_dimensionality::<Ix3>()
        .map_err(|_| shape_error(path, key, &shape, "[H, W]".to_owned()))?;
    Ok(plane.as_standard_layout().into_owned())
}
