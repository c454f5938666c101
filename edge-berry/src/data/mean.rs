//! 通道均值.
//!
//! 均值在构建数据集时计算一次, 之后只读, 由训练集迭代器与滑窗扫描器共享.

use std::path::Path;
use std::sync::Arc;

use ndarray::{Array1, ArrayView1, Axis, Zip};
use ndarray_npy::{read_npy, write_npy, ReadNpyError, WriteNpyError};

use super::{Image, Mask};

/// 不可变的逐通道均值. 克隆开销很小, 所有克隆共享同一份数据.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelMean(Arc<Array1<f32>>);

impl ChannelMean {
    /// 由逐通道数值直接构建.
    #[inline]
    pub fn new(values: Array1<f32>) -> Self {
        Self(Arc::new(values))
    }

    /// 全零均值. 减去它不改变图像.
    #[inline]
    pub fn zeros(channels: usize) -> Self {
        Self::new(Array1::zeros(channels))
    }

    /// 通道数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.0.len()
    }

    /// 底层数据的只读视图.
    #[inline]
    pub fn view(&self) -> ArrayView1<'_, f32> {
        self.0.view()
    }

    /// 第 `channel` 个通道的均值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, channel: usize) -> Option<f32> {
        self.0.get(channel).copied()
    }

    /// 从图像的每个通道减去对应均值, 原地修改.
    ///
    /// 图像通道数必须与 `self.channels()` 一致, 否则程序 panic.
    /// 调用方 (迭代器) 在加载时已经按通道数整理过图像, 因此这里不返回错误.
    pub fn subtract_from(&self, image: &mut Image) {
        assert_eq!(image.dim().3, self.channels(), "图像通道数与均值长度不符");
        *image -= &self.view();
    }

    /// 从 `.npy` 文件读取.
    pub fn read_npy<P: AsRef<Path>>(path: P) -> Result<Self, ReadNpyError> {
        read_npy::<_, Array1<f32>>(path).map(Self::new)
    }

    /// 写入 `.npy` 文件. 调用方负责跨运行复用.
    pub fn write_npy<P: AsRef<Path>>(&self, path: P) -> Result<(), WriteNpyError> {
        write_npy(path, &*self.0)
    }
}

impl From<Vec<f32>> for ChannelMean {
    #[inline]
    fn from(values: Vec<f32>) -> Self {
        Self::new(Array1::from(values))
    }
}

/// 计算单幅图像在掩码有效像素 (非零) 上的逐通道均值.
///
/// 若没有任何有效像素, 或掩码与图像的空间尺寸不同, 则返回 `None`.
pub fn masked_channel_mean(image: &Image, mask: &Mask) -> Option<Array1<f64>> {
    let (_, h, w, c) = image.dim();
    if mask.dim() != (1, h, w) {
        return None;
    }
    let mut sum = Array1::<f64>::zeros(c);
    let mut cnt = 0usize;
    Zip::from(image.index_axis(Axis(0), 0).lanes(Axis(2)))
        .and(mask.index_axis(Axis(0), 0))
        .for_each(|pixel, &m| {
            if m != 0 {
                cnt += 1;
                Zip::from(&mut sum).and(&pixel).for_each(|s, &v| *s += v as f64);
            }
        });
    if cnt == 0 {
        None
    } else {
        Some(sum / cnt as f64)
    }
}

/// 逐文件均值的算术平均 (mean-of-means), 而非按像素数加权的总体均值.
///
/// `means` 为空时返回全零.
pub fn mean_of_means<I: IntoIterator<Item = Array1<f64>>>(means: I, channels: usize) -> Array1<f64> {
    let mut acc = Array1::<f64>::zeros(channels);
    let mut n = 0usize;
    for m in means {
        acc += &m;
        n += 1;
    }
    if n > 0 {
        acc /= n as f64;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array3, Array4};

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_subtract_exactly_once_per_channel() {
        let mut image = Array4::<f32>::from_elem((1, 2, 2, 2), 10.0);
        let mean = ChannelMean::from(vec![1.0, 4.0]);
        mean.subtract_from(&mut image);
        assert!(image.index_axis(Axis(3), 0).iter().all(|&v| v == 9.0));
        assert!(image.index_axis(Axis(3), 1).iter().all(|&v| v == 6.0));

        // 不是幂等的.
        mean.subtract_from(&mut image);
        assert!(image.index_axis(Axis(3), 1).iter().all(|&v| v == 2.0));
    }

    #[test]
    #[should_panic]
    fn test_subtract_channel_mismatch() {
        let mut image = Array4::<f32>::zeros((1, 2, 2, 1));
        ChannelMean::zeros(2).subtract_from(&mut image);
    }

    #[test]
    fn test_masked_mean_ignores_invalid_pixels() {
        let mut image = Array4::<f32>::zeros((1, 2, 2, 2));
        image[(0, 0, 0, 0)] = 2.0;
        image[(0, 0, 1, 0)] = 4.0;
        image[(0, 1, 1, 0)] = 100.0;
        image[(0, 0, 0, 1)] = -1.0;
        image[(0, 0, 1, 1)] = -3.0;
        let mut mask = Array3::<u8>::zeros((1, 2, 2));
        mask[(0, 0, 0)] = 1;
        mask[(0, 0, 1)] = 255;

        let m = masked_channel_mean(&image, &mask).unwrap();
        assert!(float_eq(m[0], 3.0));
        assert!(float_eq(m[1], -2.0));
    }

    #[test]
    fn test_masked_mean_without_valid_pixels() {
        let image = Array4::<f32>::ones((1, 2, 2, 1));
        let mask = Array3::<u8>::zeros((1, 2, 2));
        assert!(masked_channel_mean(&image, &mask).is_none());

        let wrong = Array3::<u8>::ones((1, 3, 2));
        assert!(masked_channel_mean(&image, &wrong).is_none());
    }

    #[test]
    fn test_mean_of_means_is_unweighted() {
        let m = mean_of_means([arr1(&[2.0]), arr1(&[4.0])], 1);
        assert!(float_eq(m[0], 3.0));
        assert_eq!(mean_of_means(Vec::<Array1<f64>>::new(), 2), arr1(&[0.0, 0.0]));
    }

    #[test]
    fn test_npy_round_trip_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mean.npy");
        let mean = ChannelMean::from(vec![0.5, -1.25, 3.0]);
        mean.write_npy(&path).unwrap();

        let back = ChannelMean::read_npy(&path).unwrap();
        assert_eq!(back, mean);
        assert_eq!(back.get(1), Some(-1.25));
        assert_eq!(back.get(3), None);
    }
}
