//! 滑窗 patch 寻址与提取.
//!
//! 寻址规则: 边长为 `P` (偶数) 的 patch 以 `(row, col)` 为中心, 覆盖闭区间
//! `[row - P/2 + 1, row + P/2] × [col - P/2 + 1, col + P/2]`. 扫描按行优先顺序进行,
//! 所有 patch 都完整落在图像内部.
//!
//! 游标 ([`PatchCursor`]) 是不可变的值, `advance` 返回新的游标; 边界只是中心的纯函数
//! ([`PatchBounds::centered_at`]), 因此 patch 的提取可以并行进行.

use ndarray::{s, Array4, Axis};

use crate::data::{image_shape, Image, Patch};
use crate::Idx2d;

mod cursor;
mod iter;

pub use cursor::{PatchCursor, Step};
pub use iter::PatchPositions;

/// patch 边长. 只接受不小于 2 的偶数.
///
/// 奇数边长会使 patch 相对中心不对称, 因此不被支持.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PatchSize(usize);

impl PatchSize {
    /// 构建 patch 边长. `size` 为奇数或小于 2 时返回 `None`.
    #[inline]
    pub const fn new(size: usize) -> Option<Self> {
        if size >= 2 && size % 2 == 0 {
            Some(Self(size))
        } else {
            None
        }
    }

    /// 边长.
    #[inline]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// 半边长 (向下取整).
    #[inline]
    pub const fn half(&self) -> usize {
        self.0 / 2
    }

    /// 在 `(h, w)` 的图像上一次完整扫描能产生的 patch 个数.
    #[inline]
    pub fn count_in(&self, (h, w): Idx2d) -> usize {
        let p = self.get();
        if h < p || w < p {
            0
        } else {
            (h - p + 1) * (w - p + 1)
        }
    }
}

/// patch 在图像上覆盖的区域, 上下左右边界均为闭区间.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PatchBounds {
    /// 中心 (行, 列).
    pub center: Idx2d,

    /// 首行.
    pub row_start: usize,

    /// 末行 (含).
    pub row_end: usize,

    /// 首列.
    pub col_start: usize,

    /// 末列 (含).
    pub col_end: usize,
}

impl PatchBounds {
    /// 以 `(row, col)` 为中心的 patch 区域.
    ///
    /// 要求 `row + 1 >= size.half()` 且 `col + 1 >= size.half()`, 否则程序 panic.
    #[inline]
    pub fn centered_at((row, col): Idx2d, size: PatchSize) -> Self {
        let half = size.half();
        assert!(row + 1 >= half && col + 1 >= half, "patch 中心过于靠近图像左上角");
        Self {
            center: (row, col),
            row_start: row + 1 - half,
            row_end: row + half,
            col_start: col + 1 - half,
            col_end: col + half,
        }
    }

    /// 区域的 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        (
            self.row_end - self.row_start + 1,
            self.col_end - self.col_start + 1,
        )
    }

    /// 区域是否完整位于 `(h, w)` 的图像内.
    #[inline]
    pub fn fits(&self, (h, w): Idx2d) -> bool {
        self.row_end < h && self.col_end < w
    }
}

/// 为 `image` 分配一块可复用的 patch 缓冲区, 形状为 `[1, P, P, C]`.
#[inline]
pub fn patch_buffer(image: &Image, size: PatchSize) -> Patch {
    let (_, _, c) = image_shape(image);
    Array4::zeros((1, size.get(), size.get(), c))
}

/// 把 `bounds` 处的 patch 写入调用方提供的缓冲区.
///
/// 写入内容是裁剪区域的转置: `out[0, i, j, c] = image[0, row_start + j, col_start + i, c]`.
/// 多通道图像的每个通道按顺序写入各自的位置.
///
/// `bounds` 必须位于图像内, `out` 的形状必须为 `[1, P, P, C]`, 否则程序 panic.
pub fn extract_into(image: &Image, bounds: &PatchBounds, out: &mut Patch) {
    let (h, w, c) = image_shape(image);
    assert!(bounds.fits((h, w)), "patch 越界: {bounds:?}");
    let (ph, pw) = bounds.shape();
    assert_eq!(out.dim(), (1, pw, ph, c), "patch 缓冲区形状不符");

    let crop = image.slice(s![
        0,
        bounds.row_start..=bounds.row_end,
        bounds.col_start..=bounds.col_end,
        ..
    ]);
    out.index_axis_mut(Axis(0), 0)
        .assign(&crop.permuted_axes([1, 0, 2]));
}

/// 提取 `bounds` 处的 patch, 返回新分配的数组.
pub fn extract(image: &Image, bounds: &PatchBounds) -> Patch {
    let (ph, pw) = bounds.shape();
    let mut out = Array4::zeros((1, pw, ph, image.dim().3));
    extract_into(image, bounds, &mut out);
    out
}

/// 按扫描顺序提取整幅图像的全部 patch.
///
/// 开启 `rayon` feature 时并行提取; 结果顺序与扫描顺序一致.
pub fn extract_all(image: &Image, size: PatchSize) -> Vec<(PatchBounds, Patch)> {
    let (h, w, _) = image_shape(image);
    let positions: Vec<PatchBounds> = PatchPositions::new((h, w), size).collect();

    extract_each(image, positions)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;

        fn extract_each(image: &Image, positions: Vec<PatchBounds>) -> Vec<(PatchBounds, Patch)> {
            positions
                .into_par_iter()
                .map(|b| (b, extract(image, &b)))
                .collect()
        }
    } else {
        fn extract_each(image: &Image, positions: Vec<PatchBounds>) -> Vec<(PatchBounds, Patch)> {
            positions
                .into_iter()
                .map(|b| (b, extract(image, &b)))
                .collect()
        }
    }
}
