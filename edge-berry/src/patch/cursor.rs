use super::{PatchBounds, PatchSize};
use crate::Idx2d;

/// 行优先滑窗游标.
///
/// 游标本身不可变: [`PatchCursor::advance`] 返回新的游标, 原游标保持不变.
/// 新建的游标尚未指向任何 patch, 第一次前进落在 `(P/2 - 1, P/2 - 1)`,
/// 即第一个完整位于图像内的位置.
///
/// 列游标到达 `w - P/2 - 1` 后回到 `P/2 - 1` 并换行; 行游标到达 `h - P/2` 时扫描结束.
/// 高或宽小于 `P` 的图像不产生任何 patch.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PatchCursor {
    size: PatchSize,
    shape: Idx2d,
    pos: Option<Idx2d>,
}

/// 游标前进一步的结果.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Step {
    /// 前进后的游标.
    pub cursor: PatchCursor,

    /// 新位置对应的 patch 区域.
    pub bounds: PatchBounds,

    /// 这一步是否换到了新的一行. 第一步不算换行.
    pub new_row: bool,
}

impl PatchCursor {
    /// 在 `(h, w)` 的图像上新建游标.
    #[inline]
    pub fn new(shape: Idx2d, size: PatchSize) -> Self {
        Self {
            size,
            shape,
            pos: None,
        }
    }

    /// patch 边长.
    #[inline]
    pub fn size(&self) -> PatchSize {
        self.size
    }

    /// 图像 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.shape
    }

    /// 当前 patch 中心. 新建的游标返回 `None`.
    #[inline]
    pub fn position(&self) -> Option<Idx2d> {
        self.pos
    }

    /// 当前 patch 区域.
    #[inline]
    pub fn bounds(&self) -> Option<PatchBounds> {
        self.pos.map(|p| PatchBounds::centered_at(p, self.size))
    }

    /// 前进一步. 扫描结束时返回 `None`; 之后对同一游标的调用同样返回 `None`.
    pub fn advance(&self) -> Option<Step> {
        let (h, w) = self.shape;
        let p = self.size.get();
        if h < p || w < p {
            return None;
        }
        let half = self.size.half();
        let first = half - 1;
        let last_col = w - half - 1;

        let (row, col, new_row) = match self.pos {
            None => (first, first, false),
            Some((row, col)) if col >= last_col => (row + 1, first, true),
            Some((row, col)) => (row, col + 1, false),
        };
        if row >= h - half {
            return None;
        }

        let cursor = Self {
            pos: Some((row, col)),
            ..*self
        };
        Some(Step {
            cursor,
            bounds: PatchBounds::centered_at((row, col), self.size),
            new_row,
        })
    }
}
