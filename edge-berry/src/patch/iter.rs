use super::{PatchBounds, PatchCursor, PatchSize};
use crate::Idx2d;

/// 按扫描顺序产生整幅图像全部 patch 区域的迭代器.
///
/// 与如下写法等价:
///
/// ```
/// use edge_berry::patch::{PatchBounds, PatchSize};
///
/// fn positions_auto((h, w): (usize, usize), p: PatchSize) -> impl Iterator<Item = PatchBounds> {
///     let half = p.half();
///     let rows = if h < p.get() { 0..0 } else { half - 1..h - half };
///     let cols = if w < p.get() { 0..0 } else { half - 1..w - half };
///     rows.flat_map(move |r| cols.clone().map(move |c| PatchBounds::centered_at((r, c), p)))
/// }
/// ```
///
/// 但这里直接复用 [`PatchCursor`], 保证与逐步扫描的结果完全一致.
#[derive(Debug, Clone)]
pub struct PatchPositions {
    cursor: PatchCursor,
    done: bool,
}

impl PatchPositions {
    /// 在 `(h, w)` 的图像上新建迭代器.
    #[inline]
    pub fn new(shape: Idx2d, size: PatchSize) -> Self {
        Self {
            cursor: PatchCursor::new(shape, size),
            done: false,
        }
    }
}

impl Iterator for PatchPositions {
    type Item = PatchBounds;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.advance() {
            Some(step) => {
                self.cursor = step.cursor;
                Some(step.bounds)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for PatchPositions {}
