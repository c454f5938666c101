//! 推理阶段的滑窗扫描器.

use std::path::{Path, PathBuf};

use super::{list_sample_files, DatasetError, DatasetResult};
use crate::data::{image_shape, ChannelMean, Image, MatLoader, Patch, SampleLoader};
use crate::patch::{self, PatchBounds, PatchCursor, PatchSize};

/// 依次加载目录中的每幅测试图像, 并以行优先顺序产生覆盖整幅图像的滑窗 patch.
///
/// 每幅图像的扫描在 [`ImageScanner::advance_image`] 时重新开始.
/// 扫描器不单独接收通道数参数: 每幅图像按 `mean.channels()` 个通道加载,
/// 默认的单通道数据使用 `ChannelMean::zeros(1)` 或训练集上算出的单通道均值即可.
/// 若文件中图像的通道数与均值长度不一致, [`ImageScanner::advance_image`] 返回
/// [`DatasetError::Load`] (内含 [`crate::data::LoadError::Shape`]).
///
/// # 注意
///
/// 1. `advance_image` 返回 `Ok(None)` 表示图像已全部处理完毕.
/// 2. `advance_patch` 返回 `None` 表示当前图像已扫描完毕 (或尚未加载任何图像).
#[derive(Debug)]
pub struct ImageScanner<L = MatLoader> {
    loader: L,
    files: Vec<PathBuf>,
    /// 下一个要加载的文件下标.
    next_file: usize,
    size: PatchSize,
    mean: ChannelMean,
    image: Option<Image>,
    cursor: Option<PatchCursor>,
    row_count: usize,
}

impl ImageScanner<MatLoader> {
    /// 扫描 `dir` 下所有 `.mat` 文件.
    pub fn open<P: AsRef<Path>>(dir: P, patch_size: usize, mean: ChannelMean) -> DatasetResult<Self> {
        Self::with_loader(dir, patch_size, mean, MatLoader::new())
    }
}

impl<L: SampleLoader> ImageScanner<L> {
    /// 使用指定加载器扫描 `dir` 下所有扩展名匹配的文件.
    pub fn with_loader<P: AsRef<Path>>(
        dir: P,
        patch_size: usize,
        mean: ChannelMean,
        loader: L,
    ) -> DatasetResult<Self> {
        let files = list_sample_files(dir, loader.extension())?;
        Self::from_files(files, patch_size, mean, loader)
    }

    /// 直接指定文件列表.
    pub fn from_files(
        files: Vec<PathBuf>,
        patch_size: usize,
        mean: ChannelMean,
        loader: L,
    ) -> DatasetResult<Self> {
        let size = PatchSize::new(patch_size).ok_or(DatasetError::InvalidPatchSize(patch_size))?;
        if mean.channels() == 0 {
            return Err(DatasetError::ZeroChannels);
        }
        Ok(Self {
            loader,
            files,
            next_file: 0,
            size,
            mean,
            image: None,
            cursor: None,
            row_count: 0,
        })
    }

    /// 加载下一幅图像, 减去通道均值, 并把游标重置到左上角.
    ///
    /// 所有图像都已处理时返回 `Ok(None)`. 加载失败时当前扫描中止, 错误中包含文件路径.
    pub fn advance_image(&mut self) -> DatasetResult<Option<&Image>> {
        let Some(path) = self.files.get(self.next_file) else {
            self.image = None;
            self.cursor = None;
            return Ok(None);
        };
        self.next_file += 1;
        self.image = None;
        self.cursor = None;

        log::info!("loading test file {}", path.display());
        let mut image = self.loader.load_image(path, self.mean.channels())?;
        self.mean.subtract_from(&mut image);

        let (h, w, _) = image_shape(&image);
        self.cursor = Some(PatchCursor::new((h, w), self.size));
        self.row_count = 1;
        let image: &Image = self.image.insert(image);
        Ok(Some(image))
    }

    /// 只前进游标, 返回下一个 patch 区域.
    pub fn next_bounds(&mut self) -> Option<PatchBounds> {
        let step = self.cursor?.advance()?;
        self.cursor = Some(step.cursor);
        if step.new_row {
            self.row_count += 1;
            log::debug!("row {}", step.bounds.center.0);
        }
        Some(step.bounds)
    }

    /// 前进到下一个 patch, 返回新分配的 patch (形状 `[1, P, P, C]`, 已转置).
    pub fn advance_patch(&mut self) -> Option<Patch> {
        let bounds = self.next_bounds()?;
        self.image.as_ref().map(|image| patch::extract(image, &bounds))
    }

    /// 前进到下一个 patch, 写入调用方提供的缓冲区, 返回 patch 区域.
    ///
    /// `out` 的形状必须为 `[1, P, P, C]` (可由 [`ImageScanner::patch_buffer`] 获得),
    /// 否则程序 panic.
    pub fn advance_patch_into(&mut self, out: &mut Patch) -> Option<PatchBounds> {
        let bounds = self.next_bounds()?;
        let image = self.image.as_ref()?;
        patch::extract_into(image, &bounds, out);
        Some(bounds)
    }

    /// 为当前图像分配 patch 缓冲区. 尚未加载图像时返回 `None`.
    #[inline]
    pub fn patch_buffer(&self) -> Option<Patch> {
        self.image.as_ref().map(|image| patch::patch_buffer(image, self.size))
    }

    /// 当前图像已扫描过的行数. 加载图像后为 1, 每换到新的一行加一.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// 将行计数重置为 1.
    #[inline]
    pub fn reset_row_count(&mut self) {
        self.row_count = 1;
    }

    /// 当前图像 (已减均值).
    #[inline]
    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    /// 当前图像对应的文件.
    #[inline]
    pub fn current_file(&self) -> Option<&Path> {
        self.image.as_ref()?;
        self.files.get(self.next_file.checked_sub(1)?).map(PathBuf::as_path)
    }

    /// 当前 patch 区域.
    #[inline]
    pub fn current_bounds(&self) -> Option<PatchBounds> {
        self.cursor?.bounds()
    }

    /// patch 边长.
    #[inline]
    pub fn patch_size(&self) -> usize {
        self.size.get()
    }

    /// 通道均值.
    #[inline]
    pub fn sample_mean(&self) -> &ChannelMean {
        &self.mean
    }

    /// 文件个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// 文件列表是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
