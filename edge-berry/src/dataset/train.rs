//! 训练集整图迭代器.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::{DatasetError, DatasetResult};
use crate::data::{ChannelMean, MatLoader, Sample, SampleLoader};

/// 以打乱的顺序循环提供完整训练图像 (而非 patch) 及其标签和掩码.
///
/// 每次文件列表用尽时, 轮数加一, 重新打乱列表并从头开始. 图像在返回前已减去通道均值.
/// 均值在构建时给定, 之后不会重新计算.
#[derive(Debug)]
pub struct TrainingSetIterator<L = MatLoader, R = StdRng> {
    loader: L,
    files: Vec<PathBuf>,
    /// 上一次返回的文件下标. `None` 表示还没有返回过任何样本.
    cursor: Option<usize>,
    epochs: usize,
    mean: ChannelMean,
    rng: R,
}

impl<L: SampleLoader> TrainingSetIterator<L, StdRng> {
    /// 使用系统熵源初始化随机数发生器.
    pub fn new(files: Vec<PathBuf>, loader: L, mean: ChannelMean) -> Self {
        Self::with_rng(files, loader, mean, StdRng::from_entropy())
    }
}

impl<L: SampleLoader, R: Rng> TrainingSetIterator<L, R> {
    /// 指定随机数发生器. 测试中可借此获得确定的打乱顺序.
    pub fn with_rng(files: Vec<PathBuf>, loader: L, mean: ChannelMean, rng: R) -> Self {
        Self {
            loader,
            files,
            cursor: None,
            epochs: 0,
            mean,
            rng,
        }
    }

    /// 前进到下一幅图像并加载.
    ///
    /// 下标先前进, 再加载文件. 因此加载失败后再次调用会跳过出错的文件.
    pub fn advance_image(&mut self) -> DatasetResult<Sample> {
        let idx = self.step()?;
        let path = &self.files[idx];
        let mut sample = self.loader.load_sample(path, self.mean.channels())?;
        self.mean.subtract_from(&mut sample.image);
        Ok(sample)
    }

    /// 前进下标, 必要时完成一轮并重新打乱.
    fn step(&mut self) -> DatasetResult<usize> {
        if self.files.is_empty() {
            return Err(DatasetError::EmptyFileList);
        }
        let idx = match self.cursor {
            Some(i) if i + 1 < self.files.len() => i + 1,
            None => 0,
            Some(_) => {
                self.epochs += 1;
                self.files.shuffle(&mut self.rng);
                log::debug!("epoch {} completed, file list reshuffled", self.epochs);
                0
            }
        };
        self.cursor = Some(idx);
        Ok(idx)
    }

    /// 已完成的轮数. 单调不减.
    #[inline]
    pub fn epochs_completed(&self) -> usize {
        self.epochs
    }

    /// 覆写已完成的轮数, 例如从检查点恢复训练时.
    #[inline]
    pub fn set_epochs_completed(&mut self, epochs: usize) {
        self.epochs = epochs;
    }

    /// 当前顺序下的文件列表.
    #[inline]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// 上一次返回的样本对应的文件.
    #[inline]
    pub fn current_file(&self) -> Option<&Path> {
        self.cursor.map(|i| self.files[i].as_path())
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

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::{Image, LoadError, LoadResult};
    use ndarray::{Array3, Array4};
    use std::collections::HashMap;

    /// 内存中的样本加载器. 图像像素值均为文件编号, 掩码全部有效.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct MemLoader {
        pub samples: HashMap<PathBuf, Sample>,
    }

    impl MemLoader {
        pub fn with_files(n: usize, shape: (usize, usize), channels: usize) -> (Self, Vec<PathBuf>) {
            let mut loader = Self::default();
            let mut files = Vec::new();
            for i in 0..n {
                let path = PathBuf::from(format!("mem/{i:03}.mat"));
                let (h, w) = shape;
                let sample = Sample {
                    image: Array4::from_elem((1, h, w, channels), i as f32),
                    label: Array3::zeros((1, h, w)),
                    mask: Array3::ones((1, h, w)),
                };
                loader.samples.insert(path.clone(), sample);
                files.push(path);
            }
            (loader, files)
        }
    }

    impl SampleLoader for MemLoader {
        fn extension(&self) -> &str {
            "mat"
        }

        fn load_image(&self, path: &Path, channels: usize) -> LoadResult<Image> {
            self.load_sample(path, channels).map(|s| s.image)
        }

        fn load_sample(&self, path: &Path, _channels: usize) -> LoadResult<Sample> {
            self.samples.get(path).cloned().ok_or_else(|| LoadError::Io {
                path: path.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    fn seeded(n: usize, seed: u64) -> TrainingSetIterator<MemLoader, StdRng> {
        let (loader, files) = MemLoader::with_files(n, (2, 2), 1);
        TrainingSetIterator::with_rng(files, loader, ChannelMean::zeros(1), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_first_epoch_in_given_order() {
        let mut it = seeded(4, 7);
        for i in 0..4 {
            let s = it.advance_image().unwrap();
            assert_eq!(s.image[(0, 0, 0, 0)], i as f32);
            assert_eq!(it.epochs_completed(), 0);
        }
        assert_eq!(it.current_file(), Some(Path::new("mem/003.mat")));
    }

    #[test]
    fn test_epoch_increments_once_per_wrap() {
        let n = 5;
        let mut it = seeded(n, 11);
        for _ in 0..n {
            it.advance_image().unwrap();
        }
        assert_eq!(it.epochs_completed(), 0);

        // 之后任意连续 n 次调用, 轮数恰好增加 1.
        for epoch in 1..=4 {
            for _ in 0..n {
                it.advance_image().unwrap();
            }
            assert_eq!(it.epochs_completed(), epoch);
        }
    }

    #[test]
    fn test_each_epoch_visits_every_file_once() {
        let n = 6;
        let mut it = seeded(n, 3);
        for _ in 0..3 {
            let mut seen: Vec<u32> = (0..n)
                .map(|_| it.advance_image().unwrap().image[(0, 0, 0, 0)] as u32)
                .collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..n as u32).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_reshuffle_changes_order() {
        let n = 20;
        let mut it = seeded(n, 42);
        let initial = it.files().to_vec();
        for _ in 0..=n {
            it.advance_image().unwrap();
        }
        assert_eq!(it.epochs_completed(), 1);
        assert_ne!(it.files(), initial.as_slice());
        assert_eq!(it.current_file(), Some(it.files()[0].as_path()));
    }

    #[test]
    fn test_same_seed_same_order() {
        let mut a = seeded(10, 5);
        let mut b = seeded(10, 5);
        for _ in 0..35 {
            let x = a.advance_image().unwrap();
            let y = b.advance_image().unwrap();
            assert_eq!(x.image, y.image);
        }
    }

    #[test]
    fn test_mean_subtracted_once() {
        let (loader, files) = MemLoader::with_files(2, (3, 3), 2);
        let mean = ChannelMean::from(vec![0.5, 1.0]);
        let mut it = TrainingSetIterator::with_rng(files, loader, mean, StdRng::seed_from_u64(0));

        let s = it.advance_image().unwrap();
        assert!(s.image.iter().step_by(2).all(|&v| v == -0.5));
        assert!(s.image.iter().skip(1).step_by(2).all(|&v| v == -1.0));
        let s = it.advance_image().unwrap();
        assert!(s.image.iter().step_by(2).all(|&v| v == 0.5));
        assert_eq!(s.label.dim(), (1, 3, 3));
        assert_eq!(s.mask.dim(), (1, 3, 3));
    }

    #[test]
    fn test_set_epochs_completed() {
        let mut it = seeded(1, 0);
        it.set_epochs_completed(9);
        it.advance_image().unwrap();
        it.advance_image().unwrap();
        assert_eq!(it.epochs_completed(), 10);
    }

    #[test]
    fn test_empty_file_list() {
        let mut it = TrainingSetIterator::with_rng(
            Vec::new(),
            MemLoader::default(),
            ChannelMean::zeros(1),
            StdRng::seed_from_u64(0),
        );
        assert!(it.is_empty());
        assert!(matches!(it.advance_image(), Err(DatasetError::EmptyFileList)));
    }

    #[test]
    fn test_load_error_can_be_skipped() {
        let (mut loader, files) = MemLoader::with_files(3, (2, 2), 1);
        loader.samples.remove(&files[1]);
        let mut it = TrainingSetIterator::with_rng(files, loader, ChannelMean::zeros(1), StdRng::seed_from_u64(0));

        assert!(it.advance_image().is_ok());
        let err = it.advance_image().unwrap_err();
        assert!(err.to_string().contains("001.mat"));
        let s = it.advance_image().unwrap();
        assert_eq!(s.image[(0, 0, 0, 0)], 2.0);
    }
}
