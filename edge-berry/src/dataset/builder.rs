//! 训练/验证集划分与通道均值计算.

use std::path::PathBuf;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{list_sample_files, DatasetConfig, DatasetError, DatasetResult, TrainingSetIterator};
use crate::data::mean::{masked_channel_mean, mean_of_means};
use crate::data::{ChannelMean, MatLoader, SampleLoader};

/// 划分得到的训练集与验证集, 二者共享同一份通道均值.
#[derive(Debug)]
pub struct DataSet<L = MatLoader> {
    /// 训练集.
    pub train: TrainingSetIterator<L>,

    /// 验证集.
    pub validate: TrainingSetIterator<L>,

    /// 训练集上的通道均值 (未计算时为全零).
    pub mean: ChannelMean,
}

impl<L: SampleLoader> DataSet<L> {
    /// 训练集大小.
    #[inline]
    pub fn num_train(&self) -> usize {
        self.train.len()
    }

    /// 验证集大小.
    #[inline]
    pub fn num_valid(&self) -> usize {
        self.validate.len()
    }
}

/// 按比例划分, 返回 `(训练集大小, 验证集大小)`.
///
/// 验证集大小为 `floor(total * valid_fraction)`, 其余为训练集.
#[inline]
pub fn split_counts(total: usize, valid_fraction: f64) -> (usize, usize) {
    let valid = ((total as f64 * valid_fraction).floor() as usize).min(total);
    (total - valid, valid)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;

        /// 对每个文件并行求值, 结果保持文件顺序.
        fn map_files<T, F>(files: &[PathBuf], f: F) -> DatasetResult<Vec<T>>
        where
            T: Send,
            F: Fn(&PathBuf) -> DatasetResult<T> + Sync + Send,
        {
            files.par_iter().map(f).collect()
        }
    } else {
        /// 对每个文件依次求值.
        fn map_files<T, F>(files: &[PathBuf], f: F) -> DatasetResult<Vec<T>>
        where
            F: Fn(&PathBuf) -> DatasetResult<T>,
        {
            files.iter().map(f).collect()
        }
    }
}

/// 计算 `files` 的逐通道均值.
///
/// 先求每个文件在掩码有效像素上的逐通道均值, 再对这些均值做算术平均 (mean-of-means),
/// 而不是按像素数加权. 没有任何有效像素的文件会被跳过, 不计入分母;
/// 若所有文件都被跳过, 返回全零.
///
/// 开启 `rayon` feature 时并行加载文件.
pub fn average_train_data<L: SampleLoader + Sync>(
    files: &[PathBuf],
    loader: &L,
    channels: usize,
) -> DatasetResult<ChannelMean> {
    let file_mean = |path: &PathBuf| -> DatasetResult<Option<Array1<f64>>> {
        let sample = loader.load_sample(path, channels)?;
        let (_, mh, mw) = sample.mask.dim();
        if (mh, mw) != sample.shape() {
            return Err(DatasetError::MaskShape {
                path: path.clone(),
                mask: (mh, mw),
                image: sample.shape(),
            });
        }
        let mean = masked_channel_mean(&sample.image, &sample.mask);
        match &mean {
            Some(m) => log::debug!("mean of {}: {m}", path.display()),
            None => log::warn!("{} has no valid pixel, skipped", path.display()),
        }
        Ok(mean)
    };

    let per_file = map_files(files, file_mean)?;
    let mean = mean_of_means(per_file.into_iter().flatten(), channels);
    Ok(ChannelMean::new(mean.mapv(|v| v as f32)))
}

/// 数据集构建器.
///
/// 文件按路径排序后, 前一部分作为训练集, 后一部分作为验证集, 划分前不打乱.
/// 均值只在训练集上计算.
#[derive(Clone, Debug)]
pub struct DatasetBuilder<L = MatLoader> {
    config: DatasetConfig,
    loader: L,
    seed: Option<u64>,
}

impl DatasetBuilder<MatLoader> {
    /// 加载 `.mat` 文件.
    #[inline]
    pub fn new(config: DatasetConfig) -> Self {
        Self::with_loader(config, MatLoader::new())
    }
}

impl<L: SampleLoader + Clone + Sync> DatasetBuilder<L> {
    /// 使用指定加载器.
    #[inline]
    pub fn with_loader(config: DatasetConfig, loader: L) -> Self {
        Self {
            config,
            loader,
            seed: None,
        }
    }

    /// 固定两个迭代器打乱顺序所用的随机种子.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 构建参数.
    #[inline]
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// 扫描 `config.dir` 并构建数据集.
    pub fn build(&self) -> DatasetResult<DataSet<L>> {
        self.config.validate()?;
        let files = list_sample_files(&self.config.dir, self.loader.extension())?;
        self.build_from_files(files)
    }

    /// 用给定的文件列表构建数据集. 列表顺序即划分顺序.
    pub fn build_from_files(&self, mut files: Vec<PathBuf>) -> DatasetResult<DataSet<L>> {
        self.config.validate()?;
        let channels = self.config.channels;
        let (num_train, num_valid) = split_counts(files.len(), self.config.valid_fraction);

        let mean = if self.config.subtract_mean {
            average_train_data(&files[..num_train], &self.loader, channels)?
        } else {
            ChannelMean::zeros(channels)
        };

        let valid_files = files.split_off(num_train);
        let (train_rng, valid_rng) = match self.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };
        let train =
            TrainingSetIterator::with_rng(files, self.loader.clone(), mean.clone(), train_rng);
        let validate =
            TrainingSetIterator::with_rng(valid_files, self.loader.clone(), mean.clone(), valid_rng);

        log::info!("number of training images: {num_train}, number of validation images: {num_valid}");
        Ok(DataSet {
            train,
            validate,
            mean,
        })
    }
}

/// 从 `config.dir` 下的 `.mat` 文件构建数据集.
#[inline]
pub fn prepare_data_set(config: &DatasetConfig) -> DatasetResult<DataSet> {
    DatasetBuilder::new(config.clone()).build()
}
