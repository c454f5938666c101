//! 程序运行函数.

use std::path::Path;

use edge_berry::dataset::{DatasetBuilder, DatasetConfig, ImageScanner};
use edge_berry::data::{ChannelMean, MatLoader, SampleLoader};

use crate::error::{PrepareError, PrepareResult};
use crate::loader::Settings;
use crate::report::{Report, ScanSummary};

/// 实际运行. 样本为 `.mat` 文件.
#[inline]
pub fn run(settings: &Settings) -> PrepareResult<Report> {
    run_with(settings, MatLoader::new())
}

/// 使用指定加载器运行.
///
/// 1. 划分训练/验证集并计算训练集通道均值;
/// 2. 将均值写入 `settings.mean_file`;
/// 3. 若测试集目录存在, 用该均值逐幅扫描测试图像, 统计 patch 数和行数.
pub fn run_with<L: SampleLoader + Clone + Sync>(
    settings: &Settings,
    loader: L,
) -> PrepareResult<Report> {
    let config = DatasetConfig::new(&settings.train_dir, settings.valid_fraction);
    let data_set = DatasetBuilder::with_loader(config, loader.clone()).build()?;

    let mean_file = settings.mean_file.clone();
    data_set
        .mean
        .write_npy(&mean_file)
        .map_err(|source| PrepareError::WriteMean {
            path: mean_file.clone(),
            source,
        })?;
    log::info!("channel mean written to {}", mean_file.display());

    let scans = if settings.test_dir.is_dir() {
        scan_test_dir(&settings.test_dir, settings.patch_size, data_set.mean.clone(), loader)?
    } else {
        log::info!(
            "test directory {} not found, scanning skipped",
            settings.test_dir.display()
        );
        Vec::new()
    };

    Ok(Report {
        num_train: data_set.num_train(),
        num_valid: data_set.num_valid(),
        mean: data_set.mean,
        mean_file,
        patch_size: settings.patch_size,
        scans,
    })
}

/// 逐幅扫描 `dir` 下的测试图像.
fn scan_test_dir<L: SampleLoader>(
    dir: &Path,
    patch_size: usize,
    mean: ChannelMean,
    loader: L,
) -> PrepareResult<Vec<ScanSummary>> {
    let mut scanner = ImageScanner::with_loader(dir, patch_size, mean, loader)?;
    let mut summaries = Vec::with_capacity(scanner.len());

    while scanner.advance_image()?.is_some() {
        let mut patches = 0;
        if let Some(mut buf) = scanner.patch_buffer() {
            while scanner.advance_patch_into(&mut buf).is_some() {
                patches += 1;
            }
        }
        let rows = if patches == 0 { 0 } else { scanner.row_count() };
        let Some(file) = scanner.current_file() else {
            break;
        };
        summaries.push(ScanSummary {
            file: file.to_owned(),
            patches,
            rows,
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_berry::data::NpzLoader;
    use ndarray::Array2;
    use ndarray_npy::NpzWriter;
    use std::fs::File;

    fn write_npz(path: &Path, value: f32, (h, w): (usize, usize)) {
        let mut npz = NpzWriter::new(File::create(path).unwrap());
        npz.add_array("level1Edge", &Array2::from_elem((h, w), value))
            .unwrap();
        npz.add_array("GT", &Array2::<u8>::zeros((h, w))).unwrap();
        npz.add_array("Mask", &Array2::<u8>::ones((h, w))).unwrap();
        npz.finish().unwrap();
    }

    fn settings(root: &Path) -> Settings {
        Settings {
            train_dir: root.join("train"),
            test_dir: root.join("test"),
            valid_fraction: 0.25,
            patch_size: 4,
            mean_file: root.join("mean.npy"),
        }
    }

    #[test]
    fn test_run_writes_mean_and_scans() {
        let root = tempfile::tempdir().unwrap();
        let s = settings(root.path());
        std::fs::create_dir(&s.train_dir).unwrap();
        std::fs::create_dir(&s.test_dir).unwrap();
        for i in 0..4 {
            write_npz(&s.train_dir.join(format!("{i}.npz")), i as f32, (5, 5));
        }
        write_npz(&s.test_dir.join("a.npz"), 1.0, (6, 6));
        write_npz(&s.test_dir.join("b.npz"), 1.0, (8, 5));
        write_npz(&s.test_dir.join("c.npz"), 1.0, (3, 3));

        let report = run_with(&s, NpzLoader::new()).unwrap();
        assert_eq!((report.num_train, report.num_valid), (3, 1));
        assert_eq!(report.mean.get(0), Some(1.0));

        let saved = ChannelMean::read_npy(&s.mean_file).unwrap();
        assert_eq!(saved.get(0), Some(1.0));

        let expected = [("a.npz", 9, 3), ("b.npz", 10, 5), ("c.npz", 0, 0)];
        assert_eq!(report.scans.len(), expected.len());
        for (scan, (name, patches, rows)) in report.scans.iter().zip(expected) {
            assert_eq!(scan.file, s.test_dir.join(name));
            assert_eq!((scan.patches, scan.rows), (patches, rows));
        }
        assert_eq!(report.total_patches(), 19);
        assert!(report.to_string().contains("Total patches: 19"));
    }

    #[test]
    fn test_missing_test_dir_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let s = settings(root.path());
        std::fs::create_dir(&s.train_dir).unwrap();
        write_npz(&s.train_dir.join("0.npz"), 2.0, (4, 4));

        let report = run_with(&s, NpzLoader::new()).unwrap();
        assert!(report.scans.is_empty());
        assert_eq!(report.mean.get(0), Some(2.0));
        assert!(report.to_string().contains("No test image scanned."));
    }

    #[test]
    fn test_missing_train_dir() {
        let root = tempfile::tempdir().unwrap();
        let s = settings(root.path());
        let err = run_with(&s, NpzLoader::new()).unwrap_err();
        assert!(matches!(err, PrepareError::Dataset(_)));
        assert!(!s.mean_file.exists());
    }
}
