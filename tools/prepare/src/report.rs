//! 运行结果.

use std::fmt;
use std::path::PathBuf;

use edge_berry::ChannelMean;

const SEP: &str = "--------------------------------------------------------";
const S4: &str = "    ";

/// 单幅测试图像的扫描结果.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanSummary {
    pub file: PathBuf,
    pub patches: usize,
    pub rows: usize,
}

/// 一次运行的最终结果.
#[derive(Debug)]
pub struct Report {
    pub num_train: usize,
    pub num_valid: usize,
    pub mean: ChannelMean,
    pub mean_file: PathBuf,
    pub patch_size: usize,
    pub scans: Vec<ScanSummary>,
}

impl Report {
    /// 所有测试图像的 patch 总数.
    pub fn total_patches(&self) -> usize {
        self.scans.iter().map(|s| s.patches).sum()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SEP}")?;
        writeln!(f, "Training images: {}", self.num_train)?;
        writeln!(f, "Validation images: {}", self.num_valid)?;
        writeln!(f, "Channel mean: {}", self.mean.view())?;
        writeln!(f, "Mean saved to: {}", self.mean_file.display())?;
        writeln!(f, "{SEP}")?;
        if self.scans.is_empty() {
            writeln!(f, "No test image scanned.")?;
        } else {
            writeln!(f, "Patch size: {}", self.patch_size)?;
            for s in self.scans.iter() {
                writeln!(
                    f,
                    "{S4}{}: {} patches in {} rows",
                    s.file.display(),
                    s.patches,
                    s.rows
                )?;
            }
            writeln!(f, "Total patches: {}", self.total_patches())?;
        }
        write!(f, "{SEP}")
    }
}
