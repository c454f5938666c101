//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::data::{
    ChannelMean, Image, Label, LoadError, Mask, MatLoader, NpzLoader, Patch, Sample, SampleKeys,
    SampleLoader,
};

pub use crate::patch::{PatchBounds, PatchCursor, PatchPositions, PatchSize};

pub use crate::consts::{DEFAULT_CHANNELS, MEAN_FILE_NAME};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{
    self, prepare_data_set, DataSet, DatasetBuilder, DatasetConfig, DatasetError, ImageScanner,
    TrainingSetIterator,
};
