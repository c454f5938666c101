//! NumPy 压缩归档 (`.npz`) 样本文件.

use std::fs::File;
use std::path::Path;

use ndarray::{ArrayD, IxDyn, OwnedRepr};
use ndarray_npy::{NpzReader, ReadableElement};

use super::{into_image, into_plane, Image, LoadError, LoadResult, Sample, SampleKeys, SampleLoader};
use crate::consts::ext;

/// `.npz` 文件加载器.
///
/// 与 [`super::MatLoader`] 使用相同的矩阵名, 但要求元素类型固定:
/// 图像为 `f32`, 标签和掩码为 `u8`. 归档中名为 `key` 或 `key.npy` 的条目均可匹配.
#[derive(Clone, Debug, Default)]
pub struct NpzLoader {
    keys: SampleKeys,
}

impl NpzLoader {
    /// 使用默认矩阵名.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义矩阵名.
    #[inline]
    pub fn with_keys(keys: SampleKeys) -> Self {
        Self { keys }
    }

    /// 当前使用的矩阵名.
    #[inline]
    pub fn keys(&self) -> &SampleKeys {
        &self.keys
    }
}

/// 打开的单个归档, 同时缓存其条目名.
struct Archive<'p> {
    path: &'p Path,
    reader: NpzReader<File>,
    names: Vec<String>,
}

impl<'p> Archive<'p> {
    fn open(path: &'p Path) -> LoadResult<Self> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        let mut reader = NpzReader::new(file).map_err(|source| npz_error(path, source))?;
        let names = reader.names().map_err(|source| npz_error(path, source))?;
        Ok(Self {
            path,
            reader,
            names,
        })
    }

    fn read<A: ReadableElement>(&mut self, key: &str) -> LoadResult<ArrayD<A>> {
        let name = self
            .names
            .iter()
            .find(|n| n.as_str() == key || n.strip_suffix(".npy") == Some(key))
            .cloned()
            .ok_or_else(|| LoadError::MissingKey {
                path: self.path.to_owned(),
                key: key.to_owned(),
            })?;
        self.reader
            .by_name::<OwnedRepr<A>, IxDyn>(name.as_str())
            .map_err(|source| npz_error(self.path, source))
    }
}

#[inline]
fn npz_error(path: &Path, source: ndarray_npy::ReadNpzError) -> LoadError {
    LoadError::Npz {
        path: path.to_owned(),
        source,
    }
}

impl SampleLoader for NpzLoader {
    #[inline]
    fn extension(&self) -> &str {
        ext::NPZ
    }

    fn load_image(&self, path: &Path, channels: usize) -> LoadResult<Image> {
        let mut archive = Archive::open(path)?;
        let raw = archive.read::<f32>(&self.keys.image)?;
        into_image(raw, channels, path, &self.keys.image)
    }

    fn load_sample(&self, path: &Path, channels: usize) -> LoadResult<Sample> {
        let mut archive = Archive::open(path)?;
        let image = archive.read::<f32>(&self.keys.image)?;
        let label = archive.read::<u8>(&self.keys.label)?;
        let mask = archive.read::<u8>(&self.keys.mask)?;
        Ok(Sample {
            image: into_image(image, channels, path, &self.keys.image)?,
            label: into_plane(label, path, &self.keys.label)?,
            mask: into_plane(mask, path, &self.keys.mask)?,
        })
    }
}

/// 写出 `.npz` 样本文件, 供测试使用.
#[cfg(test)]
pub(crate) mod fixture {
    use ndarray::{Array2, Array3};
    use ndarray_npy::NpzWriter;
    use std::fs::File;
    use std::path::Path;

    /// 单通道样本.
    pub fn write(path: &Path, image: &Array2<f32>, label: &Array2<u8>, mask: &Array2<u8>) {
        let mut npz = NpzWriter::new(File::create(path).unwrap());
        npz.add_array("level1Edge", image).unwrap();
        npz.add_array("GT", label).unwrap();
        npz.add_array("Mask", mask).unwrap();
        npz.finish().unwrap();
    }

    /// 多通道样本, `image` 形状为 `[H, W, C]`.
    pub fn write_multi(path: &Path, image: &Array3<f32>, label: &Array2<u8>, mask: &Array2<u8>) {
        let mut npz = NpzWriter::new(File::create(path).unwrap());
        npz.add_array("level1Edge", image).unwrap();
        npz.add_array("GT", label).unwrap();
        npz.add_array("Mask", mask).unwrap();
        npz.finish().unwrap();
    }

    /// 只含图像的测试文件.
    pub fn write_image(path: &Path, image: &Array2<f32>) {
        let mut npz = NpzWriter::new(File::create(path).unwrap());
        npz.add_array("level1Edge", image).unwrap();
        npz.finish().unwrap();
    }
}
