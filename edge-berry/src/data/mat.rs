//! MATLAB level-5 (`.mat`) 样本文件.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use matfile::{MatFile, NumericData};
use ndarray::{ArrayD, IxDyn, ShapeBuilder};

use super::{into_image, into_plane, Image, LoadError, LoadResult, Sample, SampleKeys, SampleLoader};
use crate::consts::ext;

/// `.mat` 文件加载器.
///
/// MATLAB 矩阵按列优先存储, 加载后统一转换为行优先的标准布局.
/// 任意实数数值类型都可接受: 图像转换为 `f32`.
/// 标签必须是 `[0, 255]` 内的整数, 否则返回 [`LoadError::LabelValue`];
/// 掩码按 "非零即有效" 转换为 0 / 1.
#[derive(Clone, Debug, Default)]
pub struct MatLoader {
    keys: SampleKeys,
}

impl MatLoader {
    /// 使用默认矩阵名 (`level1Edge`, `GT`, `Mask`).
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

fn open(path: &Path) -> LoadResult<MatFile> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    MatFile::parse(BufReader::new(file)).map_err(|source| LoadError::Mat {
        path: path.to_owned(),
        source,
    })
}

/// 将任意实数类型的数据拓宽为 `f64`. 虚部被忽略.
#[allow(unreachable_patterns)]
fn real_values(data: &NumericData) -> Option<Vec<f64>> {
    macro_rules! widen {
        ($real: expr) => {
            Some($real.iter().map(|&v| v as f64).collect())
        };
    }

    match data {
        NumericData::Int8 { real, .. } => widen!(real),
        NumericData::UInt8 { real, .. } => widen!(real),
        NumericData::Int16 { real, .. } => widen!(real),
        NumericData::UInt16 { real, .. } => widen!(real),
        NumericData::Int32 { real, .. } => widen!(real),
        NumericData::UInt32 { real, .. } => widen!(real),
        NumericData::Int64 { real, .. } => widen!(real),
        NumericData::UInt64 { real, .. } => widen!(real),
        NumericData::Single { real, .. } => widen!(real),
        NumericData::Double { real, .. } => Some(real.clone()),
        _ => None,
    }
}

/// 取出名为 `key` 的矩阵, 并按列优先顺序恢复其形状.
fn matrix(mat: &MatFile, path: &Path, key: &str) -> LoadResult<ArrayD<f64>> {
    let array = mat.find_by_name(key).ok_or_else(|| LoadError::MissingKey {
        path: path.to_owned(),
        key: key.to_owned(),
    })?;
    let values = real_values(array.data()).ok_or_else(|| LoadError::UnsupportedClass {
        path: path.to_owned(),
        key: key.to_owned(),
    })?;
    let size = array.size().clone();
    ArrayD::from_shape_vec(IxDyn(&size).f(), values).map_err(|_| LoadError::Shape {
        path: path.to_owned(),
        key: key.to_owned(),
        shape: size.clone(),
        expected: format!("{} elements", size.iter().product::<usize>()),
    })
}

/// 标签值必须能无损转换为 `u8`.
fn into_label(raw: ArrayD<f64>, path: &Path, key: &str) -> LoadResult<ArrayD<u8>> {
    let bad = raw
        .iter()
        .copied()
        .find(|v| v.fract() != 0.0 || !(0.0..=255.0).contains(v));
    if let Some(value) = bad {
        return Err(LoadError::LabelValue {
            path: path.to_owned(),
            key: key.to_owned(),
            value,
        });
    }
    Ok(raw.mapv(|v| v as u8))
}

/// 非零元素 (包括小数和负数) 记为有效像素 1, 零记为 0.
#[inline]
fn into_mask(raw: ArrayD<f64>) -> ArrayD<u8> {
    raw.mapv(|v| u8::from(v != 0.0))
}

impl SampleLoader for MatLoader {
    #[inline]
    fn extension(&self) -> &str {
        ext::MAT
    }

    fn load_image(&self, path: &Path, channels: usize) -> LoadResult<Image> {
        let mat = open(path)?;
        let raw = matrix(&mat, path, &self.keys.image)?.mapv(|v| v as f32);
        into_image(raw, channels, path, &self.keys.image)
    }

    fn load_sample(&self, path: &Path, channels: usize) -> LoadResult<Sample> {
        let mat = open(path)?;
        let image = matrix(&mat, path, &self.keys.image)?.mapv(|v| v as f32);
        let label = into_label(matrix(&mat, path, &self.keys.label)?, path, &self.keys.label)?;
        let mask = into_mask(matrix(&mat, path, &self.keys.mask)?);
        Ok(Sample {
            image: into_image(image, channels, path, &self.keys.image)?,
            label: into_plane(label, path, &self.keys.label)?,
            mask: into_plane(mask, path, &self.keys.mask)?,
        })
    }
}
