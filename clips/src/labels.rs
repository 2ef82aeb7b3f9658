use crate::errors::{DatasetError, DatasetResult};
use log::warn;
use matfile::{MatFile, NumericData};
use ndarray::ArrayD;
use ndarray_npy::{read_npy, ReadNpyError, ReadableElement};
use serde_json::Value;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Class labels of a dataset, one per clip, in clip order.
///
/// Labels are stored 1-indexed, the way they come out of the annotation files, and are
/// handed out as 0-indexed class ids. An empty collection marks an unlabeled (test) dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels {
    stored: Vec<u32>,
}

impl Labels {
    /// Creates the collection from 1-indexed class ids.
    pub fn new<I>(stored: I) -> DatasetResult<Labels>
    where
        I: IntoIterator<Item = i64>,
    {
        let stored = stored
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                if value >= 1 && value <= u32::MAX as i64 {
                    Ok(value as u32)
                } else {
                    Err(DatasetError::InvalidLabel { position, value })
                }
            })
            .collect::<DatasetResult<Vec<_>>>()?;
        Ok(Labels { stored })
    }

    pub fn unlabeled() -> Labels {
        Labels::default()
    }

    pub fn len(&self) -> usize {
        self.stored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }

    /// 0-indexed class id of the given clip group, `None` for unlabeled data.
    pub fn class_id(&self, group: usize) -> Option<usize> {
        self.stored.get(group).map(|l| *l as usize - 1)
    }

    pub fn class_ids(&self) -> Vec<usize> {
        self.stored.iter().map(|l| *l as usize - 1).collect()
    }
}

/// Builds labels from floating point values, all of which have to be integral.
fn integral_labels<I>(values: I) -> DatasetResult<Labels>
where
    I: IntoIterator<Item = f64>,
{
    let labels = values
        .into_iter()
        .map(|f| {
            if f.fract() == 0.0 {
                Ok(f as i64)
            } else {
                Err(DatasetError::LabelFormatError)
            }
        })
        .collect::<DatasetResult<Vec<_>>>()?;
    Labels::new(labels)
}

pub trait LabelLoader {
    fn load_labels(&mut self) -> DatasetResult<Labels>;
}

/// Reads labels from a JSON file holding either a flat array of integers or an object
/// with such an array under a named key.
pub struct JsonLabelLoader {
    content: Value,
    key: Option<String>,
}

impl JsonLabelLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> DatasetResult<JsonLabelLoader> {
        let raw_file = fs::read_to_string(path)?;
        let content = serde_json::from_str(&raw_file)?;
        Ok(JsonLabelLoader { content, key: None })
    }

    /// Picks the array stored under `key` in a JSON object, e.g. `"train"` or `"val"`.
    pub fn with_key(mut self, key: &str) -> JsonLabelLoader {
        self.key = Some(key.to_string());
        self
    }
}

impl LabelLoader for JsonLabelLoader {
    fn load_labels(&mut self) -> DatasetResult<Labels> {
        let raw_arr = match (&self.content, &self.key) {
            (Value::Object(map), Some(key)) => {
                map.get(key).ok_or(DatasetError::LabelFormatError)?
            }
            (v, None) => v,
            _ => return Err(DatasetError::LabelFormatError),
        };

        let values = match raw_arr {
            Value::Array(v) => v,
            _ => return Err(DatasetError::LabelFormatError),
        };

        // Annotation tools tend to write (n, 1) columns, so single-element rows are unpacked
        let labels: Option<Vec<f64>> = values
            .iter()
            .map(|j| match j {
                Value::Array(row) if row.len() == 1 => row[0].as_f64(),
                other => other.as_f64(),
            })
            .collect();

        integral_labels(labels.ok_or(DatasetError::LabelFormatError)?)
    }
}

/// Reads labels from a `.npy` file with an `(n,)` or `(n, 1)` array.
///
/// Any signed or unsigned integer type up to 64 bit is accepted, as are floating point arrays
/// (as produced when converting from MATLAB files) as long as every entry is integral.
pub struct NpyLabelLoader {
    path: PathBuf,
}

impl NpyLabelLoader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> NpyLabelLoader {
        NpyLabelLoader {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_as<T, F>(&self, to_f64: F) -> Result<ArrayD<f64>, ReadNpyError>
    where
        T: ReadableElement,
        F: Fn(&T) -> f64,
    {
        let arr: ArrayD<T> = read_npy(&self.path)?;
        Ok(arr.map(to_f64))
    }
}

/// Runs `next` if `previous` failed only because the element type didn't match.
fn or_other_dtype<F>(
    previous: Result<ArrayD<f64>, ReadNpyError>,
    next: F,
) -> Result<ArrayD<f64>, ReadNpyError>
where
    F: FnOnce() -> Result<ArrayD<f64>, ReadNpyError>,
{
    match previous {
        Err(ReadNpyError::WrongDescriptor(_)) => next(),
        other => other,
    }
}

impl LabelLoader for NpyLabelLoader {
    fn load_labels(&mut self) -> DatasetResult<Labels> {
        let mut labels = self.read_as::<i64, _>(|v| *v as f64);
        labels = or_other_dtype(labels, || self.read_as::<i32, _>(|v| f64::from(*v)));
        labels = or_other_dtype(labels, || self.read_as::<i16, _>(|v| f64::from(*v)));
        labels = or_other_dtype(labels, || self.read_as::<u8, _>(|v| f64::from(*v)));
        labels = or_other_dtype(labels, || self.read_as::<u16, _>(|v| f64::from(*v)));
        labels = or_other_dtype(labels, || self.read_as::<u32, _>(|v| f64::from(*v)));
        labels = or_other_dtype(labels, || self.read_as::<u64, _>(|v| *v as f64));
        labels = or_other_dtype(labels, || self.read_as::<f64, _>(|v| *v));
        labels = or_other_dtype(labels, || self.read_as::<f32, _>(|v| f64::from(*v)));
        let labels = labels?;

        match labels.shape() {
            [_] => {}
            [_, 1] => {}
            _ => return Err(DatasetError::LabelFormatError),
        }
        integral_labels(labels.iter().copied())
    }
}

/// Reads labels from a MATLAB level 5 `.mat` file holding an `(n, 1)` or `(1, n)` numeric array.
///
/// Annotation files often bundle several splits (`trLb`, `valLb`, ...); [`MatLabelLoader::with_key`]
/// picks one of them by variable name. Without a key the file has to hold exactly one array.
pub struct MatLabelLoader {
    content: MatFile,
    key: Option<String>,
}

impl MatLabelLoader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> DatasetResult<MatLabelLoader> {
        let file = File::open(path)?;
        let content = MatFile::parse(BufReader::new(file))
            .map_err(|e| DatasetError::MatError(format!("{:?}", e)))?;
        Ok(MatLabelLoader { content, key: None })
    }

    pub fn with_key(mut self, key: &str) -> MatLabelLoader {
        self.key = Some(key.to_string());
        self
    }
}

impl LabelLoader for MatLabelLoader {
    fn load_labels(&mut self) -> DatasetResult<Labels> {
        let array = match &self.key {
            Some(key) => self
                .content
                .find_by_name(key)
                .ok_or(DatasetError::LabelFormatError)?,
            None => {
                let arrays = &self.content.arrays()[..];
                match arrays {
                    [only] => only,
                    _ => return Err(DatasetError::MissingLabelKey),
                }
            }
        };

        match &array.size()[..] {
            [_, 1] | [1, _] => {}
            _ => return Err(DatasetError::LabelFormatError),
        }

        let values: Vec<f64> = match array.data() {
            NumericData::Double { real, imag: None } => real.clone(),
            NumericData::Single { real, imag: None } => {
                real.iter().map(|v| f64::from(*v)).collect()
            }
            NumericData::Int8 { real, imag: None } => real.iter().map(|v| f64::from(*v)).collect(),
            NumericData::UInt8 { real, imag: None } => {
                real.iter().map(|v| f64::from(*v)).collect()
            }
            NumericData::Int16 { real, imag: None } => {
                real.iter().map(|v| f64::from(*v)).collect()
            }
            NumericData::UInt16 { real, imag: None } => {
                real.iter().map(|v| f64::from(*v)).collect()
            }
            NumericData::Int32 { real, imag: None } => {
                real.iter().map(|v| f64::from(*v)).collect()
            }
            NumericData::UInt32 { real, imag: None } => {
                real.iter().map(|v| f64::from(*v)).collect()
            }
            NumericData::Int64 { real, imag: None } => real.iter().map(|v| *v as f64).collect(),
            NumericData::UInt64 { real, imag: None } => real.iter().map(|v| *v as f64).collect(),
            // complex labels
            _ => return Err(DatasetError::LabelFormatError),
        };
        integral_labels(values)
    }
}

/// Loads labels from a file, picking the loader from the extension.
pub fn load_labels<P: AsRef<Path>>(path: P) -> DatasetResult<Labels> {
    load_labels_with_key(path, None)
}

/// Like [`load_labels`], with the name of the array to read from JSON objects and MAT files.
/// A key for a `.npy` file, which only ever holds one array, is an error.
pub fn load_labels_with_key<P: AsRef<Path>>(path: P, key: Option<&str>) -> DatasetResult<Labels> {
    let path = path.as_ref();
    let labels = match (path.extension().and_then(OsStr::to_str), key) {
        (Some("npy"), None) => NpyLabelLoader::from_path(path).load_labels()?,
        (Some("npy"), Some(key)) => {
            return Err(DatasetError::UnexpectedLabelKey(key.to_string()))
        }
        (Some("json"), key) => {
            let mut loader = JsonLabelLoader::new(path)?;
            if let Some(key) = key {
                loader = loader.with_key(key);
            }
            loader.load_labels()?
        }
        (Some("mat"), key) => {
            let mut loader = MatLabelLoader::from_path(path)?;
            if let Some(key) = key {
                loader = loader.with_key(key);
            }
            loader.load_labels()?
        }
        (other, _) => {
            return Err(DatasetError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            ))
        }
    };
    if labels.is_empty() {
        warn!("Label file {:?} is empty, treating the dataset as unlabeled", path);
    }
    Ok(labels)
}
