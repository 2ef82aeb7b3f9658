use ndarray::ShapeError;
use ndarray_npy::ReadNpyError;
use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Position {position} is out of range for a dataset with {len} samples")]
    OutOfRange { position: i64, len: usize },
    #[error("Dataset root {0} not found or not a directory")]
    RootNotFound(PathBuf),
    #[error("Clip directory {0} not found")]
    ClipNotFound(PathBuf),
    #[error("Frame file {0} not found")]
    FrameNotFound(PathBuf),
    #[error("Label collection has {labels} entries, but {clips} clips were found on disk")]
    MisalignedLabels { labels: usize, clips: usize },
    #[error("Label {value} at position {position} is not a 1-indexed class id")]
    InvalidLabel { position: usize, value: i64 },
    #[error("Label file didn't have the correct format (required: array of integers, one per clip)")]
    LabelFormatError,
    #[error("Label files of type {0:?} are not supported. Only .npy, .json and .mat are supported.")]
    UnsupportedFormat(String),
    #[error("Label file holds several arrays, a label key is needed to pick one")]
    MissingLabelKey,
    #[error("Label key {0:?} given for a label file that only holds a single array")]
    UnexpectedLabelKey(String),
    #[error("MAT file not readable:\n {0}.")]
    MatError(String),
    #[error("Invalid dataset configuration: {0}")]
    ConfigError(String),
    #[error("Batch size has to be at least 1")]
    ZeroBatchSize,
    #[error("Pixel arrays have incompatible shapes:\n {0}.")]
    ShapeError(#[from] ShapeError),
    #[error("Frame could not be decoded:\n {0}.")]
    ImageError(#[from] image::ImageError),
    #[error("Filesystem reported error\n {0}.")]
    IoError(#[from] std::io::Error),
    #[error("Npy file not readable:\n {0}.")]
    NpyError(#[from] ReadNpyError),
    #[error("JSON file not readable:\n {0}.")]
    JsonError(#[from] serde_json::Error),
}
