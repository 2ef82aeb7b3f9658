use crate::ImagePrecision;
use ndarray::{Array, Dimension, Ix3, Ix4};
use std::path::PathBuf;

/// One addressable unit of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<D: Dimension> {
    /// Transformed pixels, (C, H, W) for a frame and (F, C, H, W) for a clip
    pub pixels: Array<ImagePrecision, D>,
    /// 0-indexed class id, absent for unlabeled data
    pub label: Option<usize>,
    /// Frame file for frame samples, clip directory for clip samples
    pub source: PathBuf,
    /// Zero-padded name of the clip directory the sample was read from
    pub folder: String,
}

pub type FrameSample = Sample<Ix3>;
pub type ClipSample = Sample<Ix4>;
