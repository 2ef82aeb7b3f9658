//! Datasets of short action clips stored as folders of still frames.
//!
//! A dataset root holds one zero-padded directory per clip (`00001`, `00002`, ...), each with a
//! fixed number of frames named `1.jpg`, `2.jpg`, .... The indices in this crate address such a
//! tree either frame by frame ([`FrameIndex`]) or clip by clip ([`ClipIndex`]) and hand out
//! [`Sample`]s with pixel data in (channel, height, width) layout.

pub mod batch;
pub mod config;
pub mod errors;
pub mod index;
pub mod labels;
pub mod layout;
pub mod sample;
pub mod transform;

#[cfg(test)]
pub(crate) mod fixtures;

pub use batch::{Batch, BatchLoader};
pub use config::IndexConfig;
pub use errors::{DatasetError, DatasetResult};
pub use index::{ClipIndex, Dataset, FrameIndex};
pub use labels::{load_labels, load_labels_with_key, Labels};
pub use sample::{ClipSample, FrameSample, Sample};
pub use transform::{FrameTransform, Normalize, RawPixels, ToTensor};

pub type ImagePrecision = f32;
