use crate::config::IndexConfig;
use crate::errors::{DatasetError, DatasetResult};
use crate::labels::Labels;
use crate::layout::ClipLayout;
use crate::sample::Sample;
use crate::transform::FrameTransform;
use log::{debug, info, warn};
use ndarray::{stack, Axis, Dimension, Ix3, Ix4};
use std::convert::TryFrom;
use std::path::Path;

/// A randomly addressable collection of samples.
pub trait Dataset {
    type Dim: Dimension;

    /// Number of addressable samples
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the sample at `position`, which has to lie in `0..len()`.
    fn get(&self, position: usize) -> DatasetResult<Sample<Self::Dim>>;

    /// Like [`Dataset::get`], for callers holding signed positions. Negative positions are
    /// out of range.
    fn get_signed(&self, position: i64) -> DatasetResult<Sample<Self::Dim>> {
        let unsigned = usize::try_from(position).map_err(|_| DatasetError::OutOfRange {
            position,
            len: self.len(),
        })?;
        self.get(unsigned)
    }
}

/// State shared by both addressing modes. Never mutated after construction.
struct IndexCore {
    layout: ClipLayout,
    labels: Labels,
    transform: Box<dyn FrameTransform>,
}

impl IndexCore {
    fn open(
        root: &Path,
        labels: Labels,
        transform: Box<dyn FrameTransform>,
        config: IndexConfig,
    ) -> DatasetResult<IndexCore> {
        let layout = ClipLayout::open(root, config)?;
        let clips = layout.num_clips();

        if !labels.is_empty() && labels.len() < clips {
            return Err(DatasetError::MisalignedLabels {
                labels: labels.len(),
                clips,
            });
        }
        if labels.len() > clips {
            warn!(
                "{} labels given for {} clips under {:?}, the surplus is ignored",
                labels.len(),
                clips,
                root
            );
        }

        info!(
            "Opened {} clips under {:?} ({})",
            clips,
            root,
            if labels.is_empty() {
                "unlabeled"
            } else {
                "labeled"
            }
        );
        Ok(IndexCore {
            layout,
            labels,
            transform,
        })
    }

    fn check_position(&self, position: usize, len: usize) -> DatasetResult<()> {
        if position >= len {
            return Err(DatasetError::OutOfRange {
                position: i64::try_from(position).unwrap_or(i64::MAX),
                len,
            });
        }
        Ok(())
    }
}

/// Addresses every frame as its own sample. All frames of a clip share the clip's label.
///
/// Position `p` maps to frame `p % frames_per_clip` of clip group `p / frames_per_clip`.
pub struct FrameIndex {
    core: IndexCore,
}

impl FrameIndex {
    pub fn new<P, T>(root: P, labels: Labels, transform: T) -> DatasetResult<FrameIndex>
    where
        P: AsRef<Path>,
        T: FrameTransform + 'static,
    {
        FrameIndex::with_config(root, labels, transform, IndexConfig::default())
    }

    pub fn with_config<P, T>(
        root: P,
        labels: Labels,
        transform: T,
        config: IndexConfig,
    ) -> DatasetResult<FrameIndex>
    where
        P: AsRef<Path>,
        T: FrameTransform + 'static,
    {
        let core = IndexCore::open(root.as_ref(), labels, Box::new(transform), config)?;
        Ok(FrameIndex { core })
    }

    pub fn layout(&self) -> &ClipLayout {
        &self.core.layout
    }
}

impl Dataset for FrameIndex {
    type Dim = Ix3;

    fn len(&self) -> usize {
        self.core.layout.frames_per_clip() * self.core.layout.num_clips()
    }

    fn get(&self, position: usize) -> DatasetResult<Sample<Ix3>> {
        self.core.check_position(position, self.len())?;
        let layout = &self.core.layout;
        let group = position / layout.frames_per_clip();
        let offset = position % layout.frames_per_clip();

        let frame = layout.read_frame(group, offset)?;
        debug!("Frame sample {} -> clip {}, frame {}", position, group, offset);

        Ok(Sample {
            pixels: self.core.transform.apply(frame),
            label: self.core.labels.class_id(group),
            source: layout.frame_path(group, offset),
            folder: layout.folder_id(group),
        })
    }
}

/// Addresses every clip as one sample holding all of its frames.
///
/// Frames are stacked in file order along a leading axis, giving pixels in
/// (frame, channel, height, width) layout.
pub struct ClipIndex {
    core: IndexCore,
}

impl ClipIndex {
    pub fn new<P, T>(root: P, labels: Labels, transform: T) -> DatasetResult<ClipIndex>
    where
        P: AsRef<Path>,
        T: FrameTransform + 'static,
    {
        ClipIndex::with_config(root, labels, transform, IndexConfig::default())
    }

    pub fn with_config<P, T>(
        root: P,
        labels: Labels,
        transform: T,
        config: IndexConfig,
    ) -> DatasetResult<ClipIndex>
    where
        P: AsRef<Path>,
        T: FrameTransform + 'static,
    {
        let core = IndexCore::open(root.as_ref(), labels, Box::new(transform), config)?;
        Ok(ClipIndex { core })
    }

    pub fn layout(&self) -> &ClipLayout {
        &self.core.layout
    }
}

impl Dataset for ClipIndex {
    type Dim = Ix4;

    fn len(&self) -> usize {
        self.core.layout.num_clips()
    }

    fn get(&self, position: usize) -> DatasetResult<Sample<Ix4>> {
        self.core.check_position(position, self.len())?;
        let layout = &self.core.layout;
        let group = position;

        let frames = (0..layout.frames_per_clip())
            .map(|offset| {
                layout
                    .read_frame(group, offset)
                    .map(|frame| self.core.transform.apply(frame))
            })
            .collect::<DatasetResult<Vec<_>>>()?;
        let views: Vec<_> = frames.iter().map(|f| f.view()).collect();
        let pixels = stack(Axis(0), &views)?;
        debug!("Clip sample {} -> shape {:?}", position, pixels.dim());

        Ok(Sample {
            pixels,
            label: self.core.labels.class_id(group),
            source: layout.clip_dir(group),
            folder: layout.folder_id(group),
        })
    }
}
