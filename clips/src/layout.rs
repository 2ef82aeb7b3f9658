use crate::config::IndexConfig;
use crate::errors::{DatasetError, DatasetResult};
use image::io::Reader as ImageReader;
use log::debug;
use ndarray::Array3;
use nshare::ToNdarray3;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Maps clip groups and frame offsets to paths below a dataset root.
///
/// Clip group `g` lives in the directory named `g + 1`, zero-padded to
/// `dir_name_width` digits. Frame offset `o` is the file `o + 1` with the configured extension.
/// The mapping is computed from the configuration alone; whether the paths exist is only checked
/// when a frame is read.
#[derive(Debug, Clone)]
pub struct ClipLayout {
    root: PathBuf,
    config: IndexConfig,
    num_clips: usize,
}

impl ClipLayout {
    /// Scans `root` once and counts its subdirectories, each of which is taken to be a clip.
    pub fn open<P: AsRef<Path>>(root: P, config: IndexConfig) -> DatasetResult<ClipLayout> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(DatasetError::RootNotFound(root));
        }
        config.validate()?;

        let mut num_clips = 0;
        for entry in fs::read_dir(&root)? {
            if entry?.path().is_dir() {
                num_clips += 1;
            }
        }

        Ok(ClipLayout {
            root,
            config,
            num_clips,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn num_clips(&self) -> usize {
        self.num_clips
    }

    pub fn frames_per_clip(&self) -> usize {
        self.config.frames_per_clip
    }

    /// Name of the directory holding clip group `group`, e.g. `00003` for group 2
    pub fn folder_id(&self, group: usize) -> String {
        format!("{:0width$}", group + 1, width = self.config.dir_name_width)
    }

    pub fn clip_dir(&self, group: usize) -> PathBuf {
        self.root.join(self.folder_id(group))
    }

    pub fn frame_path(&self, group: usize, offset: usize) -> PathBuf {
        self.clip_dir(group)
            .join(format!("{}.{}", offset + 1, self.config.extension))
    }

    /// Decodes a single frame as 8 bit RGB in (channel, height, width) layout.
    pub fn read_frame(&self, group: usize, offset: usize) -> DatasetResult<Array3<u8>> {
        let clip_dir = self.clip_dir(group);
        if !clip_dir.is_dir() {
            return Err(DatasetError::ClipNotFound(clip_dir));
        }

        let frame_path = self.frame_path(group, offset);
        // A frame that vanishes between the check above and the open below still reports as missing
        let reader = ImageReader::open(&frame_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DatasetError::FrameNotFound(frame_path.clone()),
            _ => DatasetError::IoError(e),
        })?;
        let frame = reader.decode()?.to_rgb8().into_ndarray3();

        debug!("Read frame {:?} with shape {:?}", frame_path, frame.dim());
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{frame_color, write_clips};
    use tempfile::tempdir;

    #[test]
    fn test_counts_only_directories() {
        let dir = tempdir().unwrap();
        write_clips(dir.path(), 4, "png");
        fs::write(dir.path().join("README"), "not a clip").unwrap();

        let layout = ClipLayout::open(dir.path(), IndexConfig::default()).unwrap();
        assert_eq!(layout.num_clips(), 4);

        dir.close().unwrap();
    }

    #[test]
    fn test_paths_are_zero_padded() {
        let dir = tempdir().unwrap();
        let layout = ClipLayout::open(dir.path(), IndexConfig::default()).unwrap();

        assert_eq!(layout.folder_id(0), "00001");
        assert_eq!(layout.folder_id(41), "00042");
        assert_eq!(layout.clip_dir(2), dir.path().join("00003"));
        assert_eq!(layout.frame_path(2, 1), dir.path().join("00003").join("2.jpg"));

        dir.close().unwrap();
    }

    #[test]
    fn test_missing_root() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nothing-here");
        assert!(matches!(
            ClipLayout::open(&missing, IndexConfig::default()),
            Err(DatasetError::RootNotFound(p)) if p == missing
        ));
    }

    #[test]
    fn test_read_frame_layout_and_pixels() {
        let dir = tempdir().unwrap();
        write_clips(dir.path(), 2, "png");
        let config = IndexConfig {
            extension: "png".to_string(),
            ..IndexConfig::default()
        };
        let layout = ClipLayout::open(dir.path(), config).unwrap();

        let frame = layout.read_frame(1, 2).unwrap();
        let (channels, height, width) = frame.dim();
        assert_eq!(channels, 3);
        assert_eq!((height, width), (crate::fixtures::HEIGHT, crate::fixtures::WIDTH));

        let expected = frame_color(1, 2);
        for c in 0..3 {
            assert!(frame.index_axis(ndarray::Axis(0), c).iter().all(|v| *v == expected[c]));
        }

        dir.close().unwrap();
    }

    #[test]
    fn test_read_frame_missing_files() {
        let dir = tempdir().unwrap();
        write_clips(dir.path(), 2, "png");
        let config = IndexConfig {
            extension: "png".to_string(),
            ..IndexConfig::default()
        };
        let layout = ClipLayout::open(dir.path(), config).unwrap();

        fs::remove_file(layout.frame_path(0, 1)).unwrap();
        assert!(matches!(
            layout.read_frame(0, 1),
            Err(DatasetError::FrameNotFound(p)) if p == layout.frame_path(0, 1)
        ));

        fs::remove_dir_all(layout.clip_dir(1)).unwrap();
        assert!(matches!(
            layout.read_frame(1, 0),
            Err(DatasetError::ClipNotFound(p)) if p == layout.clip_dir(1)
        ));

        dir.close().unwrap();
    }
}
