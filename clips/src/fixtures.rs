//! Frame trees on disk for the tests of this crate.

use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;

pub const WIDTH: usize = 8;
pub const HEIGHT: usize = 6;

/// Solid colour of a fixture frame, unique per clip group and frame offset
pub fn frame_color(group: usize, offset: usize) -> [u8; 3] {
    [(group * 10 + offset) as u8, (offset * 50) as u8, 200]
}

/// Writes `num_clips` clip directories `00001`, `00002`, ... with frames `1`, `2`, `3`.
pub fn write_clips(root: &Path, num_clips: usize, extension: &str) {
    for group in 0..num_clips {
        let clip_dir = root.join(format!("{:05}", group + 1));
        fs::create_dir_all(&clip_dir).unwrap();
        for offset in 0..3 {
            let frame = RgbImage::from_pixel(
                WIDTH as u32,
                HEIGHT as u32,
                Rgb(frame_color(group, offset)),
            );
            frame
                .save(clip_dir.join(format!("{}.{}", offset + 1, extension)))
                .unwrap();
        }
    }
}
