use crate::errors::{DatasetError, DatasetResult};
use crate::ImagePrecision;
use ndarray::{Array3, Axis};

/// Turns a decoded frame into the pixel representation handed out by the indices.
///
/// Input and output are both in (channel, height, width) layout. Implementations must be pure,
/// as the same transform is shared by every read of an index.
pub trait FrameTransform: Send + Sync {
    fn apply(&self, frame: Array3<u8>) -> Array3<ImagePrecision>;
}

impl<F> FrameTransform for F
where
    F: Fn(Array3<u8>) -> Array3<ImagePrecision> + Send + Sync,
{
    fn apply(&self, frame: Array3<u8>) -> Array3<ImagePrecision> {
        self(frame)
    }
}

/// Scales pixel values to [0, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct ToTensor;

impl FrameTransform for ToTensor {
    fn apply(&self, frame: Array3<u8>) -> Array3<ImagePrecision> {
        frame.mapv(|x| x as ImagePrecision / 255.0)
    }
}

/// Keeps the raw 0..=255 pixel values, only changing the element type.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPixels;

impl FrameTransform for RawPixels {
    fn apply(&self, frame: Array3<u8>) -> Array3<ImagePrecision> {
        frame.mapv(|x| x as ImagePrecision)
    }
}

/// Scales to [0, 1] like [`ToTensor`], then standardizes every channel with the given
/// mean and standard deviation.
#[derive(Debug, Clone, Copy)]
pub struct Normalize {
    mean: [ImagePrecision; 3],
    std: [ImagePrecision; 3],
}

impl Normalize {
    pub fn new(mean: [ImagePrecision; 3], std: [ImagePrecision; 3]) -> DatasetResult<Normalize> {
        if std.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(DatasetError::ConfigError(format!(
                "standard deviations {:?} have to be finite and non-zero",
                std
            )));
        }
        Ok(Normalize { mean, std })
    }
}

impl FrameTransform for Normalize {
    fn apply(&self, frame: Array3<u8>) -> Array3<ImagePrecision> {
        let mut scaled = ToTensor.apply(frame);
        for (mut channel, (mean, std)) in scaled
            .axis_iter_mut(Axis(0))
            .zip(self.mean.iter().zip(self.std.iter()))
        {
            channel.mapv_inplace(|x| (x - mean) / std);
        }
        scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn frame() -> Array3<u8> {
        array![[[0, 255]], [[51, 102]], [[255, 0]]]
    }

    #[test]
    fn test_to_tensor() {
        assert_eq!(ToTensor.apply(frame()), array![[[0., 1.]], [[0.2, 0.4]], [[1., 0.]]]);
    }

    #[test]
    fn test_raw_pixels() {
        assert_eq!(
            RawPixels.apply(frame()),
            array![[[0., 255.]], [[51., 102.]], [[255., 0.]]]
        );
    }

    #[test]
    fn test_normalize() {
        let normalize = Normalize::new([0.5, 0.0, 1.0], [0.5, 0.2, 1.0]).unwrap();
        let out = normalize.apply(frame());
        let expected = array![[[-1., 1.]], [[1., 2.]], [[0., -1.]]];
        assert!(out
            .iter()
            .zip(expected.iter())
            .all(|(a, b)| (a - b).abs() < 1e-5));
    }

    #[test]
    fn test_normalize_rejects_zero_std() {
        assert!(matches!(
            Normalize::new([0.5, 0.5, 0.5], [0.2, 0.0, 0.2]),
            Err(DatasetError::ConfigError(_))
        ));
        assert!(matches!(
            Normalize::new([0.5, 0.5, 0.5], [0.2, ImagePrecision::NAN, 0.2]),
            Err(DatasetError::ConfigError(_))
        ));
    }

    #[test]
    fn test_closure_transform() {
        let flip = |f: Array3<u8>| f.mapv(|x| (255 - x) as ImagePrecision);
        assert_eq!(flip.apply(frame())[[0, 0, 0]], 255.);
    }
}
