use crate::errors::{DatasetError, DatasetResult};
use crate::index::Dataset;
use crate::ImagePrecision;
use log::debug;
use ndarray::{stack, Array, Axis, Dimension, RemoveAxis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::path::PathBuf;

/// Samples stacked along a new leading batch axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<D: Dimension> {
    /// (N, C, H, W) for frame datasets, (N, F, C, H, W) for clip datasets
    pub pixels: Array<ImagePrecision, D>,
    /// Class ids of the batch, only present if every sample in it is labeled
    pub labels: Option<Vec<usize>>,
    pub sources: Vec<PathBuf>,
    pub folders: Vec<String>,
    /// Dataset positions the samples were read from
    pub positions: Vec<usize>,
}

impl<D: Dimension> Batch<D> {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Groups the samples of a dataset into batches, optionally in a seeded random order.
pub struct BatchLoader<'a, T: Dataset> {
    dataset: &'a T,
    batch_size: usize,
    shuffle_seed: Option<u64>,
    drop_last: bool,
}

impl<'a, T: Dataset> BatchLoader<'a, T> {
    pub fn new(dataset: &'a T, batch_size: usize) -> DatasetResult<BatchLoader<'a, T>> {
        if batch_size == 0 {
            return Err(DatasetError::ZeroBatchSize);
        }
        Ok(BatchLoader {
            dataset,
            batch_size,
            shuffle_seed: None,
            drop_last: false,
        })
    }

    /// Visits the samples in an order drawn from `seed` instead of `0..len`.
    pub fn shuffle(mut self, seed: u64) -> BatchLoader<'a, T> {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Skips a trailing batch that is smaller than the batch size.
    pub fn drop_last(mut self, drop_last: bool) -> BatchLoader<'a, T> {
        self.drop_last = drop_last;
        self
    }

    pub fn num_batches(&self) -> usize {
        let len = self.dataset.len();
        if self.drop_last {
            len / self.batch_size
        } else {
            (len + self.batch_size - 1) / self.batch_size
        }
    }

    /// The order in which positions are visited.
    pub fn order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if let Some(seed) = self.shuffle_seed {
            order.shuffle(&mut StdRng::seed_from_u64(seed));
        }
        order
    }

    pub fn iter(&self) -> Batches<'a, T> {
        Batches {
            dataset: self.dataset,
            order: self.order(),
            cursor: 0,
            batch_size: self.batch_size,
            drop_last: self.drop_last,
        }
    }
}

impl<'a, 'b, T: Dataset> IntoIterator for &'b BatchLoader<'a, T>
where
    <T::Dim as Dimension>::Larger: RemoveAxis,
{
    type Item = DatasetResult<Batch<<T::Dim as Dimension>::Larger>>;
    type IntoIter = Batches<'a, T>;

    fn into_iter(self) -> Batches<'a, T> {
        self.iter()
    }
}

/// Iterator over the batches of a [`BatchLoader`]. Samples are read lazily, one batch per call.
pub struct Batches<'a, T: Dataset> {
    dataset: &'a T,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
    drop_last: bool,
}

impl<'a, T: Dataset> Iterator for Batches<'a, T>
where
    <T::Dim as Dimension>::Larger: RemoveAxis,
{
    type Item = DatasetResult<Batch<<T::Dim as Dimension>::Larger>>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.order.len() - self.cursor;
        if remaining == 0 || (self.drop_last && remaining < self.batch_size) {
            return None;
        }
        let end = self.cursor + remaining.min(self.batch_size);
        let positions = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        Some(collate(self.dataset, positions))
    }
}

fn collate<T: Dataset>(
    dataset: &T,
    positions: Vec<usize>,
) -> DatasetResult<Batch<<T::Dim as Dimension>::Larger>>
where
    <T::Dim as Dimension>::Larger: RemoveAxis,
{
    let samples = positions
        .iter()
        .map(|p| dataset.get(*p))
        .collect::<DatasetResult<Vec<_>>>()?;

    let views: Vec<_> = samples.iter().map(|s| s.pixels.view()).collect();
    let pixels = stack(Axis(0), &views)?;
    debug!("Collated batch of shape {:?}", pixels.shape());

    Ok(Batch {
        pixels,
        labels: samples.iter().map(|s| s.label).collect(),
        sources: samples.iter().map(|s| s.source.clone()).collect(),
        folders: samples.iter().map(|s| s.folder.clone()).collect(),
        positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::fixtures::{write_clips, HEIGHT, WIDTH};
    use crate::index::{ClipIndex, FrameIndex};
    use crate::labels::Labels;
    use crate::transform::ToTensor;
    use tempfile::tempdir;

    fn png_config() -> IndexConfig {
        IndexConfig {
            extension: "png".to_string(),
            ..IndexConfig::default()
        }
    }

    #[test]
    fn test_frame_batches_in_order() {
        let dir = tempdir().unwrap();
        write_clips(dir.path(), 5, "png");
        let labels = Labels::new(vec![3, 1, 4, 1, 5]).unwrap();
        let index = FrameIndex::with_config(dir.path(), labels, ToTensor, png_config()).unwrap();
        let loader = BatchLoader::new(&index, 4).unwrap();

        assert_eq!(loader.num_batches(), 4);
        let batches: Vec<_> = loader.iter().map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 4);

        assert_eq!(batches[0].pixels.dim(), (4, 3, HEIGHT, WIDTH));
        assert_eq!(batches[0].positions, vec![0, 1, 2, 3]);
        assert_eq!(batches[0].labels, Some(vec![2, 2, 2, 0]));
        assert_eq!(batches[0].folders, vec!["00001", "00001", "00001", "00002"]);

        assert_eq!(batches[3].len(), 3);
        assert_eq!(batches[3].pixels.dim(), (3, 3, HEIGHT, WIDTH));
        assert_eq!(batches[3].labels, Some(vec![4, 4, 4]));

        dir.close().unwrap();
    }

    #[test]
    fn test_clip_batches_unlabeled_drop_last() {
        let dir = tempdir().unwrap();
        write_clips(dir.path(), 5, "png");
        let index =
            ClipIndex::with_config(dir.path(), Labels::unlabeled(), ToTensor, png_config())
                .unwrap();
        let loader = BatchLoader::new(&index, 2).unwrap().drop_last(true);

        assert_eq!(loader.num_batches(), 2);
        let batches: Vec<_> = (&loader).into_iter().map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].pixels.dim(), (2, 3, 3, HEIGHT, WIDTH));
        assert_eq!(batches[1].labels, None);
        assert_eq!(batches[1].sources[0], dir.path().join("00003"));

        dir.close().unwrap();
    }

    #[test]
    fn test_shuffle_is_seeded_permutation() {
        let dir = tempdir().unwrap();
        write_clips(dir.path(), 6, "png");
        let index =
            ClipIndex::with_config(dir.path(), Labels::unlabeled(), ToTensor, png_config())
                .unwrap();

        let first = BatchLoader::new(&index, 4).unwrap().shuffle(7);
        let second = BatchLoader::new(&index, 4).unwrap().shuffle(7);
        assert_eq!(first.order(), second.order());

        let mut sorted = first.order();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..6).collect::<Vec<_>>());

        let visited: Vec<usize> = first
            .iter()
            .flat_map(|b| b.unwrap().positions)
            .collect();
        assert_eq!(visited, first.order());

        dir.close().unwrap();
    }

    #[test]
    fn test_zero_batch_size() {
        let dir = tempdir().unwrap();
        let index =
            ClipIndex::with_config(dir.path(), Labels::unlabeled(), ToTensor, png_config())
                .unwrap();
        assert!(matches!(
            BatchLoader::new(&index, 0),
            Err(DatasetError::ZeroBatchSize)
        ));
        assert_eq!(BatchLoader::new(&index, 3).unwrap().iter().count(), 0);
    }

    #[test]
    fn test_read_errors_surface_per_batch() {
        let dir = tempdir().unwrap();
        write_clips(dir.path(), 4, "png");
        let index =
            ClipIndex::with_config(dir.path(), Labels::unlabeled(), ToTensor, png_config())
                .unwrap();
        std::fs::remove_dir_all(dir.path().join("00003")).unwrap();

        let results: Vec<_> = BatchLoader::new(&index, 2).unwrap().iter().collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(DatasetError::ClipNotFound(_))));
    }
}
