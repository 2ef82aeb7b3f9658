//! Command line interface to inspect the action clip datasets, preview their batches and
//! score exported predictions.

use clips::{
    load_labels_with_key, BatchLoader, ClipIndex, Dataset, DatasetError, FrameIndex,
    FrameTransform, IndexConfig, Labels, RawPixels, ToTensor,
};
use env_logger::Builder;
use log::info;
use ndarray::{Array3, Dimension, RemoveAxis};
use quicli::prelude::*;
use scoring::score_results;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

/// Options shared by the subcommands that open a dataset
#[derive(Debug, StructOpt)]
struct DatasetOpts {
    /// Dataset root, holding one zero-padded directory per clip
    #[structopt(parse(from_os_str))]
    root: PathBuf,
    /// Label file (.npy, .json or .mat) with one 1-indexed class per clip. Omit for test data.
    #[structopt(short = "l", long = "labels", parse(from_os_str))]
    labels: Option<PathBuf>,
    /// Name of the label array inside a JSON or MAT label file, e.g. trLb
    #[structopt(short = "k", long = "label-key")]
    label_key: Option<String>,
    /// Addresses whole clips instead of single frames
    #[structopt(long = "clips")]
    clips: bool,
    /// Keeps raw 0..255 pixel values instead of scaling to [0, 1]
    #[structopt(long = "raw")]
    raw: bool,
    /// JSON file describing the directory layout, defaults to three .jpg frames per clip
    #[structopt(long = "config", parse(from_os_str))]
    config: Option<PathBuf>,
}

/// Prints shape, label and origin of the first samples of a dataset
#[derive(Debug, StructOpt)]
struct InspectOpts {
    #[structopt(flatten)]
    dataset: DatasetOpts,
    /// Number of samples to print
    #[structopt(short = "n", long = "count", default_value = "10")]
    count: usize,
    #[structopt(flatten)]
    verbosity: Verbosity,
}

/// Prints the first batches a loader produces for a dataset
#[derive(Debug, StructOpt)]
struct BatchesOpts {
    #[structopt(flatten)]
    dataset: DatasetOpts,
    #[structopt(short = "b", long = "batch-size", default_value = "4")]
    batch_size: usize,
    /// Shuffles the samples with the given seed
    #[structopt(short = "s", long = "shuffle")]
    shuffle: Option<u64>,
    /// Number of batches to print
    #[structopt(short = "n", long = "count", default_value = "20")]
    count: usize,
    #[structopt(flatten)]
    verbosity: Verbosity,
}

/// Scores an exported result table against known labels
#[derive(Debug, StructOpt)]
struct AccuracyOpts {
    /// Result table with the columns Id and Class
    #[structopt(parse(from_os_str))]
    results: PathBuf,
    /// Label file (.npy, .json or .mat) with one 1-indexed class per sample
    #[structopt(short = "l", long = "labels", parse(from_os_str))]
    labels: PathBuf,
    /// Name of the label array inside a JSON or MAT label file, e.g. trLb
    #[structopt(short = "k", long = "label-key")]
    label_key: Option<String>,
    #[structopt(flatten)]
    verbosity: Verbosity,
}

/// Inspect action recognition clip datasets.
#[derive(Debug, StructOpt)]
#[structopt(name = "ActionClips")]
enum ActionClips {
    #[structopt(
        name = "inspect",
        about = "Prints shape, label and origin of the first samples of a dataset."
    )]
    Inspect(InspectOpts),
    #[structopt(
        name = "batches",
        about = "Prints the batches a loader produces for a dataset."
    )]
    Batches(BatchesOpts),
    #[structopt(
        name = "accuracy",
        about = "Scores an Id,Class result table against a label file."
    )]
    Accuracy(AccuracyOpts),
}

/// Trait for the subcommands that actionclips uses
trait ActionClipsOpts {
    /// Performs the subcommand
    fn run(&self) -> CliResult;
    /// Returns the verbosity command
    fn get_verbosity(&self) -> &Verbosity;
    /// Sets up logging
    fn setup_env_logger(&self) -> CliResult {
        let mut builder = Builder::from_default_env();

        builder
            .filter(None, self.get_verbosity().log_level().to_level_filter())
            .init();

        Ok(())
    }
}

fn read_labels(path: &Path, key: &Option<String>) -> Result<Labels, DatasetError> {
    load_labels_with_key(path, key.as_deref())
}

impl DatasetOpts {
    fn labels(&self) -> Result<Labels, DatasetError> {
        match &self.labels {
            Some(path) => read_labels(path, &self.label_key),
            None => Ok(Labels::unlabeled()),
        }
    }

    fn config(&self) -> Result<IndexConfig, DatasetError> {
        match &self.config {
            Some(path) => IndexConfig::from_json_file(path),
            None => Ok(IndexConfig::default()),
        }
    }

    fn transform(&self) -> impl FrameTransform + 'static {
        let raw = self.raw;
        move |frame: Array3<u8>| {
            if raw {
                RawPixels.apply(frame)
            } else {
                ToTensor.apply(frame)
            }
        }
    }

    fn frame_index(&self) -> Result<FrameIndex, DatasetError> {
        FrameIndex::with_config(&self.root, self.labels()?, self.transform(), self.config()?)
    }

    fn clip_index(&self) -> Result<ClipIndex, DatasetError> {
        ClipIndex::with_config(&self.root, self.labels()?, self.transform(), self.config()?)
    }
}

fn format_label(label: Option<usize>) -> String {
    label.map_or_else(|| "-".to_string(), |l| l.to_string())
}

fn print_samples<T: Dataset>(dataset: &T, count: usize) -> CliResult {
    info!("Dataset holds {} samples", dataset.len());
    for position in 0..count.min(dataset.len()) {
        let sample = dataset.get(position)?;
        println!(
            "{}\t{:?}\t{}\t{}",
            position,
            sample.pixels.shape(),
            format_label(sample.label),
            sample.source.display()
        );
    }
    Ok(())
}

fn print_batches<T: Dataset>(loader: &BatchLoader<'_, T>, count: usize) -> CliResult
where
    <T::Dim as Dimension>::Larger: RemoveAxis,
{
    info!("Loader yields {} batches", loader.num_batches());
    for (i, batch) in loader.iter().take(count).enumerate() {
        let batch = batch?;
        let labels = batch
            .labels
            .as_ref()
            .map_or_else(|| "-".to_string(), |l| format!("{:?}", l));
        println!(
            "{}\t{:?}\t{:?}\t{}",
            i,
            batch.pixels.shape(),
            batch.folders,
            labels
        );
    }
    Ok(())
}

impl ActionClipsOpts for InspectOpts {
    // Prints the first samples
    fn run(&self) -> CliResult {
        if self.dataset.clips {
            print_samples(&self.dataset.clip_index()?, self.count)
        } else {
            print_samples(&self.dataset.frame_index()?, self.count)
        }
    }
    fn get_verbosity(&self) -> &Verbosity {
        &self.verbosity
    }
}

impl ActionClipsOpts for BatchesOpts {
    // Prints the first batches
    fn run(&self) -> CliResult {
        if self.dataset.clips {
            let index = self.dataset.clip_index()?;
            let mut loader = BatchLoader::new(&index, self.batch_size)?;
            if let Some(seed) = self.shuffle {
                loader = loader.shuffle(seed);
            }
            print_batches(&loader, self.count)
        } else {
            let index = self.dataset.frame_index()?;
            let mut loader = BatchLoader::new(&index, self.batch_size)?;
            if let Some(seed) = self.shuffle {
                loader = loader.shuffle(seed);
            }
            print_batches(&loader, self.count)
        }
    }
    fn get_verbosity(&self) -> &Verbosity {
        &self.verbosity
    }
}

impl ActionClipsOpts for AccuracyOpts {
    // Scores the result table
    fn run(&self) -> CliResult {
        let labels = read_labels(&self.labels, &self.label_key)?;
        let accuracy = score_results(&self.results, &labels.class_ids())?;
        println!("{}", accuracy);
        Ok(())
    }
    fn get_verbosity(&self) -> &Verbosity {
        &self.verbosity
    }
}

impl ActionClipsOpts for ActionClips {
    fn run(&self) -> CliResult {
        match self {
            ActionClips::Inspect(c) => c.run(),
            ActionClips::Batches(c) => c.run(),
            ActionClips::Accuracy(c) => c.run(),
        }
    }

    fn get_verbosity(&self) -> &Verbosity {
        match self {
            ActionClips::Inspect(c) => c.get_verbosity(),
            ActionClips::Batches(c) => c.get_verbosity(),
            ActionClips::Accuracy(c) => c.get_verbosity(),
        }
    }
}

fn main() -> CliResult {
    let args = ActionClips::from_args();
    args.setup_env_logger()?;
    args.run()
}
