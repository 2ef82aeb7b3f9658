use crate::{Accuracy, ScoringError, ScoringResult};
use csv::{Reader, Writer};
use log::info;
use serde_derive::{Deserialize, Serialize};
use std::io::Write;
use std::{fs::File, path::Path};

/// One line of a result table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "Id")]
    pub id: usize,
    #[serde(rename = "Class")]
    pub class: usize,
}

/// Writes predictions as an `Id,Class` table. Ids count up from 0 across all written batches,
/// so batches have to be written in dataset order.
pub struct ResultWriter<W: Write> {
    writer: Writer<W>,
    count: usize,
}

impl ResultWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> ScoringResult<ResultWriter<File>> {
        Ok(ResultWriter::new(File::create(path)?))
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn new(inner: W) -> ResultWriter<W> {
        ResultWriter {
            writer: Writer::from_writer(inner),
            count: 0,
        }
    }

    pub fn write_batch(&mut self, predictions: &[usize]) -> ScoringResult<()> {
        for class in predictions {
            self.writer.serialize(Prediction {
                id: self.count,
                class: *class,
            })?;
            self.count += 1;
        }
        Ok(())
    }

    /// Flushes the table and returns the number of rows written.
    pub fn finish(mut self) -> ScoringResult<usize> {
        self.writer.flush()?;
        info!("Wrote {} predictions", self.count);
        Ok(self.count)
    }
}

/// Reads an `Id,Class` table back in file order.
pub fn read_results<P: AsRef<Path>>(path: P) -> ScoringResult<Vec<Prediction>> {
    let mut reader = Reader::from_path(path)?;
    let predictions = reader
        .deserialize()
        .collect::<Result<Vec<Prediction>, _>>()?;
    Ok(predictions)
}

/// Orders the predictions by id and returns their classes, so that entry `i` belongs to
/// sample `i`. Ids have to cover `0..n` exactly once.
pub fn classes_in_id_order(mut predictions: Vec<Prediction>) -> ScoringResult<Vec<usize>> {
    predictions.sort_by_key(|p| p.id);
    predictions
        .iter()
        .enumerate()
        .map(|(expected, p)| {
            if p.id == expected {
                Ok(p.class)
            } else {
                Err(ScoringError::NonContiguousIds {
                    expected,
                    found: p.id,
                })
            }
        })
        .collect()
}

/// Scores a result table on disk against 0-indexed class ids.
pub fn score_results<P: AsRef<Path>>(path: P, labels: &[usize]) -> ScoringResult<Accuracy> {
    let classes = classes_in_id_order(read_results(path)?)?;
    Accuracy::from_predictions(&classes, labels)
}
