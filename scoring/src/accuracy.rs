use crate::{ScoringError, ScoringResult};
use log::debug;
use std::fmt::Display;

/// Number of correct predictions out of all scored samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
}

impl Accuracy {
    pub fn from_predictions(predictions: &[usize], labels: &[usize]) -> ScoringResult<Accuracy> {
        if predictions.len() != labels.len() {
            return Err(ScoringError::LengthMismatch {
                predictions: predictions.len(),
                labels: labels.len(),
            });
        }
        let mut accuracy = Accuracy::default();
        accuracy.update(predictions, labels)?;
        Ok(accuracy)
    }

    /// Adds the predictions of one more batch.
    pub fn update(&mut self, predictions: &[usize], labels: &[usize]) -> ScoringResult<()> {
        if predictions.len() != labels.len() {
            return Err(ScoringError::LengthMismatch {
                predictions: predictions.len(),
                labels: labels.len(),
            });
        }
        let correct = predictions
            .iter()
            .zip(labels)
            .filter(|(p, l)| p == l)
            .count();
        debug!("Batch: {} / {} correct", correct, labels.len());
        self.correct += correct;
        self.total += labels.len();
        Ok(())
    }

    /// Fraction of correct predictions, 0 if nothing was scored
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

impl Display for Accuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Got {} / {} correct ({:.2})",
            self.correct,
            self.total,
            100. * self.fraction()
        )
    }
}
