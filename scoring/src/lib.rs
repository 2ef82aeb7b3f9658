//! This crate turns model outputs on the clip datasets into predictions and scores them.
//!
//! It provides the arg-max prediction step, accuracy statistics against known labels and
//! the `Id,Class` result tables used for submitting test set predictions.

mod scoring_errors;
pub mod accuracy;
pub mod results;

use ndarray::{ArrayBase, Axis, Data, Ix2};

pub use accuracy::Accuracy;
pub use results::{classes_in_id_order, read_results, score_results, ResultWriter};
pub use scoring_errors::ScoringError;

/// Returned by every fallible operation in this crate
pub type ScoringResult<T> = std::result::Result<T, ScoringError>;

/// Predicts the class of every row of a (samples x classes) score matrix.
/// Ties go to the lowest class id.
pub fn predict<S>(scores: &ArrayBase<S, Ix2>) -> Vec<usize>
where
    S: Data<Elem = f32>,
{
    scores
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(best, best_score), (class, &score)| {
                    if score > best_score {
                        (class, score)
                    } else {
                        (best, best_score)
                    }
                })
                .0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_predict_argmax() {
        let scores = array![[0.1, 2.0, -1.0], [5.0, 5.0, 1.0], [-3.0, -2.0, -1.0]];
        assert_eq!(predict(&scores), vec![1, 0, 2]);
    }

    #[test]
    fn test_predict_on_view() {
        let scores = array![[0.1, 2.0], [3.0, 1.0], [0.0, 1.0]];
        assert_eq!(predict(&scores.slice(ndarray::s![1.., ..])), vec![0, 1]);
    }
}
