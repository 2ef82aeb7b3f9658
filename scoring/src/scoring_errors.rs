use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Got {predictions} predictions for {labels} labels")]
    LengthMismatch { predictions: usize, labels: usize },
    #[error("Result table has id {found} where id {expected} was expected (ids have to run from 0 without gaps)")]
    NonContiguousIds { expected: usize, found: usize },
    #[error("Result table could not be read or written:\n {0}.")]
    CsvError(#[from] csv::Error),
    #[error("Filesystem reported error\n {0}.")]
    IoError(#[from] std::io::Error),
}
