use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("time-series sink rejected batch: {0}")]
    Sink(String),
}
