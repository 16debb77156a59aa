//! Error types for wcdigi-core.

use thiserror::Error;

/// Result type alias for wcdigi operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for wcdigi operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested event lies outside the event table.
    #[error("event index {index} out of range (store holds {n_events} events)")]
    InvalidEventIndex { index: usize, n_events: usize },

    /// Geometry table holds no record.
    #[error("geometry table contains no record")]
    MissingGeometry,

    /// Rows appended to a sink after it was finished.
    #[error("table sink already finished")]
    SinkFinished,

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
