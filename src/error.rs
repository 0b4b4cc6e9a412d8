use std::num::ParseIntError;

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while building or running a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The builder was given no producer.
    #[error("pipeline must have a producer")]
    NoProducer,

    /// The builder was given no consumer.
    #[error("pipeline must have a consumer")]
    NoConsumer,

    /// A configuration value is out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// The reading end of a pipe is gone.
    #[error("pipe '{0}' is closed")]
    PipeClosed(String),

    /// Termination was observed before a pending send completed.
    #[error("pipeline terminated")]
    Terminated,

    /// A line of input could not be read as a 32-bit integer.
    #[error("malformed input {line:?}, expected a 32-bit integer: {source}")]
    MalformedInput {
        /// The offending line, trimmed.
        line: String,
        /// Why parsing failed.
        #[source]
        source: ParseIntError,
    },
}
