use thiserror::Error as ThisError;

/// Errors that can occur in the sink manager
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    /// A rotation step failed; the writer is left either fully rotated or
    /// fully un-rotated.
    #[error("rotation failed while {stage}: {source}")]
    Rotation {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },
    /// One or more archive directories could not be pruned. The rotation
    /// that triggered the sweep still completed.
    #[error("retention sweep incomplete: {0}")]
    Prune(String),
    /// Unsubscribing a name that was never registered.
    #[error("no subscriber named {0:?}")]
    SubscriberNotFound(String),
    /// A subscriber failed during a broadcast; the remaining subscribers
    /// still received the chunk.
    #[error("subscriber {name:?} failed: {source}")]
    Subscriber {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
