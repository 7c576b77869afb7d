use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(
        "Bit vector size overflow: {requested} bits requested, at most {max} supported"
    )]
    Overflow { requested: f64, max: usize },

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Aging worker is already running")]
    WorkerAlreadyRunning,

    #[error("Failed to spawn aging worker: {0}")]
    WorkerSpawn(String),

    #[error("Aging worker {0} panicked")]
    WorkerPanicked(String),
}

