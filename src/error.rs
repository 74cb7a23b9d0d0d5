use thiserror::Error;

#[derive(Error, Debug)]
pub enum GcbError {
    /// Local validation failed before any external service was contacted.
    #[error("{0}")]
    Precondition(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Required binary not found on PATH: {0}")]
    MissingBinary(String),

    /// An external command exited unsuccessfully; `stderr` is forwarded verbatim.
    #[error("`{command}` failed:\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Unexpected response from {source_name}: {message}")]
    Parse {
        source_name: &'static str,
        message: String,
    },

    #[error("Invalid job id: '{0}'")]
    InvalidJobId(String),

    #[error("No running jobs found")]
    NoRunningJobs,

    #[error("Interrupted by operator")]
    Interrupted,

    #[error("HTTP request failed with status {status}: {url}")]
    Http { status: u16, url: String },

    /// The underlying reqwest error is reported as the source, not in the message.
    #[error("Network error")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GcbError>;
