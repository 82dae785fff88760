#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to start I/O runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Interrupted during request")]
    Interrupted,

    #[error("Executor error: {message}")]
    Executor { message: String },
}

impl Error {
    /// True when the request was cancelled or its runtime went away before
    /// a response arrived.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Interrupted)
    }

    /// True when the underlying client gave up waiting on the server.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_timeout())
    }
}
