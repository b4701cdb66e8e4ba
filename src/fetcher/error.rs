use thiserror::Error;

/// Why a URL produced no document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Timeouts and connection errors, after every attempt was used up.
    #[error("transport failure after {attempts} attempt(s): {message}")]
    Transport { attempts: usize, message: String },

    /// The site answered with a status other than 200. Never retried.
    #[error("rejected with HTTP status {status}")]
    Rejected { status: u16 },
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }
}
