use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A single failed network attempt. Never returned directly by the client;
/// it only shows up as the last cause of [`Error::RemoteUnavailable`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Why an attempt inside the retry loop did not count as a success.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error("unexpected status code {0}")]
    Status(u16),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("remote unavailable after {attempts} attempt(s): {last}")]
    RemoteUnavailable {
        attempts: u32,
        #[source]
        last: AttemptFailure,
    },

    #[error("zero URLs were found for {keyword:?}")]
    NoCandidatesFound { keyword: String },

    #[error("candidate index {index} out of range ({available} found)")]
    CandidateOutOfRange { index: usize, available: usize },

    #[error("could not find embedded data in response from {address}")]
    DataNotFound { address: String },

    #[error("embedded data is malformed: {0}")]
    MalformedData(#[source] serde_json::Error),
}

impl Error {
    /// True for failures where trying the same call again later may help.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RemoteUnavailable { .. })
    }
}
