//! Byte-fetch seam between the verifiers and wherever the identity
//! material comes from (the metadata service, captured files, tests).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid resource locator '{0}'")]
    InvalidUri(String),
    #[error("{uri} returned HTTP {status}")]
    Status { uri: String, status: u16 },
    #[error("transport error for {uri}: {message}")]
    Transport { uri: String, message: String },
    #[error("{uri} exceeded the {limit} byte response limit")]
    TooLarge { uri: String, limit: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Synchronous byte retrieval. No retries are implied; a failure aborts
/// only the pipeline stage that asked for the bytes.
pub trait ByteFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F: ByteFetcher + ?Sized> ByteFetcher for &F {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(uri)
    }
}

impl<F: ByteFetcher + ?Sized> ByteFetcher for Box<F> {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(uri)
    }
}
