//! Fetching identity material captured to local files.

use std::io::Read;
use std::path::Path;

use crate::domain::fetch::{ByteFetcher, FetchError};
use crate::domain::types::EngineDefaults;

/// Reads locators as filesystem paths; a `file://` prefix is accepted.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    max_size: usize,
}

impl FileFetcher {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl Default for FileFetcher {
    fn default() -> Self {
        Self::new(EngineDefaults::MAX_RESPONSE_SIZE)
    }
}

impl ByteFetcher for FileFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        if path.is_empty() {
            return Err(FetchError::InvalidUri(uri.to_string()));
        }
        let file = std::fs::File::open(Path::new(path))?;
        let mut body = Vec::new();
        // One byte past the limit is enough to detect an oversized file.
        file.take(self.max_size as u64 + 1).read_to_end(&mut body)?;
        if body.len() > self.max_size {
            return Err(FetchError::TooLarge { uri: uri.to_string(), limit: self.max_size });
        }
        tracing::debug!(uri, bytes = body.len(), "read local resource");
        Ok(body)
    }
}
