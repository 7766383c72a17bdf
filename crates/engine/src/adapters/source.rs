//! Where identity material comes from, parsed from a short URI.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::error::EngineResult;
use crate::domain::fetch::ByteFetcher;
use crate::domain::types::{IdentityEndpoints, ImdsConfig};

use super::local::FileFetcher;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Invalid source URI scheme: expected 'imds', 'imds:<url>' or 'local:<dir>'")]
    InvalidScheme,
    #[error("Missing directory for 'local:' source")]
    MissingLocalPath,
    #[error("Missing URL for 'imds:' source")]
    MissingImdsUrl,
}

/// Source of the document, signature and envelope.
/// Format examples:
/// - imds
/// - imds:http://169.254.169.254
/// - local:/var/lib/iid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetcherSpec {
    Imds { base_url: Option<String> },
    Local { dir: PathBuf },
}

impl FromStr for FetcherSpec {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "imds" {
            return Ok(FetcherSpec::Imds { base_url: None });
        }
        let (scheme, value) = s.split_once(':').ok_or(SourceError::InvalidScheme)?;
        match scheme {
            "imds" if value.is_empty() => Err(SourceError::MissingImdsUrl),
            "imds" => Ok(FetcherSpec::Imds { base_url: Some(value.to_string()) }),
            "local" if value.is_empty() => Err(SourceError::MissingLocalPath),
            "local" => Ok(FetcherSpec::Local { dir: PathBuf::from(value) }),
            _ => Err(SourceError::InvalidScheme),
        }
    }
}

impl FetcherSpec {
    /// Build the fetcher and the locators it should be asked for.
    pub fn resolve(&self, imds: ImdsConfig) -> EngineResult<(Box<dyn ByteFetcher>, IdentityEndpoints)> {
        match self {
            FetcherSpec::Local { dir } => Ok((
                Box::new(FileFetcher::new(imds.max_response_size)),
                IdentityEndpoints::local_dir(dir),
            )),
            #[cfg(feature = "imds")]
            FetcherSpec::Imds { base_url } => {
                let mut cfg = imds;
                if let Some(url) = base_url {
                    cfg.base_url = url.clone();
                }
                let fetcher = super::imds::ImdsFetcher::new(cfg)?;
                let endpoints = fetcher.endpoints();
                Ok((Box::new(fetcher), endpoints))
            }
            #[cfg(not(feature = "imds"))]
            FetcherSpec::Imds { .. } => {
                let _ = imds;
                Err(crate::domain::error::EngineError::Feature("imds"))
            }
        }
    }
}
