// crates/engine/src/domain/error.rs
use thiserror::Error;

use super::fetch::FetchError;

#[derive(Debug, Error)]
pub enum EngineError {
  /// An embedded trust anchor failed to decode or parse. This is a build
  /// defect, never a runtime condition; callers must not continue.
  #[error("trust anchor '{anchor}' is corrupt: {reason}")]
  TrustAnchorCorrupt { anchor: &'static str, reason: String },

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("signature decode: {0}")]
  SignatureDecode(String),

  #[error("envelope format: {0}")]
  EnvelopeFormat(String),

  #[error("configuration: {0}")]
  Config(String),

  #[error("feature not enabled: {0}")]
  Feature(&'static str),
}

impl EngineError {
  /// Only anchor corruption is fatal; everything else is reported per pipeline.
  pub fn is_fatal(&self) -> bool {
    matches!(self, EngineError::TrustAnchorCorrupt { .. })
  }
}

pub type EngineResult<T> = Result<T, EngineError>;
