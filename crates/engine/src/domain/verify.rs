// crates/engine/src/domain/verify.rs
use serde::{Serialize, Serializer};

use super::types::SigAlgorithm;

/// Terminal result of a verification that was actually performed.
/// "Could not check" conditions are errors, not `Failed`.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Verified,
    Failed { reason: String },
}

impl Outcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Outcome::Failed { reason: reason.into() }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Outcome::Verified)
    }
}

/// One candidate algorithm and how it fared.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AlgorithmResult {
    pub algorithm: SigAlgorithm,
    pub outcome: Outcome,
}

/// Itemized raw-path result, one entry per candidate in configured order.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RawVerificationReport {
    pub results: Vec<AlgorithmResult>,
}

impl RawVerificationReport {
    pub fn verified_algorithms(&self) -> Vec<SigAlgorithm> {
        self.results
            .iter()
            .filter(|r| r.outcome.is_verified())
            .map(|r| r.algorithm)
            .collect()
    }

    /// True when at least one candidate verified.
    pub fn is_verified(&self) -> bool {
        self.results.iter().any(|r| r.outcome.is_verified())
    }

    pub fn outcome_for(&self, algorithm: SigAlgorithm) -> Option<&Outcome> {
        self.results.iter().find(|r| r.algorithm == algorithm).map(|r| &r.outcome)
    }
}

/// Enveloped-path result.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct EnvelopeVerificationReport {
    pub outcome: Outcome,
    /// Embedded payload. Authenticated only when `outcome` is `Verified`;
    /// on failure it is a best-effort, unchecked recovery.
    #[serde(serialize_with = "lossy_utf8", skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    /// Certificates the envelope carried. They are never used for trust.
    pub embedded_certificates: usize,
}

impl EnvelopeVerificationReport {
    pub fn verified_content(&self) -> Option<&[u8]> {
        match self.outcome {
            Outcome::Verified => self.content.as_deref(),
            Outcome::Failed { .. } => None,
        }
    }
}

fn lossy_utf8<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => s.serialize_some(&String::from_utf8_lossy(b)),
        None => s.serialize_none(),
    }
}
