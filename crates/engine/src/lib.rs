// crates/engine/src/lib.rs

//! Public facade for the instance identity verification engine.
//! Exposes a stable API and re-exports types for consumers (CLI, FFI).

pub mod adapters;
pub mod crypto;
pub mod domain;

use domain::error::EngineResult;

/// High-level helpers over the embedded trust anchors. These are the
/// simple entrypoints; build verifiers directly for custom anchors.

pub fn verify_raw(
    document: &[u8],
    signature_b64: impl AsRef<[u8]>,
    config: &RawVerifyConfig,
) -> EngineResult<RawVerificationReport> {
    let store = TrustAnchorStore::embedded()?;
    RawSignatureVerifier::new(store.rsa_anchor(), config)?.verify_raw(document, signature_b64)
}

pub fn verify_envelope(envelope: &[u8]) -> EngineResult<EnvelopeVerificationReport> {
    let store = TrustAnchorStore::embedded()?;
    EnvelopeSignatureVerifier::new(store.envelope_anchor()).verify_envelope(envelope)
}

// Re-exports for convenience
pub use adapters::local::FileFetcher;
pub use adapters::source::FetcherSpec;
#[cfg(feature = "imds")]
pub use adapters::imds::ImdsFetcher;
pub use crypto::anchors::{AnchorInfo, TrustAnchor, TrustAnchorStore};
pub use crypto::envelope::EnvelopeSignatureVerifier;
pub use crypto::raw::RawSignatureVerifier;
pub use domain::document::InstanceIdentity;
pub use domain::error::EngineError;
pub use domain::fetch::{ByteFetcher, FetchError};
pub use domain::pipeline::{fetch_and_verify_envelope, fetch_and_verify_raw, verify_instance, InstanceReport};
pub use domain::types::{EngineDefaults, IdentityEndpoints, ImdsConfig, KeyFamily, RawVerifyConfig, SigAlgorithm};
pub use domain::verify::{AlgorithmResult, EnvelopeVerificationReport, Outcome, RawVerificationReport};
