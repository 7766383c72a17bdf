//! Drives both verification pipelines from one `ByteFetcher`.
//! The pipelines are independent: one failing never stops the other.

use serde::{Serialize, Serializer};

use crate::crypto::anchors::TrustAnchorStore;
use crate::crypto::envelope::EnvelopeSignatureVerifier;
use crate::crypto::raw::RawSignatureVerifier;

use super::document::InstanceIdentity;
use super::error::{EngineError, EngineResult};
use super::fetch::ByteFetcher;
use super::types::{IdentityEndpoints, RawVerifyConfig};
use super::verify::{EnvelopeVerificationReport, RawVerificationReport};

/// Result of verifying one instance through both paths.
#[derive(Debug, Serialize)]
pub struct InstanceReport {
    /// Parsed document fields when the document was fetched and is JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<InstanceIdentity>,
    #[serde(serialize_with = "pipeline_result")]
    pub raw: EngineResult<RawVerificationReport>,
    #[serde(serialize_with = "pipeline_result")]
    pub envelope: EngineResult<EnvelopeVerificationReport>,
    /// Whether verified envelope content equals the fetched document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_matches_document: Option<bool>,
}

impl InstanceReport {
    /// Both pipelines ran and each verified.
    pub fn is_verified(&self) -> bool {
        matches!(&self.raw, Ok(r) if r.is_verified())
            && matches!(&self.envelope, Ok(e) if e.outcome.is_verified())
    }
}

/// Fetch the document, signature and envelope and verify them.
pub fn verify_instance(
    fetcher: &dyn ByteFetcher,
    endpoints: &IdentityEndpoints,
    store: &TrustAnchorStore,
    raw_config: &RawVerifyConfig,
) -> InstanceReport {
    let (document, raw) = match fetcher.fetch(&endpoints.document) {
        Ok(doc) => {
            let raw = run_raw(fetcher, endpoints, store, raw_config, &doc);
            (Some(doc), raw)
        }
        Err(e) => {
            tracing::warn!(error = %e, "document fetch failed, skipping raw signature pipeline");
            (None, Err(EngineError::from(e)))
        }
    };
    let envelope = run_envelope(fetcher, endpoints, store);

    let identity = document.as_deref().and_then(|d| InstanceIdentity::parse(d).ok());
    let content_matches_document = match (&document, &envelope) {
        (Some(doc), Ok(env)) => env.verified_content().map(|c| c == doc.as_slice()),
        _ => None,
    };

    InstanceReport { identity, raw, envelope, content_matches_document }
}

/// Raw-signature pipeline alone: fetch document and signature, verify.
pub fn fetch_and_verify_raw(
    fetcher: &dyn ByteFetcher,
    endpoints: &IdentityEndpoints,
    store: &TrustAnchorStore,
    raw_config: &RawVerifyConfig,
) -> EngineResult<RawVerificationReport> {
    let document = fetcher.fetch(&endpoints.document)?;
    run_raw(fetcher, endpoints, store, raw_config, &document)
}

/// Envelope pipeline alone.
pub fn fetch_and_verify_envelope(
    fetcher: &dyn ByteFetcher,
    endpoints: &IdentityEndpoints,
    store: &TrustAnchorStore,
) -> EngineResult<EnvelopeVerificationReport> {
    run_envelope(fetcher, endpoints, store)
}

fn run_raw(
    fetcher: &dyn ByteFetcher,
    endpoints: &IdentityEndpoints,
    store: &TrustAnchorStore,
    raw_config: &RawVerifyConfig,
    document: &[u8],
) -> EngineResult<RawVerificationReport> {
    let verifier = RawSignatureVerifier::new(store.rsa_anchor(), raw_config)?;
    let signature = fetcher.fetch(&endpoints.signature)?;
    let report = verifier.verify_raw(document, &signature)?;
    tracing::info!(verified = ?report.verified_algorithms(), "raw signature pipeline finished");
    Ok(report)
}

fn run_envelope(
    fetcher: &dyn ByteFetcher,
    endpoints: &IdentityEndpoints,
    store: &TrustAnchorStore,
) -> EngineResult<EnvelopeVerificationReport> {
    let envelope = fetcher.fetch(&endpoints.pkcs7)?;
    let report = EnvelopeSignatureVerifier::new(store.envelope_anchor()).verify_envelope(&envelope)?;
    tracing::info!(verified = report.outcome.is_verified(), "envelope pipeline finished");
    Ok(report)
}

fn pipeline_result<T: Serialize, S: Serializer>(r: &EngineResult<T>, s: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(rename_all = "snake_case")]
    enum Stage<'a, T> {
        Report(&'a T),
        Error { message: String, fatal: bool },
    }
    match r {
        Ok(report) => Stage::Report(report).serialize(s),
        Err(e) => {
            let stage: Stage<'_, T> = Stage::Error { message: e.to_string(), fatal: e.is_fatal() };
            stage.serialize(s)
        }
    }
}
