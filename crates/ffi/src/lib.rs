use iid_engine::domain::error::EngineError;
use iid_engine::domain::types::RawVerifyConfig;
use iid_engine::{verify_envelope, verify_raw, AnchorInfo, Outcome, SigAlgorithm, TrustAnchorStore};

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FfiError {
    #[error("{message}")]
    Generic { message: String },
}

impl From<EngineError> for FfiError {
    fn from(e: EngineError) -> Self {
        FfiError::Generic {
            message: e.to_string(),
        }
    }
}

// ===== FFI types mirroring the public Rust API (FFI-friendly) =====

#[derive(uniffi::Enum, Debug, Clone, Copy)]
pub enum FfiSigAlgorithm { Sha1WithRsa, Sha256WithRsa, Sha384WithRsa, Sha512WithRsa, Sha256WithRsaPss, DsaWithSha256, EcdsaWithSha256 }

impl From<FfiSigAlgorithm> for SigAlgorithm {
    fn from(v: FfiSigAlgorithm) -> Self {
        match v {
            FfiSigAlgorithm::Sha1WithRsa => SigAlgorithm::Sha1WithRsa,
            FfiSigAlgorithm::Sha256WithRsa => SigAlgorithm::Sha256WithRsa,
            FfiSigAlgorithm::Sha384WithRsa => SigAlgorithm::Sha384WithRsa,
            FfiSigAlgorithm::Sha512WithRsa => SigAlgorithm::Sha512WithRsa,
            FfiSigAlgorithm::Sha256WithRsaPss => SigAlgorithm::Sha256WithRsaPss,
            FfiSigAlgorithm::DsaWithSha256 => SigAlgorithm::DsaWithSha256,
            FfiSigAlgorithm::EcdsaWithSha256 => SigAlgorithm::EcdsaWithSha256,
        }
    }
}

impl From<SigAlgorithm> for FfiSigAlgorithm {
    fn from(v: SigAlgorithm) -> Self {
        match v {
            SigAlgorithm::Sha1WithRsa => FfiSigAlgorithm::Sha1WithRsa,
            SigAlgorithm::Sha256WithRsa => FfiSigAlgorithm::Sha256WithRsa,
            SigAlgorithm::Sha384WithRsa => FfiSigAlgorithm::Sha384WithRsa,
            SigAlgorithm::Sha512WithRsa => FfiSigAlgorithm::Sha512WithRsa,
            SigAlgorithm::Sha256WithRsaPss => FfiSigAlgorithm::Sha256WithRsaPss,
            SigAlgorithm::DsaWithSha256 => FfiSigAlgorithm::DsaWithSha256,
            SigAlgorithm::EcdsaWithSha256 => FfiSigAlgorithm::EcdsaWithSha256,
        }
    }
}

#[derive(uniffi::Enum, Debug, Clone)]
pub enum FfiOutcome { Verified, Failed { reason: String } }

impl From<Outcome> for FfiOutcome {
    fn from(v: Outcome) -> Self {
        match v { Outcome::Verified => FfiOutcome::Verified, Outcome::Failed { reason } => FfiOutcome::Failed { reason } }
    }
}

// ===== Verification result mappings =====

#[derive(uniffi::Record, Debug, Clone)]
pub struct FfiAlgorithmResult {
    pub algorithm: FfiSigAlgorithm,
    pub outcome: FfiOutcome,
}

#[derive(uniffi::Record, Debug, Clone)]
pub struct FfiRawVerificationReport {
    pub results: Vec<FfiAlgorithmResult>,
}

impl From<iid_engine::RawVerificationReport> for FfiRawVerificationReport {
    fn from(v: iid_engine::RawVerificationReport) -> Self {
        FfiRawVerificationReport {
            results: v.results.into_iter().map(|r| FfiAlgorithmResult { algorithm: r.algorithm.into(), outcome: r.outcome.into() }).collect(),
        }
    }
}

#[derive(uniffi::Record, Debug, Clone)]
pub struct FfiEnvelopeVerificationReport {
    pub outcome: FfiOutcome,
    /// Set only when `outcome` is `Verified`.
    pub verified_content: Option<Vec<u8>>,
    /// Payload of a rejected envelope, recovered without a signature check.
    pub unverified_content: Option<Vec<u8>>,
    pub embedded_certificates: u32,
}

impl From<iid_engine::EnvelopeVerificationReport> for FfiEnvelopeVerificationReport {
    fn from(v: iid_engine::EnvelopeVerificationReport) -> Self {
        let verified = v.outcome.is_verified();
        let (verified_content, unverified_content) = if verified { (v.content, None) } else { (None, v.content) };
        FfiEnvelopeVerificationReport {
            outcome: v.outcome.into(),
            verified_content,
            unverified_content,
            embedded_certificates: u32::try_from(v.embedded_certificates).unwrap_or(u32::MAX),
        }
    }
}

#[derive(uniffi::Record, Debug, Clone)]
pub struct FfiAnchorInfo {
    pub name: String,
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub key_family: String,
    pub sha256_fingerprint: String,
}

impl From<&AnchorInfo> for FfiAnchorInfo {
    fn from(v: &AnchorInfo) -> Self {
        FfiAnchorInfo {
            name: v.name.to_string(),
            subject: v.subject.clone(),
            issuer: v.issuer.clone(),
            serial: v.serial.clone(),
            key_family: v.key_family.to_string(),
            sha256_fingerprint: v.sha256_fingerprint.clone(),
        }
    }
}

// ===== High-level API, mirroring Rust surface =====

/// `candidates` empty means the default candidate set.
#[uniffi::export]
pub fn verify_raw_ffi(document: Vec<u8>, signature_b64: String, candidates: Vec<FfiSigAlgorithm>) -> Result<FfiRawVerificationReport, FfiError> {
    let cfg = if candidates.is_empty() {
        RawVerifyConfig::secure_default()
    } else {
        RawVerifyConfig { candidates: candidates.into_iter().map(Into::into).collect() }
    };
    let report = verify_raw(&document, signature_b64, &cfg)?;
    Ok(report.into())
}

#[uniffi::export]
pub fn verify_envelope_ffi(envelope: Vec<u8>) -> Result<FfiEnvelopeVerificationReport, FfiError> {
    let report = verify_envelope(&envelope)?;
    Ok(report.into())
}

#[uniffi::export]
pub fn embedded_anchors_ffi() -> Result<Vec<FfiAnchorInfo>, FfiError> {
    let store = TrustAnchorStore::embedded()?;
    Ok(vec![store.rsa_anchor().info().into(), store.envelope_anchor().info().into()])
}

uniffi::setup_scaffolding!();
