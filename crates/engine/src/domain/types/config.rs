use crate::domain::error::{EngineError, EngineResult};

use super::algorithm::SigAlgorithm;

/// Centralized defaults for the engine.
/// All opinionated defaults should be defined here for consistency.
pub struct EngineDefaults;

impl EngineDefaults {
    // Metadata service layout
    pub const IMDS_BASE_URL: &'static str = "http://169.254.169.254";
    pub const IDENTITY_PATH: &'static str = "/latest/dynamic/instance-identity";
    pub const DOCUMENT_NAME: &'static str = "document";
    pub const SIGNATURE_NAME: &'static str = "signature";
    pub const PKCS7_NAME: &'static str = "pkcs7";
    pub const TOKEN_PATH: &'static str = "/latest/api/token";

    // Security defaults
    pub const USE_SESSION_TOKEN: bool = true; // IMDSv2
    pub const ALLOW_NON_LOCAL_ENDPOINT: bool = false; // metadata service is link-local only
    pub const TOKEN_TTL_SECS: u32 = 21_600;

    // Resource defaults
    pub const REQUEST_TIMEOUT_SECS: u64 = 2;
    pub const MAX_RESPONSE_SIZE: usize = 64 * 1024;

    /// Order only matters for deterministic reporting.
    pub const CANDIDATES: [SigAlgorithm; 3] = [
        SigAlgorithm::Sha256WithRsa,
        SigAlgorithm::DsaWithSha256,
        SigAlgorithm::EcdsaWithSha256,
    ];
}

/// Candidate set for the raw-signature path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVerifyConfig {
    pub candidates: Vec<SigAlgorithm>,
}

impl RawVerifyConfig {
    pub fn secure_default() -> Self {
        Self { candidates: EngineDefaults::CANDIDATES.to_vec() }
    }

    /// Parse a comma separated list such as `SHA256WithRSA,SHA512WithRSA`.
    pub fn from_list(list: &str) -> EngineResult<Self> {
        let candidates = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect::<EngineResult<Vec<SigAlgorithm>>>()?;
        let cfg = Self { candidates };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.candidates.is_empty() {
            return Err(EngineError::Config("candidate algorithm set is empty".into()));
        }
        Ok(())
    }
}

impl Default for RawVerifyConfig {
    fn default() -> Self {
        Self::secure_default()
    }
}

/// Settings for talking to the instance metadata service.
#[derive(Debug, Clone)]
pub struct ImdsConfig {
    pub base_url: String,
    /// Acquire an IMDSv2 session token before each read.
    pub use_token: bool,
    pub token_ttl_secs: u32,
    pub timeout_secs: u64,
    pub max_response_size: usize,
    /// Opt-in: accept a base URL that is not link-local or loopback.
    pub allow_non_local_endpoint: bool,
}

impl ImdsConfig {
    /// Secure opinionated defaults.
    pub fn secure_default() -> Self {
        Self {
            base_url: EngineDefaults::IMDS_BASE_URL.to_string(),
            use_token: EngineDefaults::USE_SESSION_TOKEN,
            token_ttl_secs: EngineDefaults::TOKEN_TTL_SECS,
            timeout_secs: EngineDefaults::REQUEST_TIMEOUT_SECS,
            max_response_size: EngineDefaults::MAX_RESPONSE_SIZE,
            allow_non_local_endpoint: EngineDefaults::ALLOW_NON_LOCAL_ENDPOINT,
        }
    }
}

impl Default for ImdsConfig {
    fn default() -> Self {
        Self::secure_default()
    }
}
