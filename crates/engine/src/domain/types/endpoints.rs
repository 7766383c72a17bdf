use std::path::Path;

use super::config::EngineDefaults;

/// Locators for the three identity resources, handed to a `ByteFetcher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEndpoints {
    pub document: String,
    pub signature: String,
    pub pkcs7: String,
}

impl IdentityEndpoints {
    /// URLs under the metadata service identity path.
    pub fn imds(base_url: &str) -> Self {
        let base = format!("{}{}", base_url.trim_end_matches('/'), EngineDefaults::IDENTITY_PATH);
        Self {
            document: format!("{base}/{}", EngineDefaults::DOCUMENT_NAME),
            signature: format!("{base}/{}", EngineDefaults::SIGNATURE_NAME),
            pkcs7: format!("{base}/{}", EngineDefaults::PKCS7_NAME),
        }
    }

    /// Files named `document`, `signature` and `pkcs7` inside `dir`.
    pub fn local_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let file = |name: &str| dir.join(name).to_string_lossy().into_owned();
        Self {
            document: file(EngineDefaults::DOCUMENT_NAME),
            signature: file(EngineDefaults::SIGNATURE_NAME),
            pkcs7: file(EngineDefaults::PKCS7_NAME),
        }
    }
}

impl Default for IdentityEndpoints {
    fn default() -> Self {
        Self::imds(EngineDefaults::IMDS_BASE_URL)
    }
}
