// crates/engine/src/domain/document.rs
use serde::{Deserialize, Serialize};

/// Fields of the identity document, for display only. Verification always
/// runs over the raw bytes; nothing here is trusted unless a pipeline
/// verified those bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceIdentity {
    pub instance_id: Option<String>,
    pub account_id: Option<String>,
    pub region: Option<String>,
    pub availability_zone: Option<String>,
    pub image_id: Option<String>,
    pub instance_type: Option<String>,
    pub architecture: Option<String>,
    pub private_ip: Option<String>,
    pub pending_time: Option<String>,
    pub version: Option<String>,
}

impl InstanceIdentity {
    pub fn parse(document: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(document)
    }
}
