use std::time::Duration;

use url::Url;

use crate::adapters::runtime::run_on_current_thread;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::fetch::{ByteFetcher, FetchError};
use crate::domain::types::{EngineDefaults, IdentityEndpoints, ImdsConfig};

use super::url_validation::validate_metadata_base_url;

const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";

/// `ByteFetcher` over the instance metadata service.
#[derive(Debug, Clone)]
pub struct ImdsFetcher {
    client: reqwest::Client,
    base: Url,
    config: ImdsConfig,
}

impl ImdsFetcher {
    pub fn new(config: ImdsConfig) -> EngineResult<Self> {
        let base = validate_metadata_base_url(&config.base_url, config.allow_non_local_endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .no_proxy()
            .build()
            .map_err(|e| EngineError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { client, base, config })
    }

    pub fn endpoints(&self) -> IdentityEndpoints {
        IdentityEndpoints::imds(self.base.as_str())
    }

    async fn fetch_async(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let target = Url::parse(uri).map_err(|_| FetchError::InvalidUri(uri.to_string()))?;
        // The session token must never leave the metadata origin.
        if target.origin() != self.base.origin() {
            return Err(FetchError::InvalidUri(uri.to_string()));
        }

        let token = if self.config.use_token {
            match self.session_token().await {
                Ok(token) => Some(token),
                Err(e) if cfg!(feature = "imds_v1_fallback") => {
                    tracing::warn!(error = %e, "session token unavailable, falling back to IMDSv1");
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        let mut request = self.client.get(target);
        if let Some(token) = &token {
            request = request.header(TOKEN_HEADER, token);
        }
        tracing::debug!(uri, with_token = token.is_some(), "fetching metadata resource");
        let response = request.send().await.map_err(|e| transport(uri, e))?;
        self.read_limited(uri, response).await
    }

    async fn session_token(&self) -> Result<String, FetchError> {
        let uri_str = token_url(self.base.as_str());
        let uri = Url::parse(&uri_str).map_err(|_| FetchError::InvalidUri(uri_str.clone()))?;
        let response = self
            .client
            .put(uri)
            .header(TOKEN_TTL_HEADER, self.config.token_ttl_secs.to_string())
            .send()
            .await
            .map_err(|e| transport(&uri_str, e))?;
        let body = self.read_limited(&uri_str, response).await?;
        let token = String::from_utf8(body).map_err(|_| FetchError::Transport {
            uri: uri_str.clone(),
            message: "session token is not UTF-8".into(),
        })?;
        Ok(token.trim().to_string())
    }

    async fn read_limited(&self, uri: &str, mut response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { uri: uri.to_string(), status: status.as_u16() });
        }
        let limit = self.config.max_response_size;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FetchError::TooLarge { uri: uri.to_string(), limit });
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| transport(uri, e))? {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::TooLarge { uri: uri.to_string(), limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

impl ByteFetcher for ImdsFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        run_on_current_thread(self.fetch_async(uri))
    }
}

/// Token endpoint under the configured base, keeping any path prefix the
/// way `IdentityEndpoints::imds` does.
pub(crate) fn token_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), EngineDefaults::TOKEN_PATH)
}

fn transport(uri: &str, e: reqwest::Error) -> FetchError {
    FetchError::Transport { uri: uri.to_string(), message: e.to_string() }
}
