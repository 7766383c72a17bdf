use std::net::IpAddr;
use url::{Host, Url};

use crate::domain::error::{EngineError, EngineResult};

/// The metadata service is only reachable on link-local or loopback
/// addresses. Anything else is refused unless explicitly allowed.
pub fn validate_metadata_base_url(url_str: &str, allow_non_local: bool) -> EngineResult<Url> {
  let url = Url::parse(url_str)
    .map_err(|_| EngineError::Config(format!("invalid metadata URL: {url_str}")))?;
  match url.scheme() {
    "http" | "https" => {}
    other => return Err(EngineError::Config(format!("unsupported URL scheme '{other}'"))),
  }
  if !url.username().is_empty() || url.password().is_some() {
    return Err(EngineError::Config("metadata URL must not carry credentials".into()));
  }
  let host = url.host().ok_or_else(|| EngineError::Config("metadata URL missing host".into()))?;
  if allow_non_local {
    return Ok(url);
  }
  let is_local = match host {
    Host::Ipv4(a) => is_local_ip(IpAddr::V4(a)),
    Host::Ipv6(a) => is_local_ip(IpAddr::V6(a)),
    Host::Domain(d) => d.eq_ignore_ascii_case("localhost"),
  };
  if !is_local {
    return Err(EngineError::Config(
      "metadata URL host must be link-local or loopback".into(),
    ));
  }
  Ok(url)
}

fn is_local_ip(ip: IpAddr) -> bool {
  match ip {
    IpAddr::V4(v4) => v4.is_link_local() || v4.is_loopback(),
    // fd00:ec2::254 is the IPv6 metadata address (unique local).
    IpAddr::V6(v6) => v6.is_loopback() || v6.is_unicast_link_local() || v6.is_unique_local(),
  }
}
