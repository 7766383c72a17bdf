use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::error::EngineError;

/// Public-key families a trust anchor (or a candidate algorithm) can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyFamily {
    Rsa,
    Dsa,
    Ec,
    Other,
}

impl fmt::Display for KeyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyFamily::Rsa => "RSA",
            KeyFamily::Dsa => "DSA",
            KeyFamily::Ec => "EC",
            KeyFamily::Other => "unsupported",
        })
    }
}

/// Signature schemes the raw path can probe. The provider does not say
/// which one it signs with, so a closed candidate set is tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SigAlgorithm {
    Sha1WithRsa,
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
    Sha256WithRsaPss,
    DsaWithSha256,
    EcdsaWithSha256,
}

impl SigAlgorithm {
    /// Every algorithm the engine knows how to evaluate.
    pub const ALL: [SigAlgorithm; 7] = [
        SigAlgorithm::Sha1WithRsa,
        SigAlgorithm::Sha256WithRsa,
        SigAlgorithm::Sha384WithRsa,
        SigAlgorithm::Sha512WithRsa,
        SigAlgorithm::Sha256WithRsaPss,
        SigAlgorithm::DsaWithSha256,
        SigAlgorithm::EcdsaWithSha256,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SigAlgorithm::Sha1WithRsa => "SHA1WithRSA",
            SigAlgorithm::Sha256WithRsa => "SHA256WithRSA",
            SigAlgorithm::Sha384WithRsa => "SHA384WithRSA",
            SigAlgorithm::Sha512WithRsa => "SHA512WithRSA",
            SigAlgorithm::Sha256WithRsaPss => "SHA256WithRSAPSS",
            SigAlgorithm::DsaWithSha256 => "DSAWithSHA256",
            SigAlgorithm::EcdsaWithSha256 => "ECDSAWithSHA256",
        }
    }

    /// Key family the scheme needs; a mismatch can never verify.
    pub fn key_family(self) -> KeyFamily {
        match self {
            SigAlgorithm::Sha1WithRsa
            | SigAlgorithm::Sha256WithRsa
            | SigAlgorithm::Sha384WithRsa
            | SigAlgorithm::Sha512WithRsa
            | SigAlgorithm::Sha256WithRsaPss => KeyFamily::Rsa,
            SigAlgorithm::DsaWithSha256 => KeyFamily::Dsa,
            SigAlgorithm::EcdsaWithSha256 => KeyFamily::Ec,
        }
    }

    pub fn digest(self) -> openssl::hash::MessageDigest {
        use openssl::hash::MessageDigest;
        match self {
            SigAlgorithm::Sha1WithRsa => MessageDigest::sha1(),
            SigAlgorithm::Sha384WithRsa => MessageDigest::sha384(),
            SigAlgorithm::Sha512WithRsa => MessageDigest::sha512(),
            SigAlgorithm::Sha256WithRsa
            | SigAlgorithm::Sha256WithRsaPss
            | SigAlgorithm::DsaWithSha256
            | SigAlgorithm::EcdsaWithSha256 => MessageDigest::sha256(),
        }
    }

    pub fn is_pss(self) -> bool {
        matches!(self, SigAlgorithm::Sha256WithRsaPss)
    }
}

impl fmt::Display for SigAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SigAlgorithm {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SigAlgorithm::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EngineError::Config(format!("unknown signature algorithm: {wanted}")))
    }
}
