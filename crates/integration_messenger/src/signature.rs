//! Request signing and webhook signature validation
//!
//! Outbound Graph API calls carry an `appsecret_proof`, the HMAC-SHA256 of the
//! access token keyed by the app secret. Inbound webhook deliveries carry a
//! hub signature header of the form `<algorithm>=<hex digest>` computed over
//! the raw request body.

use std::fmt;
use std::str::FromStr;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use tracing::warn;

/// Hash algorithms accepted for HMAC signatures
///
/// Names not listed here are rejected, so a webhook header cannot select an
/// arbitrary digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// Legacy `X-Hub-Signature`
    Sha1,
    /// `X-Hub-Signature-256` and `appsecret_proof`
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Name used in hub signature headers
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Look up an algorithm by its header name (case-insensitive)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Sha1, Self::Sha256, Self::Sha512]
            .into_iter()
            .find(|algorithm| algorithm.name().eq_ignore_ascii_case(name))
    }

    fn mac(self, secret: &[u8], message: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => hmac_bytes::<Hmac<Sha1>>(secret, message),
            Self::Sha256 => hmac_bytes::<Hmac<Sha256>>(secret, message),
            Self::Sha512 => hmac_bytes::<Hmac<Sha512>>(secret, message),
        }
    }

    fn verify(self, secret: &[u8], message: &[u8], expected: &[u8]) -> bool {
        match self {
            Self::Sha1 => hmac_verify::<Hmac<Sha1>>(secret, message, expected),
            Self::Sha256 => hmac_verify::<Hmac<Sha256>>(secret, message, expected),
            Self::Sha512 => hmac_verify::<Hmac<Sha512>>(secret, message, expected),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unsupported hash algorithm: {s}"))
    }
}

#[allow(clippy::expect_used)] // HMAC accepts keys of any length
fn hmac_bytes<M: Mac + KeyInit>(secret: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = <M as KeyInit>::new_from_slice(secret).expect("HMAC key of any length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

fn hmac_verify<M: Mac + KeyInit>(secret: &[u8], message: &[u8], expected: &[u8]) -> bool {
    let Ok(mut mac) = <M as KeyInit>::new_from_slice(secret) else {
        warn!("Failed to create HMAC");
        return false;
    };
    mac.update(message);
    mac.verify_slice(expected).is_ok()
}

/// Lowercase hex HMAC of `message` keyed by `secret`
#[must_use]
pub fn sign(secret: &[u8], message: &[u8], algorithm: HashAlgorithm) -> String {
    hex::encode(algorithm.mac(secret, message))
}

/// Compute the `appsecret_proof` query parameter for an access token
#[must_use]
pub fn appsecret_proof(app_secret: &str, access_token: &str) -> String {
    sign(
        app_secret.as_bytes(),
        access_token.as_bytes(),
        HashAlgorithm::Sha256,
    )
}

/// Validate a hub signature header against the raw request body
///
/// Returns false for malformed headers, unsupported algorithms and digest
/// mismatches. The digest comparison is constant-time.
pub fn verify_hub_signature(payload: &[u8], header: &str, secret: &[u8]) -> bool {
    let Some((algorithm_name, signature_hex)) = header.split_once('=') else {
        warn!("Invalid signature format");
        return false;
    };

    let Some(algorithm) = HashAlgorithm::from_name(algorithm_name) else {
        warn!(algorithm = %algorithm_name, "Unsupported signature algorithm");
        return false;
    };

    if signature_hex.is_empty() {
        warn!("Empty signature digest");
        return false;
    }

    let Ok(expected) = hex::decode(signature_hex) else {
        warn!("Failed to decode signature hex");
        return false;
    };

    algorithm.verify(secret, payload, &expected)
}
