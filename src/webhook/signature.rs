//! HMAC-SHA256 verification of GitHub webhook deliveries.
//!
//! GitHub signs the exact request body with the shared webhook secret and
//! sends the digest in `X-Hub-Signature-256` as `sha256=<hex>`. Verification
//! runs before any parsing or I/O, and fails closed.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of a SHA-256 digest.
const DIGEST_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("webhook secret is not configured")]
    EmptySecret,

    #[error("missing signature header")]
    Missing,

    #[error("malformed signature header")]
    MalformedHeader,

    #[error("unsupported signature algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("signature has {actual} bytes, expected {DIGEST_LEN}")]
    LengthMismatch { actual: usize },

    #[error("signature mismatch")]
    Mismatch,
}

impl SignatureError {
    /// Whether the header itself was unusable, as opposed to a well-formed
    /// header that failed to authenticate.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedHeader | Self::UnsupportedAlgorithm(_))
    }
}

/// Verifies deliveries against one shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check `header` (the raw `X-Hub-Signature-256` value) against `body`.
    pub fn verify(&self, body: &[u8], header: &str) -> Result<(), SignatureError> {
        if self.secret.is_empty() {
            return Err(SignatureError::EmptySecret);
        }
        let expected = parse_signature_header(header)?;
        if expected.len() != DIGEST_LEN {
            return Err(SignatureError::LengthMismatch {
                actual: expected.len(),
            });
        }

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| SignatureError::EmptySecret)?;
        mac.update(body);
        // verify_slice compares in constant time.
        mac.verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}

/// Split `sha256=<hex>` and decode the digest.
///
/// The algorithm tag is matched case-insensitively and hex of either case is
/// accepted.
pub fn parse_signature_header(header: &str) -> Result<Vec<u8>, SignatureError> {
    let header = header.trim();
    let (algorithm, digest) = header
        .split_once('=')
        .ok_or(SignatureError::MalformedHeader)?;
    if !algorithm.eq_ignore_ascii_case("sha256") {
        return Err(SignatureError::UnsupportedAlgorithm(algorithm.to_string()));
    }
    if digest.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }
    hex::decode(digest).map_err(|_| SignatureError::MalformedHeader)
}

/// HMAC-SHA256 of `payload` under `secret`.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, including empty.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Render a digest the way GitHub sends it.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Convenience for tests and tooling: the full header value for `payload`.
pub fn sign(payload: &[u8], secret: &[u8]) -> String {
    format_signature_header(&compute_signature(payload, secret))
}
