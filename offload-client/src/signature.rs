//! HMAC-SHA1 payload signatures
//!
//! The same primitive signs outgoing assembly submissions and verifies
//! inbound webhook notifications. Verification runs over the raw payload
//! bytes and must happen before the payload is parsed or trusted in any
//! way; a forged completion notification could otherwise redirect stored
//! results onto arbitrary records.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

/// Signature verification failures
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The supplied signature is not valid hex
    #[error("malformed signature: {0}")]
    Malformed(#[from] hex::FromHexError),

    /// The signature does not match the payload
    #[error("received signature doesn't match calculated")]
    Invalid,
}

/// Signs a payload with the shared secret, returning lowercase hex
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a hex-encoded signature against the raw payload bytes
///
/// Comparison is constant-time. A mismatch is a hard failure: the payload
/// must be discarded, never parsed.
pub fn verify(payload: &[u8], supplied_hex: &str, secret: &str) -> Result<(), SignatureError> {
    let supplied = hex::decode(supplied_hex)?;
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.verify_slice(&supplied).map_err(|_| SignatureError::Invalid)
}
