//! Anti-forgery state tokens and PKCE (RFC 7636) S256 challenges.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Generate a cryptographically random anti-forgery state token.
///
/// 32 bytes of CSPRNG entropy encoded as base64url without padding
/// (43 characters). Used to correlate and validate the provider callback.
pub fn generate_state() -> String {
    let random_bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Generate a random PKCE code verifier (RFC 7636 §4.1).
pub fn generate_code_verifier() -> String {
    let random_bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Compute `BASE64URL(SHA256(verifier))` (RFC 7636 §4.2, S256 method).
pub fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// A PKCE challenge pair for one authorization attempt.
///
/// The challenge rides on the authorize URL; the verifier is surfaced on the
/// started session for the external token-exchange collaborator.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub verifier: String,
    pub challenge: String,
    pub method: &'static str,
}

impl Challenge {
    pub fn generate() -> Self {
        let verifier = generate_code_verifier();
        let challenge = generate_code_challenge(&verifier);
        Self {
            verifier,
            challenge,
            method: "S256",
        }
    }
}
