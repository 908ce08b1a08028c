//! Opaque bearer-token encoding.
//!
//! A plaintext token has the form `{token_id}.{secret}` where `secret` is 32
//! random bytes in URL-safe base64 without padding. Only
//! `HMAC-SHA256(signing_secret, secret)` is persisted, so an attacker with
//! read access to the database can neither use nor forge tokens.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

use crate::domain::errors::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes per secret.
const SECRET_BYTES: usize = 32;

/// Length of the base64 encoding of [`SECRET_BYTES`].
const SECRET_LEN: usize = 43;

/// A freshly generated secret and the hash to store for it.
pub struct IssuedSecret {
    pub secret: String,
    pub hash: String,
}

impl fmt::Debug for IssuedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedSecret")
            .field("secret", &"***")
            .field("hash", &self.hash)
            .finish()
    }
}

/// Stateless encoder/decoder for bearer tokens, keyed by the server signing secret.
#[derive(Clone)]
pub struct TokenCodec {
    signing_secret: String,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("signing_secret", &"***")
            .finish()
    }
}

impl TokenCodec {
    /// Creates a codec. `signing_secret` must match the one used when stored hashes were made.
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
        }
    }

    /// Generates a new random secret together with its storage hash.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the system CSPRNG is unavailable.
    pub fn issue(&self) -> Result<IssuedSecret, AuthError> {
        let mut buffer = [0u8; SECRET_BYTES];
        getrandom::fill(&mut buffer)
            .map_err(|e| AuthError::Internal(format!("random source unavailable: {e}")))?;

        let secret = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer);
        let hash = self.hash(&secret);

        Ok(IssuedSecret { secret, hash })
    }

    /// Hashes a secret with HMAC-SHA256. Returns 64 lowercase hex characters.
    pub fn hash(&self, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(secret.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Builds the plaintext handed to the client.
    pub fn encode(token_id: i64, secret: &str) -> String {
        format!("{token_id}.{secret}")
    }

    /// Splits a plaintext token into `(token_id, secret)`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedToken`] unless the input is a positive
    /// decimal id, a dot, and a well-formed secret.
    pub fn parse(plaintext: &str) -> Result<(i64, &str), AuthError> {
        let (id, secret) = plaintext
            .split_once('.')
            .ok_or(AuthError::MalformedToken)?;

        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::MalformedToken);
        }

        let token_id: i64 = id.parse().map_err(|_| AuthError::MalformedToken)?;
        if token_id <= 0 {
            return Err(AuthError::MalformedToken);
        }

        if secret.len() != SECRET_LEN
            || !secret
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(AuthError::MalformedToken);
        }

        Ok((token_id, secret))
    }

    /// Checks `secret` against a stored hash in constant time.
    pub fn verify(&self, secret: &str, stored_hash: &str) -> bool {
        let computed = self.hash(secret);
        computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-signing-secret")
    }

    #[test]
    fn test_issue_produces_url_safe_secret() {
        let issued = codec().issue().unwrap();

        assert_eq!(issued.secret.len(), SECRET_LEN);
        assert!(
            issued
                .secret
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(issued.hash.len(), 64);
    }

    #[test]
    fn test_issue_is_random() {
        let a = codec().issue().unwrap();
        let b = codec().issue().unwrap();
        assert_ne!(a.secret, b.secret);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_hash_is_keyed() {
        let a = TokenCodec::new("secret-a");
        let b = TokenCodec::new("secret-b");
        assert_eq!(a.hash("token"), a.hash("token"));
        assert_ne!(a.hash("token"), b.hash("token"));
    }

    #[test]
    fn test_encode_then_parse() {
        let issued = codec().issue().unwrap();
        let plaintext = TokenCodec::encode(42, &issued.secret);

        let (id, secret) = TokenCodec::parse(&plaintext).unwrap();
        assert_eq!(id, 42);
        assert_eq!(secret, issued.secret);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        let secret = "a".repeat(SECRET_LEN);
        let cases = [
            String::new(),
            "no-dot-at-all".to_string(),
            format!(".{secret}"),
            format!("abc.{secret}"),
            format!("-1.{secret}"),
            format!("0.{secret}"),
            format!("99999999999999999999.{secret}"),
            "1.short".to_string(),
            format!("1.{}", "a".repeat(SECRET_LEN + 1)),
            format!("1.{}+", "a".repeat(SECRET_LEN - 1)),
            format!("1.{secret}.extra"),
        ];

        for case in cases {
            assert!(
                matches!(TokenCodec::parse(&case), Err(AuthError::MalformedToken)),
                "expected malformed: {case:?}"
            );
        }
    }

    #[test]
    fn test_verify() {
        let codec = codec();
        let issued = codec.issue().unwrap();

        assert!(codec.verify(&issued.secret, &issued.hash));
        assert!(!codec.verify("other", &issued.hash));
        assert!(!codec.verify(&issued.secret, "short"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let issued = codec().issue().unwrap();
        let rendered = format!("{:?} {:?}", codec(), issued);
        assert!(!rendered.contains("test-signing-secret"));
        assert!(!rendered.contains(&issued.secret));
    }
}
