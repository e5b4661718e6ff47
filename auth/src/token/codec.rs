use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::TokenScope;
use super::errors::TokenError;

/// Signing algorithms the codec accepts.
///
/// Deliberately a closed HMAC allow-list; asymmetric algorithms (and `none`)
/// are not representable, so a tampered header cannot downgrade verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmacAlgorithm {
    Hs256,
    Hs512,
}

impl From<HmacAlgorithm> for Algorithm {
    fn from(alg: HmacAlgorithm) -> Self {
        match alg {
            HmacAlgorithm::Hs256 => Algorithm::HS256,
            HmacAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

impl FromStr for HmacAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(HmacAlgorithm::Hs256),
            "HS512" => Ok(HmacAlgorithm::Hs512),
            other => Err(TokenError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Per-scope token lifetimes.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub access: Duration,
    pub refresh: Duration,
    pub verification: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            access: Duration::minutes(10),
            refresh: Duration::days(7),
            verification: Duration::days(1),
        }
    }
}

/// Signs and verifies compact, expiring, scoped tokens.
///
/// Stateless; issuance and verification are pure computation over the shared
/// secret and the UTC clock.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttls: TokenTtls,
}

impl TokenCodec {
    /// Create a codec with an explicit algorithm from the allow-list.
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes)
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8], algorithm: HmacAlgorithm, ttls: TokenTtls) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: algorithm.into(),
            ttls,
        }
    }

    /// Create an HS256 codec.
    pub fn hs256(secret: &[u8], ttls: TokenTtls) -> Self {
        Self::new(secret, HmacAlgorithm::Hs256, ttls)
    }

    /// Issue a token for `subject` using the configured TTL for `scope`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(&self, subject: &str, scope: TokenScope) -> Result<String, TokenError> {
        self.issue_with_ttl(subject, scope, self.ttl_for(scope))
    }

    /// Issue a token with an explicit TTL, overriding the configured default.
    pub fn issue_with_ttl(
        &self,
        subject: &str,
        scope: TokenScope,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(subject, scope, ttl);
        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// Scope is returned, not checked; each operation enforces the scope it
    /// expects.
    ///
    /// # Errors
    /// * `Expired` - `exp` is in the past
    /// * `InvalidSignature` - Signature does not verify under the secret
    /// * `Malformed` - Not a decodable token, or required claims missing
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry comparisons are exact; no clock-skew grace window.
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        TokenError::InvalidSignature
                    }
                    _ => TokenError::Malformed(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    fn ttl_for(&self, scope: TokenScope) -> Duration {
        match scope {
            TokenScope::Access => self.ttls.access,
            TokenScope::Refresh => self.ttls.refresh,
            TokenScope::EmailVerification => self.ttls.verification,
        }
    }
}
