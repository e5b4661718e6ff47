use std::fmt;

use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Declared purpose of a token.
///
/// A token is only honored by operations expecting its scope, so an access
/// token can never stand in for a refresh token or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenScope {
    #[serde(rename = "access_token")]
    Access,

    #[serde(rename = "refresh_token")]
    Refresh,

    #[serde(rename = "email_verification")]
    EmailVerification,
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenScope::Access => "access_token",
            TokenScope::Refresh => "refresh_token",
            TokenScope::EmailVerification => "email_verification",
        };
        f.write_str(s)
    }
}

/// Claims carried by every issued token.
///
/// All timestamps are Unix seconds taken from a single UTC clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the identity's email address
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Declared token purpose
    pub scope: TokenScope,
}

impl Claims {
    /// Build claims expiring `ttl` from now.
    pub fn new(subject: impl Into<String>, scope: TokenScope, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            scope,
        }
    }
}
