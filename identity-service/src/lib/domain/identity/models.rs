use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::identity::errors::EmailError;
use crate::identity::errors::IdentityIdError;
use crate::identity::errors::RoleError;
use crate::identity::errors::SnapshotError;
use crate::identity::errors::UsernameError;

/// Identity aggregate entity.
///
/// The durable user record plus the authentication state attached to it.
/// The repository is the source of truth; cached copies are disposable
/// snapshots.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: IdentityId,
    pub email: EmailAddress,
    pub username: Username,
    pub avatar_url: Option<String>,
    pub role: Role,
    /// One-way flag: flips false -> true exactly once, never back
    pub confirmed: bool,
    /// Last-issued refresh token, used for revocation-by-mismatch only.
    /// Issuing a new one invalidates the previous by overwrite.
    pub refresh_token: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Identity unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    /// Generate a new random identity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identity ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, IdentityIdError> {
        Uuid::parse_str(s)
            .map(IdentityId)
            .map_err(|e| IdentityIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Ensures username is 3-50 characters and contains only alphanumeric, underscore, and hyphen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 50;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 50 characters
    /// * `InvalidCharacters` - Contains non-alphanumeric characters (except _ and -)
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = Self::with_valid_length(username)?;
        let username = Self::with_valid_chars(username)?;
        Ok(Self(username))
    }

    fn with_valid_length(username: String) -> Result<String, UsernameError> {
        let length = username.len();
        if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(username)
        }
    }

    fn with_valid_chars(username: String) -> Result<String, UsernameError> {
        if username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            Ok(username)
        } else {
            Err(UsernameError::InvalidCharacters)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser. Doubles as the
/// cache key for identity snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Authorization role attached to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "user" => Ok(Role::User),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to register a new identity with validated fields.
#[derive(Debug)]
pub struct SignupRequest {
    pub email: EmailAddress,
    pub username: Username,
    pub password: String,
}

impl SignupRequest {
    /// Construct a new signup request.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `username` - Validated username
    /// * `password` - Plain text password (hashed by the service, never stored)
    pub fn new(email: EmailAddress, username: Username, password: String) -> Self {
        Self {
            email,
            username,
            password,
        }
    }
}

/// Access/refresh token pair returned by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Outcome of an email confirmation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed,
    AlreadyConfirmed,
}

impl ConfirmationOutcome {
    pub fn already_confirmed(&self) -> bool {
        matches!(self, ConfirmationOutcome::AlreadyConfirmed)
    }
}

/// Outcome of asking for a (re-sent) confirmation email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationRequestOutcome {
    Sent,
    AlreadyConfirmed,
}

/// Serialized identity snapshot stored in the cache.
///
/// A field-tagged record deliberately decoupled from both the domain entity
/// and the storage row; schema drift in either shows up as a decode failure,
/// which cache readers treat as a miss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub confirmed: bool,
    pub refresh_token: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for IdentitySnapshot {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.0,
            email: identity.email.as_str().to_string(),
            username: identity.username.as_str().to_string(),
            avatar_url: identity.avatar_url.clone(),
            role: identity.role,
            confirmed: identity.confirmed,
            refresh_token: identity.refresh_token.clone(),
            password_hash: identity.password_hash.clone(),
            created_at: identity.created_at,
        }
    }
}

impl TryFrom<IdentitySnapshot> for Identity {
    type Error = SnapshotError;

    fn try_from(snapshot: IdentitySnapshot) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: IdentityId(snapshot.id),
            email: EmailAddress::new(snapshot.email)?,
            username: Username::new(snapshot.username)?,
            avatar_url: snapshot.avatar_url,
            role: snapshot.role,
            confirmed: snapshot.confirmed,
            refresh_token: snapshot.refresh_token,
            password_hash: snapshot.password_hash,
            created_at: snapshot.created_at,
        })
    }
}
