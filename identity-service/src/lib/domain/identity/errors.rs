use thiserror::Error;

/// Error for IdentityId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Error restoring an Identity from a cached snapshot
#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    #[error("Invalid email in snapshot: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid username in snapshot: {0}")]
    Username(#[from] UsernameError),

    #[error("Invalid role in snapshot: {0}")]
    Role(#[from] RoleError),
}

/// Error for identity persistence operations.
///
/// Never swallowed: a failed repository write fails the auth operation that
/// needed it.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("Identity not found: {0}")]
    NotFound(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Stored identity record is invalid: {0}")]
    Corrupted(String),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Error for identity cache operations.
///
/// Always best-effort: the service logs these and degrades to repository
/// reads; a cache outage never fails an auth decision.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache entry could not be encoded or decoded: {0}")]
    Encoding(String),
}

/// Error for confirmation email dispatch.
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Failed to send confirmation email: {0}")]
    SendFailed(String),
}

/// Top-level error for all authentication and authorization operations
#[derive(Debug, Error)]
pub enum AuthError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid identity ID: {0}")]
    InvalidIdentityId(#[from] IdentityIdError),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email format: {0}")]
    MalformedEmail(#[from] EmailError),

    // Business errors: returned to the caller as typed results, never retried
    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Verification error")]
    VerificationError,

    // Terminal for the request; deliberately free of detail about which
    // check failed
    #[error("Could not validate credentials")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    // Infrastructure errors: retryable/fatal, distinguishable from Unauthorized
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}
