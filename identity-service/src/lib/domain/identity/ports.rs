use std::time::Duration;

use async_trait::async_trait;

use crate::identity::errors::AuthError;
use crate::identity::errors::CacheError;
use crate::identity::errors::MailerError;
use crate::identity::errors::RepositoryError;
use crate::identity::models::ConfirmationOutcome;
use crate::identity::models::ConfirmationRequestOutcome;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::SignupRequest;
use crate::identity::models::TokenPair;

/// Port for the authentication service exposed to route/handler collaborators.
#[async_trait]
pub trait AuthenticationPort: Send + Sync + 'static {
    /// Register a new identity.
    ///
    /// The identity starts unconfirmed; a verification email is dispatched
    /// best-effort. The plaintext password is hashed before storage and never
    /// returned.
    ///
    /// # Errors
    /// * `AccountExists` - An identity with this email is already registered
    /// * `Repository` - Persistence failed
    async fn signup(&self, request: SignupRequest) -> Result<Identity, AuthError>;

    /// Authenticate with email and password.
    ///
    /// Gates, in order: identity must exist, must be confirmed, password must
    /// verify. On success the stored refresh token is overwritten, revoking
    /// any previously issued one.
    ///
    /// # Errors
    /// * `InvalidEmail` - No identity with this email
    /// * `EmailNotConfirmed` - Identity has not confirmed its email
    /// * `InvalidPassword` - Password does not match
    /// * `Repository` - Persisting the rotated refresh token failed
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Exchange a refresh token for a new access/refresh pair.
    ///
    /// The presented token must carry the refresh scope and equal the stored
    /// refresh token. A mismatch is treated as compromise: the stored token
    /// is cleared, forcing re-login.
    ///
    /// # Errors
    /// * `InvalidRefreshToken` - Token invalid, wrong scope, unknown subject,
    ///   or rotation mismatch
    /// * `Repository` - Persisting the rotation failed
    async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError>;

    /// Confirm an identity's email from a verification token.
    ///
    /// Idempotent: an already-confirmed identity yields `AlreadyConfirmed`
    /// without error or further mutation.
    ///
    /// # Errors
    /// * `VerificationError` - Token invalid, wrong scope, or unknown subject
    /// * `Repository` - Persisting the confirmation failed
    async fn confirm_email(&self, token: &str) -> Result<ConfirmationOutcome, AuthError>;

    /// Re-send the verification email for an unconfirmed identity.
    ///
    /// # Errors
    /// * `VerificationError` - No identity with this email
    async fn request_confirmation(
        &self,
        email: &str,
    ) -> Result<ConfirmationRequestOutcome, AuthError>;

    /// Resolve the identity behind a presented access token.
    ///
    /// Cache-aside: a cached snapshot is used when present, otherwise the
    /// repository is read and the cache populated with a bounded TTL. Every
    /// decode/scope/subject failure yields a uniform `Unauthorized`.
    ///
    /// # Errors
    /// * `Unauthorized` - Token invalid, expired, wrong scope, or unknown subject
    /// * `Repository` - Repository read failed (distinguishable from Unauthorized)
    async fn resolve_identity(&self, access_token: &str) -> Result<Identity, AuthError>;

    /// Set a new password for an already-authenticated identity.
    ///
    /// Clears the stored refresh token, so refresh tokens issued before the
    /// reset stop working at the next rotation attempt.
    ///
    /// # Errors
    /// * `Repository` - Persistence failed
    async fn reset_password(
        &self,
        identity: &Identity,
        new_password: &str,
    ) -> Result<Identity, AuthError>;

    /// Persist a new avatar URL and overwrite the cached snapshot.
    ///
    /// # Errors
    /// * `Repository` - Persistence failed
    async fn update_avatar(
        &self,
        identity: &Identity,
        url: Option<String>,
    ) -> Result<Identity, AuthError>;
}

/// Persistence operations for the identity aggregate.
///
/// The durable source of truth; the cache never overrides it.
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Retrieve an identity by email address.
    ///
    /// # Errors
    /// * `Unavailable` - Repository operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RepositoryError>;

    /// Persist a new identity.
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email is already registered
    /// * `Unavailable` - Repository operation failed
    async fn insert(&self, identity: Identity) -> Result<Identity, RepositoryError>;

    /// Overwrite the stored refresh token; `None` clears it.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Unavailable` - Repository operation failed
    async fn update_refresh_token(
        &self,
        id: &IdentityId,
        token: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// Mark the identity's email as confirmed.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Unavailable` - Repository operation failed
    async fn update_confirmed(&self, id: &IdentityId) -> Result<(), RepositoryError>;

    /// Replace the stored password hash.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Unavailable` - Repository operation failed
    async fn update_password_hash(
        &self,
        id: &IdentityId,
        hash: &str,
    ) -> Result<(), RepositoryError>;

    /// Replace the stored avatar URL; `None` clears it.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `Unavailable` - Repository operation failed
    async fn update_avatar(
        &self,
        id: &IdentityId,
        url: Option<&str>,
    ) -> Result<(), RepositoryError>;
}

/// Cache-aside store for identity snapshots, keyed by email.
///
/// Concurrent `get`/`set`/`invalidate` must not corrupt entries; per-key
/// overwrite semantics are sufficient since every `set` carries a freshly
/// read snapshot.
#[async_trait]
pub trait IdentityCache: Send + Sync + 'static {
    /// Look up a cached identity snapshot.
    ///
    /// # Errors
    /// * `Unavailable` / `Encoding` - Treated as a miss by callers
    async fn get(&self, email: &str) -> Result<Option<Identity>, CacheError>;

    /// Store a snapshot with an explicit TTL, overwriting any existing entry.
    ///
    /// # Errors
    /// * `Unavailable` / `Encoding` - Cache write failed
    async fn set(&self, email: &str, identity: &Identity, ttl: Duration)
        -> Result<(), CacheError>;

    /// Drop the cached snapshot for an email, if any.
    ///
    /// # Errors
    /// * `Unavailable` - Cache operation failed
    async fn invalidate(&self, email: &str) -> Result<(), CacheError>;
}

/// Outbound confirmation email dispatch.
///
/// Best-effort collaborator: failures are logged by the service, never
/// surfaced to the signup caller.
#[async_trait]
pub trait ConfirmationMailer: Send + Sync + 'static {
    /// Send a confirmation email carrying a verification token.
    ///
    /// # Errors
    /// * `SendFailed` - Transport rejected the message
    async fn send_confirmation(
        &self,
        email: &str,
        username: &str,
        token: &str,
    ) -> Result<(), MailerError>;
}
