use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenCodec;
use auth::TokenScope;
use chrono::Utc;

use crate::identity::errors::AuthError;
use crate::identity::errors::RepositoryError;
use crate::identity::models::ConfirmationOutcome;
use crate::identity::models::ConfirmationRequestOutcome;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::Role;
use crate::identity::models::SignupRequest;
use crate::identity::models::TokenPair;
use crate::identity::ports::AuthenticationPort;
use crate::identity::ports::ConfirmationMailer;
use crate::identity::ports::IdentityCache;
use crate::identity::ports::IdentityRepository;

/// Authentication and authorization orchestrator.
///
/// Owns the password hasher and token codec, and coordinates the repository
/// (source of truth), the cache (disposable snapshots), and the mailer
/// (best-effort). All dependencies are injected; the service itself keeps no
/// mutable state, so one instance serves any number of concurrent requests.
pub struct AuthenticationService<R, C, M>
where
    R: IdentityRepository,
    C: IdentityCache,
    M: ConfirmationMailer,
{
    repository: Arc<R>,
    cache: Arc<C>,
    mailer: Arc<M>,
    password_hasher: PasswordHasher,
    token_codec: TokenCodec,
    cache_ttl: Duration,
}

impl<R, C, M> AuthenticationService<R, C, M>
where
    R: IdentityRepository,
    C: IdentityCache,
    M: ConfirmationMailer,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Durable identity store
    /// * `cache` - Identity snapshot cache
    /// * `mailer` - Confirmation email dispatch
    /// * `token_codec` - Configured token codec (secret, algorithm, TTLs)
    /// * `cache_ttl` - TTL for snapshots populated on resolve misses
    pub fn new(
        repository: Arc<R>,
        cache: Arc<C>,
        mailer: Arc<M>,
        token_codec: TokenCodec,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            mailer,
            password_hasher: PasswordHasher::new(),
            token_codec,
            cache_ttl,
        }
    }

    fn issue_pair(&self, email: &str) -> Result<TokenPair, AuthError> {
        let access = self
            .token_codec
            .issue(email, TokenScope::Access)
            .map_err(|e| AuthError::Internal(format!("Token issuance failed: {e}")))?;
        let refresh = self
            .token_codec
            .issue(email, TokenScope::Refresh)
            .map_err(|e| AuthError::Internal(format!("Token issuance failed: {e}")))?;

        Ok(TokenPair::bearer(access, refresh))
    }

    /// Overwrite the stored refresh token, then drop the now-stale snapshot.
    /// The repository write completes before any token leaves the service.
    async fn rotate_refresh_token(
        &self,
        identity: &Identity,
        token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.repository
            .update_refresh_token(&identity.id, token)
            .await?;
        self.invalidate_snapshot(identity.email.as_str()).await;
        Ok(())
    }

    async fn invalidate_snapshot(&self, email: &str) {
        if let Err(e) = self.cache.invalidate(email).await {
            tracing::warn!(email = %email, error = %e, "Failed to invalidate identity snapshot");
        }
    }

    async fn store_snapshot(&self, identity: &Identity) {
        if let Err(e) = self
            .cache
            .set(identity.email.as_str(), identity, self.cache_ttl)
            .await
        {
            tracing::warn!(
                email = %identity.email,
                error = %e,
                "Failed to store identity snapshot"
            );
        }
    }

    async fn send_confirmation_mail(&self, email: &str, username: &str) {
        let token = match self.token_codec.issue(email, TokenScope::EmailVerification) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(email = %email, error = %e, "Failed to issue verification token");
                return;
            }
        };

        if let Err(e) = self.mailer.send_confirmation(email, username, &token).await {
            tracing::error!(email = %email, error = %e, "Failed to send confirmation email");
        }
    }
}

#[async_trait]
impl<R, C, M> AuthenticationPort for AuthenticationService<R, C, M>
where
    R: IdentityRepository,
    C: IdentityCache,
    M: ConfirmationMailer,
{
    async fn signup(&self, request: SignupRequest) -> Result<Identity, AuthError> {
        if let Some(existing) = self
            .repository
            .find_by_email(request.email.as_str())
            .await?
        {
            return Err(AuthError::AccountExists(existing.email.to_string()));
        }

        let password_hash = self
            .password_hasher
            .hash(&request.password)
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {e}")))?;

        let identity = Identity {
            id: IdentityId::new(),
            email: request.email,
            username: request.username,
            avatar_url: None,
            role: Role::User,
            confirmed: false,
            refresh_token: None,
            password_hash,
            created_at: Utc::now(),
        };

        // Uniqueness is enforced again by the repository; two racing signups
        // converge on DuplicateEmail for the loser.
        let created = self.repository.insert(identity).await.map_err(|e| match e {
            RepositoryError::DuplicateEmail(email) => AuthError::AccountExists(email),
            other => AuthError::Repository(other),
        })?;

        self.send_confirmation_mail(created.email.as_str(), created.username.as_str())
            .await;

        Ok(created)
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let identity = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidEmail)?;

        if !identity.confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        if !self
            .password_hasher
            .verify(password, &identity.password_hash)
        {
            return Err(AuthError::InvalidPassword);
        }

        let pair = self.issue_pair(identity.email.as_str())?;
        self.rotate_refresh_token(&identity, Some(pair.refresh_token.as_str()))
            .await?;

        Ok(pair)
    }

    async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .token_codec
            .verify(presented)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        if claims.scope != TokenScope::Refresh {
            return Err(AuthError::InvalidRefreshToken);
        }

        let identity = self
            .repository
            .find_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if identity.refresh_token.as_deref() != Some(presented) {
            // Presented token was signed by us but is not the active one:
            // assume compromise and force re-login.
            tracing::warn!(email = %identity.email, "Refresh token mismatch, revoking");
            self.rotate_refresh_token(&identity, None).await?;
            return Err(AuthError::InvalidRefreshToken);
        }

        let pair = self.issue_pair(identity.email.as_str())?;
        self.rotate_refresh_token(&identity, Some(pair.refresh_token.as_str()))
            .await?;

        Ok(pair)
    }

    async fn confirm_email(&self, token: &str) -> Result<ConfirmationOutcome, AuthError> {
        let claims = self
            .token_codec
            .verify(token)
            .map_err(|_| AuthError::VerificationError)?;

        if claims.scope != TokenScope::EmailVerification {
            return Err(AuthError::VerificationError);
        }

        let identity = self
            .repository
            .find_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::VerificationError)?;

        if identity.confirmed {
            return Ok(ConfirmationOutcome::AlreadyConfirmed);
        }

        self.repository.update_confirmed(&identity.id).await?;
        self.invalidate_snapshot(identity.email.as_str()).await;

        Ok(ConfirmationOutcome::Confirmed)
    }

    async fn request_confirmation(
        &self,
        email: &str,
    ) -> Result<ConfirmationRequestOutcome, AuthError> {
        let identity = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(AuthError::VerificationError)?;

        if identity.confirmed {
            return Ok(ConfirmationRequestOutcome::AlreadyConfirmed);
        }

        self.send_confirmation_mail(identity.email.as_str(), identity.username.as_str())
            .await;

        Ok(ConfirmationRequestOutcome::Sent)
    }

    async fn resolve_identity(&self, access_token: &str) -> Result<Identity, AuthError> {
        let claims = self
            .token_codec
            .verify(access_token)
            .map_err(|_| AuthError::Unauthorized)?;

        if claims.scope != TokenScope::Access {
            return Err(AuthError::Unauthorized);
        }

        match self.cache.get(&claims.sub).await {
            Ok(Some(identity)) => {
                tracing::debug!(email = %claims.sub, "Identity resolved from cache");
                return Ok(identity);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(email = %claims.sub, error = %e, "Identity cache read failed");
            }
        }

        let identity = self
            .repository
            .find_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        tracing::debug!(email = %claims.sub, "Identity resolved from repository");
        self.store_snapshot(&identity).await;

        Ok(identity)
    }

    async fn reset_password(
        &self,
        identity: &Identity,
        new_password: &str,
    ) -> Result<Identity, AuthError> {
        let password_hash = self
            .password_hasher
            .hash(new_password)
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {e}")))?;

        self.repository
            .update_password_hash(&identity.id, &password_hash)
            .await?;
        // Refresh tokens issued before the reset must not survive it.
        self.rotate_refresh_token(identity, None).await?;

        let mut updated = identity.clone();
        updated.password_hash = password_hash;
        updated.refresh_token = None;

        Ok(updated)
    }

    async fn update_avatar(
        &self,
        identity: &Identity,
        url: Option<String>,
    ) -> Result<Identity, AuthError> {
        self.repository
            .update_avatar(&identity.id, url.as_deref())
            .await?;

        let mut updated = identity.clone();
        updated.avatar_url = url;
        self.store_snapshot(&updated).await;

        Ok(updated)
    }
}
