use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use auth::TokenCodec;
use auth::TokenTtls;
use identity_service::identity::errors::MailerError;
use identity_service::identity::errors::RepositoryError;
use identity_service::identity::models::Identity;
use identity_service::identity::models::IdentityId;
use identity_service::identity::ports::ConfirmationMailer;
use identity_service::identity::ports::IdentityRepository;
use identity_service::identity::service::AuthenticationService;
use identity_service::outbound::cache::InMemoryIdentityCache;
use tokio::sync::RwLock;

pub const TEST_SECRET: &[u8] = b"integration_secret_32_bytes_long!!";

static TRACING: Once = Once::new();

/// In-memory identity repository, keyed by email like the durable store's
/// unique constraint.
pub struct InMemoryIdentityRepository {
    identities: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
        }
    }

    pub async fn count(&self) -> usize {
        self.identities.read().await.len()
    }

    async fn update<F>(&self, id: &IdentityId, mutate: F) -> Result<(), RepositoryError>
    where
        F: FnOnce(&mut Identity),
    {
        let mut identities = self.identities.write().await;
        let identity = identities
            .values_mut()
            .find(|identity| identity.id == *id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        mutate(identity);
        Ok(())
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RepositoryError> {
        Ok(self.identities.read().await.get(email).cloned())
    }

    async fn insert(&self, identity: Identity) -> Result<Identity, RepositoryError> {
        let mut identities = self.identities.write().await;
        let key = identity.email.as_str().to_string();
        if identities.contains_key(&key) {
            return Err(RepositoryError::DuplicateEmail(key));
        }
        identities.insert(key, identity.clone());
        Ok(identity)
    }

    async fn update_refresh_token(
        &self,
        id: &IdentityId,
        token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let token = token.map(|t| t.to_string());
        self.update(id, |identity| identity.refresh_token = token)
            .await
    }

    async fn update_confirmed(&self, id: &IdentityId) -> Result<(), RepositoryError> {
        self.update(id, |identity| identity.confirmed = true).await
    }

    async fn update_password_hash(
        &self,
        id: &IdentityId,
        hash: &str,
    ) -> Result<(), RepositoryError> {
        let hash = hash.to_string();
        self.update(id, |identity| identity.password_hash = hash)
            .await
    }

    async fn update_avatar(
        &self,
        id: &IdentityId,
        url: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let url = url.map(|u| u.to_string());
        self.update(id, |identity| identity.avatar_url = url).await
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub email: String,
    pub username: String,
    pub token: String,
}

/// Mailer that records every dispatched confirmation so tests can pick up
/// verification tokens "from the email".
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn last_token(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|mail| mail.token.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ConfirmationMailer for RecordingMailer {
    async fn send_confirmation(
        &self,
        email: &str,
        username: &str,
        token: &str,
    ) -> Result<(), MailerError> {
        self.sent.lock().unwrap().push(SentMail {
            email: email.to_string(),
            username: username.to_string(),
            token: token.to_string(),
        });
        Ok(())
    }
}

/// Fully wired authentication service over in-memory adapters.
pub struct TestAuth {
    pub service:
        AuthenticationService<InMemoryIdentityRepository, InMemoryIdentityCache, RecordingMailer>,
    pub repository: Arc<InMemoryIdentityRepository>,
    pub cache: Arc<InMemoryIdentityCache>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestAuth {
    pub fn new() -> Self {
        TRACING.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "identity_service=debug".into()),
                )
                .with_test_writer()
                .try_init();
        });

        let repository = Arc::new(InMemoryIdentityRepository::new());
        let cache = Arc::new(InMemoryIdentityCache::new());
        let mailer = Arc::new(RecordingMailer::new());

        let service = AuthenticationService::new(
            Arc::clone(&repository),
            Arc::clone(&cache),
            Arc::clone(&mailer),
            TokenCodec::hs256(TEST_SECRET, TokenTtls::default()),
            Duration::from_secs(300),
        );

        Self {
            service,
            repository,
            cache,
            mailer,
        }
    }
}
