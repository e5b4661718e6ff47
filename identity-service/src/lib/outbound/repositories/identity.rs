use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::identity::errors::RepositoryError;
use crate::identity::models::EmailAddress;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::Role;
use crate::identity::models::Username;
use crate::identity::ports::IdentityRepository;

pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw identities row; kept separate from the domain entity so schema and
/// domain can drift independently.
#[derive(FromRow)]
struct IdentityRow {
    id: Uuid,
    email: String,
    username: String,
    avatar_url: Option<String>,
    role: String,
    confirmed: bool,
    refresh_token: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = RepositoryError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: IdentityId(row.id),
            email: EmailAddress::new(row.email)
                .map_err(|e| RepositoryError::Corrupted(e.to_string()))?,
            username: Username::new(row.username)
                .map_err(|e| RepositoryError::Corrupted(e.to_string()))?,
            avatar_url: row.avatar_url,
            role: row
                .role
                .parse::<Role>()
                .map_err(|e| RepositoryError::Corrupted(e.to_string()))?,
            confirmed: row.confirmed,
            refresh_token: row.refresh_token,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

fn unavailable(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Unavailable(e.to_string())
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, email, username, avatar_url, role, confirmed,
                   refresh_token, password_hash, created_at
            FROM identities
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(Identity::try_from).transpose()
    }

    async fn insert(&self, identity: Identity) -> Result<Identity, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO identities
                (id, email, username, avatar_url, role, confirmed,
                 refresh_token, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.email.as_str())
        .bind(identity.username.as_str())
        .bind(identity.avatar_url.as_deref())
        .bind(identity.role.as_str())
        .bind(identity.confirmed)
        .bind(identity.refresh_token.as_deref())
        .bind(&identity.password_hash)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return RepositoryError::DuplicateEmail(identity.email.to_string());
                }
            }
            RepositoryError::Unavailable(e.to_string())
        })?;

        Ok(identity)
    }

    async fn update_refresh_token(
        &self,
        id: &IdentityId,
        token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE identities SET refresh_token = $2 WHERE id = $1")
            .bind(id.0)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn update_confirmed(&self, id: &IdentityId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE identities SET confirmed = TRUE WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn update_password_hash(
        &self,
        id: &IdentityId,
        hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE identities SET password_hash = $2 WHERE id = $1")
            .bind(id.0)
            .bind(hash)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn update_avatar(
        &self,
        id: &IdentityId,
        url: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE identities SET avatar_url = $2 WHERE id = $1")
            .bind(id.0)
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
