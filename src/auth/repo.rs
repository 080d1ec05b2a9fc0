use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{User, UserInsert, UserRow};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("email already exists: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Storage backend for user records. Hashing and role rules live in
/// `CredentialStore`; implementations only persist what they are given.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn count(&self) -> anyhow::Result<i64>;

    /// Fails with `RepoError::Conflict` if the email is taken.
    async fn insert(&self, user: UserInsert) -> Result<User, RepoError>;

    /// Returns the number of records modified (0 or 1).
    async fn set_password_hash(&self, email: &str, password_hash: &str) -> anyhow::Result<u64>;
}

const USER_COLUMNS: &str = "id, name, email, username, password_hash, role, bio, profession, \
                            pictures, followers, following, created_at";

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn insert(&self, user: UserInsert) -> Result<User, RepoError> {
        let result = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, username, password_hash, role, bio, profession, pictures)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.bio)
        .bind(&user.profession)
        .bind(&user.pictures)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(row) => Ok(User::try_from(row)?),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(RepoError::Conflict(user.email))
            }
            Err(e) => Err(RepoError::Unexpected(e.into())),
        }
    }

    async fn set_password_hash(&self, email: &str, password_hash: &str) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE email = $1")
            .bind(email)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
