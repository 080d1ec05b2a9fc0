//! In-memory `UserRepo`.
//!
//! Not durable: everything is lost on restart. Used by tests and as the
//! fallback when no `DATABASE_URL` is configured. Writes are serialized behind
//! a single `RwLock`, reads run concurrently.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    repo::{RepoError, UserRepo},
    repo_types::{User, UserInsert},
};

#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<HashMap<String, User>>, // keyed by email
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn insert(&self, user: UserInsert) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(RepoError::Conflict(user.email));
        }
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email.clone(),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            bio: user.bio,
            profession: user.profession,
            pictures: user.pictures,
            followers: Vec::new(),
            following: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.email, record.clone());
        Ok(record)
    }

    async fn set_password_hash(&self, email: &str, password_hash: &str) -> anyhow::Result<u64> {
        let mut users = self.users.write().await;
        match users.get_mut(email) {
            Some(user) if user.password_hash != password_hash => {
                user.password_hash = password_hash.to_string();
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
