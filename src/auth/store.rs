use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    auth::{
        password::{hash_password, verify_password},
        repo::{RepoError, UserRepo},
        repo_types::{NewUser, Role, User, UserInsert},
    },
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordUpdate {
    Updated,
    NotFound,
}

/// Credential store: the only place raw passwords are turned into hashes.
#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn UserRepo>,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn UserRepo>) -> Self {
        Self { repo }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.repo.find_by_email(email).await?)
    }

    /// Creates an account. The first account ever becomes `admin`.
    ///
    /// Count-then-insert is not atomic: two concurrent first registrations can
    /// both observe an empty store and both become admin.
    pub async fn create(&self, new: NewUser) -> AppResult<User> {
        if self.repo.find_by_email(&new.email).await?.is_some() {
            return Err(AppError::Validation("Email already exists".into()));
        }

        let role = if self.repo.count().await? == 0 {
            Role::Admin
        } else {
            Role::User
        };

        let insert = UserInsert {
            password_hash: hash_password(&new.password)?,
            name: new.name,
            email: new.email,
            username: new.username.filter(|u| !u.is_empty()),
            role,
            bio: new.bio.unwrap_or_default(),
            profession: new.profession.unwrap_or_default(),
            pictures: new.pictures.unwrap_or_default(),
        };

        match self.repo.insert(insert).await {
            Ok(user) => {
                info!(user_id = %user.id, role = user.role.as_str(), "user created");
                Ok(user)
            }
            Err(RepoError::Conflict(_)) => Err(AppError::Validation("Email already exists".into())),
            Err(RepoError::Unexpected(e)) => Err(AppError::Internal(e)),
        }
    }

    pub async fn update_password(&self, email: &str, raw: &str) -> AppResult<PasswordUpdate> {
        let hash = hash_password(raw)?;
        let modified = self.repo.set_password_hash(email, &hash).await?;
        debug!(modified, "password hash written");
        Ok(if modified == 1 {
            PasswordUpdate::Updated
        } else {
            PasswordUpdate::NotFound
        })
    }

    pub fn verify_password(&self, user: &User, raw: &str) -> AppResult<bool> {
        Ok(verify_password(raw, &user.password_hash)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::MemoryUserRepo;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryUserRepo::new()))
    }

    fn new_user(email: &str, password: &str) -> NewUser {
        NewUser {
            name: "Ana".into(),
            email: email.into(),
            password: password.into(),
            username: None,
            bio: None,
            profession: None,
            pictures: None,
        }
    }

    #[tokio::test]
    async fn first_user_is_admin_rest_are_users() {
        let store = store();
        let first = store.create(new_user("a@x.com", "secret1")).await.unwrap();
        let second = store.create(new_user("b@x.com", "secret1")).await.unwrap();
        let third = store.create(new_user("c@x.com", "secret1")).await.unwrap();
        assert_eq!(first.role, Role::Admin);
        assert_eq!(second.role, Role::User);
        assert_eq!(third.role, Role::User);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_validation_error() {
        let store = store();
        store.create(new_user("a@x.com", "secret1")).await.unwrap();
        let err = store.create(new_user("a@x.com", "other")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Email already exists"));

        let kept = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(store.verify_password(&kept, "secret1").unwrap());
    }

    #[tokio::test]
    async fn optional_fields_are_normalized() {
        let store = store();
        let mut input = new_user("a@x.com", "secret1");
        input.username = Some(String::new());
        let user = store.create(input).await.unwrap();
        assert_eq!(user.username, None);
        assert_eq!(user.bio, "");
        assert_eq!(user.profession, "");
        assert!(user.pictures.is_empty());
        assert!(user.followers.is_empty() && user.following.is_empty());
    }

    #[tokio::test]
    async fn password_is_stored_hashed() {
        let store = store();
        let user = store.create(new_user("a@x.com", "secret1")).await.unwrap();
        assert_ne!(user.password_hash, "secret1");
        assert!(user.password_hash.starts_with("$argon2"));
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn update_password_replaces_the_old_one() {
        let store = store();
        store.create(new_user("a@x.com", "secret1")).await.unwrap();

        let outcome = store.update_password("a@x.com", "secret2").await.unwrap();
        assert_eq!(outcome, PasswordUpdate::Updated);

        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(!store.verify_password(&user, "secret1").unwrap());
        assert!(store.verify_password(&user, "secret2").unwrap());
    }

    #[tokio::test]
    async fn update_password_for_unknown_email_is_not_found() {
        let outcome = store().update_password("ghost@x.com", "secret2").await.unwrap();
        assert_eq!(outcome, PasswordUpdate::NotFound);
    }
}
