use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("unknown role {other:?}"),
        }
    }
}

/// User record as the rest of the service sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed in JSON
    pub role: Role,
    pub bio: String,
    pub profession: String,
    pub pictures: Vec<String>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub created_at: OffsetDateTime,
}

/// Row shape in the `users` table; `role` is stored as text.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub bio: String,
    pub profession: String,
    pub pictures: Vec<String>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            role: Role::try_from(row.role.as_str())?,
            id: row.id,
            name: row.name,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            bio: row.bio,
            profession: row.profession,
            pictures: row.pictures,
            followers: row.followers,
            following: row.following,
            created_at: row.created_at,
        })
    }
}

/// Fields accepted for a new account. `password` is raw and only lives until
/// `CredentialStore::create` hashes it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub profession: Option<String>,
    pub pictures: Option<Vec<String>>,
}

/// Fully normalized insert handed to a repo backend.
#[derive(Debug, Clone)]
pub struct UserInsert {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub bio: String,
    pub profession: String,
    pub pictures: Vec<String>,
}
