use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, Role, User},
    error::{AppError, AppResult},
};

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Empty strings count as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_email(email: String) -> String {
    email.trim().to_lowercase()
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub pictures: Option<Vec<String>>,
    pub profession: Option<String>,
}

impl RegisterRequest {
    pub fn validate(self) -> AppResult<NewUser> {
        let (Some(name), Some(email), Some(password)) = (
            present(self.name),
            present(self.email).map(normalize_email),
            present(self.password),
        ) else {
            return Err(AppError::Validation(
                "Please provide name, email and password".into(),
            ));
        };
        if !is_valid_email(&email) {
            return Err(AppError::Validation("Invalid email".into()));
        }
        Ok(NewUser {
            name: name.trim().to_string(),
            email,
            password,
            username: present(self.username),
            bio: self.bio,
            profession: self.profession,
            pictures: self.pictures,
        })
    }
}

/// Validated sign-in input.
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl SigninRequest {
    pub fn validate(self) -> AppResult<Credentials> {
        match (present(self.email).map(normalize_email), present(self.password)) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(AppError::Validation(
                "Please provide email and password".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

impl ForgotPasswordRequest {
    pub fn validate(self) -> AppResult<String> {
        present(self.email)
            .map(normalize_email)
            .ok_or_else(|| AppError::Validation("Please provide email".into()))
    }
}

/// Validated reset input.
pub struct PasswordReset {
    pub email: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub new_password: Option<String>,
}

impl ResetPasswordRequest {
    pub fn validate(self) -> AppResult<PasswordReset> {
        match (present(self.email).map(normalize_email), present(self.new_password)) {
            (Some(email), Some(new_password)) => Ok(PasswordReset {
                email,
                new_password,
            }),
            _ => Err(AppError::Validation(
                "Please provide email and newPassword".into(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct OtpResponse {
    pub message: String,
    pub otp: u32,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
    pub bio: String,
    pub profession: String,
    pub pictures: Vec<String>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            username: user.username,
            role: user.role,
            bio: user.bio,
            profession: user.profession,
            pictures: user.pictures,
            followers: user.followers,
            following: user.following,
        }
    }
}
