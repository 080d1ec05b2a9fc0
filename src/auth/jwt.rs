use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{
    auth::{claims::Claims, repo_types::User},
    config::JwtConfig,
    error::{AppError, AppResult},
    state::AppState,
};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Token issuer and verifier. Settings are checked when a token is issued,
/// not when the keys are built.
#[derive(Clone)]
pub struct JwtKeys {
    secret: Option<String>,
    ttl: Option<Duration>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            ttl: config.lifetime,
        }
    }

    fn settings(&self) -> AppResult<(&str, Duration)> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| AppError::Configuration("JWT secret key is not configured.".into()))?;
        let ttl = self
            .ttl
            .ok_or_else(|| AppError::Configuration("Token expiration is not configured.".into()))?;
        Ok((secret, ttl))
    }

    fn expiry(ttl: Duration, now: OffsetDateTime) -> AppResult<OffsetDateTime> {
        i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or_else(|| AppError::Configuration("Token expiration is out of range.".into()))
    }

    pub fn ensure_configured(&self) -> AppResult<()> {
        let (_, ttl) = self.settings()?;
        Self::expiry(ttl, OffsetDateTime::now_utc()).map(|_| ())
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        let (secret, ttl) = self.settings()?;
        let now = OffsetDateTime::now_utc();
        let exp = Self::expiry(ttl, now)?;
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            username: user.username.clone(),
            bio: user.bio.clone(),
            pictures: user.pictures.clone(),
            profession: user.profession.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(e.into()))?;
        debug!(user_id = %user.id, "jwt signed");
        Ok(token)
    }

    /// Rejects bad signatures, other algorithms and expired tokens. Callers only
    /// ever see `Unauthorized`; the reason goes to the debug log.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let (secret, _) = self.settings()?;
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

/// A syntactically valid `Authorization: Bearer <token>` header. The token is
/// not verified.
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.contains(' '));

        match token {
            Some(t) => Ok(BearerToken(t.to_string())),
            None => {
                warn!("missing or malformed Authorization header");
                Err(AppError::Unauthorized("Unauthorized".into()))
            }
        }
    }
}

/// Verified session claims for protected routes.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|e| {
            warn!("invalid or expired token");
            e
        })?;
        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::Role;
    use uuid::Uuid;

    fn keys(secret: Option<&str>, ttl: Option<Duration>) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.map(Into::into),
            lifetime: ttl,
        })
    }

    fn configured() -> JwtKeys {
        keys(Some("dev-secret"), Some(Duration::from_secs(300)))
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "a@x.com".into(),
            username: Some("ana".into()),
            password_hash: "$argon2id$fake".into(),
            role: Role::Admin,
            bio: "hi".into(),
            profession: "dev".into(),
            pictures: vec!["p1.png".into()],
            followers: Vec::new(),
            following: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = configured();
        let user = user();
        let token = keys.issue(&user).expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.username.as_deref(), Some("ana"));
        assert_eq!(claims.pictures, vec!["p1.png".to_string()]);
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn claims_use_camel_case_user_id() {
        let token = configured().issue(&user()).unwrap();
        let claims = configured().verify(&token).unwrap();
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("user_id").is_none());
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn missing_secret_fails_at_issuance() {
        let err = keys(None, Some(Duration::from_secs(60)))
            .issue(&user())
            .unwrap_err();
        assert!(
            matches!(err, AppError::Configuration(ref m) if m == "JWT secret key is not configured.")
        );
    }

    #[test]
    fn missing_lifetime_fails_at_issuance() {
        let err = keys(Some("dev-secret"), None).issue(&user()).unwrap_err();
        assert!(
            matches!(err, AppError::Configuration(ref m) if m == "Token expiration is not configured.")
        );
    }

    #[test]
    fn oversized_lifetime_is_a_configuration_error() {
        for secs in [100_000_000_000_000, u64::MAX] {
            let keys = keys(Some("dev-secret"), Some(Duration::from_secs(secs)));
            assert!(matches!(keys.ensure_configured(), Err(AppError::Configuration(_))));
            let err = keys.issue(&user()).unwrap_err();
            assert!(
                matches!(err, AppError::Configuration(ref m) if m == "Token expiration is out of range.")
            );
        }
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = configured().issue(&user()).unwrap();
        let other = keys(Some("other-secret"), Some(Duration::from_secs(300)));
        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn verify_rejects_other_algorithm() {
        let user = user();
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            user_id: user.id,
            email: user.email,
            role: user.role,
            username: None,
            bio: String::new(),
            pictures: Vec::new(),
            profession: String::new(),
            iat: now,
            exp: now + 300,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        let err = configured().verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let user = user();
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            user_id: user.id,
            email: user.email,
            role: user.role,
            username: None,
            bio: String::new(),
            pictures: Vec::new(),
            profession: String::new(),
            iat: now - 600,
            exp: now - 300,
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        let err = configured().verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid or expired token"));
    }

    #[test]
    fn verify_rejects_garbage() {
        let err = configured().verify("not.a.jwt").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
