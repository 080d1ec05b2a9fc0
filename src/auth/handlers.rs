use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, MessageResponse, OtpResponse, PublicUser, RegisterRequest,
            RegisterResponse, ResetPasswordRequest, SigninRequest, TokenResponse,
        },
        extractors::JsonBody,
        jwt::{AuthUser, BearerToken, JwtKeys},
        store::PasswordUpdate,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/signin", post(signin))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

/// Six-digit numeric code.
fn generate_otp() -> u32 {
    rand::thread_rng().gen_range(100_000..1_000_000)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let new_user = payload.validate()?;

    let keys = JwtKeys::from_ref(&state);
    keys.ensure_configured()?;

    let user = state.users.create(new_user).await.map_err(|e| {
        if let AppError::Validation(msg) = &e {
            warn!(reason = %msg, "registration rejected");
        }
        e
    })?;
    let token = keys.issue(&user)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Successfully registered".into(),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SigninRequest>,
) -> AppResult<Json<TokenResponse>> {
    let creds = payload.validate()?;

    let Some(user) = state.users.find_by_email(&creds.email).await? else {
        warn!(email = %creds.email, "signin unknown email");
        return Err(AppError::InvalidCredentials("Invalid Credentials".into()));
    };

    if !state.users.verify_password(&user, &creds.password)? {
        warn!(user_id = %user.id, "signin wrong password");
        return Err(AppError::InvalidCredentials("Password is incorrect".into()));
    }

    let token = JwtKeys::from_ref(&state).issue(&user)?;
    info!(user_id = %user.id, "user signed in");
    Ok(Json(TokenResponse { token }))
}

/// Acknowledges a logout. Nothing is revoked server side: the token stays valid
/// until it expires, only its presence and shape are checked.
#[instrument(skip_all)]
pub async fn logout(BearerToken(_token): BearerToken) -> Json<MessageResponse> {
    info!("logout acknowledged");
    Json(MessageResponse {
        message: "Logout successful".into(),
    })
}

/// Mails a fresh OTP and echoes it in the response. The OTP is not stored and
/// `reset_password` does not ask for it.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ForgotPasswordRequest>,
) -> AppResult<Json<OtpResponse>> {
    let email = payload.validate()?;

    if state.users.find_by_email(&email).await?.is_none() {
        warn!(email = %email, "forgot-password unknown email");
        return Err(AppError::NotFound("User not found".into()));
    }

    let otp = generate_otp();
    if let Err(e) = state.mailer.send_otp(&email, otp).await {
        error!(error = %e, "otp mail failed");
        return Err(AppError::Dependency("Failed to send OTP".into()));
    }

    info!(email = %email, "otp sent");
    Ok(Json(OtpResponse {
        message: "OTP sent successfully".into(),
        otp,
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let reset = payload.validate()?;

    if state.users.find_by_email(&reset.email).await?.is_none() {
        warn!(email = %reset.email, "reset-password unknown email");
        return Err(AppError::NotFound("User not found".into()));
    }

    match state
        .users
        .update_password(&reset.email, &reset.new_password)
        .await?
    {
        PasswordUpdate::Updated => {
            info!(email = %reset.email, "password reset");
            Ok(Json(MessageResponse {
                message: "Password reset successful".into(),
            }))
        }
        PasswordUpdate::NotFound => Err(AppError::NotFound(
            "User not found or password not modified".into(),
        )),
    }
}

#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state
        .users
        .find_by_email(&claims.email)
        .await?
        .filter(|u| u.id == claims.user_id)
        .ok_or_else(|| {
            warn!(user_id = %claims.user_id, "token subject no longer exists");
            AppError::NotFound("User not found".into())
        })?;
    Ok(Json(PublicUser::from(user)))
}
