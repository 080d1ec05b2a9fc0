use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::AppError;

/// JSON request body whose failures surface as `AppError::Validation`.
///
/// An empty body (or one with no JSON content type) reads as `{}`, so a bare
/// request reaches `validate()` and gets its "please provide ..." message.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "unreadable request body");
            AppError::Validation("Invalid request body".into())
        })?;

        let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        serde_json::from_slice(raw).map(JsonBody).map_err(|e| {
            warn!(error = %e, "malformed json body");
            AppError::Validation(format!("Invalid request body: {e}"))
        })
    }
}
