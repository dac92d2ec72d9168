//! Password login endpoint, driving the SRP exchange end to end through the
//! verification cache.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::error;

use super::{session::grant_session, state::AuthState, types::LoginRequest};
use crate::auth::AuthError;

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 204, description = "Login success"),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Unauthorized", body = String),
        (status = 406, description = "Stored credential is unusable", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let verified = auth_state
        .verifier()
        .verify(&request.username, request.password.expose_secret())
        .await;

    match verified {
        Ok(Some(account)) => match grant_session(&auth_state, &account.username).await {
            Ok(response_headers) => (StatusCode::NO_CONTENT, response_headers).into_response(),
            Err(err) => {
                error!("Failed to create session: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Login failed".to_string(),
                )
                    .into_response()
            }
        },
        // Unknown user, wrong password, empty password: one shape for all.
        Ok(None) => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response(),
        Err(AuthError::MalformedAccount) => (
            StatusCode::NOT_ACCEPTABLE,
            "Stored credential is unusable".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Verification failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response()
        }
    }
}
