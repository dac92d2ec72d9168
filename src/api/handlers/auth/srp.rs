//! SRP challenge/proof endpoints.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::{
    session::grant_session,
    state::AuthState,
    types::{ChallengeRequest, ChallengeResponse, ProofRequest},
    utils::valid_username,
};
use crate::auth::AuthError;
use crate::srp::begin_handshake;

#[utoipa::path(
    post,
    path = "/v1/auth/challenge",
    request_body = ChallengeRequest,
    responses(
        (status = 200, description = "Handshake started", body = ChallengeResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Unauthorized", body = String),
        (status = 406, description = "Stored credential is unusable", body = String)
    ),
    tag = "auth"
)]
pub async fn challenge(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ChallengeRequest>>,
) -> impl IntoResponse {
    let request: ChallengeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let username = auth_state.accounts().normalize_username(&request.username);
    if !valid_username(&username) {
        return (StatusCode::BAD_REQUEST, "Invalid username".to_string()).into_response();
    }

    // Unknown users get the same answer as a failed proof so the challenge
    // endpoint cannot be used to enumerate accounts.
    let Some(account) = auth_state.accounts().get_account(&username) else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response();
    };

    match begin_handshake(&account) {
        Ok(challenge) => {
            let login_id = auth_state
                .logins()
                .store(challenge.handshake, username)
                .await;
            let response = ChallengeResponse {
                login_id: login_id.to_string(),
                salt: challenge.salt,
                server_public_key: challenge.public_key,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(AuthError::NoPasswordAuth) => {
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response()
        }
        Err(AuthError::MalformedAccount) => {
            error!("Stored credential for {username} does not parse");
            (
                StatusCode::NOT_ACCEPTABLE,
                "Stored credential is unusable".to_string(),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to start handshake: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/proof",
    request_body = ProofRequest,
    responses(
        (status = 204, description = "Login success"),
        (status = 400, description = "Validation error", body = String),
        (status = 401, description = "Unauthorized", body = String),
        (status = 406, description = "Protocol violation", body = String)
    ),
    tag = "auth"
)]
pub async fn proof(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ProofRequest>>,
) -> impl IntoResponse {
    let request: ProofRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Login IDs are opaque server-side references; reject anything malformed.
    let Ok(login_id) = Uuid::parse_str(request.login_id.trim()) else {
        return (StatusCode::BAD_REQUEST, "Invalid login id".to_string()).into_response();
    };

    // Single-use: expired, unknown, and already-completed handshakes all
    // look the same to the client.
    let Some(pending) = auth_state.logins().take(login_id).await else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response();
    };

    match pending
        .handshake
        .complete(&request.client_public_key, &request.client_proof)
    {
        Ok(true) => match grant_session(&auth_state, &pending.username).await {
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
        Ok(false) => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response(),
        Err(AuthError::MalformedProof) => (
            StatusCode::NOT_ACCEPTABLE,
            "Protocol violation".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to complete handshake: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response()
        }
    }
}
