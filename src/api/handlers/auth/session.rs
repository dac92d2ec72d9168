//! Session endpoints for cookie and bearer auth.

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::{
    state::AuthState,
    types::SessionResponse,
    utils::{clear_session_cookie, extract_session_token, session_cookie},
};
use crate::auth::RequestContext;

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    // Missing, expired, and invalidated sessions all read as anonymous.
    let token = extract_session_token(&headers);
    let ctx = auth_state.sessions().context(token.as_deref()).await;

    match ctx.current_username() {
        Some(username) => {
            let response = SessionResponse {
                username: username.to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let token = extract_session_token(&headers);
    let mut ctx = auth_state.sessions().context(token.as_deref()).await;
    auth_state.sessions().logout(&mut ctx).await;

    // Always clear the cookie, even if no session record existed.
    let mut response_headers = HeaderMap::new();
    match clear_session_cookie(auth_state.config()) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build logout cookie: {err}");
        }
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

/// Log `username` in on a fresh request context and build the response
/// headers carrying the new session token.
pub(super) async fn grant_session(auth_state: &AuthState, username: &str) -> Result<HeaderMap> {
    let mut ctx = RequestContext::new();
    let token = auth_state
        .sessions()
        .login(&mut ctx, username)
        .await
        .context("failed to bind session")?;

    let mut response_headers = HeaderMap::new();
    let cookie =
        session_cookie(auth_state.config(), &token).context("failed to build session cookie")?;
    // Attach the cookie so the browser can present it on future requests.
    response_headers.insert(SET_COOKIE, cookie);
    if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
        response_headers.insert(AUTHORIZATION, value);
    }
    Ok(response_headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::state::AuthConfig;
    use crate::auth::{Account, MemoryAccountStore};
    use axum::http::header::COOKIE;

    fn auth_state() -> Extension<Arc<AuthState>> {
        let store = Arc::new(MemoryAccountStore::new());
        store.insert(Account {
            username: "alice".to_string(),
            srp: None,
        });
        let config = AuthConfig::new("http://localhost:8080".to_string());
        Extension(Arc::new(AuthState::new(config, store)))
    }

    fn cookie_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("gardisto_session={token}")).expect("header"),
        );
        headers
    }

    #[tokio::test]
    async fn session_without_token_is_no_content() {
        let state = auth_state();
        let response = session(HeaderMap::new(), state).await.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn granted_session_reads_back_and_logs_out() {
        let state = auth_state();
        let response_headers = grant_session(&state, "alice").await.expect("grant");
        let token = response_headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .expect("bearer token")
            .to_string();

        let active = session(cookie_headers(&token), state.clone())
            .await
            .into_response();
        assert_eq!(active.status(), StatusCode::OK);

        let cleared = logout(cookie_headers(&token), state.clone())
            .await
            .into_response();
        assert_eq!(cleared.status(), StatusCode::NO_CONTENT);
        assert!(cleared.headers().contains_key(SET_COOKIE));

        let after = session(cookie_headers(&token), state).await.into_response();
        assert_eq!(after.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn logout_without_a_session_is_a_no_op() {
        let state = auth_state();
        let response = logout(HeaderMap::new(), state).await.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn invalidated_username_reads_as_anonymous() {
        let state = auth_state();
        let response_headers = grant_session(&state, "alice").await.expect("grant");
        let token = response_headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .expect("bearer token")
            .to_string();

        state.sessions().invalidate("alice").await;
        let hidden = session(cookie_headers(&token), state.clone())
            .await
            .into_response();
        assert_eq!(hidden.status(), StatusCode::NO_CONTENT);

        // A fresh login lifts the invalidation.
        grant_session(&state, "alice").await.expect("grant");
        assert!(!state.sessions().is_invalidated("alice").await);
    }
}
