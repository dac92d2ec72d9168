use utoipa::OpenApi;

use super::handlers::{auth, health};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::srp::challenge,
        auth::srp::proof,
        auth::password::login,
        auth::session::session,
        auth::session::logout,
    ),
    components(schemas(
        auth::types::ChallengeRequest,
        auth::types::ChallengeResponse,
        auth::types::ProofRequest,
        auth::types::LoginRequest,
        auth::types::SessionResponse,
        health::Health,
    )),
    tags(
        (name = "auth", description = "SRP password authentication and sessions"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

/// The OpenAPI document served next to the Swagger UI.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
