//! Request/response types for auth endpoints.
//!
//! All SRP values are strings: the protocol integers exceed safe native
//! precision in every serialization environment this API talks to.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChallengeRequest {
    pub username: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChallengeResponse {
    pub login_id: String,
    pub salt: String,
    pub server_public_key: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ProofRequest {
    pub login_id: String,
    pub client_public_key: String,
    pub client_proof: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    #[schema(value_type = String)]
    pub password: SecretString,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use secrecy::ExposeSecret;

    #[test]
    fn challenge_request_round_trips() -> Result<()> {
        let request = ChallengeRequest {
            username: "alice".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let username = value
            .get("username")
            .and_then(serde_json::Value::as_str)
            .context("missing username")?;
        assert_eq!(username, "alice");
        let decoded: ChallengeRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.username, "alice");
        Ok(())
    }

    #[test]
    fn proof_request_round_trips() -> Result<()> {
        let request = ProofRequest {
            login_id: "00000000-0000-0000-0000-000000000000".to_string(),
            client_public_key: "12345".to_string(),
            client_proof: "67890".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let decoded: ProofRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.client_public_key, "12345");
        assert_eq!(decoded.client_proof, "67890");
        Ok(())
    }

    #[test]
    fn login_request_keeps_the_password_readable_only_on_purpose() -> Result<()> {
        let decoded: LoginRequest =
            serde_json::from_str(r#"{"username": "alice", "password": "hunter2"}"#)?;
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.password.expose_secret(), "hunter2");
        // Debug output must not leak the secret.
        assert!(!format!("{decoded:?}").contains("hunter2"));
        Ok(())
    }
}
