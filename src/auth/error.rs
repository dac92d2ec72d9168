use thiserror::Error;

/// Failure taxonomy for the authentication core.
///
/// Routine rejections (wrong password, unknown user) are *not* errors; they
/// surface as `Ok(false)` / `Ok(None)` so callers branch on the outcome
/// explicitly. The variants here cover configuration problems, data
/// integrity, and protocol misuse.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("account has no password authentication configured")]
    NoPasswordAuth,
    #[error("malformed stored credential")]
    MalformedAccount,
    #[error("malformed client value in handshake")]
    MalformedProof,
    #[error("no session transport attached to the request")]
    NoSessionTransport,
    #[error("failed to generate a server ephemeral")]
    Ephemeral,
    #[error("failed to generate a session token")]
    Token,
    #[error("verification task failed")]
    Task(#[from] tokio::task::JoinError),
}
