//! Auth handlers and supporting modules.
//!
//! The challenge/proof pair is the two-step SRP exchange for real clients;
//! `/v1/auth/login` drives the same protocol in one request through the
//! verification cache. Session state lives in process memory, so a restart
//! logs everyone out.

pub(crate) mod password;
pub(crate) mod session;
pub(crate) mod srp;
mod state;
pub(crate) mod types;
mod utils;

pub use password::login;
pub use session::{logout, session};
pub use srp::{challenge, proof};
pub use state::{AuthConfig, AuthState};
