//! gardisto — zero-knowledge password authentication.
//!
//! An SRP-6a challenge/response server with a deduplicating verification
//! cache and in-memory login sessions, exposed over a small HTTP API.

pub mod api;
pub mod auth;
pub mod cli;
pub mod srp;
