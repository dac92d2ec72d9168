//! SRP-6a handshake primitives.
//!
//! The server proves that a client knows the password behind a stored
//! `(salt, verifier)` pair without ever seeing the password itself. All
//! protocol values cross module boundaries as decimal strings: the group
//! elements exceed native integer precision and must round-trip exactly
//! through any serialization layer.

pub mod client;
mod group;
mod server;

pub use server::{begin_handshake, Challenge, ServerHandshake};
