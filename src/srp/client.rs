//! Client-side SRP computations.
//!
//! The verification cache drives these against the stored verifier to run
//! the protocol end to end in-process; they are also what a provisioning
//! tool uses to mint `salt|verifier` pairs for new accounts.

use num_bigint::{BigUint, RandBigInt};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use super::group::{hash_to_int, parse_decimal, GROUP};
use super::server::EPHEMERAL_BITS;
use crate::auth::AuthError;

const SALT_BITS: u64 = 128;

/// The client half of one exchange: public ephemeral `A` and proof `M1`,
/// both as decimal strings.
pub struct ClientResponse {
    pub public_key: String,
    pub proof: String,
}

/// x = H(salt ‖ H(password))
///
/// The username stays out of the key derivation so renaming an account does
/// not orphan its verifier; the cache fingerprint is what binds usernames.
fn private_key(password: &str, salt: &BigUint) -> BigUint {
    let password_hash = Sha256::digest(password.as_bytes());
    hash_to_int(&[&salt.to_bytes_be(), &password_hash])
}

/// Fresh random salt for provisioning, as a decimal string.
#[must_use]
pub fn generate_salt() -> String {
    let mut rng = OsRng;
    rng.gen_biguint(SALT_BITS).to_str_radix(10)
}

/// v = g^x mod N, the value stored server-side in place of the password.
pub fn derive_verifier(password: &str, salt: &str) -> Result<String, AuthError> {
    let salt = parse_decimal(salt).ok_or(AuthError::MalformedAccount)?;
    let group = &*GROUP;
    let x = private_key(password, &salt);
    Ok(group.generator.modpow(&x, &group.modulus).to_str_radix(10))
}

/// Answer a server challenge: draw `a`, compute `A = g^a` and the proof
/// `M1` for the shared secret.
pub fn respond(
    password: &str,
    salt: &str,
    server_public: &str,
) -> Result<ClientResponse, AuthError> {
    let group = &*GROUP;

    let salt = parse_decimal(salt).ok_or(AuthError::MalformedProof)?;
    let server_public = parse_decimal(server_public).ok_or(AuthError::MalformedProof)?;
    if &server_public % &group.modulus == BigUint::from(0u8) {
        return Err(AuthError::MalformedProof);
    }

    let mut rng = OsRng;
    let private_ephemeral = rng.gen_biguint(EPHEMERAL_BITS);
    let public_key = group
        .generator
        .modpow(&private_ephemeral, &group.modulus);

    let scrambler = hash_to_int(&[&group.pad(&public_key), &group.pad(&server_public)]);
    let x = private_key(password, &salt);

    // S = (B - k*g^x)^(a + u*x) mod N, kept in unsigned arithmetic by
    // adding one modulus before the subtraction.
    let gx = group.generator.modpow(&x, &group.modulus);
    let kgx = (&group.multiplier * gx) % &group.modulus;
    let base =
        ((&server_public % &group.modulus) + &group.modulus - kgx) % &group.modulus;
    let exponent = private_ephemeral + scrambler * x;
    let secret = base.modpow(&exponent, &group.modulus);

    let proof = hash_to_int(&[
        &group.pad(&public_key),
        &group.pad(&server_public),
        &group.pad(&secret),
    ]);

    Ok(ClientResponse {
        public_key: public_key.to_str_radix(10),
        proof: proof.to_str_radix(10),
    })
}
