//! Server side of the SRP-6a exchange.

use num_bigint::{BigUint, RandBigInt};
use rand::rngs::OsRng;

use super::group::{hash_to_int, parse_decimal, GROUP};
use crate::auth::{Account, AuthError};

pub(crate) const EPHEMERAL_BITS: u64 = 256;

// Redrawing the ephemeral is a formality; a zero public key needs
// `k*v + g^b ≡ 0 (mod N)`, which a uniform draw essentially never hits.
const EPHEMERAL_ATTEMPTS: usize = 4;

/// One server-side handshake in flight.
///
/// Produced by [`begin_handshake`] and consumed exactly once:
/// [`ServerHandshake::complete`] takes the value by move, so feeding a stale
/// handshake a second proof is a compile error, not a runtime surprise.
pub struct ServerHandshake {
    private_key: BigUint,
    public_key: BigUint,
    verifier: BigUint,
}

/// The step-1 output sent back to the client, plus the retained handshake.
///
/// `salt` and `public_key` are decimal strings; the underlying integers do
/// not fit any native numeric type.
pub struct Challenge {
    pub handshake: ServerHandshake,
    pub salt: String,
    pub public_key: String,
}

/// Split and parse the stored `"<salt>|<verifier>"` pair.
pub(crate) fn parse_material(srp: &str) -> Result<(BigUint, BigUint), AuthError> {
    let (salt, verifier) = srp.split_once('|').ok_or(AuthError::MalformedAccount)?;
    let salt = parse_decimal(salt).ok_or(AuthError::MalformedAccount)?;
    let verifier = parse_decimal(verifier).ok_or(AuthError::MalformedAccount)?;
    Ok((salt, verifier))
}

/// Step 1: derive a server ephemeral for the account's stored verifier.
///
/// Fails with [`AuthError::NoPasswordAuth`] when the account carries no SRP
/// material at all, and [`AuthError::MalformedAccount`] when the stored pair
/// does not parse. Neither is a routine authentication rejection.
pub fn begin_handshake(account: &Account) -> Result<Challenge, AuthError> {
    let srp = account.srp.as_deref().ok_or(AuthError::NoPasswordAuth)?;
    let (salt, verifier) = parse_material(srp)?;

    let group = &*GROUP;
    let mut rng = OsRng;

    for _ in 0..EPHEMERAL_ATTEMPTS {
        let private_key = rng.gen_biguint(EPHEMERAL_BITS);
        // B = k*v + g^b mod N
        let public_key = (&group.multiplier * &verifier
            + group.generator.modpow(&private_key, &group.modulus))
            % &group.modulus;
        if public_key == BigUint::from(0u8) {
            continue;
        }

        let salt = salt.to_str_radix(10);
        let encoded_public = public_key.to_str_radix(10);
        return Ok(Challenge {
            handshake: ServerHandshake {
                private_key,
                public_key,
                verifier,
            },
            salt,
            public_key: encoded_public,
        });
    }

    Err(AuthError::Ephemeral)
}

impl ServerHandshake {
    /// Step 2: check the client's proof against the stored verifier.
    ///
    /// `Ok(true)`/`Ok(false)` is the routine accept/reject outcome.
    /// Degenerate or unparseable client values are protocol violations and
    /// surface as [`AuthError::MalformedProof`] instead.
    pub fn complete(self, client_public: &str, client_proof: &str) -> Result<bool, AuthError> {
        let group = &*GROUP;

        let client_public = parse_decimal(client_public).ok_or(AuthError::MalformedProof)?;
        let client_proof = parse_decimal(client_proof).ok_or(AuthError::MalformedProof)?;

        // A ≡ 0 (mod N) would fix the shared secret regardless of password.
        if &client_public % &group.modulus == BigUint::from(0u8) {
            return Err(AuthError::MalformedProof);
        }

        let scrambler = hash_to_int(&[&group.pad(&client_public), &group.pad(&self.public_key)]);
        if scrambler == BigUint::from(0u8) {
            return Err(AuthError::MalformedProof);
        }

        // S = (A * v^u)^b mod N
        let premaster = &client_public * self.verifier.modpow(&scrambler, &group.modulus);
        let secret = premaster.modpow(&self.private_key, &group.modulus);

        // M1 = H(PAD(A) ‖ PAD(B) ‖ PAD(S))
        let expected = hash_to_int(&[
            &group.pad(&client_public),
            &group.pad(&self.public_key),
            &group.pad(&secret),
        ]);

        Ok(expected == client_proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srp::client;

    fn account_with_password(username: &str, password: &str) -> Account {
        let salt = client::generate_salt();
        let verifier = client::derive_verifier(password, &salt).expect("derive verifier");
        Account {
            username: username.to_string(),
            srp: Some(format!("{salt}|{verifier}")),
        }
    }

    #[test]
    fn known_password_round_trips() {
        let account = account_with_password("alice", "correct horse");
        let challenge = begin_handshake(&account).expect("begin");

        let response =
            client::respond("correct horse", &challenge.salt, &challenge.public_key)
                .expect("client response");
        let matched = challenge
            .handshake
            .complete(&response.public_key, &response.proof)
            .expect("complete");
        assert!(matched);
    }

    #[test]
    fn one_character_mutation_flips_the_outcome() {
        let account = account_with_password("alice", "correct horse");
        let challenge = begin_handshake(&account).expect("begin");

        let response =
            client::respond("correct horsf", &challenge.salt, &challenge.public_key)
                .expect("client response");
        let matched = challenge
            .handshake
            .complete(&response.public_key, &response.proof)
            .expect("complete");
        assert!(!matched);
    }

    #[test]
    fn missing_srp_material_is_no_password_auth() {
        let account = Account {
            username: "alice".to_string(),
            srp: None,
        };
        assert!(matches!(
            begin_handshake(&account),
            Err(AuthError::NoPasswordAuth)
        ));
    }

    #[test]
    fn salt_without_verifier_is_malformed() {
        let account = Account {
            username: "alice".to_string(),
            srp: Some("onlysalt".to_string()),
        };
        assert!(matches!(
            begin_handshake(&account),
            Err(AuthError::MalformedAccount)
        ));
    }

    #[test]
    fn non_numeric_material_is_malformed() {
        let account = Account {
            username: "alice".to_string(),
            srp: Some("12345|not-a-number".to_string()),
        };
        assert!(matches!(
            begin_handshake(&account),
            Err(AuthError::MalformedAccount)
        ));
    }

    #[test]
    fn zero_client_public_is_a_protocol_violation() {
        let account = account_with_password("alice", "secret");
        let challenge = begin_handshake(&account).expect("begin");
        let result = challenge.handshake.complete("0", "12345");
        assert!(matches!(result, Err(AuthError::MalformedProof)));
    }

    #[test]
    fn modulus_multiple_client_public_is_a_protocol_violation() {
        let account = account_with_password("alice", "secret");
        let challenge = begin_handshake(&account).expect("begin");
        let modulus = super::GROUP.modulus.to_str_radix(10);
        let result = challenge.handshake.complete(&modulus, "12345");
        assert!(matches!(result, Err(AuthError::MalformedProof)));
    }

    #[test]
    fn garbage_proof_values_are_protocol_violations() {
        let account = account_with_password("alice", "secret");
        let challenge = begin_handshake(&account).expect("begin");
        let result = challenge.handshake.complete("abc", "def");
        assert!(matches!(result, Err(AuthError::MalformedProof)));
    }

    #[test]
    fn public_key_round_trips_through_decimal_encoding() {
        let account = account_with_password("alice", "secret");
        let challenge = begin_handshake(&account).expect("begin");
        let decoded = super::parse_decimal(&challenge.public_key).expect("decode");
        assert_eq!(decoded.to_str_radix(10), challenge.public_key);
    }
}
