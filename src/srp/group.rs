//! SRP group parameters and shared digest helpers.

use num_bigint::BigUint;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

// 1024-bit group from RFC 5054, appendix A.
const MODULUS_HEX: &str = concat!(
    "EEAF0AB9", "ADB38DD6", "9C33F80A", "FA8FC5E8", "60726187", "75FF3C0B", "9EA2314C",
    "9C256576", "D674DF74", "96EA81D3", "383B4813", "D692C6E0", "E0D5D8E2", "50B98BE4",
    "8E495C1D", "6089DAD1", "5DC7D7B4", "6154D6B6", "CE8EF4AD", "69B15D49", "82559B29",
    "7BCF1885", "C529F566", "660E57EC", "68EDBC3C", "05726CC0", "2FD4CBF4", "976EAA9A",
    "FD5138FE", "8376435B", "9FC61D2F", "C0EB06E3",
);

const GENERATOR: u32 = 2;

pub(crate) struct Group {
    pub(crate) modulus: BigUint,
    pub(crate) generator: BigUint,
    /// SRP-6a multiplier `k = H(N ‖ PAD(g))`.
    pub(crate) multiplier: BigUint,
}

pub(crate) static GROUP: Lazy<Group> = Lazy::new(|| {
    let modulus = BigUint::parse_bytes(MODULUS_HEX.as_bytes(), 16)
        .expect("group modulus constant is valid hex");
    let generator = BigUint::from(GENERATOR);

    let modulus_bytes = modulus.to_bytes_be();
    let generator_padded = left_pad(&generator.to_bytes_be(), modulus_bytes.len());
    let multiplier = hash_to_int(&[&modulus_bytes, &generator_padded]);

    Group {
        modulus,
        generator,
        multiplier,
    }
});

impl Group {
    pub(crate) fn byte_len(&self) -> usize {
        (usize::try_from(self.modulus.bits()).unwrap_or(usize::MAX) + 7) / 8
    }

    /// Left-pad a group element to the modulus width, as the PAD() of the
    /// SRP papers requires for every hashed element.
    pub(crate) fn pad(&self, value: &BigUint) -> Vec<u8> {
        left_pad(&value.to_bytes_be(), self.byte_len())
    }
}

fn left_pad(bytes: &[u8], width: usize) -> Vec<u8> {
    let mut padded = vec![0u8; width.saturating_sub(bytes.len())];
    padded.extend_from_slice(bytes);
    padded
}

/// Digest a sequence of byte strings into a group-scale integer.
pub(crate) fn hash_to_int(parts: &[&[u8]]) -> BigUint {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    BigUint::from_bytes_be(&hasher.finalize())
}

/// Parse a decimal protocol value. Empty and non-numeric inputs are `None`.
pub(crate) fn parse_decimal(value: &str) -> Option<BigUint> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    BigUint::parse_bytes(trimmed.as_bytes(), 10)
}
