//! System-generated identifiers for plants and batches.
//!
//! UIDs are a short prefix plus ten characters from the Crockford base32
//! alphabet (no `I`, `L`, `O`, `U`), which keeps them readable on printed
//! labels. Uniqueness is ultimately guaranteed by a unique index; the random
//! space (32^10) makes a collision retry practically never necessary.

use rand::Rng;

/// Prefix for plant UIDs.
pub const PLANT_UID_PREFIX: &str = "PLT";

/// Prefix for plant batch UIDs.
pub const BATCH_UID_PREFIX: &str = "BAT";

/// Number of random characters after the prefix.
pub const UID_RANDOM_LEN: usize = 10;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Generate `{prefix}-{10 random chars}`.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..UID_RANDOM_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{suffix}")
}

/// Generate a fresh plant UID.
pub fn plant_uid() -> String {
    generate(PLANT_UID_PREFIX)
}

/// Generate a fresh batch UID.
pub fn batch_uid() -> String {
    generate(BATCH_UID_PREFIX)
}
