//! Salted, stretched password hashing.
//!
//! Stored form: `pbkdf2-sha256$<rounds>$hex(salt)$hex(key)`. The round count
//! travels with the hash so it can be raised without invalidating old rows.

use pbkdf2::pbkdf2_hmac_array;
use rand::RngCore;
use sha2::Sha256;

const SCHEME: &str = "pbkdf2-sha256";
const ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; KEY_LEN] {
    pbkdf2_hmac_array::<Sha256, KEY_LEN>(password.as_bytes(), salt, rounds)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    format!(
        "{}${}${}${}",
        SCHEME,
        ROUNDS,
        hex::encode(salt),
        hex::encode(derive(password, &salt, ROUNDS))
    )
}

/// Constant-time check of `password` against a stored hash.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut fields = stored.split('$');
    let (Some(SCHEME), Some(rounds), Some(salt_hex), Some(key_hex), None) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return false;
    };

    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    if rounds == 0 {
        return false;
    }
    let (Ok(salt), Ok(key)) = (hex::decode(salt_hex), hex::decode(key_hex)) else {
        return false;
    };

    constant_time_eq(&derive(password, &salt, rounds), &key)
}
