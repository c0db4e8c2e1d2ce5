//! Salted password hashing for credentials at rest.
//!
//! Every account gets its own random salt, so identical passwords never
//! share a hash and precomputed dictionaries are useless. Verification
//! recomputes the hash from the attempt and the stored salt and compares
//! in constant time.

use crate::users::error::CredentialError;
use argon2::Argon2;
use base64ct::{Base64, Encoding};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Derive a fresh salted hash for a new account.
///
/// Returns `(hash, salt)`, both base64. Two calls with the same password
/// produce different salts and therefore different hashes.
///
/// # Errors
///
/// Rejects an empty password.
pub fn generate(password: &SecretString) -> Result<(String, String), CredentialError> {
    if password.expose_secret().is_empty() {
        return Err(CredentialError::EmptyPassword);
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let hash = derive(password.expose_secret().as_bytes(), &salt)?;

    Ok((Base64::encode_string(&hash), Base64::encode_string(&salt)))
}

/// Check a login attempt against the stored salt and hash.
///
/// A mismatch is a normal `false`, never an error; malformed stored
/// material also verifies as `false`.
#[must_use]
pub fn verify(attempt: &SecretString, salt: &str, hash: &str) -> bool {
    let Ok(salt) = Base64::decode_vec(salt) else {
        return false;
    };
    let Ok(expected) = Base64::decode_vec(hash) else {
        return false;
    };
    let Ok(computed) = derive(attempt.expose_secret().as_bytes(), &salt) else {
        return false;
    };

    computed.as_slice().ct_eq(expected.as_slice()).into()
}

fn derive(password: &[u8], salt: &[u8]) -> Result<[u8; HASH_LEN], CredentialError> {
    let mut out = [0u8; HASH_LEN];
    Argon2::default()
        .hash_password_into(password, salt, &mut out)
        .map_err(|_| CredentialError::Hash)?;
    Ok(out)
}
