// rsa_chat/chat_crypto/src/cipher.rs

//! Per-character textbook RSA.
//!
//! A message is treated as an ordered sequence of characters; each code point
//! is raised to the key's exponent independently. Position in the output is
//! the only thing tying a value back to its character.

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};
use crate::rsa::{PrivateKey, PublicKey};

/// One integer per plaintext character, each in `[0, n)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ciphertext(Vec<u64>);

impl Ciphertext {
    pub fn new(values: Vec<u64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u64> {
        self.0.iter()
    }
}

/// `base^exponent mod modulus` by right-to-left binary exponentiation.
///
/// Intermediate products are taken in `u128` and reduced at every step, so
/// the full power is never formed.
///
/// # Panics
/// Panics if `modulus == 0`. Keys produced by [`crate::generate_key_pair`]
/// always carry a modulus of at least 6.
pub fn mod_pow(base: u64, exponent: u64, modulus: u64) -> u64 {
    assert!(modulus != 0, "mod_pow called with a zero modulus");
    let m = modulus as u128;
    let mut result: u128 = 1 % m;
    let mut base = base as u128 % m;
    let mut exp = exponent;

    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % m;
        }
        exp >>= 1;
        base = base * base % m;
    }
    result as u64
}

/// Encrypts `text` character by character under `key`.
///
/// Fails with [`ChatError::CharacterOutOfDomain`] on the first character whose
/// code point is not below the modulus; nothing is produced in that case.
pub fn encrypt_text(text: &str, key: &PublicKey) -> Result<Ciphertext> {
    text.chars()
        .map(|character| {
            let code_point = u64::from(character);
            if code_point >= key.n {
                return Err(ChatError::CharacterOutOfDomain {
                    character,
                    code_point,
                    modulus: key.n,
                });
            }
            Ok(mod_pow(code_point, key.e, key.n))
        })
        .collect::<Result<Vec<_>>>()
        .map(Ciphertext)
}

/// Inverse of [`encrypt_text`] for the matching private key.
///
/// With the wrong key the output is garbage rather than an error, unless a
/// recovered value is not a valid `char`.
pub fn decrypt_text(ciphertext: &Ciphertext, key: &PrivateKey) -> Result<String> {
    ciphertext
        .iter()
        .map(|&value| {
            if value >= key.n {
                return Err(ChatError::CiphertextOutOfRange {
                    value,
                    modulus: key.n,
                });
            }
            let m = mod_pow(value, key.d, key.n);
            u32::try_from(m)
                .ok()
                .and_then(char::from_u32)
                .ok_or(ChatError::InvalidCodePoint(m))
        })
        .collect()
}
