// rsa_chat/chat_crypto/src/error.rs

use thiserror::Error;

/// Everything that can go wrong in key generation, the cipher or the router.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("user name must not be blank")]
    InvalidName,

    #[error("'{0}' has no key pair on this device; register first")]
    NotRegistered(String),

    #[error("message must not be blank")]
    EmptyMessage,

    #[error("no public key published for '{0}'")]
    UnknownRecipient(String),

    #[error("character {character:?} (code point {code_point}) does not fit under modulus {modulus}")]
    CharacterOutOfDomain {
        character: char,
        code_point: u64,
        modulus: u64,
    },

    #[error("public exponent {e} has no inverse modulo {phi}")]
    NoModularInverse { e: u64, phi: u64 },

    #[error("invalid cipher parameters: {0}")]
    InvalidParameters(String),

    #[error("ciphertext value {value} is not below modulus {modulus}")]
    CiphertextOutOfRange { value: u64, modulus: u64 },

    #[error("decrypted value {0} is not a valid character")]
    InvalidCodePoint(u64),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
