// rsa_chat/chat_crypto/src/lib.rs

//! Textbook RSA for a simulated multi-party chat.
//!
//! Every participant derives a key pair from small public parameters
//! (61 x 53, e = 17 by default), publishes the public half into a shared
//! [`Directory`], and messages are encrypted one character at a time for each
//! recipient. This is a teaching scheme: unpadded, deterministic and trivially
//! breakable.

pub mod cipher;
pub mod directory;
pub mod error;
pub mod models;
pub mod params;
pub mod router;
pub mod rsa;

// Main entry points re-exported for the application.
pub use cipher::{decrypt_text, encrypt_text, mod_pow, Ciphertext};
pub use directory::Directory;
pub use error::{ChatError, Result};
pub use models::{KeyExport, MessageEntry, BROADCAST_LABEL};
pub use params::CipherParameters;
pub use router::{Dispatch, MessageRouter, Recipient, Registration, BROADCAST};
pub use rsa::{generate_key_pair, KeyPair, PrivateKey, PublicKey};
