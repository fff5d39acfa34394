// rsa_chat/chat_crypto/src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rsa::{KeyPair, PrivateKey, PublicKey};

/// Label recorded on broadcast messages.
pub const BROADCAST_LABEL: &str = "Everyone";

/// One line of the chat log. Appended once, never edited or removed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageEntry {
    /// Room notices such as joins.
    System {
        text: String,
        timestamp: DateTime<Utc>,
    },
    /// A message as seen by its sender: plaintext for local display, flagged
    /// as having travelled encrypted.
    Chat {
        sender: String,
        plaintext: String,
        is_encrypted: bool,
        timestamp: DateTime<Utc>,
        recipient_label: String,
    },
}

impl MessageEntry {
    pub fn joined(name: &str) -> Self {
        MessageEntry::System {
            text: format!("{name} joined the chat"),
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            MessageEntry::System { timestamp, .. } | MessageEntry::Chat { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// Key material for the copy/export affordance, numbers kept as plain JSON
/// numbers (`{"e":17,"n":3233}`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum KeyExport {
    Public(PublicKey),
    Private(PrivateKey),
}

impl KeyExport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl KeyPair {
    /// The public half, serialised for sharing.
    pub fn export_public(&self) -> Result<String> {
        KeyExport::Public(*self.public_key()).to_json()
    }

    /// The private half, serialised for the owner's own backup.
    pub fn export_private(&self) -> Result<String> {
        KeyExport::Private(*self.private_key()).to_json()
    }
}
