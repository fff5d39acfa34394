// rsa_chat/chat_crypto/src/router.rs

//! Registration and message routing for participants sharing one device.
//!
//! The router owns the log and the private keys of locally registered
//! participants. The [`Directory`] of public keys is passed in explicitly so
//! several routers (or a test) can share one.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cipher::{decrypt_text, encrypt_text, Ciphertext};
use crate::directory::Directory;
use crate::error::{ChatError, Result};
use crate::models::{MessageEntry, BROADCAST_LABEL};
use crate::params::CipherParameters;
use crate::rsa::{generate_key_pair, KeyPair};

/// Selector keyword for sending to everyone.
pub const BROADCAST: &str = "broadcast";

/// Who a message goes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Recipient {
    Broadcast,
    User(String),
}

impl Recipient {
    pub fn user(name: impl Into<String>) -> Self {
        Recipient::User(name.into())
    }

    fn label(&self) -> &str {
        match self {
            Recipient::Broadcast => BROADCAST_LABEL,
            Recipient::User(name) => name,
        }
    }
}

impl FromStr for Recipient {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s == BROADCAST {
            Ok(Recipient::Broadcast)
        } else {
            Ok(Recipient::User(s.to_string()))
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Broadcast => f.write_str(BROADCAST),
            Recipient::User(name) => f.write_str(name),
        }
    }
}

/// What a successful [`MessageRouter::register`] hands back.
#[derive(Debug, Clone)]
pub struct Registration {
    pub key_pair: KeyPair,
    pub entry: MessageEntry,
}

/// Outcome of [`MessageRouter::send`].
///
/// `ciphertexts` holds one entry per recipient that was encrypted for. They
/// are not stored anywhere else and are not delivered.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub entry: MessageEntry,
    pub ciphertexts: BTreeMap<String, Ciphertext>,
}

impl Dispatch {
    pub fn ciphertext_for(&self, name: &str) -> Option<&Ciphertext> {
        self.ciphertexts.get(name)
    }
}

#[derive(Debug, Default)]
pub struct MessageRouter {
    params: CipherParameters,
    keyring: HashMap<String, KeyPair>,
    active: Option<String>,
    log: Vec<MessageEntry>,
}

impl MessageRouter {
    /// Router using the legacy 61 x 53 parameters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(params: CipherParameters) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn parameters(&self) -> &CipherParameters {
        &self.params
    }

    /// Generates a key pair for `name`, publishes its public half and makes
    /// `name` the active identity.
    ///
    /// Names are trimmed here and in every other method taking a participant
    /// name, so `"Alice "` and `"Alice"` address the same participant.
    ///
    /// Re-registering an existing name replaces both its directory entry and
    /// its local key pair.
    pub fn register(&mut self, name: &str, directory: &mut Directory) -> Result<Registration> {
        let name = name.trim();
        if name.is_empty() {
            warn!("rejected registration with blank name");
            return Err(ChatError::InvalidName);
        }

        let key_pair = generate_key_pair(&self.params)?;
        if directory.publish(name, *key_pair.public_key()).is_some() {
            warn!(user = name, "registration replaced an existing directory entry");
        }
        self.keyring.insert(name.to_string(), key_pair.clone());
        self.active = Some(name.to_string());

        let entry = MessageEntry::joined(name);
        self.log.push(entry.clone());
        info!(user = name, "registered");

        Ok(Registration { key_pair, entry })
    }

    /// Encrypts `plaintext` for `recipient` and records the sender's view of
    /// the message.
    ///
    /// All ciphertexts are computed before the log is touched, so a failure
    /// leaves the router unchanged.
    pub fn send(
        &mut self,
        sender: &str,
        recipient: &Recipient,
        plaintext: &str,
        directory: &Directory,
    ) -> Result<Dispatch> {
        let sender = sender.trim();
        if plaintext.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if !self.keyring.contains_key(sender) {
            warn!(user = sender, "send attempted before registration");
            return Err(ChatError::NotRegistered(sender.to_string()));
        }

        let ciphertexts = match recipient {
            Recipient::Broadcast => directory
                .others(sender)
                .map(|(name, key)| {
                    encrypt_text(plaintext, key).map(|cipher| (name.to_string(), cipher))
                })
                .collect::<Result<BTreeMap<_, _>>>()?,
            Recipient::User(name) => {
                let name = name.trim();
                let key = directory
                    .get(name)
                    .ok_or_else(|| ChatError::UnknownRecipient(name.to_string()))?;
                BTreeMap::from([(name.to_string(), encrypt_text(plaintext, key)?)])
            }
        };

        let entry = MessageEntry::Chat {
            sender: sender.to_string(),
            plaintext: plaintext.to_string(),
            is_encrypted: true,
            timestamp: Utc::now(),
            recipient_label: recipient.label().trim().to_string(),
        };
        self.log.push(entry.clone());
        debug!(
            sender,
            recipient = %recipient,
            copies = ciphertexts.len(),
            "message dispatched"
        );

        Ok(Dispatch { entry, ciphertexts })
    }

    /// Decrypts a ciphertext addressed to `recipient` with that participant's
    /// own private key.
    pub fn open(&self, recipient: &str, ciphertext: &Ciphertext) -> Result<String> {
        let recipient = recipient.trim();
        let key_pair = self
            .keyring
            .get(recipient)
            .ok_or_else(|| ChatError::NotRegistered(recipient.to_string()))?;
        decrypt_text(ciphertext, key_pair.private_key())
    }

    /// Makes an already registered participant the active identity.
    pub fn switch_identity(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if !self.keyring.contains_key(name) {
            return Err(ChatError::NotRegistered(name.to_string()));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    pub fn active_identity(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn key_pair(&self, name: &str) -> Option<&KeyPair> {
        self.keyring.get(name.trim())
    }

    /// Locally registered participants, sorted.
    pub fn participants(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.keyring.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn log(&self) -> &[MessageEntry] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(names: &[&str]) -> (MessageRouter, Directory) {
        let mut router = MessageRouter::new();
        let mut directory = Directory::new();
        for name in names {
            router.register(name, &mut directory).unwrap();
        }
        (router, directory)
    }

    #[test]
    fn register_rejects_blank_names() {
        let mut router = MessageRouter::new();
        let mut directory = Directory::new();
        for name in ["", "   ", "\t\n"] {
            assert!(matches!(
                router.register(name, &mut directory),
                Err(ChatError::InvalidName)
            ));
        }
        assert!(directory.is_empty());
        assert!(router.log().is_empty());
        assert_eq!(router.active_identity(), None);
    }

    #[test]
    fn register_publishes_trimmed_name_and_logs_join() {
        let mut router = MessageRouter::new();
        let mut directory = Directory::new();
        let reg = router.register("  Alice ", &mut directory).unwrap();

        assert_eq!(directory.get("Alice"), Some(reg.key_pair.public_key()));
        assert_eq!(router.active_identity(), Some("Alice"));
        assert_eq!(router.log(), &[reg.entry.clone()]);
        assert!(matches!(reg.entry, MessageEntry::System { ref text, .. } if text == "Alice joined the chat"));
    }

    #[test]
    fn later_registration_becomes_active() {
        let (mut router, _) = room(&["Alice", "Bob"]);
        assert_eq!(router.active_identity(), Some("Bob"));
        router.switch_identity("Alice").unwrap();
        assert_eq!(router.active_identity(), Some("Alice"));
        assert!(matches!(
            router.switch_identity("Mallory"),
            Err(ChatError::NotRegistered(_))
        ));
    }

    #[test]
    fn duplicate_registration_overwrites() {
        let (mut router, mut directory) = room(&["Alice"]);
        router.register("Alice", &mut directory).unwrap();
        assert_eq!(directory.len(), 1);
        assert_eq!(router.participants(), vec!["Alice"]);
        assert_eq!(router.log().len(), 2);
    }

    #[test]
    fn send_requires_registration() {
        let (mut router, directory) = room(&["Alice"]);
        let err = router
            .send("Bob", &Recipient::user("Alice"), "hi", &directory)
            .unwrap_err();
        assert!(matches!(err, ChatError::NotRegistered(ref n) if n == "Bob"));
    }

    #[test]
    fn send_rejects_blank_message() {
        let (mut router, directory) = room(&["Alice", "Bob"]);
        for text in ["", "  ", "\n"] {
            assert!(matches!(
                router.send("Alice", &Recipient::Broadcast, text, &directory),
                Err(ChatError::EmptyMessage)
            ));
        }
    }

    #[test]
    fn direct_message_encrypts_once() {
        let (mut router, directory) = room(&["Alice", "Bob", "Carol"]);
        let dispatch = router
            .send("Alice", &Recipient::user("Bob"), "hi", &directory)
            .unwrap();

        assert_eq!(dispatch.ciphertexts.len(), 1);
        let cipher = dispatch.ciphertext_for("Bob").unwrap();
        assert_eq!(cipher.len(), 2);
        assert_eq!(router.open("Bob", cipher).unwrap(), "hi");

        match &dispatch.entry {
            MessageEntry::Chat {
                sender,
                plaintext,
                is_encrypted,
                recipient_label,
                ..
            } => {
                assert_eq!(sender, "Alice");
                assert_eq!(plaintext, "hi");
                assert!(*is_encrypted);
                assert_eq!(recipient_label, "Bob");
            }
            other => panic!("expected chat entry, got {other:?}"),
        }
        assert_eq!(router.log().last(), Some(&dispatch.entry));
    }

    #[test]
    fn broadcast_fans_out_to_everyone_but_sender() {
        let (mut router, directory) = room(&["Alice", "Bob", "Carol", "Dave"]);
        let dispatch = router
            .send("Alice", &Recipient::Broadcast, "hello all", &directory)
            .unwrap();

        let names: Vec<&str> = dispatch.ciphertexts.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Bob", "Carol", "Dave"]);
        assert!(dispatch.ciphertext_for("Alice").is_none());
        for (name, cipher) in &dispatch.ciphertexts {
            assert_eq!(router.open(name, cipher).unwrap(), "hello all");
        }
        assert!(matches!(
            dispatch.entry,
            MessageEntry::Chat { ref recipient_label, .. } if recipient_label == "Everyone"
        ));
    }

    #[test]
    fn broadcast_alone_still_logs() {
        let (mut router, directory) = room(&["Alice"]);
        let dispatch = router
            .send("Alice", &Recipient::Broadcast, "anyone?", &directory)
            .unwrap();
        assert!(dispatch.ciphertexts.is_empty());
        assert_eq!(router.log().len(), 2);
    }

    #[test]
    fn unknown_recipient_is_rejected_without_logging() {
        let (mut router, directory) = room(&["Alice"]);
        let before = router.log().len();
        let err = router
            .send("Alice", &Recipient::user("nonexistent-user"), "hi", &directory)
            .unwrap_err();
        assert!(matches!(err, ChatError::UnknownRecipient(ref n) if n == "nonexistent-user"));
        assert_eq!(router.log().len(), before);
    }

    #[test]
    fn out_of_domain_character_leaves_log_untouched() {
        let (mut router, directory) = room(&["Alice", "Bob", "Carol"]);
        let before = router.log().len();
        let err = router
            .send("Alice", &Recipient::Broadcast, "snow ☃", &directory)
            .unwrap_err();
        assert!(matches!(err, ChatError::CharacterOutOfDomain { character: '☃', .. }));
        assert_eq!(router.log().len(), before);
    }

    #[test]
    fn padded_name_works_everywhere_after_registration() {
        let (mut router, mut directory) = room(&["Bob"]);
        router.register("Alice ", &mut directory).unwrap();

        let dispatch = router
            .send("Alice ", &Recipient::user(" Bob"), "hi", &directory)
            .unwrap();
        assert!(matches!(
            dispatch.entry,
            MessageEntry::Chat { ref sender, ref recipient_label, .. }
                if sender == "Alice" && recipient_label == "Bob"
        ));
        let cipher = dispatch.ciphertext_for("Bob").unwrap();
        assert_eq!(router.open(" Bob ", cipher).unwrap(), "hi");

        router.switch_identity("Bob").unwrap();
        router.switch_identity("Alice ").unwrap();
        assert_eq!(router.active_identity(), Some("Alice"));
        assert!(router.key_pair("Alice ").is_some());

        let broadcast = router
            .send(" Alice", &Recipient::Broadcast, "all", &directory)
            .unwrap();
        assert_eq!(broadcast.ciphertexts.keys().collect::<Vec<_>>(), vec!["Bob"]);
    }

    #[test]
    fn open_requires_local_key() {
        let (router, _) = room(&["Alice"]);
        assert!(matches!(
            router.open("Bob", &Ciphertext::new(vec![1])),
            Err(ChatError::NotRegistered(_))
        ));
    }

    #[test]
    fn recipient_parsing() {
        assert_eq!("broadcast".parse::<Recipient>().unwrap(), Recipient::Broadcast);
        assert_eq!(" Bob ".parse::<Recipient>().unwrap(), Recipient::user("Bob"));
        assert_eq!(Recipient::Broadcast.to_string(), "broadcast");
    }
}
