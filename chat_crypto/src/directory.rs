// rsa_chat/chat_crypto/src/directory.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rsa::PublicKey;

/// Shared name -> public key lookup.
///
/// Entries are only ever added or replaced; a second registration under the
/// same name silently takes over the slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory {
    keys: BTreeMap<String, PublicKey>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `key` under `name`, returning the key it replaced, if any.
    pub fn publish(&mut self, name: impl Into<String>, key: PublicKey) -> Option<PublicKey> {
        self.keys.insert(name.into(), key)
    }

    pub fn get(&self, name: &str) -> Option<&PublicKey> {
        self.keys.get(name)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PublicKey)> {
        self.keys.iter().map(|(name, key)| (name.as_str(), key))
    }

    /// Everyone except `name`, as broadcast recipients.
    pub fn others<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (&'a str, &'a PublicKey)> {
        self.iter().filter(move |(other, _)| *other != name)
    }
}
