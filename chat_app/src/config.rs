// rsa_chat/chat_app/src/config.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chat_crypto::{generate_key_pair, CipherParameters};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "rsa_chat.toml";

/// Application settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub cipher: CipherParameters,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            cipher: CipherParameters::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or the default file if present, or built-in defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !path.exists() {
            if required {
                anyhow::bail!("config file {} not found", path.display());
            }
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
        // Generating once catches a non-invertible exponent at startup.
        generate_key_pair(&config.cipher)
            .with_context(|| format!("bad [cipher] section in {}", path.display()))?;
        Ok(config)
    }
}
