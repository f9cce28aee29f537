//! Air purifier configuration.

use serde::Deserialize;

/// Name used when the configuration does not provide one.
pub const DEFAULT_NAME: &str = "Xiaomi Miio Device";

/// Length of a miIO device token, in hex characters.
pub const TOKEN_LEN: usize = 32;

/// Connection settings for one purifier.
#[derive(Debug, Clone, Deserialize)]
pub struct PurifierConfig {
    /// IP address or hostname of the device.
    pub host: String,
    /// 128-bit device token, hex encoded.
    pub token: String,
    /// Display name; also the source of the entity id.
    #[serde(default = "default_name")]
    pub name: String,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

/// Why a [`PurifierConfig`] was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurifierConfigError {
    #[error("host must not be empty")]
    EmptyHost,
    #[error("name must not be empty")]
    EmptyName,
    #[error("token must be {TOKEN_LEN} hex characters, got {0}")]
    TokenLength(usize),
    #[error("token must only contain hex characters")]
    TokenNotHex,
}

impl PurifierConfig {
    /// Check the settings without contacting the device.
    ///
    /// # Errors
    ///
    /// Returns [`PurifierConfigError`] when the host or name is blank, or the
    /// token is not exactly [`TOKEN_LEN`] hex characters.
    pub fn validate(&self) -> Result<(), PurifierConfigError> {
        if self.host.trim().is_empty() {
            return Err(PurifierConfigError::EmptyHost);
        }
        if self.name.trim().is_empty() {
            return Err(PurifierConfigError::EmptyName);
        }
        let len = self.token.chars().count();
        if len != TOKEN_LEN {
            return Err(PurifierConfigError::TokenLength(len));
        }
        if !self.token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(PurifierConfigError::TokenNotHex);
        }
        Ok(())
    }

    /// The first five characters of the token, safe to log.
    #[must_use]
    pub fn token_hint(&self) -> &str {
        self.token
            .char_indices()
            .nth(5)
            .map_or(self.token.as_str(), |(idx, _)| &self.token[..idx])
    }
}
