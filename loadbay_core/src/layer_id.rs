//! Layer identifiers: 64-character content tokens.

use crate::error::{Error, Result};
use rand::RngCore;
use std::borrow::Borrow;
use std::fmt;

/// Length of a layer identifier in characters.
pub const LAYER_ID_LEN: usize = 64;

/// A 64-character layer identifier.
///
/// Identifiers name immutable layers; an archive entry whose name is
/// exactly one of these tokens is treated as layer material.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(String);

impl LayerId {
    /// Parse an identifier from a string (64 ASCII alphanumeric characters).
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != LAYER_ID_LEN {
            return Err(Error::invalid_layer_id(format!(
                "Expected {} characters, got {}",
                LAYER_ID_LEN,
                s.len()
            )));
        }

        if !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::invalid_layer_id(format!(
                "Non-alphanumeric character in {:?}",
                s
            )));
        }

        Ok(LayerId(s.to_string()))
    }

    /// Generate a fresh identifier: 32 random bytes, hex-encoded.
    pub fn random() -> Self {
        let mut bytes = [0u8; LAYER_ID_LEN / 2];
        rand::thread_rng().fill_bytes(&mut bytes);
        LayerId(hex::encode(bytes))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}
