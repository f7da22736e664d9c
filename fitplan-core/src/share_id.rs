//! Share identifiers for workout plans.
//!
//! A share id is 16 random bytes encoded with bs58check (base58 with checksum),
//! short enough to paste into a message and self-validating on input. The link
//! form is `fitplan:<bs58check>`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Link prefix for shared plans
pub const LINK_PREFIX: &str = "fitplan:";

#[derive(Error, Debug)]
pub enum ShareIdError {
    #[error("Invalid share id encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid share id length: expected 16 bytes, got {0}")]
    InvalidLength(usize),

    #[error("Invalid share link: {0}")]
    InvalidLink(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShareId([u8; 16]);

impl ShareId {
    /// Generate a new random share id
    pub fn new() -> Self {
        Self(*Uuid::new_v4().as_bytes())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(*uuid.as_bytes())
    }

    pub fn to_bs58check(&self) -> String {
        bs58::encode(&self.0).with_check().into_string()
    }

    pub fn from_bs58check(s: &str) -> Result<Self, ShareIdError> {
        let bytes = bs58::decode(s.trim())
            .with_check(None)
            .into_vec()
            .map_err(|e| ShareIdError::InvalidEncoding(e.to_string()))?;

        let arr: [u8; 16] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ShareIdError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn to_link(&self) -> String {
        format!("{}{}", LINK_PREFIX, self.to_bs58check())
    }

    /// Parses either a bare share id or a `fitplan:` link.
    pub fn parse(input: &str) -> Result<Self, ShareIdError> {
        let input = input.trim();
        match input.strip_prefix(LINK_PREFIX) {
            Some(rest) if rest.is_empty() => Err(ShareIdError::InvalidLink(input.to_string())),
            Some(rest) => Self::from_bs58check(rest),
            None => Self::from_bs58check(input),
        }
    }
}

impl Default for ShareId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShareId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_bs58check())
    }
}

impl std::str::FromStr for ShareId {
    type Err = ShareIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ShareId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_bs58check())
    }
}

impl<'de> Deserialize<'de> for ShareId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
