//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`IconName`] - Validated icon (entity) name
//! - [`VersionToken`] - Opaque source revision identifier
//! - [`ContentHash`] - Normalized content digest (hex SHA-256)
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use glyphsync::core::types::{IconName, VersionToken};
//!
//! // Valid constructions
//! let icon = IconName::new("account_circle").unwrap();
//! let token = VersionToken::new("v4.0.1").unwrap();
//!
//! // Invalid constructions fail at creation time
//! assert!(IconName::new("").is_err());
//! assert!(IconName::new("has space").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid icon name: {0}")]
    InvalidIconName(String),

    #[error("invalid version token: {0}")]
    InvalidVersionToken(String),

    #[error("invalid content hash: {0}")]
    InvalidContentHash(String),
}

/// A validated icon name.
///
/// Icon names identify entities in the source repository and become
/// container names in the target tree. Rules:
/// - Cannot be empty
/// - Lowercase ASCII letters, digits, `_` and `-` only
/// - Cannot start or end with `_` or `-`
///
/// # Example
///
/// ```
/// use glyphsync::core::types::IconName;
///
/// let name = IconName::new("arrow_back").unwrap();
/// assert_eq!(name.as_str(), "arrow_back");
///
/// assert!(IconName::new("Arrow Back").is_err());
/// assert!(IconName::new("_leading").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IconName(String);

impl IconName {
    /// Create a new validated icon name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidIconName` if the name violates the naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidIconName(
                "icon name cannot be empty".into(),
            ));
        }

        if name.starts_with(['_', '-']) || name.ends_with(['_', '-']) {
            return Err(TypeError::InvalidIconName(
                "icon name cannot start or end with '_' or '-'".into(),
            ));
        }

        for c in name.chars() {
            let ok = c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-';
            if !ok {
                return Err(TypeError::InvalidIconName(format!(
                    "icon name cannot contain '{c}'"
                )));
            }
        }

        Ok(())
    }

    /// Get the icon name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IconName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<IconName> for String {
    fn from(name: IconName) -> Self {
        name.0
    }
}

impl AsRef<str> for IconName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IconName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque version token identifying a source revision.
///
/// Tokens are compared for equality only, never ordered. A token is any
/// non-empty string without whitespace or control characters (commit SHAs,
/// tags like `v4.0.1`, and release labels all qualify).
///
/// # Example
///
/// ```
/// use glyphsync::core::types::VersionToken;
///
/// let a = VersionToken::new("9f2c1ab").unwrap();
/// let b = VersionToken::new("9f2c1ab").unwrap();
/// assert_eq!(a, b);
///
/// assert!(VersionToken::new("").is_err());
/// assert!(VersionToken::new("two words").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionToken(String);

impl VersionToken {
    /// Create a new validated version token.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidVersionToken` if the token is empty or
    /// contains whitespace or control characters.
    pub fn new(token: impl Into<String>) -> Result<Self, TypeError> {
        let token = token.into();
        if token.is_empty() {
            return Err(TypeError::InvalidVersionToken(
                "version token cannot be empty".into(),
            ));
        }
        for c in token.chars() {
            if c.is_whitespace() || c.is_ascii_control() {
                return Err(TypeError::InvalidVersionToken(
                    "version token cannot contain whitespace or control characters".into(),
                ));
            }
        }
        Ok(Self(token))
    }

    /// Get the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VersionToken {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<VersionToken> for String {
    fn from(token: VersionToken) -> Self {
        token.0
    }
}

impl AsRef<str> for VersionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized content digest (lowercase hex SHA-256).
///
/// Produced by [`crate::core::hash::digest`]; stored per child in entity
/// metadata and compared to detect real (non-cosmetic) content changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Create a content hash from a lowercase hex digest string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidContentHash` if the string is not 64
    /// lowercase hex characters.
    pub fn new(hash: impl Into<String>) -> Result<Self, TypeError> {
        let hash = hash.into();
        let well_formed = hash.len() == 64
            && hash
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !well_formed {
            return Err(TypeError::InvalidContentHash(
                "content hash must be 64 lowercase hex characters".into(),
            ));
        }
        Ok(Self(hash))
    }

    pub(crate) fn from_digest(hex: String) -> Self {
        Self(hex)
    }

    /// Get the hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentHash {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
