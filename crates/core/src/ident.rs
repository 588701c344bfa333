//! Request identifiers that end up in filesystem paths.
//!
//! Both types are validated before any filesystem interaction and are the
//! only barrier against path traversal through request fields.

use serde::Serialize;
use std::fmt;

/// Trust identity an upload is verified against.
///
/// Also names the alias published next to the upload root, so it must stay a
/// single path component.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identifier(String);

impl Identifier {
    /// Parse an identifier, allowing `[A-Za-z0-9_-@.]`.
    pub fn parse(value: &str) -> crate::Result<Self> {
        if value.is_empty() {
            return Err(crate::Error::InvalidIdentifier(
                "identifier cannot be empty".to_string(),
            ));
        }

        for c in value.chars() {
            if !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '@' | '.') {
                return Err(crate::Error::InvalidIdentifier(format!(
                    "invalid character in identifier: {c:?}"
                )));
            }
        }

        // Allowed characters, but they resolve to a parent directory.
        if value == "." || value == ".." {
            return Err(crate::Error::InvalidIdentifier(format!(
                "identifier cannot be {value:?}"
            )));
        }

        Ok(Self(value.to_string()))
    }

    /// Get the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Destination subdirectory under the upload root.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DirectoryName(String);

impl DirectoryName {
    /// Parse a directory name, allowing ASCII letters and digits only.
    pub fn parse(value: &str) -> crate::Result<Self> {
        if value.is_empty() {
            return Err(crate::Error::InvalidDirectory(
                "directory cannot be empty".to_string(),
            ));
        }

        if let Some(c) = value.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(crate::Error::InvalidDirectory(format!(
                "invalid character in directory: {c:?}"
            )));
        }

        Ok(Self(value.to_string()))
    }

    /// Get the directory name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DirectoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirectoryName({self})")
    }
}

impl fmt::Display for DirectoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<std::path::Path> for DirectoryName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}
