//! Bounded host names.

use std::{fmt, str::FromStr};

use crate::Error;

/// A dot-separated host name that fits into a fixed-size name slot.
///
/// Construction strips trailing dots, so `"host.example."` and
/// `"host.example"` name the same entry. Equality is exact (byte-wise); the
/// mDNS responder performs its own case-insensitive matching on the wire.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HostName {
    // Non-empty ASCII, at most `MAX_LEN` bytes, no empty labels, no trailing dot.
    name: Box<str>,
}

impl HostName {
    /// The maximum length of a host name, in bytes.
    ///
    /// Names longer than this do not fit into a cache slot and are rejected up
    /// front rather than silently truncated.
    pub const MAX_LEN: usize = 32;

    /// Validates and normalizes `name`.
    ///
    /// Trailing dots are stripped. Empty names, empty labels, non-ASCII bytes,
    /// and names longer than [`Self::MAX_LEN`] are rejected.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim_end_matches('.');
        if name.is_empty() {
            return Err(Error::InvalidEmptyLabel);
        }
        if name.len() > Self::MAX_LEN {
            return Err(Error::NameTooLong);
        }
        if !name.is_ascii() {
            return Err(Error::InvalidValue);
        }
        if name.split('.').any(str::is_empty) {
            return Err(Error::InvalidEmptyLabel);
        }
        Ok(Self { name: name.into() })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Returns the `.`-separated labels making up this name.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }

    /// Returns whether this name lives in the mDNS `.local` namespace.
    ///
    /// The bare name `local` itself does not count; there has to be at least
    /// one label in front of the top-level label.
    pub fn is_link_local(&self) -> bool {
        matches!(self.name.rsplit_once('.'), Some((_, tld)) if tld.eq_ignore_ascii_case("local"))
    }
}

impl fmt::Debug for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r#""{}""#, self.name)
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for HostName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(HostName::new("host.example.").unwrap().as_str(), "host.example");
        assert_eq!(HostName::new("host.example...").unwrap().as_str(), "host.example");
        assert_eq!(HostName::new("a").unwrap().as_str(), "a");
    }

    #[test]
    fn rejects_invalid() {
        assert_eq!(HostName::new(""), Err(Error::InvalidEmptyLabel));
        assert_eq!(HostName::new("."), Err(Error::InvalidEmptyLabel));
        assert_eq!(HostName::new("a..b"), Err(Error::InvalidEmptyLabel));
        assert_eq!(HostName::new("pâté.local"), Err(Error::InvalidValue));
        assert_eq!(
            HostName::new(&"x".repeat(HostName::MAX_LEN + 1)),
            Err(Error::NameTooLong),
        );
        assert!(HostName::new(&"x".repeat(HostName::MAX_LEN)).is_ok());
    }

    #[test]
    fn link_local_detection() {
        assert!(HostName::new("printer.local").unwrap().is_link_local());
        assert!(HostName::new("printer.LOCAL").unwrap().is_link_local());
        assert!(HostName::new("a.b.local.").unwrap().is_link_local());
        assert!(!HostName::new("local").unwrap().is_link_local());
        assert!(!HostName::new("host.example").unwrap().is_link_local());
        assert!(!HostName::new("localhost").unwrap().is_link_local());
    }
}
