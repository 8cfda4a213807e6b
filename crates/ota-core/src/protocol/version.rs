//! Dotted numeric versions.
//!
//! `"1.2"` and `"1.2.0"` are the same version. There are no pre-release or
//! build-metadata semantics: ordering is plain (major, minor, patch) tuple
//! order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ota_types::VersionError;

const MAX_COMPONENTS: usize = 3;

/// A parsed `major.minor.patch` triple.
///
/// Field order matters: the derived `Ord` is the lexicographic order the
/// update decision relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemVer {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Parse 1-3 dot-separated non-negative integers. Missing trailing
    /// components are zero.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let invalid = |reason: String| VersionError::InvalidVersionFormat {
            version: text.to_string(),
            reason,
        };

        if text.is_empty() {
            return Err(invalid("empty version string".to_string()));
        }

        let parts: Vec<&str> = text.split('.').collect();
        if parts.len() > MAX_COMPONENTS {
            return Err(invalid(format!(
                "expected at most {} components, found {}",
                MAX_COMPONENTS,
                parts.len()
            )));
        }

        let mut triple = [0u32; MAX_COMPONENTS];
        for (slot, part) in triple.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(format!("component '{}' is not a number", part)));
            }
            *slot = part
                .parse()
                .map_err(|_| invalid(format!("component '{}' is out of range", part)))?;
        }

        let [major, minor, patch] = triple;
        Ok(Self { major, minor, patch })
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Order two versions.
pub fn compare_versions(a: &SemVer, b: &SemVer) -> Ordering {
    a.cmp(b)
}

/// Parse both strings and order them.
pub fn compare_version_strs(a: &str, b: &str) -> Result<Ordering, VersionError> {
    Ok(compare_versions(&SemVer::parse(a)?, &SemVer::parse(b)?))
}

/// True when `text` would be accepted by [`SemVer::parse`].
pub fn is_valid_version(text: &str) -> bool {
    SemVer::parse(text).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pads_missing_components() {
        assert_eq!(SemVer::parse("2").unwrap(), SemVer::new(2, 0, 0));
        assert_eq!(SemVer::parse("1.2").unwrap(), SemVer::new(1, 2, 0));
        assert_eq!(SemVer::parse("1.2.3").unwrap(), SemVer::new(1, 2, 3));
        assert_eq!(SemVer::parse("1.2").unwrap().to_string(), "1.2.0");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in [
            "", ".", "1.", ".1", "1..2", "1.2.3.4", "a", "1.b", "+1", "-1", "1.-2", " 1", "1 ",
            "1.2 .3", "v1.2", "1.2.3-beta", "١.٢",
        ] {
            let err = SemVer::parse(input).unwrap_err();
            assert!(matches!(err, VersionError::InvalidVersionFormat { .. }), "{input:?}");
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(SemVer::parse("4294967295").is_ok());
        assert!(SemVer::parse("4294967296").is_err());
        assert!(SemVer::parse("1.99999999999999999999").is_err());
    }

    #[test]
    fn test_padded_forms_compare_equal() {
        assert_eq!(compare_version_strs("1.2", "1.2.0").unwrap(), Ordering::Equal);
        assert_eq!(compare_version_strs("3", "3.0.0").unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_ordering_matches_tuple_order() {
        let versions = ["0.0.1", "0.1", "0.9.9", "1", "1.0.1", "1.2.0", "1.2.1", "1.10", "2.0.0"];
        for (i, a) in versions.iter().enumerate() {
            for (j, b) in versions.iter().enumerate() {
                let va = SemVer::parse(a).unwrap();
                let vb = SemVer::parse(b).unwrap();
                assert_eq!(compare_versions(&va, &vb), i.cmp(&j), "{a} vs {b}");
                assert_eq!(
                    compare_versions(&va, &vb),
                    (va.major, va.minor, va.patch).cmp(&(vb.major, vb.minor, vb.patch))
                );
            }
        }
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(compare_version_strs("1.10.0", "1.9.0").unwrap(), Ordering::Greater);
        assert_eq!(compare_version_strs("1.02", "1.2").unwrap(), Ordering::Equal);
    }
}
