//! Hardware address (device identity).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// A 48-bit hardware address in canonical `AA:BB:CC:DD:EE:FF` form.
///
/// Parsing accepts `:`- or `-`-separated byte pairs and the bare 12-digit
/// form, in any case. Once constructed the value is always canonical, so
/// equality and hashing are plain string comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Parse and normalize a hardware address.
    pub fn parse(input: &str) -> Result<Self, IdentityError> {
        let invalid = || IdentityError::InvalidMacAddress { value: input.to_string() };

        let digits: String = match input.len() {
            12 => input.to_string(),
            17 => {
                let bytes = input.as_bytes();
                let mut digits = String::with_capacity(12);
                for (i, chunk) in bytes.chunks(3).enumerate() {
                    let pair = chunk.get(..2).ok_or_else(invalid)?;
                    if i < 5 && !matches!(chunk.get(2), Some(b':') | Some(b'-')) {
                        return Err(invalid());
                    }
                    digits.push_str(std::str::from_utf8(pair).map_err(|_| invalid())?);
                }
                digits
            }
            _ => return Err(invalid()),
        };

        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let upper = digits.to_ascii_uppercase();
        let canonical = upper
            .as_bytes()
            .chunks(2)
            .map(|pair| std::str::from_utf8(pair).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(":");

        Ok(Self(canonical))
    }

    /// Canonical `AA:BB:CC:DD:EE:FF` form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Twelve uppercase hex digits without separators.
    pub fn compact(&self) -> String {
        self.0.replace(':', "")
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

impl AsRef<str> for MacAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
