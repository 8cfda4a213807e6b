//! Device token derivation.
//!
//! A device proves fleet membership by sending `token(MAC, secret)` in the
//! `X-Device-Auth` header. The token is a djb2-style fold over the compact
//! MAC followed by the secret:
//!
//! ```text
//! acc = 0
//! for c in compact_mac ++ secret:
//!     acc = (acc * 33 + codepoint(c)) mod 2^32
//! token = uppercase_hex(acc)        // no zero padding
//! ```
//!
//! Device firmware in the field computes exactly this, so the algorithm is
//! frozen. It is not a cryptographic MAC; replacing it requires reflashing
//! every device.

use std::fmt;

use subtle::ConstantTimeEq;

use ota_types::MacAddress;

/// The fleet-wide secret compiled into device firmware.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Uppercase hex rendering of the 32-bit fold. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthToken(String);

impl AuthToken {
    /// The token derived from malformed inputs. Matches no claim.
    fn invalid() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn fold(input: impl Iterator<Item = char>) -> u32 {
    input.fold(0u32, |acc, c| (acc << 5).wrapping_add(acc).wrapping_add(u32::from(c)))
}

/// Derive the token a device with `identity` must present.
pub fn derive_token(identity: &MacAddress, secret: &SharedSecret) -> AuthToken {
    if secret.is_empty() {
        tracing::error!(mac = %identity, "Cannot derive device token: shared secret is empty");
        return AuthToken::invalid();
    }

    let compact = identity.compact();
    let acc = fold(compact.chars().chain(secret.expose().chars()));
    AuthToken(format!("{:X}", acc))
}

/// Derive a token from an unparsed MAC. Malformed input yields a token that
/// never verifies.
pub fn derive_token_raw(mac: &str, secret: &SharedSecret) -> AuthToken {
    match MacAddress::parse(mac) {
        Ok(identity) => derive_token(&identity, secret),
        Err(_) => AuthToken::invalid(),
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a claimed token. Case-insensitive; never panics.
pub fn verify_token(identity: &MacAddress, claimed: &str, secret: &SharedSecret) -> bool {
    let expected = derive_token(identity, secret);
    if !expected.is_valid() || claimed.is_empty() {
        return false;
    }
    constant_time_compare(&claimed.to_ascii_uppercase(), expected.as_str())
}
