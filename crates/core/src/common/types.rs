//! Common types shared across the motions crates

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

use crate::crypto::sha256;
use crate::utils::UtilError;

/// Token and reputation amounts, 18-decimal fixed point
pub type Amount = u128;

/// Timestamp in seconds since epoch
pub type Timestamp = u64;

/// A ledger account or contract address
///
/// Addresses are stored lowercase so that two spellings of the same
/// checksummed address compare equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Length of an address in bytes
    pub const BYTES: usize = 20;

    /// Parse an address from a `0x`-prefixed hex string
    pub fn parse(value: &str) -> Result<Self, UtilError> {
        let trimmed = value.trim();
        let body = trimmed.strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| UtilError::InvalidValue(format!("Address must start with 0x: {}", value)))?;

        if body.len() != Self::BYTES * 2 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(UtilError::InvalidValue(format!("Invalid address: {}", value)));
        }

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// Derive an address from a public key (last 20 bytes of its SHA-256 digest)
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = sha256(public_key);
        let bytes = digest.as_bytes();
        Self(format!("0x{}", hex::encode(&bytes[bytes.len() - Self::BYTES..])))
    }

    /// The all-zero address
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(Self::BYTES * 2)))
    }

    /// Get the address as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl FromStr for Address {
    type Err = UtilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = UtilError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_case_insensitive() {
        let upper = Address::parse("0xB77D57F4959EAFA0339424B83FCFAF9C15407461").unwrap();
        let lower = Address::parse("0xb77d57f4959eafa0339424b83fcfaf9c15407461").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "0xb77d57f4959eafa0339424b83fcfaf9c15407461");
    }

    #[test]
    fn test_address_rejects_malformed() {
        assert!(Address::parse("b77d57f4959eafa0339424b83fcfaf9c15407461").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xg77d57f4959eafa0339424b83fcfaf9c15407461").is_err());
    }

    #[test]
    fn test_address_from_public_key() {
        let address = Address::from_public_key(&[1u8; 32]);
        assert_eq!(address.as_str().len(), 42);
        assert_eq!(Address::parse(address.as_str()).unwrap(), address);
    }

    #[test]
    fn test_address_serde() {
        let address = Address::zero();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
        assert!(serde_json::from_str::<Address>("\"0x12\"").is_err());
    }
}
