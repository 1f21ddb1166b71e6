//! Cryptography module for motions
//!
//! This module provides the hashing and signing primitives used for salt
//! derivation, vote commitments and address derivation.

use std::fmt;
use thiserror::Error;
use ring::digest;
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::{Serialize, Deserialize};

/// Error types for cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Error during key generation
    #[error("Key generation error: {0}")]
    KeyGenError(String),

    /// Error during signing
    #[error("Signing error: {0}")]
    SigningError(String),
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// A hash value
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub Vec<u8>);

impl Hash {
    /// Get the bytes of the hash
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert hash to a `0x`-prefixed hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A digital signature
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    /// Get the bytes of the signature
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert signature to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

/// An Ed25519 key pair used to sign salt-derivation messages
///
/// Ed25519 signatures are deterministic, so signing the same message twice
/// yields identical bytes.
pub struct KeyPairWrapper {
    /// The internal Ed25519 key pair
    key_pair: Ed25519KeyPair,
}

impl KeyPairWrapper {
    /// Create a KeyPair from a 32-byte seed
    pub fn from_seed(seed: &[u8; 32]) -> CryptoResult<Self> {
        let key_pair = Ed25519KeyPair::from_seed_unchecked(seed)
            .map_err(|e| CryptoError::KeyGenError(format!("Invalid seed: {:?}", e)))?;

        Ok(Self { key_pair })
    }

    /// Get the public key bytes
    pub fn public_key_bytes(&self) -> &[u8] {
        self.key_pair.public_key().as_ref()
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        let signature = self.key_pair.sign(message);
        Signature(signature.as_ref().to_vec())
    }
}

impl fmt::Debug for KeyPairWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPairWrapper({})", hex::encode(self.public_key_bytes()))
    }
}

/// Calculate SHA-256 hash of data
pub fn sha256(data: &[u8]) -> Hash {
    let digest = digest::digest(&digest::SHA256, data);
    Hash(digest.as_ref().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_is_deterministic() {
        let key_pair = KeyPairWrapper::from_seed(&[7u8; 32]).unwrap();
        let first = key_pair.sign(b"motion 1");
        let second = key_pair.sign(b"motion 1");
        assert_eq!(first, second);
        assert_ne!(first, key_pair.sign(b"motion 2"));
    }

    #[test]
    fn test_seeded_keys_differ() {
        let first = KeyPairWrapper::from_seed(&[1u8; 32]).unwrap();
        let second = KeyPairWrapper::from_seed(&[2u8; 32]).unwrap();
        assert_eq!(first.public_key_bytes().len(), 32);
        assert_ne!(first.public_key_bytes(), second.public_key_bytes());
        assert_ne!(first.sign(b"motion 1"), second.sign(b"motion 1"));
    }

    #[test]
    fn test_sha256_hex() {
        let hash = sha256(b"abc");
        assert_eq!(hash.as_bytes().len(), 32);
        assert_eq!(hash.to_hex(), "0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }
}
