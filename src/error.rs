//! Error types for fieldseal.
//!
//! Every error variant is a distinct failure mode in the encryption
//! subsystem. Error messages are intentionally minimal — they signal
//! *what* failed without revealing *why* in ways that could leak
//! cryptographic state.

use std::fmt;

/// The single error type for all fieldseal operations.
#[derive(Debug)]
pub enum FieldsealError {
    /// Key derivation was attempted with an empty or absent principal id.
    InvalidPrincipal,

    /// A cryptographic key was invalid (wrong length, malformed, etc.).
    InvalidKey,

    /// Encryption failed. The underlying `ring` operation returned an error.
    EncryptionFailure,

    /// Decryption failed. This includes: wrong key, tampered ciphertext,
    /// or corrupted GCM authentication tag.
    DecryptionFailure,

    /// The decrypted bytes were not a well-formed envelope: bad base64,
    /// non-JSON content, a missing field, or an unsupported version.
    InvalidEnvelope,

    /// A plaintext value could not be serialized into the envelope.
    SerializationFailure,

    /// The system's random number generator failed to produce bytes.
    RandomnessFailure,

    /// A record with the given id does not exist in the store.
    RecordNotFound(u64),
}

impl fmt::Display for FieldsealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPrincipal => write!(f, "no principal id available"),
            Self::InvalidKey => write!(f, "invalid key"),
            Self::EncryptionFailure => write!(f, "encryption failed"),
            Self::DecryptionFailure => write!(f, "decryption failed"),
            Self::InvalidEnvelope => write!(f, "invalid envelope"),
            Self::SerializationFailure => write!(f, "serialization failed"),
            Self::RandomnessFailure => write!(f, "randomness source failed"),
            Self::RecordNotFound(id) => write!(f, "record not found: {}", id),
        }
    }
}

impl std::error::Error for FieldsealError {}
