//! Low-level cryptographic operations.
//!
//! This module is one of exactly two places in the crate that import `ring`
//! directly (the other is `keys`). All other modules perform encryption and
//! decryption exclusively through the functions exposed here.
//!
//! Primitive choices:
//! - **Cipher**: AES-256-GCM (authenticated encryption)
//! - **IV**: 96-bit (12 bytes), generated fresh per operation via `SystemRandom`
//! - **Key size**: 256 bits (32 bytes)

use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::FieldsealError;

/// The AEAD algorithm used throughout fieldseal.
const ALGORITHM: &aead::Algorithm = &AES_256_GCM;

/// Size of the IV in bytes (96 bits).
pub const IV_LEN: usize = 12;

/// Size of a derived key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Generate a cryptographically secure random IV.
///
/// Uses `ring::rand::SystemRandom` — the only source of randomness in the
/// crate. A fresh IV is generated for every encryption call. There is no IV
/// caching or counter-based generation.
fn generate_iv() -> Result<[u8; IV_LEN], FieldsealError> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; IV_LEN];
    rng.fill(&mut buf)
        .map_err(|_| FieldsealError::RandomnessFailure)?;
    Ok(buf)
}

/// Encrypt a plaintext payload using AES-256-GCM.
///
/// Returns the IV prepended to the ciphertext. The caller does not need to
/// manage the IV separately — it is bundled with the output and extracted
/// automatically during decryption.
///
/// # Layout of returned bytes
/// ```text
/// [ IV (12 bytes) ][ ciphertext + GCM tag ]
/// ```
pub(crate) fn encrypt(
    key_bytes: &[u8; KEY_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, FieldsealError> {
    let unbound = UnboundKey::new(ALGORITHM, key_bytes).map_err(|_| FieldsealError::InvalidKey)?;
    let key = LessSafeKey::new(unbound);

    let iv = generate_iv()?;
    let nonce = Nonce::assume_unique_for_key(iv);

    // `seal_in_place_append_tag` encrypts the buffer in place and appends
    // the GCM authentication tag.
    let mut sealed = plaintext.to_vec();
    key.seal_in_place_append_tag(nonce, Aad::empty(), &mut sealed)
        .map_err(|_| FieldsealError::EncryptionFailure)?;

    let mut output = Vec::with_capacity(IV_LEN + sealed.len());
    output.extend_from_slice(&iv);
    output.extend_from_slice(&sealed);

    Ok(output)
}

/// Decrypt a ciphertext payload using AES-256-GCM.
///
/// Expects the input to be in the layout produced by `encrypt`:
/// IV (12 bytes) followed by ciphertext and GCM tag.
///
/// If the key is wrong or the ciphertext has been tampered with, the GCM
/// authentication check fails and this function returns an error. The caller
/// receives no partial plaintext.
pub(crate) fn decrypt(
    key_bytes: &[u8; KEY_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, FieldsealError> {
    if ciphertext.len() < IV_LEN {
        return Err(FieldsealError::DecryptionFailure);
    }

    let iv: [u8; IV_LEN] = ciphertext[..IV_LEN]
        .try_into()
        .map_err(|_| FieldsealError::DecryptionFailure)?;
    let nonce = Nonce::assume_unique_for_key(iv);

    let unbound = UnboundKey::new(ALGORITHM, key_bytes).map_err(|_| FieldsealError::InvalidKey)?;
    let key = LessSafeKey::new(unbound);

    let mut payload = ciphertext[IV_LEN..].to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut payload)
        .map_err(|_| FieldsealError::DecryptionFailure)?;

    Ok(plaintext.to_vec())
}
