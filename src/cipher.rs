//! Authenticated encryption using AES-256-CFB + HMAC-SHA512
//!
//! Every encryption draws a fresh 16-byte IV from the OS random source. The
//! ciphertext buffer carries the IV in front of the CFB output, and the tag is
//! an HMAC-SHA512 over that whole buffer (IV included) under the same key:
//!
//! - ciphertext: iv (16 bytes) || AES-256-CFB(plaintext)
//! - tag: HMAC-SHA512(key, ciphertext), 64 bytes
//!
//! Decryption verifies the tag in constant time before any plaintext is
//! produced.

use crate::error::{ConfsealError, ErrorCategory, ErrorKind, Result};
use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha512;
use zeroize::Zeroizing;

/// Length of a key in bytes
pub const KEY_LEN: usize = 32;

/// Length of the IV (the AES block size) in bytes
pub const IV_LEN: usize = 16;

/// Length of an HMAC-SHA512 tag in bytes
pub const TAG_LEN: usize = 64;

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;
type HmacSha512 = Hmac<Sha512>;

/// One authenticated ciphertext: the IV-prefixed ciphertext and its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Generate a fresh random key from the OS random source
pub fn generate_key() -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    OsRng.fill_bytes(&mut key[..]);
    key
}

/// Encrypt plaintext under `key` with a random IV
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Sealed> {
    check_key_len(key)?;

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    encrypt_with_iv(key, plaintext, &iv)
}

/// Encrypt plaintext under `key` using the provided IV
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt()` which generates a random IV.
pub fn encrypt_with_iv(key: &[u8], plaintext: &[u8], iv: &[u8; IV_LEN]) -> Result<Sealed> {
    check_key_len(key)?;

    let mut ciphertext = Vec::with_capacity(IV_LEN + plaintext.len());
    ciphertext.extend_from_slice(iv);
    ciphertext.extend_from_slice(plaintext);

    let stream = Aes256CfbEnc::new_from_slices(key, iv).map_err(|e| {
        ConfsealError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            format!("failed to initialize AES-CFB encryptor: {}", e),
        )
    })?;
    stream.encrypt(&mut ciphertext[IV_LEN..]);

    let tag = compute_tag(key, &ciphertext)?;

    Ok(Sealed { ciphertext, tag })
}

/// Verify `tag` over `ciphertext` and decrypt it
pub fn decrypt(key: &[u8], ciphertext: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
    check_key_len(key)?;

    if ciphertext.len() < IV_LEN {
        return Err(ConfsealError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidCipherText,
            "input likely truncated while reading iv",
        ));
    }

    let mut mac = new_mac(key)?;
    mac.update(ciphertext);
    mac.verify_slice(tag).map_err(|_| {
        ConfsealError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "HMAC failure, ciphertext has changed; this could indicate an incorrect key",
        )
    })?;

    let (iv, body) = ciphertext.split_at(IV_LEN);
    let mut plaintext = body.to_vec();
    let stream = Aes256CfbDec::new_from_slices(key, iv).map_err(|e| {
        ConfsealError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            format!("failed to initialize AES-CFB decryptor: {}", e),
        )
    })?;
    stream.decrypt(&mut plaintext);

    Ok(plaintext)
}

/// Fail with `InvalidKeyLength` unless `key` is exactly `KEY_LEN` bytes
pub fn check_key_len(key: &[u8]) -> Result<()> {
    if key.len() != KEY_LEN {
        return Err(ConfsealError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidKeyLength,
            format!("key must be {} bytes, got {}", KEY_LEN, key.len()),
        ));
    }
    Ok(())
}

fn compute_tag(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = new_mac(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn new_mac(key: &[u8]) -> Result<HmacSha512> {
    HmacSha512::new_from_slice(key).map_err(|e| {
        ConfsealError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            format!("failed to initialize HMAC-SHA512: {}", e),
        )
    })
}
