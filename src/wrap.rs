//! Text wrapping for authenticated ciphertexts
//!
//! Two formats are produced, both ASCII and using standard (padded) base64:
//!
//! - file wrap, two lines with no trailing newline:
//!   `@encrypted_data(<ciphertext>)` then `@hmac(<tag>)`
//! - inline wrap, a single token that fits in one scalar document value:
//!   `@encrypted_data(<base64 of the whole file wrap>)`
//!
//! Markers are located independently of line order, so a reformatted file
//! wrap still unwraps.

use crate::cipher::{self, Sealed};
use crate::error::{ConfsealError, ErrorCategory, ErrorKind, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Marker carrying the (possibly nested) ciphertext payload
pub const CIPHER_MARKER: &str = "@encrypted_data";

/// Marker carrying the HMAC tag payload
pub const HMAC_MARKER: &str = "@hmac";

/// Wrap a ciphertext and its tag into the two-line file format
pub fn wrap_file(ciphertext: &[u8], tag: &[u8]) -> String {
    format!(
        "{}({})\n{}({})",
        CIPHER_MARKER,
        STANDARD.encode(ciphertext),
        HMAC_MARKER,
        STANDARD.encode(tag)
    )
}

/// Unwrap the two-line file format
pub fn unwrap_file(text: &str) -> Result<Sealed> {
    let ciphertext = decode_marker(text, CIPHER_MARKER, "cipher text")?;
    let tag = decode_marker(text, HMAC_MARKER, "HMAC")?;
    Ok(Sealed { ciphertext, tag })
}

/// Wrap a ciphertext and its tag into a single-line inline value
pub fn wrap_inline(ciphertext: &[u8], tag: &[u8]) -> String {
    let record = wrap_file(ciphertext, tag);
    format!("{}({})", CIPHER_MARKER, STANDARD.encode(record))
}

/// Unwrap a single-line inline value
pub fn unwrap_inline(text: &str) -> Result<Sealed> {
    let record = decode_marker(text, CIPHER_MARKER, "wrapped data")?;
    let record = String::from_utf8(record).map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedWrap,
            "wrapped data is not valid UTF-8",
            e,
        )
    })?;
    unwrap_file(&record)
}

/// Encrypt a string and return it as an inline value
pub fn encrypt_string(plaintext: &str, key: &[u8]) -> Result<String> {
    let sealed = cipher::encrypt(key, plaintext.as_bytes())?;
    Ok(wrap_inline(&sealed.ciphertext, &sealed.tag))
}

/// Decrypt an inline value back to its string
pub fn decrypt_string(text: &str, key: &[u8]) -> Result<String> {
    let sealed = unwrap_inline(text)?;
    let plaintext = cipher::decrypt(key, &sealed.ciphertext, &sealed.tag)?;
    String::from_utf8(plaintext).map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidPlaintext,
            "decrypted value is not valid UTF-8",
            e,
        )
    })
}

/// Whether `text` already carries an `@encrypted_data(...)` marker.
///
/// Only the marker shape is checked. A marker whose payload would fail to
/// unwrap still counts as encrypted.
pub fn is_encrypted_marker(text: &str) -> bool {
    extract_marker_payload(text, CIPHER_MARKER).is_some()
}

/// Returns the text between `<marker>(` and the last `)` on the same line.
///
/// The first occurrence of the marker that is closed on its own line wins.
/// The payload may be empty.
pub fn extract_marker_payload<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    text.match_indices(marker).find_map(|(start, _)| {
        let rest = text[start + marker.len()..].strip_prefix('(')?;
        let line = rest.split('\n').next().unwrap_or(rest);
        let end = line.rfind(')')?;
        Some(&line[..end])
    })
}

fn decode_marker(text: &str, marker: &str, what: &str) -> Result<Vec<u8>> {
    let payload = extract_marker_payload(text, marker)
        .filter(|payload| !payload.is_empty())
        .ok_or_else(|| {
            ConfsealError::with_kind(
                ErrorCategory::User,
                ErrorKind::MalformedWrap,
                format!("unwrapping {}: {}(...) marker not found", what, marker),
            )
        })?;
    STANDARD.decode(payload).map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedWrap,
            format!("decoding base64 {}: {}", what, e),
            e,
        )
    })
}
