//! Key acquisition
//!
//! Keys travel as standard base64 text (the form `confseal keygen` prints) and
//! are decoded to exactly 32 raw bytes before they reach the cipher.

use crate::cipher::KEY_LEN;
use crate::error::{ConfsealError, ErrorCategory, ErrorKind, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Trait for obtaining raw key bytes from various sources
pub trait KeyReader {
    /// Read a 32-byte key.
    ///
    /// Returns the key wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_key(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Decode base64 key text, ignoring surrounding whitespace
pub fn decode_key(text: &str) -> Result<Zeroizing<Vec<u8>>> {
    let key = Zeroizing::new(STANDARD.decode(text.trim()).map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::KeyUnavailable,
            format!("error decoding base64 key: {}", e),
            e,
        )
    })?);
    if key.len() != KEY_LEN {
        return Err(ConfsealError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidKeyLength,
            format!("key must be {} bytes, got {}", KEY_LEN, key.len()),
        ));
    }
    Ok(key)
}

/// Encode raw key bytes as base64 text
pub fn encode_key(key: &[u8]) -> Zeroizing<String> {
    Zeroizing::new(STANDARD.encode(key))
}

/// Returns a fixed raw key (for testing)
pub struct ConstantKeyReader {
    key: Zeroizing<Vec<u8>>,
}

impl ConstantKeyReader {
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }
}

impl KeyReader for ConstantKeyReader {
    fn read_key(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.key).clone()))
    }
}

/// Decodes a base64 key given up front, e.g. on the command line
pub struct EncodedKeyReader {
    encoded: Zeroizing<String>,
}

impl EncodedKeyReader {
    pub fn new(encoded: String) -> Self {
        Self {
            encoded: Zeroizing::new(encoded),
        }
    }
}

impl KeyReader for EncodedKeyReader {
    fn read_key(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        decode_key(&self.encoded)
    }
}

/// Reads a base64 key from any io::Read source
pub struct ReaderKeyReader {
    reader: Box<dyn Read>,
}

impl ReaderKeyReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl KeyReader for ReaderKeyReader {
    fn read_key(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(String::new());
        self.reader.read_to_string(&mut data).map_err(|e| {
            ConfsealError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading key: {}", e),
                e,
            )
        })?;
        decode_key(&data)
    }
}

/// Reads a base64 key from the terminal with no echo
pub struct TerminalKeyReader;

impl TerminalKeyReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalKeyReader {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyReader for TerminalKeyReader {
    fn read_key(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(ConfsealError::with_kind(
                ErrorCategory::User,
                ErrorKind::KeyUnavailable,
                "cannot read key from terminal - stdin is not a terminal; use --key or --key-stdin",
            ));
        }

        io::stderr()
            .write_all(b"Please enter encryption key: ")
            .map_err(|e| {
                ConfsealError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;
        io::stderr().flush().map_err(|e| {
            ConfsealError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to flush prompt: {}", e),
                e,
            )
        })?;

        let encoded = Zeroizing::new(rpassword::read_password().map_err(|e| {
            ConfsealError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::KeyUnavailable,
                format!("error reading encryption key from terminal: {}", e),
                e,
            )
        })?);

        decode_key(&encoded)
    }
}
