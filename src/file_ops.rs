//! File encryption/decryption operations
//!
//! This module provides the file-level operations behind the command line:
//! whole-file wrap and unwrap, inline encryption of values inside HCL files,
//! and rendering a directory of (possibly encrypted) configuration files.

use crate::cipher;
use crate::error::{ConfsealError, ErrorCategory, ErrorKind, Result};
use crate::inline::{self, InlineReport};
use crate::keysource::KeyReader;
use crate::wrap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension of plain configuration files
pub const CONFIG_SUFFIX: &str = ".vc";

/// Extension appended to whole-file encrypted files
pub const ENCRYPTED_SUFFIX: &str = ".enc";

/// Encrypt a file with a key
///
/// Reads plaintext from `input_path`, encrypts it using a key from
/// `key_reader`, and writes the two-line wrapped record to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    key_reader: &mut dyn KeyReader,
) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let key = key_reader.read_key()?;
    let sealed =
        cipher::encrypt(&key, &plaintext).map_err(|e| e.with_context("encryption failed"))?;
    let wrapped = wrap::wrap_file(&sealed.ciphertext, &sealed.tag);
    write_file_secure(output_path, wrapped.as_bytes())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    debug!(input = %input_path.display(), output = %output_path.display(), "encrypted file");
    Ok(())
}

/// Decrypt a file with a key
///
/// Reads a wrapped record from `input_path`, verifies and decrypts it using a
/// key from `key_reader`, and writes the plaintext to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    key_reader: &mut dyn KeyReader,
) -> Result<()> {
    let wrapped = read_utf8(input_path)?;
    let key = key_reader.read_key()?;
    let plaintext = unwrap_and_decrypt(&wrapped, &key)?;
    write_file_secure(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    debug!(input = %input_path.display(), output = %output_path.display(), "decrypted file");
    Ok(())
}

/// Encrypt the values selected by `key_path` inside an HCL file
///
/// Values that are already encrypted are left alone. The result is written
/// atomically to `output_path`, which may be the same as `input_path`.
pub fn inline_encrypt_file(
    input_path: &Path,
    output_path: &Path,
    key_path: &str,
    key_reader: &mut dyn KeyReader,
) -> Result<InlineReport> {
    let source = read_utf8(input_path)?;
    let key = key_reader.read_key()?;
    let (rendered, report) = inline::inline_encrypt_str(&source, key_path, &key)
        .map_err(|e| e.with_context(format!("failed to encrypt values in {}", input_path.display())))?;

    for label in &report.skipped {
        info!(key = %label, "value appears to already be encrypted, skipping inline encryption");
    }
    if report.changed.is_empty() && report.skipped.is_empty() {
        info!(path = key_path, "no values matched key path");
    }

    write_file_atomic(output_path, rendered.as_bytes())?;
    debug!(output = %output_path.display(), encrypted = report.changed.len(), "wrote inline-encrypted file");
    Ok(report)
}

/// Decrypt the values selected by `key_path` inside an HCL file
///
/// Values that are not encrypted are left alone. The result is written
/// atomically to `output_path`, which may be the same as `input_path`.
pub fn inline_decrypt_file(
    input_path: &Path,
    output_path: &Path,
    key_path: &str,
    key_reader: &mut dyn KeyReader,
) -> Result<InlineReport> {
    let source = read_utf8(input_path)?;
    let key = key_reader.read_key()?;
    let (rendered, report) = inline::inline_decrypt_str(&source, key_path, &key)
        .map_err(|e| e.with_context(format!("failed to decrypt values in {}", input_path.display())))?;

    for label in &report.skipped {
        info!(key = %label, "value is not encrypted, leaving as is");
    }

    write_file_atomic(output_path, rendered.as_bytes())?;
    debug!(output = %output_path.display(), decrypted = report.changed.len(), "wrote inline-decrypted file");
    Ok(report)
}

/// Concatenate configuration files
///
/// With `file`, only that file is read. Otherwise every `*.vc` file in `dir`
/// is read, in file name order. When `key_reader` is given, every `*.vc.enc`
/// file in `dir` is decrypted and appended as well. Each file's contents are
/// followed by a newline.
pub fn render_configs(
    dir: &Path,
    file: Option<&Path>,
    key_reader: Option<&mut dyn KeyReader>,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    let plain = match file {
        Some(file) => vec![file.to_path_buf()],
        None => list_files_with_suffix(dir, CONFIG_SUFFIX)?,
    };
    for path in &plain {
        let contents = fs::read(path).map_err(|e| read_error(path, e))?;
        append_config(&mut out, &contents);
    }
    debug!(count = plain.len(), "read plain configuration files");

    if let Some(key_reader) = key_reader {
        let suffix = format!("{}{}", CONFIG_SUFFIX, ENCRYPTED_SUFFIX);
        let encrypted = list_files_with_suffix(dir, &suffix)?;
        if !encrypted.is_empty() {
            let key = key_reader.read_key()?;
            for path in &encrypted {
                let wrapped = read_utf8(path)?;
                let plaintext = unwrap_and_decrypt(&wrapped, &key)
                    .map_err(|e| e.with_context(format!("error decrypting {}", path.display())))?;
                append_config(&mut out, &plaintext);
            }
        }
        debug!(count = encrypted.len(), "read encrypted configuration files");
    }

    Ok(out)
}

/// `config.vc` becomes `config.vc.enc`
pub fn default_encrypted_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(ENCRYPTED_SUFFIX);
    PathBuf::from(name)
}

/// `config.vc.enc` becomes `config.vc`; anything else gets `.dec` appended
pub fn default_decrypted_path(input: &Path) -> PathBuf {
    match input.to_str().and_then(|s| s.strip_suffix(ENCRYPTED_SUFFIX)) {
        Some(stripped) if !stripped.is_empty() => PathBuf::from(stripped),
        _ => {
            let mut name = OsString::from(input.as_os_str());
            name.push(".dec");
            PathBuf::from(name)
        }
    }
}

/// Delete an input file once its output has been written
pub fn remove_input(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to delete {}", path.display()),
            e,
        )
    })?;
    debug!(path = %path.display(), "deleted input file");
    Ok(())
}

fn unwrap_and_decrypt(wrapped: &str, key: &[u8]) -> Result<Vec<u8>> {
    let sealed = wrap::unwrap_file(wrapped).map_err(|e| e.with_context("failed to unwrap"))?;
    cipher::decrypt(key, &sealed.ciphertext, &sealed.tag)
        .map_err(|e| e.with_context("failed to decrypt"))
}

fn append_config(out: &mut Vec<u8>, contents: &[u8]) {
    out.extend_from_slice(contents);
    out.push(b'\n');
}

fn list_files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| read_error(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| read_error(dir, e))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix));
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn read_utf8(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
    String::from_utf8(bytes).map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("{} is not valid UTF-8", path.display()),
            e,
        )
    })
}

/// Replace `path` atomically (tempfile + fsync + rename), mode 0o600 on Unix
///
/// Either the old file or the new file exists afterwards, never a partial one.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    // NamedTempFile is already created 0o600 on Unix.
    temp_file.persist(path).map_err(|e| {
        ConfsealError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// Write file with secure permissions (0o600 on Unix)
pub fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                ConfsealError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Io,
                    format!("failed to open {}", path.display()),
                    e,
                )
            })?;

        file.write_all(contents).map_err(|e| {
            ConfsealError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            ConfsealError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

fn read_error(path: &Path, err: io::Error) -> ConfsealError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    ConfsealError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
