//! Confseal - key-based encryption for configuration files
//!
//! Whole files are sealed with AES-256-CFB and an HMAC-SHA512 tag and stored
//! as a two-line text record. Individual values inside HCL documents can be
//! sealed in place, leaving the rest of the document untouched.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod document;
pub mod error;
pub mod file_ops;
pub mod hcl;
pub mod inline;
pub mod keysource;
pub mod wrap;
