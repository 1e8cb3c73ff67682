//! Selective encryption of individual values inside a document
//!
//! A key path such as `secret/data` selects items level by level: at each
//! level only items carrying the next label are kept, and the working set
//! becomes the union of their children. The string leaves of the items left
//! at the end are the values that get encrypted (or decrypted) in place.

use crate::cipher;
use crate::document::{Document, ItemId};
use crate::error::Result;
use crate::hcl::HclDocument;
use crate::wrap;

/// What an inline pass did, by item label, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineReport {
    /// Items whose values were rewritten.
    pub changed: Vec<String>,
    /// Items whose values were left alone: already encrypted when
    /// encrypting, not encrypted when decrypting.
    pub skipped: Vec<String>,
}

/// Items selected by `key_path`, in document order.
pub fn select_items<D: Document + ?Sized>(doc: &D, key_path: &str) -> Vec<ItemId> {
    let mut working: Vec<ItemId> = doc.top_level().to_vec();
    for segment in key_path.split('/') {
        working = working
            .iter()
            .filter(|&&item| doc.has_label(item, segment))
            .flat_map(|&item| doc.children(item).iter().copied())
            .collect();
    }
    working
}

/// Encrypt every not-yet-encrypted leaf selected by `key_path`.
///
/// Leaves that already carry an `@encrypted_data(...)` marker are skipped.
/// The first failure aborts the walk; leaves rewritten before it stay
/// rewritten.
pub fn inline_encrypt_fields<D: Document + ?Sized>(
    doc: &mut D,
    key_path: &str,
    key: &[u8],
) -> Result<InlineReport> {
    cipher::check_key_len(key)?;

    let mut report = InlineReport::default();
    for item in select_items(doc, key_path) {
        let label = item_label(doc, item);
        for leaf in doc.leaves(item).to_vec() {
            let value = doc.leaf_value(leaf);
            if wrap::is_encrypted_marker(value) {
                report.skipped.push(label.clone());
                continue;
            }
            let encrypted = wrap::encrypt_string(value, key)?;
            doc.set_leaf_value(leaf, &encrypted);
            report.changed.push(label.clone());
        }
    }
    Ok(report)
}

/// Decrypt every encrypted leaf selected by `key_path`.
///
/// Plain leaves are skipped. A leaf that looks encrypted but fails to unwrap
/// or authenticate aborts the walk.
pub fn inline_decrypt_fields<D: Document + ?Sized>(
    doc: &mut D,
    key_path: &str,
    key: &[u8],
) -> Result<InlineReport> {
    cipher::check_key_len(key)?;

    let mut report = InlineReport::default();
    for item in select_items(doc, key_path) {
        let label = item_label(doc, item);
        for leaf in doc.leaves(item).to_vec() {
            let value = doc.leaf_value(leaf);
            if !wrap::is_encrypted_marker(value) {
                report.skipped.push(label.clone());
                continue;
            }
            let plaintext = wrap::decrypt_string(value, key)
                .map_err(|e| e.with_context(format!("failed to decrypt {}", label)))?;
            doc.set_leaf_value(leaf, &plaintext);
            report.changed.push(label.clone());
        }
    }
    Ok(report)
}

/// Parse `source` as HCL, encrypt the selected leaves, and render it back.
pub fn inline_encrypt_str(source: &str, key_path: &str, key: &[u8]) -> Result<(String, InlineReport)> {
    let mut doc = HclDocument::parse(source)?;
    let report = inline_encrypt_fields(&mut doc, key_path, key)?;
    Ok((doc.render(), report))
}

/// Parse `source` as HCL, decrypt the selected leaves, and render it back.
pub fn inline_decrypt_str(source: &str, key_path: &str, key: &[u8]) -> Result<(String, InlineReport)> {
    let mut doc = HclDocument::parse(source)?;
    let report = inline_decrypt_fields(&mut doc, key_path, key)?;
    Ok((doc.render(), report))
}

fn item_label<D: Document + ?Sized>(doc: &D, item: ItemId) -> String {
    doc.labels(item).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::KEY_LEN;
    use crate::error::ErrorKind;

    const KEY: [u8; KEY_LEN] = [0u8; KEY_LEN];

    const SECRETS: &str = r#"# Secrets for the test environment
secret "test" {
  path = "secret/test"

  data {
    value  = "test_value1"
    value2 = "test_value2"
    ttl    = 3600
  }
}

secret "other" {
  path = "secret/other"
  data {
    token = "abc"
  }
}

mount "secret" {
  data {
    value = "not selected"
  }
}
"#;

    fn data_values(doc: &HclDocument) -> Vec<String> {
        select_items(doc, "secret/data")
            .into_iter()
            .flat_map(|item| doc.leaves(item).to_vec())
            .map(|leaf| doc.leaf_value(leaf).to_string())
            .collect()
    }

    #[test]
    fn test_select_items_follows_labels() {
        let doc = HclDocument::parse(SECRETS).unwrap();

        let labels: Vec<String> = select_items(&doc, "secret/data")
            .into_iter()
            .map(|i| item_label(&doc, i))
            .collect();
        assert_eq!(labels, ["value", "value2", "ttl", "token"]);

        let labels: Vec<String> = select_items(&doc, "secret")
            .into_iter()
            .map(|i| item_label(&doc, i))
            .collect();
        assert_eq!(labels, ["path", "data", "path", "data"]);
    }

    #[test]
    fn test_select_items_by_block_label() {
        let doc = HclDocument::parse(SECRETS).unwrap();
        assert!(select_items(&doc, "other/data").is_empty());

        let selected = select_items(&doc, "\"other\"/data");
        assert_eq!(selected.len(), 1);
        assert_eq!(doc.labels(selected[0]), ["token"]);
    }

    #[test]
    fn test_select_items_no_match() {
        let doc = HclDocument::parse(SECRETS).unwrap();
        assert!(select_items(&doc, "nope/data").is_empty());
        assert!(select_items(&doc, "secret/data/value").is_empty());
        assert!(select_items(&doc, "").is_empty());
    }

    #[test]
    fn test_encrypt_fields() {
        let mut doc = HclDocument::parse(SECRETS).unwrap();
        let report = inline_encrypt_fields(&mut doc, "secret/data", &KEY).unwrap();

        assert_eq!(report.changed, ["value", "value2", "token"]);
        assert!(report.skipped.is_empty());

        let values = data_values(&doc);
        assert_eq!(values.len(), 3);
        let decrypted: Vec<String> = values
            .iter()
            .map(|v| {
                assert!(wrap::is_encrypted_marker(v));
                wrap::decrypt_string(v, &KEY).unwrap()
            })
            .collect();
        assert_eq!(decrypted, ["test_value1", "test_value2", "abc"]);

        let rendered = doc.render();
        assert!(rendered.contains("path = \"secret/test\""));
        assert!(rendered.contains("ttl    = 3600"));
        assert!(rendered.contains("value = \"not selected\""));
        assert!(rendered.starts_with("# Secrets for the test environment\nsecret \"test\" {"));
    }

    #[test]
    fn test_only_selected_lines_change() {
        let (rendered, _) = inline_encrypt_str(SECRETS, "secret/data", &KEY).unwrap();

        let before: Vec<&str> = SECRETS.lines().collect();
        let after: Vec<&str> = rendered.lines().collect();
        assert_eq!(before.len(), after.len());

        let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
        assert_eq!(changed, [5, 6, 14]);
        assert!(after[5].starts_with("    value  = \"@encrypted_data("));
        assert!(after[14].starts_with("    token = \"@encrypted_data("));
    }

    #[test]
    fn test_encrypt_is_idempotent() {
        let (first, _) = inline_encrypt_str(SECRETS, "secret/data", &KEY).unwrap();
        let (second, report) = inline_encrypt_str(&first, "secret/data", &KEY).unwrap();

        assert_eq!(first, second);
        assert!(report.changed.is_empty());
        assert_eq!(report.skipped, ["value", "value2", "token"]);
    }

    #[test]
    fn test_partially_encrypted_document() {
        let src = "secret \"x\" {\n  data {\n    a = \"@encrypted_data(garbage)\"\n    b = \"plain\"\n  }\n}\n";
        let (rendered, report) = inline_encrypt_str(src, "secret/data", &KEY).unwrap();

        assert_eq!(report.changed, ["b"]);
        assert_eq!(report.skipped, ["a"]);
        assert!(rendered.contains("a = \"@encrypted_data(garbage)\""));
        assert!(!rendered.contains("\"plain\""));
    }

    #[test]
    fn test_list_leaves_encrypted() {
        let src = "secret \"x\" {\n  data {\n    keys = [\"k1\", \"k2\"]\n  }\n}\n";
        let (rendered, report) = inline_encrypt_str(src, "secret/data", &KEY).unwrap();
        assert_eq!(report.changed, ["keys", "keys"]);

        let (restored, _) = inline_decrypt_str(&rendered, "secret/data", &KEY).unwrap();
        assert_eq!(restored, src);
    }

    #[test]
    fn test_decrypt_restores_document() {
        let (encrypted, _) = inline_encrypt_str(SECRETS, "secret/data", &KEY).unwrap();
        let (decrypted, report) = inline_decrypt_str(&encrypted, "secret/data", &KEY).unwrap();

        assert_eq!(decrypted, SECRETS);
        assert_eq!(report.changed, ["value", "value2", "token"]);
    }

    #[test]
    fn test_unicode_escape_encrypts_decoded_value() {
        let src = "secret \"x\" {\n  data {\n    value = \"caf\\u00e9\"\n  }\n}\n";
        let (encrypted, report) = inline_encrypt_str(src, "secret/data", &KEY).unwrap();
        assert_eq!(report.changed, ["value"]);

        let doc = HclDocument::parse(&encrypted).unwrap();
        let values = data_values(&doc);
        assert_eq!(wrap::decrypt_string(&values[0], &KEY).unwrap(), "caf\u{e9}");

        let (revealed, _) = inline_decrypt_str(&encrypted, "secret/data", &KEY).unwrap();
        assert_eq!(revealed, "secret \"x\" {\n  data {\n    value = \"caf\u{e9}\"\n  }\n}\n");
        let doc = HclDocument::parse(&revealed).unwrap();
        assert_eq!(data_values(&doc), ["caf\u{e9}"]);
    }

    #[test]
    fn test_number_and_bool_literals_left_alone() {
        let src = "secret \"x\" {\n  data {\n    ttl = 3600\n    enabled = true\n    token = \"t\"\n  }\n}\n";
        let (rendered, report) = inline_encrypt_str(src, "secret/data", &KEY).unwrap();

        assert_eq!(report.changed, ["token"]);
        assert!(report.skipped.is_empty());
        assert!(rendered.contains("    ttl = 3600\n    enabled = true\n"));
        assert!(!rendered.contains("\"t\""));
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let (encrypted, _) = inline_encrypt_str(SECRETS, "secret/data", &KEY).unwrap();
        let err = inline_decrypt_str(&encrypted, "secret/data", &[9u8; KEY_LEN])
            .expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_no_match_is_not_an_error() {
        let (rendered, report) = inline_encrypt_str(SECRETS, "missing/path", &KEY).unwrap();
        assert_eq!(rendered, SECRETS);
        assert_eq!(report, InlineReport::default());
    }

    #[test]
    fn test_bad_key_rejected_even_without_matches() {
        let mut doc = HclDocument::parse(SECRETS).unwrap();
        let err = inline_encrypt_fields(&mut doc, "missing/path", &[0u8; 33])
            .expect_err("expected key length error");
        assert_eq!(err.kind, Some(ErrorKind::InvalidKeyLength));
        assert_eq!(doc.render(), SECRETS);
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = inline_encrypt_str("secret \"x\" {", "secret", &KEY).expect_err("expected parse error");
        assert_eq!(err.kind, Some(ErrorKind::Parse));
    }
}
