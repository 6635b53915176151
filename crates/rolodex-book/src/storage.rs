//! Persistent address book storage.
//!
//! The book is kept as a versioned JSON document. Saves go through a
//! sibling temporary file and a rename, so a crash mid-write leaves the
//! previous file intact.

use std::path::{Path, PathBuf};

use rolodex_common::constants::BOOK_FORMAT_VERSION;
use rolodex_common::error::{Result, RolodexError};
use serde::{Deserialize, Serialize};

use crate::book::AddressBook;
use crate::record::Record;

/// On-disk layout of the address book file.
#[derive(Debug, Serialize, Deserialize)]
struct BookFile {
    version: u32,
    contacts: Vec<Record>,
}

/// Loads the address book from disk.
///
/// A missing file yields an empty book.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, is not valid
/// JSON, has an unsupported version, or repeats a contact name.
pub fn load_book(path: &Path) -> Result<AddressBook> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no address book yet, starting empty");
        return Ok(AddressBook::new());
    }
    let text = std::fs::read_to_string(path).map_err(|e| RolodexError::io(path, e))?;
    let file: BookFile = serde_json::from_str(&text)?;
    if file.version != BOOK_FORMAT_VERSION {
        return Err(RolodexError::Storage {
            message: format!(
                "{}: unsupported address book version {} (expected {BOOK_FORMAT_VERSION})",
                path.display(),
                file.version
            ),
        });
    }
    let book = AddressBook::from_records(file.contacts)?;
    tracing::debug!(path = %path.display(), contacts = book.len(), "loaded address book");
    Ok(book)
}

/// Persists the address book to disk atomically.
///
/// # Errors
///
/// Returns an error if the parent directory or the file cannot be written.
pub fn save_book(path: &Path, book: &AddressBook) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| RolodexError::io(parent, e))?;
    }
    let file = BookFile {
        version: BOOK_FORMAT_VERSION,
        contacts: book.iter().cloned().collect(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json).map_err(|e| RolodexError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| RolodexError::io(path, e))?;
    tracing::debug!(path = %path.display(), contacts = book.len(), "saved address book");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use rolodex_common::types::ContactName;

    use super::*;

    fn sample_book() -> AddressBook {
        let mut record = Record::new(ContactName::new("John").expect("name"));
        record.add_phone("1234567890").expect("phone");
        let _ = record.set_birthday("15.06.1990".parse().expect("date"));
        let mut book = AddressBook::new();
        book.add_record(record);
        book.add_record(Record::new(ContactName::new("Ann").expect("name")));
        book
    }

    #[test]
    fn load_missing_file_returns_empty_book() {
        let dir = tempfile::tempdir().expect("tempdir");
        let book = load_book(&dir.path().join("none.json")).expect("load");
        assert!(book.is_empty());
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.json");
        let book = sample_book();
        save_book(&path, &book).expect("save");

        let loaded = load_book(&path).expect("load");
        assert_eq!(loaded, book);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("book.json");
        save_book(&path, &AddressBook::new()).expect("save");
        assert!(path.exists());
    }

    #[test]
    fn file_format_is_versioned_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.json");
        save_book(&path, &sample_book()).expect("save");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(value["version"], 1);
        assert_eq!(value["contacts"][0]["name"], "John");
        assert_eq!(value["contacts"][0]["phones"][0], "1234567890");
        assert_eq!(value["contacts"][0]["birthday"], "15.06.1990");
    }

    #[test]
    fn load_rejects_unknown_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.json");
        std::fs::write(&path, r#"{"version": 9, "contacts": []}"#).expect("write");
        let err = load_book(&path).unwrap_err();
        assert!(matches!(err, RolodexError::Storage { .. }), "got: {err}");
        assert!(err.to_string().contains("version 9"), "got: {err}");
    }

    #[test]
    fn load_rejects_invalid_phone_in_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.json");
        std::fs::write(
            &path,
            r#"{"version": 1, "contacts": [{"name": "X", "phones": ["12"]}]}"#,
        )
        .expect("write");
        assert!(matches!(
            load_book(&path),
            Err(RolodexError::Serialization { .. })
        ));
    }
}
