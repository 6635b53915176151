//! Address book shared between a front end and its persistence.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rolodex_book::assistant::{Assistant, Reply};
use rolodex_book::book::AddressBook;
use rolodex_book::storage::{load_book, save_book};

/// An address book loaded from disk, guarded for use across threads.
#[derive(Debug)]
pub struct SharedBook {
    book: Mutex<AddressBook>,
    path: PathBuf,
    assistant: Assistant,
}

impl SharedBook {
    /// Loads the book at `path` (empty if the file does not exist yet).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn open(path: &Path, assistant: Assistant) -> anyhow::Result<Self> {
        let book = load_book(path).map_err(|e| anyhow::anyhow!("{e}"))?;
        tracing::info!(path = %path.display(), contacts = book.len(), "address book opened");
        Ok(Self {
            book: Mutex::new(book),
            path: path.to_path_buf(),
            assistant,
        })
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, AddressBook>> {
        self.book
            .lock()
            .map_err(|_| anyhow::anyhow!("address book lock poisoned"))
    }

    /// Handles one input line against the book, dated today.
    ///
    /// # Errors
    ///
    /// Returns an error only if the book lock is poisoned.
    pub fn respond(&self, line: &str) -> anyhow::Result<Option<Reply>> {
        let today = chrono::Local::now().date_naive();
        let mut book = self.lock()?;
        Ok(self.assistant.respond(&mut book, line, today))
    }

    /// Writes the book to its file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> anyhow::Result<()> {
        let book = self.lock()?;
        save_book(&self.path, &book).map_err(|e| anyhow::anyhow!("{e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respond_then_save_persists_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("book.json");
        let shared = SharedBook::open(&path, Assistant::default()).expect("open");

        let reply = shared.respond("add John 1234567890").expect("respond");
        assert_eq!(reply.map(|r| r.text).as_deref(), Some("Contact added."));
        shared.save().expect("save");

        let reopened = SharedBook::open(&path, Assistant::default()).expect("reopen");
        let reply = reopened.respond("phone John").expect("respond");
        assert_eq!(reply.map(|r| r.text).as_deref(), Some("1234567890"));
    }

    #[test]
    fn blank_line_gets_no_reply() {
        let dir = tempfile::tempdir().expect("tempdir");
        let shared =
            SharedBook::open(&dir.path().join("book.json"), Assistant::default()).expect("open");
        assert!(shared.respond("").expect("respond").is_none());
    }
}
