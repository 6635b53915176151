//! Unified error types for the Rolodex workspace.
//!
//! [`RolodexError`] covers infrastructure failures (I/O, configuration,
//! recipe parsing, staging, process start). [`InputError`] covers the
//! user-facing validation failures of the assistant; those are rendered
//! back to the user as the reply and never end a session.

use std::path::PathBuf;

use thiserror::Error;

/// Validation failures caused by user input to the assistant.
///
/// The `Display` text of each variant is exactly the reply shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A phone number is not exactly ten ASCII digits.
    #[error("Phone number {0} is invalid")]
    InvalidPhone(String),

    /// A birthday is not a valid `DD.MM.YYYY` date.
    #[error("Invalid date format. Use DD.MM.YYYY")]
    InvalidBirthday,

    /// A contact name is empty or contains whitespace.
    #[error("Contact name {0:?} is invalid")]
    InvalidName(String),

    /// The phone is already recorded for this contact.
    #[error("This phone is already exist.")]
    DuplicatePhone,

    /// The phone to edit is not recorded for this contact.
    #[error("Phone number {0} not found.")]
    PhoneNotFound(String),

    /// A contact addressed by a mutating command does not exist.
    #[error("Contact: {0} does not exist.")]
    ContactMissing(String),

    /// A contact addressed by a lookup does not exist.
    #[error("Contact {0} not found.")]
    ContactNotFound(String),

    /// The command was given the wrong number of arguments.
    #[error("Arguments must be: {0}")]
    Usage(&'static str),

    /// The look-ahead window of `birthdays` is not a day count.
    #[error("Days must be a non-negative number, got {0}")]
    InvalidDays(String),
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum RolodexError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A stored address book is readable but its contents are inconsistent.
    #[error("corrupt address book: {message}")]
    Storage {
        /// Description of the inconsistency.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A build recipe could not be parsed or is incomplete.
    #[error("recipe error at line {line}: {message}")]
    Recipe {
        /// One-based line number (0 when the error concerns the whole recipe).
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// A staged file does not match the digest recorded for it.
    #[error("hash mismatch for {resource}: expected {expected}, got {actual}")]
    HashMismatch {
        /// File that failed validation.
        resource: String,
        /// Expected hash value.
        expected: String,
        /// Actual computed hash value.
        actual: String,
    },

    /// The entrypoint file is absent from the staged working directory.
    #[error("entrypoint not found: {path}")]
    EntrypointMissing {
        /// Path where the entrypoint was expected.
        path: PathBuf,
    },

    /// The entrypoint process could not be started.
    #[error("failed to start {program}: {source}")]
    Start {
        /// Program that was being executed.
        program: String,
        /// Underlying spawn error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// User input was rejected by the assistant.
    #[error(transparent)]
    Input(#[from] InputError),
}

impl RolodexError {
    /// Builds an [`RolodexError::Io`] bound to the path being accessed.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RolodexError>;
