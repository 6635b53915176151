//! A single contact: name, phones, and an optional birthday.

use std::fmt;

use rolodex_common::error::InputError;
use rolodex_common::types::{Birthday, ContactName, Phone};
use serde::{Deserialize, Serialize};

/// Contact information stored in the address book.
///
/// Phones keep insertion order and never contain duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    name: ContactName,
    #[serde(default)]
    phones: Vec<Phone>,
    #[serde(default)]
    birthday: Option<Birthday>,
}

impl Record {
    /// Creates a record with no phones and no birthday.
    #[must_use]
    pub const fn new(name: ContactName) -> Self {
        Self {
            name,
            phones: Vec::new(),
            birthday: None,
        }
    }

    /// Returns the contact name.
    #[must_use]
    pub const fn name(&self) -> &ContactName {
        &self.name
    }

    /// Returns the phones in insertion order.
    #[must_use]
    pub fn phones(&self) -> &[Phone] {
        &self.phones
    }

    /// Returns the birthday, if one was set.
    #[must_use]
    pub const fn birthday(&self) -> Option<Birthday> {
        self.birthday
    }

    /// Adds a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidPhone`] for a malformed number and
    /// [`InputError::DuplicatePhone`] if it is already recorded.
    pub fn add_phone(&mut self, phone: &str) -> Result<(), InputError> {
        let phone = Phone::new(phone)?;
        if self.phones.contains(&phone) {
            return Err(InputError::DuplicatePhone);
        }
        self.phones.push(phone);
        Ok(())
    }

    /// Removes a phone number. Returns whether it was present.
    pub fn remove_phone(&mut self, phone: &str) -> bool {
        let before = self.phones.len();
        self.phones.retain(|p| p.as_str() != phone);
        self.phones.len() != before
    }

    /// Replaces `old` with `new`, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::PhoneNotFound`] if `old` is not recorded,
    /// [`InputError::InvalidPhone`] if `new` is malformed, and
    /// [`InputError::DuplicatePhone`] if `new` is already another entry.
    pub fn edit_phone(&mut self, old: &str, new: &str) -> Result<(), InputError> {
        let index = self
            .phones
            .iter()
            .position(|p| p.as_str() == old)
            .ok_or_else(|| InputError::PhoneNotFound(old.to_string()))?;
        let replacement = Phone::new(new)?;
        if old != new && self.phones.contains(&replacement) {
            return Err(InputError::DuplicatePhone);
        }
        self.phones[index] = replacement;
        Ok(())
    }

    /// Looks up a phone number.
    #[must_use]
    pub fn find_phone(&self, phone: &str) -> Option<&Phone> {
        self.phones.iter().find(|p| p.as_str() == phone)
    }

    /// Sets the birthday, returning the previous one.
    pub fn set_birthday(&mut self, birthday: Birthday) -> Option<Birthday> {
        self.birthday.replace(birthday)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phones: Vec<&str> = self.phones.iter().map(Phone::as_str).collect();
        write!(f, "Contact name: {}, phones: {}, birthday: ", self.name, phones.join("; "))?;
        match self.birthday {
            Some(b) => write!(f, "{b}"),
            None => write!(f, "None"),
        }
    }
}
