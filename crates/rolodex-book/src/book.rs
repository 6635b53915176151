//! The address book and its upcoming-birthday calendar.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rolodex_common::error::{InputError, Result, RolodexError};
use rolodex_common::types::{Birthday, ContactName};

use crate::record::Record;

/// A contact whose birthday falls inside the look-ahead window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingBirthday {
    /// Contact name.
    pub name: ContactName,
    /// Day to congratulate on; weekend birthdays move to the next Monday.
    pub congratulation_date: Birthday,
}

impl fmt::Display for UpcomingBirthday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.congratulation_date)
    }
}

/// Collection of records keyed by contact name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBook {
    records: Vec<Record>,
}

impl AddressBook {
    /// Creates an empty address book.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Builds a book from stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if two records share a name.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let mut book = Self::new();
        for record in records {
            if book.find(record.name().as_str()).is_some() {
                return Err(RolodexError::Storage {
                    message: format!("duplicate contact name: \"{}\"", record.name()),
                });
            }
            book.records.push(record);
        }
        Ok(book)
    }

    /// Inserts a record, replacing any record with the same name in place.
    pub fn add_record(&mut self, record: Record) {
        match self.records.iter_mut().find(|r| r.name() == record.name()) {
            Some(slot) => *slot = record,
            None => self.records.push(record),
        }
    }

    /// Looks up a record by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.name().as_str() == name)
    }

    /// Looks up a record by name for modification.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.name().as_str() == name)
    }

    /// Removes a record by name, returning it if it existed.
    pub fn delete(&mut self, name: &str) -> Option<Record> {
        let index = self.records.iter().position(|r| r.name().as_str() == name)?;
        Some(self.records.remove(index))
    }

    /// Describes the birthday of a contact.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::ContactNotFound`] if no such contact exists.
    pub fn show_birthday(&self, name: &str) -> std::result::Result<String, InputError> {
        let record = self
            .find(name)
            .ok_or_else(|| InputError::ContactNotFound(name.to_string()))?;
        Ok(record.birthday().map_or_else(
            || format!("{name}'s birthday is not specified."),
            |b| b.to_string(),
        ))
    }

    /// Lists contacts whose next birthday is at most `days` days after `today`.
    ///
    /// The anniversary of 29 February is celebrated on 28 February in
    /// non-leap years. Saturday and Sunday anniversaries are congratulated
    /// on the following Monday.
    #[must_use]
    pub fn upcoming_birthdays(&self, today: NaiveDate, days: u32) -> Vec<UpcomingBirthday> {
        let mut upcoming = Vec::new();
        for record in &self.records {
            let Some(birthday) = record.birthday() else {
                continue;
            };
            let mut next = anniversary(birthday.date(), today.year());
            if next < today {
                next = anniversary(birthday.date(), today.year() + 1);
            }
            let until = (next - today).num_days();
            if until > i64::from(days) {
                continue;
            }
            let congratulation_date = match next.weekday() {
                Weekday::Sat => next.checked_add_days(Days::new(2)).unwrap_or(next),
                Weekday::Sun => next.checked_add_days(Days::new(1)).unwrap_or(next),
                _ => next,
            };
            upcoming.push(UpcomingBirthday {
                name: record.name().clone(),
                congratulation_date: Birthday::from_date(congratulation_date),
            });
        }
        tracing::debug!(%today, days, found = upcoming.len(), "computed upcoming birthdays");
        upcoming
    }

    /// Iterates over records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the book holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn anniversary(date: NaiveDate, year: i32) -> NaiveDate {
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
        .unwrap_or(date)
}

impl fmt::Display for AddressBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{record}")?;
        }
        Ok(())
    }
}
