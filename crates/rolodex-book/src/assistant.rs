//! Command interpreter shared by the console and TCP front ends.
//!
//! The [`Assistant`] turns one input line into one [`Reply`]. Input
//! validation failures become the reply text, so a session never ends
//! because of a mistyped command.

use chrono::NaiveDate;
use rolodex_common::error::InputError;
use rolodex_common::types::{ContactName, Phone};

use crate::book::AddressBook;
use crate::command::{Command, CommandLine, parse_line};
use crate::record::Record;

/// Banner printed when a session starts.
pub const GREETING: &str = "Welcome to the assistant bot!";

/// Prompt shown before each command in interactive sessions.
pub const PROMPT: &str = "Enter a command: ";

/// Reply to a session-ending command.
pub const FAREWELL: &str = "Good bye!";

/// What the front end should do after printing a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading; the book is unchanged.
    Continue,
    /// Keep reading; the book was modified and should be persisted.
    Modified,
    /// Persist the book and end the session.
    Exit,
}

/// Response to a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text shown to the user.
    pub text: String,
    /// Follow-up action for the front end.
    pub outcome: Outcome,
}

impl Reply {
    fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: Outcome::Continue,
        }
    }

    fn modified(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: Outcome::Modified,
        }
    }
}

type HandlerResult = Result<Reply, InputError>;

/// Interprets assistant commands against an address book.
#[derive(Debug, Clone, Copy)]
pub struct Assistant {
    upcoming_days: u32,
}

impl Assistant {
    /// Creates an assistant whose `birthdays` command looks `upcoming_days` ahead.
    #[must_use]
    pub const fn new(upcoming_days: u32) -> Self {
        Self { upcoming_days }
    }

    /// Handles one input line. Returns `None` for a blank line.
    ///
    /// `today` anchors the `birthdays` command.
    pub fn respond(&self, book: &mut AddressBook, line: &str, today: NaiveDate) -> Option<Reply> {
        let CommandLine { command, args } = parse_line(line)?;
        tracing::debug!(
            ?command,
            mutating = command.is_mutating(),
            argc = args.len(),
            "dispatching command"
        );

        let result = match command {
            Command::Hello => Ok(Reply::say("How can I help you?")),
            Command::Add => add_contact(&args, book),
            Command::Change => change_contact(&args, book),
            Command::Delete => delete_contact(&args, book),
            Command::Phone => find_phones(&args, book),
            Command::All => Ok(show_all(book)),
            Command::AddBirthday => add_birthday(&args, book),
            Command::ShowBirthday => show_birthday(&args, book),
            Command::Birthdays => self.birthdays(&args, book, today),
            Command::Exit => Ok(Reply {
                text: FAREWELL.to_string(),
                outcome: Outcome::Exit,
            }),
            Command::Unknown(_) => Ok(Reply::say("Invalid command.")),
        };

        Some(result.unwrap_or_else(|err| {
            tracing::debug!(error = %err, "command rejected");
            Reply::say(err.to_string())
        }))
    }

    fn birthdays(&self, args: &[&str], book: &AddressBook, today: NaiveDate) -> HandlerResult {
        let days = match args {
            [] => self.upcoming_days,
            [days] => days
                .parse()
                .map_err(|_| InputError::InvalidDays((*days).to_string()))?,
            _ => return Err(InputError::Usage("(optional <Days>).")),
        };
        let upcoming = book.upcoming_birthdays(today, days);
        if upcoming.is_empty() {
            return Ok(Reply::say("No upcoming birthdays yet."));
        }
        let lines: Vec<String> = upcoming.iter().map(ToString::to_string).collect();
        Ok(Reply::say(lines.join("\n")))
    }
}

impl Default for Assistant {
    fn default() -> Self {
        Self::new(rolodex_common::constants::DEFAULT_UPCOMING_DAYS)
    }
}

/// `add <name> [phone]`: creates the contact or adds a phone to it.
///
/// The phone is validated before a new record is inserted, so
/// `add Name badphone` reports the invalid phone and creates nothing; a
/// later `add Name` replies `Contact added.` rather than `Contact updated.`.
fn add_contact(args: &[&str], book: &mut AddressBook) -> HandlerResult {
    let (name, phone) = match args {
        [name] => (*name, None),
        [name, phone] => (*name, Some(*phone)),
        _ => return Err(InputError::Usage("<Name> (optional <Phone>).")),
    };

    if let Some(record) = book.find_mut(name) {
        if let Some(phone) = phone {
            record.add_phone(phone)?;
        }
        return Ok(Reply::modified("Contact updated."));
    }

    let mut record = Record::new(ContactName::new(name)?);
    if let Some(phone) = phone {
        record.add_phone(phone)?;
    }
    book.add_record(record);
    Ok(Reply::modified("Contact added."))
}

fn change_contact(args: &[&str], book: &mut AddressBook) -> HandlerResult {
    let [name, old, new] = args else {
        return Err(InputError::Usage("<Name> <Old phone> <New phone>."));
    };
    let record = book
        .find_mut(name)
        .ok_or_else(|| InputError::ContactMissing((*name).to_string()))?;
    record.edit_phone(old, new)?;
    Ok(Reply::modified("Phone changed successfully."))
}

fn delete_contact(args: &[&str], book: &mut AddressBook) -> HandlerResult {
    let [name] = args else {
        return Err(InputError::Usage("<Name>."));
    };
    let _ = book
        .delete(name)
        .ok_or_else(|| InputError::ContactMissing((*name).to_string()))?;
    Ok(Reply::modified("Contact deleted successfully."))
}

fn find_phones(args: &[&str], book: &AddressBook) -> HandlerResult {
    let [name] = args else {
        return Err(InputError::Usage("<Name>."));
    };
    let record = book
        .find(name)
        .ok_or_else(|| InputError::ContactMissing((*name).to_string()))?;
    if record.phones().is_empty() {
        return Ok(Reply::say("No phones yet."));
    }
    let phones: Vec<&str> = record.phones().iter().map(Phone::as_str).collect();
    Ok(Reply::say(phones.join(", ")))
}

fn show_all(book: &AddressBook) -> Reply {
    if book.is_empty() {
        return Reply::say("No contacts yet.");
    }
    Reply::say(book.to_string())
}

fn add_birthday(args: &[&str], book: &mut AddressBook) -> HandlerResult {
    let [name, birthday] = args else {
        return Err(InputError::Usage("<Name> <Birthday>."));
    };
    let record = book
        .find_mut(name)
        .ok_or_else(|| InputError::ContactMissing((*name).to_string()))?;
    let previous = record.set_birthday(birthday.parse()?);
    Ok(Reply::modified(if previous.is_some() {
        "Birthday updated."
    } else {
        "Birthday added."
    }))
}

fn show_birthday(args: &[&str], book: &AddressBook) -> HandlerResult {
    let [name] = args else {
        return Err(InputError::Usage("<Name>."));
    };
    Ok(Reply::say(book.show_birthday(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).expect("date")
    }

    fn say(book: &mut AddressBook, line: &str) -> Reply {
        Assistant::default()
            .respond(book, line, today())
            .expect("non-blank line")
    }

    fn text(book: &mut AddressBook, line: &str) -> String {
        say(book, line).text
    }

    #[test]
    fn hello_and_unknown() {
        let mut book = AddressBook::new();
        assert_eq!(text(&mut book, "hello"), "How can I help you?");
        assert_eq!(text(&mut book, "fly away"), "Invalid command.");
    }

    #[test]
    fn blank_line_has_no_reply() {
        let mut book = AddressBook::new();
        assert!(Assistant::default().respond(&mut book, "   ", today()).is_none());
    }

    #[test]
    fn add_then_update_contact() {
        let mut book = AddressBook::new();
        let reply = say(&mut book, "add John 1234567890");
        assert_eq!(reply.text, "Contact added.");
        assert_eq!(reply.outcome, Outcome::Modified);
        assert_eq!(text(&mut book, "add John 5555555555"), "Contact updated.");
        assert_eq!(text(&mut book, "phone John"), "1234567890, 5555555555");
    }

    #[test]
    fn add_with_invalid_phone_leaves_book_unchanged() {
        let mut book = AddressBook::new();
        let reply = say(&mut book, "add John 12");
        assert_eq!(reply.text, "Phone number 12 is invalid");
        assert_eq!(reply.outcome, Outcome::Continue);
        assert!(book.is_empty());
    }

    #[test]
    fn add_after_rejected_phone_creates_the_contact() {
        let mut book = AddressBook::new();
        let _ = say(&mut book, "add John abc");
        let reply = say(&mut book, "add John");
        assert_eq!(reply.text, "Contact added.");
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn add_duplicate_phone_is_rejected() {
        let mut book = AddressBook::new();
        let _ = say(&mut book, "add John 1234567890");
        assert_eq!(
            text(&mut book, "add John 1234567890"),
            "This phone is already exist."
        );
    }

    #[test]
    fn arity_errors_name_the_expected_arguments() {
        let mut book = AddressBook::new();
        assert_eq!(
            text(&mut book, "add"),
            "Arguments must be: <Name> (optional <Phone>)."
        );
        assert_eq!(
            text(&mut book, "change John 1234567890"),
            "Arguments must be: <Name> <Old phone> <New phone>."
        );
        assert_eq!(text(&mut book, "delete"), "Arguments must be: <Name>.");
        assert_eq!(
            text(&mut book, "add-birthday John"),
            "Arguments must be: <Name> <Birthday>."
        );
    }

    #[test]
    fn change_phone_flow() {
        let mut book = AddressBook::new();
        let _ = say(&mut book, "add John 1234567890");
        assert_eq!(
            text(&mut book, "change John 1234567890 0987654321"),
            "Phone changed successfully."
        );
        assert_eq!(
            text(&mut book, "change John 1234567890 0987654321"),
            "Phone number 1234567890 not found."
        );
        assert_eq!(
            text(&mut book, "change Ghost 1234567890 0987654321"),
            "Contact: Ghost does not exist."
        );
    }

    #[test]
    fn phone_without_numbers() {
        let mut book = AddressBook::new();
        let _ = say(&mut book, "add Solo");
        assert_eq!(text(&mut book, "phone Solo"), "No phones yet.");
    }

    #[test]
    fn delete_contact_flow() {
        let mut book = AddressBook::new();
        let _ = say(&mut book, "add John");
        assert_eq!(text(&mut book, "delete John"), "Contact deleted successfully.");
        assert_eq!(text(&mut book, "delete John"), "Contact: John does not exist.");
    }

    #[test]
    fn all_lists_contacts() {
        let mut book = AddressBook::new();
        assert_eq!(text(&mut book, "all"), "No contacts yet.");
        let _ = say(&mut book, "add John 1234567890");
        assert_eq!(
            text(&mut book, "all"),
            "Contact name: John, phones: 1234567890, birthday: None"
        );
    }

    #[test]
    fn birthday_flow() {
        let mut book = AddressBook::new();
        assert_eq!(
            text(&mut book, "add-birthday John 15.06.1990"),
            "Contact: John does not exist."
        );
        let _ = say(&mut book, "add John");
        assert_eq!(
            text(&mut book, "show-birthday John"),
            "John's birthday is not specified."
        );
        assert_eq!(
            text(&mut book, "add-birthday John 1990-06-15"),
            "Invalid date format. Use DD.MM.YYYY"
        );
        assert_eq!(text(&mut book, "add-birthday John 15.06.1990"), "Birthday added.");
        assert_eq!(text(&mut book, "add-birthday John 16.06.1990"), "Birthday updated.");
        assert_eq!(text(&mut book, "show-birthday John"), "16.06.1990");
        assert_eq!(text(&mut book, "show-birthday Ghost"), "Contact Ghost not found.");
    }

    #[test]
    fn birthdays_uses_window_and_optional_days() {
        let mut book = AddressBook::new();
        assert_eq!(text(&mut book, "birthdays"), "No upcoming birthdays yet.");
        let _ = say(&mut book, "add John");
        let _ = say(&mut book, "add-birthday John 15.06.1990");
        let _ = say(&mut book, "add Far");
        let _ = say(&mut book, "add-birthday Far 01.07.1990");

        assert_eq!(text(&mut book, "birthdays"), "John: 17.06.2024");
        assert_eq!(
            text(&mut book, "birthdays 30"),
            "John: 17.06.2024\nFar: 01.07.2024"
        );
        assert_eq!(
            text(&mut book, "birthdays soon"),
            "Days must be a non-negative number, got soon"
        );
    }

    #[test]
    fn exit_ends_session() {
        let mut book = AddressBook::new();
        let reply = say(&mut book, "close");
        assert_eq!(reply.text, FAREWELL);
        assert_eq!(reply.outcome, Outcome::Exit);
    }
}
