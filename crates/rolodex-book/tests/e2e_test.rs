//! End-to-end tests for an assistant session.
//!
//! These tests drive the assistant the way the console front end does:
//! 1. Load the book from disk (missing file starts empty)
//! 2. Feed command lines and collect replies
//! 3. Persist on exit and reload in a new session

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::NaiveDate;
use rolodex_book::assistant::{Assistant, Outcome};
use rolodex_book::storage::{load_book, save_book};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 12).expect("date")
}

/// Runs lines through a session, saving on exit like the console loop.
fn run_session(path: &std::path::Path, lines: &[&str]) -> Vec<String> {
    let assistant = Assistant::new(7);
    let mut book = load_book(path).expect("load");
    let mut replies = Vec::new();
    for line in lines {
        let Some(reply) = assistant.respond(&mut book, line, today()) else {
            continue;
        };
        replies.push(reply.text);
        if reply.outcome == Outcome::Exit {
            save_book(path, &book).expect("save");
            break;
        }
    }
    replies
}

#[test]
fn session_state_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("addressbook.json");

    let first = run_session(
        &path,
        &[
            "hello",
            "add John 1234567890",
            "add Jane 5555555555",
            "add-birthday Jane 16.06.1991",
            "exit",
        ],
    );
    assert_eq!(
        first,
        [
            "How can I help you?",
            "Contact added.",
            "Contact added.",
            "Birthday added.",
            "Good bye!",
        ]
    );

    let second = run_session(&path, &["all", "birthdays", "close"]);
    assert_eq!(
        second,
        [
            "Contact name: John, phones: 1234567890, birthday: None\n\
             Contact name: Jane, phones: 5555555555, birthday: 16.06.1991",
            "Jane: 17.06.2024",
            "Good bye!",
        ]
    );
}

#[test]
fn session_without_exit_does_not_persist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("addressbook.json");

    let _ = run_session(&path, &["add Temp 1234567890"]);
    assert!(!path.exists());

    let replies = run_session(&path, &["", "all", "exit"]);
    assert_eq!(replies, ["No contacts yet.", "Good bye!"]);
}

#[test]
fn errors_do_not_end_the_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("addressbook.json");

    let replies = run_session(
        &path,
        &[
            "phone Nobody",
            "add Bad 12",
            "unknown",
            "add Good 1234567890",
            "phone Good",
            "exit",
        ],
    );
    assert_eq!(
        replies,
        [
            "Contact: Nobody does not exist.",
            "Phone number 12 is invalid",
            "Invalid command.",
            "Contact added.",
            "1234567890",
            "Good bye!",
        ]
    );
}
