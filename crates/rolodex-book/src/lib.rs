//! # rolodex-book
//!
//! The address book behind the Rolodex assistant: contact records with
//! phones and birthdays, the upcoming-birthday calendar, the command
//! interpreter shared by the console and TCP front ends, and the on-disk
//! JSON store.

pub mod assistant;
pub mod book;
pub mod command;
pub mod record;
pub mod storage;
