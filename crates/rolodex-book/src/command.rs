//! Tokenization of assistant input lines.

/// Commands understood by the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `hello` greeting.
    Hello,
    /// `add <name> [phone]`.
    Add,
    /// `change <name> <old phone> <new phone>`.
    Change,
    /// `delete <name>`.
    Delete,
    /// `phone <name>`.
    Phone,
    /// `all` lists every contact.
    All,
    /// `add-birthday <name> <DD.MM.YYYY>`.
    AddBirthday,
    /// `show-birthday <name>`.
    ShowBirthday,
    /// `birthdays [days]`.
    Birthdays,
    /// `close` or `exit` ends the session.
    Exit,
    /// Anything else, lower-cased.
    Unknown(String),
}

impl Command {
    /// Maps a keyword to a command. Matching is case-insensitive.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_lowercase().as_str() {
            "hello" => Self::Hello,
            "add" => Self::Add,
            "change" => Self::Change,
            "delete" => Self::Delete,
            "phone" => Self::Phone,
            "all" => Self::All,
            "add-birthday" => Self::AddBirthday,
            "show-birthday" => Self::ShowBirthday,
            "birthdays" => Self::Birthdays,
            "close" | "exit" => Self::Exit,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns `true` if the command can modify the address book.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Change | Self::Delete | Self::AddBirthday
        )
    }
}

/// A parsed input line: the command and its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine<'a> {
    /// Recognised command.
    pub command: Command,
    /// Whitespace-separated arguments following the command.
    pub args: Vec<&'a str>,
}

/// Splits an input line on whitespace into a command and its arguments.
///
/// Returns `None` for a blank line.
#[must_use]
pub fn parse_line(line: &str) -> Option<CommandLine<'_>> {
    let mut tokens = line.split_whitespace();
    let keyword = tokens.next()?;
    Some(CommandLine {
        command: Command::from_keyword(keyword),
        args: tokens.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_lowercases_command_only() {
        let parsed = parse_line("  ADD John 1234567890 ").expect("non-blank");
        assert_eq!(parsed.command, Command::Add);
        assert_eq!(parsed.args, ["John", "1234567890"]);
    }

    #[test]
    fn parse_line_blank_is_none() {
        assert!(parse_line("").is_none());
        assert!(parse_line(" \t ").is_none());
    }

    #[test]
    fn close_and_exit_both_end_session() {
        assert_eq!(Command::from_keyword("close"), Command::Exit);
        assert_eq!(Command::from_keyword("Exit"), Command::Exit);
    }

    #[test]
    fn unknown_keyword_is_preserved() {
        assert_eq!(
            Command::from_keyword("Fly"),
            Command::Unknown("fly".into())
        );
    }

    #[test]
    fn only_writes_are_mutating() {
        assert!(Command::AddBirthday.is_mutating());
        assert!(!Command::All.is_mutating());
        assert!(!Command::Exit.is_mutating());
    }
}
