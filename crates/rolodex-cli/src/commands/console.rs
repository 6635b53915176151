//! `rolodex` / `rolodex console` — Interactive assistant on the terminal.

use std::io::{BufRead, Write};
use std::sync::Arc;

use rolodex_book::assistant::{Assistant, FAREWELL, GREETING, Outcome, PROMPT};
use rolodex_common::config::RolodexConfig;

use crate::session::SharedBook;

/// Executes the interactive console session.
///
/// The book is saved when the user exits, when stdin closes and on Ctrl+C.
///
/// # Errors
///
/// Returns an error if the book cannot be loaded or saved, or if the
/// terminal cannot be read.
pub fn execute(config: &RolodexConfig) -> anyhow::Result<()> {
    let shared = Arc::new(SharedBook::open(
        &config.data_file,
        Assistant::new(config.upcoming_days),
    )?);

    let on_interrupt = Arc::clone(&shared);
    ctrlc::set_handler(move || {
        if let Err(e) = on_interrupt.save() {
            tracing::error!(error = %e, "failed to save address book on interrupt");
        }
        #[allow(clippy::print_stdout)]
        {
            println!();
            println!("{FAREWELL}");
        }
        std::process::exit(0);
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    run_session(&shared, &mut stdin.lock(), &mut stdout)
}

/// Drives one session from `input` to `output` until exit or end of input.
fn run_session(
    shared: &SharedBook,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> anyhow::Result<()> {
    writeln!(output, "{GREETING}")?;
    let mut line = String::new();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            tracing::debug!("end of input");
            writeln!(output)?;
            writeln!(output, "{FAREWELL}")?;
            break;
        }

        let Some(reply) = shared.respond(&line)? else {
            continue;
        };
        writeln!(output, "{}", reply.text)?;
        match reply.outcome {
            Outcome::Continue => {}
            Outcome::Modified => shared.save()?,
            Outcome::Exit => break,
        }
    }
    shared.save()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(input: &str) -> (String, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let shared =
            SharedBook::open(&dir.path().join("book.json"), Assistant::default()).expect("open");
        let mut output = Vec::new();
        run_session(&shared, &mut input.as_bytes(), &mut output).expect("session");
        (String::from_utf8(output).expect("utf-8"), dir)
    }

    #[test]
    fn greets_and_says_goodbye() {
        let (out, _dir) = session("hello\nexit\n");
        assert!(out.starts_with(GREETING));
        assert!(out.contains("How can I help you?"));
        assert!(out.trim_end().ends_with(FAREWELL));
    }

    #[test]
    fn end_of_input_saves_the_book() {
        let (out, dir) = session("add Ann 0123456789\n");
        assert!(out.contains("Contact added."));
        assert!(out.trim_end().ends_with(FAREWELL));
        assert!(dir.path().join("book.json").exists());
    }

    #[test]
    fn input_after_exit_is_not_read() {
        let (out, _dir) = session("close\nadd Ann 0123456789\n");
        assert!(!out.contains("Contact added."));
    }
}
