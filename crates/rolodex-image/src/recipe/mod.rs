//! Build recipe parser built on `nom`.
//!
//! Understands the `Dockerfile` subset needed to describe this project's
//! image: `FROM`, `WORKDIR`, `COPY`, `RUN`, `ENV`, `EXPOSE`, `USER`,
//! `ENTRYPOINT` and `CMD`. Comments, blank lines and `\` continuations are
//! handled before instructions are parsed. Shell-form `ENTRYPOINT`/`CMD`
//! are normalized to exec form (`/bin/sh -c ...`).

pub mod ast;
pub mod contract;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{
        escaped_transform, is_not, tag, tag_no_case, take_till, take_till1, take_while1,
    },
    character::complete::{alpha1, char, digit1, multispace0, multispace1},
    combinator::{all_consuming, opt, value},
    multi::{many0, many1},
    sequence::{delimited, preceded, separated_pair, terminated},
};
use rolodex_common::constants::{BIN_NAME, DEFAULT_PORT, IMAGE_WORKDIR};
use rolodex_common::error::{Result, RolodexError};

pub use self::ast::{ExposedPort, Instruction, Protocol, Recipe};
pub use self::contract::{CopyStep, RuntimeContract};

type Flag<'a> = (&'a str, Option<&'a str>);

const fn is_space(c: char) -> bool {
    c.is_ascii_whitespace()
}

const fn is_flag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

const fn is_env_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A whitespace-delimited word.
fn word(input: &str) -> IResult<&str, &str> {
    terminated(take_till1(is_space), multispace0).parse(input)
}

/// A `--name[=value]` flag.
fn flag(input: &str) -> IResult<&str, Flag<'_>> {
    terminated(
        preceded(
            tag("--"),
            (
                take_while1(is_flag_char),
                opt(preceded(char('='), take_till1(is_space))),
            ),
        ),
        multispace0,
    )
    .parse(input)
}

/// Leading flags followed by at least one word.
fn flagged_words(input: &str) -> IResult<&str, (Vec<Flag<'_>>, Vec<&str>)> {
    all_consuming((many0(flag), many1(word))).parse(input)
}

/// `<image> [AS <alias>]`.
fn from_args(input: &str) -> IResult<&str, (Vec<Flag<'_>>, &str, Option<&str>)> {
    all_consuming((
        many0(flag),
        word,
        opt(preceded(terminated(tag_no_case("AS"), multispace1), word)),
    ))
    .parse(input)
}

/// `<port>[/<protocol>]`.
fn port_spec(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    terminated((digit1, opt(preceded(char('/'), alpha1))), multispace0).parse(input)
}

/// A double-quoted value; `\"` and `\\` escape a quote and a backslash.
fn quoted_value(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        opt(escaped_transform(
            is_not("\\\""),
            '\\',
            alt((value("\\", tag("\\")), value("\"", tag("\"")))),
        ))
        .map(Option::unwrap_or_default),
        char('"'),
    )
    .parse(input)
}

/// A bare or double-quoted `ENV` value.
fn env_value(input: &str) -> IResult<&str, String> {
    alt((quoted_value, take_till(is_space).map(str::to_string))).parse(input)
}

/// `KEY=value`.
fn env_pair(input: &str) -> IResult<&str, (&str, String)> {
    terminated(
        separated_pair(take_while1(is_env_key_char), char('='), env_value),
        multispace0,
    )
    .parse(input)
}

/// Instruction keyword and the remaining argument text.
fn instruction_head(input: &str) -> IResult<&str, &str> {
    terminated(alpha1, multispace0).parse(input)
}

/// Joins `\` continuations and drops comments and blank lines.
///
/// Returns each logical line with the one-based number of its first line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    for (idx, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.starts_with('#') || (current.is_empty() && trimmed.is_empty()) {
            continue;
        }
        if current.is_empty() {
            start = idx + 1;
        }
        if let Some(body) = trimmed.strip_suffix('\\') {
            current.push_str(body.trim_end());
            current.push(' ');
        } else {
            current.push_str(trimmed);
            lines.push((start, std::mem::take(&mut current)));
        }
    }
    let tail = current.trim_end();
    if !tail.is_empty() {
        lines.push((start, tail.to_string()));
    }
    lines
}

const fn recipe_err(line: usize, message: String) -> RolodexError {
    RolodexError::Recipe { line, message }
}

fn malformed(line: usize, keyword: &str, args: &str) -> RolodexError {
    recipe_err(line, format!("malformed {keyword} arguments: {args:?}"))
}

/// Parses `ENTRYPOINT`/`CMD` arguments in exec (`["a", "b"]`) or shell form.
fn command_args(line: usize, keyword: &str, args: &str) -> Result<Vec<String>> {
    if args.starts_with('[') {
        let parsed: Vec<String> =
            serde_json::from_str(args).map_err(|e| recipe_err(line, format!("{keyword}: {e}")))?;
        if parsed.is_empty() {
            return Err(recipe_err(line, format!("{keyword} has an empty exec form")));
        }
        Ok(parsed)
    } else if args.is_empty() {
        Err(recipe_err(line, format!("{keyword} requires a command")))
    } else {
        Ok(vec!["/bin/sh".into(), "-c".into(), args.to_string()])
    }
}

fn parse_copy(line: usize, args: &str) -> Result<Instruction> {
    let (_, (flags, mut words)) = flagged_words(args).map_err(|_| malformed(line, "COPY", args))?;
    if words.len() < 2 {
        return Err(recipe_err(
            line,
            "COPY requires at least one source and a destination".into(),
        ));
    }
    let mut from = None;
    for (name, value) in flags {
        match (name, value) {
            ("from", Some(stage)) => from = Some(stage.to_string()),
            ("chown" | "chmod" | "link", _) => {
                tracing::debug!(line, flag = name, "ignoring COPY flag");
            }
            _ => return Err(recipe_err(line, format!("unsupported COPY flag --{name}"))),
        }
    }
    let dest = words.pop().map(str::to_string).unwrap_or_default();
    Ok(Instruction::Copy {
        from,
        sources: words.into_iter().map(str::to_string).collect(),
        dest,
    })
}

fn parse_env(line: usize, args: &str) -> Result<Instruction> {
    let first = args.split_ascii_whitespace().next().unwrap_or_default();
    if !first.contains('=') {
        // Legacy `ENV KEY value with spaces` form.
        let (key, value) = args
            .split_once(is_space)
            .ok_or_else(|| malformed(line, "ENV", args))?;
        return Ok(Instruction::Env(vec![(
            key.to_string(),
            value.trim().to_string(),
        )]));
    }
    let (_, pairs) = all_consuming(many1(env_pair))
        .parse(args)
        .map_err(|_| malformed(line, "ENV", args))?;
    Ok(Instruction::Env(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    ))
}

fn parse_expose(line: usize, args: &str) -> Result<Instruction> {
    let (_, specs) = all_consuming(many1(port_spec))
        .parse(args)
        .map_err(|_| malformed(line, "EXPOSE", args))?;
    let mut ports = Vec::with_capacity(specs.len());
    for (number, protocol) in specs {
        let port: u16 = number
            .parse()
            .map_err(|_| recipe_err(line, format!("port out of range: {number}")))?;
        let protocol = match protocol.map(str::to_ascii_lowercase).as_deref() {
            None | Some("tcp") => Protocol::Tcp,
            Some("udp") => Protocol::Udp,
            Some(other) => return Err(recipe_err(line, format!("unknown protocol: {other}"))),
        };
        ports.push(ExposedPort { port, protocol });
    }
    Ok(Instruction::Expose(ports))
}

fn parse_instruction(line: usize, text: &str) -> Result<Instruction> {
    let (args, keyword) =
        instruction_head(text).map_err(|_| recipe_err(line, format!("expected instruction, got {text:?}")))?;
    let args = args.trim();
    let keyword = keyword.to_ascii_uppercase();
    let require = |what: &str| -> Result<String> {
        if args.is_empty() {
            Err(recipe_err(line, format!("{keyword} requires {what}")))
        } else {
            Ok(args.to_string())
        }
    };

    match keyword.as_str() {
        "FROM" => {
            let (_, (_, image, alias)) = from_args(args).map_err(|_| malformed(line, "FROM", args))?;
            Ok(Instruction::From {
                image: image.to_string(),
                alias: alias.map(str::to_string),
            })
        }
        "WORKDIR" => Ok(Instruction::Workdir(require("a path")?)),
        "COPY" => parse_copy(line, args),
        "RUN" => Ok(Instruction::Run(require("a command")?)),
        "ENV" => parse_env(line, args),
        "EXPOSE" => parse_expose(line, args),
        "USER" => Ok(Instruction::User(require("a user")?)),
        "ENTRYPOINT" => Ok(Instruction::Entrypoint(command_args(line, "ENTRYPOINT", args)?)),
        "CMD" => Ok(Instruction::Cmd(command_args(line, "CMD", args)?)),
        other => Err(recipe_err(line, format!("unsupported instruction {other}"))),
    }
}

impl Recipe {
    /// Parses recipe text.
    ///
    /// # Errors
    ///
    /// Returns [`RolodexError::Recipe`] naming the first offending line.
    pub fn parse(text: &str) -> Result<Self> {
        let mut instructions = Vec::new();
        for (line, logical) in logical_lines(text) {
            instructions.push(parse_instruction(line, &logical)?);
        }
        tracing::debug!(instructions = instructions.len(), "parsed recipe");
        Ok(Self { instructions })
    }

    /// Reads and parses a recipe file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading recipe");
        let text = std::fs::read_to_string(path).map_err(|e| RolodexError::io(path, e))?;
        Self::parse(&text)
    }

    /// Renders the recipe as `Dockerfile` text.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// The recipe that packages this workspace.
    ///
    /// A builder stage compiles the binary; the runtime stage stages the
    /// build context into the working directory, places the binary next to
    /// it, declares the service port, and runs the binary with no arguments.
    #[must_use]
    pub fn default_for_workspace() -> Self {
        let entry = format!("./{BIN_NAME}");
        Self {
            instructions: vec![
                Instruction::From {
                    image: "rust:1.86-slim".into(),
                    alias: Some("builder".into()),
                },
                Instruction::Workdir("/src".into()),
                Instruction::Copy {
                    from: None,
                    sources: vec![".".into()],
                    dest: ".".into(),
                },
                Instruction::Run(format!("cargo build --release --bin {BIN_NAME}")),
                Instruction::From {
                    image: "debian:bookworm-slim".into(),
                    alias: None,
                },
                Instruction::Workdir(IMAGE_WORKDIR.into()),
                Instruction::Copy {
                    from: None,
                    sources: vec![".".into()],
                    dest: ".".into(),
                },
                Instruction::Copy {
                    from: Some("builder".into()),
                    sources: vec![format!("/src/target/release/{BIN_NAME}")],
                    dest: entry.clone(),
                },
                Instruction::Expose(vec![ExposedPort::tcp(DEFAULT_PORT)]),
                Instruction::Entrypoint(vec![entry]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_recipe() {
        let recipe = Recipe::parse(
            "FROM python:3.12-slim\nWORKDIR /app\nCOPY . .\nEXPOSE 5000\nCMD [\"python\", \"main.py\"]\n",
        )
        .expect("parse");
        assert_eq!(
            recipe.instructions,
            vec![
                Instruction::From {
                    image: "python:3.12-slim".into(),
                    alias: None
                },
                Instruction::Workdir("/app".into()),
                Instruction::Copy {
                    from: None,
                    sources: vec![".".into()],
                    dest: ".".into()
                },
                Instruction::Expose(vec![ExposedPort::tcp(5000)]),
                Instruction::Cmd(vec!["python".into(), "main.py".into()]),
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive_and_comments_skipped() {
        let recipe = Recipe::parse("# base\nfrom alpine as base\n\n  workdir /w # not a comment\n")
            .expect("parse");
        assert_eq!(
            recipe.instructions[0],
            Instruction::From {
                image: "alpine".into(),
                alias: Some("base".into())
            }
        );
        assert_eq!(
            recipe.instructions[1],
            Instruction::Workdir("/w # not a comment".into())
        );
    }

    #[test]
    fn continuation_lines_are_joined() {
        let recipe = Recipe::parse("FROM alpine\nRUN apk add \\\n    curl \\\n    git\n")
            .expect("parse");
        assert_eq!(
            recipe.instructions[1],
            Instruction::Run("apk add curl git".into())
        );
    }

    #[test]
    fn shell_form_command_is_normalized() {
        let recipe = Recipe::parse("FROM alpine\nENTRYPOINT python main.py\n").expect("parse");
        assert_eq!(
            recipe.instructions[1],
            Instruction::Entrypoint(vec![
                "/bin/sh".into(),
                "-c".into(),
                "python main.py".into()
            ])
        );
    }

    #[test]
    fn copy_from_stage_and_multiple_sources() {
        let recipe =
            Recipe::parse("FROM a\nCOPY --from=builder --chown=1000 /out/bin ./bin\nCOPY a.txt b.txt /data/\n")
                .expect("parse");
        assert_eq!(
            recipe.instructions[1],
            Instruction::Copy {
                from: Some("builder".into()),
                sources: vec!["/out/bin".into()],
                dest: "./bin".into()
            }
        );
        assert_eq!(
            recipe.instructions[2],
            Instruction::Copy {
                from: None,
                sources: vec!["a.txt".into(), "b.txt".into()],
                dest: "/data/".into()
            }
        );
    }

    #[test]
    fn env_both_forms() {
        let recipe = Recipe::parse(
            "FROM a\nENV A=1 B=\"two words\"\nENV GREETING hello there\n",
        )
        .expect("parse");
        assert_eq!(
            recipe.instructions[1],
            Instruction::Env(vec![
                ("A".into(), "1".into()),
                ("B".into(), "two words".into())
            ])
        );
        assert_eq!(
            recipe.instructions[2],
            Instruction::Env(vec![("GREETING".into(), "hello there".into())])
        );
    }

    #[test]
    fn env_quoted_value_unescapes() {
        let recipe = Recipe::parse("FROM a\nENV K=\"say \\\"hi\\\" x\" P=\"C:\\\\tmp\" E=\"\"\n")
            .expect("parse");
        assert_eq!(
            recipe.instructions[1],
            Instruction::Env(vec![
                ("K".into(), "say \"hi\" x".into()),
                ("P".into(), "C:\\tmp".into()),
                ("E".into(), String::new()),
            ])
        );
    }

    #[test]
    fn expose_with_protocols() {
        let recipe = Recipe::parse("FROM a\nEXPOSE 5000 53/udp 8080/TCP\n").expect("parse");
        assert_eq!(
            recipe.instructions[1],
            Instruction::Expose(vec![
                ExposedPort::tcp(5000),
                ExposedPort {
                    port: 53,
                    protocol: Protocol::Udp
                },
                ExposedPort::tcp(8080),
            ])
        );
    }

    #[test]
    fn errors_name_the_line() {
        let err = Recipe::parse("FROM a\n\nHEALTHCHECK NONE\n").unwrap_err();
        assert!(
            matches!(err, RolodexError::Recipe { line: 3, .. }),
            "got: {err}"
        );
        assert!(Recipe::parse("FROM a\nEXPOSE 99999\n").is_err());
        assert!(Recipe::parse("FROM a\nEXPOSE http\n").is_err());
        assert!(Recipe::parse("FROM a\nCOPY onlyone\n").is_err());
        assert!(Recipe::parse("FROM a\nCMD [\"unterminated\"\n").is_err());
        assert!(Recipe::parse("FROM a\nCMD []\n").is_err());
    }

    #[test]
    fn render_then_parse_is_identity() {
        let recipe = Recipe {
            instructions: vec![
                Instruction::From {
                    image: "alpine:3".into(),
                    alias: Some("base".into()),
                },
                Instruction::Env(vec![
                    ("MSG".into(), "hi there".into()),
                    ("QUOTE".into(), "say \"hi\" x".into()),
                    ("PATH_LIKE".into(), "a\\b c".into()),
                    ("TIGHT".into(), "a\"b".into()),
                    ("EMPTY".into(), String::new()),
                ]),
                Instruction::Expose(vec![
                    ExposedPort::tcp(5000),
                    ExposedPort {
                        port: 53,
                        protocol: Protocol::Udp,
                    },
                ]),
                Instruction::User("1000:1000".into()),
                Instruction::Cmd(vec!["echo".into(), "a \"quoted\" word".into()]),
            ],
        };
        let rendered = recipe.render();
        assert_eq!(Recipe::parse(&rendered).expect("reparse"), recipe);
    }

    #[test]
    fn workspace_build_only_locks_with_a_lockfile() {
        let lockfile = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../Cargo.lock");
        let recipe = Recipe::default_for_workspace();
        let runs: Vec<&String> = recipe
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Run(command) => Some(command),
                _ => None,
            })
            .collect();
        assert!(!runs.is_empty());
        for run in runs {
            assert!(
                lockfile.exists() || !run.contains("--locked"),
                "{run:?} needs a Cargo.lock"
            );
        }
    }

    #[test]
    fn workspace_recipe_matches_repository_dockerfile() {
        let on_disk = Recipe::parse(include_str!("../../../../Dockerfile")).expect("parse Dockerfile");
        assert_eq!(on_disk, Recipe::default_for_workspace());
    }
}
