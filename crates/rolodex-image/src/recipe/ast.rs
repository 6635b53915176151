//! Instruction tree of a build recipe.

use std::fmt;

use serde::Serialize;

/// Root node of a parsed recipe: instructions in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipe {
    /// Instructions, across all stages.
    pub instructions: Vec<Instruction>,
}

/// A single recipe instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `FROM <image> [AS <alias>]` starts a new stage.
    From {
        /// Base image reference.
        image: String,
        /// Stage name, referenced by `COPY --from`.
        alias: Option<String>,
    },
    /// `WORKDIR <path>`.
    Workdir(String),
    /// `COPY [--from=<stage>] <src>... <dest>`.
    Copy {
        /// Source stage; `None` copies from the build context.
        from: Option<String>,
        /// Source paths, relative to the build context or stage root.
        sources: Vec<String>,
        /// Destination, absolute or relative to the working directory.
        dest: String,
    },
    /// `RUN <command>`, kept verbatim.
    Run(String),
    /// `ENV <key>=<value> ...`.
    Env(Vec<(String, String)>),
    /// `EXPOSE <port>[/<protocol>] ...`.
    Expose(Vec<ExposedPort>),
    /// `USER <user>[:<group>]`.
    User(String),
    /// `ENTRYPOINT`, normalized to exec form.
    Entrypoint(Vec<String>),
    /// `CMD`, normalized to exec form.
    Cmd(Vec<String>),
}

/// Transport protocol of an exposed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP, the default.
    Tcp,
    /// UDP.
    Udp,
}

/// A port the running process is declared to listen on.
///
/// This is advisory metadata; declaring it binds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExposedPort {
    /// Port number.
    pub port: u16,
    /// Transport protocol.
    pub protocol: Protocol,
}

impl ExposedPort {
    /// A TCP port.
    #[must_use]
    pub const fn tcp(port: u16) -> Self {
        Self {
            port,
            protocol: Protocol::Tcp,
        }
    }
}

impl fmt::Display for ExposedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protocol {
            Protocol::Tcp => write!(f, "{}/tcp", self.port),
            Protocol::Udp => write!(f, "{}/udp", self.port),
        }
    }
}

fn exec_form(args: &[String]) -> Result<String, fmt::Error> {
    serde_json::to_string(args).map_err(|_| fmt::Error)
}

fn env_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if needs_quotes {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::From { image, alias: None } => write!(f, "FROM {image}"),
            Self::From {
                image,
                alias: Some(alias),
            } => write!(f, "FROM {image} AS {alias}"),
            Self::Workdir(path) => write!(f, "WORKDIR {path}"),
            Self::Copy {
                from,
                sources,
                dest,
            } => {
                write!(f, "COPY ")?;
                if let Some(stage) = from {
                    write!(f, "--from={stage} ")?;
                }
                write!(f, "{} {dest}", sources.join(" "))
            }
            Self::Run(command) => write!(f, "RUN {command}"),
            Self::Env(pairs) => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{k}={}", env_value(v)))
                    .collect();
                write!(f, "ENV {}", rendered.join(" "))
            }
            Self::Expose(ports) => {
                let rendered: Vec<String> = ports
                    .iter()
                    .map(|p| match p.protocol {
                        Protocol::Tcp => p.port.to_string(),
                        Protocol::Udp => p.to_string(),
                    })
                    .collect();
                write!(f, "EXPOSE {}", rendered.join(" "))
            }
            Self::User(user) => write!(f, "USER {user}"),
            Self::Entrypoint(args) => write!(f, "ENTRYPOINT {}", exec_form(args)?),
            Self::Cmd(args) => write!(f, "CMD {}", exec_form(args)?),
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instruction) in self.instructions.iter().enumerate() {
            if i > 0 && matches!(instruction, Instruction::From { .. }) {
                writeln!(f)?;
            }
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}
