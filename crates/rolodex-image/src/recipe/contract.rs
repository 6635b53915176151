//! Extraction of the runtime contract from a parsed recipe.
//!
//! Only the final stage describes the container that is started. Earlier
//! stages are build-time scaffolding and contribute nothing but files.

use rolodex_common::error::{Result, RolodexError};
use serde::Serialize;

use super::ast::{ExposedPort, Instruction, Recipe};

/// A `COPY` step of the final stage with its destination resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyStep {
    /// Source stage; `None` copies from the build context.
    pub from_stage: Option<String>,
    /// Source paths as written in the recipe.
    pub sources: Vec<String>,
    /// Absolute destination inside the image.
    pub dest: String,
    /// Whether the destination names a directory (ends in `/` or is `.`).
    pub dest_is_dir: bool,
}

/// What the final stage promises about the container it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeContract {
    /// Base image of the final stage.
    pub base_image: String,
    /// Absolute working directory the entrypoint starts in.
    pub workdir: String,
    /// Copy steps in recipe order.
    pub copies: Vec<CopyStep>,
    /// Environment declared for the process.
    pub env: Vec<(String, String)>,
    /// Advisory port metadata.
    pub exposed_ports: Vec<ExposedPort>,
    /// User the process runs as, if declared.
    pub user: Option<String>,
    /// Full argv of the start command (`ENTRYPOINT` followed by `CMD`).
    pub command: Vec<String>,
}

impl RuntimeContract {
    /// Returns `true` if `port` is declared, regardless of protocol.
    #[must_use]
    pub fn exposes(&self, port: u16) -> bool {
        self.exposed_ports.iter().any(|p| p.port == port)
    }

    /// Copy steps that read from the build context.
    pub fn context_copies(&self) -> impl Iterator<Item = &CopyStep> {
        self.copies.iter().filter(|c| c.from_stage.is_none())
    }
}

/// Resolves `path` against `base` and normalizes `.` and `..`.
pub(crate) fn resolve_image_path(base: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{base}/{path}")
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                let _ = parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

#[derive(Default)]
struct StageState {
    base_image: String,
    workdir: Option<String>,
    copies: Vec<CopyStep>,
    env: Vec<(String, String)>,
    exposed_ports: Vec<ExposedPort>,
    user: Option<String>,
    entrypoint: Vec<String>,
    cmd: Vec<String>,
}

fn contract_err(message: String) -> RolodexError {
    RolodexError::Recipe { line: 0, message }
}

impl Recipe {
    /// Extracts the final stage's runtime contract without building anything.
    ///
    /// # Errors
    ///
    /// Returns [`RolodexError::Recipe`] if the recipe has no stage, if a
    /// relative `COPY` destination appears before any `WORKDIR`, or if the
    /// final stage declares neither `ENTRYPOINT` nor `CMD`.
    pub fn contract(&self) -> Result<RuntimeContract> {
        let mut stage: Option<StageState> = None;

        for instruction in &self.instructions {
            if let Instruction::From { image, .. } = instruction {
                stage = Some(StageState {
                    base_image: image.clone(),
                    ..StageState::default()
                });
                continue;
            }
            let Some(state) = stage.as_mut() else {
                return Err(contract_err(format!(
                    "instruction before FROM: {instruction}"
                )));
            };
            apply(state, instruction)?;
        }

        let state = stage.ok_or_else(|| contract_err("recipe has no FROM instruction".into()))?;
        let command = if state.entrypoint.is_empty() {
            state.cmd
        } else {
            let mut command = state.entrypoint;
            command.extend(state.cmd);
            command
        };
        if command.is_empty() {
            return Err(contract_err(
                "final stage declares neither ENTRYPOINT nor CMD".into(),
            ));
        }

        let contract = RuntimeContract {
            base_image: state.base_image,
            workdir: state.workdir.unwrap_or_else(|| "/".into()),
            copies: state.copies,
            env: state.env,
            exposed_ports: state.exposed_ports,
            user: state.user,
            command,
        };
        tracing::debug!(
            base = %contract.base_image,
            workdir = %contract.workdir,
            ports = contract.exposed_ports.len(),
            "extracted runtime contract"
        );
        Ok(contract)
    }
}

fn apply(state: &mut StageState, instruction: &Instruction) -> Result<()> {
    match instruction {
        Instruction::From { .. } => {}
        Instruction::Workdir(path) => {
            let base = state.workdir.as_deref().unwrap_or("/");
            state.workdir = Some(resolve_image_path(base, path));
        }
        Instruction::Copy {
            from,
            sources,
            dest,
        } => {
            let dest_is_dir = dest.ends_with('/') || dest == "." || sources.len() > 1;
            let resolved = if dest.starts_with('/') {
                resolve_image_path("/", dest)
            } else {
                let Some(workdir) = state.workdir.as_deref() else {
                    return Err(contract_err(format!(
                        "COPY destination {dest:?} is relative but no WORKDIR was set"
                    )));
                };
                resolve_image_path(workdir, dest)
            };
            state.copies.push(CopyStep {
                from_stage: from.clone(),
                sources: sources.clone(),
                dest: resolved,
                dest_is_dir,
            });
        }
        Instruction::Run(_) => {}
        Instruction::Env(pairs) => state.env.extend(pairs.iter().cloned()),
        Instruction::Expose(ports) => state.exposed_ports.extend(ports.iter().copied()),
        Instruction::User(user) => state.user = Some(user.clone()),
        Instruction::Entrypoint(args) => {
            state.entrypoint.clone_from(args);
            // An ENTRYPOINT resets any CMD inherited earlier in the stage.
            state.cmd.clear();
        }
        Instruction::Cmd(args) => state.cmd.clone_from(args),
    }
    Ok(())
}
