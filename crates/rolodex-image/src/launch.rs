//! Start-time half of the contract: one process, started from the
//! working directory, with no arguments beyond those in the recipe.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};

use rolodex_common::error::{Result, RolodexError};

use crate::context::host_path;
use crate::recipe::RuntimeContract;

/// A resolved start command, checked against the staged filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPlan {
    /// Program to execute; a host path when it lives inside the image.
    pub program: String,
    /// Arguments, exactly as declared.
    pub args: Vec<String>,
    /// Host directory standing in for the image working directory.
    pub cwd: PathBuf,
    /// Environment declared by the recipe.
    pub env: Vec<(String, String)>,
    /// Host path of the entrypoint file, when one was identified.
    pub entry_file: Option<PathBuf>,
}

/// Programs that take a script file as their first positional argument.
const INTERPRETERS: &[&str] = &["sh", "bash", "dash", "ash", "zsh", "node", "ruby", "perl", "php"];

/// Interpreter flags whose value is inline code or a module, not a file.
const INLINE_FLAGS: &[&str] = &["-c", "-m", "-e", "--eval"];

fn is_interpreter(program: &str) -> bool {
    let name = program.rsplit('/').next().unwrap_or(program);
    name.starts_with("python") || INTERPRETERS.contains(&name)
}

/// First positional argument of an interpreter, unless it runs inline code.
fn script_argument(args: &[String]) -> Option<&str> {
    for arg in args {
        if INLINE_FLAGS.contains(&arg.as_str()) {
            return None;
        }
        if !arg.starts_with('-') {
            return Some(arg);
        }
    }
    None
}

/// Maps a command path onto the staged filesystem.
///
/// Relative paths resolve against the working directory. Absolute paths
/// under a working directory other than `/` are staged files; every other
/// absolute path belongs to the base image and is left to the host.
fn staged_path(image_root: &Path, cwd: &Path, workdir: &str, path: &str) -> Option<PathBuf> {
    if !path.starts_with('/') {
        return Some(cwd.join(path));
    }
    let inside = workdir != "/"
        && path
            .strip_prefix(workdir)
            .is_some_and(|rest| rest.starts_with('/'));
    inside.then(|| host_path(image_root, path))
}

/// Plans the start of the contract's entrypoint from a staged image root.
///
/// The entrypoint file is the program itself when it is a staged path
/// (`./rolodex`, `/app/run`), otherwise the script of a known interpreter
/// (`python main.py`, `sh run.sh`). Inline code (`sh -c ...`,
/// `python -m ...`) and every other program (`sleep infinity`,
/// `/usr/bin/env true`) belong to the base image and are not checked.
///
/// # Errors
///
/// Returns [`RolodexError::NotFound`] if the working directory was never
/// staged and [`RolodexError::EntrypointMissing`] if the entrypoint file is
/// absent. No process is started in either case.
pub fn plan_start(contract: &RuntimeContract, image_root: &Path) -> Result<StartPlan> {
    let cwd = host_path(image_root, &contract.workdir);
    if !cwd.is_dir() {
        return Err(RolodexError::NotFound {
            kind: "working directory",
            id: cwd.display().to_string(),
        });
    }
    let Some((program, args)) = contract.command.split_first() else {
        return Err(RolodexError::Recipe {
            line: 0,
            message: "empty start command".into(),
        });
    };

    let program_file = if program.contains('/') {
        staged_path(image_root, &cwd, &contract.workdir, program)
    } else {
        None
    };
    let resolved_program = program_file
        .as_ref()
        .map_or_else(|| program.clone(), |path| path.display().to_string());
    let entry_file = program_file.or_else(|| {
        if !is_interpreter(program) {
            return None;
        }
        script_argument(args).and_then(|a| staged_path(image_root, &cwd, &contract.workdir, a))
    });

    if let Some(path) = &entry_file {
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "entrypoint file missing");
            return Err(RolodexError::EntrypointMissing { path: path.clone() });
        }
    }

    Ok(StartPlan {
        program: resolved_program,
        args: args.to_vec(),
        cwd,
        env: contract.env.clone(),
        entry_file,
    })
}

impl StartPlan {
    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        let _ = command
            .args(&self.args)
            .current_dir(&self.cwd)
            .envs(self.env.iter().map(|(k, v)| (k, v)));
        command
    }

    /// Starts the process without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`RolodexError::Start`] if the program cannot be executed.
    pub fn spawn(&self) -> Result<Child> {
        tracing::info!(
            program = %self.program,
            args = ?self.args,
            cwd = %self.cwd.display(),
            "starting entrypoint"
        );
        self.command().spawn().map_err(|e| RolodexError::Start {
            program: self.program.clone(),
            source: e,
        })
    }

    /// Starts the process and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`RolodexError::Start`] if the program cannot be executed or
    /// waited on.
    pub fn run(&self) -> Result<ExitStatus> {
        let mut child = self.spawn()?;
        let status = child.wait().map_err(|e| RolodexError::Start {
            program: self.program.clone(),
            source: e,
        })?;
        tracing::info!(program = %self.program, %status, "entrypoint exited");
        Ok(status)
    }
}
