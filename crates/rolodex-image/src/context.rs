//! Build context enumeration and staging.
//!
//! A build context is the directory tree next to the recipe. Staging
//! recreates the image filesystem under a host directory: the working
//! directory is created first, then every context file is copied to the
//! `COPY` destination at the same relative path.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use rolodex_common::constants::IGNORE_FILE;
use rolodex_common::error::{Result, RolodexError};
use serde::Serialize;

use crate::hash::{Sha256Hash, hash_file, validate_hash};
use crate::recipe::{CopyStep, RuntimeContract};

/// One `.dockerignore` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IgnoreRule {
    components: Vec<String>,
    negated: bool,
}

/// Exclusion rules read from `.dockerignore`.
///
/// Patterns are anchored at the context root, `*` and `?` match within one
/// path component, `**` matches any number of components, and a leading
/// `!` re-includes. The last matching rule wins. A pattern that matches a
/// directory excludes everything beneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    /// Parses ignore file text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let rules = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|line| {
                let (negated, pattern) = line
                    .strip_prefix('!')
                    .map_or((false, line), |rest| (true, rest.trim()));
                let components: Vec<String> = pattern
                    .split('/')
                    .filter(|c| !c.is_empty() && *c != ".")
                    .map(str::to_string)
                    .collect();
                (!components.is_empty()).then_some(IgnoreRule {
                    components,
                    negated,
                })
            })
            .collect();
        Self { rules }
    }

    /// Reads the ignore file of a context. A missing file means no rules.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(context_root: &Path) -> Result<Self> {
        let path = context_root.join(IGNORE_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| RolodexError::io(&path, e))?;
        Ok(Self::parse(&text))
    }

    /// Returns `true` if the context-relative path is excluded.
    #[must_use]
    pub fn is_ignored(&self, relative: &Path) -> bool {
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let mut ignored = false;
        for rule in &self.rules {
            if matches_prefix(&rule.components, &parts) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

/// Matches `pattern` against `path` or any of its ancestors.
fn matches_prefix(pattern: &[String], path: &[String]) -> bool {
    match pattern.split_first() {
        None => true,
        Some((first, rest)) if first == "**" => {
            (0..=path.len()).any(|skip| matches_prefix(rest, &path[skip..]))
        }
        Some((first, rest)) => match path.split_first() {
            Some((head, tail)) => glob_match(first, head) && matches_prefix(rest, tail),
            None => false,
        },
    }
}

/// Matches one path component against a pattern with `*` and `?`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while ti < t.len() {
        match p.get(pi) {
            Some('*') => {
                backtrack = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '?' || c == t[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    pi = star + 1;
                    ti = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

/// Lists every file of a context as paths relative to its root.
///
/// Ignored paths are skipped; ignored directories are not descended into.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn list_context(root: &Path, rules: &IgnoreRules) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    walk(root, Path::new(""), rules, &mut files)?;
    tracing::debug!(root = %root.display(), files = files.len(), "enumerated build context");
    Ok(files)
}

/// Lists every file under a directory, with no ignore rules.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn list_files(root: &Path) -> Result<BTreeSet<PathBuf>> {
    list_context(root, &IgnoreRules::default())
}

fn walk(root: &Path, relative: &Path, rules: &IgnoreRules, out: &mut BTreeSet<PathBuf>) -> Result<()> {
    let dir = root.join(relative);
    let entries = std::fs::read_dir(&dir).map_err(|e| RolodexError::io(&dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| RolodexError::io(&dir, e))?;
        let rel = relative.join(entry.file_name());
        if rules.is_ignored(&rel) {
            tracing::trace!(path = %rel.display(), "ignored");
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            walk(root, &rel, rules, out)?;
        } else {
            let _ = out.insert(rel);
        }
    }
    Ok(())
}

/// A file placed into the image by staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFile {
    /// Size in bytes.
    pub size: u64,
    /// Content digest.
    pub digest: Sha256Hash,
}

/// Manifest of a staged image filesystem.
#[derive(Debug, Clone, Serialize)]
pub struct StagedContext {
    /// Host directory standing in for the image root.
    pub image_root: PathBuf,
    /// Absolute working directory inside the image.
    pub workdir: String,
    /// Staged files keyed by absolute path inside the image.
    pub files: BTreeMap<PathBuf, StagedFile>,
    /// Cross-stage copies that staging cannot reproduce.
    pub skipped: Vec<CopyStep>,
}

impl StagedContext {
    /// Host path of the working directory.
    #[must_use]
    pub fn workdir_path(&self) -> PathBuf {
        host_path(&self.image_root, &self.workdir)
    }

    /// Re-digests every staged file.
    ///
    /// # Errors
    ///
    /// Returns [`RolodexError::HashMismatch`] for the first file whose
    /// content changed, or an I/O error if one disappeared.
    pub fn verify(&self) -> Result<()> {
        for (path, staged) in &self.files {
            validate_hash(&host_path(&self.image_root, &path.to_string_lossy()), &staged.digest)?;
        }
        Ok(())
    }

    /// Total size of staged files in bytes.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(|f| f.size).sum()
    }
}

/// Maps an absolute image path onto the host directory backing the image.
pub(crate) fn host_path(image_root: &Path, image_path: &str) -> PathBuf {
    image_root.join(image_path.trim_start_matches('/'))
}

/// Stages a build context into `image_root` according to `contract`.
///
/// The working directory is created before any file is copied. The context
/// is listed once, before copying; an image root inside the context is left
/// out of that listing. Every
/// context `COPY` step is applied in order; a source of `.` or a directory
/// copies its files preserving relative paths. Copies from other stages are
/// recorded in [`StagedContext::skipped`].
///
/// # Errors
///
/// Returns an error if a source is missing or escapes the context, or if a
/// file cannot be read or written.
pub fn stage_context(
    context_root: &Path,
    image_root: &Path,
    contract: &RuntimeContract,
) -> Result<StagedContext> {
    tracing::info!(
        context = %context_root.display(),
        image_root = %image_root.display(),
        workdir = %contract.workdir,
        "staging build context"
    );
    let rules = IgnoreRules::load(context_root)?;
    let mut staged = StagedContext {
        image_root: image_root.to_path_buf(),
        workdir: contract.workdir.clone(),
        files: BTreeMap::new(),
        skipped: Vec::new(),
    };

    let workdir = staged.workdir_path();
    std::fs::create_dir_all(&workdir).map_err(|e| RolodexError::io(&workdir, e))?;

    let mut files = list_context(context_root, &rules)?;
    if let Some(nested) = nested_image_root(context_root, image_root) {
        tracing::debug!(path = %nested.display(), "image root lies inside the context, not copied");
        files.retain(|f| !f.starts_with(&nested));
    }

    for step in &contract.copies {
        if step.from_stage.is_some() {
            tracing::debug!(sources = ?step.sources, dest = %step.dest, "skipping cross-stage copy");
            staged.skipped.push(step.clone());
            continue;
        }
        for source in &step.sources {
            stage_source(context_root, &files, source, step, &mut staged)?;
        }
    }

    tracing::info!(
        files = staged.files.len(),
        bytes = staged.total_bytes(),
        "build context staged"
    );
    Ok(staged)
}

/// Location of `image_root` relative to the context, when it is nested in it.
fn nested_image_root(context_root: &Path, image_root: &Path) -> Option<PathBuf> {
    let context = context_root.canonicalize().ok()?;
    let image = image_root.canonicalize().ok()?;
    let inner = image.strip_prefix(&context).ok()?;
    (!inner.as_os_str().is_empty()).then(|| inner.to_path_buf())
}

fn stage_source(
    context_root: &Path,
    files: &BTreeSet<PathBuf>,
    source: &str,
    step: &CopyStep,
    staged: &mut StagedContext,
) -> Result<()> {
    let relative = PathBuf::from(source.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(RolodexError::Config {
            message: format!("COPY source {source:?} is outside the build context"),
        });
    }
    let source_path = context_root.join(&relative);
    if !source_path.exists() {
        return Err(RolodexError::NotFound {
            kind: "COPY source",
            id: source.to_string(),
        });
    }

    if source_path.is_dir() {
        let dest_dir = host_path(&staged.image_root, &step.dest);
        let prefix: PathBuf = relative
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        for file in files.iter().filter(|f| f.starts_with(&prefix)) {
            let Ok(inner) = file.strip_prefix(&prefix) else {
                continue;
            };
            copy_file(&context_root.join(file), &dest_dir.join(inner), staged)?;
        }
    } else {
        let target = if step.dest_is_dir {
            let name = relative.file_name().map(ToOwned::to_owned).unwrap_or_default();
            host_path(&staged.image_root, &step.dest).join(name)
        } else {
            host_path(&staged.image_root, &step.dest)
        };
        copy_file(&source_path, &target, staged)?;
    }
    Ok(())
}

fn copy_file(from: &Path, to: &Path, staged: &mut StagedContext) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RolodexError::io(parent, e))?;
    }
    let size = std::fs::copy(from, to).map_err(|e| RolodexError::io(from, e))?;
    let digest = hash_file(to)?;
    let image_path = Path::new("/").join(
        to.strip_prefix(&staged.image_root)
            .map_err(|_| RolodexError::Config {
                message: format!("{} escapes the image root", to.display()),
            })?,
    );
    tracing::trace!(path = %image_path.display(), size, "staged file");
    let _ = staged.files.insert(image_path, StagedFile { size, digest });
    Ok(())
}
