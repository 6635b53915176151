//! # rolodex-image
//!
//! The contract between a build context and the container that runs it:
//! a build recipe (the `Dockerfile` subset this project uses), the staging
//! of a build context into the image's working directory, and the start of
//! the single entrypoint process from that directory.
//!
//! The lifecycle is build, then start, then an opaque running state owned
//! by the entrypoint. Nothing here retries or restarts.

pub mod context;
pub mod hash;
pub mod launch;
pub mod recipe;
