//! # rolodex-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the entire Rolodex workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the validated field types that the address
//! book and the container tooling build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
