//! Shared helpers: logging, process execution, git plumbing and text utilities.

pub mod date;
pub mod exec;
pub mod git;
pub mod log;
pub mod minify;
pub mod slug;
