//! Subcommand entry points for the `skillscore` binary.

pub mod parse;
pub mod score;
pub mod score_text;

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

/// Reject missing paths and anything that is not a regular file.
pub(crate) fn ensure_file(path: &str) -> Result<&Path> {
    let file = Path::new(path);
    if !file.exists() {
        bail!("File not found: {}", path);
    }
    if !file.is_file() {
        bail!("Path is not a file: {}", path);
    }
    Ok(file)
}

/// Read a UTF-8 input file.
pub(crate) fn read_input(path: &str) -> Result<String> {
    let file = ensure_file(path)?;
    Ok(fs::read_to_string(file)?)
}
