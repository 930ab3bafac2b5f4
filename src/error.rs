//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics point at the offending column of the source line with a caret.

use std::path::PathBuf;
use std::process::ExitStatus;

use snafu::Snafu;

use crate::vm::VmFault;

pub type PlangResult<T> = Result<T, PlangError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PlangError {
  #[snafu(display("could not load source file {}: {source}", path.display()))]
  ReadSource {
    path: PathBuf,
    source: std::io::Error,
  },

  #[snafu(display("could not write {}: {source}", path.display()))]
  WriteOutput {
    path: PathBuf,
    source: std::io::Error,
  },

  #[snafu(display("{errors} errors, {warnings} warnings"))]
  Syntax { errors: usize, warnings: usize },

  #[snafu(display("internal error while building the syntax tree: {source}"))]
  Build { source: BuildError },

  #[snafu(display("{fault}"))]
  Fault { fault: VmFault },

  #[snafu(display("could not read input value: {source}"))]
  Prompt { source: std::io::Error },

  #[snafu(display("could not start assembler `{program}`: {source}"))]
  SpawnAssembler {
    program: String,
    source: std::io::Error,
  },

  #[snafu(display("assembler `{program}` failed with {status}"))]
  AssemblerFailed { program: String, status: ExitStatus },
}

/// Invariant failures of the AST builder. These only surface when a token
/// stream that did not pass the syntax checker is handed to the builder.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum BuildError {
  #[snafu(display("{row}:{col}: expected {expected} but got {got}"))]
  UnexpectedToken {
    row: usize,
    col: usize,
    expected: String,
    got: String,
  },

  #[snafu(display("token stream ended before {expected}"))]
  UnexpectedEnd { expected: String },

  #[snafu(display("{row}:{col}: `{text}` does not name a number"))]
  InvalidNumber {
    row: usize,
    col: usize,
    text: String,
  },
}

/// Build the marker line that sits under a source line: `col - 1` spaces
/// followed by the caret arrow and the message.
pub fn caret_marker(col: usize, message: &str) -> String {
  let indent = col.saturating_sub(1);
  format!("{}^-- {message}", " ".repeat(indent))
}

/// Return the 1-based `row` of `source` without its line terminator.
pub fn source_line(source: &str, row: usize) -> &str {
  source
    .split('\n')
    .nth(row.saturating_sub(1))
    .map(|line| line.trim_end_matches('\r'))
    .unwrap_or("")
}
