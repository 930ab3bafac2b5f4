//! Crate root: wires together the P toolchain.
//!
//! Every stage runs to completion before the next one starts:
//! - `tokenizer` turns source text into a flat token stream.
//! - `syntax` checks the stream and accumulates diagnostics.
//! - `parser` builds the arena-backed tree defined in `ast` from a checked stream.
//! - `vm` interprets the tree; `codegen` lowers it to fasm assembly.
//! - `dump` and `input` are the display and prompt collaborators used by the CLI.
//! - `error` centralises error types and caret rendering.

pub mod ast;
pub mod codegen;
pub mod dump;
pub mod error;
pub mod input;
pub mod parser;
pub mod syntax;
pub mod tokenizer;
pub mod vm;

use snafu::ResultExt;

pub use ast::{Ast, NodeId, NodeKind};
pub use codegen::CodegenOptions;
pub use error::{BuildError, PlangError, PlangResult};
pub use syntax::{Diagnostic, SyntaxReport};
pub use tokenizer::{Token, TokenKind};
pub use vm::{NoTrace, Tracer, VarArray, VmConfig, VmFault};

/// Tokenize and syntax-check `source`.
pub fn check_source(source: &str) -> (Vec<Token>, SyntaxReport) {
  let tokens = tokenizer::tokenize(source);
  let report = syntax::check(&tokens, source);
  (tokens, report)
}

/// Build the tree for tokens whose check produced `report`. Refuses when the
/// report holds errors.
pub fn build_checked(tokens: &[Token], report: &SyntaxReport) -> PlangResult<Ast> {
  if !report.ok() {
    return Err(PlangError::Syntax {
      errors: report.error_count(),
      warnings: report.warning_count(),
    });
  }
  parser::parse(tokens).context(error::BuildSnafu)
}

/// Tokenize, check and build `source` in one go.
pub fn parse_program(source: &str) -> PlangResult<Ast> {
  let (tokens, report) = check_source(source);
  build_checked(&tokens, &report)
}

/// Compile `source` into fasm assembly text.
pub fn compile_to_assembly(source: &str, options: CodegenOptions) -> PlangResult<String> {
  let ast = parse_program(source)?;
  Ok(codegen::generate_with(&ast, options))
}

/// Compile and run `source` with `vars` as the initial machine state.
pub fn run_program(source: &str, vars: &mut VarArray) -> PlangResult<i32> {
  let ast = parse_program(source)?;
  vm::execute(&ast, vars).map_err(|fault| PlangError::Fault { fault })
}
