//! Interactive collection of a program's input values.

use std::io::{self, BufRead, Write};

use log::debug;
use snafu::ResultExt;

use crate::ast::Ast;
use crate::error::{PlangError, PlangResult, PromptSnafu};
use crate::vm::VarArray;

/// Read one natural number, re-prompting until a line holds nothing but
/// digits and fits a variable. Running out of input is an error.
pub fn read_natural<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<i32> {
  let mut line = String::new();
  loop {
    line.clear();
    if input.read_line(&mut line)? == 0 {
      return Err(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "input ended before a value was entered",
      ));
    }

    let text = line.trim_end_matches(['\r', '\n']);
    if !text.is_empty()
      && text.bytes().all(|b| b.is_ascii_digit())
      && let Ok(value) = text.parse::<i32>()
    {
      return Ok(value);
    }

    write!(output, "Invalid integer. Try again: ")?;
    output.flush()?;
  }
}

/// Ask for every declared input of `ast`, in declaration order, and store
/// the answers in `vars`.
pub fn prompt_inputs<R: BufRead, W: Write>(
  ast: &Ast,
  vars: &mut VarArray,
  input: &mut R,
  output: &mut W,
) -> PlangResult<()> {
  for &var in ast.inputs() {
    write!(output, "X{var} = ").context(PromptSnafu)?;
    output.flush().context(PromptSnafu)?;

    let value = read_natural(input, output).context(PromptSnafu)?;
    debug!("input X{var} = {value}");
    vars
      .set(var, value)
      .map_err(|fault| PlangError::Fault { fault })?;
  }
  Ok(())
}

/// Block until the user presses ENTER.
pub fn pause<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<()> {
  writeln!(output, "\nPress ENTER to continue...")?;
  output.flush()?;
  let mut line = String::new();
  input.read_line(&mut line)?;
  Ok(())
}
