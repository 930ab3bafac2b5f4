//! Builds the syntax tree from a token stream that already passed
//! [`crate::syntax::check`].
//!
//! The builder walks the same grammar as the checker but performs no
//! validation of its own: any mismatch is reported as a [`BuildError`] and
//! means the pipeline's invariants were violated, not that the user wrote a
//! bad program.

use log::debug;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::BuildError;
use crate::tokenizer::{Token, TokenKind, describe_token, leading_number};

/// Build the tree for a syntax-checked program.
pub fn parse(tokens: &[Token]) -> Result<Ast, BuildError> {
  let mut stream = TokenStream::new(tokens);

  stream.skip(TokenKind::Program)?;
  stream.skip(TokenKind::LParen)?;

  let mut inputs = vec![stream.get_ident()?];
  while stream.equal(TokenKind::Comma) {
    inputs.push(stream.get_ident()?);
  }
  stream.skip(TokenKind::RParen)?;

  let mut ast = Ast::new(inputs);
  let root = ast.root();
  parse_block(&mut stream, &mut ast, root)?;

  debug!("built syntax tree with {} nodes", ast.len());
  Ok(ast)
}

/// Attach statements to `scope` until its `END` (consumed) or the program's
/// `RESULT` statement. Recurses once per `WHILE`, so nesting depth is bounded
/// by the stack.
fn parse_block(stream: &mut TokenStream, ast: &mut Ast, scope: NodeId) -> Result<(), BuildError> {
  loop {
    let token = stream.next("a statement")?;
    match token.kind {
      TokenKind::Ident => {
        let target = ident_value(token)?;
        stream.skip(TokenKind::Assign)?;
        parse_assignment(stream, ast, scope, target)?;
      }
      TokenKind::While => {
        let test_var = stream.get_ident()?;
        stream.skip(TokenKind::NotEqual)?;
        stream.get_number()?;
        stream.skip(TokenKind::Do)?;

        let looped = ast.push_child(scope, NodeKind::While, vec![test_var]);
        if !stream.equal(TokenKind::End) {
          parse_block(stream, ast, looped)?;
        }
      }
      TokenKind::End => return Ok(()),
      TokenKind::Result => {
        stream.skip(TokenKind::LParen)?;
        let output = stream.get_ident()?;
        stream.skip(TokenKind::RParen)?;
        stream.expect_eof()?;

        ast.push_child(scope, NodeKind::Result, vec![output]);
        return Ok(());
      }
      _ => return Err(stream.unexpected(token, "a statement")),
    }
  }
}

fn parse_assignment(
  stream: &mut TokenStream,
  ast: &mut Ast,
  scope: NodeId,
  target: i64,
) -> Result<(), BuildError> {
  let token = stream.next("an integer, PRED or SUCC")?;
  let kind = match token.kind {
    TokenKind::IntLiteral => {
      let value = number_value(token)?;
      ast.push_child(scope, NodeKind::Assign, vec![target, value]);
      return Ok(());
    }
    TokenKind::Pred => NodeKind::Pred,
    TokenKind::Succ => NodeKind::Succ,
    _ => return Err(stream.unexpected(token, "an integer, PRED or SUCC")),
  };

  stream.skip(TokenKind::LParen)?;
  let source = stream.get_ident()?;
  stream.skip(TokenKind::RParen)?;

  ast.push_child(scope, kind, vec![target, source]);
  Ok(())
}

fn ident_value(token: &Token) -> Result<i64, BuildError> {
  match token.text() {
    Some(text) if text.len() > 1 && text[1..].bytes().all(|b| b.is_ascii_digit()) => {
      Ok(leading_number(&text[1..]))
    }
    _ => Err(invalid_number(token)),
  }
}

fn number_value(token: &Token) -> Result<i64, BuildError> {
  match token.text() {
    Some(text) if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => {
      Ok(leading_number(text))
    }
    _ => Err(invalid_number(token)),
  }
}

fn invalid_number(token: &Token) -> BuildError {
  BuildError::InvalidNumber {
    row: token.row,
    col: token.col,
    text: describe_token(token).to_string(),
  }
}

/// Lightweight cursor over the token slice.
struct TokenStream<'a> {
  tokens: &'a [Token],
  pos: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: &'a [Token]) -> Self {
    Self { tokens, pos: 0 }
  }

  fn peek(&self) -> Option<&'a Token> {
    self.tokens.get(self.pos)
  }

  fn next(&mut self, expected: &str) -> Result<&'a Token, BuildError> {
    let token = self.peek().ok_or_else(|| BuildError::UnexpectedEnd {
      expected: expected.to_string(),
    })?;
    self.pos += 1;
    Ok(token)
  }

  /// Consume the current token if it has the given kind.
  fn equal(&mut self, kind: TokenKind) -> bool {
    if self.peek().is_some_and(|token| token.kind == kind) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, kind: TokenKind) -> Result<(), BuildError> {
    let token = self.next(kind.expected_name())?;
    if token.kind == kind {
      Ok(())
    } else {
      Err(self.unexpected(token, kind.expected_name()))
    }
  }

  fn get_ident(&mut self) -> Result<i64, BuildError> {
    let token = self.next("identifier")?;
    if token.kind != TokenKind::Ident {
      return Err(self.unexpected(token, "identifier"));
    }
    ident_value(token)
  }

  fn get_number(&mut self) -> Result<i64, BuildError> {
    let token = self.next("integer")?;
    if token.kind != TokenKind::IntLiteral {
      return Err(self.unexpected(token, "integer"));
    }
    number_value(token)
  }

  /// `RESULT (...)` must be the final statement; the `Eof` is not consumed.
  fn expect_eof(&self) -> Result<(), BuildError> {
    match self.peek() {
      Some(token) if token.kind == TokenKind::Eof => Ok(()),
      Some(token) => Err(self.unexpected(token, "<eof>")),
      None => Ok(()),
    }
  }

  fn unexpected(&self, token: &Token, expected: &str) -> BuildError {
    BuildError::UnexpectedToken {
      row: token.row,
      col: token.col,
      expected: expected.to_string(),
      got: describe_token(token).to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::tokenize;

  fn build(source: &str) -> Ast {
    parse(&tokenize(source)).expect("program should build")
  }

  fn shape(ast: &Ast) -> Vec<(NodeKind, Vec<i64>)> {
    ast
      .iter()
      .map(|id| {
        let node = ast.node(id);
        (node.kind(), node.values().to_vec())
      })
      .collect()
  }

  #[test]
  fn builds_every_statement_kind() {
    let ast = build(
      "PROGRAM (X1, X2)
       X0 := 0
       WHILE X2 != 0 DO
         X0 := SUCC(X0)
         X2 := PRED(X2)
       END
       RESULT (X0)",
    );
    assert_eq!(
      shape(&ast),
      vec![
        (NodeKind::Program, vec![1, 2]),
        (NodeKind::Assign, vec![0, 0]),
        (NodeKind::While, vec![2]),
        (NodeKind::Succ, vec![0, 0]),
        (NodeKind::Pred, vec![2, 2]),
        (NodeKind::Result, vec![0]),
      ]
    );
    assert_eq!(ast.inputs(), &[1, 2]);
  }

  #[test]
  fn empty_loop_has_no_children() {
    let ast = build("PROGRAM(X0) WHILE X0 != 0 DO END RESULT(X0)");
    let looped = ast.node(ast.root()).children()[0];
    assert_eq!(ast.node(looped).kind(), NodeKind::While);
    assert!(ast.node(looped).children().is_empty());
    assert_eq!(ast.node(ast.root()).children().len(), 2);
  }

  #[test]
  fn nested_loops_attach_to_innermost_scope() {
    let ast = build(
      "PROGRAM(X1) WHILE X1 != 0 DO WHILE X2 != 0 DO X2 := PRED(X2) END X1 := PRED(X1) END RESULT(X1)",
    );
    let outer = ast.node(ast.root()).children()[0];
    let children = ast.node(outer).children();
    assert_eq!(children.len(), 2);
    assert_eq!(ast.node(children[0]).kind(), NodeKind::While);
    assert_eq!(ast.node(children[1]).kind(), NodeKind::Pred);
    assert_eq!(ast.node(children[1]).parent(), Some(outer));
  }

  #[test]
  fn leading_zeros_and_case_are_irrelevant() {
    let ast = build("program(x007) x007 := 0042 result(X7)");
    assert_eq!(
      shape(&ast),
      vec![
        (NodeKind::Program, vec![7]),
        (NodeKind::Assign, vec![7, 42]),
        (NodeKind::Result, vec![7]),
      ]
    );
  }

  #[test]
  fn unchecked_garbage_is_an_internal_error() {
    let err = parse(&tokenize("PROGRAM(X0) X0 X0 RESULT(X0)")).unwrap_err();
    assert_eq!(
      err,
      BuildError::UnexpectedToken {
        row: 1,
        col: 16,
        expected: ":=".into(),
        got: "X0".into(),
      }
    );
  }

  #[test]
  fn missing_result_runs_into_eof() {
    let err = parse(&tokenize("PROGRAM(X0) X0 := 0")).unwrap_err();
    assert!(matches!(err, BuildError::UnexpectedToken { ref got, .. } if got == "<eof>"));
  }

  #[test]
  fn truncated_stream_reports_end() {
    let err = parse(&[]).unwrap_err();
    assert!(matches!(err, BuildError::UnexpectedEnd { .. }));
  }
}
