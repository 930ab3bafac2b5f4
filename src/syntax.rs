//! Recursive-descent syntax checking with accumulated diagnostics.
//!
//! The checker walks the fixed P grammar
//!
//! ```text
//! program   := PROGRAM '(' ident (',' ident)* ')' stmt* EOF
//! stmt      := ident ':=' (int | pred-succ)
//!            | WHILE ident '!=' int DO stmt* END
//!            | RESULT '(' ident ')'
//! pred-succ := (PRED | SUCC) '(' ident ')'
//! ```
//!
//! Instead of stopping at the first mismatch it records a diagnostic and keeps
//! going with the token it actually saw, so one run can surface several
//! problems. Warnings never fail the check. A separate, purely token-shaped
//! pass warns about loops whose test variable is never driven towards zero.

use std::fmt;

use log::debug;

use crate::error::{caret_marker, source_line};
use crate::tokenizer::{Token, TokenKind, describe_token, ident_index};
use crate::vm::NUM_VARS;

/// The walk is abandoned once this many errors (not warnings) were recorded.
pub const MAX_ERRORS: usize = 10;

/// Longest accepted integer literal, in characters.
pub const MAX_INT_LEN: usize = 11;

/// Longest accepted identifier: an `X` followed by an integer.
pub const MAX_IDENT_LEN: usize = MAX_INT_LEN + 1;

/// One error or warning produced by the syntax checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub message: String,
  pub is_warning: bool,
  pub row: usize,
  pub col: usize,
  pub source_line: String,
}

impl Diagnostic {
  fn at(token: &Token, source: &str, message: impl Into<String>, is_warning: bool) -> Self {
    Self {
      message: message.into(),
      is_warning,
      row: token.row,
      col: token.col,
      source_line: source_line(source, token.row).to_string(),
    }
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let severity = if self.is_warning { "Warning" } else { "Error" };
    writeln!(f, "{severity} on line {}:", self.row)?;
    writeln!(f, "{}", self.source_line)?;
    write!(f, "{}", caret_marker(self.col, &self.message))
  }
}

/// Outcome of a syntax check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxReport {
  pub diagnostics: Vec<Diagnostic>,
}

impl SyntaxReport {
  /// True iff no diagnostic is an error.
  pub fn ok(&self) -> bool {
    self.error_count() == 0
  }

  pub fn error_count(&self) -> usize {
    self.diagnostics.iter().filter(|d| !d.is_warning).count()
  }

  pub fn warning_count(&self) -> usize {
    self.diagnostics.iter().filter(|d| d.is_warning).count()
  }

  pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter().filter(|d| !d.is_warning)
  }

  pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter().filter(|d| d.is_warning)
  }
}

/// Check `tokens` (as produced by [`crate::tokenizer::tokenize`] on `source`).
/// `source` is only used to attach the offending line to each diagnostic.
pub fn check(tokens: &[Token], source: &str) -> SyntaxReport {
  let mut checker = Checker::new(tokens, source);
  checker.check_program();

  let report = SyntaxReport {
    diagnostics: checker.diagnostics,
  };
  debug!(
    "syntax check finished: {} errors, {} warnings",
    report.error_count(),
    report.warning_count()
  );
  report
}

struct Checker<'a> {
  tokens: &'a [Token],
  source: &'a str,
  pos: usize,
  diagnostics: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
  fn new(tokens: &'a [Token], source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
      diagnostics: Vec::new(),
    }
  }

  fn check_program(&mut self) {
    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::Program]);

    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::LParen]);

    loop {
      let Some(tok) = self.next() else { return };
      self.expect(tok, &[TokenKind::Ident]);
      self.check_ident(tok);

      let Some(tok) = self.peek() else { return };
      if tok.kind != TokenKind::Comma {
        break;
      }
      self.pos += 1;
    }

    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::Comma, TokenKind::RParen]);

    self.check_block(false);
  }

  /// Check statements until the enclosing block ends. Inside a loop an `END`
  /// is left for the caller to consume; `RESULT` ends the walk. Each `WHILE`
  /// adds a level of recursion, so nesting depth is bounded by the stack.
  fn check_block(&mut self, in_loop: bool) {
    loop {
      if self.error_count() >= MAX_ERRORS {
        self.pos = self.tokens.len();
        return;
      }

      let Some(tok) = self.next() else { return };
      match tok.kind {
        TokenKind::Ident => self.check_assignment(tok),
        TokenKind::While => self.check_while(),
        TokenKind::End if in_loop => {
          self.pos -= 1;
          return;
        }
        TokenKind::Result => {
          self.check_result();
          return;
        }
        _ => {
          let message = format!("unexpected token: {}", describe_token(tok));
          self.error(tok, message);
        }
      }
    }
  }

  fn check_assignment(&mut self, target: &'a Token) {
    self.check_ident(target);

    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::Assign]);

    let Some(tok) = self.next() else { return };
    self.expect(
      tok,
      &[TokenKind::IntLiteral, TokenKind::Pred, TokenKind::Succ],
    );

    match tok.kind {
      TokenKind::IntLiteral => {
        self.check_int(tok);
        if tok.text().is_some_and(|text| !is_zero(text)) {
          self.warning(tok, "assigned value is non-zero");
        }
      }
      TokenKind::Pred | TokenKind::Succ => {
        let Some(tok) = self.next() else { return };
        self.expect(tok, &[TokenKind::LParen]);

        let Some(tok) = self.next() else { return };
        self.expect(tok, &[TokenKind::Ident]);
        self.check_ident(tok);

        let Some(tok) = self.next() else { return };
        self.expect(tok, &[TokenKind::RParen]);
      }
      _ => {}
    }
  }

  fn check_while(&mut self) {
    let Some(loop_var) = self.next() else { return };
    self.expect(loop_var, &[TokenKind::Ident]);
    self.check_ident(loop_var);

    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::NotEqual]);

    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::IntLiteral]);
    self.check_int(tok);
    if tok.text().is_some_and(|text| !is_zero(text)) {
      self.error(tok, "this must be zero");
    }

    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::Do]);

    let Some(tok) = self.peek() else { return };
    if tok.kind == TokenKind::End {
      self.warning(tok, "loop is empty and will never finish");
      self.pos += 1;
      return;
    }

    self.check_loop_finite(loop_var);
    self.check_block(true);

    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::End]);
  }

  fn check_result(&mut self) {
    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::LParen]);

    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::Ident]);
    self.check_ident(tok);

    let Some(tok) = self.next() else { return };
    self.expect(tok, &[TokenKind::RParen]);

    let Some(tok) = self.peek() else { return };
    self.expect(tok, &[TokenKind::Eof]);
  }

  /// Scan the loop body (ignoring the grammar) for an assignment that can
  /// drive `loop_var` to zero: `:= 0` or `:= PRED(...)`. Assignments in
  /// nested loops count; the nesting depth only locates the matching `END`.
  /// This is a heuristic and can be fooled in both directions. An unclosed
  /// loop gets no warning.
  fn check_loop_finite(&mut self, loop_var: &'a Token) {
    if loop_var.kind != TokenKind::Ident {
      return;
    }
    let Some(loop_text) = loop_var.text() else {
      return;
    };
    let loop_index = ident_index(loop_text);

    let tokens = self.tokens;
    let mut depth = 0usize;
    for index in self.pos..tokens.len() {
      let tok = &tokens[index];
      match tok.kind {
        TokenKind::Assign => {
          let target = index.checked_sub(1).map(|i| &tokens[i]);
          let Some(target_text) = target
            .filter(|t| t.kind == TokenKind::Ident)
            .and_then(Token::text)
          else {
            continue;
          };
          if ident_index(target_text) != loop_index {
            continue;
          }

          let shrinks = tokens.get(index + 1).is_some_and(|value| match value.kind {
            TokenKind::IntLiteral => value.text().is_some_and(is_zero),
            TokenKind::Pred => true,
            _ => false,
          });
          if shrinks {
            return;
          }
        }
        TokenKind::While => depth += 1,
        TokenKind::End => {
          if depth == 0 {
            let message = format!("the conditional loop var {loop_text} is never modified");
            self.warning(loop_var, message);
            return;
          }
          depth -= 1;
        }
        _ => {}
      }
    }
    // No matching END: the block walk reports that instead.
  }

  fn check_ident(&mut self, tok: &Token) {
    let valid = tok.text().is_some_and(|text| {
      (2..=MAX_IDENT_LEN).contains(&text.len())
        && text.starts_with(['x', 'X'])
        && is_numeric(&text[1..])
        && (ident_index(text) as usize) < NUM_VARS
    });
    if !valid {
      self.error(tok, "invalid identifier");
    }
  }

  fn check_int(&mut self, tok: &Token) {
    let valid = tok
      .text()
      .is_some_and(|text| (1..=MAX_INT_LEN).contains(&text.len()) && is_numeric(text));
    if !valid {
      self.error(tok, "invalid integer");
    }
  }

  /// Record an "expected ..." error unless `tok` is one of `expected`.
  fn expect(&mut self, tok: &Token, expected: &[TokenKind]) {
    if expected.contains(&tok.kind) {
      return;
    }

    let names: Vec<_> = expected.iter().map(|kind| kind.expected_name()).collect();
    let message = format!(
      "expected {} but got {}",
      names.join(" or "),
      describe_token(tok)
    );
    self.error(tok, message);
  }

  fn next(&mut self) -> Option<&'a Token> {
    let tok = self.tokens.get(self.pos)?;
    self.pos += 1;
    Some(tok)
  }

  fn peek(&self) -> Option<&'a Token> {
    self.tokens.get(self.pos)
  }

  fn error(&mut self, tok: &Token, message: impl Into<String>) {
    let diagnostic = Diagnostic::at(tok, self.source, message, false);
    self.diagnostics.push(diagnostic);
  }

  fn warning(&mut self, tok: &Token, message: impl Into<String>) {
    let diagnostic = Diagnostic::at(tok, self.source, message, true);
    self.diagnostics.push(diagnostic);
  }

  fn error_count(&self) -> usize {
    self.diagnostics.iter().filter(|d| !d.is_warning).count()
  }
}

fn is_numeric(text: &str) -> bool {
  !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn is_zero(text: &str) -> bool {
  text.bytes().all(|b| b == b'0')
}
