//! Lexical analysis: turns P source text into a flat vector of tokens.
//!
//! The tokenizer makes a single left-to-right pass with one character of
//! lookahead for the two-character operators `:=` and `!=`. Positions are
//! tracked as 1-based rows and columns so diagnostics can point at the exact
//! character in the source line.

use log::debug;

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Assign,
  Comma,
  Do,
  End,
  Eof,
  NotEqual,
  Ident,
  IntLiteral,
  LParen,
  Pred,
  Program,
  Result,
  RParen,
  Succ,
  Unknown,
  While,
}

impl TokenKind {
  /// Name used when this kind is what the checker expected to see.
  pub fn expected_name(self) -> &'static str {
    match self {
      TokenKind::Ident => "identifier",
      TokenKind::IntLiteral => "integer",
      other => other.surface(),
    }
  }

  /// Surface form of a structural token.
  pub fn surface(self) -> &'static str {
    match self {
      TokenKind::Assign => ":=",
      TokenKind::Comma => ",",
      TokenKind::Do => "DO",
      TokenKind::End => "END",
      TokenKind::Eof => "<eof>",
      TokenKind::NotEqual => "!=",
      TokenKind::Ident => "<identifier>",
      TokenKind::IntLiteral => "<integer>",
      TokenKind::LParen => "(",
      TokenKind::Pred => "PRED",
      TokenKind::Program => "PROGRAM",
      TokenKind::Result => "RESULT",
      TokenKind::RParen => ")",
      TokenKind::Succ => "SUCC",
      TokenKind::Unknown => "<unknown>",
      TokenKind::While => "WHILE",
    }
  }
}

const KEYWORDS: [(&str, TokenKind); 7] = [
  ("DO", TokenKind::Do),
  ("END", TokenKind::End),
  ("PRED", TokenKind::Pred),
  ("PROGRAM", TokenKind::Program),
  ("RESULT", TokenKind::Result),
  ("SUCC", TokenKind::Succ),
  ("WHILE", TokenKind::While),
];

/// A classified lexeme. Only `Ident` and `IntLiteral` carry their text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub row: usize,
  pub col: usize,
  pub text: Option<String>,
}

impl Token {
  pub fn new(kind: TokenKind, row: usize, col: usize) -> Self {
    Self {
      kind,
      row,
      col,
      text: None,
    }
  }

  pub fn with_text(kind: TokenKind, row: usize, col: usize, text: String) -> Self {
    Self {
      kind,
      row,
      col,
      text: Some(text),
    }
  }

  pub fn text(&self) -> Option<&str> {
    self.text.as_deref()
  }
}

/// Lex the input into a vector of tokens terminated by exactly one `Eof`.
///
/// Unrecognised alphanumeric runs (neither keyword, `X`-identifier nor digit
/// string) produce no token at all; the syntax checker reports whatever
/// follows them instead.
pub fn tokenize(source: &str) -> Vec<Token> {
  let mut tokens = Vec::new();
  let mut chars = source.chars().peekable();
  let mut row = 1;
  let mut col = 1;

  loop {
    let start_col = col;
    let Some(c) = chars.next() else {
      tokens.push(Token::new(TokenKind::Eof, row, start_col));
      break;
    };
    col += 1;

    let kind = match c {
      ' ' | '\r' => continue,
      '\n' => {
        row += 1;
        col = 1;
        continue;
      }
      '\t' => {
        col += 7;
        continue;
      }
      '#' => {
        while chars.next_if(|&next| next != '\n').is_some() {}
        continue;
      }
      ',' => TokenKind::Comma,
      '(' => TokenKind::LParen,
      ')' => TokenKind::RParen,
      ':' | '!' => {
        if chars.next_if_eq(&'=').is_some() {
          col += 1;
          if c == ':' {
            TokenKind::Assign
          } else {
            TokenKind::NotEqual
          }
        } else {
          TokenKind::Unknown
        }
      }
      c if c.is_ascii_alphanumeric() => {
        let mut word = String::from(c);
        while let Some(next) = chars.next_if(char::is_ascii_alphanumeric) {
          word.push(next);
          col += 1;
        }
        if let Some(token) = classify_word(word, row, start_col) {
          tokens.push(token);
        }
        continue;
      }
      _ => TokenKind::Unknown,
    };

    tokens.push(Token::new(kind, row, start_col));
  }

  debug!("tokenized {} bytes into {} tokens", source.len(), tokens.len());
  tokens
}

fn classify_word(word: String, row: usize, col: usize) -> Option<Token> {
  if let Some((_, kind)) = KEYWORDS
    .iter()
    .find(|(keyword, _)| keyword.eq_ignore_ascii_case(&word))
  {
    return Some(Token::new(*kind, row, col));
  }

  if word.starts_with(['x', 'X']) {
    return Some(Token::with_text(TokenKind::Ident, row, col, word));
  }

  if word.bytes().all(|b| b.is_ascii_digit()) {
    return Some(Token::with_text(TokenKind::IntLiteral, row, col, word));
  }

  None
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: &Token) -> &str {
  match (token.kind, token.text()) {
    (TokenKind::Ident | TokenKind::IntLiteral, Some(text)) => text,
    (kind, _) => kind.surface(),
  }
}

/// Parse the leading decimal digits of `text` the way C's `atoi` would,
/// saturating instead of overflowing. Non-digit text yields zero.
pub fn leading_number(text: &str) -> i64 {
  text
    .bytes()
    .take_while(u8::is_ascii_digit)
    .fold(0i64, |acc, digit| {
      acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
    })
}

/// Variable index named by an identifier token's text (`X12` -> 12).
pub fn ident_index(text: &str) -> i64 {
  leading_number(text.get(1..).unwrap_or(""))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
  }

  #[test]
  fn assignment_has_exact_columns() {
    let tokens = tokenize("X1 := 0");
    assert_eq!(
      tokens,
      vec![
        Token::with_text(TokenKind::Ident, 1, 1, "X1".into()),
        Token::new(TokenKind::Assign, 1, 4),
        Token::with_text(TokenKind::IntLiteral, 1, 7, "0".into()),
        Token::new(TokenKind::Eof, 1, 8),
      ]
    );
  }

  #[test]
  fn keywords_are_case_insensitive() {
    let tokens = tokenize("program While do eNd pred SUCC result");
    assert_eq!(
      kinds(&tokens),
      vec![
        TokenKind::Program,
        TokenKind::While,
        TokenKind::Do,
        TokenKind::End,
        TokenKind::Pred,
        TokenKind::Succ,
        TokenKind::Result,
        TokenKind::Eof,
      ]
    );
  }

  #[test]
  fn identifiers_keep_their_case() {
    let tokens = tokenize("x7 X042 007");
    assert_eq!(tokens[0].text(), Some("x7"));
    assert_eq!(tokens[1].text(), Some("X042"));
    assert_eq!(tokens[2].kind, TokenKind::IntLiteral);
    assert_eq!(tokens[2].text(), Some("007"));
  }

  #[test]
  fn comments_are_skipped_without_disturbing_rows() {
    let tokens = tokenize("# header X1 := 0\nX2 # trailing\n  END");
    assert_eq!(
      kinds(&tokens),
      vec![TokenKind::Ident, TokenKind::End, TokenKind::Eof]
    );
    assert_eq!((tokens[0].row, tokens[0].col), (2, 1));
    assert_eq!((tokens[1].row, tokens[1].col), (3, 3));
  }

  #[test]
  fn tab_advances_eight_columns() {
    let tokens = tokenize("\tDO");
    assert_eq!((tokens[0].row, tokens[0].col), (1, 9));
  }

  #[test]
  fn malformed_operators_become_unknown() {
    let tokens = tokenize(": ! @ :=");
    assert_eq!(
      kinds(&tokens),
      vec![
        TokenKind::Unknown,
        TokenKind::Unknown,
        TokenKind::Unknown,
        TokenKind::Assign,
        TokenKind::Eof,
      ]
    );
    assert_eq!(tokens[3].col, 7);
  }

  #[test]
  fn unrecognised_words_are_dropped() {
    let tokens = tokenize("foo X1 12ab");
    assert_eq!(kinds(&tokens), vec![TokenKind::Ident, TokenKind::Eof]);
    assert_eq!(tokens[0].col, 5);
  }

  #[test]
  fn empty_input_is_just_eof() {
    let tokens = tokenize("");
    assert_eq!(tokens, vec![Token::new(TokenKind::Eof, 1, 1)]);
  }

  #[test]
  fn describe_prefers_lexeme_text() {
    let tokens = tokenize("X3 42 := )");
    let described: Vec<_> = tokens.iter().map(describe_token).collect();
    assert_eq!(described, vec!["X3", "42", ":=", ")", "<eof>"]);
  }

  #[test]
  fn leading_number_behaves_like_atoi() {
    assert_eq!(leading_number("0042"), 42);
    assert_eq!(leading_number("12ab"), 12);
    assert_eq!(leading_number("ab"), 0);
    assert_eq!(leading_number("99999999999999999999999"), i64::MAX);
    assert_eq!(ident_index("X999"), 999);
  }
}
