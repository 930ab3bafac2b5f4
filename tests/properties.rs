use plang::dump::state_dump;
use plang::tokenizer::tokenize;
use plang::{Ast, NodeId, NodeKind, TokenKind, VarArray, check_source, parse_program};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Stmt {
  Assign(i64, i64),
  Pred(i64, i64),
  Succ(i64, i64),
  While(i64, Vec<Stmt>),
}

fn var() -> impl Strategy<Value = i64> {
  0i64..1000
}

fn stmt() -> impl Strategy<Value = Stmt> {
  let leaf = prop_oneof![
    (var(), 0i64..100_000).prop_map(|(target, value)| Stmt::Assign(target, value)),
    (var(), var()).prop_map(|(target, source)| Stmt::Pred(target, source)),
    (var(), var()).prop_map(|(target, source)| Stmt::Succ(target, source)),
  ];
  leaf.prop_recursive(3, 32, 4, |inner| {
    (var(), prop::collection::vec(inner, 0..4)).prop_map(|(test, body)| Stmt::While(test, body))
  })
}

fn attach(ast: &mut Ast, scope: NodeId, stmt: &Stmt) {
  match stmt {
    Stmt::Assign(target, value) => {
      ast.push_child(scope, NodeKind::Assign, vec![*target, *value]);
    }
    Stmt::Pred(target, source) => {
      ast.push_child(scope, NodeKind::Pred, vec![*target, *source]);
    }
    Stmt::Succ(target, source) => {
      ast.push_child(scope, NodeKind::Succ, vec![*target, *source]);
    }
    Stmt::While(test, body) => {
      let looped = ast.push_child(scope, NodeKind::While, vec![*test]);
      for inner in body {
        attach(ast, looped, inner);
      }
    }
  }
}

fn program() -> impl Strategy<Value = Ast> {
  (
    prop::collection::vec(var(), 1..4),
    prop::collection::vec(stmt(), 0..6),
    var(),
  )
    .prop_map(|(inputs, body, output)| {
      let mut ast = Ast::new(inputs);
      let root = ast.root();
      for stmt in &body {
        attach(&mut ast, root, stmt);
      }
      ast.push_child(root, NodeKind::Result, vec![output]);
      ast
    })
}

proptest! {
  #[test]
  fn state_dump_rebuilds_an_equal_tree(ast in program()) {
    let source = state_dump(&ast, &VarArray::new());
    let (_, report) = check_source(&source);
    prop_assert!(report.ok(), "{:?}", report.diagnostics);
    prop_assert_eq!(parse_program(&source).unwrap(), ast);
  }

  #[test]
  fn tokenizer_always_ends_with_a_single_eof(source in any::<String>()) {
    let tokens = tokenize(&source);
    prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    prop_assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);
    prop_assert!(tokens.iter().all(|t| t.row >= 1 && t.col >= 1));
  }

  #[test]
  fn checked_programs_always_build(source in "[A-Za-z0-9 :=!(),#\n\t]{0,80}") {
    let (tokens, report) = check_source(&source);
    if report.ok() {
      prop_assert!(plang::build_checked(&tokens, &report).is_ok());
    }
  }
}
