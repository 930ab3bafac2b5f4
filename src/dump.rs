//! Human-readable renderings of a syntax tree.
//!
//! [`render_tree`] draws the bare tree structure. [`state_dump`] prints the
//! program back as P source with every statement annotated by the current
//! value of the variable it writes or tests; the annotation is a `#`
//! comment, so the dump re-tokenizes to the same program.
//!
//! Both walks recurse once per `WHILE` level.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::vm::VarArray;

/// Spaces added per nesting level in the state dump.
const DUMP_INDENT: usize = 4;

/// Draw the tree with box-drawing branches, one node per line.
pub fn render_tree(ast: &Ast) -> String {
  let mut out = String::new();
  render_node(ast, ast.root(), "", &mut out);
  out
}

fn render_node(ast: &Ast, id: NodeId, prefix: &str, out: &mut String) {
  let node = ast.node(id);
  let line = match node.kind() {
    NodeKind::Program => {
      let inputs: Vec<_> = node.values().iter().map(|var| format!("x{var}")).collect();
      format!("program {}", inputs.join(" "))
    }
    NodeKind::Assign => format!("assign x{} {}", node.value(0), node.value(1)),
    NodeKind::Pred => format!("pred x{} x{}", node.value(0), node.value(1)),
    NodeKind::Succ => format!("succ x{} x{}", node.value(0), node.value(1)),
    NodeKind::While => format!("while x{}", node.value(0)),
    NodeKind::Result => format!("result x{}", node.value(0)),
  };
  out.push_str(&line);
  out.push('\n');

  let children = node.children();
  for (i, &child) in children.iter().enumerate() {
    let last = i + 1 == children.len();
    out.push_str(prefix);
    out.push_str(if last { " └──" } else { " ├──" });

    let nested = format!("{prefix}{}", if last { "    " } else { " │  " });
    render_node(ast, child, &nested, out);
  }
}

/// Print the program as source, annotated with values from `vars`.
pub fn state_dump(ast: &Ast, vars: &VarArray) -> String {
  let mut out = String::new();
  dump_node(ast, ast.root(), 0, vars, &mut out);
  out
}

fn annotation(vars: &VarArray, var: i64) -> String {
  match vars.get(var) {
    Some(value) => format!(" # {value}"),
    None => " # ?".to_string(),
  }
}

fn dump_node(ast: &Ast, id: NodeId, indent: usize, vars: &VarArray, out: &mut String) {
  let node = ast.node(id);
  let pad = " ".repeat(indent);

  match node.kind() {
    NodeKind::Program => {
      let inputs: Vec<_> = node.values().iter().map(|var| format!("X{var}")).collect();
      out.push_str(&format!("{pad}PROGRAM ({})\n", inputs.join(", ")));
      for &child in node.children() {
        dump_node(ast, child, indent + DUMP_INDENT, vars, out);
      }
    }
    NodeKind::Assign => {
      let (var, value) = (node.value(0), node.value(1));
      out.push_str(&format!("{pad}X{var} := {value}{}\n", annotation(vars, var)));
    }
    NodeKind::Pred | NodeKind::Succ => {
      let (target, source) = (node.value(0), node.value(1));
      let op = if node.kind() == NodeKind::Pred { "PRED" } else { "SUCC" };
      out.push_str(&format!(
        "{pad}X{target} := {op}(X{source}){}\n",
        annotation(vars, target)
      ));
    }
    NodeKind::While => {
      let var = node.value(0);
      out.push_str(&format!("{pad}WHILE X{var} != 0 DO{}\n", annotation(vars, var)));
      for &child in node.children() {
        dump_node(ast, child, indent + DUMP_INDENT, vars, out);
      }
      out.push_str(&format!("{pad}END\n"));
    }
    NodeKind::Result => {
      let var = node.value(0);
      out.push_str(&format!("{pad}RESULT (X{var}){}\n", annotation(vars, var)));
    }
  }
}
