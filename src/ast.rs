//! Syntax tree shared by the interpreter and the code generator.
//!
//! Nodes live in an arena owned by [`Ast`] and refer to each other by
//! [`NodeId`]. A node's parent is recorded once, when it is attached, and is
//! only used for upward traversal; ownership always flows from the arena.

/// Index of a node inside its [`Ast`]. Only meaningful for the tree that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
  pub fn index(self) -> usize {
    self.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
  /// `values`: declared input variables, in declaration order.
  Program,
  /// `values`: `[target, literal]`.
  Assign,
  /// `values`: `[target, source]`.
  Pred,
  /// `values`: `[target, source]`.
  Succ,
  /// `values`: `[test_var]`.
  While,
  /// `values`: `[output_var]`.
  Result,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  kind: NodeKind,
  parent: Option<NodeId>,
  children: Vec<NodeId>,
  values: Vec<i64>,
}

impl Node {
  pub fn kind(&self) -> NodeKind {
    self.kind
  }

  pub fn parent(&self) -> Option<NodeId> {
    self.parent
  }

  pub fn children(&self) -> &[NodeId] {
    &self.children
  }

  pub fn values(&self) -> &[i64] {
    &self.values
  }

  /// The `index`-th value, or `-1` (never a valid variable) when absent.
  pub fn value(&self, index: usize) -> i64 {
    self.values.get(index).copied().unwrap_or(-1)
  }
}

/// A complete program tree. The root is always a `Program` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
  nodes: Vec<Node>,
}

impl Ast {
  const ROOT: NodeId = NodeId(0);

  /// Start a tree whose root declares `inputs`.
  pub fn new(inputs: Vec<i64>) -> Self {
    Self {
      nodes: vec![Node {
        kind: NodeKind::Program,
        parent: None,
        children: Vec::new(),
        values: inputs,
      }],
    }
  }

  pub fn root(&self) -> NodeId {
    Self::ROOT
  }

  /// Input variables declared by the `PROGRAM` header.
  pub fn inputs(&self) -> &[i64] {
    &self.nodes[Self::ROOT.0].values
  }

  pub fn node(&self, id: NodeId) -> &Node {
    &self.nodes[id.0]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Attach a new node as the last child of `parent`.
  pub fn push_child(&mut self, parent: NodeId, kind: NodeKind, values: Vec<i64>) -> NodeId {
    let id = NodeId(self.nodes.len());
    self.nodes.push(Node {
      kind,
      parent: Some(parent),
      children: Vec::new(),
      values,
    });
    self.nodes[parent.0].children.push(id);
    id
  }

  /// Follow parent links from `id` to the root.
  ///
  /// # Panics
  /// If the node reached is not a `Program` node; that can only happen if the
  /// tree's own invariants are broken.
  pub fn find_root(&self, id: NodeId) -> NodeId {
    let mut current = id;
    while let Some(parent) = self.nodes[current.0].parent {
      current = parent;
    }
    assert_eq!(
      self.nodes[current.0].kind,
      NodeKind::Program,
      "syntax tree root must be a PROGRAM node"
    );
    current
  }

  /// True when `id` is the very last node of the tree in execution order: it
  /// has no children, and it and each of its ancestors is the last child of
  /// its parent.
  pub fn is_last_node(&self, id: NodeId) -> bool {
    if !self.nodes[id.0].children.is_empty() {
      return false;
    }

    let mut current = id;
    while let Some(parent) = self.nodes[current.0].parent {
      if self.nodes[parent.0].children.last() != Some(&current) {
        return false;
      }
      current = parent;
    }
    true
  }

  /// Depth-first, pre-order walk over every node id.
  pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
    let mut stack = vec![Self::ROOT];
    std::iter::from_fn(move || {
      let id = stack.pop()?;
      stack.extend(self.nodes[id.0].children.iter().rev().copied());
      Some(id)
    })
  }
}
