//! Tree-walking interpreter for P programs.
//!
//! Variables are 32-bit naturals: `PRED` saturates at zero and `SUCC` past
//! `i32::MAX` is an overflow fault. Execution is single-threaded and runs to
//! completion; a `WHILE` whose test variable never reaches zero runs forever
//! unless the (unsound, off by default) infinite-loop check is enabled.
//!
//! The walk recurses once per nested `WHILE`; nesting depth is bounded by the
//! stack.

use log::{trace, warn};
use snafu::Snafu;

use crate::ast::{Ast, NodeId, NodeKind};

/// Number of addressable variables, `X0` through `X999`.
pub const NUM_VARS: usize = 1000;

/// Terminal conditions that abort a run. The variable array keeps whatever
/// state it had when the fault was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum VmFault {
  #[snafu(display("Program got stuck in an infinite loop (X{index} did not change)."))]
  InfiniteLoop { index: i64 },

  #[snafu(display("Attempted to use an invalid variable (X{index})."))]
  InvalidVariable { index: i64 },

  #[snafu(display("A variable overflowed (X{index})."))]
  Overflow { index: i64 },

  #[snafu(display("Premature RESULT node encountered."))]
  PrematureResult,

  #[snafu(display("Program finished without reaching RESULT."))]
  MissingResult,
}

impl VmFault {
  /// Stable numeric code for the fault.
  pub fn code(&self) -> i32 {
    match self {
      VmFault::MissingResult => -1,
      VmFault::InfiniteLoop { .. } => -2,
      VmFault::InvalidVariable { .. } => -3,
      VmFault::Overflow { .. } => -4,
      VmFault::PrematureResult => -5,
    }
  }
}

/// The machine's variable memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarArray {
  values: Vec<i32>,
}

impl Default for VarArray {
  fn default() -> Self {
    Self::new()
  }
}

impl VarArray {
  /// All variables zero.
  pub fn new() -> Self {
    Self {
      values: vec![0; NUM_VARS],
    }
  }

  /// Value of `X<index>`, or `None` if the index is out of range.
  pub fn get(&self, index: i64) -> Option<i32> {
    let slot = usize::try_from(index).ok()?;
    self.values.get(slot).copied()
  }

  /// Store `value` into `X<index>`. Fails for out-of-range indices.
  pub fn set(&mut self, index: i64, value: i32) -> Result<(), VmFault> {
    let slot = self.slot(index)?;
    *slot = value;
    Ok(())
  }

  pub fn as_slice(&self) -> &[i32] {
    &self.values
  }

  fn slot(&mut self, index: i64) -> Result<&mut i32, VmFault> {
    usize::try_from(index)
      .ok()
      .and_then(|slot| self.values.get_mut(slot))
      .ok_or(VmFault::InvalidVariable { index })
  }

  fn read(&self, index: i64) -> Result<i32, VmFault> {
    self.get(index).ok_or(VmFault::InvalidVariable { index })
  }
}

/// The value an `Assign` of `literal` stores, or `None` when it does not fit
/// a variable. Negative literals clamp to zero.
pub fn assigned_value(literal: i64) -> Option<i32> {
  i32::try_from(literal.max(0)).ok()
}

/// Interpreter switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmConfig {
  /// Report every loop entry and iteration to the [`Tracer`].
  pub debug: bool,
  /// Fault with [`VmFault::InfiniteLoop`] when a full loop iteration leaves
  /// the test variable unchanged. This is a guess: a loop can legitimately
  /// pass through the same value again.
  pub detect_infinite_loops: bool,
}

/// Observer for debug stepping.
pub trait Tracer {
  /// Called when `node` (a `WHILE`) is entered and after each iteration.
  fn loop_step(&mut self, ast: &Ast, node: NodeId, vars: &VarArray);
}

/// A [`Tracer`] that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTrace;

impl Tracer for NoTrace {
  fn loop_step(&mut self, _ast: &Ast, _node: NodeId, _vars: &VarArray) {}
}

/// Run `ast` against `vars` with the default configuration.
pub fn execute(ast: &Ast, vars: &mut VarArray) -> Result<i32, VmFault> {
  execute_with(ast, vars, VmConfig::default(), &mut NoTrace)
}

/// Run `ast` against `vars`, returning the value of the final `RESULT`.
pub fn execute_with(
  ast: &Ast,
  vars: &mut VarArray,
  config: VmConfig,
  tracer: &mut dyn Tracer,
) -> Result<i32, VmFault> {
  let mut vm = Vm {
    ast,
    vars,
    config,
    tracer,
  };

  let outcome = match vm.exec(ast.root()) {
    Ok(Flow::Done(value)) => Ok(value),
    Ok(Flow::Continue) => Err(VmFault::MissingResult),
    Err(fault) => Err(fault),
  };
  if let Err(fault) = &outcome {
    warn!("execution aborted: {fault}");
  }
  outcome
}

enum Flow {
  Continue,
  Done(i32),
}

struct Vm<'a> {
  ast: &'a Ast,
  vars: &'a mut VarArray,
  config: VmConfig,
  tracer: &'a mut dyn Tracer,
}

impl Vm<'_> {
  fn exec(&mut self, id: NodeId) -> Result<Flow, VmFault> {
    let ast = self.ast;
    let node = ast.node(id);
    trace!("exec {:?} {:?}", node.kind(), node.values());

    match node.kind() {
      NodeKind::Program => self.exec_children(id),
      NodeKind::Assign => {
        let target = node.value(0);
        self.vars.read(target)?;
        let value =
          assigned_value(node.value(1)).ok_or(VmFault::Overflow { index: target })?;
        self.vars.set(target, value)?;
        Ok(Flow::Continue)
      }
      NodeKind::Pred | NodeKind::Succ => {
        let (target, source) = (node.value(0), node.value(1));
        let current = i64::from(self.vars.read(source)?);
        self.vars.read(target)?;

        let value = if node.kind() == NodeKind::Pred {
          (current - 1).max(0)
        } else {
          current + 1
        };
        let value = i32::try_from(value).map_err(|_| VmFault::Overflow { index: target })?;
        self.vars.set(target, value)?;
        Ok(Flow::Continue)
      }
      NodeKind::While => self.exec_while(id),
      NodeKind::Result => {
        let output = node.value(0);
        let value = self.vars.read(output)?;
        if ast.is_last_node(id) {
          Ok(Flow::Done(value))
        } else {
          Err(VmFault::PrematureResult)
        }
      }
    }
  }

  fn exec_children(&mut self, id: NodeId) -> Result<Flow, VmFault> {
    let ast = self.ast;
    for &child in ast.node(id).children() {
      if let Flow::Done(value) = self.exec(child)? {
        return Ok(Flow::Done(value));
      }
    }
    Ok(Flow::Continue)
  }

  fn exec_while(&mut self, id: NodeId) -> Result<Flow, VmFault> {
    let test_var = self.ast.node(id).value(0);
    self.vars.read(test_var)?;

    if self.config.debug {
      self.tracer.loop_step(self.ast, id, &*self.vars);
    }

    loop {
      let before = self.vars.read(test_var)?;
      if before == 0 {
        return Ok(Flow::Continue);
      }

      if let Flow::Done(value) = self.exec_children(id)? {
        return Ok(Flow::Done(value));
      }

      let after = self.vars.read(test_var)?;
      trace!("loop on X{test_var}: {before} -> {after}");
      if self.config.detect_infinite_loops && after == before {
        return Err(VmFault::InfiniteLoop { index: test_var });
      }

      if self.config.debug {
        self.tracer.loop_step(self.ast, id, &*self.vars);
      }
    }
  }
}
