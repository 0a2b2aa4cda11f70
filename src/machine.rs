//! The execution engine.
//!
//! A `Machine` owns the runtime state shared by a program and all of its
//! nested frames: the variable scopes, the three auxiliary control stacks
//! (branch / loop / storer) and the step/recursion budget. One machine is
//! created per `execute` call, so independent interpreters coexist freely
//! in a process.
//!
//! Frames form a parent chain down the host call stack: a block runs with
//! its invoking frame as parent, which is what `∇` re-executes.

use crate::error::TinError;
use crate::intrinsics;
use crate::lexer::{self, TokenTable};
use crate::token::{MetaOp, Program, Token};
use crate::value::Value;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Execution budget. The step limit bounds runaway branch loops, the
/// depth limit bounds runaway self-reference (a top-level `∇` re-executes
/// its own program and would otherwise never return).
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Maximum tokens dispatched per `execute` call.
    pub max_steps: u64,
    /// Maximum nesting of block / word / self-reference frames.
    pub max_depth: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000_000,
            max_depth: 256,
        }
    }
}

/// One open foreach loop.
#[derive(Debug, Clone)]
struct LoopFrame {
    /// Token index of the `{` opener.
    opener: usize,
    /// The iterable, popped at first entry.
    items: crate::array::NumArray,
    /// Current position along the leading axis.
    index: usize,
}

/// An executing program and its link to the invoking frame.
struct Frame<'a> {
    program: &'a Program,
    parent: Option<&'a Frame<'a>>,
}

/// What a meta operation asks the engine to do next.
enum Flow {
    /// Fall through to the next token.
    Next,
    /// Skip the following token as well.
    Skip,
    /// Jump to an absolute token index.
    Jump(usize),
}

/// Runtime state for one `execute` call.
#[derive(Debug)]
pub struct Machine {
    config: MachineConfig,
    /// Variable scopes: each name holds a stack of shadowed values.
    vars: HashMap<String, Vec<Value>>,
    /// Open `[` positions.
    branches: Vec<usize>,
    /// Open `{` frames.
    loops: Vec<LoopFrame>,
    /// Stack lengths recorded at `(`.
    storers: Vec<usize>,
    steps: u64,
    depth: usize,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

fn pop(stack: &mut Vec<Value>, op: &str) -> Result<Value, TinError> {
    stack
        .pop()
        .ok_or_else(|| TinError::StackUnderflow(op.to_string()))
}

impl Machine {
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    pub fn with_config(config: MachineConfig) -> Self {
        Self {
            config,
            vars: HashMap::new(),
            branches: Vec::new(),
            loops: Vec::new(),
            storers: Vec::new(),
            steps: 0,
            depth: 0,
        }
    }

    /// Run a program against an initial stack and return the final stack.
    ///
    /// On success all control stacks are empty again; a leftover frame
    /// means the program's brackets were unbalanced.
    pub fn execute(
        &mut self,
        program: &Program,
        stack: Vec<Value>,
    ) -> Result<Vec<Value>, TinError> {
        self.steps = 0;
        let mut stack = stack;
        let frame = Frame {
            program,
            parent: None,
        };
        self.run(&frame, &mut stack)?;

        if !self.branches.is_empty() || !self.loops.is_empty() || !self.storers.is_empty() {
            return Err(TinError::Malformed(
                "control brackets left open at end of program".into(),
            ));
        }
        debug!(depth = stack.len(), steps = self.steps, "execution finished");
        Ok(stack)
    }

    /// Number of live variable scopes (used to check that balanced
    /// programs release everything they bind).
    pub fn scope_count(&self) -> usize {
        self.vars.len()
    }

    /// Drop any control stacks left behind by a failed execution so the
    /// machine can be reused (the REPL does this between lines).
    pub fn reset_control(&mut self) {
        self.branches.clear();
        self.loops.clear();
        self.storers.clear();
    }

    fn run(&mut self, frame: &Frame<'_>, stack: &mut Vec<Value>) -> Result<(), TinError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            self.depth -= 1;
            return Err(TinError::LimitExceeded(format!(
                "frame depth above {}",
                self.config.max_depth
            )));
        }
        let result = self.run_tokens(frame, stack);
        self.depth -= 1;
        result
    }

    fn run_tokens(&mut self, frame: &Frame<'_>, stack: &mut Vec<Value>) -> Result<(), TinError> {
        let tokens = &frame.program.tokens;
        let mut ip = 0usize;

        while ip < tokens.len() {
            self.steps += 1;
            if self.steps > self.config.max_steps {
                return Err(TinError::LimitExceeded(format!(
                    "more than {} steps",
                    self.config.max_steps
                )));
            }
            trace!(ip, token = ?tokens[ip], "dispatch");

            match &tokens[ip] {
                Token::Literal(v) => stack.push(v.clone()),

                Token::Intrinsic(op) => {
                    let mut args = Vec::with_capacity(op.arity());
                    for _ in 0..op.arity() {
                        args.push(pop(stack, op.glyph())?);
                    }
                    if let Some(v) = intrinsics::apply(*op, &args)? {
                        stack.push(v);
                    }
                }

                Token::Meta(m) => match self.meta(m, ip, frame, stack)? {
                    Flow::Next => {}
                    Flow::Skip => ip += 1,
                    Flow::Jump(target) => {
                        ip = target;
                        continue;
                    }
                },

                Token::Block(sub) => {
                    let child = Frame {
                        program: sub.as_ref(),
                        parent: Some(frame),
                    };
                    self.run(&child, stack)?;
                }

                Token::Word { body, .. } => {
                    let child = Frame {
                        program: body.as_ref(),
                        parent: None,
                    };
                    self.run(&child, stack)?;
                }

                Token::Definition { .. } => {}
            }

            ip += 1;
        }
        Ok(())
    }

    fn meta(
        &mut self,
        op: &MetaOp,
        ip: usize,
        frame: &Frame<'_>,
        stack: &mut Vec<Value>,
    ) -> Result<Flow, TinError> {
        match op {
            MetaOp::Dup => {
                let top = stack
                    .last()
                    .cloned()
                    .ok_or_else(|| TinError::StackUnderflow("!".into()))?;
                stack.push(top);
            }

            MetaOp::Copy => {
                let len = stack.len();
                let k = stack
                    .last()
                    .ok_or_else(|| TinError::StackUnderflow("↷".into()))?
                    .as_index("↷")?;
                if k < 0 || (k as usize) + 1 > len {
                    return Err(TinError::StackUnderflow("↷".into()));
                }
                // Read with the count still on the stack, then overwrite it.
                stack[len - 1] = stack[len - 1 - k as usize].clone();
            }

            MetaOp::Swap => {
                let len = stack.len();
                if len < 2 {
                    return Err(TinError::StackUnderflow("↶".into()));
                }
                stack.swap(len - 1, len - 2);
            }

            MetaOp::SkipFalse => {
                if !pop(stack, "?")?.truthy()? {
                    return Ok(Flow::Skip);
                }
            }
            MetaOp::SkipFalsePeek => {
                let top = stack
                    .last()
                    .ok_or_else(|| TinError::StackUnderflow("◊".into()))?;
                if !top.truthy()? {
                    return Ok(Flow::Skip);
                }
            }
            MetaOp::SkipTrue => {
                if pop(stack, ":")?.truthy()? {
                    return Ok(Flow::Skip);
                }
            }

            MetaOp::BranchOpen => self.branches.push(ip),
            MetaOp::BranchClose => {
                let opener = self
                    .branches
                    .pop()
                    .ok_or_else(|| TinError::Malformed("`]` without matching `[`".into()))?;
                if pop(stack, "]")?.truthy()? {
                    return Ok(Flow::Jump(opener));
                }
            }

            MetaOp::LoopOpen => {
                let reentry = self.loops.last().map_or(false, |f| f.opener == ip);
                if reentry {
                    self.loops.last_mut().expect("checked non-empty").index += 1;
                } else {
                    let items = match pop(stack, "{")? {
                        Value::Array(a) => a,
                        other => {
                            return Err(TinError::Type {
                                op: "{".into(),
                                msg: format!("cannot iterate over {}", other.kind()),
                            })
                        }
                    };
                    self.loops.push(LoopFrame {
                        opener: ip,
                        items,
                        index: 0,
                    });
                }
                let f = self.loops.last().expect("frame just ensured");
                stack.push(f.items.index(f.index as i64)?);
            }
            MetaOp::LoopClose => {
                let f = self
                    .loops
                    .last()
                    .ok_or_else(|| TinError::Malformed("`}` without matching `{`".into()))?;
                if f.index + 1 < f.items.len_axis0() {
                    return Ok(Flow::Jump(f.opener));
                }
                self.loops.pop();
            }

            MetaOp::StoreOpen => self.storers.push(stack.len()),
            MetaOp::StoreClose => {
                let pos = self
                    .storers
                    .pop()
                    .ok_or_else(|| TinError::Malformed("`)` without matching `(`".into()))?;
                let tail = stack.split_off(pos.min(stack.len()));
                let arr = crate::array::NumArray::from_values(&tail)?;
                stack.push(Value::Array(arr));
            }

            MetaOp::Bind(name) => {
                let v = pop(stack, &format!("→{}", name))?;
                self.vars.entry(name.clone()).or_default().push(v);
            }
            MetaOp::Unbind(name) => {
                let entry = self
                    .vars
                    .get_mut(name)
                    .ok_or_else(|| TinError::UndefinedVariable(name.clone()))?;
                entry.pop();
                if entry.is_empty() {
                    self.vars.remove(name);
                }
            }
            MetaOp::Fetch(name) => {
                let v = self
                    .vars
                    .get(name)
                    .and_then(|entry| entry.last())
                    .cloned()
                    .ok_or_else(|| TinError::UndefinedVariable(name.clone()))?;
                stack.push(v);
            }

            MetaOp::SelfRef => {
                let (program, parent) = match frame.parent {
                    Some(p) => (p.program, p.parent),
                    None => (frame.program, None),
                };
                let rerun = Frame { program, parent };
                self.run(&rerun, stack)?;
            }
        }
        Ok(Flow::Next)
    }
}

/// A compiled Tin program, ready to execute.
///
/// This is the public entry point: one constructor taking source text,
/// one method running it against an initial stack.
///
/// ```
/// use tin::{Tin, Value};
///
/// let program = Tin::new("ι⊳∏").unwrap();
/// let stack = program.execute(vec![Value::Int(5)]).unwrap();
/// assert_eq!(stack, vec![Value::Int(120)]);
/// ```
#[derive(Debug, Clone)]
pub struct Tin {
    program: Program,
    config: MachineConfig,
}

impl Tin {
    /// Compile `source` with a fresh token table.
    pub fn new(source: &str) -> Result<Self, TinError> {
        let mut table = TokenTable::new();
        Self::with_table(source, &mut table)
    }

    /// Compile `source` against an existing table, so definitions from
    /// earlier programs stay visible and new ones become visible to later
    /// programs.
    pub fn with_table(source: &str, table: &mut TokenTable) -> Result<Self, TinError> {
        let program = lexer::compile(source, table)?;
        Ok(Self {
            program,
            config: MachineConfig::default(),
        })
    }

    /// Replace the execution budget.
    pub fn with_config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Run the program on a fresh machine and return the final stack.
    pub fn execute(&self, initial: Vec<Value>) -> Result<Vec<Value>, TinError> {
        let mut machine = Machine::with_config(self.config.clone());
        machine.execute(&self.program, initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str, stack: Vec<Value>) -> Vec<Value> {
        Tin::new(src)
            .expect("program compiles")
            .execute(stack)
            .expect("program runs")
    }

    fn run_err(src: &str, stack: Vec<Value>) -> TinError {
        Tin::new(src)
            .expect("program compiles")
            .execute(stack)
            .expect_err("program fails")
    }

    #[test]
    fn literals_push() {
        assert_eq!(run("1 2 3", vec![]), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn dup_duplicates_the_top() {
        assert_eq!(run("!", vec![Value::Int(7)]), vec![Value::Int(7), Value::Int(7)]);
    }

    #[test]
    fn swap_exchanges_the_top_two() {
        assert_eq!(
            run("↶", vec![Value::Int(1), Value::Int(2)]),
            vec![Value::Int(2), Value::Int(1)]
        );
    }

    #[test]
    fn copy_reads_below_the_count() {
        // k = 1 replaces the count with the value right under it.
        assert_eq!(
            run("1↷", vec![Value::Int(7), Value::Int(9)]),
            vec![Value::Int(7), Value::Int(9), Value::Int(9)]
        );
        // k = 0 reads the count itself.
        assert_eq!(run("0↷", vec![Value::Int(7)]), vec![Value::Int(7), Value::Int(0)]);
    }

    #[test]
    fn intrinsic_operands_pop_in_reverse_source_order() {
        // `5 3 -` computes 3 - 5.
        assert_eq!(run("5 3 -", vec![]), vec![Value::Int(-2)]);
        // `20 4 /` computes 4 / 20.
        assert_eq!(run("20 4 /", vec![]), vec![Value::Float(0.2)]);
    }

    #[test]
    fn conditional_skips() {
        assert_eq!(run("1?2 3", vec![]), vec![Value::Int(2), Value::Int(3)]);
        assert_eq!(run("0?2 3", vec![]), vec![Value::Int(3)]);
        // `◊` peeks instead of popping.
        assert_eq!(run("0◊2 3", vec![]), vec![Value::Int(0), Value::Int(3)]);
        // `:` skips on truthy.
        assert_eq!(run("1:2 3", vec![]), vec![Value::Int(3)]);
        assert_eq!(run("0:2 3", vec![]), vec![Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn conditionals_skip_whole_blocks() {
        assert_eq!(run("0?⟨1 2 3⟩9", vec![]), vec![Value::Int(9)]);
        assert_eq!(
            run("1?⟨1 2⟩9", vec![]),
            vec![Value::Int(1), Value::Int(2), Value::Int(9)]
        );
    }

    #[test]
    fn branch_loops_until_flag_is_falsy() {
        // Count down to zero, duplicating the counter as the loop flag.
        assert_eq!(run("[⊲!]", vec![Value::Int(3)]), vec![Value::Int(0)]);
    }

    #[test]
    fn foreach_pushes_each_element() {
        assert_eq!(
            run("3ι{⊳}", vec![]),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn foreach_consumes_the_iterable_only_once() {
        // An empty body leaves exactly the elements behind.
        assert_eq!(run("2ι{}", vec![]), vec![Value::Int(0), Value::Int(1)]);
    }

    #[test]
    fn foreach_over_empty_array_is_an_index_error() {
        assert!(matches!(
            run_err("0ι{⊳}", vec![]),
            TinError::Index { .. }
        ));
    }

    #[test]
    fn storer_captures_the_produced_suffix() {
        let out = run("0 (1 2 3)", vec![]);
        assert_eq!(out.len(), 2);
        match &out[1] {
            Value::Array(a) => {
                assert_eq!(a.shape(), &[3]);
                assert_eq!(a.index(0).unwrap(), Value::Int(1));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn empty_storer_leaves_an_empty_array() {
        let out = run("( )", vec![]);
        match &out[0] {
            Value::Array(a) => assert_eq!(a.size(), 0),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn variables_shadow_and_release() {
        assert_eq!(run("5→x .x .x ←x", vec![]), vec![Value::Int(5), Value::Int(5)]);
        // Inner binding shadows, unbinding reveals the outer one.
        assert_eq!(
            run("1→x 2→x .x ←x .x ←x", vec![]),
            vec![Value::Int(2), Value::Int(1)]
        );
    }

    #[test]
    fn balanced_programs_release_their_scopes() {
        let tin = Tin::new("5→x .x ←x").expect("compiles");
        let mut machine = Machine::new();
        machine
            .execute(tin.program(), vec![])
            .expect("runs");
        assert_eq!(machine.scope_count(), 0);
    }

    #[test]
    fn fetching_an_unbound_variable_fails() {
        assert_eq!(run_err(".zz", vec![]), TinError::UndefinedVariable("zz".into()));
        assert_eq!(run_err("←zz", vec![]), TinError::UndefinedVariable("zz".into()));
    }

    #[test]
    fn popping_an_empty_stack_fails() {
        assert!(matches!(run_err("!", vec![]), TinError::StackUnderflow(_)));
        assert!(matches!(run_err("+", vec![Value::Int(1)]), TinError::StackUnderflow(_)));
    }

    #[test]
    fn unbalanced_brackets_are_malformed() {
        assert!(matches!(run_err("(1 2", vec![]), TinError::Malformed(_)));
        assert!(matches!(run_err("1[⊲!", vec![]), TinError::Malformed(_)));
        assert!(matches!(run_err(")", vec![]), TinError::Malformed(_)));
        assert!(matches!(run_err("0]", vec![]), TinError::Malformed(_)));
    }

    #[test]
    fn words_run_their_bodies() {
        assert_eq!(run("|⊳⊳|→|P| 5 P", vec![]), vec![Value::Int(7)]);
    }

    #[test]
    fn top_level_self_reference_hits_the_depth_budget() {
        assert!(matches!(
            run_err("∇", vec![]),
            TinError::LimitExceeded(_)
        ));
    }

    #[test]
    fn runaway_branch_hits_the_step_budget() {
        let tin = Tin::new("[1]")
            .expect("compiles")
            .with_config(MachineConfig {
                max_steps: 10_000,
                ..MachineConfig::default()
            });
        assert!(matches!(
            tin.execute(vec![Value::Int(1)]),
            Err(TinError::LimitExceeded(_))
        ));
    }

    #[test]
    fn nested_foreach_builds_a_multiplication_table() {
        // For each i in [0,3): for each j in [0,3): push i·j, collect rows.
        let out = run("(3ι{→i(3ι{.i·})←i})", vec![]);
        match &out[0] {
            Value::Array(a) => {
                assert_eq!(a.shape(), &[3, 3]);
                assert_eq!(
                    a.index(2).unwrap(),
                    Value::Array(crate::array::NumArray::Int(
                        ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(&[3]), vec![0, 2, 4])
                            .unwrap()
                    ))
                );
            }
            other => panic!("expected matrix, got {:?}", other),
        }
    }
}
