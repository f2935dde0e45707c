//! Per-step execution trace.
//!
//! A tracer is a read-only observer: the engine hands it snapshots of its
//! state once per cycle and it writes them to a sink. It never mutates
//! engine state.

use std::io::{self, Write};

use crate::cell::Cell;
use crate::stack::Stack;
use crate::vars::Vars;

pub struct Tracer {
    sink: Box<dyn Write>,
}

impl Tracer {
    pub fn new(sink: Box<dyn Write>) -> Self {
        Tracer { sink }
    }

    /// Record one executed cycle: the cell as fetched, and the machine state
    /// after dispatch.
    pub fn record(
        &mut self,
        step: u64,
        pos: [i32; 3],
        cell: Cell,
        mode: &str,
        stack: &Stack,
        vars: &Vars,
    ) -> io::Result<()> {
        writeln!(self.sink, " step: {step}")?;
        writeln!(self.sink, "  pos: ({}, {}, {})", pos[0], pos[1], pos[2])?;
        writeln!(self.sink, " cell: {cell}")?;
        writeln!(self.sink, " mode: {mode}")?;
        writeln!(self.sink, "stack: {:?} {:?}", stack.values(), stack_text(stack))?;
        let vars_line: Vec<String> = vars
            .sorted_entries()
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        writeln!(self.sink, " vars: {{{}}}", vars_line.join(", "))?;
        writeln!(self.sink)
    }

    /// Summary line once the run ends.
    pub fn finish(&mut self, steps: u64) -> io::Result<()> {
        writeln!(self.sink, "program terminated in {steps} steps")
    }
}

/// The stack rendered as text, for spotting character data at a glance.
fn stack_text(stack: &Stack) -> String {
    stack
        .values()
        .iter()
        .map(|&v| char::from_u32(v as u32).filter(|c| !c.is_control()).unwrap_or('.'))
        .collect()
}
