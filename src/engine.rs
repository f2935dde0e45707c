//! The execution engine: a fetch-dispatch-advance loop over the program
//! volume.
//!
//! Each cycle fetches the cell under the instruction pointer, dispatches it
//! through the active mode's table, then moves one cell along the heading
//! (unless the cycle performed an explicit jump). Fetching outside the
//! volume is fatal, as are division/modulus by zero and the error-raise
//! cell; everything else that cannot be carried out degrades to a no-op.

use std::io::{BufRead, Write};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::cell::{Cell, CellKind as K, Direction};
use crate::codec;
use crate::error::Fault;
use crate::grid::Grid;
use crate::input::Input;
use crate::program::Program;
use crate::stack::Stack;
use crate::trace::Tracer;
use crate::vars::Vars;

/// The active interpretation table for fetched cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Terminal: the halt cell or a fatal fault was reached.
    Stopped,
    Default,
    /// Everything but the tunnel cell is ignored.
    Tunnel,
    /// Digits accumulate into the value on top of the stack. The sign is
    /// sticky once a negation cell is crossed.
    NumberLiteral { negative: bool },
    /// Every mapped cell pushes its codec value.
    StringLiteral,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Stopped => "stopped",
            Mode::Default => "default",
            Mode::Tunnel => "tunnel",
            Mode::NumberLiteral { .. } => "number-literal",
            Mode::StringLiteral => "string-literal",
        }
    }
}

pub struct Engine<R, W> {
    grid: Grid,
    stack: Stack,
    vars: Vars,
    pos: [i32; 3],
    heading: Direction,
    mode: Mode,
    /// Set by an explicit jump; suppresses the post-dispatch move once.
    jumped: bool,
    running: bool,
    steps: u64,
    input: Input<R>,
    output: W,
    rng: SmallRng,
    tracer: Option<Tracer>,
}

impl<R: BufRead, W: Write> Engine<R, W> {
    pub fn new(program: Program, input: R, output: W) -> Self {
        Engine {
            grid: program.grid,
            heading: program.heading,
            stack: Stack::new(),
            vars: Vars::new(),
            pos: [0, 0, 0],
            mode: Mode::Default,
            jumped: false,
            running: true,
            steps: 0,
            input: Input::new(input),
            output,
            rng: SmallRng::from_entropy(),
            tracer: None,
        }
    }

    /// Replace the stack with a pre-seeded one (bottom of the slice at the
    /// bottom of the stack).
    pub fn seed_stack(&mut self, seed: &[i32]) {
        self.stack = Stack::from_seed(seed);
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn set_tracer(&mut self, tracer: Tracer) {
        self.tracer = Some(tracer);
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn pos(&self) -> [i32; 3] {
        self.pos
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Run until the program halts or faults.
    pub fn run(&mut self) -> Result<(), Fault> {
        self.run_limited(u64::MAX).map(|_| ())
    }

    /// Run at most `max_steps` further cycles; returns how many executed.
    pub fn run_limited(&mut self, max_steps: u64) -> Result<u64, Fault> {
        let before = self.steps;
        while self.running && self.steps - before < max_steps {
            self.step()?;
        }
        if !self.running {
            if let Some(tracer) = &mut self.tracer {
                tracer.finish(self.steps).map_err(Fault::Io)?;
            }
        }
        Ok(self.steps - before)
    }

    /// Execute one cycle. A fatal fault stops the engine and is returned.
    pub fn step(&mut self) -> Result<(), Fault> {
        if !self.running {
            return Ok(());
        }
        let result = self.cycle();
        if result.is_err() {
            self.running = false;
            self.mode = Mode::Stopped;
        }
        result
    }

    fn cycle(&mut self) -> Result<(), Fault> {
        let pos = self.pos;
        let cell = self
            .grid
            .get(pos)
            .ok_or(Fault::OutOfBounds { pos })?;
        self.steps += 1;

        match self.mode {
            Mode::Stopped => {}
            Mode::Default => self.exec_default(cell)?,
            Mode::Tunnel => {
                if cell.kind == K::Tunnel {
                    self.mode = Mode::Default;
                }
            }
            Mode::NumberLiteral { negative } => self.exec_number_literal(cell, negative),
            Mode::StringLiteral => self.exec_string_literal(cell),
        }

        if let Some(tracer) = &mut self.tracer {
            tracer
                .record(self.steps, pos, cell, self.mode.name(), &self.stack, &self.vars)
                .map_err(Fault::Io)?;
        }

        if self.running && !self.jumped {
            self.advance();
        }
        self.jumped = false;
        Ok(())
    }

    fn advance(&mut self) {
        let d = self.heading.delta();
        self.pos = [self.pos[0] + d[0], self.pos[1] + d[1], self.pos[2] + d[2]];
    }

    fn exec_default(&mut self, cell: Cell) -> Result<(), Fault> {
        match cell.kind {
            // The start cell is inert once execution is underway.
            K::Empty | K::Start => {}

            K::Add => self.binary(i32::wrapping_add),
            K::Sub => self.binary(i32::wrapping_sub),
            K::Mul => self.binary(i32::wrapping_mul),
            K::Div => {
                let b = self.stack.pop();
                let a = self.stack.pop();
                if b == 0 {
                    return Err(Fault::DivideByZero { pos: self.pos });
                }
                self.stack.push(floor_div(a, b));
            }
            K::Mod => {
                let b = self.stack.pop();
                let a = self.stack.pop();
                if b == 0 {
                    return Err(Fault::ModuloByZero { pos: self.pos });
                }
                self.stack.push(floor_mod(a, b));
            }
            K::Exp => {
                // Exponents below 2 collapse to 0.
                let e = self.stack.pop();
                let b = self.stack.pop();
                let v = if e > 1 { b.wrapping_pow(e as u32) } else { 0 };
                self.stack.push(v);
            }
            K::Neg => {
                let v = self.stack.pop();
                self.stack.push(v.wrapping_neg());
            }
            K::Not => {
                let v = self.stack.pop();
                self.stack.push((v == 0) as i32);
            }
            K::Greater => self.binary(|a, b| (a > b) as i32),
            K::Less => self.binary(|a, b| (a < b) as i32),

            K::Mover => {
                if let Some(f) = cell.facing {
                    self.heading = f;
                }
            }
            K::RandMover => self.heading = self.rng.r#gen(),
            K::Skip => self.advance(),
            K::SkipIf => {
                if self.stack.pop() == 0 {
                    self.advance();
                }
            }
            K::Branch => {
                let taken = self.stack.pop() != 0;
                if let Some(f) = cell.facing {
                    self.heading = if taken { f } else { f.opposite() };
                }
            }

            K::Tunnel => self.mode = Mode::Tunnel,
            K::NumLiteral => {
                self.mode = Mode::NumberLiteral { negative: false };
                // Fresh accumulator for the digits to build on.
                self.stack.push(0);
            }
            K::StrLiteral => self.mode = Mode::StringLiteral,

            K::Dup => self.stack.dup(),
            K::Drop => {
                self.stack.pop();
            }
            K::Clear => self.stack.clear(),
            K::Swap => self.stack.swap(),
            K::Rotate => self.stack.rotate(),
            K::Depth => {
                let n = self.stack.len() as i32;
                self.stack.push(n);
            }

            K::OutNum => {
                let v = self.stack.pop();
                write!(self.output, "{v} ")?;
                self.output.flush()?;
            }
            K::OutChar => {
                let v = self.stack.pop();
                let c = char::from_u32(v as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
                write!(self.output, "{c}")?;
                self.output.flush()?;
            }
            K::OutNewline => {
                writeln!(self.output)?;
                self.output.flush()?;
            }
            K::Raise => return Err(Fault::Raised { pos: self.pos }),

            K::InNum => self.input_number()?,
            K::InChar => {
                let v = match self.input.next_char()? {
                    Some(c) => c as i32,
                    None => -1,
                };
                self.stack.push(v);
            }

            K::GetCell => {
                let z = self.stack.pop();
                let y = self.stack.pop();
                let x = self.stack.pop();
                let target = self
                    .grid
                    .get([x, y, z])
                    .ok_or(Fault::OutOfBounds { pos: [x, y, z] })?;
                if let Some(v) = codec::value_of(&target) {
                    self.stack.push(v);
                }
            }
            K::SetCell => {
                let n = self.stack.pop();
                let z = self.stack.pop();
                let y = self.stack.pop();
                let x = self.stack.pop();
                // An unmapped value writes nothing, so the coordinates are
                // never even looked at.
                if let Some(target) = codec::cell_of(n) {
                    if !self.grid.set([x, y, z], target) {
                        return Err(Fault::OutOfBounds { pos: [x, y, z] });
                    }
                }
            }
            K::FetchAhead => {
                self.advance();
                let target = self
                    .grid
                    .get(self.pos)
                    .ok_or(Fault::OutOfBounds { pos: self.pos })?;
                if let Some(v) = codec::value_of(&target) {
                    self.stack.push(v);
                }
            }

            K::GetVar => {
                let k = self.stack.pop();
                self.stack.push(self.vars.get(k));
            }
            K::SetVar => {
                let k = self.stack.pop();
                let v = self.stack.pop();
                self.vars.set(k, v);
            }

            K::PushPos => {
                for axis in 0..3 {
                    self.stack.push(self.pos[axis]);
                }
            }
            K::Jump => {
                let z = self.stack.pop();
                let y = self.stack.pop();
                let x = self.stack.pop();
                self.pos = [x, y, z];
                self.jumped = true;
            }
            K::Halt => {
                self.running = false;
                self.mode = Mode::Stopped;
            }

            K::Digit { .. } => {
                if let Some(v) = cell.kind.push_value() {
                    self.stack.push(v);
                }
            }
            // Any other mapped cell pushes its codec value.
            K::Data(_) => {
                if let Some(v) = codec::value_of(&cell) {
                    self.stack.push(v);
                }
            }
        }
        Ok(())
    }

    fn exec_number_literal(&mut self, cell: Cell, negative: bool) {
        match cell.kind {
            K::Mover => {
                if let Some(f) = cell.facing {
                    self.heading = f;
                }
            }
            K::NumLiteral => self.mode = Mode::Default,
            K::Neg => {
                self.mode = Mode::NumberLiteral { negative: true };
                let n = self.stack.pop();
                self.stack.push(n.wrapping_abs().wrapping_neg());
            }
            K::Digit { digit, .. } => {
                let n = self
                    .stack
                    .pop()
                    .wrapping_abs()
                    .wrapping_mul(10)
                    .wrapping_add(digit as i32);
                let n = if negative { n.wrapping_neg() } else { n };
                self.stack.push(n);
            }
            _ => {}
        }
    }

    fn exec_string_literal(&mut self, cell: Cell) {
        if cell.kind == K::StrLiteral {
            self.mode = Mode::Default;
        } else if let Some(v) = codec::value_of(&cell) {
            self.stack.push(v);
        }
    }

    fn binary(&mut self, f: impl Fn(i32, i32) -> i32) {
        let b = self.stack.pop();
        let a = self.stack.pop();
        self.stack.push(f(a, b));
    }

    /// Read a number from input: leading spaces and newlines are skipped, an
    /// optional minus sign is honored, and the digit run is maximal. The
    /// first character past the number stays unread. If no digits are found
    /// everything consumed goes back and -1 is pushed.
    fn input_number(&mut self) -> Result<(), Fault> {
        let mut eaten = Vec::new();
        let mut c = self.input.next_char()?;
        while let Some(ch) = c {
            if ch != ' ' && ch != '\n' {
                break;
            }
            eaten.push(ch);
            c = self.input.next_char()?;
        }
        let mut negative = false;
        if c == Some('-') {
            negative = true;
            eaten.push('-');
            c = self.input.next_char()?;
        }
        let mut n: i32 = 0;
        let mut got_digit = false;
        while let Some(d) = c.and_then(|ch| ch.to_digit(10)) {
            got_digit = true;
            n = n.wrapping_mul(10).wrapping_add(d as i32);
            c = self.input.next_char()?;
        }
        if let Some(ch) = c {
            self.input.unread(ch);
        }
        if got_digit {
            self.stack.push(if negative { n.wrapping_neg() } else { n });
        } else {
            for &ch in eaten.iter().rev() {
                self.input.unread(ch);
            }
            self.stack.push(-1);
        }
        Ok(())
    }
}

/// Division rounding toward negative infinity.
fn floor_div(a: i32, b: i32) -> i32 {
    let q = a.wrapping_div(b);
    if (a.wrapping_rem(b) != 0) && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Modulus with the sign of the divisor.
fn floor_mod(a: i32, b: i32) -> i32 {
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::parse_str;

    use std::io::Cursor;

    fn engine(src: &str, input: &str) -> Engine<Cursor<Vec<u8>>, Vec<u8>> {
        let program = parse_str(src).expect("program should parse");
        let mut e = Engine::new(program, Cursor::new(input.as_bytes().to_vec()), Vec::new());
        e.set_seed(0);
        e
    }

    fn run_to_string(src: &str, input: &str, seed: &[i32]) -> String {
        let mut e = engine(src, input);
        e.seed_stack(seed);
        e.run().expect("program should run to completion");
        String::from_utf8(e.output.clone()).unwrap()
    }

    #[test]
    fn test_subtract_from_seeded_stack() {
        let out = run_to_string("start:e 3 sub outn halt", "", &[7]);
        assert_eq!(out, "4 ");
    }

    #[test]
    fn test_number_literal_accumulates() {
        assert_eq!(run_to_string("start:e num 4 2 num outn halt", "", &[]), "42 ");
        assert_eq!(
            run_to_string("start:e num 4 2 neg num outn halt", "", &[]),
            "-42 "
        );
        // The sign sticks once crossed, even before more digits.
        assert_eq!(
            run_to_string("start:e num 4 neg 2 num outn halt", "", &[]),
            "-42 "
        );
    }

    #[test]
    fn test_number_literal_seeds_a_zero_accumulator() {
        let mut e = engine("start:e 5 num num halt", "");
        e.run().unwrap();
        assert_eq!(e.stack().values(), &[5, 0]);

        // On an empty stack the zero push is a no-op, so nothing remains.
        let mut e = engine("start:e num num halt", "");
        e.run().unwrap();
        assert!(e.stack().is_empty());
    }

    #[test]
    fn test_exp_small_exponents_collapse_to_zero() {
        assert_eq!(run_to_string("start:e exp outn halt", "", &[3, 0]), "0 ");
        assert_eq!(run_to_string("start:e exp outn halt", "", &[3, 1]), "0 ");
        assert_eq!(run_to_string("start:e exp outn halt", "", &[3, 2]), "9 ");
    }

    #[test]
    fn test_division_floors() {
        assert_eq!(run_to_string("start:e div outn halt", "", &[-7, 2]), "-4 ");
        assert_eq!(run_to_string("start:e div outn halt", "", &[7, -2]), "-4 ");
        assert_eq!(run_to_string("start:e mod outn halt", "", &[-7, 2]), "1 ");
        assert_eq!(run_to_string("start:e mod outn halt", "", &[7, -2]), "-1 ");
    }

    #[test]
    fn test_divide_by_zero_faults() {
        let mut e = engine("start:e 0 div halt", "");
        e.seed_stack(&[5]);
        let err = e.run().unwrap_err();
        assert!(matches!(err, Fault::DivideByZero { pos: [2, 0, 0] }));
        assert!(!e.running());
        assert_eq!(e.mode(), Mode::Stopped);
    }

    #[test]
    fn test_walking_off_the_volume_faults() {
        let mut e = engine("start:e add", "");
        let err = e.run().unwrap_err();
        assert!(matches!(err, Fault::OutOfBounds { pos: [2, 0, 0] }));
    }

    #[test]
    fn test_raise_faults() {
        let mut e = engine("start:e err", "");
        assert!(matches!(e.run().unwrap_err(), Fault::Raised { .. }));
    }

    #[test]
    fn test_halt_stops_cleanly() {
        let mut e = engine("start:e halt", "");
        e.run().unwrap();
        assert_eq!(e.steps(), 2);
        assert_eq!(e.mode(), Mode::Stopped);
        // Further steps are no-ops.
        e.step().unwrap();
        assert_eq!(e.steps(), 2);
    }

    #[test]
    fn test_skip_jumps_the_next_cell() {
        assert_eq!(run_to_string("start:e skip 1 2 outn halt", "", &[]), "2 ");
    }

    #[test]
    fn test_conditional_skip() {
        // Empty stack pops 0: skip taken.
        assert_eq!(run_to_string("start:e skipz 1 2 outn halt", "", &[]), "2 ");
        // Nonzero: not taken.
        assert_eq!(
            run_to_string("start:e skipz 1 outn . halt", "", &[5]),
            "1 "
        );
    }

    #[test]
    fn test_mover_redirects_into_another_row() {
        let src = "start:e . mov:s\n. . 5\n. . outn\n. . halt";
        assert_eq!(run_to_string(src, "", &[]), "5 ");
    }

    #[test]
    fn test_branch_follows_facing_on_nonzero() {
        let mut e = engine("start:e 5 br:s", "");
        e.step().unwrap();
        e.step().unwrap();
        e.step().unwrap();
        assert_eq!(e.heading(), Direction::South);
    }

    #[test]
    fn test_branch_reverses_facing_on_zero() {
        let mut e = engine("start:e . br:s", "");
        e.step().unwrap();
        e.step().unwrap();
        e.step().unwrap();
        assert_eq!(e.heading(), Direction::North);
    }

    #[test]
    fn test_tunnel_ignores_everything_inside() {
        assert_eq!(
            run_to_string("start:e tun 5 add halt tun 5 outn halt", "", &[]),
            "5 "
        );
    }

    #[test]
    fn test_string_literal_pushes_codec_values() {
        // 'i' sits above 'H' and is printed first.
        assert_eq!(run_to_string("start:e str 'H 'i str outc outc halt", "", &[]), "iH");
        // Instruction cells push their value too while the literal is open.
        assert_eq!(run_to_string("start:e str add str outn halt", "", &[]), "11 ");
    }

    #[test]
    fn test_character_cell_pushes_in_default_mode() {
        assert_eq!(run_to_string("start:e 'A outc halt", "", &[]), "A");
    }

    #[test]
    fn test_variables_store_and_default_to_zero() {
        assert_eq!(
            run_to_string("start:e 5 1 setv 1 getv outn halt", "", &[]),
            "5 "
        );
        assert_eq!(run_to_string("start:e 9 getv outn halt", "", &[]), "0 ");
    }

    #[test]
    fn test_setting_a_variable_to_zero_clears_it() {
        // The second store pops an empty stack for the value, writing 0.
        let mut e = engine("start:e 5 1 setv 1 setv halt", "");
        e.run().unwrap();
        assert!(e.vars().is_empty());
    }

    #[test]
    fn test_push_pos_is_program_relative() {
        // pos executes at x=1; pushes x, y, z in that order.
        assert_eq!(
            run_to_string("start:e pos outn outn outn halt", "", &[]),
            "0 0 1 "
        );
    }

    #[test]
    fn test_jump_suppresses_the_advance() {
        let mut e = engine("start:e 5 0 0 jump . 9 outn halt", "");
        for _ in 0..5 {
            e.step().unwrap();
        }
        // The cycle after the jump executes the landing cell itself.
        assert_eq!(e.pos(), [5, 0, 0]);
        e.run().unwrap();
        assert_eq!(String::from_utf8(e.output.clone()).unwrap(), "9 ");
    }

    #[test]
    fn test_get_cell_reads_the_volume() {
        assert_eq!(
            run_to_string("start:e 1 0 0 getc outn halt", "", &[]),
            "1 "
        );
    }

    #[test]
    fn test_get_cell_out_of_bounds_faults() {
        let mut e = engine("start:e 90 0 0 getc halt", "");
        assert!(matches!(
            e.run().unwrap_err(),
            Fault::OutOfBounds { pos: [90, 0, 0] }
        ));
    }

    #[test]
    fn test_set_cell_rewrites_the_volume() {
        // Writes the ones-digit 1 cell over the empty cell ahead, which then
        // executes and pushes 1.
        assert_eq!(
            run_to_string("start:e 6 0 0 1 setc . outn halt", "", &[]),
            "1 "
        );
    }

    #[test]
    fn test_set_cell_with_unmapped_value_is_a_no_op() {
        // 157 has no cell; the out-of-range coordinates are never touched.
        assert_eq!(
            run_to_string("start:e 20 0 0 num 1 5 7 num setc outn halt", "", &[]),
            "0 "
        );
    }

    #[test]
    fn test_fetch_pushes_the_next_cell_and_skips_it() {
        assert_eq!(run_to_string("start:e fetch 'A outc halt", "", &[]), "A");
    }

    #[test]
    fn test_input_number_stops_at_the_first_non_digit() {
        // "-12" parses; "x" stays unread and fails the second read.
        assert_eq!(
            run_to_string("start:e inn inn outn outn halt", "  -12x", &[]),
            "-1 -12 "
        );
    }

    #[test]
    fn test_input_number_restores_consumed_characters_on_failure() {
        assert_eq!(
            run_to_string("start:e inn inc outc outn halt", "abc", &[]),
            "a-1 "
        );
    }

    #[test]
    fn test_input_character_at_end_of_input() {
        assert_eq!(run_to_string("start:e inc outn halt", "", &[]), "-1 ");
    }

    #[test]
    fn test_newline_output() {
        assert_eq!(run_to_string("start:e outl halt", "", &[]), "\n");
    }

    #[test]
    fn test_depth() {
        assert_eq!(
            run_to_string("start:e depth outn halt", "", &[4, 5, 6]),
            "3 "
        );
        assert_eq!(run_to_string("start:e depth outn halt", "", &[]), "0 ");
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(run_to_string("start:e gt outn halt", "", &[3, 5]), "0 ");
        assert_eq!(run_to_string("start:e lt outn halt", "", &[3, 5]), "1 ");
        assert_eq!(run_to_string("start:e not outn halt", "", &[0]), "1 ");
        assert_eq!(run_to_string("start:e not outn halt", "", &[9]), "0 ");
    }

    #[test]
    fn test_addition_wraps() {
        let src = "start:e num 2 1 4 7 4 8 3 6 4 7 num 1 add outn halt";
        assert_eq!(run_to_string(src, "", &[]), "-2147483648 ");
    }

    #[test]
    fn test_random_mover_sets_a_valid_heading() {
        let mut e = engine("start:e rnd", "");
        e.step().unwrap();
        e.step().unwrap();
        assert!(crate::cell::DIRECTIONS.contains(&e.heading()));
    }
}
