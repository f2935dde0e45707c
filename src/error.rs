//! Fatal engine faults.
//!
//! Only three conditions kill a run from inside the language: leaving the
//! program volume, dividing (or taking a modulus) by zero, and the explicit
//! error-raise instruction. Everything else degrades to a silent no-op.
//! Faults carry the instruction pointer's program-relative position at the
//! time of the failure. I/O errors on the input/output streams surface here
//! too, since they also terminate the run.

use std::error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Fault {
    /// A coordinate access left the program volume.
    OutOfBounds { pos: [i32; 3] },
    DivideByZero { pos: [i32; 3] },
    ModuloByZero { pos: [i32; 3] },
    /// The error-raise instruction was executed.
    Raised { pos: [i32; 3] },
    Io(io::Error),
}

impl Fault {
    /// Position the fault occurred at, if it came from inside the program.
    pub fn pos(&self) -> Option<[i32; 3]> {
        match self {
            Fault::OutOfBounds { pos }
            | Fault::DivideByZero { pos }
            | Fault::ModuloByZero { pos }
            | Fault::Raised { pos } => Some(*pos),
            Fault::Io(_) => None,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::OutOfBounds { pos } => {
                write!(f, "error at {}: position is out of bounds", Pos(*pos))
            }
            Fault::DivideByZero { pos } => {
                write!(f, "error at {}: attempted to divide by zero", Pos(*pos))
            }
            Fault::ModuloByZero { pos } => {
                write!(f, "error at {}: attempted to mod by zero", Pos(*pos))
            }
            Fault::Raised { pos } => {
                write!(f, "error at {}: an error was manually raised", Pos(*pos))
            }
            Fault::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl error::Error for Fault {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Fault::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Fault {
    fn from(e: io::Error) -> Self {
        Fault::Io(e)
    }
}

struct Pos([i32; 3]);

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[0], self.0[1], self.0[2])
    }
}
