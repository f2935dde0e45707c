//! Loading a program volume from its textual layout.
//!
//! A program file is a stack of layers (y levels, bottom layer first)
//! separated by `---` lines. Within a layer, each line is a row of cells at
//! increasing z and each whitespace-separated token is one cell at
//! increasing x. Tokens:
//!
//! - `.` — empty cell
//! - instruction mnemonics (`add`, `dup`, `outn`, ...); directional cells
//!   take a facing suffix: `mov:n`, `br:e`, `start:s`
//! - a plain number — the number cell pushing that value (`7`, `40`, `900`,
//!   `3000`, `5000000`, or `0`)
//! - `'c` — the cell whose codec value is the code point of `c`
//! - `#v` — the cell whose codec value is `v`
//!
//! Exactly one `start` cell is required; it fixes the origin offset and the
//! initial heading.

use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::cell::{Cell, CellKind, Direction};
use crate::codec;
use crate::grid::Grid;

/// A decoded program: the volume with its origin fixed, plus the initial
/// heading taken from the start cell.
#[derive(Debug, Clone)]
pub struct Program {
    pub grid: Grid,
    pub heading: Direction,
}

#[derive(Debug)]
pub enum ProgramError {
    Io(io::Error),
    /// The source contained no cells at all.
    Empty,
    /// No start cell in the volume.
    NoStart,
    BadToken { line: usize, token: String },
    /// A `'c` or `#v` token named a value the codec does not map.
    Unmapped { line: usize, token: String },
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::Io(e) => write!(f, "failed to read program: {e}"),
            ProgramError::Empty => write!(f, "program is empty"),
            ProgramError::NoStart => write!(f, "program has no start cell"),
            ProgramError::BadToken { line, token } => {
                write!(f, "line {line}: unrecognized cell token {token:?}")
            }
            ProgramError::Unmapped { line, token } => {
                write!(f, "line {line}: token {token:?} names an unmapped codec value")
            }
        }
    }
}

impl error::Error for ProgramError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ProgramError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProgramError {
    fn from(e: io::Error) -> Self {
        ProgramError::Io(e)
    }
}

pub fn load(path: &Path) -> Result<Program, ProgramError> {
    parse_str(&fs::read_to_string(path)?)
}

pub fn parse_str(source: &str) -> Result<Program, ProgramError> {
    // Layer rows, as parsed cells: layers[y][z][x].
    let mut layers: Vec<Vec<Vec<Cell>>> = vec![Vec::new()];
    for (lineno, line) in source.lines().enumerate() {
        if line.trim() == "---" {
            layers.push(Vec::new());
            continue;
        }
        let mut row = Vec::new();
        for token in line.split_whitespace() {
            row.push(parse_token(token, lineno + 1)?);
        }
        if let Some(layer) = layers.last_mut() {
            layer.push(row);
        }
    }

    // Trailing all-empty rows and layers carry no cells; drop them so the
    // volume is as tight as the source.
    for layer in &mut layers {
        while layer.last().is_some_and(|row| row.is_empty()) {
            layer.pop();
        }
    }
    while layers.last().is_some_and(|layer| layer.is_empty()) {
        layers.pop();
    }

    let height = layers.len();
    let depth = layers.iter().map(|l| l.len()).max().unwrap_or(0);
    let width = layers
        .iter()
        .flat_map(|l| l.iter().map(|row| row.len()))
        .max()
        .unwrap_or(0);
    if width == 0 || height == 0 || depth == 0 {
        return Err(ProgramError::Empty);
    }

    let mut grid = Grid::new([width, height, depth]);
    for (y, layer) in layers.iter().enumerate() {
        for (z, row) in layer.iter().enumerate() {
            for (x, &cell) in row.iter().enumerate() {
                grid.put([x, y, z], cell);
            }
        }
    }

    let start = grid
        .find(|c| c.kind == CellKind::Start)
        .ok_or(ProgramError::NoStart)?;
    let start = [start[0] as i32, start[1] as i32, start[2] as i32];
    // Offset is still zero here, so program-relative equals raw index.
    let heading = grid
        .get(start)
        .and_then(|c| c.facing)
        .unwrap_or(Direction::North);
    grid.set_offset(start);

    Ok(Program { grid, heading })
}

fn parse_token(token: &str, line: usize) -> Result<Cell, ProgramError> {
    use CellKind::*;

    if token == "." {
        return Ok(Cell::EMPTY);
    }

    // Quoted character: the data cell encoding its code point.
    if let Some(rest) = token.strip_prefix('\'') {
        let mut chars = rest.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return codec::cell_of(c as i32).ok_or(ProgramError::Unmapped {
                line,
                token: token.to_string(),
            });
        }
        return Err(ProgramError::BadToken {
            line,
            token: token.to_string(),
        });
    }

    // Raw codec value.
    if let Some(rest) = token.strip_prefix('#') {
        if let Ok(v) = rest.parse::<i32>() {
            return codec::cell_of(v).ok_or(ProgramError::Unmapped {
                line,
                token: token.to_string(),
            });
        }
        return Err(ProgramError::BadToken {
            line,
            token: token.to_string(),
        });
    }

    // Number cells are written as the value they push.
    if token.chars().all(|c| c.is_ascii_digit()) {
        if token == "0" {
            return Ok(Cell::plain(Digit {
                digit: 0,
                exponent: 0,
            }));
        }
        if let Ok(v) = token.parse::<i32>() {
            if let Some(cell) = codec::cell_of(v) {
                if cell.kind.push_value() == Some(v) {
                    return Ok(cell);
                }
            }
        }
        return Err(ProgramError::BadToken {
            line,
            token: token.to_string(),
        });
    }

    // Directional cells: mnemonic, colon, facing letter.
    if let Some((name, dir)) = token.split_once(':') {
        let kind = match name {
            "mov" => Mover,
            "br" => Branch,
            "start" => Start,
            _ => {
                return Err(ProgramError::BadToken {
                    line,
                    token: token.to_string(),
                });
            }
        };
        let mut chars = dir.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(facing) = Direction::from_short_name(c) {
                return Ok(Cell::with_facing(kind, facing));
            }
        }
        return Err(ProgramError::BadToken {
            line,
            token: token.to_string(),
        });
    }

    let kind = match token {
        "add" => Add,
        "sub" => Sub,
        "mul" => Mul,
        "div" => Div,
        "mod" => Mod,
        "exp" => Exp,
        "neg" => Neg,
        "not" => Not,
        "gt" => Greater,
        "lt" => Less,
        "rnd" => RandMover,
        "skip" => Skip,
        "skipz" => SkipIf,
        "tun" => Tunnel,
        "num" => NumLiteral,
        "str" => StrLiteral,
        "dup" => Dup,
        "drop" => Drop,
        "clear" => Clear,
        "swap" => Swap,
        "rot" => Rotate,
        "depth" => Depth,
        "outn" => OutNum,
        "outc" => OutChar,
        "outl" => OutNewline,
        "err" => Raise,
        "inn" => InNum,
        "inc" => InChar,
        "getc" => GetCell,
        "setc" => SetCell,
        "fetch" => FetchAhead,
        "getv" => GetVar,
        "setv" => SetVar,
        "pos" => PushPos,
        "jump" => Jump,
        "halt" => Halt,
        _ => {
            return Err(ProgramError::BadToken {
                line,
                token: token.to_string(),
            });
        }
    };
    Ok(Cell::plain(kind))
}
