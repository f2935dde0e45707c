use std::fmt;

use rand::Rng;
use rand::distributions::{Distribution, Standard};

/// One of the six axis-aligned headings the instruction pointer can take.
///
/// North/south run along -z/+z, east/west along +x/-x, up/down along +y/-y,
/// matching the coordinate convention of the program volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

pub const DIRECTIONS: [Direction; 6] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
    Direction::Up,
    Direction::Down,
];

impl Direction {
    /// Unit step vector (x, y, z) for one move along this heading.
    pub fn delta(self) -> [i32; 3] {
        match self {
            Direction::North => [0, 0, -1],
            Direction::South => [0, 0, 1],
            Direction::East => [1, 0, 0],
            Direction::West => [-1, 0, 0],
            Direction::Up => [0, 1, 0],
            Direction::Down => [0, -1, 0],
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Single-letter form used by the program text format (`mov:n` etc).
    pub fn short_name(self) -> char {
        match self {
            Direction::North => 'n',
            Direction::South => 's',
            Direction::East => 'e',
            Direction::West => 'w',
            Direction::Up => 'u',
            Direction::Down => 'd',
        }
    }

    pub fn from_short_name(c: char) -> Option<Self> {
        match c {
            'n' => Some(Direction::North),
            's' => Some(Direction::South),
            'e' => Some(Direction::East),
            'w' => Some(Direction::West),
            'u' => Some(Direction::Up),
            'd' => Some(Direction::Down),
            _ => None,
        }
    }
}

impl Distribution<Direction> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Direction {
        DIRECTIONS[rng.gen_range(0..6)]
    }
}

/// What a cell in the program volume is.
///
/// Most kinds are instructions; `Digit` cells carry a one-digit magnitude at
/// a decimal denomination, and `Data` cells are inert payload that only has
/// meaning through its codec value (string literals, self-modification).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Empty,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Neg,
    Not,
    Greater,
    Less,
    /// Directional mover: sets the heading to the cell's facing.
    Mover,
    RandMover,
    Skip,
    SkipIf,
    Tunnel,
    NumLiteral,
    StrLiteral,
    /// Directional conditional: pops, then heads along the facing (nonzero)
    /// or its opposite (zero).
    Branch,
    Dup,
    Drop,
    Clear,
    Swap,
    Rotate,
    Depth,
    OutNum,
    OutChar,
    OutNewline,
    Raise,
    InNum,
    InChar,
    GetCell,
    SetCell,
    FetchAhead,
    GetVar,
    SetVar,
    PushPos,
    Jump,
    Start,
    Halt,
    /// Number cell pushing `digit * 10^exponent`; contributes `digit` inside
    /// a number literal.
    Digit { digit: u8, exponent: u8 },
    /// Inert data cell, identified only so the codec can assign it a value.
    Data(u16),
}

impl CellKind {
    /// The whole value a number cell pushes in the default mode.
    pub fn push_value(self) -> Option<i32> {
        match self {
            CellKind::Digit { digit, exponent } => {
                Some(digit as i32 * 10i32.pow(exponent as u32))
            }
            _ => None,
        }
    }

    /// The ones-digit contribution inside a number literal.
    pub fn digit(self) -> Option<u8> {
        match self {
            CellKind::Digit { digit, .. } => Some(digit),
            _ => None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            CellKind::Empty => ".",
            CellKind::Add => "add",
            CellKind::Sub => "sub",
            CellKind::Mul => "mul",
            CellKind::Div => "div",
            CellKind::Mod => "mod",
            CellKind::Exp => "exp",
            CellKind::Neg => "neg",
            CellKind::Not => "not",
            CellKind::Greater => "gt",
            CellKind::Less => "lt",
            CellKind::Mover => "mov",
            CellKind::RandMover => "rnd",
            CellKind::Skip => "skip",
            CellKind::SkipIf => "skipz",
            CellKind::Tunnel => "tun",
            CellKind::NumLiteral => "num",
            CellKind::StrLiteral => "str",
            CellKind::Branch => "br",
            CellKind::Dup => "dup",
            CellKind::Drop => "drop",
            CellKind::Clear => "clear",
            CellKind::Swap => "swap",
            CellKind::Rotate => "rot",
            CellKind::Depth => "depth",
            CellKind::OutNum => "outn",
            CellKind::OutChar => "outc",
            CellKind::OutNewline => "outl",
            CellKind::Raise => "err",
            CellKind::InNum => "inn",
            CellKind::InChar => "inc",
            CellKind::GetCell => "getc",
            CellKind::SetCell => "setc",
            CellKind::FetchAhead => "fetch",
            CellKind::GetVar => "getv",
            CellKind::SetVar => "setv",
            CellKind::PushPos => "pos",
            CellKind::Jump => "jump",
            CellKind::Start => "start",
            CellKind::Halt => "halt",
            CellKind::Digit { .. } => "digit",
            CellKind::Data(_) => "data",
        }
    }

    /// Whether this kind carries a facing (directional cells only).
    pub fn is_directional(self) -> bool {
        matches!(self, CellKind::Mover | CellKind::Branch | CellKind::Start)
    }
}

/// One addressable unit of program source: a kind plus an optional facing.
///
/// The facing is meaningful only for directional kinds; everything else
/// carries `None` so cells compare and hash by identity for codec lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub kind: CellKind,
    pub facing: Option<Direction>,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        kind: CellKind::Empty,
        facing: None,
    };

    pub fn plain(kind: CellKind) -> Self {
        Cell { kind, facing: None }
    }

    pub fn with_facing(kind: CellKind, facing: Direction) -> Self {
        Cell {
            kind,
            facing: Some(facing),
        }
    }
}

// Display matches the loader's token syntax, so traces read back as source.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CellKind::Digit { .. } => {
                // Digit cells print as the number they push.
                write!(f, "{}", self.kind.push_value().unwrap_or(0))
            }
            CellKind::Data(_) => match crate::codec::value_of(self) {
                Some(v) => write!(f, "#{v}"),
                None => write!(f, "#?"),
            },
            kind if kind.is_directional() => match self.facing {
                Some(dir) => write!(f, "{}:{}", kind.mnemonic(), dir.short_name()),
                None => write!(f, "{}:?", kind.mnemonic()),
            },
            kind => write!(f, "{}", kind.mnemonic()),
        }
    }
}
