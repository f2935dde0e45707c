//! Bidirectional mapping between cell identity and the signed values the
//! language operates on.
//!
//! The table is a fixed bijection built once per process. Three values are
//! reserved: 0 is the empty cell, `MIN_VAL` is the zero-digit sentinel (sign/
//! magnitude accumulation cannot otherwise round-trip the most negative
//! value), and `MAX_VAL` is the string-literal toggle. Lookups that miss the
//! table yield `None` rather than an error; callers treat that as "no value".

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::cell::{Cell, CellKind, Direction};

pub const MAX_VAL: i32 = i32::MAX;
pub const MIN_VAL: i32 = i32::MIN;

/// Decimal denominations number cells come in.
pub const DIGIT_EXPONENTS: [u8; 5] = [0, 1, 2, 3, 6];

/// Inert data cells available to the codec.
const DATA_CELLS: u16 = 220;

/// Positive values 1..=POSITIVE_SPAN carry the instruction cells and the
/// first run of data cells (skipping slots owned by number cells). Chosen so
/// the positive side covers the printable ASCII range.
const POSITIVE_SPAN: i32 = 151;

/// Facings assigned to the extra mover cells just above `POSITIVE_SPAN`.
/// North lives in the main instruction sequence.
const MOVER_EXTRA: [Direction; 5] = [
    Direction::South,
    Direction::East,
    Direction::West,
    Direction::Up,
    Direction::Down,
];

/// Facings for the extra branch cells just below the negative run. South
/// lives in the main instruction sequence.
const BRANCH_EXTRA: [Direction; 5] = [
    Direction::North,
    Direction::West,
    Direction::East,
    Direction::Down,
    Direction::Up,
];

struct Codec {
    to_value: FxHashMap<Cell, i32>,
    to_cell: FxHashMap<i32, Cell>,
}

/// Instruction cells in value order. The string-literal toggle is absent
/// (it is the `MAX_VAL` sentinel) and so is the start cell (unmapped).
fn instruction_sequence() -> Vec<Cell> {
    use CellKind::*;
    let mut seq: Vec<Cell> = [
        Add, Sub, Mul, Div, Mod, Exp, Neg, Not, Greater, Less,
    ]
    .into_iter()
    .map(Cell::plain)
    .collect();
    seq.push(Cell::with_facing(Mover, Direction::North));
    seq.extend([RandMover, Skip, SkipIf, Tunnel, NumLiteral].map(Cell::plain));
    seq.push(Cell::with_facing(Branch, Direction::South));
    seq.extend(
        [
            Dup, Drop, Clear, Swap, Rotate, Depth, OutNum, OutChar, OutNewline, Raise, InNum,
            InChar, GetCell, SetCell, FetchAhead, GetVar, SetVar, PushPos, Jump, Halt,
        ]
        .map(Cell::plain),
    );
    seq
}

/// Whether `v` is owned by a number cell (`d * 10^e`, d in 1..=9, e a valid
/// denomination).
fn is_digit_value(v: i32) -> bool {
    digit_parts(v).is_some()
}

fn digit_parts(v: i32) -> Option<(u8, u8)> {
    for &e in &DIGIT_EXPONENTS {
        let base = 10i32.pow(e as u32);
        if v % base == 0 {
            let d = v / base;
            if (1..=9).contains(&d) {
                return Some((d as u8, e));
            }
        }
    }
    None
}

fn build() -> Codec {
    let mut to_value = FxHashMap::default();
    let mut to_cell = FxHashMap::default();

    fn bind(to_value: &mut FxHashMap<Cell, i32>, to_cell: &mut FxHashMap<i32, Cell>, v: i32, c: Cell) {
        let clash = to_cell.insert(v, c);
        debug_assert!(clash.is_none(), "codec value {v} assigned twice");
        to_value.insert(c, v);
    }

    let mut seq = instruction_sequence();
    for id in 0..DATA_CELLS {
        seq.push(Cell::plain(CellKind::Data(id)));
    }

    // Positive run: instruction cells then data cells, skipping values that
    // number cells own.
    let mut n = 0;
    for v in 1..=POSITIVE_SPAN {
        if is_digit_value(v) {
            continue;
        }
        bind(&mut to_value, &mut to_cell, v, seq[n]);
        n += 1;
    }

    // Negative run: the remaining data cells.
    let mut v = -1;
    while n < seq.len() {
        bind(&mut to_value, &mut to_cell, v, seq[n]);
        n += 1;
        v -= 1;
    }
    let negative_span = -(v + 1);

    // The other five facings of the two directional instruction cells sit
    // just beyond each run.
    for (i, dir) in MOVER_EXTRA.into_iter().enumerate() {
        bind(
            &mut to_value,
            &mut to_cell,
            POSITIVE_SPAN + 1 + i as i32,
            Cell::with_facing(CellKind::Mover, dir),
        );
    }
    for (i, dir) in BRANCH_EXTRA.into_iter().enumerate() {
        bind(
            &mut to_value,
            &mut to_cell,
            -(negative_span + 1 + i as i32),
            Cell::with_facing(CellKind::Branch, dir),
        );
    }

    // Number cells own their push value outright.
    for &e in &DIGIT_EXPONENTS {
        for d in 1..=9u8 {
            let cell = Cell::plain(CellKind::Digit {
                digit: d,
                exponent: e,
            });
            bind(&mut to_value, &mut to_cell, d as i32 * 10i32.pow(e as u32), cell);
        }
    }

    // Reserved representations.
    bind(&mut to_value, &mut to_cell, 0, Cell::EMPTY);
    bind(
        &mut to_value,
        &mut to_cell,
        MIN_VAL,
        Cell::plain(CellKind::Digit {
            digit: 0,
            exponent: 0,
        }),
    );
    bind(
        &mut to_value,
        &mut to_cell,
        MAX_VAL,
        Cell::plain(CellKind::StrLiteral),
    );

    Codec { to_value, to_cell }
}

fn codec() -> &'static Codec {
    static CODEC: OnceLock<Codec> = OnceLock::new();
    CODEC.get_or_init(build)
}

/// Codec value of a cell, or `None` if the cell has no mapping (the start
/// cell, or a directional cell with a facing the table does not carry).
pub fn value_of(cell: &Cell) -> Option<i32> {
    codec().to_value.get(cell).copied()
}

/// Cell for a value, or `None` if the value is unmapped.
pub fn cell_of(value: i32) -> Option<Cell> {
    codec().to_cell.get(&value).copied()
}
