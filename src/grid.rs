//! The 3-D program volume.
//!
//! Cells are stored flat in x-major order. Instructions address the volume
//! in program-relative coordinates; the origin offset (the location of the
//! start cell) translates those into array indices. Any access outside the
//! volume yields `None`, which the engine treats as fatal.

use crate::cell::Cell;

/// Bounds-checked 3-D array of cells with an origin offset.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Cell>,
    size: [usize; 3],
    offset: [i32; 3],
}

impl Grid {
    /// An empty volume of the given (width, height, depth).
    pub fn new(size: [usize; 3]) -> Self {
        Grid {
            cells: vec![Cell::EMPTY; size[0] * size[1] * size[2]],
            size,
            offset: [0, 0, 0],
        }
    }

    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// Fix the origin: program-relative (0, 0, 0) maps to this index.
    pub fn set_offset(&mut self, offset: [i32; 3]) {
        self.offset = offset;
    }

    pub fn offset(&self) -> [i32; 3] {
        self.offset
    }

    fn index(&self, pos: [i32; 3]) -> Option<usize> {
        let mut idx = [0usize; 3];
        for axis in 0..3 {
            // Widened so extreme jump targets cannot overflow the add.
            let i = pos[axis] as i64 + self.offset[axis] as i64;
            if i < 0 || i as usize >= self.size[axis] {
                return None;
            }
            idx[axis] = i as usize;
        }
        Some((idx[0] * self.size[1] + idx[1]) * self.size[2] + idx[2])
    }

    /// Cell at a program-relative position; `None` when out of bounds.
    pub fn get(&self, pos: [i32; 3]) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Overwrite the cell at a program-relative position. Returns false when
    /// the position is out of bounds.
    pub fn set(&mut self, pos: [i32; 3], cell: Cell) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// Place a cell by raw array index, ignoring the offset. Loader use.
    pub fn put(&mut self, index: [usize; 3], cell: Cell) {
        debug_assert!(index[0] < self.size[0] && index[1] < self.size[1] && index[2] < self.size[2]);
        let i = (index[0] * self.size[1] + index[1]) * self.size[2] + index[2];
        self.cells[i] = cell;
    }

    /// Scan the volume for a cell matching the predicate, in x, y, z order.
    /// Returns the raw array index.
    pub fn find(&self, pred: impl Fn(&Cell) -> bool) -> Option<[usize; 3]> {
        for x in 0..self.size[0] {
            for y in 0..self.size[1] {
                for z in 0..self.size[2] {
                    let i = (x * self.size[1] + y) * self.size[2] + z;
                    if pred(&self.cells[i]) {
                        return Some([x, y, z]);
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellKind};

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new([2, 3, 4]);
        assert_eq!(grid.get([0, 0, 0]), Some(Cell::EMPTY));
        assert_eq!(grid.get([1, 2, 3]), Some(Cell::EMPTY));
    }

    #[test]
    fn test_out_of_bounds_is_none() {
        let grid = Grid::new([2, 2, 2]);
        assert_eq!(grid.get([-1, 0, 0]), None);
        assert_eq!(grid.get([0, 2, 0]), None);
        assert_eq!(grid.get([0, 0, 5]), None);
    }

    #[test]
    fn test_offset_translates_coordinates() {
        let mut grid = Grid::new([3, 3, 3]);
        grid.put([1, 1, 1], Cell::plain(CellKind::Add));
        grid.set_offset([1, 1, 1]);
        // Program-relative origin now lands on the start index.
        assert_eq!(grid.get([0, 0, 0]), Some(Cell::plain(CellKind::Add)));
        // Negative coordinates reach the low corner.
        assert_eq!(grid.get([-1, -1, -1]), Some(Cell::EMPTY));
        assert_eq!(grid.get([-2, 0, 0]), None);
    }

    #[test]
    fn test_set_round_trips() {
        let mut grid = Grid::new([2, 2, 2]);
        let cell = Cell::plain(CellKind::Halt);
        assert!(grid.set([1, 0, 1], cell));
        assert_eq!(grid.get([1, 0, 1]), Some(cell));
        assert!(!grid.set([9, 0, 0], cell));
    }

    #[test]
    fn test_find_scans_in_order() {
        let mut grid = Grid::new([2, 2, 2]);
        grid.put([0, 1, 0], Cell::plain(CellKind::Halt));
        grid.put([1, 0, 0], Cell::plain(CellKind::Halt));
        let found = grid.find(|c| c.kind == CellKind::Halt);
        assert_eq!(found, Some([0, 1, 0]));
    }
}
