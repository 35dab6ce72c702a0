//! Fixed-capacity, bounds-checked 2-D grids.
//!
//! Pattern templates, comparator-code masks and chamber occupancy maps all
//! share this layout: `COLS` horizontal positions (half-strips, wire groups
//! or code slots) by `ROWS` layers. Storage is a plain nested array so a grid
//! lives on the stack and copies without allocation; every accessor checks
//! its indices and reports misses instead of panicking.

use std::fmt;

/// A `COLS × ROWS` matrix stored column-major.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid<T, const COLS: usize, const ROWS: usize> {
    cells: [[T; ROWS]; COLS],
}

impl<T: Copy + Default, const COLS: usize, const ROWS: usize> Grid<T, COLS, ROWS> {
    /// Create a grid with every cell at `T::default()`.
    pub fn new() -> Self {
        Self {
            cells: [[T::default(); ROWS]; COLS],
        }
    }

    /// Build a grid from row-major data, one array per layer.
    ///
    /// Convenient for writing templates the way they are drawn.
    pub fn from_rows(rows: &[[T; COLS]; ROWS]) -> Self {
        let mut grid = Self::new();
        for (row, values) in rows.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                grid.cells[col][row] = value;
            }
        }
        grid
    }

    /// Number of columns.
    pub const fn cols(&self) -> usize {
        COLS
    }

    /// Number of rows.
    pub const fn rows(&self) -> usize {
        ROWS
    }

    /// Value at `(col, row)`, or `None` when outside the grid.
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<T> {
        self.cells.get(col).and_then(|column| column.get(row)).copied()
    }

    /// Overwrite `(col, row)`. Returns `false` when outside the grid.
    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: T) -> bool {
        match self.cells.get_mut(col).and_then(|column| column.get_mut(row)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Mutable access to `(col, row)`.
    #[inline]
    pub fn get_mut(&mut self, col: usize, row: usize) -> Option<&mut T> {
        self.cells.get_mut(col).and_then(|column| column.get_mut(row))
    }

    /// Reset every cell to `value`.
    pub fn fill(&mut self, value: T) {
        for column in self.cells.iter_mut() {
            column.fill(value);
        }
    }

    /// Values of one row from left to right (empty when `row` is out of range).
    pub fn row(&self, row: usize) -> impl Iterator<Item = T> + '_ {
        let valid = row < ROWS;
        self.cells
            .iter()
            .filter(move |_| valid)
            .map(move |column| column[row])
    }

    /// Every cell as `(col, row, value)`, column by column.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.cells.iter().enumerate().flat_map(|(col, column)| {
            column
                .iter()
                .enumerate()
                .map(move |(row, &value)| (col, row, value))
        })
    }

    /// Left-right mirror image: column `c` moves to `COLS - 1 - c`.
    pub fn mirrored(&self) -> Self {
        let mut out = *self;
        out.cells.reverse();
        out
    }
}

impl<T: Copy + Default + PartialEq, const COLS: usize, const ROWS: usize> Grid<T, COLS, ROWS> {
    /// Count cells that differ from `T::default()`.
    pub fn count_set(&self) -> usize {
        let empty = T::default();
        self.cells().filter(|&(_, _, v)| v != empty).count()
    }

    /// Columns in `row` whose value differs from `T::default()`, ascending.
    pub fn set_in_row(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        let empty = T::default();
        self.row(row)
            .enumerate()
            .filter(move |&(_, v)| v != empty)
            .map(|(col, _)| col)
    }
}

impl<T: Copy + Default, const COLS: usize, const ROWS: usize> Default for Grid<T, COLS, ROWS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, const COLS: usize, const ROWS: usize> fmt::Debug for Grid<T, COLS, ROWS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for row in 0..ROWS {
            let values: Vec<&T> = self.cells.iter().map(|column| &column[row]).collect();
            list.entry(&values);
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_checked_access() {
        let mut grid: Grid<u8, 4, 2> = Grid::new();
        assert!(grid.set(3, 1, 7));
        assert_eq!(grid.get(3, 1), Some(7));
        assert_eq!(grid.get(4, 0), None);
        assert_eq!(grid.get(0, 2), None);
        assert!(!grid.set(4, 0, 1));
        assert_eq!(grid.count_set(), 1);
    }

    #[test]
    fn test_from_rows_layout() {
        let grid = Grid::<u8, 3, 2>::from_rows(&[[1, 0, 0], [0, 0, 2]]);
        assert_eq!(grid.get(0, 0), Some(1));
        assert_eq!(grid.get(2, 1), Some(2));
        assert_eq!(grid.row(1).collect::<Vec<_>>(), vec![0, 0, 2]);
        assert_eq!(grid.row(5).count(), 0);
    }

    #[test]
    fn test_mirror() {
        let grid = Grid::<bool, 5, 1>::from_rows(&[[true, true, false, false, false]]);
        let mirrored = grid.mirrored();
        assert_eq!(mirrored.set_in_row(0).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(mirrored.mirrored(), grid);
    }
}
