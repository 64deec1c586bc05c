//! Fixed-size working memory for the interpreter.
//!
//! The tape has two kinds of access:
//! - [`Tape::read`] never fails and yields 0 for any index outside the tape.
//! - The mutating family ([`Tape::write`], [`Tape::increment`], [`Tape::decrement`],
//!   [`Tape::shift`]) requires an in-bounds index. Callers check
//!   [`Tape::contains`] first; passing an out-of-range index is a bug in the caller
//!   and panics on the slice index.

use std::collections::TryReserveError;

/// Number of cells a tape gets when no size is configured.
pub const DEFAULT_MEMORY_SIZE: usize = 202_000;

/// Direction for [`Tape::shift`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// `cell <<= 1`
    Left,
    /// `cell >>= 1`, sign preserving
    Right,
}

/// A zero-initialized run of signed 32-bit cells whose length never changes.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<i32>,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }
}

impl Tape {
    /// Create a tape of `len` zeroed cells.
    pub fn new(len: usize) -> Self {
        Self { cells: vec![0; len] }
    }

    /// Like [`Tape::new`], but reports an allocation failure instead of
    /// aborting the process.
    pub fn try_new(len: usize) -> Result<Self, TryReserveError> {
        let mut cells = Vec::new();
        cells.try_reserve_exact(len)?;
        cells.resize(len, 0);
        Ok(Self { cells })
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `index` addresses a real cell.
    #[inline]
    pub fn contains(&self, index: i32) -> bool {
        0 <= index && (index as usize) < self.cells.len()
    }

    /// Value at `index`, or 0 when `index` is outside the tape.
    #[inline]
    pub fn read(&self, index: i32) -> i32 {
        if self.contains(index) {
            self.cells[index as usize]
        } else {
            0
        }
    }

    #[inline]
    pub fn write(&mut self, index: i32, value: i32) {
        self.cells[index as usize] = value;
    }

    #[inline]
    pub fn increment(&mut self, index: i32) {
        let cell = &mut self.cells[index as usize];
        *cell = cell.wrapping_add(1);
    }

    #[inline]
    pub fn decrement(&mut self, index: i32) {
        let cell = &mut self.cells[index as usize];
        *cell = cell.wrapping_sub(1);
    }

    #[inline]
    pub fn shift(&mut self, index: i32, direction: ShiftDirection) {
        let cell = &mut self.cells[index as usize];
        *cell = match direction {
            ShiftDirection::Left => cell.wrapping_shl(1),
            ShiftDirection::Right => *cell >> 1,
        };
    }

    /// Zero every cell.
    pub fn reset(&mut self) {
        self.cells.fill(0);
    }
}
