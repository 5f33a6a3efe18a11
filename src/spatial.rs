//! One-dimensional spatial hash over track positions.

use std::hash::Hash;

use num::Integer;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::DEFAULT_OVERFLOW_CELL_FACTOR;

/// Bucketed multimap from track position cells to values.
///
/// Intervals spanning more than `overflow_factor` cells, or running backwards, are not bucketed.
/// They are kept in a small overflow set instead, which every range query returns.
#[derive(Debug, Clone)]
pub struct SpatialHashMap1D<T> {
    cell_size: i64,
    overflow_factor: i64,
    cells: FxHashMap<i64, Vec<T>>,
    overflow: FxHashSet<T>,
}

impl<T: Copy + Eq + Hash> SpatialHashMap1D<T> {
    /// Create an empty map. A non-positive `cell_size` is raised to 1.
    #[must_use]
    pub fn new(cell_size: i64) -> Self {
        Self {
            cell_size: cell_size.max(1),
            overflow_factor: DEFAULT_OVERFLOW_CELL_FACTOR,
            cells: FxHashMap::default(),
            overflow: FxHashSet::default(),
        }
    }

    /// Sets how many cells an interval may span before it overflows.
    #[must_use]
    pub fn with_overflow_factor(mut self, factor: i64) -> Self {
        self.overflow_factor = factor.max(1);
        self
    }

    /// Size of a cell in track units.
    #[must_use]
    pub const fn cell_size(&self) -> i64 {
        self.cell_size
    }

    /// Cell containing `position`, rounding toward negative infinity.
    #[must_use]
    pub fn cell_of(&self, position: i64) -> i64 {
        Integer::div_floor(&position, &self.cell_size)
    }

    /// Inserts `value` at a single position.
    pub fn add(&mut self, position: i64, value: T) {
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(value);
    }

    /// Inserts `value` into every cell from `start` to `end` inclusive.
    ///
    /// Returns `false` when the interval was routed into the overflow set.
    pub fn add_range(&mut self, start: i64, end: i64, value: T) -> bool {
        let limit = self.overflow_factor.saturating_mul(self.cell_size);
        let fits = end
            .checked_sub(start)
            .is_some_and(|length| (0..=limit).contains(&length));
        if !fits {
            self.overflow.insert(value);
            return false;
        }
        for cell in self.cell_of(start)..=self.cell_of(end) {
            self.cells.entry(cell).or_default().push(value);
        }
        true
    }

    /// Values bucketed in the cell containing `position`.
    #[must_use]
    pub fn values_at(&self, position: i64) -> &[T] {
        self.cells
            .get(&self.cell_of(position))
            .map_or(&[], Vec::as_slice)
    }

    /// Whether `value` is in the overflow set.
    #[must_use]
    pub fn is_overflow(&self, value: &T) -> bool {
        self.overflow.contains(value)
    }

    /// Values which are always in range.
    pub fn overflow(&self) -> impl Iterator<Item = &T> {
        self.overflow.iter()
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Adds every value in `[center - half_width, center + half_width]`, and the overflow set, to
    /// `out`.
    ///
    /// Cells are scanned one by one unless the window spans more cells than are occupied, in
    /// which case the occupied cells are filtered instead.
    pub fn union_range_into(&self, center: i64, half_width: i64, out: &mut FxHashSet<T>) {
        let half_width = half_width.max(0);
        let first = self.cell_of(center.saturating_sub(half_width));
        let last = self.cell_of(center.saturating_add(half_width));
        let span = last.saturating_sub(first);

        if usize::try_from(span).ok().is_none_or(|span| span > self.cells.len()) {
            let window = first..=last;
            for (_, values) in self.cells.iter().filter(|(cell, _)| window.contains(*cell)) {
                out.extend(values.iter().copied());
            }
        } else {
            for cell in first..=last {
                if let Some(values) = self.cells.get(&cell) {
                    out.extend(values.iter().copied());
                }
            }
        }
        out.extend(self.overflow.iter().copied());
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.overflow.clear();
    }
}
