//! Dependency graph for formula cells.
//!
//! The graph is stored inside the grid's cells rather than beside them:
//! every cell lists its precedents (`dependencies`) and its dependents
//! (`adjacents`) by `CellId`, an index into the grid-owned array.
//!
//! # Edge Direction
//!
//! ```text
//! A → B  means  "B depends on A"  (A is a precedent of B)
//! ```
//!
//! # Invariants
//!
//! 1. **Bidirectional consistency:** A ∈ dependencies[B] ⇔ B ∈ adjacents[A].
//! 2. **No duplicate edges:** referencing a cell twice adds one edge.
//! 3. **Degrees match lists:** in_degree = |dependencies|, out_degree = |adjacents|.
//! 4. **Atomic updates:** `update_dependencies` is the only mutator that touches both directions.

use rustc_hash::FxHashSet;

use crate::cell_id::CellId;
use crate::error::EngineError;
use crate::grid::Grid;

impl Grid {
    /// Replace all precedents of `target` atomically.
    ///
    /// 1. Removes `target` from every old precedent's adjacents
    /// 2. Clears `target`'s dependencies and in-degree
    /// 3. Adds each distinct new reference in both directions
    ///
    /// Every reference is bounds-checked before anything changes. Does not
    /// evaluate anything.
    pub fn update_dependencies<I>(&mut self, target: CellId, new_refs: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = CellId>,
    {
        let target_index = self.index_of(target).ok_or(EngineError::OutOfBounds {
            row: target.row,
            col: target.col,
            size: self.size(),
        })?;

        let mut seen = FxHashSet::default();
        let mut refs = Vec::new();
        for reference in new_refs {
            let index = self.index_of(reference).ok_or(EngineError::ReferenceOutOfBounds {
                reference,
                size: self.size(),
            })?;
            if seen.insert(index) {
                refs.push((reference, index));
            }
        }

        // Step 1 + 2: Remove old edges
        for old in self.cells[target_index].clear_dependencies() {
            let index = self.index(old);
            self.cells[index].remove_adjacent(target);
        }

        // Step 3: Add new edges
        for (reference, index) in refs {
            self.cells[target_index].add_dependency(reference);
            self.cells[index].add_adjacent(target);
        }

        Ok(())
    }

    /// Cells `cell` depends on, in the order its formula first references them.
    pub fn precedents(&self, cell: CellId) -> &[CellId] {
        self.index_of(cell)
            .map(|index| self.cells[index].dependencies())
            .unwrap_or(&[])
    }

    /// Cells whose formulas reference `cell`.
    pub fn dependents(&self, cell: CellId) -> &[CellId] {
        self.index_of(cell)
            .map(|index| self.cells[index].adjacents())
            .unwrap_or(&[])
    }

    /// Number of dependency edges in the grid.
    pub fn edge_count(&self) -> usize {
        self.cells.iter().map(|c| c.in_degree()).sum()
    }

    /// Check all invariants. Panics if any are violated.
    ///
    /// Only available in test builds.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        for cell in &self.cells {
            let id = cell.id();

            // Invariant 1: Bidirectional consistency (dependencies → adjacents)
            for dep in cell.dependencies() {
                assert!(
                    self.dependents(*dep).contains(&id),
                    "Missing adjacent edge: {} should have {} in adjacents",
                    dep,
                    id
                );
            }

            // Invariant 1: Bidirectional consistency (adjacents → dependencies)
            for adj in cell.adjacents() {
                assert!(
                    self.precedents(*adj).contains(&id),
                    "Missing dependency edge: {} should have {} in dependencies",
                    adj,
                    id
                );
            }

            // Invariant 2: No duplicates
            let deps: FxHashSet<_> = cell.dependencies().iter().collect();
            assert_eq!(deps.len(), cell.dependencies().len(), "Duplicate dependency in {}", id);
            let adjs: FxHashSet<_> = cell.adjacents().iter().collect();
            assert_eq!(adjs.len(), cell.adjacents().len(), "Duplicate adjacent in {}", id);

            // Invariant 3: Degrees match
            assert_eq!(cell.in_degree(), cell.dependencies().len(), "in_degree of {}", id);
            assert_eq!(cell.out_degree(), cell.adjacents().len(), "out_degree of {}", id);
        }
    }
}
