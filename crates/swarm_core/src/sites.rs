//! Structure-site selection.
//!
//! Scans the map for admissible placement cells and picks the one closest to
//! the current workforce, so new objectives staff quickly. Chosen cells are
//! reserved immediately; two objectives created back to back can never
//! double-book a site.
//!
//! The scan is O(map area x neighborhood x workforce) and runs only on
//! objective creation, never per tick. If objective creation ever becomes
//! frequent, admissibility should be cached and updated incrementally
//! instead of rescanned.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::oracle::Oracle;

/// Tracks reserved sites and picks new ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePlanner {
    planned: BTreeSet<GridPos>,
}

impl SitePlanner {
    /// Create a planner with no reservations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick and reserve the best admissible structure site.
    ///
    /// A cell is admissible when it is an interior cell, it and its full
    /// 8-neighborhood are passable, hold no structure, and none of them is
    /// already reserved. Among admissible cells the winner minimizes squared
    /// distance to the nearest workforce position.
    ///
    /// Returns `None` when no admissible cell exists or the workforce is
    /// empty (an unreachable site is as useless as none).
    pub fn pick_site(&mut self, oracle: &dyn Oracle, workforce: &[GridPos]) -> Option<GridPos> {
        if workforce.is_empty() {
            return None;
        }

        let width = oracle.map_width() as i32;
        let height = oracle.map_height() as i32;
        let mut best: Option<(GridPos, u32)> = None;

        for x in 1..width - 1 {
            for y in 1..height - 1 {
                let cell = GridPos::new(x, y);
                if !self.is_admissible(oracle, cell) {
                    continue;
                }
                let distance = workforce
                    .iter()
                    .map(|w| cell.distance_squared(*w))
                    .min()
                    .unwrap_or(u32::MAX);
                let closer = best.map_or(true, |(_, d)| distance < d);
                if closer {
                    best = Some((cell, distance));
                }
            }
        }

        let site = best.map(|(cell, _)| cell)?;
        self.planned.insert(site);
        tracing::info!(x = site.x, y = site.y, "reserved structure site");
        Some(site)
    }

    fn is_admissible(&self, oracle: &dyn Oracle, cell: GridPos) -> bool {
        if !self.cell_clear(oracle, cell) {
            return false;
        }
        cell.neighbors().iter().all(|n| self.cell_clear(oracle, *n))
    }

    fn cell_clear(&self, oracle: &dyn Oracle, cell: GridPos) -> bool {
        !self.planned.contains(&cell)
            && oracle.is_passable(cell)
            && oracle.structure_at(cell).is_none()
    }

    /// Release a reservation (objective abandoned or structure finished).
    pub fn release(&mut self, site: GridPos) -> bool {
        self.planned.remove(&site)
    }

    /// Whether a cell is currently reserved.
    #[must_use]
    pub fn is_planned(&self, cell: GridPos) -> bool {
        self.planned.contains(&cell)
    }

    /// Number of outstanding reservations.
    #[must_use]
    pub fn reserved_count(&self) -> usize {
        self.planned.len()
    }
}
