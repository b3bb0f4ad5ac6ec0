//! Uniform spatial grid for neighbor queries
//!
//! Rebuilt from empty every frame. A body is bucketed into every cell its
//! radius-inflated bounds touch, so two overlapping circles always share at
//! least one cell. Shared cells do not imply contact; callers filter with an
//! exact distance test.

use std::collections::{BTreeSet, HashMap};

use glam::DVec2;

use super::body::PhysicsBody;
use crate::consts::CELL_SIZE;

/// Upper bound on cells per axis so flattened indices stay within `i32`
const MAX_CELLS_PER_AXIS: i32 = 1 << 15;

/// Which caller-owned list an entry points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BodyRef {
    Bot(usize),
    Projectile(usize),
}

/// Inclusive range of cell coordinates covered by a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellSpan {
    min: (i32, i32),
    max: (i32, i32),
}

impl CellSpan {
    fn cells(self, cols: i32) -> impl Iterator<Item = i32> {
        (self.min.1..=self.max.1)
            .flat_map(move |cy| (self.min.0..=self.max.0).map(move |cx| cy * cols + cx))
    }
}

/// Spatial index over the current frame's bodies
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    min_radius: f64,
    cols: i32,
    rows: i32,
    cells: HashMap<i32, Vec<BodyRef>>,
    spans: HashMap<BodyRef, CellSpan>,
}

impl SpatialGrid {
    /// Grid with square cells of `cell_size`, falling back to the default
    /// size when it is not finite and positive
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            log::warn!("Invalid grid cell size {cell_size}, using {CELL_SIZE}");
            CELL_SIZE
        };
        Self {
            cell_size,
            min_radius: 0.0,
            cols: 1,
            rows: 1,
            cells: HashMap::new(),
            spans: HashMap::new(),
        }
    }

    /// Floor applied to every radius on insert
    ///
    /// Must match the floor the exact overlap test uses, or sub-floor bodies
    /// get a smaller footprint here than in contact resolution.
    pub fn with_min_radius(mut self, min_radius: f64) -> Self {
        self.min_radius = if min_radius.is_finite() {
            min_radius.max(0.0)
        } else {
            0.0
        };
        self
    }

    /// Empty the grid and size it for the given arena
    pub fn clear(&mut self, width: f64, height: f64) {
        self.cells.clear();
        self.spans.clear();
        self.cols = Self::cells_along(width, self.cell_size);
        self.rows = Self::cells_along(height, self.cell_size);
    }

    fn cells_along(extent: f64, cell_size: f64) -> i32 {
        if extent.is_finite() && extent > 0.0 {
            ((extent / cell_size).ceil() as i32).clamp(1, MAX_CELLS_PER_AXIS)
        } else {
            1
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Grid dimensions as (columns, rows)
    pub fn dimensions(&self) -> (i32, i32) {
        (self.cols, self.rows)
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Cell coordinate along one axis, clamped into the grid
    ///
    /// Bodies poking past the arena edge land in the border cells. Clamping is
    /// monotonic, so overlapping ranges stay overlapping.
    fn axis_cell(&self, coord: f64, limit: i32) -> i32 {
        let c = (coord / self.cell_size).floor();
        if c.is_nan() {
            return 0;
        }
        (c.clamp(0.0, f64::from(limit - 1))) as i32
    }

    fn span_for(&self, pos: DVec2, radius: f64) -> CellSpan {
        let radius = radius.max(self.min_radius);
        CellSpan {
            min: (
                self.axis_cell(pos.x - radius, self.cols),
                self.axis_cell(pos.y - radius, self.rows),
            ),
            max: (
                self.axis_cell(pos.x + radius, self.cols),
                self.axis_cell(pos.y + radius, self.rows),
            ),
        }
    }

    /// Bucket a body into every cell its bounds intersect
    ///
    /// Inserting the same reference twice in one frame is a no-op.
    pub fn insert<B: PhysicsBody + ?Sized>(&mut self, who: BodyRef, body: &B) {
        if self.spans.contains_key(&who) {
            return;
        }
        let span = self.span_for(body.position(), body.radius());
        for cell in span.cells(self.cols) {
            self.cells.entry(cell).or_default().push(who);
        }
        self.spans.insert(who, span);
    }

    /// Every distinct body sharing at least one cell with `who`, excluding itself
    ///
    /// Returned in a stable order so resolution is deterministic.
    pub fn query_neighbors(&self, who: BodyRef) -> BTreeSet<BodyRef> {
        let mut found = BTreeSet::new();
        let Some(span) = self.spans.get(&who) else {
            return found;
        };
        for cell in span.cells(self.cols) {
            if let Some(bucket) = self.cells.get(&cell) {
                found.extend(bucket.iter().copied().filter(|other| *other != who));
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Bot;
    use proptest::prelude::*;

    fn grid_with(bots: &[Bot]) -> SpatialGrid {
        let mut grid = SpatialGrid::new(64.0);
        grid.clear(800.0, 600.0);
        for (i, bot) in bots.iter().enumerate() {
            grid.insert(BodyRef::Bot(i), bot);
        }
        grid
    }

    #[test]
    fn test_dimensions() {
        let mut grid = SpatialGrid::new(64.0);
        grid.clear(800.0, 600.0);
        assert_eq!(grid.dimensions(), (13, 10));
        grid.clear(0.0, f64::NAN);
        assert_eq!(grid.dimensions(), (1, 1));
    }

    #[test]
    fn test_body_spans_multiple_cells() {
        // Straddles the corner shared by four cells
        let bots = [Bot::new(1, DVec2::new(64.0, 64.0))];
        let grid = grid_with(&bots);
        assert_eq!(grid.occupied_cells(), 4);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_double_insert_is_ignored() {
        let bot = Bot::new(1, DVec2::new(64.0, 64.0));
        let mut grid = SpatialGrid::new(64.0);
        grid.clear(800.0, 600.0);
        grid.insert(BodyRef::Bot(0), &bot);
        grid.insert(BodyRef::Bot(0), &bot);
        for bucket in grid.cells.values() {
            assert_eq!(bucket.len(), 1);
        }
    }

    #[test]
    fn test_query_excludes_self_and_dedups() {
        let bots = [
            Bot::new(1, DVec2::new(64.0, 64.0)),
            Bot::new(2, DVec2::new(70.0, 70.0)),
            Bot::new(3, DVec2::new(700.0, 500.0)),
        ];
        let grid = grid_with(&bots);
        let near = grid.query_neighbors(BodyRef::Bot(0));
        assert_eq!(near.into_iter().collect::<Vec<_>>(), vec![BodyRef::Bot(1)]);
        assert!(grid.query_neighbors(BodyRef::Bot(2)).is_empty());
    }

    #[test]
    fn test_clear_empties() {
        let bots = [Bot::new(1, DVec2::new(100.0, 100.0))];
        let mut grid = grid_with(&bots);
        grid.clear(800.0, 600.0);
        assert!(grid.is_empty());
        assert!(grid.query_neighbors(BodyRef::Bot(0)).is_empty());
    }

    #[test]
    fn test_bad_cell_size_falls_back() {
        for size in [0.0, -8.0, f64::NAN, f64::INFINITY] {
            let mut grid = SpatialGrid::new(size);
            assert_eq!(grid.cell_size(), CELL_SIZE);
            grid.clear(800.0, 600.0);
            assert_eq!(grid.dimensions(), (13, 10));
        }
    }

    #[test]
    fn test_tiny_cells_are_capped() {
        let mut grid = SpatialGrid::new(1e-9);
        grid.clear(800.0, 600.0);
        let (cols, rows) = grid.dimensions();
        assert_eq!((cols, rows), (MAX_CELLS_PER_AXIS, MAX_CELLS_PER_AXIS));

        let bots = [
            Bot::new(1, DVec2::new(400.0, 300.0)).with_radius(0.0),
            Bot::new(2, DVec2::new(400.0, 300.0)).with_radius(0.0),
        ];
        for (i, bot) in bots.iter().enumerate() {
            grid.insert(BodyRef::Bot(i), bot);
        }
        assert!(grid.query_neighbors(BodyRef::Bot(0)).contains(&BodyRef::Bot(1)));
    }

    #[test]
    fn test_sub_floor_radii_use_min_radius() {
        // 0.2 apart across the x = 64 cell edge, within the floored reach of 1.0
        let bots = [
            Bot::new(1, DVec2::new(63.9, 100.0)).with_radius(0.0),
            Bot::new(2, DVec2::new(64.1, 100.0)).with_radius(0.0),
        ];
        let mut grid = SpatialGrid::new(64.0).with_min_radius(0.5);
        grid.clear(800.0, 600.0);
        for (i, bot) in bots.iter().enumerate() {
            grid.insert(BodyRef::Bot(i), bot);
        }
        assert!(grid.query_neighbors(BodyRef::Bot(0)).contains(&BodyRef::Bot(1)));

        // Without the floor the two land in separate cells
        let unfloored = grid_with(&bots);
        assert!(unfloored.query_neighbors(BodyRef::Bot(0)).is_empty());
    }

    #[test]
    fn test_out_of_bounds_bodies_clamp_to_edge() {
        let bots = [
            Bot::new(1, DVec2::new(-50.0, 300.0)),
            Bot::new(2, DVec2::new(5.0, 300.0)),
        ];
        let grid = grid_with(&bots);
        assert!(grid.query_neighbors(BodyRef::Bot(0)).contains(&BodyRef::Bot(1)));
    }

    proptest! {
        #[test]
        fn prop_overlapping_circles_share_a_cell(
            x1 in -50.0f64..850.0, y1 in -50.0f64..650.0,
            r1 in 1.0f64..60.0, r2 in 1.0f64..60.0,
            angle in 0.0f64..std::f64::consts::TAU, t in 0.0f64..0.999,
        ) {
            let dist = (r1 + r2) * t;
            let p2 = DVec2::new(x1, y1) + DVec2::new(angle.cos(), angle.sin()) * dist;
            let bots = [
                Bot::new(1, DVec2::new(x1, y1)).with_radius(r1),
                Bot::new(2, p2).with_radius(r2),
            ];
            let grid = grid_with(&bots);
            prop_assert!(grid.query_neighbors(BodyRef::Bot(0)).contains(&BodyRef::Bot(1)));
            prop_assert!(grid.query_neighbors(BodyRef::Bot(1)).contains(&BodyRef::Bot(0)));
        }
    }
}
