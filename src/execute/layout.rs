//! Auto-grid placement for entities added to a view without coordinates.
use crate::model::Bounds;
use std::collections::BTreeMap;

pub const GRID_COLUMNS: usize = 4;
pub const GRID_ORIGIN: i64 = 30;
pub const GRID_STEP_X: i64 = 160;
pub const GRID_STEP_Y: i64 = 80;
pub const DEFAULT_WIDTH: i64 = 120;
pub const DEFAULT_HEIGHT: i64 = 55;

/// Top-left corner of grid slot `slot`, filling rows of four.
pub fn grid_position(slot: usize) -> (i64, i64) {
    let column = (slot % GRID_COLUMNS) as i64;
    let row = (slot / GRID_COLUMNS) as i64;
    (
        GRID_ORIGIN + column * GRID_STEP_X,
        GRID_ORIGIN + row * GRID_STEP_Y,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Explicit,
    /// Took the given grid slot on its view.
    Auto(usize),
}

/// Per-view slot counters for one run.
#[derive(Debug, Default)]
pub struct GridCursor {
    next_slot: BTreeMap<String, usize>,
}

impl GridCursor {
    /// Bounds for the next placement on `view`, without consuming a slot.
    pub fn bounds_for(
        &self,
        view: &str,
        x: Option<i64>,
        y: Option<i64>,
        width: Option<i64>,
        height: Option<i64>,
    ) -> (Bounds, Placement) {
        let width = width.unwrap_or(DEFAULT_WIDTH);
        let height = height.unwrap_or(DEFAULT_HEIGHT);
        match (x, y) {
            (Some(x), Some(y)) => (
                Bounds {
                    x,
                    y,
                    width,
                    height,
                },
                Placement::Explicit,
            ),
            _ => {
                let slot = self.next_slot.get(view).copied().unwrap_or(0);
                let (x, y) = grid_position(slot);
                (
                    Bounds {
                        x,
                        y,
                        width,
                        height,
                    },
                    Placement::Auto(slot),
                )
            }
        }
    }

    /// Record a successful placement; only auto placements advance the cursor.
    pub fn commit(&mut self, view: &str, placement: Placement) {
        if let Placement::Auto(slot) = placement {
            self.next_slot.insert(view.to_string(), slot + 1);
        }
    }
}
