//! 3x3 box smoothing of a selection mask

use rasterfx_core::{PixelSelection, Rect};

use crate::MorphResult;
use crate::filter::{SelectionFilter, scan_3x3};

/// Replace each pixel with the truncated mean of its 3x3 neighborhood
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothSelectionFilter;

impl SmoothSelectionFilter {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionFilter for SmoothSelectionFilter {
    fn name(&self) -> &'static str {
        "Smooth Selection"
    }

    fn change_rect(&self, rect: Rect, _default_bounds: Rect) -> Rect {
        rect.adjusted(-1, -1, 1, 1)
    }

    fn process(&self, selection: &mut PixelSelection, rect: Rect) -> MorphResult<()> {
        scan_3x3(selection, rect, |rows, x| {
            let sum: u32 = rows
                .iter()
                .flat_map(|row| &row[x..x + 3])
                .map(|&v| u32::from(v))
                .sum();
            (sum / 9) as u8
        })
    }
}
