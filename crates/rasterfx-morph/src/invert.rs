//! Selection inversion

use rasterfx_core::{PixelSelection, Rect};

use crate::MorphResult;
use crate::filter::SelectionFilter;

/// Swap selected and unselected everywhere, including the unstored
/// background
#[derive(Debug, Clone, Copy, Default)]
pub struct InvertSelectionFilter;

impl InvertSelectionFilter {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionFilter for InvertSelectionFilter {
    fn name(&self) -> &'static str {
        "Invert Selection"
    }

    /// Inversion changes every pixel, so the whole default bounds are dirty
    fn change_rect(&self, _rect: Rect, default_bounds: Rect) -> Rect {
        default_bounds
    }

    fn process(&self, selection: &mut PixelSelection, _rect: Rect) -> MorphResult<()> {
        selection.invert();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterfx_core::{SELECTED, UNSELECTED};

    #[test]
    fn test_invert_flips_background() {
        let bounds = Rect::new_unchecked(0, 0, 10, 10);
        let mut sel = PixelSelection::new(bounds);
        sel.set_value(2, 2, 40);
        InvertSelectionFilter.process(&mut sel, Rect::default()).unwrap();
        assert_eq!(sel.value(2, 2), 215);
        assert_eq!(sel.value(9, 9), SELECTED);
        assert_eq!(sel.value(-50, 70), SELECTED);
        InvertSelectionFilter.process(&mut sel, Rect::default()).unwrap();
        assert_eq!(sel.value(-50, 70), UNSELECTED);
    }

    #[test]
    fn test_change_rect_is_default_bounds() {
        let bounds = Rect::new_unchecked(0, 0, 64, 32);
        let rect = Rect::new_unchecked(5, 5, 1, 1);
        assert_eq!(InvertSelectionFilter.change_rect(rect, bounds), bounds);
        assert_eq!(InvertSelectionFilter.name(), "Invert Selection");
    }
}
