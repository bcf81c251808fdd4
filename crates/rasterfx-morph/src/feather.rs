//! Gaussian feathering of a selection edge
//!
//! Feathering is a separable Gaussian blur of the mask run on the
//! convolution engine: a horizontal pass into an intermediate device, then
//! a vertical pass back into the mask. Both passes repeat the edge pixels
//! of the mask bounds.

use log::debug;
use rasterfx_core::{PaintDevice, PixelSelection, Rect};
use rasterfx_filter::{BorderOp, ConvolutionKernel, ConvolutionPainter, EnginePreference};

use crate::MorphResult;
use crate::filter::SelectionFilter;

/// Blur the selection edge with a Gaussian of the given radius
#[derive(Debug, Clone, Copy)]
pub struct FeatherSelectionFilter {
    radius: i32,
    engine: EnginePreference,
}

impl FeatherSelectionFilter {
    /// Create a feather filter; the convolution engine follows
    /// [`EnginePreference::from_env`].
    pub fn new(radius: i32) -> Self {
        Self {
            radius,
            engine: EnginePreference::from_env(),
        }
    }

    /// Override the convolution engine used for both passes
    pub fn with_engine_preference(mut self, engine: EnginePreference) -> Self {
        self.engine = engine;
        self
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }
}

impl SelectionFilter for FeatherSelectionFilter {
    fn name(&self) -> &'static str {
        "Feather Selection"
    }

    fn change_rect(&self, rect: Rect, _default_bounds: Rect) -> Rect {
        rect.adjusted(-self.radius, -self.radius, self.radius, self.radius)
    }

    fn process(&self, selection: &mut PixelSelection, rect: Rect) -> MorphResult<()> {
        if self.radius <= 0 || rect.is_empty() {
            return Ok(());
        }
        let horizontal = ConvolutionKernel::gaussian(self.radius as usize)?;
        let vertical = horizontal.transposed();

        let color_space = selection.device().color_space().clone();
        let mut interm = PaintDevice::new(color_space.clone());
        interm.prepare_clone(selection.device());

        let mut painter = ConvolutionPainter::new();
        painter
            .set_channel_flags(color_space.channel_flags(false, true))
            .set_engine_preference(self.engine);
        debug!("feathering {:?} with radius {}", rect, self.radius);

        let (pos, size) = (rect.top_left(), rect.size());
        painter.apply_matrix(
            &horizontal,
            selection.device(),
            &mut interm,
            pos,
            pos,
            size,
            BorderOp::Repeat,
        )?;
        painter.apply_matrix(
            &vertical,
            &interm,
            selection.device_mut(),
            pos,
            pos,
            size,
            BorderOp::Repeat,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterfx_core::SELECTED;

    #[test]
    fn test_feather_softens_edge() {
        let bounds = Rect::new_unchecked(0, 0, 16, 16);
        let mut sel = PixelSelection::new(bounds);
        sel.fill(Rect::new_unchecked(0, 0, 8, 16), SELECTED).unwrap();

        FeatherSelectionFilter::new(2)
            .with_engine_preference(EnginePreference::Spatial)
            .process(&mut sel, bounds)
            .unwrap();

        assert_eq!(sel.value(0, 8), SELECTED);
        assert_eq!(sel.value(15, 8), 0);
        let inside = sel.value(7, 8);
        let outside = sel.value(8, 8);
        assert!(inside > outside, "{} <= {}", inside, outside);
        assert!(inside < SELECTED && outside > 0);
        // Rows are identical: the vertical pass sees a column-constant mask
        assert_eq!(sel.value(7, 0), inside);
    }

    #[test]
    fn test_feather_zero_radius_is_noop() {
        let bounds = Rect::new_unchecked(0, 0, 4, 4);
        let mut sel = PixelSelection::new(bounds);
        sel.set_value(1, 1, SELECTED);
        FeatherSelectionFilter::new(0).process(&mut sel, bounds).unwrap();
        assert_eq!(sel.value(1, 1), SELECTED);
        assert_eq!(sel.value(2, 1), 0);
    }

    #[test]
    fn test_change_rect_and_name() {
        let filter = FeatherSelectionFilter::new(3);
        let bounds = Rect::new_unchecked(0, 0, 50, 50);
        assert_eq!(
            filter.change_rect(Rect::new_unchecked(10, 10, 5, 5), bounds),
            Rect::new_unchecked(7, 7, 11, 11)
        );
        assert_eq!(filter.name(), "Feather Selection");
    }
}
