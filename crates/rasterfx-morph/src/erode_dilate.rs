//! Radius-1 erosion and dilation
//!
//! Both filters use a cross-shaped structuring element: each output pixel
//! is the minimum (erode) or maximum (dilate) of the pixel and its four
//! 4-connected neighbors. Pixels outside the processed rectangle repeat
//! its edge.

use rasterfx_core::{PixelSelection, Rect};

use crate::MorphResult;
use crate::filter::{SelectionFilter, scan_3x3};

/// The five cross values around output column `x`
#[inline]
fn cross(rows: [&[u8]; 3], x: usize) -> [u8; 5] {
    [
        rows[0][x + 1],
        rows[1][x],
        rows[1][x + 1],
        rows[1][x + 2],
        rows[2][x + 1],
    ]
}

/// Shrink the selection by one pixel
#[derive(Debug, Clone, Copy, Default)]
pub struct ErodeSelectionFilter;

impl ErodeSelectionFilter {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionFilter for ErodeSelectionFilter {
    fn name(&self) -> &'static str {
        "Erode Selection"
    }

    fn change_rect(&self, rect: Rect, _default_bounds: Rect) -> Rect {
        rect.adjusted(-1, -1, 1, 1)
    }

    fn process(&self, selection: &mut PixelSelection, rect: Rect) -> MorphResult<()> {
        scan_3x3(selection, rect, |rows, x| {
            cross(rows, x).into_iter().min().unwrap_or(0)
        })
    }
}

/// Grow the selection by one pixel
#[derive(Debug, Clone, Copy, Default)]
pub struct DilateSelectionFilter;

impl DilateSelectionFilter {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionFilter for DilateSelectionFilter {
    fn name(&self) -> &'static str {
        "Dilate Selection"
    }

    fn change_rect(&self, rect: Rect, _default_bounds: Rect) -> Rect {
        rect.adjusted(-1, -1, 1, 1)
    }

    fn process(&self, selection: &mut PixelSelection, rect: Rect) -> MorphResult<()> {
        scan_3x3(selection, rect, |rows, x| {
            cross(rows, x).into_iter().max().unwrap_or(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(rows: &[&[u8]]) -> PixelSelection {
        let h = rows.len() as i32;
        let w = rows[0].len() as i32;
        let rect = Rect::new_unchecked(0, 0, w, h);
        let mut sel = PixelSelection::new(rect);
        let data: Vec<u8> = rows.concat();
        sel.write_bytes(&data, rect).unwrap();
        sel
    }

    fn bytes(sel: &PixelSelection, rect: Rect) -> Vec<u8> {
        let mut buf = vec![0u8; rect.area() as usize];
        sel.read_bytes(&mut buf, rect).unwrap();
        buf
    }

    #[test]
    fn test_erode_uses_cross_not_square() {
        // Only a diagonal neighbor is unselected: the center survives.
        let mut sel = mask(&[&[0, 255, 255], &[255, 255, 255], &[255, 255, 255]]);
        let rect = Rect::new_unchecked(0, 0, 3, 3);
        ErodeSelectionFilter.process(&mut sel, rect).unwrap();
        assert_eq!(sel.value(1, 1), 255);
        assert_eq!(sel.value(1, 0), 0);
        assert_eq!(sel.value(0, 1), 0);
        assert_eq!(sel.value(2, 2), 255);
    }

    #[test]
    fn test_dilate_single_pixel_makes_plus() {
        let mut sel = mask(&[&[0, 0, 0], &[0, 255, 0], &[0, 0, 0]]);
        let rect = Rect::new_unchecked(0, 0, 3, 3);
        DilateSelectionFilter.process(&mut sel, rect).unwrap();
        assert_eq!(bytes(&sel, rect), vec![0, 255, 0, 255, 255, 255, 0, 255, 0]);
    }

    #[test]
    fn test_edges_repeat_inside_rect() {
        // Processing exactly the selected block keeps it: edge replication
        // never reads the unselected outside.
        let mut sel = mask(&[&[255, 255], &[255, 255]]);
        let rect = Rect::new_unchecked(0, 0, 2, 2);
        ErodeSelectionFilter.process(&mut sel, rect).unwrap();
        assert_eq!(bytes(&sel, rect), vec![255; 4]);
    }

    #[test]
    fn test_change_rect_and_names() {
        let rect = Rect::new_unchecked(2, 3, 4, 5);
        let bounds = Rect::new_unchecked(0, 0, 100, 100);
        assert_eq!(ErodeSelectionFilter.change_rect(rect, bounds), Rect::new_unchecked(1, 2, 6, 7));
        assert_eq!(DilateSelectionFilter.change_rect(rect, bounds), Rect::new_unchecked(1, 2, 6, 7));
        assert_eq!(ErodeSelectionFilter.name(), "Erode Selection");
        assert_eq!(DilateSelectionFilter.name(), "Dilate Selection");
    }

    #[test]
    fn test_empty_rect_is_noop() {
        let mut sel = mask(&[&[255]]);
        DilateSelectionFilter
            .process(&mut sel, Rect::new_unchecked(0, 0, 0, 1))
            .unwrap();
        assert_eq!(sel.value(0, 0), 255);
    }
}
