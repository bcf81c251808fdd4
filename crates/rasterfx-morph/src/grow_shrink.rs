//! Elliptical grow and shrink
//!
//! Grow is a running maximum and shrink a running minimum over an
//! ellipse with radii `(x_radius, y_radius)`. For every column the filter
//! keeps the extremum over the rows `y - i ..= y + i` for each
//! `i <= y_radius` ([`ColumnExtrema`]); the horizontal pass then looks up,
//! for each offset `dx`, the column `x + dx` at the vertical extent given
//! by [`compute_border`]. The horizontal pass remembers where the last
//! extremum came from and only rescans the right half of the ellipse
//! while that source is still inside it.

use rasterfx_core::{PixelSelection, Rect, SELECTED, UNSELECTED};

use crate::MorphResult;
use crate::filter::{SelectionFilter, compute_border, rotate_rows, row_rect};

/// Per-column vertical extrema, `y_radius + 1` entries per column
struct ColumnExtrema {
    stride: usize,
    width: i32,
    data: Vec<u8>,
    /// Value of every column outside the rect; `None` repeats the edge column
    outside: Option<u8>,
}

impl ColumnExtrema {
    fn new(width: usize, y_radius: usize, outside: Option<u8>) -> Self {
        Self {
            stride: y_radius + 1,
            width: width as i32,
            data: vec![0; width * (y_radius + 1)],
            outside,
        }
    }

    /// Extremum of column `x` over `±j` rows
    #[inline]
    fn get(&self, x: i32, j: i32) -> u8 {
        let col = if x < 0 || x >= self.width {
            match self.outside {
                Some(v) => return v,
                None => x.clamp(0, self.width - 1),
            }
        } else {
            x
        };
        self.data[col as usize * self.stride + j as usize]
    }

    /// Seed from the rows cached before the first output row
    fn prime(&mut self, rows: &[Vec<u8>], op: fn(u8, u8) -> u8) {
        for (x, col) in self.data.chunks_exact_mut(self.stride).enumerate() {
            col[0] = rows[0][x];
            for j in 1..self.stride {
                col[j] = op(rows[j][x], col[j - 1]);
            }
        }
    }

    /// Advance by one row; `rows[i]` is row `y + i`
    fn update(&mut self, rows: &[Vec<u8>], op: fn(u8, u8) -> u8) {
        for (x, col) in self.data.chunks_exact_mut(self.stride).enumerate() {
            for i in (1..self.stride).rev() {
                col[i] = op(op(col[i - 1], rows[i - 1][x]), rows[i][x]);
            }
            col[0] = rows[0][x];
        }
    }
}

/// Scanline buffers of `rect`: `rows[0]` is filled with `first`, rows
/// `1..=y_radius` hold the top of the rect. Rows past the bottom of a short
/// rect are `fill`, or repeat the last loaded row when `fill` is `None`.
fn load_top(
    selection: &PixelSelection,
    rect: Rect,
    y_radius: usize,
    fill: Option<u8>,
) -> MorphResult<Vec<Vec<u8>>> {
    let w = rect.w as usize;
    let mut rows = vec![vec![fill.unwrap_or(UNSELECTED); w]; y_radius + 1];
    let loaded = y_radius.min(rect.h as usize);
    for i in 0..loaded {
        selection.read_bytes(&mut rows[i + 1], row_rect(rect, i as i32))?;
    }
    if fill.is_none() {
        for i in loaded + 1..=y_radius {
            rows[i] = rows[loaded].clone();
        }
    }
    Ok(rows)
}

/// Make the selection larger by an elliptical radius
#[derive(Debug, Clone, Copy)]
pub struct GrowSelectionFilter {
    x_radius: i32,
    y_radius: i32,
}

impl GrowSelectionFilter {
    pub fn new(x_radius: i32, y_radius: i32) -> Self {
        Self { x_radius, y_radius }
    }

    fn render(&self, max: &ColumnExtrema, circ: &[i32], out: &mut [u8]) {
        let xr = self.x_radius;
        let at = |x: i32, i: i32| i32::from(max.get(x + i, circ[(i + xr) as usize]));

        let mut last_max = at(0, -1);
        let mut last_index = 1;
        for (x, o) in (0..).zip(out.iter_mut()) {
            last_index -= 1;
            if last_index >= 0 {
                if last_max != i32::from(SELECTED) {
                    last_max = 0;
                    for i in (0..=xr).rev() {
                        if last_max < at(x, i) {
                            last_max = at(x, i);
                            last_index = i;
                        }
                    }
                }
            } else {
                last_index = xr;
                last_max = at(x, xr);
                for i in (-xr..xr).rev() {
                    if last_max < at(x, i) {
                        last_max = at(x, i);
                        last_index = i;
                    }
                }
            }
            *o = last_max as u8;
        }
    }
}

impl SelectionFilter for GrowSelectionFilter {
    fn name(&self) -> &'static str {
        "Grow Selection"
    }

    fn change_rect(&self, rect: Rect, _default_bounds: Rect) -> Rect {
        rect.adjusted(-self.x_radius, -self.y_radius, self.x_radius, self.y_radius)
    }

    fn process(&self, selection: &mut PixelSelection, rect: Rect) -> MorphResult<()> {
        if self.x_radius <= 0 || self.y_radius <= 0 || rect.is_empty() {
            return Ok(());
        }
        let yr = self.y_radius as usize;
        let circ = compute_border(self.x_radius, self.y_radius);

        let mut rows = load_top(selection, rect, yr, Some(UNSELECTED))?;
        let mut max = ColumnExtrema::new(rect.w as usize, yr, None);
        max.prime(&rows, u8::max);

        let mut out = vec![0u8; rect.w as usize];
        for y in 0..rect.h {
            rotate_rows(&mut rows);
            if y < rect.h - self.y_radius {
                selection.read_bytes(&mut rows[yr], row_rect(rect, y + self.y_radius))?;
            } else {
                rows[yr].fill(UNSELECTED);
            }
            max.update(&rows, u8::max);
            self.render(&max, &circ, &mut out);
            selection.write_bytes(&out, row_rect(rect, y))?;
        }
        Ok(())
    }
}

/// Make the selection smaller by an elliptical radius.
///
/// With `edge_lock` the pixels outside the processed rect are taken to
/// repeat its edge, so the selection does not shrink away from the rect
/// border; otherwise they count as unselected.
#[derive(Debug, Clone, Copy)]
pub struct ShrinkSelectionFilter {
    x_radius: i32,
    y_radius: i32,
    edge_lock: bool,
}

impl ShrinkSelectionFilter {
    pub fn new(x_radius: i32, y_radius: i32, edge_lock: bool) -> Self {
        Self {
            x_radius,
            y_radius,
            edge_lock,
        }
    }

    pub fn edge_lock(&self) -> bool {
        self.edge_lock
    }

    fn render(&self, min: &ColumnExtrema, circ: &[i32], out: &mut [u8]) {
        let xr = self.x_radius;
        let at = |x: i32, i: i32| i32::from(min.get(x + i, circ[(i + xr) as usize]));

        let mut last_min = at(0, -1);
        let mut last_index = 0;
        for (x, o) in (0..).zip(out.iter_mut()) {
            last_index -= 1;
            if last_index >= 0 {
                if last_min != i32::from(UNSELECTED) {
                    last_min = i32::from(SELECTED);
                    for i in (0..=xr).rev() {
                        if last_min > at(x, i) {
                            last_min = at(x, i);
                            last_index = i;
                        }
                    }
                }
            } else {
                last_index = xr;
                last_min = at(x, xr);
                for i in (-xr..xr).rev() {
                    if last_min > at(x, i) {
                        last_min = at(x, i);
                        last_index = i;
                    }
                }
            }
            *o = last_min as u8;
        }
    }
}

impl SelectionFilter for ShrinkSelectionFilter {
    fn name(&self) -> &'static str {
        "Shrink Selection"
    }

    fn change_rect(&self, rect: Rect, _default_bounds: Rect) -> Rect {
        rect.adjusted(-self.x_radius, -self.y_radius, self.x_radius, self.y_radius)
    }

    fn process(&self, selection: &mut PixelSelection, rect: Rect) -> MorphResult<()> {
        if self.x_radius <= 0 || self.y_radius <= 0 || rect.is_empty() {
            return Ok(());
        }
        let yr = self.y_radius as usize;
        let circ = compute_border(self.x_radius, self.y_radius);

        let (fill, outside) = if self.edge_lock {
            (None, None)
        } else {
            (Some(UNSELECTED), Some(UNSELECTED))
        };
        let mut rows = load_top(selection, rect, yr, fill)?;
        if self.edge_lock {
            rows[0] = rows[1].clone();
        }
        let mut min = ColumnExtrema::new(rect.w as usize, yr, outside);
        min.prime(&rows, u8::min);

        let mut out = vec![0u8; rect.w as usize];
        for y in 0..rect.h {
            rotate_rows(&mut rows);
            if y < rect.h - self.y_radius {
                selection.read_bytes(&mut rows[yr], row_rect(rect, y + self.y_radius))?;
            } else if self.edge_lock {
                let (head, tail) = rows.split_at_mut(yr);
                tail[0].copy_from_slice(&head[yr - 1]);
            } else {
                rows[yr].fill(UNSELECTED);
            }
            min.update(&rows, u8::min);
            self.render(&min, &circ, &mut out);
            selection.write_bytes(&out, row_rect(rect, y))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new_unchecked(0, 0, 21, 21)
    }

    fn count_selected(sel: &PixelSelection) -> usize {
        let b = bounds();
        (b.y..b.bottom())
            .flat_map(|y| (b.x..b.right()).map(move |x| (x, y)))
            .filter(|&(x, y)| sel.value(x, y) == SELECTED)
            .count()
    }

    #[test]
    fn test_grow_single_pixel_is_disk() {
        let mut sel = PixelSelection::new(bounds());
        sel.set_value(10, 10, SELECTED);
        let filter = GrowSelectionFilter::new(2, 2);
        let rect = filter.change_rect(Rect::new_unchecked(10, 10, 1, 1), bounds());
        filter.process(&mut sel, rect).unwrap();

        assert_eq!(sel.value(10, 10), SELECTED);
        assert_eq!(sel.value(12, 10), SELECTED);
        assert_eq!(sel.value(10, 8), SELECTED);
        assert_eq!(sel.value(11, 11), SELECTED);
        // circ = [1, 2, 2, 2, 1]: corners of the 5x5 box stay out
        assert_eq!(sel.value(12, 12), UNSELECTED);
        assert_eq!(sel.value(8, 8), UNSELECTED);
        assert_eq!(sel.value(13, 10), UNSELECTED);
        assert_eq!(count_selected(&sel), 21);
    }

    #[test]
    fn test_grow_reads_rows_below_before_writing() {
        // A pixel at the bottom of the rect still grows upwards.
        let mut sel = PixelSelection::new(bounds());
        sel.set_value(5, 9, SELECTED);
        GrowSelectionFilter::new(1, 1)
            .process(&mut sel, Rect::new_unchecked(0, 0, 10, 10))
            .unwrap();
        assert_eq!(sel.value(5, 8), SELECTED);
        assert_eq!(sel.value(4, 9), SELECTED);
        assert_eq!(sel.value(6, 9), SELECTED);
    }

    #[test]
    fn test_shrink_disk() {
        let mut sel = PixelSelection::new(bounds());
        sel.fill(Rect::new_unchecked(5, 5, 11, 11), SELECTED).unwrap();
        ShrinkSelectionFilter::new(2, 2, false)
            .process(&mut sel, bounds())
            .unwrap();
        assert_eq!(sel.value(10, 10), SELECTED);
        assert_eq!(sel.value(7, 7), SELECTED);
        assert_eq!(sel.value(6, 10), UNSELECTED);
        assert_eq!(sel.value(5, 5), UNSELECTED);
    }

    #[test]
    fn test_shrink_edge_lock() {
        let rect = Rect::new_unchecked(0, 0, 8, 8);
        let mut locked = PixelSelection::new(rect);
        locked.fill(rect, SELECTED).unwrap();
        let mut open = locked.clone();

        ShrinkSelectionFilter::new(2, 2, true)
            .process(&mut locked, rect)
            .unwrap();
        ShrinkSelectionFilter::new(2, 2, false)
            .process(&mut open, rect)
            .unwrap();

        assert_eq!(locked.value(0, 0), SELECTED);
        assert_eq!(locked.value(7, 3), SELECTED);
        assert_eq!(open.value(0, 0), UNSELECTED);
        assert_eq!(open.value(1, 4), UNSELECTED);
        assert_eq!(open.value(4, 4), SELECTED);
    }

    #[test]
    fn test_non_positive_radius_is_noop() {
        let mut sel = PixelSelection::new(bounds());
        sel.set_value(3, 3, SELECTED);
        let before = sel.clone();
        GrowSelectionFilter::new(0, 3).process(&mut sel, bounds()).unwrap();
        ShrinkSelectionFilter::new(2, -1, true).process(&mut sel, bounds()).unwrap();
        for y in 0..21 {
            for x in 0..21 {
                assert_eq!(sel.value(x, y), before.value(x, y));
            }
        }
    }

    #[test]
    fn test_short_rect_taller_radius() {
        // Fewer rows than the radius: missing rows read as unselected.
        let rect = Rect::new_unchecked(0, 0, 5, 2);
        let mut sel = PixelSelection::new(rect);
        sel.set_value(2, 0, SELECTED);
        GrowSelectionFilter::new(1, 4).process(&mut sel, rect).unwrap();
        assert_eq!(sel.value(2, 1), SELECTED);
        assert_eq!(sel.value(1, 0), SELECTED);
        assert_eq!(sel.value(4, 1), UNSELECTED);
    }

    #[test]
    fn test_names_and_change_rect() {
        let rect = Rect::new_unchecked(5, 5, 2, 2);
        let grown = GrowSelectionFilter::new(3, 1).change_rect(rect, bounds());
        assert_eq!(grown, Rect::new_unchecked(2, 4, 8, 4));
        assert_eq!(GrowSelectionFilter::new(1, 1).name(), "Grow Selection");
        assert_eq!(ShrinkSelectionFilter::new(1, 1, true).name(), "Shrink Selection");
    }
}
