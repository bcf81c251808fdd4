//! Selection filter trait and shared scanline helpers
//!
//! Every filter mutates a [`PixelSelection`] in place over a rectangle,
//! one output row at a time. Rows still needed as input are cached in a
//! small ring of scanline buffers that is rotated with [`rotate_rows`]
//! after each output row, so no row is read twice and writes never
//! clobber input that is still pending.

use rasterfx_core::{PixelSelection, Rect};

use crate::MorphResult;

/// Morphology operation on a single-channel selection mask
pub trait SelectionFilter {
    /// Human-readable operation name
    fn name(&self) -> &'static str;

    /// Area that must be processed for `rect` to be fully up to date.
    ///
    /// Filters with a radius grow the rectangle by that radius on each
    /// side; the default returns `rect` unchanged.
    fn change_rect(&self, rect: Rect, default_bounds: Rect) -> Rect {
        let _ = default_bounds;
        rect
    }

    /// Filter `rect` of `selection` in place
    fn process(&self, selection: &mut PixelSelection, rect: Rect) -> MorphResult<()>;
}

/// Vertical extent of an ellipse with radii (`x_radius`, `y_radius`) for
/// each horizontal offset in `-x_radius..=x_radius`.
///
/// Entry `i` belongs to offset `i - x_radius`. Offsets are measured to the
/// near edge of each pixel, so the outermost columns still reach inward.
pub fn compute_border(x_radius: i32, y_radius: i32) -> Vec<i32> {
    let xr = x_radius as f64;
    let ratio = y_radius as f64 / xr;
    (0..=2 * x_radius)
        .map(|i| {
            let tmp = if i == x_radius {
                0.0
            } else {
                (i - x_radius).abs() as f64 - 0.5
            };
            (ratio * (xr * xr - tmp * tmp).sqrt() + 0.5).floor() as i32
        })
        .collect()
}

/// Move the first row to the end, shifting the others up by one
#[inline]
pub fn rotate_rows<T>(rows: &mut [T]) {
    if !rows.is_empty() {
        rows.rotate_left(1);
    }
}

/// Mark the selected pixels of `rows[1]` that touch an unselected pixel.
///
/// `rows` holds the previous, current and next scanline. A pixel counts as
/// selected at 128 and above; neighbors are the 8-connected pixels inside
/// the row width. Marked pixels are 255, all others 0.
pub fn compute_transition(transition: &mut [u8], rows: [&[u8]; 3]) {
    let width = transition.len();
    if width == 0 {
        return;
    }
    let [above, row, below] = rows;
    let clear = |v: u8| v < 128;

    if width == 1 {
        transition[0] = if row[0] >= 128 && (clear(above[0]) || clear(below[0])) {
            255
        } else {
            0
        };
        return;
    }

    let last = width - 1;
    for x in 0..width {
        if row[x] < 128 {
            transition[x] = 0;
            continue;
        }
        let lo = x.saturating_sub(1);
        let hi = (x + 1).min(last);
        let touches = (lo..=hi).any(|nx| {
            clear(above[nx]) || clear(below[nx]) || (nx != x && clear(row[nx]))
        });
        transition[x] = if touches { 255 } else { 0 };
    }
}

/// The one-pixel-high row `y` of `rect`
#[inline]
pub(crate) fn row_rect(rect: Rect, y: i32) -> Rect {
    Rect::new_unchecked(rect.x, rect.y + y, rect.w, 1)
}

/// Read row `y` of `rect` into `buf[1..=w]`, replicating the edge pixels
/// into `buf[0]` and `buf[w + 1]`.
fn read_padded_row(
    selection: &PixelSelection,
    rect: Rect,
    y: i32,
    buf: &mut [u8],
) -> MorphResult<()> {
    let w = rect.w as usize;
    selection.read_bytes(&mut buf[1..=w], row_rect(rect, y))?;
    buf[0] = buf[1];
    buf[w + 1] = buf[w];
    Ok(())
}

/// Run a 3x3 neighborhood operator over `rect`.
///
/// `op` receives the padded previous, current and next rows and the output
/// column `x`; the center pixel is at padded index `x + 1`. Rows above the
/// first and below the last repeat the edge row.
pub(crate) fn scan_3x3<F>(selection: &mut PixelSelection, rect: Rect, op: F) -> MorphResult<()>
where
    F: Fn([&[u8]; 3], usize) -> u8,
{
    if rect.is_empty() {
        return Ok(());
    }
    let w = rect.w as usize;
    let mut rows = vec![vec![0u8; w + 2]; 3];
    let mut out = vec![0u8; w];

    read_padded_row(selection, rect, 0, &mut rows[0])?;
    rows[1] = rows[0].clone();

    for y in 0..rect.h {
        if y + 1 < rect.h {
            read_padded_row(selection, rect, y + 1, &mut rows[2])?;
        } else {
            let (head, tail) = rows.split_at_mut(2);
            tail[0].copy_from_slice(&head[1]);
        }

        let window = [rows[0].as_slice(), rows[1].as_slice(), rows[2].as_slice()];
        for (x, o) in out.iter_mut().enumerate() {
            *o = op(window, x);
        }
        selection.write_bytes(&out, row_rect(rect, y))?;
        rotate_rows(&mut rows);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_border_circle() {
        assert_eq!(compute_border(1, 1), vec![1, 1, 1]);
        // sqrt(4 - 2.25) = 1.32, sqrt(4 - 0.25) = 1.94
        assert_eq!(compute_border(2, 2), vec![1, 2, 2, 2, 1]);
    }

    #[test]
    fn test_compute_border_ellipse() {
        let circ = compute_border(2, 4);
        assert_eq!(circ.len(), 5);
        assert_eq!(circ[2], 4);
        assert_eq!(circ[0], circ[4]);
        assert!(circ[0] < circ[2]);
    }

    #[test]
    fn test_rotate_rows() {
        let mut rows = vec![0, 1, 2, 3];
        rotate_rows(&mut rows);
        assert_eq!(rows, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_transition_marks_edge_pixels() {
        let above = [255u8, 255, 255, 255];
        let row = [255u8, 255, 255, 0];
        let below = [255u8, 255, 255, 255];
        let mut t = [0u8; 4];
        compute_transition(&mut t, [&above, &row, &below]);
        assert_eq!(t, [0, 0, 255, 0]);
    }

    #[test]
    fn test_transition_first_and_last_column() {
        let full = [255u8; 3];
        let row = [255u8, 255, 255];
        let mut t = [0u8; 3];
        compute_transition(&mut t, [&full, &row, &full]);
        assert_eq!(t, [0, 0, 0]);

        let below = [0u8, 255, 0];
        compute_transition(&mut t, [&full, &row, &below]);
        assert_eq!(t, [255, 255, 255]);
    }

    #[test]
    fn test_transition_single_column() {
        let mut t = [0u8; 1];
        compute_transition(&mut t, [&[255], &[200], &[100]]);
        assert_eq!(t, [255]);
        compute_transition(&mut t, [&[255], &[200], &[255]]);
        assert_eq!(t, [0]);
        compute_transition(&mut t, [&[0], &[100], &[0]]);
        assert_eq!(t, [0]);
    }
}
