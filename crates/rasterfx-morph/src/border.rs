//! Antialiased border around the selection edge
//!
//! A pixel is a transition when it is selected and touches an unselected
//! 8-neighbor ([`compute_transition`]). The border value of a pixel is the
//! density of the nearest transition inside an ellipse of radii
//! `(x_radius, y_radius)`, falling off from 255 at the transition itself to
//! 0 at the ellipse edge.
//!
//! For each column the filter tracks the signed row distance to the nearest
//! transition (`nearest`); the last `y_radius + 1` transition rows are kept
//! in a ring so each row's transitions are computed once.

use rasterfx_core::{PixelSelection, Rect};

use crate::MorphResult;
use crate::filter::{SelectionFilter, compute_transition, rotate_rows, row_rect};

/// Falloff from a transition at offset `(dx, dy)`, symmetric in both axes
struct DensityTable {
    stride: usize,
    data: Vec<u8>,
}

impl DensityTable {
    fn new(x_radius: i32, y_radius: i32) -> Self {
        let stride = y_radius as usize + 1;
        let (rx2, ry2) = ((x_radius * x_radius) as f64, (y_radius * y_radius) as f64);
        let half_offset = |v: i32| if v > 0 { v as f64 - 0.5 } else { 0.0 };

        let mut data = Vec::with_capacity((x_radius as usize + 1) * stride);
        for x in 0..=x_radius {
            let tx = half_offset(x);
            for y in 0..=y_radius {
                let ty = half_offset(y);
                let dist = ty * ty / ry2 + tx * tx / rx2;
                data.push(if dist < 1.0 {
                    (255.0 * (1.0 - dist.sqrt())) as u8
                } else {
                    0
                });
            }
        }
        Self { stride, data }
    }

    #[inline]
    fn get(&self, dx: i32, dy: i32) -> u8 {
        self.data[dx.unsigned_abs() as usize * self.stride + dy.unsigned_abs() as usize]
    }
}

/// Replace the selection with a band of width `(x_radius, y_radius)`
/// around its edge
#[derive(Debug, Clone, Copy)]
pub struct BorderSelectionFilter {
    x_radius: i32,
    y_radius: i32,
}

impl BorderSelectionFilter {
    pub fn new(x_radius: i32, y_radius: i32) -> Self {
        Self { x_radius, y_radius }
    }

    /// Radius (1, 1): the border is the transition map itself
    fn process_unit(&self, selection: &mut PixelSelection, rect: Rect) -> MorphResult<()> {
        let w = rect.w as usize;
        let mut source = vec![vec![0u8; w]; 3];
        let mut transition = vec![0u8; w];

        selection.read_bytes(&mut source[0], row_rect(rect, 0))?;
        source[1] = source[0].clone();
        if rect.h > 1 {
            selection.read_bytes(&mut source[2], row_rect(rect, 1))?;
        } else {
            source[2] = source[1].clone();
        }
        compute_transition(&mut transition, [&source[0], &source[1], &source[2]]);
        selection.write_bytes(&transition, row_rect(rect, 0))?;

        for y in 1..rect.h {
            rotate_rows(&mut source);
            if y + 1 < rect.h {
                selection.read_bytes(&mut source[2], row_rect(rect, y + 1))?;
            } else {
                let (head, tail) = source.split_at_mut(2);
                tail[0].copy_from_slice(&head[1]);
            }
            compute_transition(&mut transition, [&source[0], &source[1], &source[2]]);
            selection.write_bytes(&transition, row_rect(rect, y))?;
        }
        Ok(())
    }

    /// Border with antialiased falloff for any positive radius.
    ///
    /// [`SelectionFilter::process`] uses this except at radius (1, 1),
    /// where the plain transition map is written instead. Both agree on
    /// which pixels are fully selected.
    pub fn process_antialiased(
        &self,
        selection: &mut PixelSelection,
        rect: Rect,
    ) -> MorphResult<()> {
        if self.x_radius <= 0 || self.y_radius <= 0 || rect.is_empty() {
            return Ok(());
        }
        let (xr, yr) = (self.x_radius, self.y_radius);
        let ring = yr as usize;
        let w = rect.w as usize;
        let density = DensityTable::new(xr, yr);

        let mut buf = vec![vec![0u8; w]; 3];
        let mut transition = vec![vec![0u8; w]; ring + 1];
        let mut out = vec![0u8; w];

        selection.read_bytes(&mut buf[0], row_rect(rect, 0))?;
        buf[1] = buf[0].clone();
        if rect.h > 1 {
            selection.read_bytes(&mut buf[2], row_rect(rect, 1))?;
        } else {
            buf[2] = buf[1].clone();
        }
        compute_transition(&mut transition[1], [&buf[0], &buf[1], &buf[2]]);

        let mut y = 1;
        while y < yr && y + 1 < rect.h {
            rotate_rows(&mut buf);
            selection.read_bytes(&mut buf[2], row_rect(rect, y + 1))?;
            compute_transition(&mut transition[y as usize + 1], [&buf[0], &buf[1], &buf[2]]);
            y += 1;
        }

        // Signed distance to the nearest transition row in each column;
        // values outside -yr..=yr mean none in reach.
        let mut nearest: Vec<i32> = (0..w)
            .map(|x| {
                (1..=ring)
                    .find(|&j| transition[j][x] != 0)
                    .map_or(-(yr + 7), |j| j as i32)
            })
            .collect();

        for y in 0..rect.h {
            rotate_rows(&mut buf);
            rotate_rows(&mut transition);
            if y < rect.h - (yr + 1) {
                selection.read_bytes(&mut buf[2], row_rect(rect, y + yr + 1))?;
                compute_transition(&mut transition[ring], [&buf[0], &buf[1], &buf[2]]);
            } else {
                let (head, tail) = transition.split_at_mut(ring);
                tail[0].copy_from_slice(&head[ring - 1]);
            }

            for (x, m) in nearest.iter_mut().enumerate() {
                if *m < 1 {
                    if *m <= -yr {
                        if transition[ring][x] != 0 {
                            *m = yr;
                        } else {
                            *m -= 1;
                        }
                    } else if transition[(-*m) as usize][x] != 0 {
                        *m = -*m;
                    } else if transition[(-*m + 1) as usize][x] != 0 {
                        *m = -*m + 1;
                    } else {
                        *m -= 1;
                    }
                } else {
                    *m -= 1;
                }
                *m = (*m).max(-yr - 1);
            }

            self.render_row(&nearest, &density, &mut out);
            selection.write_bytes(&out, row_rect(rect, y))?;
        }
        Ok(())
    }

    fn render_row(&self, nearest: &[i32], density: &DensityTable, out: &mut [u8]) {
        let (xr, yr) = (self.x_radius, self.y_radius);
        let w = nearest.len() as i32;
        let at = |x: i32| {
            if (0..w).contains(&x) {
                nearest[x as usize]
            } else {
                yr + 2
            }
        };

        let mut last_index = 1;
        let mut x = 0;
        while x < w {
            last_index -= 1;
            let lowest = if last_index >= 0 { 0 } else { -xr };
            let mut last_max = 0u8;
            for i in (lowest..=xr).rev() {
                let m = at(x + i);
                if m.abs() <= yr && density.get(i, m) > last_max {
                    last_max = density.get(i, m);
                    last_index = i;
                }
            }
            out[x as usize] = last_max;

            if last_max == 0 {
                // Skip ahead to just before the next column in reach
                let next = (x + 1..w).find(|&i| at(i) >= -yr).unwrap_or(w);
                if next - x > xr {
                    out[x as usize..(next - xr) as usize].fill(0);
                    x = next - xr - 1;
                }
                last_index = xr;
            }
            x += 1;
        }
    }
}

impl SelectionFilter for BorderSelectionFilter {
    fn name(&self) -> &'static str {
        "Border Selection"
    }

    fn change_rect(&self, rect: Rect, _default_bounds: Rect) -> Rect {
        rect.adjusted(-self.x_radius, -self.y_radius, self.x_radius, self.y_radius)
    }

    fn process(&self, selection: &mut PixelSelection, rect: Rect) -> MorphResult<()> {
        if self.x_radius <= 0 || self.y_radius <= 0 || rect.is_empty() {
            return Ok(());
        }
        if self.x_radius == 1 && self.y_radius == 1 {
            self.process_unit(selection, rect)
        } else {
            self.process_antialiased(selection, rect)
        }
    }
}
