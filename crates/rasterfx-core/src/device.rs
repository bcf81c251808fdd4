//! PaintDevice - in-memory raster storage with default-pixel semantics
//!
//! A device stores pixels only inside its *extent*, a rectangle that grows on
//! demand when pixels are written. Every coordinate outside the extent reads
//! as the device's default pixel, so an unwritten device is conceptually an
//! infinite plane of that pixel.
//!
//! The *default bounds* are the logical image bounds. They do not limit
//! storage; they are used by border policies that need the image size and
//! by wraparound mode, in which every read and write coordinate is wrapped
//! into the default bounds as if the image tiled the plane.

use crate::colorspace::ColorSpace;
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Raster storage for one layer of pixels
#[derive(Debug, Clone)]
pub struct PaintDevice {
    color_space: ColorSpace,
    default_pixel: Vec<u8>,
    /// Region backed by `data`
    extent: Rect,
    /// Pixel data, row-major over `extent`
    data: Vec<u8>,
    default_bounds: Rect,
    wrap_around: bool,
}

impl PaintDevice {
    /// Create an empty device with an all-zero default pixel
    pub fn new(color_space: ColorSpace) -> Self {
        let default_pixel = vec![0; color_space.pixel_size()];
        Self {
            color_space,
            default_pixel,
            extent: Rect::default(),
            data: Vec::new(),
            default_bounds: Rect::default(),
            wrap_around: false,
        }
    }

    /// Create an empty device with the given logical bounds
    pub fn with_bounds(color_space: ColorSpace, bounds: Rect) -> Self {
        let mut dev = Self::new(color_space);
        dev.default_bounds = bounds;
        dev
    }

    #[inline]
    pub fn color_space(&self) -> &ColorSpace {
        &self.color_space
    }

    /// Bytes per pixel
    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.default_pixel.len()
    }

    #[inline]
    pub fn default_pixel(&self) -> &[u8] {
        &self.default_pixel
    }

    /// Change the pixel returned for unstored coordinates
    pub fn set_default_pixel(&mut self, pixel: &[u8]) -> Result<()> {
        if pixel.len() != self.pixel_size() {
            return Err(Error::PixelSize {
                expected: self.pixel_size(),
                actual: pixel.len(),
            });
        }
        self.default_pixel.copy_from_slice(pixel);
        Ok(())
    }

    #[inline]
    pub fn default_bounds(&self) -> Rect {
        self.default_bounds
    }

    pub fn set_default_bounds(&mut self, bounds: Rect) {
        self.default_bounds = bounds;
    }

    #[inline]
    pub fn is_wrap_around(&self) -> bool {
        self.wrap_around && !self.default_bounds.is_empty()
    }

    pub fn set_wrap_around(&mut self, wrap_around: bool) {
        self.wrap_around = wrap_around;
    }

    /// Region currently backed by storage
    #[inline]
    pub fn extent(&self) -> Rect {
        self.extent
    }

    /// Bytes per stored row
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.extent.w.max(0) as usize * self.pixel_size()
    }

    /// Tight bounding rect of the stored pixels that differ from the default
    pub fn exact_bounds(&self) -> Rect {
        let ps = self.pixel_size();
        let mut x1 = i32::MAX;
        let mut y1 = i32::MAX;
        let mut x2 = i32::MIN;
        let mut y2 = i32::MIN;

        for (row, line) in self.data.chunks_exact(self.row_stride().max(1)).enumerate() {
            for (col, px) in line.chunks_exact(ps).enumerate() {
                if px != self.default_pixel.as_slice() {
                    let x = self.extent.x + col as i32;
                    let y = self.extent.y + row as i32;
                    x1 = x1.min(x);
                    y1 = y1.min(y);
                    x2 = x2.max(x);
                    y2 = y2.max(y);
                }
            }
        }

        if x1 > x2 {
            Rect::default()
        } else {
            Rect::new_unchecked(x1, y1, x2 - x1 + 1, y2 - y1 + 1)
        }
    }

    /// Reset this device into an empty one compatible with `src`: same color
    /// space, default pixel, default bounds and wraparound mode, no data.
    pub fn prepare_clone(&mut self, src: &PaintDevice) {
        self.color_space = src.color_space.clone();
        self.default_pixel = src.default_pixel.clone();
        self.default_bounds = src.default_bounds;
        self.wrap_around = src.wrap_around;
        self.clear();
    }

    /// Drop all stored pixels
    pub fn clear(&mut self) {
        self.extent = Rect::default();
        self.data = Vec::new();
    }

    /// Map a coordinate to the one actually stored (wraparound only)
    #[inline]
    fn resolve(&self, x: i32, y: i32) -> (i32, i32) {
        if self.is_wrap_around() {
            self.default_bounds.wrap_point(x, y)
        } else {
            (x, y)
        }
    }

    #[inline]
    fn offset_of(&self, x: i32, y: i32) -> usize {
        let col = (x - self.extent.x) as usize;
        let row = (y - self.extent.y) as usize;
        row * self.row_stride() + col * self.pixel_size()
    }

    /// Raw bytes of the pixel at (x, y); the default pixel when unstored
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> &[u8] {
        let (x, y) = self.resolve(x, y);
        if self.extent.contains_point(x, y) {
            let off = self.offset_of(x, y);
            &self.data[off..off + self.pixel_size()]
        } else {
            &self.default_pixel
        }
    }

    /// Mutable raw bytes of the pixel at (x, y), allocating storage if needed
    pub fn pixel_mut(&mut self, x: i32, y: i32) -> &mut [u8] {
        let (x, y) = self.resolve(x, y);
        if !self.extent.contains_point(x, y) {
            self.ensure_rect(Rect::new_unchecked(x, y, 1, 1));
        }
        let off = self.offset_of(x, y);
        let ps = self.pixel_size();
        &mut self.data[off..off + ps]
    }

    /// Grow the extent so it covers `rect`. New pixels take the default value.
    pub fn ensure_rect(&mut self, rect: Rect) {
        let rect = if self.is_wrap_around() {
            match rect.intersect(&self.default_bounds) {
                Some(r) if r == rect => r,
                _ => self.default_bounds,
            }
        } else {
            rect
        };
        if rect.is_empty() || self.extent.contains_rect(&rect) {
            return;
        }

        let new_extent = self.extent.united(&rect);
        let ps = self.pixel_size();
        let new_stride = new_extent.w as usize * ps;
        let mut data = self
            .default_pixel
            .repeat(new_extent.w as usize * new_extent.h as usize);

        let old_stride = self.row_stride();
        if old_stride > 0 {
            let dx = (self.extent.x - new_extent.x) as usize * ps;
            let dy = (self.extent.y - new_extent.y) as usize;
            for (row, line) in self.data.chunks_exact(old_stride).enumerate() {
                let start = (dy + row) * new_stride + dx;
                data[start..start + old_stride].copy_from_slice(line);
            }
        }

        self.extent = new_extent;
        self.data = data;
    }

    fn check_buffer(&self, buf_len: usize, rect: &Rect) -> Result<()> {
        let expected = rect.w.max(0) as usize * rect.h.max(0) as usize * self.pixel_size();
        if buf_len != expected {
            return Err(Error::BufferSize {
                expected,
                actual: buf_len,
            });
        }
        Ok(())
    }

    /// Copy the pixels of `rect` into `buf` (row-major, tightly packed)
    pub fn read_bytes(&self, buf: &mut [u8], rect: Rect) -> Result<()> {
        self.check_buffer(buf.len(), &rect)?;
        if rect.is_empty() {
            return Ok(());
        }
        let ps = self.pixel_size();
        let line_len = rect.w as usize * ps;

        for (row, line) in buf.chunks_exact_mut(line_len).enumerate() {
            let y = rect.y + row as i32;
            let fast = !self.is_wrap_around()
                && self
                    .extent
                    .contains_rect(&Rect::new_unchecked(rect.x, y, rect.w, 1));
            if fast {
                let off = self.offset_of(rect.x, y);
                line.copy_from_slice(&self.data[off..off + line_len]);
            } else {
                for (col, px) in line.chunks_exact_mut(ps).enumerate() {
                    px.copy_from_slice(self.pixel(rect.x + col as i32, y));
                }
            }
        }
        Ok(())
    }

    /// Store `buf` (row-major, tightly packed) into `rect`
    pub fn write_bytes(&mut self, buf: &[u8], rect: Rect) -> Result<()> {
        self.check_buffer(buf.len(), &rect)?;
        if rect.is_empty() {
            return Ok(());
        }
        self.ensure_rect(rect);
        let ps = self.pixel_size();
        let line_len = rect.w as usize * ps;

        for (row, line) in buf.chunks_exact(line_len).enumerate() {
            let y = rect.y + row as i32;
            if self.is_wrap_around() {
                for (col, px) in line.chunks_exact(ps).enumerate() {
                    self.pixel_mut(rect.x + col as i32, y).copy_from_slice(px);
                }
            } else {
                let off = self.offset_of(rect.x, y);
                self.data[off..off + line_len].copy_from_slice(line);
            }
        }
        Ok(())
    }

    /// Set every pixel of `rect` to `pixel`
    pub fn fill(&mut self, rect: Rect, pixel: &[u8]) -> Result<()> {
        if pixel.len() != self.pixel_size() {
            return Err(Error::PixelSize {
                expected: self.pixel_size(),
                actual: pixel.len(),
            });
        }
        if rect.is_empty() {
            return Ok(());
        }
        let buf = pixel.repeat(rect.w as usize * rect.h as usize);
        self.write_bytes(&buf, rect)
    }

    /// Apply `f` to every stored byte and to the default pixel
    pub fn map_bytes_in_place(&mut self, f: impl Fn(u8) -> u8) {
        for b in self.data.iter_mut() {
            *b = f(*b);
        }
        for b in self.default_pixel.iter_mut() {
            *b = f(*b);
        }
    }
}
