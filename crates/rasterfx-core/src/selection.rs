//! PixelSelection - single-channel coverage mask
//!
//! A selection is a [`PaintDevice`] in the 8-bit alpha color space. Every
//! byte is the coverage of one pixel: 0 is unselected, 255 fully selected.

use crate::colorspace::ColorSpace;
use crate::device::PaintDevice;
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Fully selected coverage value
pub const SELECTED: u8 = u8::MAX;
/// Unselected coverage value
pub const UNSELECTED: u8 = 0;

/// Selection mask backed by an alpha-only paint device
#[derive(Debug, Clone)]
pub struct PixelSelection {
    device: PaintDevice,
}

impl PixelSelection {
    /// Create an empty (fully unselected) mask with the given logical bounds
    pub fn new(bounds: Rect) -> Self {
        Self {
            device: PaintDevice::with_bounds(ColorSpace::alpha8(), bounds),
        }
    }

    /// Wrap an existing device as a mask.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAMask`] unless the device stores one byte per pixel.
    pub fn from_device(device: PaintDevice) -> Result<Self> {
        if device.pixel_size() != 1 {
            return Err(Error::NotAMask(device.pixel_size()));
        }
        Ok(Self { device })
    }

    #[inline]
    pub fn device(&self) -> &PaintDevice {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut PaintDevice {
        &mut self.device
    }

    pub fn into_device(self) -> PaintDevice {
        self.device
    }

    #[inline]
    pub fn default_bounds(&self) -> Rect {
        self.device.default_bounds()
    }

    /// Coverage of one pixel
    #[inline]
    pub fn value(&self, x: i32, y: i32) -> u8 {
        self.device.pixel(x, y)[0]
    }

    pub fn set_value(&mut self, x: i32, y: i32, value: u8) {
        self.device.pixel_mut(x, y)[0] = value;
    }

    /// Copy coverage of `rect` into `buf`, one byte per pixel
    pub fn read_bytes(&self, buf: &mut [u8], rect: Rect) -> Result<()> {
        self.device.read_bytes(buf, rect)
    }

    /// Store `buf` (one byte per pixel) into `rect`
    pub fn write_bytes(&mut self, buf: &[u8], rect: Rect) -> Result<()> {
        self.device.write_bytes(buf, rect)
    }

    /// Set all pixels of `rect` to `value`
    pub fn fill(&mut self, rect: Rect, value: u8) -> Result<()> {
        self.device.fill(rect, &[value])
    }

    /// Invert every coverage value, including the default background
    pub fn invert(&mut self) {
        self.device.map_bytes_in_place(|v| SELECTED - v);
    }

    /// Tight bounds of every pixel that differs from the background
    pub fn selected_exact_rect(&self) -> Rect {
        self.device.exact_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_device_rejects_rgba() {
        let dev = PaintDevice::new(ColorSpace::rgba8());
        assert!(PixelSelection::from_device(dev).is_err());
    }

    #[test]
    fn test_invert_flips_background() {
        let mut sel = PixelSelection::new(Rect::new_unchecked(0, 0, 4, 4));
        sel.set_value(1, 1, 200);
        sel.invert();
        assert_eq!(sel.value(1, 1), 55);
        assert_eq!(sel.value(100, 100), SELECTED);
    }

    #[test]
    fn test_selected_exact_rect() {
        let mut sel = PixelSelection::new(Rect::new_unchecked(0, 0, 16, 16));
        sel.fill(Rect::new_unchecked(3, 4, 5, 2), SELECTED).unwrap();
        sel.set_value(3, 4, 0);
        assert_eq!(sel.selected_exact_rect(), Rect::new_unchecked(3, 4, 5, 2));
    }
}
