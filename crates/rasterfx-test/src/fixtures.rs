//! Synthetic devices and masks for regression suites

use crate::error::TestResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rasterfx_core::{ColorSpace, PaintDevice, PixelSelection, Rect, SELECTED};

/// Build a mask whose bounds are exactly the given rows, top-left at (x, y)
pub fn mask_from_rows(x: i32, y: i32, rows: &[&[u8]]) -> TestResult<PixelSelection> {
    let h = rows.len() as i32;
    let w = rows.first().map_or(0, |r| r.len()) as i32;
    let bounds = Rect::new(x, y, w, h)?;
    let mut mask = PixelSelection::new(bounds);
    let data: Vec<u8> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    mask.write_bytes(&data, bounds)?;
    Ok(mask)
}

/// Mask with `rect` set to `value` and everything else unselected
pub fn mask_with_rect(bounds: Rect, rect: Rect, value: u8) -> TestResult<PixelSelection> {
    let mut mask = PixelSelection::new(bounds);
    mask.fill(bounds, 0)?;
    mask.fill(rect, value)?;
    Ok(mask)
}

/// Mask with a filled disk of radius `r` centered on (cx, cy)
pub fn disk_mask(bounds: Rect, cx: i32, cy: i32, r: i32) -> TestResult<PixelSelection> {
    let mut mask = PixelSelection::new(bounds);
    mask.fill(bounds, 0)?;
    for y in bounds.y..bounds.bottom() {
        for x in bounds.x..bounds.right() {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= r * r {
                mask.set_value(x, y, SELECTED);
            }
        }
    }
    Ok(mask)
}

/// Mask with uniformly random coverage values
pub fn random_mask(bounds: Rect, seed: u64) -> TestResult<PixelSelection> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut mask = PixelSelection::new(bounds);
    let data: Vec<u8> = (0..bounds.area()).map(|_| rng.random::<u8>()).collect();
    mask.write_bytes(&data, bounds)?;
    Ok(mask)
}

/// Device whose pixels all carry the given channel values
pub fn flat_device(cs: ColorSpace, rect: Rect, values: &[f64]) -> TestResult<PaintDevice> {
    let mut pixel = vec![0u8; cs.pixel_size()];
    for (ch, v) in cs.channels().iter().zip(values) {
        ch.from_f64(&mut pixel, *v);
    }
    let mut dev = PaintDevice::with_bounds(cs, rect);
    dev.fill(rect, &pixel)?;
    Ok(dev)
}

/// Device with random channel values in each channel's domain
///
/// Alpha channels, when `opaque` is set, are forced to their maximum.
pub fn random_device(cs: ColorSpace, rect: Rect, seed: u64, opaque: bool) -> TestResult<PaintDevice> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut dev = PaintDevice::with_bounds(cs.clone(), rect);
    dev.ensure_rect(rect);
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            let pixel = dev.pixel_mut(x, y);
            for ch in cs.channels() {
                let v = if opaque && ch.is_alpha() {
                    ch.max_value()
                } else {
                    rng.random_range(ch.min_value()..=ch.max_value())
                };
                ch.from_f64(pixel, v);
            }
        }
    }
    Ok(dev)
}
