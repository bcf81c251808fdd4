//! Line, column and random-access iterators over a [`PaintDevice`]
//!
//! The const iterators are parameterized by an [`IteratorPolicy`], which
//! decides which stored coordinate a requested coordinate reads from:
//!
//! - [`NormalIteratorPolicy`] reads exactly the requested coordinate, so
//!   out-of-extent reads yield the device's default pixel.
//! - [`RepeatIteratorPolicy`] clamps every read into a data rectangle,
//!   repeating the edge pixels outward.
//!
//! Mutable iterators always write the requested coordinate.
//!
//! Advancing methods (`next_pixel`, `next_row`, `next_column`) move the
//! iterator and return `true` while the new position is still inside the
//! iterated rectangle.

use crate::device::PaintDevice;
use crate::geometry::Rect;

/// Coordinate mapping strategy for const iterators
pub trait IteratorPolicy: Clone {
    /// Build the policy for reads supported by `data_rect`
    fn for_data_rect(data_rect: Rect) -> Self
    where
        Self: Sized;

    /// Coordinate actually read when (x, y) is requested
    fn source_point(&self, x: i32, y: i32) -> (i32, i32);
}

/// Reads the requested coordinate unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalIteratorPolicy;

impl IteratorPolicy for NormalIteratorPolicy {
    fn for_data_rect(_data_rect: Rect) -> Self {
        Self
    }

    #[inline]
    fn source_point(&self, x: i32, y: i32) -> (i32, i32) {
        (x, y)
    }
}

/// Clamps reads into a data rectangle
#[derive(Debug, Clone, Copy)]
pub struct RepeatIteratorPolicy {
    data_rect: Rect,
}

impl RepeatIteratorPolicy {
    pub fn data_rect(&self) -> Rect {
        self.data_rect
    }
}

impl IteratorPolicy for RepeatIteratorPolicy {
    fn for_data_rect(data_rect: Rect) -> Self {
        Self { data_rect }
    }

    #[inline]
    fn source_point(&self, x: i32, y: i32) -> (i32, i32) {
        if self.data_rect.is_empty() {
            (x, y)
        } else {
            self.data_rect.clamp_point(x, y)
        }
    }
}

/// Row-major const iterator
pub struct HLineConstIterator<'a, P: IteratorPolicy> {
    device: &'a PaintDevice,
    policy: P,
    rect: Rect,
    x: i32,
    y: i32,
}

impl<'a, P: IteratorPolicy> HLineConstIterator<'a, P> {
    pub fn new(device: &'a PaintDevice, rect: Rect, policy: P) -> Self {
        Self {
            device,
            policy,
            rect,
            x: rect.x,
            y: rect.y,
        }
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Raw bytes of the current pixel
    #[inline]
    pub fn raw_data_const(&self) -> &'a [u8] {
        let (sx, sy) = self.policy.source_point(self.x, self.y);
        self.device.pixel(sx, sy)
    }

    /// Step right within the current row
    #[inline]
    pub fn next_pixel(&mut self) -> bool {
        self.x += 1;
        self.x < self.rect.right()
    }

    /// Jump to the start of the next row
    #[inline]
    pub fn next_row(&mut self) -> bool {
        self.x = self.rect.x;
        self.y += 1;
        self.y < self.rect.bottom()
    }
}

/// Column-major const iterator
pub struct VLineConstIterator<'a, P: IteratorPolicy> {
    device: &'a PaintDevice,
    policy: P,
    rect: Rect,
    x: i32,
    y: i32,
}

impl<'a, P: IteratorPolicy> VLineConstIterator<'a, P> {
    pub fn new(device: &'a PaintDevice, rect: Rect, policy: P) -> Self {
        Self {
            device,
            policy,
            rect,
            x: rect.x,
            y: rect.y,
        }
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn raw_data_const(&self) -> &'a [u8] {
        let (sx, sy) = self.policy.source_point(self.x, self.y);
        self.device.pixel(sx, sy)
    }

    /// Step down within the current column
    #[inline]
    pub fn next_pixel(&mut self) -> bool {
        self.y += 1;
        self.y < self.rect.bottom()
    }

    /// Jump to the top of the next column
    #[inline]
    pub fn next_column(&mut self) -> bool {
        self.y = self.rect.y;
        self.x += 1;
        self.x < self.rect.right()
    }
}

/// Row-major mutable iterator
pub struct HLineIterator<'a> {
    device: &'a mut PaintDevice,
    rect: Rect,
    x: i32,
    y: i32,
}

impl<'a> HLineIterator<'a> {
    /// Create the iterator, allocating storage for `rect` up front
    pub fn new(device: &'a mut PaintDevice, rect: Rect) -> Self {
        device.ensure_rect(rect);
        Self {
            device,
            rect,
            x: rect.x,
            y: rect.y,
        }
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn raw_data(&mut self) -> &mut [u8] {
        self.device.pixel_mut(self.x, self.y)
    }

    #[inline]
    pub fn next_pixel(&mut self) -> bool {
        self.x += 1;
        self.x < self.rect.right()
    }

    #[inline]
    pub fn next_row(&mut self) -> bool {
        self.x = self.rect.x;
        self.y += 1;
        self.y < self.rect.bottom()
    }
}

/// Column-major mutable iterator
pub struct VLineIterator<'a> {
    device: &'a mut PaintDevice,
    rect: Rect,
    x: i32,
    y: i32,
}

impl<'a> VLineIterator<'a> {
    pub fn new(device: &'a mut PaintDevice, rect: Rect) -> Self {
        device.ensure_rect(rect);
        Self {
            device,
            rect,
            x: rect.x,
            y: rect.y,
        }
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn raw_data(&mut self) -> &mut [u8] {
        self.device.pixel_mut(self.x, self.y)
    }

    #[inline]
    pub fn next_pixel(&mut self) -> bool {
        self.y += 1;
        self.y < self.rect.bottom()
    }

    #[inline]
    pub fn next_column(&mut self) -> bool {
        self.y = self.rect.y;
        self.x += 1;
        self.x < self.rect.right()
    }
}

/// Random-access const reader
pub struct RandomConstAccessor<'a, P: IteratorPolicy> {
    device: &'a PaintDevice,
    policy: P,
    x: i32,
    y: i32,
}

impl<'a, P: IteratorPolicy> RandomConstAccessor<'a, P> {
    pub fn new(device: &'a PaintDevice, policy: P) -> Self {
        Self {
            device,
            policy,
            x: 0,
            y: 0,
        }
    }

    #[inline]
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    #[inline]
    pub fn raw_data_const(&self) -> &'a [u8] {
        let (sx, sy) = self.policy.source_point(self.x, self.y);
        self.device.pixel(sx, sy)
    }

    /// Number of columns starting at `x` that map to adjacent storage on
    /// the same side of the extent edge.
    pub fn num_contiguous_columns(&self, x: i32) -> i32 {
        let (sx, _) = self.policy.source_point(x, self.y);
        if sx != x || self.device.is_wrap_around() {
            return 1;
        }
        contiguous_span(x, self.device.extent().x, self.device.extent().right())
    }

    /// Number of rows starting at `y` that map to adjacent storage on the
    /// same side of the extent edge.
    pub fn num_contiguous_rows(&self, y: i32) -> i32 {
        let (_, sy) = self.policy.source_point(self.x, y);
        if sy != y || self.device.is_wrap_around() {
            return 1;
        }
        contiguous_span(y, self.device.extent().y, self.device.extent().bottom())
    }

    /// Byte distance between vertically adjacent stored pixels
    pub fn row_stride(&self) -> usize {
        self.device.row_stride()
    }
}

fn contiguous_span(v: i32, lo: i32, hi: i32) -> i32 {
    if lo >= hi {
        i32::MAX
    } else if v < lo {
        lo - v
    } else if v < hi {
        hi - v
    } else {
        i32::MAX
    }
}
