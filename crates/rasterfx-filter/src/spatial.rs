//! Direct spatial convolution with a sliding window cache
//!
//! The worker keeps the premultiplied channel values of every pixel under
//! the kernel footprint in a ring-indexed cache. At the start of each
//! scanline the whole window is loaded; each further step loads only the
//! single column (horizontal sweep) or row (vertical sweep) entering the
//! window, overwriting the one that left.
//!
//! The sweep runs along the longer kernel side, so each step loads the
//! shorter edge. Progress advances and interruption is checked once per
//! scanline.

use std::marker::PhantomData;

use log::debug;
use rasterfx_core::{
    HLineConstIterator, HLineIterator, IteratorPolicy, PaintDevice, Point, RandomConstAccessor,
    Rect, Size, VLineConstIterator, VLineIterator,
};

use crate::worker::{ChannelPlan, ConvolutionWorker, WorkerContext, WorkerOutcome, check_pixel_sizes};
use crate::{ConvolutionKernel, FilterResult};

/// Window geometry for one invocation
struct Window {
    kw: usize,
    kh: usize,
    /// Channels per cached pixel
    channels: usize,
}

impl Window {
    /// Cache offset of logical window cell (r, c) given the ring heads
    #[inline]
    fn slot(&self, row_head: usize, col_head: usize, r: usize, c: usize) -> usize {
        let pr = (row_head + r) % self.kh;
        let pc = (col_head + c) % self.kw;
        (pr * self.kw + pc) * self.channels
    }
}

/// Spatial convolution engine
pub struct SpatialConvolutionWorker<P: IteratorPolicy> {
    ctx: WorkerContext,
    kernel_data: Vec<f64>,
    cache: Vec<f64>,
    _policy: PhantomData<P>,
}

impl<P: IteratorPolicy> SpatialConvolutionWorker<P> {
    pub fn new(ctx: WorkerContext) -> Self {
        Self {
            ctx,
            kernel_data: Vec::new(),
            cache: Vec::new(),
            _policy: PhantomData,
        }
    }

    /// Release scratch buffers
    pub fn clean_up(&mut self) {
        self.kernel_data = Vec::new();
        self.cache = Vec::new();
    }

    fn load_window(
        &mut self,
        plan: &ChannelPlan,
        win: &Window,
        reader: &mut RandomConstAccessor<'_, P>,
        origin: Point,
    ) {
        let n = win.channels;
        for r in 0..win.kh {
            for c in 0..win.kw {
                reader.move_to(origin.x + c as i32, origin.y + r as i32);
                let s = win.slot(0, 0, r, c);
                plan.load_pixel(reader.raw_data_const(), &mut self.cache[s..s + n]);
            }
        }
    }

    /// Weighted sum of channel `k` over the window; the kernel is applied
    /// reversed so the result is a true convolution.
    #[inline]
    fn window_sum(&self, win: &Window, row_head: usize, col_head: usize, k: usize) -> f64 {
        let last = win.kw * win.kh - 1;
        let mut sum = 0.0;
        for r in 0..win.kh {
            for c in 0..win.kw {
                let s = win.slot(row_head, col_head, r, c);
                sum += self.kernel_data[last - (r * win.kw + c)] * self.cache[s + k];
            }
        }
        sum
    }

    #[allow(clippy::too_many_arguments)]
    fn sweep_horizontal(
        &mut self,
        plan: &ChannelPlan,
        win: &Window,
        src: &PaintDevice,
        dst: &mut PaintDevice,
        src_pos: Point,
        dst_pos: Point,
        area: Size,
        policy: &P,
    ) -> WorkerOutcome {
        let n = win.channels;
        let origin = src_pos.offset(-((win.kw / 2) as i32), -((win.kh / 2) as i32));
        let mut reader = RandomConstAccessor::new(src, policy.clone());
        let mut dst_it = HLineIterator::new(dst, Rect::from_point_size(dst_pos, area));
        self.ctx.set_range(0, area.h);

        for row in 0..area.h {
            self.load_window(plan, win, &mut reader, origin.offset(0, row));
            let mut col_head = 0;

            for col in 0..area.w {
                if col > 0 {
                    let x = origin.x + col + win.kw as i32 - 1;
                    let rect = Rect::new_unchecked(x, origin.y + row, 1, win.kh as i32);
                    let mut column = VLineConstIterator::new(src, rect, policy.clone());
                    for r in 0..win.kh {
                        let s = win.slot(0, col_head, r, 0);
                        plan.load_pixel(column.raw_data_const(), &mut self.cache[s..s + n]);
                        column.next_pixel();
                    }
                    col_head = (col_head + 1) % win.kw;
                }

                reader.move_to(src_pos.x + col, src_pos.y + row);
                let out = dst_it.raw_data();
                out.copy_from_slice(reader.raw_data_const());
                plan.write_pixel(out, |k| self.window_sum(win, 0, col_head, k));
                dst_it.next_pixel();
            }
            dst_it.next_row();

            self.ctx.set_value(row + 1);
            if self.ctx.interrupted() {
                debug!("spatial convolution interrupted after row {}", row);
                return WorkerOutcome::Interrupted;
            }
        }
        WorkerOutcome::Completed
    }

    #[allow(clippy::too_many_arguments)]
    fn sweep_vertical(
        &mut self,
        plan: &ChannelPlan,
        win: &Window,
        src: &PaintDevice,
        dst: &mut PaintDevice,
        src_pos: Point,
        dst_pos: Point,
        area: Size,
        policy: &P,
    ) -> WorkerOutcome {
        let n = win.channels;
        let origin = src_pos.offset(-((win.kw / 2) as i32), -((win.kh / 2) as i32));
        let mut reader = RandomConstAccessor::new(src, policy.clone());
        let mut dst_it = VLineIterator::new(dst, Rect::from_point_size(dst_pos, area));
        self.ctx.set_range(0, area.w);

        for col in 0..area.w {
            self.load_window(plan, win, &mut reader, origin.offset(col, 0));
            let mut row_head = 0;

            for row in 0..area.h {
                if row > 0 {
                    let y = origin.y + row + win.kh as i32 - 1;
                    let rect = Rect::new_unchecked(origin.x + col, y, win.kw as i32, 1);
                    let mut line = HLineConstIterator::new(src, rect, policy.clone());
                    for c in 0..win.kw {
                        let s = win.slot(row_head, 0, 0, c);
                        plan.load_pixel(line.raw_data_const(), &mut self.cache[s..s + n]);
                        line.next_pixel();
                    }
                    row_head = (row_head + 1) % win.kh;
                }

                reader.move_to(src_pos.x + col, src_pos.y + row);
                let out = dst_it.raw_data();
                out.copy_from_slice(reader.raw_data_const());
                plan.write_pixel(out, |k| self.window_sum(win, row_head, 0, k));
                dst_it.next_pixel();
            }
            dst_it.next_column();

            self.ctx.set_value(col + 1);
            if self.ctx.interrupted() {
                debug!("spatial convolution interrupted after column {}", col);
                return WorkerOutcome::Interrupted;
            }
        }
        WorkerOutcome::Completed
    }
}

impl<P: IteratorPolicy> ConvolutionWorker<P> for SpatialConvolutionWorker<P> {
    fn execute(
        &mut self,
        kernel: &ConvolutionKernel,
        src: &PaintDevice,
        dst: &mut PaintDevice,
        src_pos: Point,
        dst_pos: Point,
        area: Size,
        data_rect: Rect,
    ) -> FilterResult<WorkerOutcome> {
        if area.is_empty() {
            return Ok(WorkerOutcome::Completed);
        }
        check_pixel_sizes(src, dst)?;
        let plan = ChannelPlan::new(src.color_space(), self.ctx.channel_flags.as_ref(), kernel)?;

        let win = Window {
            kw: kernel.width(),
            kh: kernel.height(),
            channels: plan.len(),
        };
        self.kernel_data = kernel.data().to_vec();
        self.cache = vec![0.0; win.kw * win.kh * win.channels];
        let policy = P::for_data_rect(data_rect);

        let outcome = if win.kw > win.kh {
            self.sweep_horizontal(&plan, &win, src, dst, src_pos, dst_pos, area, &policy)
        } else {
            self.sweep_vertical(&plan, &win, src, dst, src_pos, dst_pos, area, &policy)
        };

        self.clean_up();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterfx_core::{ColorSpace, NormalIteratorPolicy};

    fn ramp(w: i32, h: i32) -> PaintDevice {
        let rect = Rect::new_unchecked(0, 0, w, h);
        let mut dev = PaintDevice::with_bounds(ColorSpace::gray8(), rect);
        let data: Vec<u8> = (0..w * h).map(|i| (i * 3 % 256) as u8).collect();
        dev.write_bytes(&data, rect).unwrap();
        dev
    }

    /// Direct reference: out(x, y) = sum K[ky][kx] * in(x + hw - kx, y + hh - ky)
    fn reference(kernel: &ConvolutionKernel, src: &PaintDevice, x: i32, y: i32) -> f64 {
        let hw = kernel.half_width() as i32;
        let hh = kernel.half_height() as i32;
        let mut sum = 0.0;
        for ky in 0..kernel.height() {
            for kx in 0..kernel.width() {
                let sx = x + hw - kx as i32;
                let sy = y + hh - ky as i32;
                sum += kernel.coeff(ky, kx) * src.pixel(sx, sy)[0] as f64;
            }
        }
        (sum / kernel.effective_factor()).round().clamp(0.0, 255.0)
    }

    fn run(kernel: &ConvolutionKernel, src: &PaintDevice, area: Rect) -> PaintDevice {
        let mut dst = PaintDevice::new(ColorSpace::gray8());
        let data_rect = area.adjusted(
            -(kernel.half_width() as i32),
            -(kernel.half_height() as i32),
            kernel.half_width() as i32,
            kernel.half_height() as i32,
        );
        let mut worker = SpatialConvolutionWorker::<NormalIteratorPolicy>::new(WorkerContext::default());
        let outcome = worker
            .execute(kernel, src, &mut dst, area.top_left(), area.top_left(), area.size(), data_rect)
            .unwrap();
        assert_eq!(outcome, WorkerOutcome::Completed);
        dst
    }

    #[test]
    fn test_asymmetric_kernels_match_reference() {
        let src = ramp(12, 10);
        let area = Rect::new_unchecked(1, 2, 9, 6);
        let wide = ConvolutionKernel::new(5, 3, (1..=15).map(f64::from).collect(), 128.0, 0.0).unwrap();
        let tall = wide.transposed();

        for kernel in [&wide, &tall] {
            let dst = run(kernel, &src, area);
            for y in area.y..area.bottom() {
                for x in area.x..area.right() {
                    assert_eq!(
                        dst.pixel(x, y)[0] as f64,
                        reference(kernel, &src, x, y),
                        "mismatch at ({}, {}) for {}x{}",
                        x,
                        y,
                        kernel.width(),
                        kernel.height()
                    );
                }
            }
        }
    }

    #[test]
    fn test_empty_area_is_noop() {
        let src = ramp(4, 4);
        let mut dst = PaintDevice::new(ColorSpace::gray8());
        let kernel = ConvolutionKernel::box_kernel(3).unwrap();
        let mut worker = SpatialConvolutionWorker::<NormalIteratorPolicy>::new(WorkerContext::default());
        let outcome = worker
            .execute(&kernel, &src, &mut dst, Point::new(0, 0), Point::new(0, 0), Size::new(0, 4), Rect::default())
            .unwrap();
        assert_eq!(outcome, WorkerOutcome::Completed);
        assert!(dst.extent().is_empty());
    }

    #[test]
    fn test_rejects_mismatched_pixel_sizes() {
        let src = ramp(4, 4);
        let mut dst = PaintDevice::new(ColorSpace::rgba8());
        let kernel = ConvolutionKernel::box_kernel(3).unwrap();
        let mut worker = SpatialConvolutionWorker::<NormalIteratorPolicy>::new(WorkerContext::default());
        let result = worker.execute(&kernel, &src, &mut dst, Point::new(0, 0), Point::new(0, 0), Size::new(2, 2), Rect::default());
        assert!(result.is_err());
    }
}
