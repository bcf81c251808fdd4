//! Frequency-domain convolution
//!
//! The source region (the area grown by the kernel window, `anchor` pixels
//! left and up, the rest right and down) is copied into a zero-padded tile
//! of `(area_w + 2 * (kw - 1)) x (area_h + kh - 1)` complex values per
//! convolved channel. The kernel is placed in a tile of the same size,
//! circularly shifted by its right and bottom reach, and transformed once.
//! Each channel is then transformed, multiplied with the kernel spectrum
//! and transformed back; the result for area pixel `(x, y)` is found at
//! tile position `(x + anchor_x, y + anchor_y)`. No output index reads
//! across the tile edge, so the circular product never wraps.
//!
//! Work is split into [`FftConvolutionWorker::compute`], which only reads
//! the source, and [`FftConvolutionWorker::write_back`], which only writes
//! the destination, so a device can be convolved in place without a copy.

use std::marker::PhantomData;
use std::sync::Arc;

use log::{debug, trace};
use rasterfx_core::{
    HLineConstIterator, HLineIterator, IteratorPolicy, PaintDevice, Point, RandomConstAccessor,
    Rect, Size,
};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::planner::{GlobalPlannerLock, PlannerLock};
use crate::worker::{ChannelPlan, ConvolutionWorker, WorkerContext, WorkerOutcome, check_pixel_sizes};
use crate::{ConvolutionKernel, FilterResult};

/// Forward and inverse plans for one tile size
struct TilePlans {
    row_forward: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

/// FFT convolution engine
pub struct FftConvolutionWorker<P: IteratorPolicy> {
    ctx: WorkerContext,
    planner_lock: Arc<dyn PlannerLock>,
    tile_w: usize,
    tile_h: usize,
    anchor: (usize, usize),
    area: Size,
    plan: Option<ChannelPlan>,
    kernel_spectrum: Vec<Complex<f64>>,
    channel_tiles: Vec<Vec<Complex<f64>>>,
    scratch: Vec<Complex<f64>>,
    /// Raw source pixels of the area, copied to the destination verbatim
    /// before the convolved channels are written
    source_pixels: Vec<u8>,
    _policy: PhantomData<P>,
}

impl<P: IteratorPolicy> FftConvolutionWorker<P> {
    /// Create a worker serialized on the process-wide planner lock
    pub fn new(ctx: WorkerContext) -> Self {
        Self::with_planner_lock(ctx, Arc::new(GlobalPlannerLock))
    }

    pub fn with_planner_lock(ctx: WorkerContext, planner_lock: Arc<dyn PlannerLock>) -> Self {
        Self {
            ctx,
            planner_lock,
            tile_w: 0,
            tile_h: 0,
            anchor: (0, 0),
            area: Size::default(),
            plan: None,
            kernel_spectrum: Vec::new(),
            channel_tiles: Vec::new(),
            scratch: Vec::new(),
            source_pixels: Vec::new(),
            _policy: PhantomData,
        }
    }

    /// Free every tile buffer
    pub fn clean_up(&mut self) {
        self.plan = None;
        self.area = Size::default();
        self.kernel_spectrum = Vec::new();
        self.channel_tiles = Vec::new();
        self.scratch = Vec::new();
        self.source_pixels = Vec::new();
    }

    fn make_plans(&self) -> TilePlans {
        let _guard = self.planner_lock.lock();
        let mut planner = FftPlanner::<f64>::new();
        TilePlans {
            row_forward: planner.plan_fft_forward(self.tile_w),
            col_forward: planner.plan_fft_forward(self.tile_h),
            row_inverse: planner.plan_fft_inverse(self.tile_w),
            col_inverse: planner.plan_fft_inverse(self.tile_h),
        }
    }

    /// Report a finished phase; `true` means stop
    fn phase_done(&mut self, phase: i32, name: &str) -> bool {
        trace!("fft convolution phase {} ({}) done", phase, name);
        self.ctx.set_value(phase);
        if self.ctx.interrupted() {
            debug!("fft convolution interrupted after {}", name);
            self.clean_up();
            return true;
        }
        false
    }

    /// Read the source and compute the convolved channel tiles.
    ///
    /// On [`WorkerOutcome::Interrupted`] all buffers are already freed and
    /// [`FftConvolutionWorker::write_back`] does nothing.
    pub fn compute(
        &mut self,
        kernel: &ConvolutionKernel,
        src: &PaintDevice,
        src_pos: Point,
        area: Size,
        data_rect: Rect,
    ) -> FilterResult<WorkerOutcome> {
        self.clean_up();
        if area.is_empty() {
            return Ok(WorkerOutcome::Completed);
        }
        let plan = ChannelPlan::new(src.color_space(), self.ctx.channel_flags.as_ref(), kernel)?;
        let policy = P::for_data_rect(data_rect);

        self.anchor = kernel.anchor();
        self.tile_w = area.w as usize + 2 * (kernel.width() - 1);
        self.tile_h = area.h as usize + kernel.height() - 1;
        self.area = area;
        debug!(
            "fft convolution: {}x{} kernel, {}x{} area, {}x{} tile, {} channels",
            kernel.width(),
            kernel.height(),
            area.w,
            area.h,
            self.tile_w,
            self.tile_h,
            plan.len()
        );

        let phases = 2 + plan.len() as i32;
        self.ctx.set_range(0, phases);

        self.fill_tiles(kernel, &plan, src, src_pos, &policy);
        if self.phase_done(1, "tile fill") {
            return Ok(WorkerOutcome::Interrupted);
        }

        let plans = self.make_plans();
        self.fill_kernel_spectrum(kernel, &plans);
        if self.phase_done(2, "kernel transform") {
            return Ok(WorkerOutcome::Interrupted);
        }

        let scale = 1.0 / (self.tile_w * self.tile_h) as f64;
        // Alpha first so an interrupted run never leaves color without it
        let order: Vec<usize> = plan
            .alpha()
            .into_iter()
            .chain((0..plan.len()).filter(|&k| Some(k) != plan.alpha()))
            .collect();
        for (i, k) in order.into_iter().enumerate() {
            let mut tile = std::mem::take(&mut self.channel_tiles[k]);
            self.transform(&mut tile, &plans.row_forward, &plans.col_forward);
            for (v, s) in tile.iter_mut().zip(&self.kernel_spectrum) {
                *v *= *s;
            }
            self.transform(&mut tile, &plans.row_inverse, &plans.col_inverse);
            for v in tile.iter_mut() {
                *v *= scale;
            }
            self.channel_tiles[k] = tile;

            if self.phase_done(3 + i as i32, "channel transform") {
                return Ok(WorkerOutcome::Interrupted);
            }
        }

        self.plan = Some(plan);
        Ok(WorkerOutcome::Completed)
    }

    /// Write the computed area at `dst_pos` and free the buffers
    pub fn write_back(&mut self, dst: &mut PaintDevice, dst_pos: Point) -> FilterResult<()> {
        let Some(plan) = self.plan.take() else {
            return Ok(());
        };
        let ps = dst.pixel_size();
        if self.source_pixels.len() != self.area.w as usize * self.area.h as usize * ps {
            return Err(rasterfx_core::Error::PixelSize {
                expected: self.source_pixels.len() / (self.area.w as usize * self.area.h as usize),
                actual: ps,
            }
            .into());
        }

        let area = self.area;
        let mut it = HLineIterator::new(dst, Rect::from_point_size(dst_pos, area));
        let mut source = self.source_pixels.chunks_exact(ps);
        for row in 0..area.h as usize {
            let line = (row + self.anchor.1) * self.tile_w + self.anchor.0;
            for col in 0..area.w as usize {
                let out = it.raw_data();
                if let Some(px) = source.next() {
                    out.copy_from_slice(px);
                }
                let tiles = &self.channel_tiles;
                plan.write_pixel(out, |k| tiles[k][line + col].re);
                it.next_pixel();
            }
            it.next_row();
        }

        self.clean_up();
        Ok(())
    }

    fn fill_tiles(
        &mut self,
        kernel: &ConvolutionKernel,
        plan: &ChannelPlan,
        src: &PaintDevice,
        src_pos: Point,
        policy: &P,
    ) {
        let n = plan.len();
        let tile_len = self.tile_w * self.tile_h;
        self.channel_tiles = vec![vec![Complex::new(0.0, 0.0); tile_len]; n];

        let read = Rect::new_unchecked(
            src_pos.x - self.anchor.0 as i32,
            src_pos.y - self.anchor.1 as i32,
            self.area.w + (kernel.width() - 1) as i32,
            self.area.h + (kernel.height() - 1) as i32,
        );
        let mut values = vec![0.0; n];
        let mut it = HLineConstIterator::new(src, read, policy.clone());
        for row in 0..read.h as usize {
            for col in 0..read.w as usize {
                plan.load_pixel(it.raw_data_const(), &mut values);
                for (tile, v) in self.channel_tiles.iter_mut().zip(&values) {
                    tile[row * self.tile_w + col].re = *v;
                }
                it.next_pixel();
            }
            it.next_row();
        }

        let mut reader = RandomConstAccessor::new(src, policy.clone());
        let ps = src.pixel_size();
        self.source_pixels = Vec::with_capacity(self.area.w as usize * self.area.h as usize * ps);
        for y in 0..self.area.h {
            for x in 0..self.area.w {
                reader.move_to(src_pos.x + x, src_pos.y + y);
                self.source_pixels.extend_from_slice(reader.raw_data_const());
            }
        }
    }

    fn fill_kernel_spectrum(&mut self, kernel: &ConvolutionKernel, plans: &TilePlans) {
        let (w, h) = (self.tile_w, self.tile_h);
        let mut spectrum = vec![Complex::new(0.0, 0.0); w * h];
        let (reach_x, reach_y) = (kernel.half_width(), kernel.half_height());
        for ky in 0..kernel.height() {
            let ty = (ky + h - reach_y) % h;
            for kx in 0..kernel.width() {
                let tx = (kx + w - reach_x) % w;
                spectrum[ty * w + tx].re = kernel.coeff(ky, kx);
            }
        }
        self.transform(&mut spectrum, &plans.row_forward, &plans.col_forward);
        self.kernel_spectrum = spectrum;
    }

    /// 2-D transform: rows in place, then columns through a transposed copy
    fn transform(&mut self, tile: &mut [Complex<f64>], rows: &Arc<dyn Fft<f64>>, cols: &Arc<dyn Fft<f64>>) {
        let (w, h) = (self.tile_w, self.tile_h);
        rows.process(tile);

        self.scratch.resize(w * h, Complex::new(0.0, 0.0));
        for y in 0..h {
            for x in 0..w {
                self.scratch[x * h + y] = tile[y * w + x];
            }
        }
        cols.process(&mut self.scratch);
        for x in 0..w {
            for y in 0..h {
                tile[y * w + x] = self.scratch[x * h + y];
            }
        }
    }
}

impl<P: IteratorPolicy> ConvolutionWorker<P> for FftConvolutionWorker<P> {
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
        check_pixel_sizes(src, dst)?;
        match self.compute(kernel, src, src_pos, area, data_rect)? {
            WorkerOutcome::Completed => {
                self.write_back(dst, dst_pos)?;
                Ok(WorkerOutcome::Completed)
            }
            WorkerOutcome::Interrupted => Ok(WorkerOutcome::Interrupted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpatialConvolutionWorker;
    use rasterfx_core::{CancellationToken, ColorSpace, NormalIteratorPolicy, ProgressState};

    fn noise(w: i32, h: i32) -> PaintDevice {
        let rect = Rect::new_unchecked(0, 0, w, h);
        let mut dev = PaintDevice::with_bounds(ColorSpace::gray8(), rect);
        let data: Vec<u8> = (0..w * h).map(|i| ((i * 37 + i / 5 * 11) % 256) as u8).collect();
        dev.write_bytes(&data, rect).unwrap();
        dev
    }

    #[test]
    fn test_matches_spatial_on_asymmetric_kernel() {
        let src = noise(20, 16);
        let data: Vec<f64> = (0..21).map(|i| ((i * 7) % 5) as f64 + 1.0).collect();
        let sum = data.iter().sum();
        let kernel = ConvolutionKernel::from_matrix(&data, 7, 3, 0.0, sum).unwrap();
        let area = Rect::new_unchecked(2, 3, 14, 9);
        let data_rect = area.adjusted(-3, -1, 3, 1);

        let mut a = PaintDevice::new(ColorSpace::gray8());
        let mut b = PaintDevice::new(ColorSpace::gray8());
        FftConvolutionWorker::<NormalIteratorPolicy>::new(WorkerContext::default())
            .execute(&kernel, &src, &mut a, area.top_left(), area.top_left(), area.size(), data_rect)
            .unwrap();
        SpatialConvolutionWorker::<NormalIteratorPolicy>::new(WorkerContext::default())
            .execute(&kernel, &src, &mut b, area.top_left(), area.top_left(), area.size(), data_rect)
            .unwrap();

        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let (va, vb) = (a.pixel(x, y)[0] as i32, b.pixel(x, y)[0] as i32);
                assert!((va - vb).abs() <= 1, "({}, {}): fft {} spatial {}", x, y, va, vb);
            }
        }
    }

    #[test]
    fn test_even_kernel_reads_left_neighbor_without_wrap() {
        let rect = Rect::new_unchecked(0, 0, 6, 1);
        let mut src = PaintDevice::with_bounds(ColorSpace::gray8(), rect);
        src.write_bytes(&[10, 20, 30, 40, 50, 200], rect).unwrap();
        let kernel = ConvolutionKernel::new(2, 1, vec![1.0, 1.0], 0.0, 0.0).unwrap();

        let mut dst = PaintDevice::new(ColorSpace::gray8());
        FftConvolutionWorker::<NormalIteratorPolicy>::new(WorkerContext::default())
            .execute(&kernel, &src, &mut dst, Point::new(0, 0), Point::new(0, 0), rect.size(), rect.adjusted(-1, 0, 0, 0))
            .unwrap();
        let mut out = [0u8; 6];
        dst.read_bytes(&mut out, rect).unwrap();
        assert_eq!(out, [10, 30, 50, 70, 90, 250]);
    }

    #[test]
    fn test_interrupt_frees_buffers_and_skips_write() {
        let src = noise(8, 8);
        let token = CancellationToken::new();
        token.cancel();
        let ctx = WorkerContext {
            channel_flags: None,
            progress: Some(Arc::new(ProgressState::with_token(token))),
        };
        let kernel = ConvolutionKernel::box_kernel(7).unwrap();
        let mut worker = FftConvolutionWorker::<NormalIteratorPolicy>::new(ctx);
        let outcome = worker
            .compute(&kernel, &src, Point::new(0, 0), Size::new(8, 8), Rect::new_unchecked(-3, -3, 14, 14))
            .unwrap();
        assert_eq!(outcome, WorkerOutcome::Interrupted);
        assert!(worker.channel_tiles.is_empty());

        let mut dst = PaintDevice::new(ColorSpace::gray8());
        worker.write_back(&mut dst, Point::new(0, 0)).unwrap();
        assert!(dst.extent().is_empty());
    }

    #[test]
    fn test_planner_lock_taken_once_per_compute() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingLock(AtomicUsize);
        impl PlannerLock for CountingLock {
            fn lock(&self) -> crate::planner::PlannerGuard<'_> {
                self.0.fetch_add(1, Ordering::SeqCst);
                crate::planner::PlannerGuard::unlocked()
            }
        }

        let lock = Arc::new(CountingLock(AtomicUsize::new(0)));
        let src = noise(6, 6);
        let kernel = ConvolutionKernel::box_kernel(3).unwrap();
        let mut worker =
            FftConvolutionWorker::<NormalIteratorPolicy>::with_planner_lock(WorkerContext::default(), lock.clone());
        let mut dst = PaintDevice::new(ColorSpace::gray8());
        worker
            .execute(&kernel, &src, &mut dst, Point::new(1, 1), Point::new(1, 1), Size::new(4, 4), Rect::new_unchecked(0, 0, 6, 6))
            .unwrap();
        assert_eq!(lock.0.load(Ordering::SeqCst), 1);
    }
}
