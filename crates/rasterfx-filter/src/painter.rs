//! ConvolutionPainter - engine selection and border handling
//!
//! The painter resolves one convolution request into a single worker run:
//!
//! 1. An empty area is a no-op.
//! 2. With a selection set, the area shrinks to its intersection with the
//!    selection's exact bounds; the source position moves by the same amount.
//! 3. A source in wraparound mode always uses [`BorderOp::Ignore`], since
//!    its own reads already wrap.
//! 4. The data rectangle is the area grown by the kernel half-size
//!    ([`BorderOp::Ignore`]) or the area united with the source's default
//!    bounds, read through a clamping policy ([`BorderOp::Repeat`]).
//! 5. The engine is FFT or spatial per [`EnginePreference`]; automatic
//!    selection uses FFT when either kernel side exceeds [`FFT_THRESHOLD`].

use std::sync::Arc;

use log::debug;
use rasterfx_core::{
    ChannelFlags, IteratorPolicy, NormalIteratorPolicy, PaintDevice, PixelSelection, Point,
    ProgressUpdater, Rect, RepeatIteratorPolicy, Size,
};

use crate::planner::{GlobalPlannerLock, PlannerLock};
use crate::worker::{ConvolutionWorker, WorkerContext, WorkerOutcome};
use crate::{ConvolutionKernel, FilterResult, SpatialConvolutionWorker};

#[cfg(feature = "fft")]
use crate::FftConvolutionWorker;

/// Kernel side length above which automatic selection picks FFT
pub const FFT_THRESHOLD: usize = 5;

/// Environment variable read by [`EnginePreference::from_env`]
pub const ENGINE_ENV: &str = "RASTERFX_CONVOLUTION_ENGINE";

/// How pixels outside the source are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderOp {
    /// Read whatever the device stores (its default pixel outside the extent)
    #[default]
    Ignore,
    /// Repeat the nearest pixel of the area united with the image bounds
    Repeat,
}

/// Convolution engine choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePreference {
    /// FFT for kernels wider or taller than [`FFT_THRESHOLD`]
    #[default]
    Auto,
    /// Always FFT, when built with the `fft` feature
    Fft,
    /// Always spatial
    Spatial,
}

impl EnginePreference {
    /// Parse the preference from `RASTERFX_CONVOLUTION_ENGINE`
    pub fn from_env() -> Self {
        Self::parse(&std::env::var(ENGINE_ENV).unwrap_or_default())
    }

    /// `"fft"` or `"spatial"` (any case); anything else is [`Self::Auto`]
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fft" | "fftw" => Self::Fft,
            "spatial" => Self::Spatial,
            _ => Self::Auto,
        }
    }
}

/// A resolved convolution request
#[derive(Debug, Clone, Copy)]
struct Job {
    src_pos: Point,
    dst_pos: Point,
    area: Size,
    border: BorderOp,
    data_rect: Rect,
}

/// Entry point for kernel convolution
pub struct ConvolutionPainter<'a> {
    channel_flags: Option<ChannelFlags>,
    progress: Option<Arc<dyn ProgressUpdater>>,
    selection: Option<&'a PixelSelection>,
    engine_preference: EnginePreference,
    planner_lock: Arc<dyn PlannerLock>,
}

impl Default for ConvolutionPainter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ConvolutionPainter<'a> {
    pub fn new() -> Self {
        Self {
            channel_flags: None,
            progress: None,
            selection: None,
            engine_preference: EnginePreference::default(),
            planner_lock: Arc::new(GlobalPlannerLock),
        }
    }

    /// Restrict convolution to the flagged channels. Unflagged channels are
    /// copied from the source unchanged.
    pub fn set_channel_flags(&mut self, flags: ChannelFlags) -> &mut Self {
        self.channel_flags = Some(flags);
        self
    }

    pub fn set_progress(&mut self, progress: Arc<dyn ProgressUpdater>) -> &mut Self {
        self.progress = Some(progress);
        self
    }

    /// Only compute pixels inside the selection's exact bounds
    pub fn set_selection(&mut self, selection: &'a PixelSelection) -> &mut Self {
        self.selection = Some(selection);
        self
    }

    pub fn set_engine_preference(&mut self, preference: EnginePreference) -> &mut Self {
        self.engine_preference = preference;
        self
    }

    pub fn set_planner_lock(&mut self, lock: Arc<dyn PlannerLock>) -> &mut Self {
        self.planner_lock = lock;
        self
    }

    pub fn engine_preference(&self) -> EnginePreference {
        self.engine_preference
    }

    /// Whether `kernel` would run on the FFT engine
    pub fn use_fft(&self, kernel: &ConvolutionKernel) -> bool {
        if !cfg!(feature = "fft") {
            return false;
        }
        match self.engine_preference {
            EnginePreference::Fft => true,
            EnginePreference::Spatial => false,
            EnginePreference::Auto => {
                kernel.width() > FFT_THRESHOLD || kernel.height() > FFT_THRESHOLD
            }
        }
    }

    /// Whether convolving a device into itself needs a snapshot first.
    ///
    /// The spatial engine reads neighbors while writing; the FFT engine
    /// buffers the whole tile before writing back.
    pub fn needs_transaction(&self, kernel: &ConvolutionKernel) -> bool {
        !self.use_fft(kernel)
    }

    fn context(&self) -> WorkerContext {
        WorkerContext {
            channel_flags: self.channel_flags.clone(),
            progress: self.progress.clone(),
        }
    }

    fn resolve(
        &self,
        kernel: &ConvolutionKernel,
        src: &PaintDevice,
        mut src_pos: Point,
        mut dst_pos: Point,
        mut area: Size,
        mut border: BorderOp,
    ) -> Option<Job> {
        if area.is_empty() {
            return None;
        }

        if let Some(selection) = self.selection {
            let requested = Rect::from_point_size(dst_pos, area);
            let restricted = selection.selected_exact_rect().intersect(&requested)?;
            src_pos = src_pos.offset(restricted.x - dst_pos.x, restricted.y - dst_pos.y);
            dst_pos = restricted.top_left();
            area = restricted.size();
        }

        if src.is_wrap_around() && border != BorderOp::Ignore {
            debug!("source wraps around, using BorderOp::Ignore instead of {:?}", border);
            border = BorderOp::Ignore;
        }

        let (ax, ay) = kernel.anchor();
        let data_rect = match border {
            BorderOp::Ignore => Rect::new_unchecked(
                src_pos.x - ax as i32,
                src_pos.y - ay as i32,
                area.w + kernel.width() as i32 - 1,
                area.h + kernel.height() as i32 - 1,
            ),
            BorderOp::Repeat => {
                Rect::from_point_size(src_pos, area).united(&src.default_bounds())
            }
        };

        Some(Job {
            src_pos,
            dst_pos,
            area,
            border,
            data_rect,
        })
    }

    /// Convolve `area` pixels around `src_pos` of `src` into `dst` at
    /// `dst_pos`.
    ///
    /// Returns [`WorkerOutcome::Interrupted`] when the progress sink asked
    /// to stop; the pixels written up to that point remain in `dst`.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_matrix(
        &self,
        kernel: &ConvolutionKernel,
        src: &PaintDevice,
        dst: &mut PaintDevice,
        src_pos: Point,
        dst_pos: Point,
        area: Size,
        border: BorderOp,
    ) -> FilterResult<WorkerOutcome> {
        let Some(job) = self.resolve(kernel, src, src_pos, dst_pos, area, border) else {
            return Ok(WorkerOutcome::Completed);
        };
        let use_fft = self.use_fft(kernel);
        debug!(
            "apply_matrix: {} engine, {}x{} kernel, {}x{} area, {:?}",
            if use_fft { "fft" } else { "spatial" },
            kernel.width(),
            kernel.height(),
            job.area.w,
            job.area.h,
            job.border
        );

        match job.border {
            BorderOp::Ignore => self.run::<NormalIteratorPolicy>(kernel, src, dst, &job, use_fft),
            BorderOp::Repeat => self.run::<RepeatIteratorPolicy>(kernel, src, dst, &job, use_fft),
        }
    }

    fn run<P: IteratorPolicy + 'static>(
        &self,
        kernel: &ConvolutionKernel,
        src: &PaintDevice,
        dst: &mut PaintDevice,
        job: &Job,
        use_fft: bool,
    ) -> FilterResult<WorkerOutcome> {
        let mut worker: Box<dyn ConvolutionWorker<P>> = self.make_worker::<P>(use_fft);
        worker.execute(
            kernel,
            src,
            dst,
            job.src_pos,
            job.dst_pos,
            job.area,
            job.data_rect,
        )
    }

    #[cfg(feature = "fft")]
    fn make_worker<P: IteratorPolicy + 'static>(&self, use_fft: bool) -> Box<dyn ConvolutionWorker<P>> {
        if use_fft {
            Box::new(FftConvolutionWorker::<P>::with_planner_lock(
                self.context(),
                Arc::clone(&self.planner_lock),
            ))
        } else {
            Box::new(SpatialConvolutionWorker::<P>::new(self.context()))
        }
    }

    #[cfg(not(feature = "fft"))]
    fn make_worker<P: IteratorPolicy + 'static>(&self, _use_fft: bool) -> Box<dyn ConvolutionWorker<P>> {
        Box::new(SpatialConvolutionWorker::<P>::new(self.context()))
    }

    /// Convolve `area` of `device` at `pos` into itself.
    ///
    /// The spatial engine works from a snapshot of the device; the FFT
    /// engine reads the whole tile before writing.
    pub fn apply_matrix_in_place(
        &self,
        kernel: &ConvolutionKernel,
        device: &mut PaintDevice,
        pos: Point,
        area: Size,
        border: BorderOp,
    ) -> FilterResult<WorkerOutcome> {
        if self.needs_transaction(kernel) {
            let snapshot = device.clone();
            return self.apply_matrix(kernel, &snapshot, device, pos, pos, area, border);
        }
        self.apply_in_place_fft(kernel, device, pos, area, border)
    }

    #[cfg(feature = "fft")]
    fn apply_in_place_fft(
        &self,
        kernel: &ConvolutionKernel,
        device: &mut PaintDevice,
        pos: Point,
        area: Size,
        border: BorderOp,
    ) -> FilterResult<WorkerOutcome> {
        let Some(job) = self.resolve(kernel, device, pos, pos, area, border) else {
            return Ok(WorkerOutcome::Completed);
        };
        debug!(
            "apply_matrix_in_place: fft engine, {}x{} kernel, {}x{} area",
            kernel.width(),
            kernel.height(),
            job.area.w,
            job.area.h
        );

        match job.border {
            BorderOp::Ignore => self.fft_in_place::<NormalIteratorPolicy>(kernel, device, &job),
            BorderOp::Repeat => self.fft_in_place::<RepeatIteratorPolicy>(kernel, device, &job),
        }
    }

    #[cfg(feature = "fft")]
    fn fft_in_place<P: IteratorPolicy>(
        &self,
        kernel: &ConvolutionKernel,
        device: &mut PaintDevice,
        job: &Job,
    ) -> FilterResult<WorkerOutcome> {
        let mut worker =
            FftConvolutionWorker::<P>::with_planner_lock(self.context(), Arc::clone(&self.planner_lock));
        let outcome = worker.compute(kernel, device, job.src_pos, job.area, job.data_rect)?;
        if outcome == WorkerOutcome::Completed {
            worker.write_back(device, job.dst_pos)?;
        }
        Ok(outcome)
    }

    #[cfg(not(feature = "fft"))]
    fn apply_in_place_fft(
        &self,
        kernel: &ConvolutionKernel,
        device: &mut PaintDevice,
        pos: Point,
        area: Size,
        border: BorderOp,
    ) -> FilterResult<WorkerOutcome> {
        let snapshot = device.clone();
        self.apply_matrix(kernel, &snapshot, device, pos, pos, area, border)
    }
}
