//! Convolution worker contract and shared channel arithmetic
//!
//! Both engines load source pixels into `f64` channel values, premultiplied
//! by the pixel's alpha when alpha is one of the convolved channels, and
//! finish each output pixel the same way:
//!
//! ```text
//! value = sum * (1 / factor) * multiplier + (max - min) * offset
//! ```
//!
//! clamped to the channel's `[min, max]` range. Alpha is finished first; the
//! color channels then use `1 / alpha` as their multiplier, or are written as
//! zero when the stored alpha is zero.

use std::sync::Arc;

use rasterfx_core::{
    ChannelFlags, ChannelInfo, ColorSpace, IteratorPolicy, PaintDevice, Point, ProgressUpdater,
    Rect, Size,
};

use crate::{ConvolutionKernel, FilterResult};

/// How a worker invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Every pixel of the area was written
    Completed,
    /// Progress reported interruption. Pixels written before the check
    /// stay written; invoking the worker again recomputes the whole area.
    Interrupted,
}

/// Per-call settings shared by both engines
#[derive(Clone, Default)]
pub struct WorkerContext {
    pub channel_flags: Option<ChannelFlags>,
    pub progress: Option<Arc<dyn ProgressUpdater>>,
}

impl WorkerContext {
    pub(crate) fn set_range(&self, min: i32, max: i32) {
        if let Some(progress) = &self.progress {
            progress.set_range(min, max);
        }
    }

    pub(crate) fn set_value(&self, value: i32) {
        if let Some(progress) = &self.progress {
            progress.set_value(value);
        }
    }

    pub(crate) fn interrupted(&self) -> bool {
        self.progress.as_ref().is_some_and(|p| p.interrupted())
    }
}

/// A convolution engine, generic over the source read policy
pub trait ConvolutionWorker<P: IteratorPolicy> {
    /// Convolve `area` pixels read around `src_pos` in `src` and write them
    /// at `dst_pos` in `dst`. Reads are resolved by the policy built for
    /// `data_rect`.
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &mut self,
        kernel: &ConvolutionKernel,
        src: &PaintDevice,
        dst: &mut PaintDevice,
        src_pos: Point,
        dst_pos: Point,
        area: Size,
        data_rect: Rect,
    ) -> FilterResult<WorkerOutcome>;
}

/// Channels to convolve plus the per-channel finishing constants
#[derive(Debug, Clone)]
pub(crate) struct ChannelPlan {
    channels: Vec<ChannelInfo>,
    /// Index into `channels` of the alpha channel
    alpha: Option<usize>,
    absolute_offsets: Vec<f64>,
    factor_inv: f64,
}

impl ChannelPlan {
    /// Resolve the convolved channel list: the flagged channels, or every
    /// channel when no flags are set.
    pub(crate) fn new(
        cs: &ColorSpace,
        flags: Option<&ChannelFlags>,
        kernel: &ConvolutionKernel,
    ) -> FilterResult<Self> {
        if let Some(flags) = flags
            && !flags.is_empty()
            && flags.len() != cs.channel_count()
        {
            return Err(rasterfx_core::Error::ChannelFlagsMismatch {
                expected: cs.channel_count(),
                actual: flags.len(),
            }
            .into());
        }

        let channels: Vec<ChannelInfo> = cs
            .channels()
            .iter()
            .enumerate()
            .filter(|(i, _)| flags.is_none_or(|f| f.is_empty() || f.test(*i)))
            .map(|(_, c)| c.clone())
            .collect();
        let alpha = channels.iter().position(ChannelInfo::is_alpha);
        let absolute_offsets = channels
            .iter()
            .map(|c| (c.max_value() - c.min_value()) * kernel.offset())
            .collect();

        Ok(Self {
            channels,
            alpha,
            absolute_offsets,
            factor_inv: 1.0 / kernel.effective_factor(),
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.channels.len()
    }

    /// Index of the alpha channel among the convolved channels
    #[inline]
    pub(crate) fn alpha(&self) -> Option<usize> {
        self.alpha
    }

    /// Load one source pixel as premultiplied channel values
    #[inline]
    pub(crate) fn load_pixel(&self, pixel: &[u8], out: &mut [f64]) {
        let alpha = self
            .alpha
            .map_or(1.0, |a| self.channels[a].to_f64(pixel));
        for (k, (ch, v)) in self.channels.iter().zip(out.iter_mut()).enumerate() {
            *v = if Some(k) == self.alpha {
                alpha
            } else {
                ch.to_f64(pixel) * alpha
            };
        }
    }

    #[inline]
    fn finish(&self, k: usize, sum: f64, multiplier: f64) -> f64 {
        let ch = &self.channels[k];
        let v = sum * self.factor_inv * multiplier + self.absolute_offsets[k];
        // NaN fails the first comparison and lands on the low bound
        if !(v >= ch.min_value()) {
            ch.min_value()
        } else if v > ch.max_value() {
            ch.max_value()
        } else {
            v
        }
    }

    /// Overwrite the convolved channels of `dst` from the raw weighted sums
    /// returned by `sum(k)`.
    pub(crate) fn write_pixel(&self, dst: &mut [u8], sum: impl Fn(usize) -> f64) {
        match self.alpha {
            Some(a) => {
                let alpha = self.finish(a, sum(a), 1.0);
                if self.channels[a].from_f64_check_null(dst, alpha) {
                    for (k, ch) in self.channels.iter().enumerate() {
                        if k != a {
                            ch.from_f64(dst, 0.0);
                        }
                    }
                } else {
                    let alpha_inv = 1.0 / alpha;
                    for (k, ch) in self.channels.iter().enumerate() {
                        if k != a {
                            ch.from_f64(dst, self.finish(k, sum(k), alpha_inv));
                        }
                    }
                }
            }
            None => {
                for (k, ch) in self.channels.iter().enumerate() {
                    ch.from_f64(dst, self.finish(k, sum(k), 1.0));
                }
            }
        }
    }
}

/// Source and destination must share a pixel layout
pub(crate) fn check_pixel_sizes(src: &PaintDevice, dst: &PaintDevice) -> FilterResult<()> {
    if src.pixel_size() != dst.pixel_size() {
        return Err(rasterfx_core::Error::PixelSize {
            expected: src.pixel_size(),
            actual: dst.pixel_size(),
        }
        .into());
    }
    Ok(())
}
