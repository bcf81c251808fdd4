//! Convolution kernels
//!
//! A [`ConvolutionKernel`] is an immutable row-major coefficient matrix with
//! a scalar `factor` (the divisor applied to the raw weighted sum) and an
//! `offset` (added after scaling, as a fraction of the channel range).
//!
//! Kernels must have odd, non-zero dimensions so that they have a center
//! pixel. Even dimensions are accepted only when `factor` is zero; such a
//! kernel is applied with an implicit factor of one.

use crate::{FilterError, FilterResult};

/// A 2D convolution kernel
#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionKernel {
    width: usize,
    height: usize,
    /// Coefficients (row-major order)
    data: Vec<f64>,
    factor: f64,
    offset: f64,
}

impl ConvolutionKernel {
    /// Create a kernel from raw coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidKernel`] for empty dimensions, a data
    /// length that does not match `width * height`, or even dimensions with
    /// a non-zero factor.
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<f64>,
        factor: f64,
        offset: f64,
    ) -> FilterResult<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "kernel dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        if data.len() != width * height {
            return Err(FilterError::InvalidKernel(format!(
                "expected {} coefficients for a {}x{} kernel, got {}",
                width * height,
                width,
                height,
                data.len()
            )));
        }
        if factor != 0.0 && (width % 2 == 0 || height % 2 == 0) {
            return Err(FilterError::InvalidKernel(format!(
                "kernel dimensions must be odd, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            factor,
            offset,
        })
    }

    /// Build a kernel from a row-major matrix plus offset and normalization
    /// sum. The normalization becomes the kernel's factor.
    pub fn from_matrix(
        data: &[f64],
        width: usize,
        height: usize,
        offset: f64,
        normalization: f64,
    ) -> FilterResult<Self> {
        Self::new(width, height, data.to_vec(), normalization, offset)
    }

    /// Create a box (averaging) kernel of `size`x`size` ones, normalized by
    /// the element count.
    pub fn box_kernel(size: usize) -> FilterResult<Self> {
        Self::new(
            size,
            size,
            vec![1.0; size * size],
            (size * size) as f64,
            0.0,
        )
    }

    /// Create a horizontal 1-D Gaussian of length `2 * radius + 1`.
    ///
    /// Coefficient `i` is `exp(-(d² + r²) / (2r²)) / (2πr²)` with
    /// `d = |i - r|`; the factor is the coefficient sum.
    pub fn gaussian(radius: usize) -> FilterResult<Self> {
        if radius == 0 {
            return Err(FilterError::InvalidKernel(
                "gaussian radius must be positive".to_string(),
            ));
        }
        let size = radius * 2 + 1;
        let r2 = (radius * radius) as f64;
        let multiplicand = 1.0 / (2.0 * std::f64::consts::PI * r2);
        let exponent_multiplicand = 1.0 / (2.0 * r2);

        let data: Vec<f64> = (0..size)
            .map(|x| {
                let d = x.abs_diff(radius) as f64;
                multiplicand * (-(d * d + r2) * exponent_multiplicand).exp()
            })
            .collect();
        let sum = data.iter().sum();
        Self::new(size, 1, data, sum, 0.0)
    }

    /// The same kernel with rows and columns swapped
    pub fn transposed(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for col in 0..self.width {
            for row in 0..self.height {
                data.push(self.coeff(row, col));
            }
        }
        Self {
            width: self.height,
            height: self.width,
            data,
            factor: self.factor,
            offset: self.offset,
        }
    }

    /// Outer product of a horizontal (1 x w) and a vertical (h x 1) kernel.
    ///
    /// The factor is the product of both factors; the offset is taken from
    /// `horizontal`.
    pub fn outer_product(horizontal: &Self, vertical: &Self) -> FilterResult<Self> {
        if horizontal.height != 1 || vertical.width != 1 {
            return Err(FilterError::InvalidKernel(format!(
                "outer product needs a 1xN and an Nx1 kernel, got {}x{} and {}x{}",
                horizontal.width, horizontal.height, vertical.width, vertical.height
            )));
        }
        let mut data = Vec::with_capacity(horizontal.width * vertical.height);
        for &v in &vertical.data {
            data.extend(horizontal.data.iter().map(|&h| h * v));
        }
        Self::new(
            horizontal.width,
            vertical.height,
            data,
            horizontal.factor * vertical.factor,
            horizontal.offset,
        )
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Horizontal distance from the center to the edge
    #[inline]
    pub fn half_width(&self) -> usize {
        (self.width - 1) / 2
    }

    /// Vertical distance from the center to the edge
    #[inline]
    pub fn half_height(&self) -> usize {
        (self.height - 1) / 2
    }

    /// Position of the output pixel inside the kernel window, as
    /// (column, row). Equal to the half size for odd kernels; even kernels
    /// reach one pixel further left and up than right and down.
    #[inline]
    pub fn anchor(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    #[inline]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Divisor actually applied: a zero factor counts as one
    #[inline]
    pub fn effective_factor(&self) -> f64 {
        if self.factor == 0.0 { 1.0 } else { self.factor }
    }

    #[inline]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Row-major coefficients
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Coefficient at (row, col)
    #[inline]
    pub fn coeff(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    /// Sum of all coefficients
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}
