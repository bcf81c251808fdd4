//! Color spaces and channel descriptors
//!
//! A [`ColorSpace`] is an ordered list of [`ChannelInfo`] entries, each
//! naming the byte offset of the channel inside a pixel, whether it is a
//! color or alpha channel, and how its raw bytes convert to and from `f64`.
//!
//! Conversions work in the channel's native domain: an 8-bit channel maps to
//! `0.0..=255.0`, a 16-bit channel to `0.0..=65535.0` and a float channel to
//! `0.0..=1.0`. [`ChannelInfo::min_value`] / [`ChannelInfo::max_value`]
//! report those bounds, which the convolution engine uses for clamping.

/// Storage type of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelValueType {
    U8,
    U16,
    F32,
}

impl ChannelValueType {
    /// Size of one channel value in bytes
    #[inline]
    pub fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::F32 => 4,
        }
    }

    /// Lower bound of the channel domain
    #[inline]
    pub fn min_value(self) -> f64 {
        0.0
    }

    /// Upper bound of the channel domain
    #[inline]
    pub fn max_value(self) -> f64 {
        match self {
            Self::U8 => u8::MAX as f64,
            Self::U16 => u16::MAX as f64,
            Self::F32 => 1.0,
        }
    }
}

/// Role of a channel inside a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    Color,
    Alpha,
}

/// Descriptor of a single channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    name: &'static str,
    pos: usize,
    channel_type: ChannelType,
    value_type: ChannelValueType,
}

impl ChannelInfo {
    /// Create a channel descriptor located at byte offset `pos`
    pub const fn new(
        name: &'static str,
        pos: usize,
        channel_type: ChannelType,
        value_type: ChannelValueType,
    ) -> Self {
        Self {
            name,
            pos,
            channel_type,
            value_type,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Byte offset of the channel within a pixel
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    #[inline]
    pub fn value_type(&self) -> ChannelValueType {
        self.value_type
    }

    #[inline]
    pub fn is_alpha(&self) -> bool {
        self.channel_type == ChannelType::Alpha
    }

    #[inline]
    pub fn min_value(&self) -> f64 {
        self.value_type.min_value()
    }

    #[inline]
    pub fn max_value(&self) -> f64 {
        self.value_type.max_value()
    }

    /// Read the channel from a raw pixel
    #[inline]
    pub fn to_f64(&self, pixel: &[u8]) -> f64 {
        let p = self.pos;
        match self.value_type {
            ChannelValueType::U8 => pixel[p] as f64,
            ChannelValueType::U16 => u16::from_ne_bytes([pixel[p], pixel[p + 1]]) as f64,
            ChannelValueType::F32 => {
                f32::from_ne_bytes([pixel[p], pixel[p + 1], pixel[p + 2], pixel[p + 3]]) as f64
            }
        }
    }

    /// Store `value` into the channel of a raw pixel.
    ///
    /// Integer channels round to nearest and saturate; NaN stores 0.
    #[inline]
    pub fn from_f64(&self, pixel: &mut [u8], value: f64) {
        let p = self.pos;
        match self.value_type {
            ChannelValueType::U8 => pixel[p] = value.round() as u8,
            ChannelValueType::U16 => {
                pixel[p..p + 2].copy_from_slice(&(value.round() as u16).to_ne_bytes())
            }
            ChannelValueType::F32 => pixel[p..p + 4].copy_from_slice(&(value as f32).to_ne_bytes()),
        }
    }

    /// Same as [`ChannelInfo::from_f64`], additionally reporting whether the
    /// stored value is zero in the channel's own encoding.
    #[inline]
    pub fn from_f64_check_null(&self, pixel: &mut [u8], value: f64) -> bool {
        self.from_f64(pixel, value);
        self.to_f64(pixel) == 0.0
    }
}

/// Per-channel on/off flags, indexed like [`ColorSpace::channels`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelFlags {
    bits: Vec<bool>,
}

impl ChannelFlags {
    /// Flags for `count` channels, all set to `value`
    pub fn new(count: usize, value: bool) -> Self {
        Self {
            bits: vec![value; count],
        }
    }

    pub fn from_vec(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Test one flag; out-of-range indices read as unset
    #[inline]
    pub fn test(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, index: usize, value: bool) {
        if index >= self.bits.len() {
            self.bits.resize(index + 1, false);
        }
        self.bits[index] = value;
    }
}

/// Pixel layout: an ordered set of channels
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpace {
    id: &'static str,
    channels: Vec<ChannelInfo>,
    pixel_size: usize,
}

impl ColorSpace {
    /// Build a color space from channel descriptors.
    ///
    /// The pixel size is the end of the furthest channel.
    pub fn new(id: &'static str, channels: Vec<ChannelInfo>) -> Self {
        let pixel_size = channels
            .iter()
            .map(|c| c.pos() + c.value_type().size())
            .max()
            .unwrap_or(0);
        Self {
            id,
            channels,
            pixel_size,
        }
    }

    /// Single 8-bit alpha channel, the layout of selection masks
    pub fn alpha8() -> Self {
        Self::new(
            "ALPHA",
            vec![ChannelInfo::new(
                "Alpha",
                0,
                ChannelType::Alpha,
                ChannelValueType::U8,
            )],
        )
    }

    /// Single 8-bit gray channel without alpha
    pub fn gray8() -> Self {
        Self::new(
            "GRAYU8",
            vec![ChannelInfo::new(
                "Gray",
                0,
                ChannelType::Color,
                ChannelValueType::U8,
            )],
        )
    }

    /// 8-bit gray plus 8-bit alpha
    pub fn graya8() -> Self {
        Self::new(
            "GRAYAU8",
            vec![
                ChannelInfo::new("Gray", 0, ChannelType::Color, ChannelValueType::U8),
                ChannelInfo::new("Alpha", 1, ChannelType::Alpha, ChannelValueType::U8),
            ],
        )
    }

    /// 8-bit RGBA (red, green, blue, alpha byte order)
    pub fn rgba8() -> Self {
        Self::rgba("RGBA", ChannelValueType::U8)
    }

    /// 16-bit RGBA
    pub fn rgba16() -> Self {
        Self::rgba("RGBA16", ChannelValueType::U16)
    }

    /// 32-bit float RGBA
    pub fn rgbaf32() -> Self {
        Self::rgba("RGBAF32", ChannelValueType::F32)
    }

    fn rgba(id: &'static str, value_type: ChannelValueType) -> Self {
        let s = value_type.size();
        Self::new(
            id,
            vec![
                ChannelInfo::new("Red", 0, ChannelType::Color, value_type),
                ChannelInfo::new("Green", s, ChannelType::Color, value_type),
                ChannelInfo::new("Blue", 2 * s, ChannelType::Color, value_type),
                ChannelInfo::new("Alpha", 3 * s, ChannelType::Alpha, value_type),
            ],
        )
    }

    #[inline]
    pub fn id(&self) -> &'static str {
        self.id
    }

    #[inline]
    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Bytes per pixel
    #[inline]
    pub fn pixel_size(&self) -> usize {
        self.pixel_size
    }

    /// Index of the alpha channel, if any
    pub fn alpha_pos(&self) -> Option<usize> {
        self.channels.iter().position(ChannelInfo::is_alpha)
    }

    /// Flags selecting the color channels, the alpha channel, or both
    pub fn channel_flags(&self, color: bool, alpha: bool) -> ChannelFlags {
        ChannelFlags::from_vec(
            self.channels
                .iter()
                .map(|c| if c.is_alpha() { alpha } else { color })
                .collect(),
        )
    }
}
