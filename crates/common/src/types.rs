//! Core types with newtype pattern for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical image identifier used as the texture cache key.
///
/// Typically a URL or asset path; the cache treats it as opaque.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 2D pixel extent of an image, texture, or render target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Round each axis up to the next power of two (minimum 1).
    ///
    /// Offscreen targets use power-of-two extents so that a full mip chain
    /// can be generated for minification filtering.
    pub fn rounded_pow2(self) -> Self {
        Self {
            width: ceil_pow2(self.width),
            height: ceil_pow2(self.height),
        }
    }

    /// Number of reduced mip levels below the base level.
    ///
    /// For a power-of-two extent this is `floor(log2(max(w, h)))`, e.g. 8 for
    /// a 256x128 target.
    pub fn mipmap_count(self) -> u32 {
        let longest = self.width.max(self.height).max(1);
        31 - longest.leading_zeros()
    }

    /// Byte size for RGBA8 pixel data at this extent.
    pub fn rgba_byte_size(self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    pub fn aspect_ratio(self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn as_vec2(self) -> glam::Vec2 {
        glam::Vec2::new(self.width as f32, self.height as f32)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Round a scalar up to the next power of two (minimum 1).
pub fn ceil_pow2(value: u32) -> u32 {
    value.max(1).next_power_of_two()
}
