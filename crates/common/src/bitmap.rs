//! Decoded bitmap data.
//!
//! A [`Bitmap`] owns decoded pixels between the async fetch/decode step and
//! the GPU upload. Release is tied to ownership: dropping the value frees the
//! storage on every exit path (successful upload, cancellation after a
//! discard race, or cache disposal) with no reliance on finalization.

use crate::error::GpuError;
use crate::gpu::PixelFormat;
use crate::types::Size;

/// CPU-side decoded image pixels.
#[derive(Clone, Debug)]
pub struct Bitmap {
    size: Size,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Bitmap {
    /// Wrap decoded pixel data, validating its length against the extent.
    pub fn new(size: Size, format: PixelFormat, data: Vec<u8>) -> Result<Self, GpuError> {
        let expected = size.width as usize * size.height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(GpuError::UnsupportedInput(format!(
                "bitmap data is {} bytes, expected {} for {} {:?}",
                data.len(),
                expected,
                size,
                format
            )));
        }
        Ok(Self { size, format, data })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_length() {
        let bmp = Bitmap::new(Size::new(2, 2), PixelFormat::Rgba8, vec![0u8; 16]);
        assert!(bmp.is_ok());
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Bitmap::new(Size::new(2, 2), PixelFormat::Rgba8, vec![0u8; 15]);
        assert!(matches!(err, Err(GpuError::UnsupportedInput(_))));
    }
}
