// raster.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Pixel buffers and animation frames
use crate::error::{Error, Result};
use pix::Raster;
use pix::rgb::SRgba8;
use std::fmt;

/// Number of channels in a pixel (red, green, blue, alpha)
pub const CHANNELS: usize = 4;

/// Delay substituted for frames declaring zero delay, in milliseconds
pub const DEFAULT_DELAY_MS: u32 = 100;

/// RGBA pixel buffer with positive dimensions.
pub struct PixelBuffer {
    /// Raster of pixels, in row-major order
    raster: Raster<SRgba8>,
}

/// One still image of an animation, with its presentation delay.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Pixels of the frame
    buffer: PixelBuffer,
    /// Delay in milliseconds
    delay_ms: u32,
}

impl Clone for PixelBuffer {
    fn clone(&self) -> Self {
        PixelBuffer {
            raster: Raster::with_raster(&self.raster),
        }
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PixelBuffer {}x{}", self.width(), self.height())
    }
}

impl PartialEq for PixelBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.raster.pixels() == other.raster.pixels()
    }
}

impl PixelBuffer {
    /// Create a buffer with every pixel set to one color.
    pub fn with_color(width: u32, height: u32, clr: SRgba8) -> Result<Self> {
        Self::checked_len(width, height)?;
        Ok(PixelBuffer {
            raster: Raster::with_color(width, height, clr),
        })
    }

    /// Create a buffer from existing RGBA samples.
    ///
    /// Fails with `InvalidBufferSize` unless both dimensions are positive
    /// and the data holds exactly `width * height * 4` samples.
    pub fn with_data(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if data.len() != Self::checked_len(width, height)? {
            return Err(Error::InvalidBufferSize);
        }
        Ok(PixelBuffer {
            raster: Raster::with_u8_buffer(width, height, data),
        })
    }

    /// Wrap an existing raster.
    pub fn with_raster(raster: Raster<SRgba8>) -> Result<Self> {
        Self::checked_len(raster.width(), raster.height())?;
        Ok(PixelBuffer { raster })
    }

    /// Get the sample length for given dimensions
    fn checked_len(width: u32, height: u32) -> Result<usize> {
        // pix addresses pixels with i32 coordinates
        let max = i32::MAX as u32;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(Error::InvalidBufferSize);
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or(Error::InvalidBufferSize)
    }

    /// Get the width in pixels
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    /// Get the height in pixels
    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Get the underlying raster
    pub fn raster(&self) -> &Raster<SRgba8> {
        &self.raster
    }

    /// Consume the buffer, returning its raster
    pub fn into_raster(self) -> Raster<SRgba8> {
        self.raster
    }

    /// Get the RGBA samples
    pub fn as_bytes(&self) -> &[u8] {
        self.raster.as_u8_slice()
    }

    /// Fill every pixel with one color
    pub(crate) fn fill(&mut self, clr: SRgba8) {
        self.raster.pixels_mut().iter_mut().for_each(|p| *p = clr);
    }

    /// Get one pixel
    pub fn pixel(&self, x: u32, y: u32) -> SRgba8 {
        debug_assert!(x < self.width() && y < self.height());
        self.raster.pixel(x as i32, y as i32)
    }

    /// Set one pixel
    pub fn set_pixel(&mut self, x: u32, y: u32, clr: SRgba8) {
        debug_assert!(x < self.width() && y < self.height());
        *self.raster.pixel_mut(x as i32, y as i32) = clr;
    }

    /// Get all pixels in row-major order
    pub fn pixels(&self) -> &[SRgba8] {
        self.raster.pixels()
    }
}

impl Frame {
    /// Create a new frame.
    pub fn new(buffer: PixelBuffer, delay_ms: u32) -> Self {
        Frame { buffer, delay_ms }
    }

    /// Get the pixel buffer
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Consume the frame, returning its pixel buffer
    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }

    /// Get the delay in milliseconds
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Replace the pixel buffer, keeping the delay
    pub fn with_buffer(self, buffer: PixelBuffer) -> Self {
        Frame {
            buffer,
            delay_ms: self.delay_ms,
        }
    }

    /// Get the width in pixels
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Get the height in pixels
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn buffer_len() {
        assert!(PixelBuffer::with_data(2, 2, vec![0; 16]).is_ok());
        assert!(PixelBuffer::with_data(2, 2, vec![0; 15]).is_err());
        assert!(PixelBuffer::with_data(0, 2, vec![]).is_err());
        assert!(PixelBuffer::with_color(3, 0, SRgba8::default()).is_err());
    }

    #[test]
    fn pixels() {
        let clr = SRgba8::new(1, 2, 3, 4);
        let mut b = PixelBuffer::with_color(3, 2, clr).unwrap();
        assert_eq!(b.as_bytes().len(), 24);
        assert_eq!(&b.as_bytes()[..4], &[1, 2, 3, 4]);
        assert_eq!(b.pixel(2, 1), clr);
        let white = SRgba8::new(9, 9, 9, 255);
        b.set_pixel(1, 1, white);
        assert_eq!(b.pixel(1, 1), white);
        assert_eq!(b.pixels()[4], white);
        assert_eq!(&b.as_bytes()[16..20], &[9, 9, 9, 255]);
    }

    #[test]
    fn from_bytes() {
        let data = vec![10, 20, 30, 40, 50, 60, 70, 80];
        let b = PixelBuffer::with_data(2, 1, data.clone()).unwrap();
        assert_eq!(b.pixel(1, 0), SRgba8::new(50, 60, 70, 80));
        assert_eq!(b.as_bytes(), &data[..]);
        assert_eq!(b.clone(), b);
    }
}
