// transform.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Mosaic pass: block sampling, color mapping and shape painting
use crate::color;
use crate::options::MosaicOptions;
use crate::raster::PixelBuffer;
use crate::shape::{self, Block};

/// Iterator over the blocks covering a buffer, in row-major order
#[derive(Clone, Debug)]
pub struct Blocks {
    width: u32,
    height: u32,
    size: u32,
    x: u32,
    y: u32,
}

impl Blocks {
    /// Create a block iterator for a buffer size
    pub fn new(width: u32, height: u32, size: u32) -> Self {
        debug_assert!(size > 0);
        Blocks {
            width,
            height,
            size,
            x: 0,
            y: 0,
        }
    }
}

impl Iterator for Blocks {
    type Item = Block;

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.height || self.width == 0 {
            return None;
        }
        let block = Block {
            x: self.x,
            y: self.y,
            size: self.size,
        };
        self.x = self.x.saturating_add(self.size);
        if self.x >= self.width {
            self.x = 0;
            self.y = self.y.saturating_add(self.size);
        }
        Some(block)
    }
}

/// Get the sample point of a block, clamped to the buffer
pub fn sample_point(block: Block, width: u32, height: u32) -> (u32, u32) {
    let half = block.size / 2;
    let x = block.x.saturating_add(half).min(width - 1);
    let y = block.y.saturating_add(half).min(height - 1);
    (x, y)
}

/// Transform a pixel buffer into a mosaic.
///
/// Each block takes the color of the single pixel at its center; no
/// averaging is done.  The source is not modified; the output has the same
/// dimensions and is fully opaque.
pub fn transform(source: &PixelBuffer, options: &MosaicOptions) -> PixelBuffer {
    let (width, height) = (source.width(), source.height());
    let shape = options.shape();
    let mut target = source.clone();
    target.fill(color::opaque(shape.background()));
    for block in Blocks::new(width, height, options.block_size()) {
        let (sx, sy) = sample_point(block, width, height);
        let clr = color::without_alpha(source.pixel(sx, sy));
        let mapped = color::map(clr, options.color_mode());
        let brightness = color::brightness(clr);
        shape::paint(&mut target, block, mapped, brightness, shape);
    }
    target
}
