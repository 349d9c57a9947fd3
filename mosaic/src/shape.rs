// shape.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Shape rasterization for mosaic blocks
use crate::glyph::Glyph;
use crate::options::Shape;
use crate::color;
use crate::raster::PixelBuffer;
use pix::rgb::SRgb8;

/// Backdrop gray level for geometric shapes
pub const GEOMETRIC_BACKGROUND: u8 = 12;

/// Backdrop gray level for ASCII glyphs
pub const ASCII_BACKGROUND: u8 = 34;

/// Disc radius, relative to half the block size
const CIRCLE_SCALE: f32 = 0.85;

/// Cross bar thickness, relative to the block size
const CROSS_THICKNESS: f32 = 0.3;

/// Square region of a mosaic grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Left pixel
    pub x: u32,
    /// Top pixel
    pub y: u32,
    /// Width and height, before clipping
    pub size: u32,
}

impl Shape {
    /// Get the backdrop color for the shape family
    pub fn background(self) -> SRgb8 {
        let v = match self {
            Shape::Ascii => ASCII_BACKGROUND,
            _ => GEOMETRIC_BACKGROUND,
        };
        SRgb8::new(v, v, v)
    }

    /// Check whether a pixel within a block is covered by the shape.
    ///
    /// `dx` and `dy` are relative to the unclipped block origin.
    fn covers(self, dx: u32, dy: u32, size: u32, brightness: f32) -> bool {
        match self {
            Shape::Square => true,
            Shape::Circle => covers_circle(dx, dy, size),
            Shape::Diamond => covers_diamond(dx, dy, size),
            Shape::Cross => covers_cross(dx, dy, size),
            Shape::Ascii => {
                Glyph::from_brightness(brightness).covers(dx, dy, size)
            }
        }
    }
}

/// Get the offset of a pixel center from the block center
fn center_offset(d: u32, size: u32) -> f32 {
    d as f32 + 0.5 - size as f32 / 2.0
}

/// Check coverage of a disc inscribed in the block
fn covers_circle(dx: u32, dy: u32, size: u32) -> bool {
    let r = size as f32 / 2.0 * CIRCLE_SCALE;
    let (ox, oy) = (center_offset(dx, size), center_offset(dy, size));
    ox * ox + oy * oy <= r * r
}

/// Check coverage of a diamond with vertices 1 pixel in from edge midpoints.
///
/// The half-diagonal is never less than one pixel, so small blocks still
/// show a mark.
fn covers_diamond(dx: u32, dy: u32, size: u32) -> bool {
    let h = (size as f32 / 2.0 - 1.0).max(1.0);
    center_offset(dx, size).abs() + center_offset(dy, size).abs() <= h
}

/// Check coverage of two centered bars
fn covers_cross(dx: u32, dy: u32, size: u32) -> bool {
    let t = ((size as f32 * CROSS_THICKNESS).round() as u32).clamp(1, size);
    let start = (size - t) / 2;
    let bar = start..start + t;
    bar.contains(&dx) || bar.contains(&dy)
}

/// Paint one block of a mosaic.
///
/// Only pixels within the block, clipped to the target, are written.
/// Pixels not covered by the shape are left untouched.
pub fn paint(
    target: &mut PixelBuffer,
    block: Block,
    clr: SRgb8,
    brightness: f32,
    shape: Shape,
) {
    let x1 = block.x.saturating_add(block.size).min(target.width());
    let y1 = block.y.saturating_add(block.size).min(target.height());
    let rgba = color::opaque(clr);
    for y in block.y..y1 {
        for x in block.x..x1 {
            let (dx, dy) = (x - block.x, y - block.y);
            if shape.covers(dx, dy, block.size, brightness) {
                target.set_pixel(x, y, rgba);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pix::rgb::SRgba8;

    fn clear() -> SRgba8 {
        SRgba8::new(0, 0, 0, 0)
    }

    fn red() -> SRgba8 {
        SRgba8::new(255, 0, 0, 255)
    }

    fn painted(size: u32, shape: Shape, brightness: f32) -> PixelBuffer {
        let mut buf = PixelBuffer::with_color(size, size, clear()).unwrap();
        let block = Block { x: 0, y: 0, size };
        paint(&mut buf, block, SRgb8::new(255, 0, 0), brightness, shape);
        buf
    }

    fn count(buf: &PixelBuffer) -> usize {
        buf.pixels().iter().filter(|p| **p == red()).count()
    }

    #[test]
    fn square_fills() {
        assert_eq!(count(&painted(6, Shape::Square, 0.0)), 36);
    }

    #[test]
    fn circle_inside() {
        let buf = painted(10, Shape::Circle, 0.0);
        assert_eq!(buf.pixel(5, 5), red());
        assert_eq!(buf.pixel(0, 0), clear());
        assert_eq!(buf.pixel(9, 9), clear());
        assert_eq!(buf.pixel(9, 0), clear());
        let n = count(&buf);
        assert!(n > 40 && n < 100, "{n}");
    }

    #[test]
    fn diamond_inset() {
        let buf = painted(10, Shape::Diamond, 0.0);
        assert_eq!(buf.pixel(4, 4), red());
        // edge midpoints are inset by 1 pixel
        assert_eq!(buf.pixel(4, 0), clear());
        assert_eq!(buf.pixel(0, 4), clear());
        assert_eq!(buf.pixel(0, 0), clear());
        assert_eq!(buf.pixel(4, 1), red());
    }

    #[test]
    fn diamond_small_blocks() {
        assert_eq!(count(&painted(2, Shape::Diamond, 0.0)), 4);
        let buf = painted(3, Shape::Diamond, 0.0);
        assert_eq!(buf.pixel(1, 1), red());
        assert_eq!(buf.pixel(1, 0), red());
        assert_eq!(buf.pixel(0, 0), clear());
        assert_eq!(count(&buf), 5);
    }

    #[test]
    fn cross_bars() {
        let buf = painted(10, Shape::Cross, 0.0);
        // thickness 3, bars at 3..6
        assert_eq!(buf.pixel(4, 0), red());
        assert_eq!(buf.pixel(0, 4), red());
        assert_eq!(buf.pixel(0, 0), clear());
        assert_eq!(buf.pixel(2, 2), clear());
        assert_eq!(count(&buf), 10 * 3 * 2 - 9);
    }

    #[test]
    fn ascii_space_and_at() {
        assert_eq!(count(&painted(14, Shape::Ascii, 1.0)), 0);
        assert!(count(&painted(14, Shape::Ascii, 0.0)) > 0);
    }

    #[test]
    fn clipped_at_edges() {
        let mut buf = PixelBuffer::with_color(5, 3, clear()).unwrap();
        let block = Block { x: 4, y: 2, size: 4 };
        paint(&mut buf, block, SRgb8::new(255, 0, 0), 0.0, Shape::Square);
        assert_eq!(count(&buf), 1);
        assert_eq!(buf.pixel(4, 2), red());
    }

    #[test]
    fn backgrounds_differ() {
        assert_ne!(Shape::Ascii.background(), Shape::Circle.background());
        let v = GEOMETRIC_BACKGROUND;
        assert_eq!(Shape::Square.background(), SRgb8::new(v, v, v));
    }
}
