// glyph.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Bitmap glyphs for the ASCII density ramp
//!
//! Each glyph is 5 pixels wide and 7 tall; one byte per row, with the
//! leftmost pixel in bit 4.

/// Glyph width in font pixels
const GLYPH_WIDTH: u32 = 5;

/// Glyph height in font pixels
const GLYPH_HEIGHT: u32 = 7;

/// Density ramp, indexed by inverted brightness
pub const RAMP: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Glyph bitmaps, in ramp order
const BITMAPS: [[u8; 7]; 10] = [
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
    [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
    [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
    [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
    [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000],
    [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
    [0b00000, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0b00000],
    [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010],
    [0b11000, 0b11001, 0b00010, 0b00100, 0b01000, 0b10011, 0b00011],
    [0b01110, 0b10001, 0b10111, 0b10101, 0b10111, 0b10000, 0b01110],
];

/// Glyph selected from the density ramp
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    /// Index into the ramp
    index: usize,
}

impl Glyph {
    /// Select a glyph for a brightness from 0 to 1.
    ///
    /// Full brightness selects the start of the ramp, zero the end.
    pub fn from_brightness(brightness: f32) -> Self {
        let last = (RAMP.len() - 1) as f32;
        let i = ((1.0 - brightness) * last).round().clamp(0.0, last);
        Glyph { index: i as usize }
    }

    /// Get the ramp index
    pub fn index(self) -> usize {
        self.index
    }

    /// Get the character
    pub fn ch(self) -> char {
        RAMP[self.index]
    }

    /// Check whether a pixel of a glyph scaled to a square cell is inked.
    ///
    /// The glyph spans the full cell height and is centered horizontally.
    pub fn covers(self, dx: u32, dy: u32, cell: u32) -> bool {
        debug_assert!(cell > 0);
        let width = ((cell * GLYPH_WIDTH + GLYPH_HEIGHT / 2) / GLYPH_HEIGHT)
            .max(1);
        let left = (cell - width) / 2;
        if dx < left || dx >= left + width || dy >= cell {
            return false;
        }
        let gx = (dx - left) * GLYPH_WIDTH / width;
        let gy = dy * GLYPH_HEIGHT / cell;
        let row = BITMAPS[self.index][gy as usize];
        row & (1 << (GLYPH_WIDTH - 1 - gx)) != 0
    }
}
