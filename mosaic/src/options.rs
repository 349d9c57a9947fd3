// options.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Mosaic transform options
use crate::error::{Error, Result};
use crate::palette::Palette;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Legal block sizes, in pixels
pub const BLOCK_SIZES: RangeInclusive<u32> = 2..=50;

/// Legal quantization levels
pub const LEVELS: RangeInclusive<u8> = 2..=8;

/// Color mapping mode, with its parameters
#[derive(Clone, Debug, PartialEq)]
pub enum ColorMode {
    /// Luminance quantized to a number of gray levels
    Grayscale(u8),
    /// Each channel quantized to a number of levels
    Color(u8),
    /// Nearest entry of a palette
    Palette(Palette),
}

/// Color mode without parameters, as chosen in a user interface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorModeKind {
    /// See [ColorMode::Grayscale](enum.ColorMode.html#variant.Grayscale)
    Grayscale,
    /// See [ColorMode::Color](enum.ColorMode.html#variant.Color)
    Color,
    /// See [ColorMode::Palette](enum.ColorMode.html#variant.Palette)
    Palette,
}

/// Glyph painted into each block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shape {
    /// Whole block
    #[default]
    Square,
    /// Inscribed disc
    Circle,
    /// Square rotated 45 degrees
    Diamond,
    /// Cross-stitch bars
    Cross,
    /// Character from a density ramp
    Ascii,
}

/// Validated mosaic options.
///
/// Built with [OptionsBuilder::build] (or `default`), so every value is in
/// range and palette mode always carries its palette.
///
/// [OptionsBuilder::build]: struct.OptionsBuilder.html#method.build
#[derive(Clone, Debug, PartialEq)]
pub struct MosaicOptions {
    /// Block size in pixels
    block_size: u32,
    /// Color mapping mode
    color_mode: ColorMode,
    /// Block shape
    shape: Shape,
}

/// Unvalidated options, as edited by a user interface
#[derive(Clone, Debug, PartialEq)]
pub struct OptionsBuilder {
    block_size: u32,
    color_mode: ColorModeKind,
    levels: u8,
    palette: Option<Palette>,
    shape: Shape,
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        OptionsBuilder {
            block_size: 8,
            color_mode: ColorModeKind::Color,
            levels: 4,
            palette: None,
            shape: Shape::Square,
        }
    }
}

impl OptionsBuilder {
    /// Adjust the block size
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Adjust the color mode
    pub fn with_color_mode(mut self, color_mode: ColorModeKind) -> Self {
        self.color_mode = color_mode;
        self
    }

    /// Adjust the quantization levels (grayscale and color modes)
    pub fn with_levels(mut self, levels: u8) -> Self {
        self.levels = levels;
        self
    }

    /// Adjust the palette (palette mode)
    pub fn with_palette(mut self, palette: Option<Palette>) -> Self {
        self.palette = palette;
        self
    }

    /// Adjust the block shape
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Validate and build the options.
    ///
    /// Out of range values are rejected rather than clamped.  Levels are
    /// not checked in palette mode, where they have no meaning.
    pub fn build(self) -> Result<MosaicOptions> {
        if !BLOCK_SIZES.contains(&self.block_size) {
            return Err(Error::InvalidBlockSize(self.block_size));
        }
        let color_mode = match self.color_mode {
            ColorModeKind::Palette => match self.palette {
                Some(palette) if palette.is_empty() => {
                    return Err(Error::EmptyPalette)
                }
                Some(palette) => ColorMode::Palette(palette),
                None => return Err(Error::MissingPalette),
            },
            kind => {
                if !LEVELS.contains(&self.levels) {
                    return Err(Error::InvalidLevels(self.levels));
                }
                match kind {
                    ColorModeKind::Grayscale => {
                        ColorMode::Grayscale(self.levels)
                    }
                    _ => ColorMode::Color(self.levels),
                }
            }
        };
        Ok(MosaicOptions {
            block_size: self.block_size,
            color_mode,
            shape: self.shape,
        })
    }
}

impl Default for MosaicOptions {
    fn default() -> Self {
        MosaicOptions {
            block_size: 8,
            color_mode: ColorMode::Color(4),
            shape: Shape::Square,
        }
    }
}

impl MosaicOptions {
    /// Create a builder with default values
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Get the block size
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Get the color mode
    pub fn color_mode(&self) -> &ColorMode {
        &self.color_mode
    }

    /// Get the block shape
    pub fn shape(&self) -> Shape {
        self.shape
    }
}

impl FromStr for ColorModeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grayscale" | "gray" | "grey" => Ok(ColorModeKind::Grayscale),
            "color" | "colour" => Ok(ColorModeKind::Color),
            "palette" => Ok(ColorModeKind::Palette),
            _ => Err(format!("unknown color mode: {s}")),
        }
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "square" => Ok(Shape::Square),
            "circle" => Ok(Shape::Circle),
            "diamond" => Ok(Shape::Diamond),
            "cross" => Ok(Shape::Cross),
            "ascii" => Ok(Shape::Ascii),
            _ => Err(format!("unknown shape: {s}")),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Shape::Square => "square",
            Shape::Circle => "circle",
            Shape::Diamond => "diamond",
            Shape::Cross => "cross",
            Shape::Ascii => "ascii",
        };
        fmt.write_str(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let opt = MosaicOptions::builder().build().unwrap();
        assert_eq!(opt.block_size(), 8);
        assert_eq!(opt.color_mode(), &ColorMode::Color(4));
        assert_eq!(opt.shape(), Shape::Square);
        assert_eq!(opt, MosaicOptions::default());
    }

    #[test]
    fn block_size_range() {
        for bs in [0, 1, 51, 1000] {
            let res = MosaicOptions::builder().with_block_size(bs).build();
            assert!(matches!(res, Err(Error::InvalidBlockSize(b)) if b == bs));
        }
        for bs in [2, 25, 50] {
            let res = MosaicOptions::builder().with_block_size(bs).build();
            assert!(res.is_ok());
        }
    }

    #[test]
    fn levels_range() {
        for lv in [0, 1, 9] {
            let res = MosaicOptions::builder()
                .with_color_mode(ColorModeKind::Grayscale)
                .with_levels(lv)
                .build();
            assert!(matches!(res, Err(Error::InvalidLevels(_))));
        }
        let res = MosaicOptions::builder().with_levels(8).build().unwrap();
        assert_eq!(res.color_mode(), &ColorMode::Color(8));
    }

    #[test]
    fn palette_required() {
        let res = MosaicOptions::builder()
            .with_color_mode(ColorModeKind::Palette)
            .build();
        assert!(matches!(res, Err(Error::MissingPalette)));
        let game_boy = Palette::by_name("game-boy").unwrap();
        let opt = MosaicOptions::builder()
            .with_color_mode(ColorModeKind::Palette)
            .with_levels(0)
            .with_palette(Some(game_boy.clone()))
            .build()
            .unwrap();
        assert_eq!(opt.color_mode(), &ColorMode::Palette(game_boy));
    }

    #[test]
    fn parse() {
        assert_eq!("Diamond".parse::<Shape>(), Ok(Shape::Diamond));
        assert_eq!("ascii".parse::<Shape>(), Ok(Shape::Ascii));
        assert!("hexagon".parse::<Shape>().is_err());
        assert_eq!("grey".parse::<ColorModeKind>(), Ok(ColorModeKind::Grayscale));
        assert!("cmyk".parse::<ColorModeKind>().is_err());
    }
}
