// lib.rs      mosaic crate.
//
// Copyright (c) 2025  Douglas Lau
//
//! Pixel-art mosaic transform for still images and animated GIFs.
//!
//! A source image is divided into square blocks; each block samples one
//! pixel, maps its color (grayscale, color quantization or a fixed
//! palette) and paints a shape.  Animations are decoded, transformed frame
//! by frame in parallel, and re-encoded.
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod block;
mod budget;
pub mod color;
mod decode;
mod encode;
mod error;
mod glyph;
mod lzw;
mod options;
mod palette;
mod pipeline;
mod private;
mod raster;
mod shape;
mod transform;

pub use crate::budget::Budget;
pub use crate::decode::{Blocks, Frames, RawFrames, decode};
pub use crate::encode::{BlockEnc, FrameEnc, encode};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::glyph::{Glyph, RAMP};
pub use crate::options::{
    BLOCK_SIZES, ColorMode, ColorModeKind, LEVELS, MosaicOptions,
    OptionsBuilder, Shape,
};
pub use crate::palette::Palette;
pub use crate::pipeline::{Animation, Artifact, Converter, RunState, RunToken};
pub use crate::private::{Decoder, Encoder};
pub use crate::raster::{DEFAULT_DELAY_MS, Frame, PixelBuffer};
pub use crate::transform::transform;
