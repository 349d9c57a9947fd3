// private.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Private module for top-level items
use crate::budget::Budget;
use crate::{Result, decode, encode, raster::Frame};
use std::io::{Read, Write};

/// Default maximum image size, in pixels (not bytes)
const MAX_IMAGE_SZ: usize = 1 << 25;

/// GIF file decoder
///
/// Can be converted to one of three `Iterator`s:
/// * [into_iter] / [into_frames] for high-level composited [Frame]s
/// * [into_raw_frames] for mid-level [RawFrame]s
/// * [into_blocks] for low-level [Block]s
///
/// ## Example: Get the first frame of a GIF
/// ```
/// use mosaic::Decoder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let gif = &[
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
/// #   0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
/// #   0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
/// #   0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
/// #   0x10, 0x05, 0x00, 0x3b,
/// # ][..];
/// if let Some(frame) = Decoder::new(gif).into_frames().next() {
///     let frame = frame?;
///     assert_eq!(frame.width(), 2);
///     assert_eq!(frame.delay_ms(), 100);
/// }
/// # Ok(())
/// # }
/// ```
///
/// [Block]: block/enum.Block.html
/// [Frame]: struct.Frame.html
/// [RawFrame]: block/struct.RawFrame.html
/// [into_blocks]: struct.Decoder.html#method.into_blocks
/// [into_frames]: struct.Decoder.html#method.into_frames
/// [into_iter]: struct.Decoder.html#method.into_iter
/// [into_raw_frames]: struct.Decoder.html#method.into_raw_frames
pub struct Decoder<R: Read> {
    /// Reader for input data
    reader: R,
    /// Maximum image size, in pixels
    max_image_sz: Option<usize>,
    /// Operation budget
    budget: Budget,
}

impl<R: Read> Decoder<R> {
    /// Create a new GIF decoder.
    pub fn new(reader: R) -> Self {
        Decoder {
            reader,
            max_image_sz: Some(MAX_IMAGE_SZ),
            budget: Budget::unlimited(),
        }
    }

    /// Set the maximum image size, in pixels, to allow for decoding.
    ///
    /// Applies to each frame and to the logical screen.
    pub fn max_image_sz(mut self, max_image_sz: Option<usize>) -> Self {
        self.max_image_sz = max_image_sz;
        self
    }

    /// Set the operation budget.
    pub fn budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    /// Convert into a block `Iterator`.
    pub fn into_blocks(self) -> decode::Blocks<R> {
        decode::Blocks::new(self.reader, self.max_image_sz, self.budget)
    }

    /// Convert into a raw frame `Iterator`.
    pub fn into_raw_frames(self) -> decode::RawFrames<R> {
        decode::RawFrames::new(self.into_blocks())
    }

    /// Convert into a composited frame `Iterator`.
    pub fn into_frames(self) -> decode::Frames<R> {
        decode::Frames::new(self.into_raw_frames())
    }
}

impl<R: Read> IntoIterator for Decoder<R> {
    type Item = Result<Frame>;
    type IntoIter = decode::Frames<R>;

    /// Convert into a composited frame `Iterator`
    fn into_iter(self) -> Self::IntoIter {
        self.into_frames()
    }
}

/// GIF file encoder
///
/// Can be converted to one of two encoders:
/// * [into_frame_enc] for high-level [Frame]s
/// * [into_block_enc] for low-level [Block]s
///
/// ## Encoding Example
/// ```
/// use mosaic::{Encoder, Frame, PixelBuffer};
/// use pix::rgb::SRgba8;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut bytes = Vec::new();
/// let mut enc = Encoder::new(&mut bytes)
///     .into_frame_enc(4, 4)
///     .with_loop_count(Some(0));
/// for clr in [SRgba8::new(255, 0, 0, 255), SRgba8::new(0, 0, 255, 255)] {
///     let buffer = PixelBuffer::with_color(4, 4, clr)?;
///     enc.encode_frame(&Frame::new(buffer, 250))?;
/// }
/// enc.finish()?;
/// assert_eq!(&bytes[..6], b"GIF89a");
/// # Ok(())
/// # }
/// ```
///
/// [Block]: block/enum.Block.html
/// [Frame]: struct.Frame.html
/// [into_block_enc]: struct.Encoder.html#method.into_block_enc
/// [into_frame_enc]: struct.Encoder.html#method.into_frame_enc
pub struct Encoder<W: Write> {
    /// Writer for output data
    writer: W,
}

impl<W: Write> Encoder<W> {
    /// Create a new GIF encoder.
    pub fn new(writer: W) -> Self {
        Encoder { writer }
    }

    /// Convert into a block encoder.
    pub fn into_block_enc(self) -> encode::BlockEnc<W> {
        encode::BlockEnc::new(self.writer)
    }

    /// Convert into a frame encoder for a screen size.
    pub fn into_frame_enc(self, width: u16, height: u16) -> encode::FrameEnc<W> {
        encode::FrameEnc::new(self.into_block_enc(), width, height)
    }
}
