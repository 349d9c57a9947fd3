// encode.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! GIF file encoding
use crate::block::*;
use crate::budget::Budget;
use crate::color;
use crate::error::{Error, Result};
use crate::lzw::Compressor;
use crate::private::Encoder;
use crate::raster::{Frame, PixelBuffer};
use pix::Palette;
use pix::rgb::SRgb8;
use std::io::{self, BufWriter, Write};

/// Maximum number of entries in a color table
const MAX_COLORS: usize = 256;

/// Maximum length of a sub-block
const SUB_BLOCK_SZ: usize = 255;

/// Encoder for writing [Block]s into a GIF file.
///
/// Build with Encoder.[into_block_enc].
///
/// [Block]: block/enum.Block.html
/// [into_block_enc]: struct.Encoder.html#method.into_block_enc
pub struct BlockEnc<W: Write> {
    /// Buffered writer
    writer: BufWriter<W>,
}

impl<W: Write> BlockEnc<W> {
    /// Create a new block encoder
    pub(crate) fn new(writer: W) -> Self {
        BlockEnc {
            writer: BufWriter::new(writer),
        }
    }

    /// Encode one block
    pub fn encode<B: Into<Block>>(&mut self, block: B) -> Result<()> {
        use crate::block::Block::*;
        let w = &mut self.writer;
        match block.into() {
            Header(b) => b.format(w),
            ScreenDesc(b) => b.format(w),
            GlobalColorTable(b) | LocalColorTable(b) => b.format(w),
            GraphicControl(b) => b.format(w),
            Comment(b) => format_extension(
                w,
                ExtensionCode::Comment_,
                b.comments(),
            ),
            Application(b) => format_extension(
                w,
                ExtensionCode::Application_,
                b.app_data(),
            ),
            Unknown(b) => format_extension(
                w,
                ExtensionCode::Unknown_(b.ext_id()),
                b.sub_blocks(),
            ),
            ImageDesc(b) => b.format(w),
            ImageData(b) => b.format(w),
            Trailer(_) => w.write_all(&[BlockCode::Trailer_.signature()]),
        }?;
        Ok(())
    }

    /// Flush buffered output
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Encoder for writing [Frame]s into a GIF file.
///
/// Each frame gets its own local color table, built from the exact colors
/// of its pixels.
///
/// Build with Encoder.[into_frame_enc].
///
/// [Frame]: struct.Frame.html
/// [into_frame_enc]: struct.Encoder.html#method.into_frame_enc
pub struct FrameEnc<W: Write> {
    /// Block encoder
    block_enc: BlockEnc<W>,
    /// Screen width
    width: u16,
    /// Screen height
    height: u16,
    /// Loop count (zero for forever)
    loop_count: Option<u16>,
    /// Operation budget
    budget: Budget,
    /// Number of frames encoded
    n_frames: usize,
}

impl<W: Write> FrameEnc<W> {
    /// Create a new frame encoder
    pub(crate) fn new(block_enc: BlockEnc<W>, width: u16, height: u16) -> Self {
        FrameEnc {
            block_enc,
            width,
            height,
            loop_count: None,
            budget: Budget::unlimited(),
            n_frames: 0,
        }
    }

    /// Set the loop count (zero for forever, `None` to play once)
    pub fn with_loop_count(mut self, loop_count: Option<u16>) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Set the operation budget
    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    /// Get the screen width
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Get the screen height
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Encode the preamble blocks
    fn encode_preamble(&mut self) -> Result<()> {
        self.block_enc.encode(Header::default())?;
        self.block_enc.encode(
            ScreenDesc::default()
                .with_screen_width(self.width)
                .with_screen_height(self.height)
                .with_color_table_len(0),
        )?;
        if let Some(loop_count) = self.loop_count {
            self.block_enc
                .encode(Application::with_loop_count(loop_count))?;
        }
        Ok(())
    }

    /// Encode one frame
    pub fn encode_frame(&mut self, frame: &Frame) -> Result<()> {
        self.budget.check()?;
        if frame.width() != u32::from(self.width)
            || frame.height() != u32::from(self.height)
        {
            return Err(Error::FrameSizeMismatch);
        }
        if self.n_frames == 0 {
            self.encode_preamble()?;
        }
        let (palette, indices) = index_colors(frame.buffer());
        let table_len = palette.len().clamp(2, MAX_COLORS).next_power_of_two();
        let mut control = GraphicControl::default();
        control.set_disposal_method(DisposalMethod::Keep);
        control.set_delay_time_cs(delay_cs(frame.delay_ms()));
        debug!(
            "frame {}: {} colors, {} cs",
            self.n_frames,
            palette.len(),
            control.delay_time_cs()
        );
        self.block_enc.encode(control)?;
        self.block_enc.encode(
            ImageDesc::default()
                .with_width(self.width)
                .with_height(self.height)
                .with_color_table_len(table_len),
        )?;
        let table = ColorTable::with_palette(&palette, table_len);
        self.block_enc.encode(Block::LocalColorTable(table))?;
        let min_code_size = (table_len_bits(table_len) + 1).max(2);
        self.block_enc
            .encode(ImageData::new(min_code_size, indices))?;
        self.n_frames += 1;
        Ok(())
    }

    /// Finish encoding, writing the trailer
    pub fn finish(mut self) -> Result<()> {
        if self.n_frames == 0 {
            return Err(Error::EmptyFrames);
        }
        self.block_enc.encode(Trailer::default())?;
        self.block_enc.flush()
    }
}

/// Convert a delay in milliseconds to centiseconds, rounding
fn delay_cs(delay_ms: u32) -> u16 {
    let cs = delay_ms.saturating_add(5) / 10;
    u16::try_from(cs).unwrap_or(u16::MAX)
}

/// Build a palette and indices for a pixel buffer.
///
/// Colors are added in first-seen order; once the palette is full,
/// remaining colors map to the nearest entry.  Alpha is ignored.
fn index_colors(buffer: &PixelBuffer) -> (Palette, Vec<u8>) {
    let mut palette = Palette::new(MAX_COLORS);
    let mut n_approx = 0;
    let mut last: Option<(SRgb8, u8)> = None;
    let mut indices = Vec::with_capacity(buffer.pixels().len());
    for px in buffer.pixels() {
        let clr = color::without_alpha(*px);
        let idx = match last {
            Some((c, idx)) if c == clr => idx,
            _ => {
                let idx = palette.set_entry(clr).unwrap_or_else(|| {
                    n_approx += 1;
                    color::nearest_index(palette.colors(), clr)
                        .unwrap_or_default()
                });
                // palettes never exceed 256 entries
                let idx = idx as u8;
                last = Some((clr, idx));
                idx
            }
        };
        indices.push(idx);
    }
    if n_approx > 0 {
        warn!("{n_approx} pixels past {MAX_COLORS} colors mapped to nearest");
    }
    (palette, indices)
}

/// Check frames against screen dimensions, before writing anything
pub(crate) fn check_frames(
    frames: &[Frame],
    width: u32,
    height: u32,
) -> Result<(u16, u16)> {
    if frames.is_empty() {
        return Err(Error::EmptyFrames);
    }
    let w = u16::try_from(width).map_err(|_| Error::TooLargeScreen)?;
    let h = u16::try_from(height).map_err(|_| Error::TooLargeScreen)?;
    if frames
        .iter()
        .any(|f| f.width() != width || f.height() != height)
    {
        return Err(Error::FrameSizeMismatch);
    }
    Ok((w, h))
}

/// Encode frames into a GIF animation.
///
/// Fails before writing any bytes if `frames` is empty or any frame does
/// not match `width` × `height`.
pub fn encode(frames: &[Frame], width: u32, height: u32) -> Result<Vec<u8>> {
    let (w, h) = check_frames(frames, width, height)?;
    let mut bytes = Vec::new();
    let mut enc = Encoder::new(&mut bytes).into_frame_enc(w, h);
    for frame in frames {
        enc.encode_frame(frame)?;
    }
    enc.finish()?;
    Ok(bytes)
}

/// Write an extension made of sub-blocks
fn format_extension<W: Write>(
    w: &mut BufWriter<W>,
    code: ExtensionCode,
    sub_blocks: &[Vec<u8>],
) -> io::Result<()> {
    w.write_all(&[BlockCode::Extension_.signature(), code.into()])?;
    for b in sub_blocks {
        debug_assert!(b.len() <= SUB_BLOCK_SZ);
        w.write_all(&[b.len() as u8])?;
        w.write_all(b)?;
    }
    w.write_all(&[0])
}

impl Header {
    fn format<W: Write>(&self, w: &mut BufWriter<W>) -> io::Result<()> {
        w.write_all(b"GIF")?;
        w.write_all(&self.version())
    }
}

impl ScreenDesc {
    fn format<W: Write>(&self, w: &mut BufWriter<W>) -> io::Result<()> {
        let mut buf = Vec::with_capacity(7);
        buf.extend_from_slice(&self.screen_width().to_le_bytes());
        buf.extend_from_slice(&self.screen_height().to_le_bytes());
        buf.push(self.flags());
        buf.push(self.background_color_idx());
        buf.push(self.pixel_aspect_ratio());
        w.write_all(&buf)
    }
}

impl ColorTable {
    fn format<W: Write>(&self, w: &mut BufWriter<W>) -> io::Result<()> {
        w.write_all(self.colors())
    }
}

impl GraphicControl {
    fn format<W: Write>(&self, w: &mut BufWriter<W>) -> io::Result<()> {
        let mut buf = Vec::with_capacity(8);
        buf.push(BlockCode::Extension_.signature());
        buf.push(ExtensionCode::GraphicControl_.into());
        buf.push(4); // block size
        buf.push(self.flags());
        buf.extend_from_slice(&self.delay_time_cs().to_le_bytes());
        buf.push(self.transparent_color_idx());
        buf.push(0); // block size
        w.write_all(&buf)
    }
}

impl ImageDesc {
    fn format<W: Write>(&self, w: &mut BufWriter<W>) -> io::Result<()> {
        let mut buf = Vec::with_capacity(10);
        buf.push(BlockCode::ImageDesc_.signature());
        buf.extend_from_slice(&self.left().to_le_bytes());
        buf.extend_from_slice(&self.top().to_le_bytes());
        buf.extend_from_slice(&self.width().to_le_bytes());
        buf.extend_from_slice(&self.height().to_le_bytes());
        buf.push(self.flags());
        w.write_all(&buf)
    }
}

impl ImageData {
    fn format<W: Write>(&self, w: &mut BufWriter<W>) -> io::Result<()> {
        let mut packed = Vec::with_capacity(self.data().len() / 2);
        Compressor::new(self.min_code_size()).compress(self.data(), &mut packed);
        w.write_all(&[self.min_code_size()])?;
        for chunk in packed.chunks(SUB_BLOCK_SZ) {
            w.write_all(&[chunk.len() as u8])?;
            w.write_all(chunk)?;
        }
        w.write_all(&[0])
    }
}
