// decode.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! GIF file decoding
use crate::block::*;
use crate::budget::Budget;
use crate::color;
use crate::error::{Error, Result};
use crate::lzw::{Decompressor, MAX_MIN_CODE_BITS};
use crate::private::Decoder;
use crate::raster::{DEFAULT_DELAY_MS, Frame, PixelBuffer};
use pix::rgb::SRgba8;
use std::io::{BufReader, Read};

/// Size of a Header block
const HEADER_SZ: usize = 6;

/// Size of a Logical Screen Descriptor block
const SCREEN_DESC_SZ: usize = 7;

/// Size of an Image Descriptor block, after the signature
const IMAGE_DESC_SZ: usize = 9;

/// Size of a Graphic Control extension sub-block
const GRAPHIC_CONTROL_SZ: usize = 4;

/// Interlaced row passes: (first row, row step)
const INTERLACE_PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Blocks which must follow the previous block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expected {
    Header,
    ScreenDesc,
    GlobalColorTable(usize),
    LocalColorTable(usize),
    ImageData,
}

/// An `Iterator` for [Block]s within a GIF file.
///
/// Build with Decoder.[into_blocks].
///
/// [Block]: block/enum.Block.html
/// [into_blocks]: struct.Decoder.html#method.into_blocks
pub struct Blocks<R: Read> {
    /// Buffered reader
    reader: BufReader<R>,
    /// Maximum image size, in pixels
    max_image_sz: Option<usize>,
    /// Operation budget
    budget: Budget,
    /// Next expected block
    expected: Option<Expected>,
    /// Size of the current image, in pixels
    image_sz: usize,
    /// Iteration ended (trailer or error)
    done: bool,
}

impl<R: Read> Iterator for Blocks<R> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let res = self.next_block();
        match &res {
            Ok(Block::Trailer(_)) | Err(_) => self.done = true,
            _ => (),
        }
        Some(res)
    }
}

impl<R: Read> Blocks<R> {
    /// Create a new block iterator
    pub(crate) fn new(
        reader: R,
        max_image_sz: Option<usize>,
        budget: Budget,
    ) -> Self {
        Blocks {
            reader: BufReader::new(reader),
            max_image_sz,
            budget,
            expected: Some(Expected::Header),
            image_sz: 0,
            done: false,
        }
    }

    /// Get the maximum image size, in pixels
    pub(crate) fn max_image_sz(&self) -> Option<usize> {
        self.max_image_sz
    }

    /// Read an exact number of bytes
    fn read_buf(&mut self, sz: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; sz];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read one byte
    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0];
        self.reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read one sub-block, returning `None` for the block terminator
    fn read_sub_block(&mut self) -> Result<Option<Vec<u8>>> {
        self.budget.check()?;
        match self.read_u8()? {
            0 => Ok(None),
            sz => Ok(Some(self.read_buf(sz.into())?)),
        }
    }

    /// Read sub-blocks up to the terminator
    fn read_sub_blocks(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut sub_blocks = vec![];
        while let Some(b) = self.read_sub_block()? {
            sub_blocks.push(b);
        }
        Ok(sub_blocks)
    }

    /// Decode the next block (including all sub-blocks)
    fn next_block(&mut self) -> Result<Block> {
        self.budget.check()?;
        let block = match self.expected.take() {
            Some(Expected::Header) => {
                let buf = self.read_buf(HEADER_SZ)?;
                self.expected = Some(Expected::ScreenDesc);
                Header::from_buf(&buf)?.into()
            }
            Some(Expected::ScreenDesc) => {
                let buf = self.read_buf(SCREEN_DESC_SZ)?;
                let b = ScreenDesc::from_buf(&buf);
                let len = b.color_table_len();
                if len > 0 {
                    self.expected = Some(Expected::GlobalColorTable(len));
                }
                b.into()
            }
            Some(Expected::GlobalColorTable(len)) => {
                let buf = self.read_buf(len * 3)?;
                Block::GlobalColorTable(ColorTable::with_colors(&buf))
            }
            Some(Expected::LocalColorTable(len)) => {
                let buf = self.read_buf(len * 3)?;
                self.expected = Some(Expected::ImageData);
                Block::LocalColorTable(ColorTable::with_colors(&buf))
            }
            Some(Expected::ImageData) => self.decode_image_data()?.into(),
            None => self.decode_signature()?,
        };
        debug!("  block  : {:?}", BlockName(&block));
        Ok(block)
    }

    /// Decode a block starting with a signature byte
    fn decode_signature(&mut self) -> Result<Block> {
        match BlockCode::from_u8(self.read_u8()?) {
            Some(BlockCode::ImageDesc_) => {
                let buf = self.read_buf(IMAGE_DESC_SZ)?;
                let b = ImageDesc::from_buf(&buf);
                self.check_image_sz(&b)?;
                let len = b.color_table_len();
                self.expected = if len > 0 {
                    Some(Expected::LocalColorTable(len))
                } else {
                    Some(Expected::ImageData)
                };
                Ok(b.into())
            }
            Some(BlockCode::Extension_) => self.decode_extension(),
            Some(BlockCode::Trailer_) => Ok(Trailer::default().into()),
            None => Err(Error::InvalidBlockCode),
        }
    }

    /// Check image size against the maximum
    fn check_image_sz(&mut self, b: &ImageDesc) -> Result<()> {
        self.image_sz = b.image_sz();
        match self.max_image_sz {
            Some(sz) if self.image_sz > sz => Err(Error::TooLargeImage),
            _ => Ok(()),
        }
    }

    /// Decode an extension block
    fn decode_extension(&mut self) -> Result<Block> {
        let label = self.read_u8()?;
        let sub_blocks = self.read_sub_blocks()?;
        Ok(match ExtensionCode::from(label) {
            ExtensionCode::GraphicControl_ => {
                GraphicControl::from_sub_blocks(&sub_blocks)?.into()
            }
            ExtensionCode::Comment_ => {
                let mut b = Comment::default();
                sub_blocks.iter().for_each(|c| b.add_comment(c));
                b.into()
            }
            ExtensionCode::Application_ => {
                let mut b = Application::default();
                sub_blocks.iter().for_each(|c| b.add_app_data(c));
                b.into()
            }
            ExtensionCode::Unknown_(n) => {
                let mut b = Unknown::new(n);
                sub_blocks.iter().for_each(|c| b.add_sub_block(c));
                b.into()
            }
        })
    }

    /// Decode an Image Data block, decompressing all sub-blocks
    fn decode_image_data(&mut self) -> Result<ImageData> {
        let min_code_size = self.read_u8()?;
        if min_code_size == 0 || min_code_size > MAX_MIN_CODE_BITS {
            return Err(Error::InvalidCodeSize);
        }
        let mut dec = Decompressor::new(min_code_size);
        let mut data = Vec::with_capacity(self.image_sz);
        let mut extra = false;
        while let Some(buf) = self.read_sub_block()? {
            if dec.is_ended() {
                extra = true;
                continue;
            }
            dec.decompress(&buf, &mut data)?;
            if data.len() > self.image_sz {
                extra = true;
                data.truncate(self.image_sz);
            }
        }
        if extra {
            warn!("extra image data truncated");
        }
        if data.len() < self.image_sz {
            return Err(Error::IncompleteImageData);
        }
        Ok(ImageData::new(min_code_size, data))
    }
}

/// Short block name for trace logging
struct BlockName<'a>(&'a Block);

impl std::fmt::Debug for BlockName<'_> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.0 {
            Block::ImageData(b) => {
                write!(fmt, "ImageData ({} pixels)", b.data().len())
            }
            Block::GlobalColorTable(t) | Block::LocalColorTable(t) => {
                write!(fmt, "ColorTable ({} entries)", t.len())
            }
            b => write!(fmt, "{b:?}"),
        }
    }
}

/// An `Iterator` for [RawFrame]s within a GIF file.
///
/// Build with Decoder.[into_raw_frames].
///
/// [RawFrame]: block/struct.RawFrame.html
/// [into_raw_frames]: struct.Decoder.html#method.into_raw_frames
pub struct RawFrames<R: Read> {
    /// Block iterator
    blocks: Blocks<R>,
    /// Preamble blocks, while reading them
    preamble: Option<Preamble>,
    /// Preamble was already read
    started: bool,
    /// Graphic control for the next frame
    graphic_control_ext: Option<GraphicControl>,
    /// Image descriptor for the next frame
    image_desc: Option<ImageDesc>,
    /// Local color table for the next frame
    local_color_table: Option<ColorTable>,
}

impl<R: Read> Iterator for RawFrames<R> {
    type Item = Result<RawFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.started = true;
        while let Some(block) = self.blocks.next() {
            match block.and_then(|b| self.handle_block(b)) {
                Ok(Some(f)) => return Some(Ok(f)),
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

impl<R: Read> RawFrames<R> {
    /// Create a new raw frame iterator
    pub(crate) fn new(blocks: Blocks<R>) -> Self {
        RawFrames {
            blocks,
            preamble: None,
            started: false,
            graphic_control_ext: None,
            image_desc: None,
            local_color_table: None,
        }
    }

    /// Get the maximum image size, in pixels
    pub(crate) fn max_image_sz(&self) -> Option<usize> {
        self.blocks.max_image_sz()
    }

    /// Read preamble blocks.
    ///
    /// These are the blocks at the beginning of the file, before any frame
    /// blocks.  Returns `None` if frames have already been read.
    pub fn preamble(&mut self) -> Result<Option<Preamble>> {
        if self.started {
            return Ok(None);
        }
        self.started = true;
        self.preamble = Some(Preamble::default());
        while !self.has_frame() {
            match self.blocks.next() {
                Some(block) => {
                    self.handle_block(block?)?;
                }
                None => break,
            }
        }
        Ok(self.preamble.take())
    }

    /// Check if any frame blocks exist
    fn has_frame(&self) -> bool {
        self.graphic_control_ext.is_some() || self.image_desc.is_some()
    }

    /// Handle one block
    fn handle_block(&mut self, block: Block) -> Result<Option<RawFrame>> {
        match block {
            Block::Header(b) => {
                if let Some(p) = &mut self.preamble {
                    p.header = b;
                }
            }
            Block::ScreenDesc(b) => {
                if let Some(p) = &mut self.preamble {
                    p.screen_desc = b;
                }
            }
            Block::GlobalColorTable(b) => {
                if let Some(p) = &mut self.preamble {
                    p.global_color_table = Some(b);
                }
            }
            Block::Application(b) => {
                if let (Some(p), Some(_)) = (&mut self.preamble, b.loop_count())
                {
                    p.loop_count_ext = Some(b);
                }
            }
            Block::Comment(b) => {
                if let Some(p) = &mut self.preamble {
                    p.comments.push(b);
                }
            }
            Block::GraphicControl(b) => {
                if self.has_frame() {
                    return Err(Error::InvalidBlockSequence);
                }
                self.graphic_control_ext = Some(b);
            }
            Block::ImageDesc(b) => {
                if self.image_desc.is_some() {
                    return Err(Error::InvalidBlockSequence);
                }
                self.image_desc = Some(b);
            }
            Block::LocalColorTable(b) => {
                self.local_color_table = Some(b);
            }
            Block::ImageData(image_data) => {
                let image_desc = self
                    .image_desc
                    .take()
                    .ok_or(Error::InvalidBlockSequence)?;
                return Ok(Some(RawFrame {
                    graphic_control_ext: self.graphic_control_ext.take(),
                    image_desc,
                    local_color_table: self.local_color_table.take(),
                    image_data,
                }));
            }
            Block::Unknown(b) => {
                debug!("skipping extension {:02X}", b.ext_id());
            }
            Block::Trailer(_) => {
                if self.has_frame() {
                    return Err(Error::InvalidBlockSequence);
                }
            }
        }
        Ok(None)
    }
}

/// An `Iterator` for composited [Frame]s of a GIF animation.
///
/// Each frame is a full-screen RGBA buffer, independent of all others.
///
/// Build with Decoder.[into_frames].
///
/// [Frame]: struct.Frame.html
/// [into_frames]: struct.Decoder.html#method.into_frames
pub struct Frames<R: Read> {
    /// Raw frame iterator
    raw_frames: RawFrames<R>,
    /// File preamble
    preamble: Option<Preamble>,
    /// Canvas of composited frames
    canvas: Option<PixelBuffer>,
    /// Disposal pending from the previous frame
    disposal: Option<Disposal>,
    /// Iteration ended with an error
    failed: bool,
}

/// Disposal of a previous frame
enum Disposal {
    /// Clear a rectangle to transparent
    Background(ImageDesc),
    /// Restore the saved canvas
    Previous(PixelBuffer),
}

impl<R: Read> Iterator for Frames<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let res = self.next_frame().transpose();
        if let Some(Err(_)) = res {
            self.failed = true;
        }
        res
    }
}

impl<R: Read> Frames<R> {
    /// Create a new frame iterator
    pub(crate) fn new(raw_frames: RawFrames<R>) -> Self {
        Frames {
            raw_frames,
            preamble: None,
            canvas: None,
            disposal: None,
            failed: false,
        }
    }

    /// Get the preamble, reading it if necessary
    pub fn preamble(&mut self) -> Result<&Preamble> {
        if self.preamble.is_none() {
            let preamble = self.raw_frames.preamble()?.unwrap_or_default();
            let (width, height) = (
                u32::from(preamble.screen_width()),
                u32::from(preamble.screen_height()),
            );
            if width == 0 || height == 0 {
                return Err(Error::InvalidFrameDimensions);
            }
            let screen_sz = width as usize * height as usize;
            if self.raw_frames.max_image_sz().is_some_and(|sz| screen_sz > sz)
            {
                return Err(Error::TooLargeImage);
            }
            self.canvas =
                Some(PixelBuffer::with_color(width, height, SRgba8::default())?);
            self.preamble = Some(preamble);
        }
        self.preamble.as_ref().ok_or(Error::InvalidBlockSequence)
    }

    /// Get the logical screen size (after the preamble is read)
    pub fn screen_size(&self) -> Option<(u32, u32)> {
        self.canvas.as_ref().map(|c| (c.width(), c.height()))
    }

    /// Get the loop count (after the preamble is read).
    ///
    /// Zero means loop forever; `None` means play once.
    pub fn loop_count(&self) -> Option<u16> {
        self.preamble.as_ref().and_then(|p| p.loop_count())
    }

    /// Decode and composite the next frame
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.preamble()?;
        let raw = match self.raw_frames.next() {
            Some(raw) => raw?,
            None => return Ok(None),
        };
        let global = self
            .preamble
            .as_ref()
            .and_then(|p| p.global_color_table.as_ref());
        let canvas = self.canvas.as_mut().ok_or(Error::InvalidBlockSequence)?;
        match self.disposal.take() {
            Some(Disposal::Background(desc)) => clear_rect(canvas, &desc),
            Some(Disposal::Previous(saved)) => *canvas = saved,
            None => (),
        }
        check_bounds(canvas, &raw.image_desc)?;
        let table = raw
            .local_color_table
            .as_ref()
            .or(global)
            .ok_or(Error::MissingColorTable)?;
        self.disposal = match raw.disposal_method() {
            DisposalMethod::Background => {
                Some(Disposal::Background(raw.image_desc.clone()))
            }
            DisposalMethod::Previous => Some(Disposal::Previous(canvas.clone())),
            _ => None,
        };
        render(canvas, &raw, table)?;
        let delay_ms = match raw.delay_time_cs() {
            0 => DEFAULT_DELAY_MS,
            cs => u32::from(cs) * 10,
        };
        debug!(
            "frame {}x{} at {},{}: {delay_ms} ms",
            raw.image_desc.width(),
            raw.image_desc.height(),
            raw.image_desc.left(),
            raw.image_desc.top(),
        );
        Ok(Some(Frame::new(canvas.clone(), delay_ms)))
    }
}

/// Check that a frame rectangle lies within the canvas
fn check_bounds(canvas: &PixelBuffer, desc: &ImageDesc) -> Result<()> {
    let right = u32::from(desc.left()) + u32::from(desc.width());
    let bottom = u32::from(desc.top()) + u32::from(desc.height());
    if right > canvas.width() || bottom > canvas.height() {
        return Err(Error::InvalidFrameDimensions);
    }
    Ok(())
}

/// Clear a frame rectangle to transparent
fn clear_rect(canvas: &mut PixelBuffer, desc: &ImageDesc) {
    let (left, top) = (u32::from(desc.left()), u32::from(desc.top()));
    for y in top..top + u32::from(desc.height()) {
        for x in left..left + u32::from(desc.width()) {
            canvas.set_pixel(x, y, SRgba8::default());
        }
    }
}

/// Get destination rows in the order they are stored
fn row_order(height: usize, interlaced: bool) -> Vec<usize> {
    if interlaced {
        INTERLACE_PASSES
            .iter()
            .flat_map(|&(start, step)| (start..height).step_by(step))
            .collect()
    } else {
        (0..height).collect()
    }
}

/// Render a raw frame onto the canvas
fn render(
    canvas: &mut PixelBuffer,
    raw: &RawFrame,
    table: &ColorTable,
) -> Result<()> {
    let desc = &raw.image_desc;
    let width = usize::from(desc.width());
    if width == 0 {
        return Ok(());
    }
    let transparent = raw.transparent_color();
    let (left, top) = (u32::from(desc.left()), u32::from(desc.top()));
    let rows = row_order(usize::from(desc.height()), desc.interlaced());
    for (row, indices) in rows.into_iter().zip(raw.image_data.data().chunks(width))
    {
        let y = top + row as u32;
        for (col, &idx) in indices.iter().enumerate() {
            if Some(idx) == transparent {
                continue;
            }
            let clr = table.rgb(idx.into()).ok_or(Error::InvalidColorIndex)?;
            canvas.set_pixel(left + col as u32, y, color::opaque(clr));
        }
    }
    Ok(())
}

/// Decode every frame of a GIF animation.
///
/// Either all frames are returned or the first error; never a truncated
/// sequence.
pub fn decode(bytes: &[u8]) -> Result<Vec<Frame>> {
    let frames = Decoder::new(bytes)
        .into_frames()
        .collect::<Result<Vec<_>>>()?;
    if frames.is_empty() {
        return Err(Error::NoFrames);
    }
    Ok(frames)
}

impl Header {
    /// Decode a Header block from a buffer
    fn from_buf(buf: &[u8]) -> Result<Self> {
        debug_assert_eq!(buf.len(), HEADER_SZ);
        if &buf[..3] != b"GIF" {
            return Err(Error::MalformedHeader);
        }
        let version = [buf[3], buf[4], buf[5]];
        match &version {
            b"87a" | b"89a" => Ok(Header::with_version(version)),
            _ => Err(Error::UnsupportedVersion(version)),
        }
    }
}

impl ScreenDesc {
    /// Decode a Logical Screen Descriptor block from a buffer
    fn from_buf(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), SCREEN_DESC_SZ);
        ScreenDesc::default()
            .with_screen_width(u16::from_le_bytes([buf[0], buf[1]]))
            .with_screen_height(u16::from_le_bytes([buf[2], buf[3]]))
            .with_flags(buf[4])
            .with_background_color_idx(buf[5])
            .with_pixel_aspect_ratio(buf[6])
    }
}

impl ImageDesc {
    /// Decode an Image Descriptor block from a buffer
    fn from_buf(buf: &[u8]) -> Self {
        debug_assert_eq!(buf.len(), IMAGE_DESC_SZ);
        ImageDesc::default()
            .with_left(u16::from_le_bytes([buf[0], buf[1]]))
            .with_top(u16::from_le_bytes([buf[2], buf[3]]))
            .with_width(u16::from_le_bytes([buf[4], buf[5]]))
            .with_height(u16::from_le_bytes([buf[6], buf[7]]))
            .with_flags(buf[8])
    }
}

impl GraphicControl {
    /// Decode a Graphic Control extension from its sub-blocks
    fn from_sub_blocks(sub_blocks: &[Vec<u8>]) -> Result<Self> {
        match sub_blocks {
            [buf] if buf.len() == GRAPHIC_CONTROL_SZ => {
                let mut b = GraphicControl::default();
                b.set_flags(buf[0]);
                b.set_delay_time_cs(u16::from_le_bytes([buf[1], buf[2]]));
                b.set_transparent_color_idx(buf[3]);
                Ok(b)
            }
            _ => Err(Error::MalformedGraphicControlExtension),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rgba(r: u8, g: u8, b: u8, a: u8) -> SRgba8 {
        SRgba8::new(r, g, b, a)
    }

    /// 10x10 sample image from the GIF89a specification
    const SAMPLE: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x0A, 0x00, 0x0A, 0x00, 0x91,
        0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF,
        0x00, 0x00, 0x00, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x2C, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x0A, 0x00, 0x00, 0x02,
        0x16, 0x8C, 0x2D, 0x99, 0x87, 0x2A, 0x1C, 0xDC, 0x33, 0xA0, 0x02,
        0x75, 0xEC, 0x95, 0xFA, 0xA8, 0xDE, 0x60, 0x8C, 0x04, 0x91, 0x4C,
        0x01, 0x00, 0x3B,
    ];

    #[rustfmt::skip]
    const SAMPLE_INDICES: [u8; 100] = [
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
        1, 1, 1, 0, 0, 0, 0, 2, 2, 2,
        1, 1, 1, 0, 0, 0, 0, 2, 2, 2,
        2, 2, 2, 0, 0, 0, 0, 1, 1, 1,
        2, 2, 2, 0, 0, 0, 0, 1, 1, 1,
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
    ];

    /// Build a GIF with 2x1 frames: 2 color global table, one frame per
    /// (delay, transparent index, disposal, indices) tuple
    fn build_gif(frames: &[(u16, Option<u8>, u8, [u8; 2])]) -> Vec<u8> {
        let mut gif = b"GIF89a".to_vec();
        gif.extend([2, 0, 1, 0, 0x80, 0, 0]);
        gif.extend([0xFF, 0, 0, 0, 0, 0xFF]);
        for &(delay, trn, disposal, indices) in frames {
            let flags = (disposal << 2) | u8::from(trn.is_some());
            let [lo, hi] = delay.to_le_bytes();
            gif.extend([0x21, 0xF9, 4, flags, lo, hi, trn.unwrap_or(0), 0]);
            gif.extend([0x2C, 0, 0, 0, 0, 2, 0, 1, 0, 0]);
            let mut packed = vec![];
            crate::lzw::Compressor::new(2).compress(&indices, &mut packed);
            gif.push(2);
            gif.push(packed.len() as u8);
            gif.extend(packed);
            gif.push(0);
        }
        gif.push(0x3B);
        gif
    }

    #[test]
    fn sample_blocks() -> Result<()> {
        let blocks = Decoder::new(SAMPLE)
            .into_blocks()
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(blocks.len(), 7);
        assert_eq!(blocks[0], Header::with_version(*b"89a").into());
        match &blocks[5] {
            Block::ImageData(b) => assert_eq!(b.data(), &SAMPLE_INDICES[..]),
            b => panic!("unexpected block {b:?}"),
        }
        assert_eq!(blocks[6], Trailer::default().into());
        Ok(())
    }

    #[test]
    fn sample_frame() -> Result<()> {
        let frames = decode(SAMPLE)?;
        assert_eq!(frames.len(), 1);
        let f = &frames[0];
        assert_eq!((f.width(), f.height()), (10, 10));
        assert_eq!(f.delay_ms(), DEFAULT_DELAY_MS);
        assert_eq!(f.buffer().pixel(0, 0), rgba(255, 0, 0, 255));
        assert_eq!(f.buffer().pixel(9, 0), rgba(0, 0, 255, 255));
        assert_eq!(f.buffer().pixel(4, 4), rgba(255, 255, 255, 255));
        Ok(())
    }

    #[test]
    fn delays_in_ms() -> Result<()> {
        let gif = build_gif(&[
            (0, None, 1, [0, 1]),
            (50, None, 1, [1, 0]),
            (200, None, 1, [0, 0]),
        ]);
        let delays: Vec<_> = decode(&gif)?.iter().map(|f| f.delay_ms()).collect();
        assert_eq!(delays, [100, 500, 2000]);
        Ok(())
    }

    #[test]
    fn transparency_and_disposal() -> Result<()> {
        let gif = build_gif(&[
            (10, None, 1, [0, 1]),
            // index 0 transparent: right pixel keeps blue
            (10, Some(0), 2, [1, 0]),
            // drawn onto the cleared background, then restored
            (10, Some(1), 3, [0, 1]),
            (10, Some(1), 1, [1, 1]),
        ]);
        let frames = decode(&gif)?;
        let px = |i: usize| {
            let b = frames[i].buffer();
            (b.pixel(0, 0), b.pixel(1, 0))
        };
        let (red, blue) = (rgba(255, 0, 0, 255), rgba(0, 0, 255, 255));
        let clear = rgba(0, 0, 0, 0);
        assert_eq!(px(0), (red, blue));
        assert_eq!(px(1), (blue, blue));
        assert_eq!(px(2), (red, clear));
        assert_eq!(px(3), (clear, clear));
        Ok(())
    }

    #[test]
    fn interlaced_rows() {
        assert_eq!(row_order(3, false), [0, 1, 2]);
        assert_eq!(
            row_order(10, true),
            [0, 8, 4, 2, 6, 1, 3, 5, 7, 9]
        );
    }

    #[test]
    fn loop_count() -> Result<()> {
        let mut gif = build_gif(&[(10, None, 0, [0, 1])]);
        let ext = [
            0x21, 0xFF, 11, b'N', b'E', b'T', b'S', b'C', b'A', b'P', b'E',
            b'2', b'.', b'0', 3, 1, 5, 0, 0,
        ];
        gif.splice(19..19, ext);
        let mut frames = Decoder::new(&gif[..]).into_frames();
        assert_eq!(frames.preamble()?.loop_count(), Some(5));
        assert_eq!(frames.loop_count(), Some(5));
        assert_eq!(frames.screen_size(), Some((2, 1)));
        assert_eq!(frames.count(), 1);
        Ok(())
    }

    #[test]
    fn bad_signature() {
        assert!(matches!(decode(b"PNG89a"), Err(Error::MalformedHeader)));
        assert!(matches!(
            decode(b"GIF90a\0\0"),
            Err(Error::UnsupportedVersion(_))
        ));
        assert!(matches!(decode(b"GI"), Err(Error::UnexpectedEndOfFile)));
    }

    #[test]
    fn truncated() {
        for len in [8, 20, 30, 40, 50, SAMPLE.len() - 3] {
            let res = decode(&SAMPLE[..len]);
            let err = res.err().map(|e| e.kind());
            assert_eq!(err, Some(crate::ErrorKind::Format), "len {len}");
        }
    }

    #[test]
    fn no_frames() {
        let gif = build_gif(&[]);
        assert!(matches!(decode(&gif), Err(Error::NoFrames)));
    }

    #[test]
    fn frame_outside_screen() {
        let mut gif = build_gif(&[(10, None, 0, [0, 1])]);
        // move the frame one pixel right
        gif[28] = 1;
        assert!(matches!(decode(&gif), Err(Error::InvalidFrameDimensions)));
    }

    #[test]
    fn bad_color_index() {
        let gif = build_gif(&[(10, None, 0, [0, 3])]);
        assert!(matches!(decode(&gif), Err(Error::InvalidColorIndex)));
    }

    #[test]
    fn too_large() {
        let res = Decoder::new(SAMPLE)
            .max_image_sz(Some(99))
            .into_frames()
            .collect::<Result<Vec<_>>>();
        assert!(matches!(res, Err(Error::TooLargeImage)));
    }

    #[test]
    fn screen_too_large() {
        let mut gif = build_gif(&[(10, None, 0, [0, 1])]);
        // 65535 x 65535 screen around a 2x1 frame
        gif[6..10].copy_from_slice(&[0xFF; 4]);
        let res = Decoder::new(&gif[..])
            .max_image_sz(Some(1 << 20))
            .into_frames()
            .collect::<Result<Vec<_>>>();
        assert!(matches!(res, Err(Error::TooLargeImage)));
        assert!(matches!(decode(&gif), Err(Error::TooLargeImage)));
    }

    #[test]
    fn budget_exceeded() {
        let res = Decoder::new(SAMPLE)
            .budget(Budget::with_timeout(std::time::Duration::ZERO))
            .into_frames()
            .collect::<Result<Vec<_>>>();
        assert!(matches!(res, Err(Error::BudgetExceeded)));
    }

    #[test]
    fn fused_after_error() {
        let mut blocks = Decoder::new(&b"XIF89a"[..]).into_blocks();
        assert!(blocks.next().is_some_and(|b| b.is_err()));
        assert!(blocks.next().is_none());
    }
}
