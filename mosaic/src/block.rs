// block.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! GIF file block types
use crate::color;
use pix::Palette;
use pix::rgb::SRgb8;

/// Number of channels in a color table entry
const CHANNELS: usize = 3;

/// Disposal method, applied after a frame is displayed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisposalMethod {
    /// No disposal specified
    #[default]
    NoAction,
    /// Leave the frame on the canvas
    Keep,
    /// Clear the frame area to background
    Background,
    /// Restore the canvas to its state before the frame
    Previous,
    /// Reserved value
    Reserved(u8),
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            n => Reserved(n),
        }
    }
}

impl From<DisposalMethod> for u8 {
    fn from(d: DisposalMethod) -> Self {
        use self::DisposalMethod::*;
        match d {
            NoAction => 0,
            Keep => 1,
            Background => 2,
            Previous => 3,
            Reserved(n) => n & 0b0111,
        }
    }
}

/// Block codes (signatures)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockCode {
    /// Image separator `,`
    ImageDesc_,
    /// Extension introducer `!`
    Extension_,
    /// GIF trailer `;`
    Trailer_,
}

impl BlockCode {
    /// Get a block code from its signature byte
    pub fn from_u8(t: u8) -> Option<Self> {
        use self::BlockCode::*;
        match t {
            b',' => Some(ImageDesc_),
            b'!' => Some(Extension_),
            b';' => Some(Trailer_),
            _ => None,
        }
    }

    /// Get the signature byte
    pub fn signature(self) -> u8 {
        use self::BlockCode::*;
        match self {
            ImageDesc_ => b',',
            Extension_ => b'!',
            Trailer_ => b';',
        }
    }
}

/// Extension labels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    GraphicControl_,
    Comment_,
    Application_,
    Unknown_(u8),
}

impl From<u8> for ExtensionCode {
    fn from(n: u8) -> Self {
        use self::ExtensionCode::*;
        match n {
            0xF9 => GraphicControl_,
            0xFE => Comment_,
            0xFF => Application_,
            _ => Unknown_(n),
        }
    }
}

impl From<ExtensionCode> for u8 {
    fn from(t: ExtensionCode) -> Self {
        use self::ExtensionCode::*;
        match t {
            GraphicControl_ => 0xF9,
            Comment_ => 0xFE,
            Application_ => 0xFF,
            Unknown_(n) => n,
        }
    }
}

/// Get the number of bits needed to encode a color table length
pub(crate) fn table_len_bits(len: usize) -> u8 {
    let len = len.clamp(2, 256).next_power_of_two();
    len.trailing_zeros() as u8 - 1
}

/// Header block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
}

impl Default for Header {
    fn default() -> Self {
        Header::with_version(*b"89a")
    }
}

impl Header {
    /// Create a header with a version
    pub fn with_version(version: [u8; 3]) -> Self {
        Header { version }
    }

    /// Get the version
    pub fn version(&self) -> [u8; 3] {
        self.version
    }
}

/// Logical Screen Descriptor block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8,
    pixel_aspect_ratio: u8,
}

impl ScreenDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_RESOLUTION: u8 = 0b0111_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    /// Adjust the screen width
    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }

    /// Get the screen width
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }

    /// Adjust the screen height
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }

    /// Get the screen height
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }

    /// Adjust the flags
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Get the flags
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Adjust the global color table length (0 for none)
    pub fn with_color_table_len(mut self, len: usize) -> Self {
        let bits = table_len_bits(len);
        self.flags = (bits << 4) & Self::COLOR_RESOLUTION;
        if len > 0 {
            self.flags |= Self::COLOR_TABLE_PRESENT | bits;
        }
        self
    }

    /// Get the global color table length, in entries (0 for none)
    pub fn color_table_len(&self) -> usize {
        if self.flags & Self::COLOR_TABLE_PRESENT != 0 {
            2 << (self.flags & Self::COLOR_TABLE_SIZE)
        } else {
            0
        }
    }

    /// Adjust the background color index
    pub fn with_background_color_idx(mut self, idx: u8) -> Self {
        self.background_color_idx = idx;
        self
    }

    /// Get the background color index
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }

    /// Adjust the pixel aspect ratio
    pub fn with_pixel_aspect_ratio(mut self, ratio: u8) -> Self {
        self.pixel_aspect_ratio = ratio;
        self
    }

    /// Get the pixel aspect ratio
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
}

/// Global or local color table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<u8>,
}

impl ColorTable {
    /// Create a color table from packed RGB bytes
    pub fn with_colors(colors: &[u8]) -> Self {
        debug_assert_eq!(colors.len() % CHANNELS, 0);
        ColorTable {
            colors: colors.to_vec(),
        }
    }

    /// Create a color table from a palette, padded to `len` entries
    pub fn with_palette(palette: &Palette, len: usize) -> Self {
        let mut colors: Vec<u8> = palette
            .colors()
            .iter()
            .flat_map(|clr| color::channels(*clr))
            .collect();
        colors.resize(len.max(palette.len()) * CHANNELS, 0);
        ColorTable { colors }
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.colors.len() / CHANNELS
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Get the packed RGB bytes
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }

    /// Get one entry
    pub fn rgb(&self, idx: usize) -> Option<SRgb8> {
        let i = idx * CHANNELS;
        self.colors
            .get(i..i + CHANNELS)
            .map(|c| SRgb8::new(c[0], c[1], c[2]))
    }
}

/// Graphic Control extension block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16,
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const USER_INPUT: u8 = 0b0000_0010;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    /// Set the flags
    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
    }

    /// Get the flags
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Get the disposal method
    pub fn disposal_method(&self) -> DisposalMethod {
        ((self.flags & Self::DISPOSAL_METHOD) >> 2).into()
    }

    /// Set the disposal method
    pub fn set_disposal_method(&mut self, method: DisposalMethod) {
        let d: u8 = method.into();
        self.flags = (self.flags & !Self::DISPOSAL_METHOD) | (d << 2);
    }

    /// Check if user input is expected
    pub fn user_input(&self) -> bool {
        self.flags & Self::USER_INPUT != 0
    }

    /// Get the delay time in centiseconds
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }

    /// Set the delay time in centiseconds
    pub fn set_delay_time_cs(&mut self, delay_time_cs: u16) {
        self.delay_time_cs = delay_time_cs;
    }

    /// Get the transparent color index, if any
    pub fn transparent_color(&self) -> Option<u8> {
        if self.flags & Self::TRANSPARENT_COLOR != 0 {
            Some(self.transparent_color_idx)
        } else {
            None
        }
    }

    /// Get the raw transparent color index
    pub fn transparent_color_idx(&self) -> u8 {
        self.transparent_color_idx
    }

    /// Set the raw transparent color index
    pub fn set_transparent_color_idx(&mut self, idx: u8) {
        self.transparent_color_idx = idx;
    }

    /// Set the transparent color
    pub fn set_transparent_color(&mut self, clr: Option<u8>) {
        match clr {
            Some(idx) => {
                self.flags |= Self::TRANSPARENT_COLOR;
                self.transparent_color_idx = idx;
            }
            None => {
                self.flags &= !Self::TRANSPARENT_COLOR;
                self.transparent_color_idx = 0;
            }
        }
    }
}

/// Comment extension block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comment {
    comments: Vec<Vec<u8>>,
}

impl Comment {
    /// Add a comment sub-block
    pub fn add_comment(&mut self, b: &[u8]) {
        debug_assert!(b.len() < 256);
        self.comments.push(b.to_vec());
    }

    /// Get the comment sub-blocks
    pub fn comments(&self) -> &[Vec<u8>] {
        &self.comments
    }
}

/// Application extension block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Application {
    app_data: Vec<Vec<u8>>,
}

impl Application {
    /// Check for an application ID which carries a loop count
    fn is_looping(app_id: &[u8]) -> bool {
        app_id == b"NETSCAPE2.0" || app_id == b"ANIMEXTS1.0"
    }

    /// Create a looping extension (zero loops forever)
    pub fn with_loop_count(loop_count: u16) -> Self {
        let [lo, hi] = loop_count.to_le_bytes();
        Application {
            app_data: vec![b"NETSCAPE2.0".to_vec(), vec![1, lo, hi]],
        }
    }

    /// Add an application data sub-block
    pub fn add_app_data(&mut self, b: &[u8]) {
        debug_assert!(b.len() < 256);
        self.app_data.push(b.to_vec());
    }

    /// Get the application data sub-blocks
    pub fn app_data(&self) -> &[Vec<u8>] {
        &self.app_data
    }

    /// Get the loop count, if this is a looping extension
    pub fn loop_count(&self) -> Option<u16> {
        match &self.app_data[..] {
            [id, data]
                if Self::is_looping(id) && data.len() == 3 && data[0] == 1 =>
            {
                Some(u16::from_le_bytes([data[1], data[2]]))
            }
            _ => None,
        }
    }
}

/// Unrecognized extension block (including Plain Text)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Unknown {
    ext_id: u8,
    sub_blocks: Vec<Vec<u8>>,
}

impl Unknown {
    /// Create a new unknown extension
    pub fn new(ext_id: u8) -> Self {
        Unknown {
            ext_id,
            sub_blocks: vec![],
        }
    }

    /// Get the extension label
    pub fn ext_id(&self) -> u8 {
        self.ext_id
    }

    /// Add a sub-block
    pub fn add_sub_block(&mut self, b: &[u8]) {
        debug_assert!(b.len() < 256);
        self.sub_blocks.push(b.to_vec());
    }

    /// Get the sub-blocks
    pub fn sub_blocks(&self) -> &[Vec<u8>] {
        &self.sub_blocks
    }
}

/// Image Descriptor block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const INTERLACED: u8 = 0b0100_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    /// Adjust the left position
    pub fn with_left(mut self, left: u16) -> Self {
        self.left = left;
        self
    }

    /// Get the left position
    pub fn left(&self) -> u16 {
        self.left
    }

    /// Adjust the top position
    pub fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self
    }

    /// Get the top position
    pub fn top(&self) -> u16 {
        self.top
    }

    /// Adjust the width
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    /// Get the width
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Adjust the height
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }

    /// Get the height
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Adjust the flags
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    /// Get the flags
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Check if the image is interlaced
    pub fn interlaced(&self) -> bool {
        self.flags & Self::INTERLACED != 0
    }

    /// Adjust the local color table length (0 for none)
    pub fn with_color_table_len(mut self, len: usize) -> Self {
        self.flags &= Self::INTERLACED;
        if len > 0 {
            self.flags |= Self::COLOR_TABLE_PRESENT | table_len_bits(len);
        }
        self
    }

    /// Get the local color table length, in entries (0 for none)
    pub fn color_table_len(&self) -> usize {
        if self.flags & Self::COLOR_TABLE_PRESENT != 0 {
            2 << (self.flags & Self::COLOR_TABLE_SIZE)
        } else {
            0
        }
    }

    /// Get the image size in pixels
    pub fn image_sz(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// Image Data block, holding decompressed color indices
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageData {
    min_code_size: u8,
    data: Vec<u8>,
}

impl ImageData {
    /// Create image data from color indices
    pub fn new(min_code_size: u8, data: Vec<u8>) -> Self {
        ImageData {
            min_code_size,
            data,
        }
    }

    /// Get the LZW minimum code size
    pub fn min_code_size(&self) -> u8 {
        self.min_code_size
    }

    /// Get the color indices
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Trailer block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Trailer {}

/// One block of a GIF file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Header(Header),
    ScreenDesc(ScreenDesc),
    GlobalColorTable(ColorTable),
    GraphicControl(GraphicControl),
    Comment(Comment),
    Application(Application),
    Unknown(Unknown),
    ImageDesc(ImageDesc),
    LocalColorTable(ColorTable),
    ImageData(ImageData),
    Trailer(Trailer),
}

impl From<Header> for Block {
    fn from(b: Header) -> Self {
        Block::Header(b)
    }
}

impl From<ScreenDesc> for Block {
    fn from(b: ScreenDesc) -> Self {
        Block::ScreenDesc(b)
    }
}

impl From<GraphicControl> for Block {
    fn from(b: GraphicControl) -> Self {
        Block::GraphicControl(b)
    }
}

impl From<Comment> for Block {
    fn from(b: Comment) -> Self {
        Block::Comment(b)
    }
}

impl From<Application> for Block {
    fn from(b: Application) -> Self {
        Block::Application(b)
    }
}

impl From<Unknown> for Block {
    fn from(b: Unknown) -> Self {
        Block::Unknown(b)
    }
}

impl From<ImageDesc> for Block {
    fn from(b: ImageDesc) -> Self {
        Block::ImageDesc(b)
    }
}

impl From<ImageData> for Block {
    fn from(b: ImageData) -> Self {
        Block::ImageData(b)
    }
}

impl From<Trailer> for Block {
    fn from(b: Trailer) -> Self {
        Block::Trailer(b)
    }
}

/// Blocks at the start of a file, before any frame
#[derive(Clone, Debug, Default)]
pub struct Preamble {
    pub header: Header,
    pub screen_desc: ScreenDesc,
    pub global_color_table: Option<ColorTable>,
    pub loop_count_ext: Option<Application>,
    pub comments: Vec<Comment>,
}

impl Preamble {
    /// Get the screen width
    pub fn screen_width(&self) -> u16 {
        self.screen_desc.screen_width()
    }

    /// Get the screen height
    pub fn screen_height(&self) -> u16 {
        self.screen_desc.screen_height()
    }

    /// Get the loop count
    pub fn loop_count(&self) -> Option<u16> {
        self.loop_count_ext.as_ref().and_then(|b| b.loop_count())
    }
}

/// Blocks making up one image of a file
#[derive(Clone, Debug, Default)]
pub struct RawFrame {
    pub graphic_control_ext: Option<GraphicControl>,
    pub image_desc: ImageDesc,
    pub local_color_table: Option<ColorTable>,
    pub image_data: ImageData,
}

impl RawFrame {
    /// Get the delay time in centiseconds (0 if unspecified)
    pub fn delay_time_cs(&self) -> u16 {
        self.graphic_control_ext
            .map_or(0, |gc| gc.delay_time_cs())
    }

    /// Get the disposal method
    pub fn disposal_method(&self) -> DisposalMethod {
        self.graphic_control_ext
            .map_or(DisposalMethod::NoAction, |gc| gc.disposal_method())
    }

    /// Get the transparent color index
    pub fn transparent_color(&self) -> Option<u8> {
        self.graphic_control_ext
            .and_then(|gc| gc.transparent_color())
    }
}
