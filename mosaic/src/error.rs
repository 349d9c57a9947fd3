// error.rs
//
// Copyright (c) 2025  Douglas Lau
//
use rayon::ThreadPoolBuildError;
use std::fmt;
use std::io;

/// Errors encountered while configuring, decoding, encoding or converting
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error.
    Io(io::Error),
    /// Worker thread pool could not be created.
    ThreadPool(ThreadPoolBuildError),
    /// Block size outside of 2 to 50.
    InvalidBlockSize(u32),
    /// Quantization levels outside of 2 to 8.
    InvalidLevels(u8),
    /// Palette color mode requested without a palette.
    MissingPalette,
    /// Palette created with no colors.
    EmptyPalette,
    /// No built-in palette with the given name.
    UnknownPalette(String),
    /// Pixel buffer dimensions zero, or length not width × height × 4.
    InvalidBufferSize,
    /// [Header](block/struct.Header.html) block malformed or missing.
    MalformedHeader,
    /// GIF version not supported (87a or 89a only).
    UnsupportedVersion([u8; 3]),
    /// Invalid [Block](block/enum.Block.html) code (signature).
    InvalidBlockCode,
    /// [Block](block/enum.Block.html)s arranged in invalid sequence.
    InvalidBlockSequence,
    /// [GraphicControl](block/struct.GraphicControl.html) block has invalid
    /// length.
    MalformedGraphicControlExtension,
    /// File ends with incomplete block.
    UnexpectedEndOfFile,
    /// LZW minimum code size larger than 11.
    InvalidCodeSize,
    /// Compressed LZW data invalid or corrupt.
    InvalidLzwData,
    /// Image larger than specified by
    /// [max_image_sz](struct.Decoder.html#method.max_image_sz).
    TooLargeImage,
    /// [ImageData](block/struct.ImageData.html) block is incomplete.
    IncompleteImageData,
    /// Frame location / size larger than screen size.
    InvalidFrameDimensions,
    /// Missing color table for a frame.
    MissingColorTable,
    /// Invalid color index in a frame.
    InvalidColorIndex,
    /// GIF contains no images.
    NoFrames,
    /// Encoding requested with an empty frame sequence.
    EmptyFrames,
    /// Frame dimensions do not match the animation screen.
    FrameSizeMismatch,
    /// Screen dimensions do not fit in a GIF (65535 max).
    TooLargeScreen,
    /// Decode or encode ran past its operation budget.
    BudgetExceeded,
    /// Run superseded by a newer conversion request.
    Cancelled,
}

/// Broad category of an [Error](enum.Error.html)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid options or pixel buffer, detected before pixel work begins
    Configuration,
    /// Animation bytes failed structural parsing
    Format,
    /// Frames could not be encoded
    Encode,
    /// Operation budget exceeded
    Budget,
    /// Superseded run; not a user-visible failure
    Cancelled,
    /// Reader or writer failure
    Io,
}

/// Mosaic result type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get the category of the error
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            Io(_) => ErrorKind::Io,
            ThreadPool(_) => ErrorKind::Configuration,
            InvalidBlockSize(_) | InvalidLevels(_) | MissingPalette
            | EmptyPalette | UnknownPalette(_) | InvalidBufferSize => {
                ErrorKind::Configuration
            }
            EmptyFrames | FrameSizeMismatch | TooLargeScreen => {
                ErrorKind::Encode
            }
            BudgetExceeded => ErrorKind::Budget,
            Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Format,
        }
    }

    /// Check if the error only signals a superseded run
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            Error::ThreadPool(err) => err.fmt(fmt),
            Error::UnknownPalette(name) => {
                write!(fmt, "UnknownPalette: {name}")
            }
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::ThreadPool(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEndOfFile,
            _ => Error::Io(err),
        }
    }
}

impl From<ThreadPoolBuildError> for Error {
    fn from(err: ThreadPoolBuildError) -> Self {
        Error::ThreadPool(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::MissingPalette.kind(), ErrorKind::Configuration);
        assert_eq!(Error::InvalidBlockSize(1).kind(), ErrorKind::Configuration);
        assert_eq!(Error::MalformedHeader.kind(), ErrorKind::Format);
        assert_eq!(Error::InvalidLzwData.kind(), ErrorKind::Format);
        assert_eq!(Error::EmptyFrames.kind(), ErrorKind::Encode);
        assert_eq!(Error::BudgetExceeded.kind(), ErrorKind::Budget);
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::NoFrames.is_cancelled());
    }

    #[test]
    fn eof_is_format_error() {
        let err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert_eq!(Error::from(err).kind(), ErrorKind::Format);
    }
}
