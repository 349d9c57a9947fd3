// palette.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Fixed color palettes
use crate::error::{Error, Result};
use pix::rgb::SRgb8;
use std::borrow::Cow;

/// Built-in palettes: name and packed RGB entries
const BUILTIN: [(&str, &[[u8; 3]]); 6] = [
    // Four greens of the original Game Boy screen
    (
        "game-boy",
        &[[15, 56, 15], [48, 98, 48], [139, 172, 15], [155, 188, 15]],
    ),
    // PICO-8 fantasy console
    (
        "pico-8",
        &[
            [0, 0, 0],
            [29, 43, 83],
            [126, 37, 83],
            [0, 135, 81],
            [171, 82, 54],
            [95, 87, 79],
            [194, 195, 199],
            [255, 241, 232],
            [255, 0, 77],
            [255, 163, 0],
            [255, 236, 39],
            [0, 228, 54],
            [41, 173, 255],
            [131, 118, 156],
            [255, 119, 168],
            [255, 204, 170],
        ],
    ),
    // CGA mode 4 palette 1, high intensity
    (
        "cga",
        &[[0, 0, 0], [85, 255, 255], [255, 85, 255], [255, 255, 255]],
    ),
    // EGA default 16 colors
    (
        "ega",
        &[
            [0, 0, 0],
            [0, 0, 170],
            [0, 170, 0],
            [0, 170, 170],
            [170, 0, 0],
            [170, 0, 170],
            [170, 85, 0],
            [170, 170, 170],
            [85, 85, 85],
            [85, 85, 255],
            [85, 255, 85],
            [85, 255, 255],
            [255, 85, 85],
            [255, 85, 255],
            [255, 255, 85],
            [255, 255, 255],
        ],
    ),
    ("monochrome", &[[0, 0, 0], [255, 255, 255]]),
    (
        "sepia",
        &[[44, 33, 24], [112, 84, 62], [183, 149, 113], [240, 224, 200]],
    ),
];

/// Named, ordered, non-empty list of colors
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    /// Palette name
    name: Cow<'static, str>,
    /// Colors, in priority order for tie-breaking
    colors: Vec<SRgb8>,
}

impl Palette {
    /// Create a custom palette.
    ///
    /// Fails with `EmptyPalette` when `colors` is empty.
    pub fn new<N, C>(name: N, colors: C) -> Result<Self>
    where
        N: Into<Cow<'static, str>>,
        C: Into<Vec<SRgb8>>,
    {
        let colors = colors.into();
        if colors.is_empty() {
            return Err(Error::EmptyPalette);
        }
        Ok(Palette {
            name: name.into(),
            colors,
        })
    }

    /// Create a built-in palette
    fn with_entries(name: &'static str, entries: &[[u8; 3]]) -> Self {
        Palette {
            name: Cow::Borrowed(name),
            colors: entries
                .iter()
                .map(|&[r, g, b]| SRgb8::new(r, g, b))
                .collect(),
        }
    }

    /// Get all built-in palettes
    pub fn builtin() -> Vec<Palette> {
        BUILTIN
            .iter()
            .map(|&(name, entries)| Self::with_entries(name, entries))
            .collect()
    }

    /// Look up a built-in palette by name (case insensitive)
    pub fn by_name(name: &str) -> Result<Self> {
        BUILTIN
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(n, entries)| Self::with_entries(n, entries))
            .ok_or_else(|| Error::UnknownPalette(name.to_string()))
    }

    /// Get the palette name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the colors
    pub fn colors(&self) -> &[SRgb8] {
        &self.colors
    }

    /// Get the number of colors
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Check if the palette is empty (never true once constructed)
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtins_not_empty() {
        let builtin = Palette::builtin();
        assert_eq!(builtin.len(), 6);
        for p in builtin {
            assert!(!p.is_empty(), "{}", p.name());
        }
        let game_boy = Palette::by_name("game-boy").unwrap();
        assert_eq!(game_boy.len(), 4);
        assert_eq!(game_boy.colors()[3], SRgb8::new(155, 188, 15));
    }

    #[test]
    fn lookup() {
        let pico = Palette::by_name("PICO-8").unwrap();
        assert_eq!(pico.name(), "pico-8");
        assert_eq!(pico.len(), 16);
        assert!(matches!(
            Palette::by_name("vga"),
            Err(Error::UnknownPalette(_))
        ));
    }

    #[test]
    fn custom() {
        let colors = vec![SRgb8::new(1, 2, 3), SRgb8::new(4, 5, 6)];
        let p = Palette::new("duo", colors).unwrap();
        assert_eq!(p.name(), "duo");
        assert_eq!(p.len(), 2);
        assert!(matches!(
            Palette::new("none", Vec::<SRgb8>::new()),
            Err(Error::EmptyPalette)
        ));
    }
}
