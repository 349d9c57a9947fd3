// color.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Color mapping for mosaic blocks
use crate::options::ColorMode;
use pix::rgb::{Rgb, SRgb8, SRgba8};

/// Get the red, green and blue channels of a color
pub fn channels(clr: SRgb8) -> [u8; 3] {
    [
        u8::from(Rgb::red(clr)),
        u8::from(Rgb::green(clr)),
        u8::from(Rgb::blue(clr)),
    ]
}

/// Make an opaque pixel from a color
pub fn opaque(clr: SRgb8) -> SRgba8 {
    let [r, g, b] = channels(clr);
    SRgba8::new(r, g, b, 255)
}

/// Get the color of a pixel, ignoring alpha
pub fn without_alpha(px: SRgba8) -> SRgb8 {
    SRgb8::new(Rgb::red(px), Rgb::green(px), Rgb::blue(px))
}

/// Get the luminance of a color (BT.601 weights), from 0 to 255
pub fn luminance(clr: SRgb8) -> f32 {
    let [r, g, b] = channels(clr);
    0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)
}

/// Get the brightness of a color, normalized from 0 to 1
pub fn brightness(clr: SRgb8) -> f32 {
    (luminance(clr) / 255.0).clamp(0.0, 1.0)
}

/// Quantize a channel value to one of `levels` evenly spaced steps
pub fn quantize(value: f32, levels: u8) -> u8 {
    debug_assert!(levels >= 2);
    let step = 255.0 / f32::from(levels - 1);
    ((value / step).round() * step).round().clamp(0.0, 255.0) as u8
}

/// Find the index of the color nearest to `clr`.
///
/// Distance is squared Euclidean in RGB; ties go to the earliest entry.
/// Returns `None` only for an empty slice.
pub fn nearest_index(colors: &[SRgb8], clr: SRgb8) -> Option<usize> {
    let target = channels(clr);
    let mut best = None;
    let mut best_dist = u32::MAX;
    for (i, c) in colors.iter().enumerate() {
        let dist = distance_sq(channels(*c), target);
        if dist < best_dist {
            best = Some(i);
            best_dist = dist;
            if dist == 0 {
                break;
            }
        }
    }
    best
}

/// Get squared distance between two colors
fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(a, b)| {
            let d = i32::from(*a) - i32::from(*b);
            (d * d) as u32
        })
        .sum()
}

/// Map a sampled color under a color mode
pub fn map(clr: SRgb8, mode: &ColorMode) -> SRgb8 {
    match mode {
        ColorMode::Grayscale(levels) => {
            let v = quantize(luminance(clr), *levels);
            SRgb8::new(v, v, v)
        }
        ColorMode::Color(levels) => {
            let [r, g, b] =
                channels(clr).map(|c| quantize(f32::from(c), *levels));
            SRgb8::new(r, g, b)
        }
        ColorMode::Palette(palette) => {
            let colors = palette.colors();
            // palettes are never empty
            nearest_index(colors, clr).map_or(clr, |i| colors[i])
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::palette::Palette;

    fn rgb(r: u8, g: u8, b: u8) -> SRgb8 {
        SRgb8::new(r, g, b)
    }

    #[test]
    fn quantize_idempotent() {
        for levels in 2..=8 {
            for v in 0..=255u8 {
                let q = quantize(f32::from(v), levels);
                assert_eq!(quantize(f32::from(q), levels), q);
            }
        }
    }

    #[test]
    fn quantize_two_levels() {
        assert_eq!(quantize(0.0, 2), 0);
        assert_eq!(quantize(127.0, 2), 0);
        assert_eq!(quantize(128.0, 2), 255);
        assert_eq!(quantize(255.0, 2), 255);
    }

    #[test]
    fn quantize_steps() {
        // 4 levels: 0, 85, 170, 255
        assert_eq!(quantize(40.0, 4), 0);
        assert_eq!(quantize(50.0, 4), 85);
        assert_eq!(quantize(200.0, 4), 170);
        assert_eq!(quantize(240.0, 4), 255);
    }

    #[test]
    fn channels_round_trip() {
        assert_eq!(channels(rgb(1, 2, 3)), [1, 2, 3]);
        let px = opaque(rgb(4, 5, 6));
        assert_eq!(px, SRgba8::new(4, 5, 6, 255));
        assert_eq!(without_alpha(SRgba8::new(7, 8, 9, 0)), rgb(7, 8, 9));
    }

    #[test]
    fn grayscale_red() {
        let lum = luminance(rgb(255, 0, 0));
        assert!((lum - 76.245).abs() < 0.01);
        let mode = ColorMode::Grayscale(2);
        assert_eq!(map(rgb(255, 0, 0), &mode), rgb(0, 0, 0));
        assert_eq!(map(rgb(255, 255, 255), &mode), rgb(255, 255, 255));
    }

    #[test]
    fn color_channels() {
        let two = ColorMode::Color(2);
        assert_eq!(map(rgb(10, 130, 250), &two), rgb(0, 255, 255));
        let three = ColorMode::Color(3);
        assert_eq!(map(rgb(90, 160, 0), &three), rgb(128, 128, 0));
    }

    #[test]
    fn palette_exact() {
        let game_boy = Palette::by_name("game-boy").unwrap();
        let mode = ColorMode::Palette(game_boy);
        assert_eq!(map(rgb(155, 188, 15), &mode), rgb(155, 188, 15));
        assert_eq!(map(rgb(15, 56, 15), &mode), rgb(15, 56, 15));
        assert_eq!(map(rgb(0, 0, 0), &mode), rgb(15, 56, 15));
        assert_eq!(map(rgb(255, 255, 255), &mode), rgb(155, 188, 15));
    }

    #[test]
    fn palette_ties() {
        let colors = [rgb(0, 0, 0), rgb(10, 0, 0), rgb(0, 10, 0)];
        assert_eq!(nearest_index(&colors, rgb(5, 0, 0)), Some(0));
        assert_eq!(nearest_index(&colors, rgb(5, 5, 0)), Some(0));
        assert_eq!(nearest_index(&colors, rgb(6, 5, 0)), Some(1));
        assert_eq!(nearest_index(&[], rgb(5, 5, 0)), None);
    }

    #[test]
    fn brightness_range() {
        assert_eq!(brightness(rgb(0, 0, 0)), 0.0);
        assert!((brightness(rgb(255, 255, 255)) - 1.0).abs() < 1e-6);
    }
}
