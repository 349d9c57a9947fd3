// main.rs      mosaic command
//
// Copyright (c) 2025  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use mosaic::block::{DisposalMethod, Preamble, RawFrame};
use mosaic::{
    BLOCK_SIZES, ColorModeKind, Converter, Decoder, LEVELS, MosaicOptions,
    Palette, Shape, color,
};
use std::error::Error;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::time::Instant;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    match create_app().get_matches().subcommand() {
        ("convert", Some(matches)) => convert(&mut out, matches)?,
        ("show", Some(matches)) => show(&mut out, matches)?,
        ("palettes", Some(_matches)) => palettes(&mut out)?,
        _ => return Err("unknown subcommand".into()),
    }
    out.reset()?;
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("mosaic")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("Pixel-art mosaic utility")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("convert")
                .about("Convert an animated GIF into a mosaic")
                .arg(Arg::with_name("input").required(true).help("input GIF"))
                .arg(
                    Arg::with_name("output")
                        .required(true)
                        .help("output GIF"),
                )
                .arg(
                    Arg::with_name("block-size")
                        .short("b")
                        .long("block-size")
                        .takes_value(true)
                        .default_value("8")
                        .help("block size in pixels (2 to 50)"),
                )
                .arg(
                    Arg::with_name("mode")
                        .short("m")
                        .long("mode")
                        .takes_value(true)
                        .possible_values(&["grayscale", "color", "palette"])
                        .default_value("color")
                        .help("color mode"),
                )
                .arg(
                    Arg::with_name("levels")
                        .short("l")
                        .long("levels")
                        .takes_value(true)
                        .default_value("4")
                        .help("quantization levels (2 to 8)"),
                )
                .arg(
                    Arg::with_name("palette")
                        .short("p")
                        .long("palette")
                        .takes_value(true)
                        .help("built-in palette name"),
                )
                .arg(
                    Arg::with_name("shape")
                        .short("s")
                        .long("shape")
                        .takes_value(true)
                        .possible_values(&[
                            "square", "circle", "diamond", "cross", "ascii",
                        ])
                        .default_value("square")
                        .help("block shape"),
                )
                .arg(
                    Arg::with_name("threads")
                        .short("t")
                        .long("threads")
                        .takes_value(true)
                        .help("worker threads"),
                ),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Show GIF frame table")
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input file(s)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("palettes").about("List built-in palettes"),
        )
}

/// Build options from arguments
fn options_builder(
    matches: &ArgMatches,
) -> Result<mosaic::OptionsBuilder, Box<dyn Error>> {
    let block_size = matches.value_of("block-size").unwrap_or("8").parse()?;
    let mode: ColorModeKind =
        matches.value_of("mode").unwrap_or("color").parse()?;
    let levels = matches.value_of("levels").unwrap_or("4").parse()?;
    let palette = match matches.value_of("palette") {
        Some(name) => Some(Palette::by_name(name)?),
        None => None,
    };
    let shape: Shape = matches.value_of("shape").unwrap_or("square").parse()?;
    Ok(MosaicOptions::builder()
        .with_block_size(block_size)
        .with_color_mode(mode)
        .with_levels(levels)
        .with_palette(palette)
        .with_shape(shape))
}

/// Handle convert subcommand
fn convert(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let mut red = ColorSpec::new();
    red.set_fg(Some(Color::Red)).set_intense(true);
    let mut green = ColorSpec::new();
    green.set_fg(Some(Color::Green)).set_intense(true);
    let input = matches.value_of_os("input").ok_or("missing input")?;
    let output = matches.value_of_os("output").ok_or("missing output")?;
    let threads = match matches.value_of("threads") {
        Some(t) => Some(t.parse()?),
        None => None,
    };
    let builder = options_builder(matches)?;
    let conv = Converter::new().with_threads(threads)?;
    if let Err(e) = conv.set_options(builder) {
        out.set_color(&red)?;
        writeln!(out, "invalid options: {e}")?;
        writeln!(
            out,
            "  block size {}..={}, levels {}..={}",
            BLOCK_SIZES.start(),
            BLOCK_SIZES.end(),
            LEVELS.start(),
            LEVELS.end()
        )?;
        return Err(e.into());
    }
    let bytes = fs::read(input)?;
    let start = Instant::now();
    let anim = conv.convert_animation(&bytes)?;
    fs::write(output, &anim.gif)?;
    out.set_color(&green)?;
    write!(out, "{:?}", output)?;
    out.set_color(&bold)?;
    writeln!(
        out,
        ": {}x{}, {} frames, {} bytes in {:.2?}",
        anim.width,
        anim.height,
        anim.frames.len(),
        anim.gif.len(),
        start.elapsed()
    )?;
    Ok(())
}

/// Handle show subcommand
fn show(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let values = matches.values_of_os("files").ok_or("missing files")?;
    for path in values {
        show_file(out, path)?;
    }
    Ok(())
}

/// Table layout of a frame listing
struct Layout {
    /// Screen width
    width: u16,
    /// Screen height
    height: u16,
    /// Global color table entries
    global_clr: usize,
    /// Digits of frame numbers
    frame_digits: usize,
    /// Digits of sizes
    size_digits: usize,
}

/// Show one GIF file
fn show_file(
    out: &mut StandardStream,
    path: &OsStr,
) -> Result<(), Box<dyn Error>> {
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut red = ColorSpec::new();
    red.set_fg(Some(Color::Red)).set_intense(true);
    let mut yellow = ColorSpec::new();
    yellow.set_fg(Some(Color::Yellow)).set_intense(true);
    let mut cyan = ColorSpec::new();
    cyan.set_fg(Some(Color::Cyan)).set_intense(true);
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let f = BufReader::new(File::open(path)?);
    let mut raw_frames = Decoder::new(f).into_raw_frames();
    let preamble = match raw_frames.preamble()? {
        Some(p) => p,
        None => {
            out.set_color(&red)?;
            writeln!(out, "no preamble!")?;
            return Ok(());
        }
    };
    let frames = raw_frames.collect::<mosaic::Result<Vec<_>>>()?;
    let layout = Layout {
        width: preamble.screen_width(),
        height: preamble.screen_height(),
        global_clr: preamble.screen_desc.color_table_len(),
        frame_digits: digits(frames.len()).max(3),
        size_digits: 4.max(
            1 + digits(preamble.screen_width())
                + digits(preamble.screen_height()),
        ),
    };
    out.set_color(&magenta)?;
    writeln!(out, "{:?}", path)?;
    out.set_color(&bold)?;
    let gif = String::from_utf8_lossy(&preamble.header.version()).to_string();
    write!(out, "GIF{}, frames: {}", gif, frames.len())?;
    if let Some(c) = preamble.loop_count() {
        write!(out, ", repeat: ")?;
        if c == 0 {
            write!(out, "∞")?;
        } else {
            write!(out, "{c}")?;
        }
    }
    writeln!(out)?;
    out.set_color(&cyan)?;
    for c in comments(&preamble) {
        writeln!(out, "  # {c}")?;
    }
    out.set_color(&yellow)?;
    write!(out, " {:>w$}", "Fr#", w = layout.frame_digits)?;
    write!(out, " Delay ms Disp")?;
    write!(out, " {:>w$}", "Size", w = layout.size_digits)?;
    write!(out, " {:>w$}", "X,Y", w = layout.size_digits)?;
    writeln!(out, " Clrs Trn")?;
    for (n, f) in frames.iter().enumerate() {
        show_frame(out, f, n, &layout)?;
    }
    Ok(())
}

/// Collect non-empty comment lines
fn comments(preamble: &Preamble) -> Vec<String> {
    let mut lines = vec![];
    for cmt in &preamble.comments {
        for c in cmt.comments() {
            for l in String::from_utf8_lossy(c).split('\n') {
                let l = l.trim();
                if !l.is_empty() {
                    lines.push(l.to_string());
                }
            }
        }
    }
    lines
}

/// Show one frame of a GIF file
fn show_frame(
    out: &mut StandardStream,
    frame: &RawFrame,
    number: usize,
    layout: &Layout,
) -> Result<(), Box<dyn Error>> {
    let mut dflt = ColorSpec::new();
    dflt.set_fg(Some(Color::White));
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let mut red = ColorSpec::new();
    red.set_fg(Some(Color::Red)).set_intense(true);
    let desc = &frame.image_desc;
    out.set_color(&dflt)?;
    write!(out, "{}", if desc.interlaced() { 'i' } else { ' ' })?;
    out.set_color(&bold)?;
    write!(out, "{:>w$}", number, w = layout.frame_digits)?;
    let cs = frame.delay_time_cs();
    if cs == 0 {
        out.set_color(&dflt)?;
    }
    write!(out, " {:8}", u32::from(cs) * 10)?;
    let d = match frame.graphic_control_ext.map(|gc| gc.disposal_method()) {
        Some(DisposalMethod::NoAction) => "none",
        Some(DisposalMethod::Keep) => "keep",
        Some(DisposalMethod::Background) => "bg",
        Some(DisposalMethod::Previous) => "prev",
        Some(DisposalMethod::Reserved(_)) => "res",
        None => "-",
    };
    out.set_color(match d {
        "none" | "-" => &dflt,
        "res" => &red,
        _ => &bold,
    })?;
    write!(out, " {d:>4}")?;
    let full = layout.width == desc.width() && layout.height == desc.height();
    out.set_color(if full { &dflt } else { &bold })?;
    let size = format!("{}x{}", desc.width(), desc.height());
    write!(out, " {:>w$}", size, w = layout.size_digits)?;
    let origin = desc.left() == 0 && desc.top() == 0;
    out.set_color(if origin { &dflt } else { &bold })?;
    let pos = format!("{},{}", desc.left(), desc.top());
    write!(out, " {:>w$}", pos, w = layout.size_digits)?;
    let c = desc.color_table_len();
    if c > 0 {
        out.set_color(&bold)?;
        write!(out, "  {c:3}")?;
    } else {
        out.set_color(&dflt)?;
        write!(out, " {:3}g", layout.global_clr)?;
    }
    match frame.transparent_color() {
        Some(tc) => {
            out.set_color(&bold)?;
            writeln!(out, " {tc:>3}")?;
        }
        None => {
            out.set_color(&dflt)?;
            writeln!(out, " {:>3}", "-")?;
        }
    }
    Ok(())
}

/// Handle palettes subcommand
fn palettes(out: &mut StandardStream) -> Result<(), Box<dyn Error>> {
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    for palette in Palette::builtin() {
        out.set_color(&bold)?;
        write!(out, "{:<12}", palette.name())?;
        for clr in palette.colors() {
            let [r, g, b] = color::channels(*clr);
            let mut swatch = ColorSpec::new();
            swatch.set_bg(Some(Color::Rgb(r, g, b)));
            out.set_color(&swatch)?;
            write!(out, "  ")?;
        }
        out.reset()?;
        writeln!(out, " ({})", palette.len())?;
    }
    Ok(())
}

/// Calculate digits in a number
fn digits<T: Into<usize>>(v: T) -> usize {
    match v.into() {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1000..=9999 => 4,
        _ => 5,
    }
}
