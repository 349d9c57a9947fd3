use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mosaic::{
    ColorModeKind, MosaicOptions, Palette, PixelBuffer, Shape, transform,
};
use pix::rgb::SRgba8;

fn photo() -> PixelBuffer {
    let mut buf = PixelBuffer::with_color(640, 480, SRgba8::default()).unwrap();
    for y in 0..480 {
        for x in 0..640 {
            let r = (x * 255 / 640) as u8;
            let g = (y * 255 / 480) as u8;
            buf.set_pixel(x, y, SRgba8::new(r, g, r ^ g, 255));
        }
    }
    buf
}

fn transform_shapes(crit: &mut Criterion) {
    let src = photo();
    for shape in [Shape::Square, Shape::Circle, Shape::Ascii] {
        let opt = MosaicOptions::builder()
            .with_block_size(8)
            .with_shape(shape)
            .build()
            .unwrap();
        crit.bench_function(&format!("transform_{shape}"), |b| {
            b.iter(|| black_box(transform(black_box(&src), &opt)))
        });
    }
}

fn transform_palette(crit: &mut Criterion) {
    let src = photo();
    let opt = MosaicOptions::builder()
        .with_block_size(4)
        .with_color_mode(ColorModeKind::Palette)
        .with_palette(Palette::by_name("pico-8").ok())
        .build()
        .unwrap();
    crit.bench_function("transform_pico_8", |b| {
        b.iter(|| black_box(transform(black_box(&src), &opt)))
    });
}

criterion_group!(benches, transform_shapes, transform_palette);
criterion_main!(benches);
