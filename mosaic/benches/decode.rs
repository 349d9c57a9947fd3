use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mosaic::{Decoder, Frame, PixelBuffer, encode};
use pix::rgb::SRgba8;
use std::io::Cursor;

fn animation() -> Vec<u8> {
    let frames: Vec<_> = (0..8)
        .map(|i| {
            let mut buf = PixelBuffer::with_color(160, 120, SRgba8::default()).unwrap();
            for y in 0..120 {
                for x in 0..160 {
                    let v = ((x + i * 8) ^ y) as u8;
                    buf.set_pixel(x, y, SRgba8::new(v & 0xF0, v << 4, 64, 255));
                }
            }
            Frame::new(buf, 80)
        })
        .collect();
    encode(&frames, 160, 120).unwrap()
}

fn decode_frames(crit: &mut Criterion) {
    let gif = animation();
    crit.bench_function("decode_frames", |b| {
        b.iter(|| {
            let decoder = Decoder::new(Cursor::new(black_box(&gif[..])));
            for frame in decoder {
                black_box(frame.unwrap());
            }
        })
    });
}

fn decode_blocks(crit: &mut Criterion) {
    let gif = animation();
    crit.bench_function("decode_blocks", |b| {
        b.iter(|| {
            let blocks = Decoder::new(Cursor::new(black_box(&gif[..])))
                .into_blocks();
            for block in blocks {
                black_box(block.unwrap());
            }
        })
    });
}

criterion_group!(benches, decode_frames, decode_blocks);
criterion_main!(benches);
