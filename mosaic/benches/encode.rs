use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mosaic::{Decoder, Encoder, Frame, PixelBuffer, block::Block, encode};
use pix::rgb::SRgba8;
use std::io::Cursor;

fn frames() -> Vec<Frame> {
    (0..8)
        .map(|i| {
            let mut buf = PixelBuffer::with_color(160, 120, SRgba8::default()).unwrap();
            for y in 0..120 {
                for x in 0..160 {
                    let v = ((x * 3 + y + i * 5) % 200) as u8;
                    buf.set_pixel(x, y, SRgba8::new(v, 255 - v, v / 2, 255));
                }
            }
            Frame::new(buf, 50)
        })
        .collect()
}

fn encode_frames(crit: &mut Criterion) {
    let frames = frames();
    crit.bench_function("encode_frames", |b| {
        b.iter(|| black_box(encode(black_box(&frames), 160, 120).unwrap()))
    });
}

fn encode_blocks(crit: &mut Criterion) {
    let gif = encode(&frames(), 160, 120).unwrap();
    let blocks: Vec<Block> = Decoder::new(Cursor::new(&gif[..]))
        .into_blocks()
        .map(|b| b.unwrap())
        .collect();
    crit.bench_function("encode_blocks", |b| {
        b.iter(|| {
            let mut encoder =
                Encoder::new(Cursor::new(black_box(Vec::with_capacity(32768))))
                    .into_block_enc();
            for block in &blocks {
                encoder.encode(black_box(block.clone())).unwrap();
            }
            encoder.flush().unwrap();
        })
    });
}

criterion_group!(benches, encode_frames, encode_blocks);
criterion_main!(benches);
