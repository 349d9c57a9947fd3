// cargo fuzz run decode corpus/decode -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use mosaic::Decoder;

fuzz_target!(|data: &[u8]| {
    let decoder = Decoder::new(Cursor::new(data)).max_image_sz(Some(1 << 20));
    for frame in decoder {
        if frame.is_err() {
            return;
        }
    }
});
