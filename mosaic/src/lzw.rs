// lzw.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Variable-width Lempel-Ziv-Welch compression, as used by GIF
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Code type
type Code = u16;

/// Maximum code bits allowed for GIF
const MAX_CODE_BITS: u8 = 12;

/// Maximum number of dictionary entries
const MAX_ENTRIES: usize = 1 << MAX_CODE_BITS;

/// Largest minimum code size allowed
pub const MAX_MIN_CODE_BITS: u8 = MAX_CODE_BITS - 1;

/// Packs codes into bytes, least significant bit first
#[derive(Debug, Default)]
struct BitPacker {
    /// Pending bits
    bits: u32,
    /// Number of pending bits
    n_bits: u8,
}

impl BitPacker {
    /// Pack one code
    fn pack(&mut self, code: Code, code_bits: u8, out: &mut Vec<u8>) {
        self.bits |= u32::from(code) << self.n_bits;
        self.n_bits += code_bits;
        while self.n_bits >= 8 {
            out.push(self.bits as u8);
            self.bits >>= 8;
            self.n_bits -= 8;
        }
    }

    /// Flush a final partial byte
    fn flush(&mut self, out: &mut Vec<u8>) {
        if self.n_bits > 0 {
            out.push(self.bits as u8);
        }
        self.bits = 0;
        self.n_bits = 0;
    }
}

/// LZW data compressor
pub struct Compressor {
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: u8,
    /// Dictionary of (prefix code, byte) to code
    dict: HashMap<(Code, u8), Code>,
    /// Next available code
    next_code: usize,
    /// Output bit packer
    packer: BitPacker,
}

impl Compressor {
    /// Create a new compressor
    pub fn new(min_code_bits: u8) -> Self {
        debug_assert!((2..=MAX_MIN_CODE_BITS).contains(&min_code_bits));
        let mut compressor = Compressor {
            min_code_bits,
            code_bits: min_code_bits + 1,
            dict: HashMap::new(),
            next_code: 0,
            packer: BitPacker::default(),
        };
        compressor.reset();
        compressor
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Reset the dictionary
    fn reset(&mut self) {
        self.dict.clear();
        self.next_code = usize::from(self.clear_code()) + 2;
        self.code_bits = self.min_code_bits + 1;
    }

    /// Pack one code at the current width.
    ///
    /// The width grows once the next code would not fit, matching the
    /// decompressor, which lags one dictionary entry behind.
    fn pack(&mut self, code: Code, out: &mut Vec<u8>) {
        self.packer.pack(code, self.code_bits, out);
        if self.next_code >= 1 << self.code_bits
            && self.code_bits < MAX_CODE_BITS
        {
            self.code_bits += 1;
        }
    }

    /// Compress a buffer of color indices, appending to `out`.
    ///
    /// The output starts with a clear code and ends with an end code.
    pub fn compress(&mut self, bytes: &[u8], out: &mut Vec<u8>) {
        let clear = self.clear_code();
        self.reset();
        self.pack(clear, out);
        let mut prefix: Option<Code> = None;
        for &byte in bytes {
            let p = match prefix {
                Some(p) => p,
                None => {
                    prefix = Some(Code::from(byte));
                    continue;
                }
            };
            if let Some(&code) = self.dict.get(&(p, byte)) {
                prefix = Some(code);
                continue;
            }
            self.pack(p, out);
            self.dict.insert((p, byte), self.next_code as Code);
            self.next_code += 1;
            prefix = Some(Code::from(byte));
            if self.next_code >= MAX_ENTRIES {
                self.pack(clear, out);
                self.reset();
            }
        }
        if let Some(p) = prefix {
            self.pack(p, out);
        }
        self.pack(clear + 1, out);
        self.packer.flush(out);
    }
}

/// Dictionary entry for decompression
#[derive(Clone, Copy, Debug)]
struct Entry {
    /// Prefix code
    prefix: Option<Code>,
    /// Last byte of the string
    byte: u8,
    /// First byte of the string
    first: u8,
    /// String length
    len: u16,
}

/// LZW data decompressor
#[derive(Debug)]
pub struct Decompressor {
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: u8,
    /// Code dictionary
    table: Vec<Entry>,
    /// Previous code
    prev: Option<Code>,
    /// Pending input bits
    bits: u32,
    /// Number of pending input bits
    n_bits: u8,
    /// End code received
    ended: bool,
}

impl Decompressor {
    /// Create a new decompressor
    pub fn new(min_code_bits: u8) -> Self {
        let mut decompressor = Decompressor {
            min_code_bits,
            code_bits: min_code_bits + 1,
            table: Vec::with_capacity(MAX_ENTRIES),
            prev: None,
            bits: 0,
            n_bits: 0,
            ended: false,
        };
        decompressor.reset();
        decompressor
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Reset the dictionary
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..self.clear_code() {
            let byte = byte as u8;
            self.table.push(Entry {
                prefix: None,
                byte,
                first: byte,
                len: 1,
            });
        }
        // clear and end codes
        for _ in 0..2 {
            self.table.push(Entry {
                prefix: None,
                byte: 0,
                first: 0,
                len: 0,
            });
        }
        self.code_bits = self.min_code_bits + 1;
        self.prev = None;
    }

    /// Check if the end code has been received
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Decompress a chunk of data, appending to `out`
    pub fn decompress(&mut self, bytes: &[u8], out: &mut Vec<u8>) -> Result<()> {
        for &byte in bytes {
            if self.ended {
                break;
            }
            self.bits |= u32::from(byte) << self.n_bits;
            self.n_bits += 8;
            while self.n_bits >= self.code_bits && !self.ended {
                let mask = (1u32 << self.code_bits) - 1;
                let code = (self.bits & mask) as Code;
                self.bits >>= self.code_bits;
                self.n_bits -= self.code_bits;
                self.decompress_code(code, out)?;
            }
        }
        Ok(())
    }

    /// Decompress one code
    fn decompress_code(&mut self, code: Code, out: &mut Vec<u8>) -> Result<()> {
        let clear = self.clear_code();
        if code == clear {
            self.reset();
            return Ok(());
        }
        if code == clear + 1 {
            self.ended = true;
            return Ok(());
        }
        let next = self.table.len();
        let prev = match self.prev {
            Some(prev) => prev,
            None => {
                if code >= clear {
                    return Err(Error::InvalidLzwData);
                }
                self.emit(code, out);
                self.prev = Some(code);
                return Ok(());
            }
        };
        let first = match usize::from(code).cmp(&next) {
            std::cmp::Ordering::Less => self.table[usize::from(code)].first,
            std::cmp::Ordering::Equal => self.table[usize::from(prev)].first,
            std::cmp::Ordering::Greater => return Err(Error::InvalidLzwData),
        };
        if next < MAX_ENTRIES {
            let p = self.table[usize::from(prev)];
            self.table.push(Entry {
                prefix: Some(prev),
                byte: first,
                first: p.first,
                len: p.len + 1,
            });
            if self.table.len() >= 1 << self.code_bits
                && self.code_bits < MAX_CODE_BITS
            {
                self.code_bits += 1;
            }
        }
        if usize::from(code) >= self.table.len() {
            return Err(Error::InvalidLzwData);
        }
        self.emit(code, out);
        self.prev = Some(code);
        Ok(())
    }

    /// Write the string for a code
    fn emit(&self, code: Code, out: &mut Vec<u8>) {
        let len = usize::from(self.table[usize::from(code)].len);
        let start = out.len();
        out.resize(start + len, 0);
        let mut entry = self.table[usize::from(code)];
        for i in (start..start + len).rev() {
            out[i] = entry.byte;
            match entry.prefix {
                Some(prefix) => entry = self.table[usize::from(prefix)],
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn round_trip(min_code_bits: u8, data: &[u8]) {
        let mut packed = vec![];
        Compressor::new(min_code_bits).compress(data, &mut packed);
        let mut unpacked = vec![];
        let mut dec = Decompressor::new(min_code_bits);
        dec.decompress(&packed, &mut unpacked).unwrap();
        assert!(dec.is_ended());
        assert_eq!(&unpacked[..], data);
    }

    #[test]
    fn known_stream() {
        // 10x10 sample image from the GIF89a specification
        let packed = [
            0x8C, 0x2D, 0x99, 0x87, 0x2A, 0x1C, 0xDC, 0x33, 0xA0, 0x02, 0x75,
            0xEC, 0x95, 0xFA, 0xA8, 0xDE, 0x60, 0x8C, 0x04, 0x91, 0x4C, 0x01,
        ];
        let image = [
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
        let mut out = vec![];
        let mut dec = Decompressor::new(2);
        dec.decompress(&packed, &mut out).unwrap();
        assert_eq!(&out[..], &image[..]);
        round_trip(2, &image);
    }

    #[test]
    fn repeated() {
        round_trip(2, &[0; 1000]);
        round_trip(8, &[255; 70_000]);
    }

    #[test]
    fn dictionary_reset() {
        // enough distinct strings to fill the 4096 entry dictionary
        let data: Vec<u8> = (0..100_000u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
            .collect();
        round_trip(8, &data);
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 7) as u8).collect();
        round_trip(3, &data);
    }

    #[test]
    fn invalid_code() {
        // first code after clear must be a literal
        let mut packed = vec![];
        let mut packer = BitPacker::default();
        packer.pack(4, 3, &mut packed);
        packer.pack(7, 3, &mut packed);
        packer.flush(&mut packed);
        let mut dec = Decompressor::new(2);
        assert!(dec.decompress(&packed, &mut vec![]).is_err());
    }
}
