//! ARX bitstream decoder
//!
//! Control bits are read MSB-first from little-endian 32-bit units. A `0`
//! bit copies the next word of the stream verbatim; a `1` bit introduces a
//! variable-length code selecting one of the 30 lookup-table words.

use super::{ArxHeader, LUT_LEN};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Marker,
    Lut,
}

struct BitstreamDecoder<'a> {
    input: &'a [u8],
    src: usize,
    register: u32,
    bits_left: u32,
    output: Vec<u8>,
    expected: usize,
}

impl<'a> BitstreamDecoder<'a> {
    fn new(input: &'a [u8], expected: usize) -> Self {
        Self {
            input,
            src: 0,
            register: 0,
            bits_left: 0,
            // round up so the last word fits before truncation
            output: Vec::with_capacity(expected.next_multiple_of(4)),
            expected,
        }
    }

    fn truncated(&self) -> Error {
        Error::TruncatedStream {
            produced: self.output.len().min(self.expected),
            expected: self.expected,
        }
    }

    fn next_word(&mut self) -> Result<u32> {
        let bytes = self
            .input
            .get(self.src..self.src + 4)
            .ok_or_else(|| self.truncated())?;
        self.src += 4;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn peek_bit(&mut self) -> Result<u32> {
        if self.bits_left == 0 {
            self.register = self.next_word()?;
            self.bits_left = 32;
        }
        Ok(self.register >> 31)
    }

    fn consume_bit(&mut self) {
        self.register <<= 1;
        self.bits_left -= 1;
    }

    fn emit(&mut self, word: u32) -> bool {
        self.output.extend_from_slice(&word.to_le_bytes());
        self.output.len() >= self.expected
    }

    fn decode(mut self, lut: &[u32; LUT_LEN]) -> Result<Vec<u8>> {
        let mut state = State::Data;
        let mut code_value = 0u8;
        let mut code_pos = 0u8;
        let mut code_len = 0u8;

        while self.output.len() < self.expected {
            let bit = self.peek_bit()?;
            match state {
                State::Data => {
                    if bit == 1 {
                        state = State::Marker;
                        continue;
                    }
                    self.consume_bit();
                    let word = self.next_word()?;
                    if self.emit(word) {
                        break;
                    }
                }
                State::Marker => {
                    code_value = 0;
                    code_pos = 0;
                    code_len = 0;
                    state = State::Lut;
                    self.consume_bit();
                }
                State::Lut => {
                    self.consume_bit();
                    let bit = bit as u8;
                    code_value = (code_value << 1) | bit;
                    match code_pos {
                        0 => code_len = if bit == 1 { 4 } else { 2 },
                        1 if code_len == 4 && bit == 1 => code_len = 6,
                        2 if code_len == 6 && bit == 1 => code_len = 8,
                        _ => {}
                    }
                    code_pos += 1;

                    if code_pos == code_len {
                        state = State::Data;
                        let index = lut_index(code_len, code_value);
                        let word = *lut.get(index).ok_or_else(|| {
                            Error::malformed(format!(
                                "ARX code selects LUT entry {index} at stream offset 0x{:x}",
                                self.src
                            ))
                        })?;
                        if self.emit(word) {
                            break;
                        }
                    }
                }
            }
        }

        self.output.truncate(self.expected);
        tracing::debug!(
            "ARX: decoded {} bytes from {} of {} input bytes",
            self.output.len(),
            self.src,
            self.input.len()
        );
        Ok(self.output)
    }
}

/// Map a completed prefix code to its lookup-table index.
fn lut_index(len: u8, value: u8) -> usize {
    let value = value as usize;
    match len {
        2 => value,
        4 => 2 + (value & 0x7),
        6 => 6 + (value & 0xF),
        _ => 14 + (value & 0x1F),
    }
}

/// Decompress the bitstream that follows an ARX header.
///
/// The output is exactly `header.size_orig` bytes long.
///
/// # Errors
/// Returns [`Error::TruncatedStream`] if the stream ends early and
/// [`Error::MalformedHeader`] if a code selects a table entry past the end.
pub fn decompress_stream(header: &ArxHeader, stream: &[u8]) -> Result<Vec<u8>> {
    let expected = header.size_orig as usize;
    BitstreamDecoder::new(stream, expected).decode(&header.lut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Minimal encoder mirroring the decoder's read order.
    struct Encoder {
        words: Vec<u32>,
        control: Option<usize>,
        used: u32,
    }

    impl Encoder {
        fn new() -> Self {
            Self {
                words: Vec::new(),
                control: None,
                used: 0,
            }
        }

        fn bit(&mut self, bit: u32) {
            let slot = match self.control {
                Some(slot) if self.used < 32 => slot,
                _ => {
                    self.words.push(0);
                    self.used = 0;
                    let slot = self.words.len() - 1;
                    self.control = Some(slot);
                    slot
                }
            };
            self.words[slot] |= bit << (31 - self.used);
            self.used += 1;
        }

        fn bits(&mut self, value: u32, len: u32) {
            for i in (0..len).rev() {
                self.bit((value >> i) & 1);
            }
        }

        fn raw(&mut self, word: u32) {
            self.bit(0);
            self.words.push(word);
        }

        fn lut(&mut self, index: usize) {
            self.bit(1);
            match index {
                0..=1 => self.bits(index as u32, 2),
                2..=5 => self.bits(0b1000 | (index as u32 - 2), 4),
                6..=13 => self.bits(0b11_0000 | (index as u32 - 6), 6),
                _ => self.bits(0b1110_0000 | (index as u32 - 14), 8),
            }
        }

        fn finish(self) -> Vec<u8> {
            self.words.iter().flat_map(|w| w.to_le_bytes()).collect()
        }
    }

    fn test_lut() -> [u32; LUT_LEN] {
        std::array::from_fn(|i| 0x1000_0001u32.wrapping_mul(i as u32 + 1) ^ 0xA5A5_0000)
    }

    fn header(size_orig: u32) -> ArxHeader {
        ArxHeader {
            magic: *b"ARX\0",
            size_orig,
            size_comp: 0,
            unk0: 0,
            lut: test_lut(),
        }
    }

    fn encode(words: &[u32], lut: &[u32; LUT_LEN]) -> Vec<u8> {
        let mut enc = Encoder::new();
        for &word in words {
            match lut.iter().position(|&entry| entry == word) {
                Some(index) => enc.lut(index),
                None => enc.raw(word),
            }
        }
        enc.finish()
    }

    #[test]
    fn test_roundtrip_every_code_length() {
        let lut = test_lut();
        let mut words: Vec<u32> = lut.to_vec();
        words.extend([0xDEAD_BEEF, 0, 1, 0x1234_5678]);
        words.extend(lut.iter().rev());
        for i in 0..40u32 {
            words.push(i.wrapping_mul(0x9E37_79B9));
        }

        let original: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let stream = encode(&words, &lut);
        let output = decompress_stream(&header(original.len() as u32), &stream).unwrap();

        assert_eq!(output, original);
    }

    #[test]
    fn test_output_length_matches_size_orig() {
        let lut = test_lut();
        let words = [lut[3], 0xCAFE_F00D, lut[20]];
        let stream = encode(&words, &lut);

        let output = decompress_stream(&header(10), &stream).unwrap();
        assert_eq!(output.len(), 10);
        assert_eq!(&output[..4], &lut[3].to_le_bytes());
        assert_eq!(&output[8..10], &lut[20].to_le_bytes()[..2]);
    }

    #[test]
    fn test_empty_output() {
        assert!(decompress_stream(&header(0), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_stream() {
        let lut = test_lut();
        let words = [0x1111_1111, 0x2222_2222, lut[0]];
        let stream = encode(&words, &lut);

        let err = decompress_stream(&header(16), &stream).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedStream {
                produced: 12,
                expected: 16
            }
        ));
    }

    #[test]
    fn test_lut_index_mapping() {
        assert_eq!(lut_index(2, 0b01), 1);
        assert_eq!(lut_index(4, 0b1011), 5);
        assert_eq!(lut_index(6, 0b11_0111), 13);
        assert_eq!(lut_index(8, 0b1110_1111), 29);
    }

    #[test]
    fn test_code_past_table_is_rejected() {
        let mut enc = Encoder::new();
        enc.bit(1);
        enc.bits(0b1111_0000, 8); // index 30
        let err = decompress_stream(&header(4), &enc.finish()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
    }
}
