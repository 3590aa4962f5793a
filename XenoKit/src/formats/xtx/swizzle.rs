//! PSMT8 tile unswizzle.
//!
//! Texture pages are uploaded as 32-bit pixels but sampled as 8-bit indices.
//! Every 16x16 block of indices is interleaved through the bytes of the
//! matching 32-bit block, with alternate row pairs rotated by four columns.

/// Byte offset in the swizzled canvas holding index texel `(x, y)`.
#[must_use]
pub fn source_index(x: usize, y: usize, width: usize) -> usize {
    let block = (y & !0xF) * width + (x & !0xF) * 2;
    let swap = (((y + 2) >> 2) & 1) * 4;
    let pos_y = (((y & !3) >> 1) + (y & 1)) & 7;
    let column = pos_y * width * 2 + ((x + swap) & 7) * 4;
    let byte = ((y >> 1) & 1) + ((x >> 2) & 2);
    block + column + byte
}

/// Rearrange a swizzled canvas into a linear `width` x `height` index map.
///
/// Source offsets past the end of `src` read as 0.
#[must_use]
pub fn unswizzle8(src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; width * height];
    for y in 0..height {
        let row = &mut out[y * width..(y + 1) * width];
        for (x, texel) in row.iter_mut().enumerate() {
            *texel = src.get(source_index(x, y, width)).copied().unwrap_or(0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hand_computed_offsets() {
        assert_eq!(source_index(0, 0, 16), 0);
        assert_eq!(source_index(1, 0, 16), 4);
        assert_eq!(source_index(8, 0, 16), 2);
        assert_eq!(source_index(0, 1, 16), 32);
        assert_eq!(source_index(0, 2, 16), 17);
        // rotated row pair: column (5 + 4) & 7, byte 1
        assert_eq!(source_index(5, 2, 16), 5);
        assert_eq!(source_index(6, 3, 16), 41);
        assert_eq!(source_index(3, 5, 16), 124);
        assert_eq!(source_index(12, 6, 16), 83);
        assert_eq!(source_index(16, 0, 32), 32);
    }

    #[test]
    fn test_is_a_permutation() {
        for (width, height) in [(16, 16), (32, 32), (64, 16)] {
            let mut seen: Vec<usize> = (0..height)
                .flat_map(|y| (0..width).map(move |x| source_index(x, y, width)))
                .collect();
            seen.sort_unstable();
            let expected: Vec<usize> = (0..width * height).collect();
            assert_eq!(seen, expected, "{width}x{height}");
        }
    }

    #[test]
    fn test_unswizzle_reads_source_offsets() {
        let src: Vec<u8> = (0..=255).collect();
        let out = unswizzle8(&src, 16, 16);
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 4);
        assert_eq!(out[2 * 16], 17);
        assert_eq!(out[2 * 16 + 5], 5);
        assert_eq!(out[5 * 16 + 3], 124);
    }

    #[test]
    fn test_short_source_reads_zero() {
        let out = unswizzle8(&[7u8; 8], 16, 16);
        assert_eq!(out[0], 7);
        assert_eq!(out[16], 0);
    }
}
