//! ARX compressed archive support
//!
//! An ARX file is a fixed header carrying a 30-word lookup table followed by
//! a bitstream that mixes control words and verbatim data words.

mod bitstream;

use std::io::Read;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

pub use bitstream::decompress_stream;

/// Number of entries in the header lookup table.
pub const LUT_LEN: usize = 30;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 16 + LUT_LEN * 4;

/// Parsed ARX header.
#[derive(Debug, Clone)]
pub struct ArxHeader {
    pub magic: [u8; 4],
    pub size_orig: u32,
    pub size_comp: u32,
    pub unk0: u32,
    pub lut: [u32; LUT_LEN],
}

impl ArxHeader {
    /// Read the header from the start of a stream.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        let size_orig = reader.read_u32::<LittleEndian>()?;
        let size_comp = reader.read_u32::<LittleEndian>()?;
        let unk0 = reader.read_u32::<LittleEndian>()?;
        let mut lut = [0u32; LUT_LEN];
        reader.read_u32_into::<LittleEndian>(&mut lut)?;

        Ok(Self {
            magic,
            size_orig,
            size_comp,
            unk0,
            lut,
        })
    }
}

/// Decompress a complete in-memory ARX file.
pub fn decompress_arx(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < HEADER_SIZE {
        return Err(Error::malformed(format!(
            "ARX file too small: {} bytes",
            data.len()
        )));
    }

    let header = ArxHeader::read(&mut &data[..HEADER_SIZE])?;
    tracing::debug!(
        "ARX header: size_orig={} size_comp={} unk0=0x{:08x}",
        header.size_orig,
        header.size_comp,
        header.unk0
    );

    decompress_stream(&header, &data[HEADER_SIZE..])
}

/// Read and decompress an ARX file from disk.
pub fn read_arx<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let data = std::fs::read(path.as_ref())?;
    let output = decompress_arx(&data)?;
    tracing::info!(
        "Decompressed {} -> {} bytes",
        path.as_ref().display(),
        output.len()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let mut data = Vec::new();
        data.extend_from_slice(b"ARX\0");
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&20u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        for i in 0..LUT_LEN as u32 {
            data.extend_from_slice(&(i * 3).to_le_bytes());
        }
        assert_eq!(data.len(), HEADER_SIZE);

        let header = ArxHeader::read(&mut data.as_slice()).unwrap();
        assert_eq!(&header.magic, b"ARX\0");
        assert_eq!(header.size_orig, 8);
        assert_eq!(header.size_comp, 20);
        assert_eq!(header.lut[29], 87);
    }

    #[test]
    fn test_short_file_is_malformed() {
        let err = decompress_arx(b"ARX\0\x04\0\0\0").unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { .. }));
    }
}
