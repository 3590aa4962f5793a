//! Xenosaga file format support
//!
//! # Supported Formats
//!
//! - **ARX** - Bitstream-compressed archives
//! - **LEX** - Meshes with inline materials (VIF command streams)
//! - **XTX** - Swizzled texture pages with embedded palettes
//! - **JNT** - Joint tables

pub mod arx;
pub mod jnt;
pub mod lex;
pub mod xtx;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// File type detected from the first four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Lex,
    Xtx,
    Jnt,
    Arx,
    Unknown,
}

impl FileKind {
    /// Classify by magic. Fewer than four bytes is `Unknown`.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes.get(..4) {
            Some(b"lex\0") => Self::Lex,
            Some(b"XTX\0") => Self::Xtx,
            Some(b"JNT\0") => Self::Jnt,
            Some(b"ARX\0") => Self::Arx,
            _ => Self::Unknown,
        }
    }

    /// Classify a file on disk by reading its magic.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut magic = Vec::with_capacity(4);
        File::open(path.as_ref())?.take(4).read_to_end(&mut magic)?;
        Ok(Self::sniff(&magic))
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Lex => "LEX",
            Self::Xtx => "XTX",
            Self::Jnt => "JNT",
            Self::Arx => "ARX",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sniff() {
        assert_eq!(FileKind::sniff(b"lex\0rest"), FileKind::Lex);
        assert_eq!(FileKind::sniff(b"XTX\0"), FileKind::Xtx);
        assert_eq!(FileKind::sniff(b"JNT\0"), FileKind::Jnt);
        assert_eq!(FileKind::sniff(b"ARX\0"), FileKind::Arx);
        assert_eq!(FileKind::sniff(b"LEX\0"), FileKind::Unknown);
        assert_eq!(FileKind::sniff(b"AR"), FileKind::Unknown);
    }

    #[test]
    fn test_detect_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"XTX\0\x10\0\0\0").unwrap();
        assert_eq!(FileKind::detect(file.path()).unwrap(), FileKind::Xtx);
    }
}
