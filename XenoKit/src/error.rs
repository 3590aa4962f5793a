//! Error types for `XenoKit`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `XenoKit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from open/seek/read/write operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Container Errors ====================
    /// A header field or declared offset cannot be trusted.
    #[error("malformed header: {message}")]
    MalformedHeader {
        /// Description of what is invalid.
        message: String,
    },

    /// The first four bytes match none of the known magics.
    #[error("unrecognized file type: {path}")]
    UnknownFileType {
        /// The offending input path.
        path: PathBuf,
    },

    /// More than one XTX, JNT or ARX file was given for a single run.
    #[error("multiple {kind} files given ({path})")]
    DuplicateInput {
        /// File kind name.
        kind: &'static str,
        /// The second file of that kind.
        path: PathBuf,
    },

    // ==================== ARX Errors ====================
    /// The ARX bitstream ran out before `size_orig` bytes were produced.
    #[error("ARX stream truncated: produced {produced} of {expected} bytes")]
    TruncatedStream {
        /// Bytes emitted before the input ran out.
        produced: usize,
        /// Declared original size.
        expected: usize,
    },

    // ==================== LEX / VIF Errors ====================
    /// A VIF command outside every recognized opcode range.
    #[error("unknown VIF command 0x{opcode:02x} at 0x{offset:08x}")]
    UnknownOpcode {
        /// The command byte.
        opcode: u8,
        /// Stream offset of the command.
        offset: u64,
    },

    /// An UNPACK command that cannot be executed.
    #[error("invalid UNPACK 0x{opcode:02x} at 0x{offset:08x}: {reason}")]
    InvalidUnpack {
        /// The command byte.
        opcode: u8,
        /// Stream offset of the command.
        offset: u64,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// More UNPACK blocks in one batch than the slot arena holds.
    #[error("unpack slot arena exhausted at 0x{offset:08x} (max {max} slots)")]
    SlotOverflow {
        /// Stream offset of the command.
        offset: u64,
        /// Arena capacity.
        max: usize,
    },

    /// A mesh block header announced an unknown block kind.
    #[error("unknown mesh block kind 0x{kind:02x} at 0x{offset:08x}")]
    UnknownBlockKind {
        /// The kind byte.
        kind: u8,
        /// Stream offset of the block header.
        offset: u64,
    },

    /// A material block whose payload length matches neither known record.
    #[error("unknown material block of {length} bytes at 0x{offset:08x}")]
    UnknownMaterialBlock {
        /// Payload length in bytes.
        length: usize,
        /// Stream offset of the payload.
        offset: u64,
    },

    /// A flushed batch whose slots do not fit the declared vertex layout.
    #[error("malformed vertex batch: {message}")]
    MalformedBatch {
        /// Description of the mismatch.
        message: String,
    },

    /// A mesh `vertex_format` that has not been reverse engineered.
    #[error("unsupported vertex format 0x{format:02x}")]
    UnsupportedVertexFormat {
        /// The (masked) vertex format.
        format: u8,
    },

    /// A mesh `weight_format` that has not been reverse engineered.
    #[error("unknown weight format {format}")]
    UnknownWeightFormat {
        /// The raw weight format.
        format: u32,
    },

    /// A bone index that points outside the mesh joint table.
    #[error("bone index {raw} resolves outside the joint table")]
    InvalidJointReference {
        /// The raw index word.
        raw: u32,
    },

    // ==================== XTX Errors ====================
    /// An XTX `buffer_width` other than 4 or 8.
    #[error("unsupported XTX buffer width {width}")]
    UnsupportedBufferWidth {
        /// The buffer width found.
        width: u16,
    },

    /// Sub-images of one XTX file disagree on `buffer_width`.
    #[error("XTX buffer width mismatch: image {index} has {found}, expected {expected}")]
    BufferWidthMismatch {
        /// Sub-image index.
        index: usize,
        /// Width of the first sub-image.
        expected: u16,
        /// Width of this sub-image.
        found: u16,
    },

    /// Two different materials claim the same texel (strict mode).
    #[error("palette overlap at ({u}, {v}): material {new} over {old}")]
    OverlapConflict {
        /// Texel column.
        u: u32,
        /// Texel row.
        v: u32,
        /// Material being composited.
        new: usize,
        /// Material that already owns the texel.
        old: usize,
    },

    // ==================== Export Errors ====================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Failed to create an image buffer from texture data.
    #[error("failed to create image buffer")]
    ImageBufferFailed,

    /// Failed to encode PNG image.
    #[error("failed to encode PNG: {message}")]
    PngEncodeFailed {
        /// The encoding error message.
        message: String,
    },
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedHeader {
            message: message.into(),
        }
    }

    pub(crate) fn batch(message: impl Into<String>) -> Self {
        Error::MalformedBatch {
            message: message.into(),
        }
    }
}

/// A specialized Result type for `XenoKit` operations.
pub type Result<T> = std::result::Result<T, Error>;
