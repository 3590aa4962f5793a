//! Non-fatal anomaly reporting
//!
//! Decoders report tolerated oddities here instead of printing them. Each
//! record is also emitted through `tracing`, so a subscriber sees them as
//! they happen.

use std::fmt;

use crate::options::DecodeOptions;

/// A tolerated irregularity found while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// A UV record with a type byte other than 0x00, 0x0A or 0xFF.
    UnrecognizedUvType {
        /// The type byte.
        kind: u8,
    },
    /// An UNPACK with the write-masking bit set; the mask is not applied.
    UnmaskedWrite {
        /// Stream offset of the command.
        offset: u64,
        /// The last STMASK value seen.
        mask: u32,
    },
    /// Two materials composite the same texel.
    PaletteOverlap {
        /// Texel column.
        u: u32,
        /// Texel row.
        v: u32,
        /// Material being composited.
        new: usize,
        /// Material that already owned the texel.
        old: usize,
    },
    /// Unpacked data left unflushed when a mesh ended.
    DiscardedBatch {
        /// Mesh index within its LEX file.
        mesh: usize,
        /// Number of slots dropped.
        slots: usize,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedUvType { kind } => write!(f, "unknown uv type 0x{kind:02x}"),
            Self::UnmaskedWrite { offset, mask } => {
                write!(f, "write mask 0x{mask:08x} ignored for unpack at 0x{offset:08x}")
            }
            Self::PaletteOverlap { u, v, new, old } => {
                write!(f, "palette overlap at {u} {v}: material {new} over {old}")
            }
            Self::DiscardedBatch { mesh, slots } => {
                write!(f, "mesh {mesh}: {slots} unflushed unpack slots discarded")
            }
        }
    }
}

/// Collector threaded through decoder calls.
#[derive(Debug, Default)]
pub struct Diagnostics {
    options: DecodeOptions,
    records: Vec<Anomaly>,
}

impl Diagnostics {
    #[must_use]
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.options.strict
    }

    /// Record an anomaly.
    pub fn report(&mut self, anomaly: Anomaly) {
        match anomaly {
            Anomaly::DiscardedBatch { .. } => tracing::debug!("{anomaly}"),
            _ => tracing::warn!("{anomaly}"),
        }
        self.records.push(anomaly);
    }

    #[must_use]
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.records
    }

    pub fn take(&mut self) -> Vec<Anomaly> {
        std::mem::take(&mut self.records)
    }
}
