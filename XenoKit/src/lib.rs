//! # XenoKit
//!
//! A pure-Rust library for decoding Xenosaga (PS2) asset formats.
//!
//! ## Supported Formats
//!
//! - **ARX** - Bitstream-compressed archives
//! - **LEX** - Meshes, materials and skin weights stored as VIF command streams
//! - **XTX** - Swizzled 8-bit texture pages with embedded palettes
//! - **JNT** - Joint tables and skeleton hierarchy
//!
//! Decoded data is collected into a [`Model`] and an optional [`Texture`],
//! which the [`converter`] module exports to glTF binary, OBJ/MTL and PNG.
//!
//! ## Quick Start
//!
//! ### Converting a Model
//!
//! ```no_run
//! use xenokit::prelude::*;
//!
//! let mut diag = Diagnostics::new(DecodeOptions::default());
//! let mut model = Model::new();
//!
//! let texture = read_xtx("kosmos.xtx")?;
//! read_lex("kosmos.lex", &mut model, Some(&texture), &mut diag)?;
//!
//! let palette = apply_palettes(&texture, &model, &mut diag)?;
//! write_glb("kosmos.lex.glb", &model, Some("kosmos.xtx"))?;
//! write_texture_pngs("kosmos.xtx", &texture, Some(palette.as_slice()))?;
//! # Ok::<(), xenokit::Error>(())
//! ```
//!
//! ### Decompressing an Archive
//!
//! ```no_run
//! use xenokit::formats::arx::read_arx;
//!
//! let data = read_arx("bg01.arx")?;
//! std::fs::write("bg01.arx_uncomp", data)?;
//! # Ok::<(), xenokit::Error>(())
//! ```

pub mod converter;
pub mod diagnostics;
pub mod error;
pub mod formats;
pub mod model;
pub mod options;

// Re-exports for convenience
pub use diagnostics::{Anomaly, Diagnostics};
pub use error::{Error, Result};
pub use formats::FileKind;
pub use model::{Material, Mesh, Model, Texture, Triangle, Vertex};
pub use options::DecodeOptions;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::diagnostics::{Anomaly, Diagnostics};
    pub use crate::error::{Error, Result};
    pub use crate::formats::FileKind;
    pub use crate::formats::arx::{decompress_arx, read_arx};
    pub use crate::formats::jnt::{JntFile, read_jnt};
    pub use crate::formats::lex::{LexSummary, decode_lex, read_lex};
    pub use crate::formats::xtx::{apply_palettes, decode_xtx, read_xtx};
    pub use crate::model::{Material, Mesh, Model, Texture, Triangle, Vertex};
    pub use crate::options::DecodeOptions;

    pub use crate::converter::gltf::write_glb;
    pub use crate::converter::obj::write_obj;
    pub use crate::converter::png::write_texture_pngs;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
