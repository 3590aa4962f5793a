//! Decode configuration
//!
//! Options are passed explicitly to every decoder; nothing in the crate
//! reads global state.

use serde::{Deserialize, Serialize};

/// Options controlling how tolerant the decoders are.
///
/// # Example
///
/// ```
/// use xenokit::DecodeOptions;
///
/// // Tolerant decoding (the default)
/// let options = DecodeOptions::new();
/// assert!(!options.strict);
///
/// // Strict decoding: unrecognized UV layouts become textureless and
/// // overlapping palette rectangles abort the conversion.
/// let options = DecodeOptions::new().with_strict(true);
/// assert!(options.strict);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Treat tolerated anomalies as hard inconsistencies.
    pub strict: bool,

    /// Rescale V coordinates by the loaded texture's used height.
    /// Default: true
    pub apply_texture_scale: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict: false,
            apply_texture_scale: true,
        }
    }
}

impl DecodeOptions {
    /// Create options with tolerant defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict options.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Set strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set whether V coordinates follow the texture's used height.
    #[must_use]
    pub fn with_texture_scale(mut self, apply: bool) -> Self {
        self.apply_texture_scale = apply;
        self
    }

    /// Load options from a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = DecodeOptions::from_json(r#"{ "strict": true }"#).unwrap();
        assert!(options.strict);
        assert!(options.apply_texture_scale);
    }

    #[test]
    fn test_builders() {
        assert_eq!(DecodeOptions::strict(), DecodeOptions::new().with_strict(true));
        assert!(!DecodeOptions::new().with_texture_scale(false).apply_texture_scale);
    }
}
