//! Error types for the effects domain.

/// Errors raised by frame construction and the effect units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Two images that must share dimensions did not.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// `(width, height)` of the reference image.
        expected: (u32, u32),
        /// `(width, height)` of the offending image.
        actual: (u32, u32),
    },

    /// A frame buffer that cannot describe a valid image.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// Errors raised by [`ParameterSet`](crate::params::ParameterSet) updates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("unknown parameter: {0}")]
    Unknown(String),

    #[error("parameter {name} received a non-finite value ({value})")]
    NotFinite { name: String, value: f64 },
}
