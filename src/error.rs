//! Error taxonomy for the lattice engine.
//!
//! Construction and bounds errors are `EngineError`; the binary codec has its
//! own `DecodeError` so callers can tell a bad file from a bad index.

use thiserror::Error;

/// Errors raised by lattice construction, barrier edits, and frame cropping.
///
/// Bounds errors are recoverable: the engine signals and performs no mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("lattice dimensions must be at least 1x1, got {height}x{width}")]
    EmptyLattice { height: usize, width: usize },

    #[error("field is {height}x{width}, expected {expected_height}x{expected_width}")]
    FieldSizeMismatch {
        expected_height: usize,
        expected_width: usize,
        height: usize,
        width: usize,
    },

    #[error("cell ({row}, {col}) outside {height}x{width} lattice")]
    CellOutOfBounds {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    #[error("window {sub_height}x{sub_width} at ({row}, {col}) does not fit a {height}x{width} frame")]
    WindowOutOfBounds {
        row: usize,
        col: usize,
        sub_height: usize,
        sub_width: usize,
        height: usize,
        width: usize,
    },

    #[error("frame index {index} out of range, {count} frames recorded")]
    FrameOutOfRange { index: usize, count: usize },
}

/// Errors raised while decoding a persisted lattice.
///
/// No partial state is ever returned: a failed load aborts whole.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("truncated or unreadable stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid lattice dimensions {height}x{width} in stream")]
    BadDimensions { height: i32, width: i32 },

    #[error("invalid boolean byte 0x{0:02x} in stream")]
    BadBool(u8),
}
