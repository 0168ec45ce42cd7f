//! Core primitives: dense per-cell storage and the shared barrier mask.

pub mod grid;
pub mod mask;

pub use grid::DenseGrid;
pub use mask::BarrierMask;
