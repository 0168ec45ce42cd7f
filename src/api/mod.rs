//! Public API boundary.

pub mod wasm;
