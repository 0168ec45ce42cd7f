//! Vortica Engine - D2Q9 lattice-Boltzmann flow simulation in WASM
//!
//! Architecture:
//! - core/  - dense grid and barrier mask primitives
//! - sim/   - lattice engine, frames, persistence, diagnostics
//! - api/   - public WASM boundary
//!
//! The numerical core is plain Rust and fully exercised by native tests;
//! the JS/canvas frontend only sees the facade in api/wasm.rs.

pub mod core;
pub mod sim;
pub mod api;
pub mod error;

pub use crate::core::grid::DenseGrid;
pub use crate::core::mask::BarrierMask;
pub use crate::error::{DecodeError, EngineError};
pub use crate::sim::{
    diagnostics, Frame, LatticeParams, LatticeState, Obstacle, Scenario, StepStats,
};

use wasm_bindgen::prelude::*;

// Re-export wasm-bindgen-rayon for thread pool initialization from JS
#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
pub use wasm_bindgen_rayon::init_thread_pool;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

// Better error messages in debug mode
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the engine
#[wasm_bindgen]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    web_sys::console::log_1(&"🦀 Vortica WASM flow engine initialized!".into());
}

/// Get engine version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Re-export main facade types
pub use crate::api::wasm::{FieldLayout, FlowFrame, Simulation};
