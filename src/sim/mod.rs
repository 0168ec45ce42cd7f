//! Lattice-Boltzmann engine
//!
//! `LatticeState` owns the nine D2Q9 populations plus derived macroscopic
//! fields and advances them with stream/collide. Frames are immutable
//! snapshots; the codec persists whole states; diagnostics are read-only
//! reductions used by tests and the facade.

#[path = "perf/clock.rs"]
mod clock;
#[path = "perf/perf_stats.rs"]
mod perf_stats;

mod codec;
mod frame;
mod lattice;
mod params;

pub mod diagnostics;

pub use frame::Frame;
pub use lattice::LatticeState;
pub use params::{LatticeManifest, LatticeParams, Obstacle, Scenario};
pub use perf_stats::StepStats;
