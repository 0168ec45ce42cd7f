use wasm_bindgen::prelude::*;

/// Per-step timing snapshot (zeros when perf metrics are disabled).
#[wasm_bindgen]
#[derive(Clone, Default)]
pub struct StepStats {
    pub(super) step_ms: f64,
    pub(super) stream_ms: f64,
    pub(super) collide_ms: f64,
    pub(super) capture_ms: f64,
    pub(super) lattice_cells: u32,
    pub(super) barrier_cells: u32,
    pub(super) frames_recorded: u32,
}

impl StepStats {
    pub(crate) fn reset(&mut self) {
        *self = StepStats::default();
    }
}

#[wasm_bindgen]
impl StepStats {
    #[wasm_bindgen(getter)]
    pub fn step_ms(&self) -> f64 { self.step_ms }
    #[wasm_bindgen(getter)]
    pub fn stream_ms(&self) -> f64 { self.stream_ms }
    #[wasm_bindgen(getter)]
    pub fn collide_ms(&self) -> f64 { self.collide_ms }
    #[wasm_bindgen(getter)]
    pub fn capture_ms(&self) -> f64 { self.capture_ms }
    #[wasm_bindgen(getter)]
    pub fn lattice_cells(&self) -> u32 { self.lattice_cells }
    #[wasm_bindgen(getter)]
    pub fn barrier_cells(&self) -> u32 { self.barrier_cells }
    #[wasm_bindgen(getter)]
    pub fn frames_recorded(&self) -> u32 { self.frames_recorded }
}
