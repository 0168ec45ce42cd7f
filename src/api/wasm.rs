//! WASM facade over the lattice engine.
//!
//! `Simulation` wraps `LatticeState`, `FlowFrame` wraps `Frame`. The facade
//! only converts types and maps errors into `JsValue`; every numerical
//! invariant lives below this layer. Flat-buffer accessors expose the
//! macroscopic fields for zero-copy rendering from JS.

use wasm_bindgen::prelude::*;

use crate::sim::{Frame, LatticeState, Scenario, StepStats};

/// Pointer/length table for the three macroscopic field buffers. All
/// lengths are in f64 elements; multiply by 8 for bytes.
#[wasm_bindgen]
pub struct FieldLayout {
    ux_ptr: u32,
    uy_ptr: u32,
    density_ptr: u32,
    field_len_elements: u32,
    field_len_bytes: u32,
}

#[wasm_bindgen]
impl FieldLayout {
    #[wasm_bindgen(getter)]
    pub fn ux_ptr(&self) -> u32 { self.ux_ptr }
    #[wasm_bindgen(getter)]
    pub fn uy_ptr(&self) -> u32 { self.uy_ptr }
    #[wasm_bindgen(getter)]
    pub fn density_ptr(&self) -> u32 { self.density_ptr }
    #[wasm_bindgen(getter)]
    pub fn field_len_elements(&self) -> u32 { self.field_len_elements }
    #[wasm_bindgen(getter)]
    pub fn field_len_bytes(&self) -> u32 { self.field_len_bytes }
}

#[wasm_bindgen]
pub struct Simulation {
    state: LatticeState,
}

#[wasm_bindgen]
impl Simulation {
    /// Create a lattice with uniform rightward flow
    #[wasm_bindgen(constructor)]
    pub fn new(height: u32, width: u32, viscosity: f64, u0: f64) -> Result<Simulation, JsValue> {
        let state = LatticeState::new(height as usize, width as usize, viscosity, u0)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Simulation { state })
    }

    /// Build a simulation from a JSON scenario (parameters + obstacles)
    pub fn from_scenario_json(json: &str) -> Result<Simulation, JsValue> {
        let scenario =
            Scenario::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let state = scenario
            .build()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Simulation { state })
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 { self.state.height() as u32 }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 { self.state.width() as u32 }

    #[wasm_bindgen(getter)]
    pub fn omega(&self) -> f64 { self.state.omega() }

    #[wasm_bindgen(getter)]
    pub fn u0(&self) -> f64 { self.state.u0() }

    #[wasm_bindgen(getter)]
    pub fn started(&self) -> bool { self.state.started() }

    /// Advance the simulation one tick
    pub fn step(&mut self) {
        self.state.step();
    }

    /// Advance the simulation `n` ticks
    pub fn step_many(&mut self, n: u32) {
        for _ in 0..n {
            self.state.step();
        }
    }

    pub fn frame_count(&self) -> usize {
        self.state.frame_count()
    }

    /// Get a frame: a recorded history index, or -1 to capture the current
    /// state
    pub fn frame(&self, index: i32) -> Result<FlowFrame, JsValue> {
        if index < 0 {
            return Ok(FlowFrame { inner: self.state.frame() });
        }
        let inner = self
            .state
            .frame_at(index as usize)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(FlowFrame { inner })
    }

    /// Crop a window out of the current state
    pub fn subframe(
        &self,
        row: u32,
        col: u32,
        sub_height: u32,
        sub_width: u32,
    ) -> Result<FlowFrame, JsValue> {
        let inner = self
            .state
            .frame()
            .subframe(row as usize, col as usize, sub_height as usize, sub_width as usize)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(FlowFrame { inner })
    }

    pub fn get_barrier(&self, row: u32, col: u32) -> Result<bool, JsValue> {
        self.state
            .get_barrier(row as usize, col as usize)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn set_barrier(&mut self, value: bool, row: u32, col: u32) -> Result<(), JsValue> {
        self.state
            .set_barrier(value, row as usize, col as usize)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Flip one obstacle cell; returns the new value
    pub fn toggle_barrier(&mut self, row: u32, col: u32) -> Result<bool, JsValue> {
        self.state
            .toggle_barrier(row as usize, col as usize)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// The pre-run state (Edit / Save Initial State actions)
    pub fn initial_state(&self) -> Simulation {
        Simulation { state: self.state.initial_state() }
    }

    /// Serialize the whole state to bytes
    pub fn save(&self) -> Result<Vec<u8>, JsValue> {
        let mut buf = Vec::new();
        self.state
            .save(&mut buf)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(buf)
    }

    /// Reconstruct a simulation from bytes produced by `save`
    pub fn load(bytes: &[u8]) -> Result<Simulation, JsValue> {
        let state = LatticeState::load(&mut &bytes[..])
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Simulation { state })
    }

    /// Current parameters and run status as JSON
    pub fn params_json(&self) -> String {
        self.state.manifest().to_json()
    }

    /// Enable or disable per-step perf metrics (adds timing overhead when enabled)
    pub fn enable_perf_metrics(&mut self, enabled: bool) {
        self.state.enable_perf_metrics(enabled);
    }

    /// Get last step perf snapshot (zeros when perf disabled)
    pub fn get_perf_stats(&self) -> StepStats {
        self.state.perf_stats()
    }

    // === Flat buffers for JS rendering ===

    pub fn ux_ptr(&self) -> *const f64 {
        self.state.ux().as_slice().as_ptr()
    }

    pub fn uy_ptr(&self) -> *const f64 {
        self.state.uy().as_slice().as_ptr()
    }

    pub fn density_ptr(&self) -> *const f64 {
        self.state.density().as_slice().as_ptr()
    }

    pub fn field_len_elements(&self) -> usize {
        self.state.density().len()
    }

    pub fn field_len_bytes(&self) -> usize {
        self.state.density().len() * std::mem::size_of::<f64>()
    }

    pub fn field_layout(&self) -> FieldLayout {
        FieldLayout {
            ux_ptr: self.ux_ptr() as u32,
            uy_ptr: self.uy_ptr() as u32,
            density_ptr: self.density_ptr() as u32,
            field_len_elements: self.field_len_elements() as u32,
            field_len_bytes: self.field_len_bytes() as u32,
        }
    }
}

#[wasm_bindgen]
pub struct FlowFrame {
    inner: Frame,
}

#[wasm_bindgen]
impl FlowFrame {
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 { self.inner.height() as u32 }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 { self.inner.width() as u32 }

    pub fn get_barrier(&self, row: u32, col: u32) -> Result<bool, JsValue> {
        self.inner
            .get_barrier(row as usize, col as usize)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn subframe(
        &self,
        row: u32,
        col: u32,
        sub_height: u32,
        sub_width: u32,
    ) -> Result<FlowFrame, JsValue> {
        let inner = self
            .inner
            .subframe(row as usize, col as usize, sub_height as usize, sub_width as usize)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(FlowFrame { inner })
    }

    pub fn ux_ptr(&self) -> *const f64 {
        self.inner.ux().as_slice().as_ptr()
    }

    pub fn uy_ptr(&self) -> *const f64 {
        self.inner.uy().as_slice().as_ptr()
    }

    pub fn density_ptr(&self) -> *const f64 {
        self.inner.density().as_slice().as_ptr()
    }

    pub fn field_len_elements(&self) -> usize {
        self.inner.density().len()
    }

    pub fn field_len_bytes(&self) -> usize {
        self.inner.density().len() * std::mem::size_of::<f64>()
    }
}

impl Simulation {
    /// Native-side access to the wrapped state (tests, embedding).
    pub fn state(&self) -> &LatticeState {
        &self.state
    }
}

impl FlowFrame {
    pub fn frame(&self) -> &Frame {
        &self.inner
    }
}
