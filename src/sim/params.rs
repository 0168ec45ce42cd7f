//! Parameters, presets, and JSON scenarios
//!
//! A `Scenario` is what the frontend ships over the boundary: lattice
//! parameters plus an optional obstacle list, as JSON. Presets cover the
//! classic setups the GUI offers out of the box.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

use super::lattice::LatticeState;

pub(crate) const DEFAULT_VISCOSITY: f64 = 0.02;
pub(crate) const DEFAULT_INFLOW: f64 = 0.05;

/// Constructor inputs for a `LatticeState`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeParams {
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_viscosity")]
    pub viscosity: f64,
    #[serde(default = "default_inflow")]
    pub u0: f64,
}

fn default_height() -> usize { 80 }
fn default_width() -> usize { 200 }
fn default_viscosity() -> f64 { DEFAULT_VISCOSITY }
fn default_inflow() -> f64 { DEFAULT_INFLOW }

impl Default for LatticeParams {
    fn default() -> Self {
        Self {
            height: default_height(),
            width: default_width(),
            viscosity: default_viscosity(),
            u0: default_inflow(),
        }
    }
}

/// Obstacle primitives rasterized onto the barrier mask. Shapes are clipped
/// to the lattice.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Obstacle {
    Cell { row: usize, col: usize },
    /// Vertical plate of `len` cells growing downward from (`row`, `col`).
    Plate { row: usize, col: usize, len: usize },
    Circle { row: usize, col: usize, radius: usize },
}

/// A complete simulation setup: parameters plus obstacles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub params: LatticeParams,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl Scenario {
    /// Classic cylinder-wake setup: a round obstacle a quarter of the way
    /// into the channel, sized to shed a Karman street at the default
    /// viscosity and inflow.
    pub fn karman() -> Self {
        let params = LatticeParams::default();
        let obstacle = Obstacle::Circle {
            row: params.height / 2,
            col: params.width / 4,
            radius: params.height / 10,
        };
        Self { params, obstacles: vec![obstacle] }
    }

    /// Short vertical plate in the stream, the classic flow-past-a-plate
    /// demo.
    pub fn plate() -> Self {
        let params = LatticeParams::default();
        let obstacle = Obstacle::Plate {
            row: params.height / 2 - params.height / 8,
            col: params.width / 4,
            len: params.height / 4,
        };
        Self { params, obstacles: vec![obstacle] }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Construct the lattice and rasterize the obstacles onto its mask.
    pub fn build(&self) -> Result<LatticeState, EngineError> {
        let mut state = LatticeState::from_params(&self.params)?;
        for obstacle in &self.obstacles {
            rasterize(&mut state, *obstacle)?;
        }
        Ok(state)
    }
}

fn rasterize(state: &mut LatticeState, obstacle: Obstacle) -> Result<(), EngineError> {
    let height = state.height();
    let width = state.width();
    match obstacle {
        Obstacle::Cell { row, col } => {
            if row < height && col < width {
                state.set_barrier(true, row, col)?;
            }
        }
        Obstacle::Plate { row, col, len } => {
            if col < width {
                for r in row..(row + len).min(height) {
                    state.set_barrier(true, r, col)?;
                }
            }
        }
        Obstacle::Circle { row, col, radius } => {
            let (cr, cc, rad) = (row as i64, col as i64, radius as i64);
            for r in (cr - rad).max(0)..=(cr + rad).min(height as i64 - 1) {
                for c in (cc - rad).max(0)..=(cc + rad).min(width as i64 - 1) {
                    let (dr, dc) = (r - cr, c - cc);
                    if dr * dr + dc * dc <= rad * rad {
                        state.set_barrier(true, r as usize, c as usize)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Read-only parameter report for the frontend.
#[derive(Clone, Debug, Serialize)]
pub struct LatticeManifest {
    pub height: usize,
    pub width: usize,
    pub omega: f64,
    pub u0: f64,
    pub started: bool,
    pub frames: usize,
}

impl LatticeManifest {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_setup() {
        let p = LatticeParams::default();
        assert_eq!(p.height, 80);
        assert_eq!(p.width, 200);
        assert_eq!(p.viscosity, 0.02);
        assert_eq!(p.u0, 0.05);
    }

    #[test]
    fn scenario_json_round_trips() {
        let scenario = Scenario::karman();
        let json = scenario.to_json().unwrap();
        let back = Scenario::from_json(&json).unwrap();
        assert_eq!(back, scenario);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let scenario = Scenario::from_json(r#"{"params": {"height": 40}}"#).unwrap();
        assert_eq!(scenario.params.height, 40);
        assert_eq!(scenario.params.width, 200);
        assert_eq!(scenario.params.u0, DEFAULT_INFLOW);
        assert!(scenario.obstacles.is_empty());
    }

    #[test]
    fn karman_preset_builds_with_obstacle() {
        let state = Scenario::karman().build().unwrap();
        assert_eq!(state.height(), 80);
        assert_eq!(state.width(), 200);
        let count = state.barrier_mask().count_set();
        assert!(count > 0);
        // the cylinder center is solid
        assert!(state.get_barrier(40, 50).unwrap());
    }

    #[test]
    fn plate_preset_builds_vertical_plate() {
        let state = Scenario::plate().build().unwrap();
        assert!(state.get_barrier(30, 50).unwrap());
        assert!(state.get_barrier(49, 50).unwrap());
        assert!(!state.get_barrier(30, 51).unwrap());
    }

    #[test]
    fn obstacles_clip_to_lattice() {
        let scenario = Scenario {
            params: LatticeParams { height: 10, width: 10, ..Default::default() },
            obstacles: vec![
                Obstacle::Circle { row: 0, col: 0, radius: 3 },
                Obstacle::Plate { row: 8, col: 4, len: 10 },
                Obstacle::Cell { row: 50, col: 50 },
            ],
        };
        let state = scenario.build().unwrap();
        assert!(state.get_barrier(0, 0).unwrap());
        assert!(state.get_barrier(9, 4).unwrap());
    }

    #[test]
    fn manifest_reports_state() {
        let mut state = Scenario::karman().build().unwrap();
        state.step();
        let manifest = state.manifest();
        assert_eq!(manifest.height, 80);
        assert!(manifest.started);
        assert_eq!(manifest.frames, 2);
        let json = manifest.to_json();
        assert!(json.contains("\"omega\""));
    }
}
