//! Frame - immutable snapshot of one simulated instant
//!
//! Holds the macroscopic fields by value (shared immutably behind Arc) and
//! the barrier mask by shared reference. Once the run has started a captured
//! frame never changes, no matter what happens to the engine afterward.

use std::sync::Arc;

use crate::core::grid::DenseGrid;
use crate::core::mask::BarrierMask;
use crate::error::EngineError;

use super::lattice::LatticeState;

#[derive(Clone)]
pub struct Frame {
    height: usize,
    width: usize,
    ux: Arc<DenseGrid>,
    uy: Arc<DenseGrid>,
    density: Arc<DenseGrid>,
    barrier: BarrierMask,
}

impl Frame {
    /// Assemble a frame from parts, rejecting grids whose dimensions
    /// disagree with the declared lattice size.
    pub fn new(
        height: usize,
        width: usize,
        barrier: BarrierMask,
        ux: Arc<DenseGrid>,
        uy: Arc<DenseGrid>,
        density: Arc<DenseGrid>,
    ) -> Result<Self, EngineError> {
        for grid in [&ux, &uy, &density] {
            if grid.height() != height || grid.width() != width {
                return Err(EngineError::FieldSizeMismatch {
                    expected_height: height,
                    expected_width: width,
                    height: grid.height(),
                    width: grid.width(),
                });
            }
        }
        if barrier.height() != height || barrier.width() != width {
            return Err(EngineError::FieldSizeMismatch {
                expected_height: height,
                expected_width: width,
                height: barrier.height(),
                width: barrier.width(),
            });
        }
        Ok(Self { height, width, ux, uy, density, barrier })
    }

    /// Snapshot the engine's current macroscopic fields. Field grids are
    /// materialized fresh; the barrier buffer is shared.
    pub(super) fn capture(state: &LatticeState) -> Frame {
        Frame {
            height: state.height,
            width: state.width,
            ux: Arc::new(state.ux.clone()),
            uy: Arc::new(state.uy.clone()),
            density: Arc::new(state.rho.clone()),
            barrier: state.barrier.clone(),
        }
    }

    #[inline]
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn width(&self) -> usize { self.width }

    pub fn ux(&self) -> &DenseGrid { &self.ux }

    pub fn uy(&self) -> &DenseGrid { &self.uy }

    pub fn density(&self) -> &DenseGrid { &self.density }

    pub fn barrier(&self) -> &BarrierMask { &self.barrier }

    pub fn get_barrier(&self, row: usize, col: usize) -> Result<bool, EngineError> {
        if row >= self.height || col >= self.width {
            return Err(EngineError::CellOutOfBounds {
                row,
                col,
                height: self.height,
                width: self.width,
            });
        }
        Ok(self.barrier.get(row, col))
    }

    /// Crop a rectangular window into a new frame. Every grid and the
    /// barrier mask are independently-owned copies; nothing is shared with
    /// the parent. Zero-sized or overhanging windows are rejected.
    pub fn subframe(
        &self,
        row: usize,
        col: usize,
        sub_height: usize,
        sub_width: usize,
    ) -> Result<Frame, EngineError> {
        let fits = sub_height > 0
            && sub_width > 0
            && row.checked_add(sub_height).is_some_and(|end| end <= self.height)
            && col.checked_add(sub_width).is_some_and(|end| end <= self.width);
        if !fits {
            return Err(EngineError::WindowOutOfBounds {
                row,
                col,
                sub_height,
                sub_width,
                height: self.height,
                width: self.width,
            });
        }
        Ok(Frame {
            height: sub_height,
            width: sub_width,
            ux: Arc::new(self.ux.window(row, col, sub_height, sub_width)),
            uy: Arc::new(self.uy.window(row, col, sub_height, sub_width)),
            density: Arc::new(self.density.window(row, col, sub_height, sub_width)),
            barrier: self.barrier.window(row, col, sub_height, sub_width),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> LatticeState {
        let mut state = LatticeState::new(8, 12, 0.02, 0.05).unwrap();
        state.set_barrier(true, 3, 4).unwrap();
        state.set_barrier(true, 6, 10).unwrap();
        for _ in 0..3 {
            state.step();
        }
        state
    }

    #[test]
    fn subframe_matches_parent_window() {
        let state = sample_state();
        let frame = state.frame();
        let sub = frame.subframe(2, 3, 4, 5).unwrap();
        assert_eq!(sub.height(), 4);
        assert_eq!(sub.width(), 5);
        for r in 0..4 {
            for c in 0..5 {
                assert_eq!(sub.ux().get(r, c), frame.ux().get(2 + r, 3 + c));
                assert_eq!(sub.uy().get(r, c), frame.uy().get(2 + r, 3 + c));
                assert_eq!(sub.density().get(r, c), frame.density().get(2 + r, 3 + c));
                assert_eq!(
                    sub.get_barrier(r, c).unwrap(),
                    frame.get_barrier(2 + r, 3 + c).unwrap()
                );
            }
        }
    }

    #[test]
    fn subframe_owns_its_barrier() {
        let state = sample_state();
        let frame = state.frame();
        let sub = frame.subframe(0, 0, 8, 12).unwrap();
        assert!(!sub.barrier().shares_buffer(frame.barrier()));
    }

    #[test]
    fn subframe_survives_parent_stepping() {
        let mut state = sample_state();
        let sub = state.frame().subframe(1, 1, 3, 3).unwrap();
        let ux_then = sub.ux().get(1, 1);
        let rho_then = sub.density().get(2, 2);
        for _ in 0..4 {
            state.step();
        }
        assert_eq!(sub.ux().get(1, 1), ux_then);
        assert_eq!(sub.density().get(2, 2), rho_then);
    }

    #[test]
    fn subframe_rejects_overhang_and_zero_size() {
        let state = sample_state();
        let frame = state.frame();
        assert!(matches!(
            frame.subframe(5, 0, 4, 2),
            Err(EngineError::WindowOutOfBounds { .. })
        ));
        assert!(matches!(
            frame.subframe(0, 10, 2, 3),
            Err(EngineError::WindowOutOfBounds { .. })
        ));
        assert!(matches!(
            frame.subframe(0, 0, 0, 3),
            Err(EngineError::WindowOutOfBounds { .. })
        ));
        // touching the far edge is fine
        assert!(frame.subframe(4, 7, 4, 5).is_ok());
    }

    #[test]
    fn constructor_rejects_mismatched_grids() {
        let err = Frame::new(
            4,
            4,
            BarrierMask::new(4, 4),
            Arc::new(DenseGrid::new(4, 4)),
            Arc::new(DenseGrid::new(3, 4)),
            Arc::new(DenseGrid::new(4, 4)),
        );
        assert!(matches!(err, Err(EngineError::FieldSizeMismatch { .. })));

        let err = Frame::new(
            4,
            4,
            BarrierMask::new(5, 4),
            Arc::new(DenseGrid::new(4, 4)),
            Arc::new(DenseGrid::new(4, 4)),
            Arc::new(DenseGrid::new(4, 4)),
        );
        assert!(matches!(err, Err(EngineError::FieldSizeMismatch { .. })));
    }

    #[test]
    fn frame_bounds_are_checked() {
        let state = sample_state();
        let frame = state.frame();
        assert!(frame.get_barrier(7, 11).is_ok());
        assert!(matches!(
            frame.get_barrier(8, 0),
            Err(EngineError::CellOutOfBounds { .. })
        ));
    }
}
