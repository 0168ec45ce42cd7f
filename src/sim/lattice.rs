//! LatticeState - the D2Q9 stream/collide engine
//!
//! Nine population grids per cell (rest + 4 axis + 4 diagonal), advanced by
//! `step()`: periodic streaming with bounce-back at barrier cells, then BGK
//! relaxation toward local equilibrium with inflow forcing at the left
//! column. Row axis: north = increasing row. Column axis: east = increasing
//! column.

use crate::core::grid::DenseGrid;
use crate::core::mask::BarrierMask;
use crate::error::EngineError;

use super::frame::Frame;
use super::params::{LatticeManifest, LatticeParams};
use super::clock::now_ms;
use super::perf_stats::StepStats;

// Lattice-Boltzmann weight factors
pub(crate) const FOUR_NINTHS: f64 = 4.0 / 9.0;
pub(crate) const ONE_NINTH: f64 = 1.0 / 9.0;
pub(crate) const ONE_36TH: f64 = 1.0 / 36.0;

/// D2Q9 equilibrium polynomial for one direction.
/// `eu` is the direction/velocity dot product, `u2` the squared speed.
#[inline]
pub(crate) fn equilibrium(weight: f64, rho: f64, eu: f64, u2: f64) -> f64 {
    weight * rho * (1.0 + 3.0 * eu + 4.5 * eu * eu - 1.5 * u2)
}

/// Moving directions, used to address population grids in the bounce-back
/// correction pass. The rest population never reflects.
#[derive(Clone, Copy, Debug)]
enum Dir {
    N,
    S,
    E,
    W,
    Ne,
    Se,
    Nw,
    Sw,
}

/// One pending bounce-back write, gathered before any correction lands so
/// the result is independent of barrier iteration order.
#[derive(Clone, Copy)]
struct BounceWrite {
    dir: Dir,
    row: usize,
    col: usize,
    value: f64,
}

pub struct LatticeState {
    pub(super) height: usize,
    pub(super) width: usize,
    /// Relaxation factor, 1/(3*viscosity + 0.5). The persisted truth;
    /// viscosity itself is not stored.
    pub(super) omega: f64,
    /// Inflow speed forced at the leftmost column every collision.
    pub(super) u0: f64,
    pub(super) started: bool,

    pub(super) f_rest: DenseGrid,
    pub(super) f_n: DenseGrid,
    pub(super) f_s: DenseGrid,
    pub(super) f_e: DenseGrid,
    pub(super) f_w: DenseGrid,
    pub(super) f_ne: DenseGrid,
    pub(super) f_se: DenseGrid,
    pub(super) f_nw: DenseGrid,
    pub(super) f_sw: DenseGrid,

    pub(super) rho: DenseGrid,
    pub(super) ux: DenseGrid,
    pub(super) uy: DenseGrid,

    pub(super) barrier: BarrierMask,

    /// Captured history: frame 0 at construction, one more per step.
    pub(super) frames: Vec<Frame>,
    /// Deep pre-run copy, recorded on the first step.
    pub(super) initial: Option<Box<LatticeState>>,

    // Reusable buffers for the streaming pass
    scratch: DenseGrid,
    bounce: Vec<BounceWrite>,

    perf_enabled: bool,
    perf: StepStats,
}

impl LatticeState {
    /// Uniform rightward flow of speed `u0` at density 1, no barriers.
    pub fn new(
        height: usize,
        width: usize,
        viscosity: f64,
        u0: f64,
    ) -> Result<Self, EngineError> {
        if height == 0 || width == 0 {
            return Err(EngineError::EmptyLattice { height, width });
        }
        debug_assert!(
            (FOUR_NINTHS + 4.0 * ONE_NINTH + 4.0 * ONE_36TH - 1.0).abs() < 1e-12,
            "lattice weights must sum to 1"
        );

        let omega = 1.0 / (3.0 * viscosity + 0.5);
        let u2 = u0 * u0;
        let axis_rest = equilibrium(ONE_NINTH, 1.0, 0.0, u2);
        let mut state = LatticeState {
            height,
            width,
            omega,
            u0,
            started: false,
            f_rest: DenseGrid::filled(height, width, equilibrium(FOUR_NINTHS, 1.0, 0.0, u2)),
            f_n: DenseGrid::filled(height, width, axis_rest),
            f_s: DenseGrid::filled(height, width, axis_rest),
            f_e: DenseGrid::filled(height, width, equilibrium(ONE_NINTH, 1.0, u0, u2)),
            f_w: DenseGrid::filled(height, width, equilibrium(ONE_NINTH, 1.0, -u0, u2)),
            f_ne: DenseGrid::filled(height, width, equilibrium(ONE_36TH, 1.0, u0, u2)),
            f_se: DenseGrid::filled(height, width, equilibrium(ONE_36TH, 1.0, u0, u2)),
            f_nw: DenseGrid::filled(height, width, equilibrium(ONE_36TH, 1.0, -u0, u2)),
            f_sw: DenseGrid::filled(height, width, equilibrium(ONE_36TH, 1.0, -u0, u2)),
            rho: DenseGrid::filled(height, width, 1.0),
            ux: DenseGrid::filled(height, width, u0),
            uy: DenseGrid::new(height, width),
            barrier: BarrierMask::new(height, width),
            frames: Vec::new(),
            initial: None,
            scratch: DenseGrid::new(height, width),
            bounce: Vec::new(),
            perf_enabled: false,
            perf: StepStats::default(),
        };
        let frame0 = state.frame();
        state.frames.push(frame0);
        Ok(state)
    }

    pub fn from_params(params: &LatticeParams) -> Result<Self, EngineError> {
        Self::new(params.height, params.width, params.viscosity, params.u0)
    }

    #[inline]
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn width(&self) -> usize { self.width }

    #[inline]
    pub fn omega(&self) -> f64 { self.omega }

    #[inline]
    pub fn u0(&self) -> f64 { self.u0 }

    #[inline]
    pub fn started(&self) -> bool { self.started }

    /// Macroscopic x velocity, updated by the last `collide()`.
    pub fn ux(&self) -> &DenseGrid { &self.ux }

    /// Macroscopic y velocity, updated by the last `collide()`.
    pub fn uy(&self) -> &DenseGrid { &self.uy }

    /// Macroscopic density, updated by the last `collide()`.
    pub fn density(&self) -> &DenseGrid { &self.rho }

    pub fn barrier_mask(&self) -> &BarrierMask { &self.barrier }

    pub fn manifest(&self) -> LatticeManifest {
        LatticeManifest {
            height: self.height,
            width: self.width,
            omega: self.omega,
            u0: self.u0,
            started: self.started,
            frames: self.frames.len(),
        }
    }

    /// Advance the simulation by one tick: stream, collide, record a frame.
    pub fn step(&mut self) {
        if !self.started {
            // The state the Edit and Save-Initial-State actions go back to.
            self.initial = Some(Box::new(self.snapshot()));
            self.started = true;
        }

        let perf_on = self.perf_enabled;
        if perf_on {
            self.perf.reset();
            self.perf.lattice_cells = (self.height * self.width) as u32;
            self.perf.barrier_cells = self.barrier.count_set() as u32;
        }
        let step_start = perf_on.then(now_ms);

        if perf_on {
            let t0 = now_ms();
            self.stream();
            self.perf.stream_ms = now_ms() - t0;
            let t0 = now_ms();
            self.collide();
            self.perf.collide_ms = now_ms() - t0;
            let t0 = now_ms();
            let frame = self.frame();
            self.frames.push(frame);
            self.perf.capture_ms = now_ms() - t0;
        } else {
            self.stream();
            self.collide();
            let frame = self.frame();
            self.frames.push(frame);
        }

        if let Some(t0) = step_start {
            self.perf.step_ms = now_ms() - t0;
            self.perf.frames_recorded = self.frames.len() as u32;
        }
    }

    /// Enable or disable per-step perf metrics (adds timing overhead when enabled)
    pub fn enable_perf_metrics(&mut self, enabled: bool) {
        self.perf_enabled = enabled;
    }

    /// Get last step perf snapshot (zeros when perf disabled)
    pub fn perf_stats(&self) -> StepStats {
        self.perf.clone()
    }

    // === Streaming ===

    /// Advection: every moving population shifts one cell toward its
    /// direction with toroidal wraparound, then barrier cells reflect what
    /// just streamed into them back out to their real neighbors.
    fn stream(&mut self) {
        Self::roll(&mut self.f_n, &mut self.scratch, 1, 0);
        Self::roll(&mut self.f_s, &mut self.scratch, -1, 0);
        Self::roll(&mut self.f_e, &mut self.scratch, 0, 1);
        Self::roll(&mut self.f_w, &mut self.scratch, 0, -1);
        Self::roll(&mut self.f_ne, &mut self.scratch, 1, 1);
        Self::roll(&mut self.f_nw, &mut self.scratch, 1, -1);
        Self::roll(&mut self.f_se, &mut self.scratch, -1, 1);
        Self::roll(&mut self.f_sw, &mut self.scratch, -1, -1);

        self.bounce_back();
    }

    /// Out-of-place periodic shift through reusable scratch storage.
    fn roll(grid: &mut DenseGrid, scratch: &mut DenseGrid, dr: isize, dc: isize) {
        scratch.shift_from(grid, dr, dc);
        std::mem::swap(grid, scratch);
    }

    /// Bounce-back: incoming flow reflects the way it came (N<->S, E<->W,
    /// NE<->SW, NW<->SE). All reflected values are read before any write
    /// lands. Writes go to the real neighbor only; at the lattice edge the
    /// reflection is dropped rather than wrapped.
    fn bounce_back(&mut self) {
        let rows = self.height;
        let cols = self.width;
        let mut pending = std::mem::take(&mut self.bounce);
        pending.clear();

        for row in 0..rows {
            for col in 0..cols {
                if !self.barrier.get(row, col) {
                    continue;
                }
                if row > 0 {
                    pending.push(BounceWrite {
                        dir: Dir::S,
                        row: row - 1,
                        col,
                        value: self.f_n.get(row, col),
                    });
                    if col > 0 {
                        pending.push(BounceWrite {
                            dir: Dir::Sw,
                            row: row - 1,
                            col: col - 1,
                            value: self.f_ne.get(row, col),
                        });
                    }
                    if col < cols - 1 {
                        pending.push(BounceWrite {
                            dir: Dir::Se,
                            row: row - 1,
                            col: col + 1,
                            value: self.f_nw.get(row, col),
                        });
                    }
                }
                if row < rows - 1 {
                    pending.push(BounceWrite {
                        dir: Dir::N,
                        row: row + 1,
                        col,
                        value: self.f_s.get(row, col),
                    });
                    if col > 0 {
                        pending.push(BounceWrite {
                            dir: Dir::Nw,
                            row: row + 1,
                            col: col - 1,
                            value: self.f_se.get(row, col),
                        });
                    }
                    if col < cols - 1 {
                        pending.push(BounceWrite {
                            dir: Dir::Ne,
                            row: row + 1,
                            col: col + 1,
                            value: self.f_sw.get(row, col),
                        });
                    }
                }
                if col > 0 {
                    pending.push(BounceWrite {
                        dir: Dir::W,
                        row,
                        col: col - 1,
                        value: self.f_e.get(row, col),
                    });
                }
                if col < cols - 1 {
                    pending.push(BounceWrite {
                        dir: Dir::E,
                        row,
                        col: col + 1,
                        value: self.f_w.get(row, col),
                    });
                }
            }
        }

        for wr in &pending {
            let grid = match wr.dir {
                Dir::N => &mut self.f_n,
                Dir::S => &mut self.f_s,
                Dir::E => &mut self.f_e,
                Dir::W => &mut self.f_w,
                Dir::Ne => &mut self.f_ne,
                Dir::Se => &mut self.f_se,
                Dir::Nw => &mut self.f_nw,
                Dir::Sw => &mut self.f_sw,
            };
            grid.set(wr.row, wr.col, wr.value);
        }

        self.bounce = pending;
    }

    // === Collision ===

    /// BGK relaxation: recompute rho/ux/uy, relax every population toward
    /// equilibrium blended by omega, then force the inlet column.
    fn collide(&mut self) {
        let w = self.width;

        {
            let f_rest = self.f_rest.as_slice();
            let f_n = self.f_n.as_slice();
            let f_s = self.f_s.as_slice();
            let f_e = self.f_e.as_slice();
            let f_w = self.f_w.as_slice();
            let f_ne = self.f_ne.as_slice();
            let f_se = self.f_se.as_slice();
            let f_nw = self.f_nw.as_slice();
            let f_sw = self.f_sw.as_slice();
            let rho = self.rho.as_mut_slice();
            let ux = self.ux.as_mut_slice();
            let uy = self.uy.as_mut_slice();

            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                rho.par_chunks_mut(w)
                    .zip(ux.par_chunks_mut(w))
                    .zip(uy.par_chunks_mut(w))
                    .enumerate()
                    .for_each(|(r, ((rho_row, ux_row), uy_row))| {
                        let base = r * w;
                        for c in 0..w {
                            let i = base + c;
                            let dens = f_rest[i]
                                + f_n[i] + f_s[i] + f_e[i] + f_w[i]
                                + f_ne[i] + f_se[i] + f_nw[i] + f_sw[i];
                            rho_row[c] = dens;
                            ux_row[c] =
                                (f_e[i] + f_ne[i] + f_se[i] - f_w[i] - f_nw[i] - f_sw[i]) / dens;
                            uy_row[c] =
                                (f_n[i] + f_ne[i] + f_nw[i] - f_s[i] - f_se[i] - f_sw[i]) / dens;
                        }
                    });
            }
            #[cfg(not(feature = "parallel"))]
            {
                for i in 0..rho.len() {
                    let dens = f_rest[i]
                        + f_n[i] + f_s[i] + f_e[i] + f_w[i]
                        + f_ne[i] + f_se[i] + f_nw[i] + f_sw[i];
                    rho[i] = dens;
                    ux[i] = (f_e[i] + f_ne[i] + f_se[i] - f_w[i] - f_nw[i] - f_sw[i]) / dens;
                    uy[i] = (f_n[i] + f_ne[i] + f_nw[i] - f_s[i] - f_se[i] - f_sw[i]) / dens;
                }
            }
        }

        {
            let omega = self.omega;
            let rho = self.rho.as_slice();
            let ux = self.ux.as_slice();
            let uy = self.uy.as_slice();
            relax(&mut self.f_rest, w, omega, FOUR_NINTHS, 0.0, 0.0, rho, ux, uy);
            relax(&mut self.f_n, w, omega, ONE_NINTH, 0.0, 1.0, rho, ux, uy);
            relax(&mut self.f_s, w, omega, ONE_NINTH, 0.0, -1.0, rho, ux, uy);
            relax(&mut self.f_e, w, omega, ONE_NINTH, 1.0, 0.0, rho, ux, uy);
            relax(&mut self.f_w, w, omega, ONE_NINTH, -1.0, 0.0, rho, ux, uy);
            relax(&mut self.f_ne, w, omega, ONE_36TH, 1.0, 1.0, rho, ux, uy);
            relax(&mut self.f_se, w, omega, ONE_36TH, 1.0, -1.0, rho, ux, uy);
            relax(&mut self.f_nw, w, omega, ONE_36TH, -1.0, 1.0, rho, ux, uy);
            relax(&mut self.f_sw, w, omega, ONE_36TH, -1.0, -1.0, rho, ux, uy);
        }

        self.force_inflow();
    }

    /// Dirichlet-like inlet: the moving east/west populations of column 0
    /// are pinned to their equilibrium at rho=1, u=(u0, 0). Rest, N and S
    /// stay as relaxed.
    fn force_inflow(&mut self) {
        let u0 = self.u0;
        let u2 = u0 * u0;
        let e_in = equilibrium(ONE_NINTH, 1.0, u0, u2);
        let w_in = equilibrium(ONE_NINTH, 1.0, -u0, u2);
        let diag_e_in = equilibrium(ONE_36TH, 1.0, u0, u2);
        let diag_w_in = equilibrium(ONE_36TH, 1.0, -u0, u2);
        for row in 0..self.height {
            self.f_e.set(row, 0, e_in);
            self.f_w.set(row, 0, w_in);
            self.f_ne.set(row, 0, diag_e_in);
            self.f_se.set(row, 0, diag_e_in);
            self.f_nw.set(row, 0, diag_w_in);
            self.f_sw.set(row, 0, diag_w_in);
        }
    }

    // === Frames ===

    /// Capture the current macroscopic fields as an immutable frame. The
    /// barrier buffer is shared, not copied.
    pub fn frame(&self) -> Frame {
        Frame::capture(self)
    }

    /// Recorded frame for one tick of the history.
    pub fn frame_at(&self, index: usize) -> Result<Frame, EngineError> {
        self.frames.get(index).cloned().ok_or(EngineError::FrameOutOfRange {
            index,
            count: self.frames.len(),
        })
    }

    /// Frames recorded so far: 1 + steps taken.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The pre-run state once started, a deep copy of the current state
    /// before then.
    pub fn initial_state(&self) -> LatticeState {
        match &self.initial {
            Some(initial) => initial.snapshot(),
            None => self.snapshot(),
        }
    }

    /// Deep, independent copy: fresh barrier buffer, fresh one-frame history.
    pub(super) fn snapshot(&self) -> LatticeState {
        let mut copy = LatticeState {
            height: self.height,
            width: self.width,
            omega: self.omega,
            u0: self.u0,
            started: self.started,
            f_rest: self.f_rest.clone(),
            f_n: self.f_n.clone(),
            f_s: self.f_s.clone(),
            f_e: self.f_e.clone(),
            f_w: self.f_w.clone(),
            f_ne: self.f_ne.clone(),
            f_se: self.f_se.clone(),
            f_nw: self.f_nw.clone(),
            f_sw: self.f_sw.clone(),
            rho: self.rho.clone(),
            ux: self.ux.clone(),
            uy: self.uy.clone(),
            barrier: self.barrier.deep_copy(),
            frames: Vec::new(),
            initial: None,
            scratch: DenseGrid::new(self.height, self.width),
            bounce: Vec::new(),
            perf_enabled: false,
            perf: StepStats::default(),
        };
        let frame0 = copy.frame();
        copy.frames.push(frame0);
        copy
    }

    // === Barrier editing ===

    pub fn get_barrier(&self, row: usize, col: usize) -> Result<bool, EngineError> {
        self.check_cell(row, col)?;
        Ok(self.barrier.get(row, col))
    }

    pub fn set_barrier(&mut self, value: bool, row: usize, col: usize) -> Result<(), EngineError> {
        self.check_cell(row, col)?;
        self.write_barrier(value, row, col);
        Ok(())
    }

    /// Flip one cell; returns the new value.
    pub fn toggle_barrier(&mut self, row: usize, col: usize) -> Result<bool, EngineError> {
        let value = !self.get_barrier(row, col)?;
        self.write_barrier(value, row, col);
        Ok(value)
    }

    /// COW-aware store, bounds already checked. Once the run has started,
    /// captured frames keep the mask they saw: the engine detaches onto a
    /// private buffer before the write. Pre-run edits go straight through
    /// the shared buffer.
    pub(super) fn write_barrier(&mut self, value: bool, row: usize, col: usize) {
        if self.started && self.barrier.is_shared() {
            self.barrier.detach();
        }
        self.barrier.set(row, col, value);
    }

    fn check_cell(&self, row: usize, col: usize) -> Result<(), EngineError> {
        if row >= self.height || col >= self.width {
            return Err(EngineError::CellOutOfBounds {
                row,
                col,
                height: self.height,
                width: self.width,
            });
        }
        Ok(())
    }
}

/// Relax one population grid toward its equilibrium at the freshly computed
/// macroscopic fields: `n' = (1-omega)*n + omega*n_eq`. (`ex`, `ey`) is the
/// direction's lattice velocity.
fn relax(
    grid: &mut DenseGrid,
    width: usize,
    omega: f64,
    weight: f64,
    ex: f64,
    ey: f64,
    rho: &[f64],
    ux: &[f64],
    uy: &[f64],
) {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        grid.as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(r, row)| {
                let base = r * width;
                for (c, n) in row.iter_mut().enumerate() {
                    let i = base + c;
                    let eu = ex * ux[i] + ey * uy[i];
                    let u2 = ux[i] * ux[i] + uy[i] * uy[i];
                    *n = (1.0 - omega) * *n + omega * equilibrium(weight, rho[i], eu, u2);
                }
            });
    }
    #[cfg(not(feature = "parallel"))]
    {
        for (r, row) in grid.as_mut_slice().chunks_mut(width).enumerate() {
            let base = r * width;
            for (c, n) in row.iter_mut().enumerate() {
                let i = base + c;
                let eu = ex * ux[i] + ey * uy[i];
                let u2 = ux[i] * ux[i] + uy[i] * uy[i];
                *n = (1.0 - omega) * *n + omega * equilibrium(weight, rho[i], eu, u2);
            }
        }
    }
}
