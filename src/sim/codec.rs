//! Binary persistence for LatticeState
//!
//! Fixed field order, all integers and floats big-endian:
//! `started` (1 byte), `height`/`width` (i32), `omega`/`u0` (f64), barrier
//! mask row-major (1 byte per cell), the nine populations row-major in the
//! order rest, N, S, E, W, NE, SE, NW, SW, then rho, ux, uy. Matching this
//! order exactly is what keeps saved files portable across implementations.
//!
//! Viscosity is deliberately not part of the format: omega is the persisted
//! truth and the original viscosity is not recoverable from a saved file.

use std::io::{self, Read, Write};

use crate::core::grid::DenseGrid;
use crate::error::DecodeError;

use super::lattice::LatticeState;
use super::params::DEFAULT_VISCOSITY;

/// Dimension sanity caps checked before any fixed-size block is read.
const MAX_DIM: i32 = 16_384;
const MAX_CELLS: i64 = 4_194_304;

impl LatticeState {
    /// Serialize the whole state. Whole-buffer synchronous write; a failure
    /// aborts the operation with nothing recoverable committed.
    pub fn save<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_bool(writer, self.started)?;
        write_i32(writer, self.height as i32)?;
        write_i32(writer, self.width as i32)?;
        write_f64(writer, self.omega)?;
        write_f64(writer, self.u0)?;

        for row in 0..self.height {
            for col in 0..self.width {
                write_bool(writer, self.barrier.get(row, col))?;
            }
        }

        for grid in [
            &self.f_rest, &self.f_n, &self.f_s, &self.f_e, &self.f_w,
            &self.f_ne, &self.f_se, &self.f_nw, &self.f_sw,
            &self.rho, &self.ux, &self.uy,
        ] {
            write_grid(writer, grid)?;
        }
        Ok(())
    }

    /// Reconstruct a state from a stream produced by `save`. Truncated or
    /// malformed input fails without returning a partial state.
    pub fn load<R: Read>(reader: &mut R) -> Result<LatticeState, DecodeError> {
        let started = read_bool(reader)?;
        let height = read_i32(reader)?;
        let width = read_i32(reader)?;
        if height < 1
            || width < 1
            || height > MAX_DIM
            || width > MAX_DIM
            || (height as i64) * (width as i64) > MAX_CELLS
        {
            return Err(DecodeError::BadDimensions { height, width });
        }
        let omega = read_f64(reader)?;
        let u0 = read_f64(reader)?;

        let height = height as usize;
        let width = width as usize;
        // Dimensions were validated above, so construction cannot fail.
        let mut state = LatticeState::new(height, width, DEFAULT_VISCOSITY, u0)
            .map_err(|_| DecodeError::BadDimensions {
                height: height as i32,
                width: width as i32,
            })?;
        // omega is restored directly, bypassing the viscosity formula.
        state.omega = omega;

        // Replay the mask cell-by-cell through the COW-aware store. The
        // state is not started yet, so these land in the shared buffer.
        for row in 0..height {
            for col in 0..width {
                let value = read_bool(reader)?;
                state.write_barrier(value, row, col);
            }
        }

        for grid in [
            &mut state.f_rest, &mut state.f_n, &mut state.f_s, &mut state.f_e,
            &mut state.f_w, &mut state.f_ne, &mut state.f_se, &mut state.f_nw,
            &mut state.f_sw, &mut state.rho, &mut state.ux, &mut state.uy,
        ] {
            read_grid_into(reader, grid)?;
        }

        state.started = started;
        // Loaded states begin a fresh history at the loaded fields.
        state.frames.clear();
        let frame0 = state.frame();
        state.frames.push(frame0);
        if started {
            // A loaded running state is its own pre-run snapshot.
            state.initial = Some(Box::new(state.snapshot()));
        }
        Ok(state)
    }
}

fn write_bool<W: Write>(w: &mut W, v: bool) -> io::Result<()> {
    w.write_all(&[v as u8])
}

fn write_i32<W: Write>(w: &mut W, v: i32) -> io::Result<()> {
    w.write_all(&v.to_be_bytes())
}

fn write_f64<W: Write>(w: &mut W, v: f64) -> io::Result<()> {
    w.write_all(&v.to_be_bytes())
}

fn write_grid<W: Write>(w: &mut W, grid: &DenseGrid) -> io::Result<()> {
    for v in grid.as_slice() {
        write_f64(w, *v)?;
    }
    Ok(())
}

fn read_bool<R: Read>(r: &mut R) -> Result<bool, DecodeError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    match buf[0] {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DecodeError::BadBool(other)),
    }
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32, DecodeError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_f64<R: Read>(r: &mut R) -> Result<f64, DecodeError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_be_bytes(buf))
}

fn read_grid_into<R: Read>(r: &mut R, grid: &mut DenseGrid) -> Result<(), DecodeError> {
    for v in grid.as_mut_slice() {
        *v = read_f64(r)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worked_state() -> LatticeState {
        let mut state = LatticeState::new(10, 14, 0.03, 0.06).unwrap();
        state.set_barrier(true, 4, 7).unwrap();
        state.set_barrier(true, 5, 7).unwrap();
        for _ in 0..6 {
            state.step();
        }
        state
    }

    fn save_to_vec(state: &LatticeState) -> Vec<u8> {
        let mut buf = Vec::new();
        state.save(&mut buf).unwrap();
        buf
    }

    #[test]
    fn round_trip_is_bit_exact() {
        let state = worked_state();
        let bytes = save_to_vec(&state);
        let loaded = LatticeState::load(&mut bytes.as_slice()).unwrap();

        assert_eq!(loaded.height(), state.height());
        assert_eq!(loaded.width(), state.width());
        assert_eq!(loaded.omega(), state.omega());
        assert_eq!(loaded.u0(), state.u0());
        assert_eq!(loaded.started(), state.started());

        assert_eq!(loaded.f_rest, state.f_rest);
        assert_eq!(loaded.f_n, state.f_n);
        assert_eq!(loaded.f_s, state.f_s);
        assert_eq!(loaded.f_e, state.f_e);
        assert_eq!(loaded.f_w, state.f_w);
        assert_eq!(loaded.f_ne, state.f_ne);
        assert_eq!(loaded.f_se, state.f_se);
        assert_eq!(loaded.f_nw, state.f_nw);
        assert_eq!(loaded.f_sw, state.f_sw);
        assert_eq!(loaded.rho, state.rho);
        assert_eq!(loaded.ux, state.ux);
        assert_eq!(loaded.uy, state.uy);

        for row in 0..state.height() {
            for col in 0..state.width() {
                assert_eq!(
                    loaded.get_barrier(row, col).unwrap(),
                    state.get_barrier(row, col).unwrap()
                );
            }
        }
    }

    #[test]
    fn round_trip_evolves_identically() {
        let state = worked_state();
        let bytes = save_to_vec(&state);
        let mut loaded = LatticeState::load(&mut bytes.as_slice()).unwrap();
        let mut original = state;
        loaded.step();
        original.step();
        assert_eq!(loaded.rho, original.rho);
        assert_eq!(loaded.ux, original.ux);
    }

    #[test]
    fn load_starts_fresh_history() {
        let state = worked_state();
        assert_eq!(state.frame_count(), 7);
        let bytes = save_to_vec(&state);
        let loaded = LatticeState::load(&mut bytes.as_slice()).unwrap();
        assert_eq!(loaded.frame_count(), 1);
        // a loaded running state is its own pre-run snapshot
        let initial = loaded.initial_state();
        assert!(initial.started());
        assert_eq!(initial.rho, loaded.rho);
    }

    #[test]
    fn omega_is_restored_directly() {
        let mut state = LatticeState::new(4, 4, 0.02, 0.05).unwrap();
        state.omega = 1.234_567;
        let bytes = save_to_vec(&state);
        let loaded = LatticeState::load(&mut bytes.as_slice()).unwrap();
        assert_eq!(loaded.omega(), 1.234_567);
    }

    #[test]
    fn truncated_stream_fails_cleanly() {
        let state = worked_state();
        let bytes = save_to_vec(&state);
        for cut in [0, 1, 5, 12, 20, bytes.len() / 2, bytes.len() - 1] {
            let err = LatticeState::load(&mut &bytes[..cut]);
            assert!(matches!(err, Err(DecodeError::Io(_))), "cut at {}", cut);
        }
    }

    #[test]
    fn insane_dimensions_are_rejected() {
        let mut bytes = Vec::new();
        write_bool(&mut bytes, false).unwrap();
        write_i32(&mut bytes, -3).unwrap();
        write_i32(&mut bytes, 10).unwrap();
        assert!(matches!(
            LatticeState::load(&mut bytes.as_slice()),
            Err(DecodeError::BadDimensions { .. })
        ));

        let mut bytes = Vec::new();
        write_bool(&mut bytes, false).unwrap();
        write_i32(&mut bytes, MAX_DIM).unwrap();
        write_i32(&mut bytes, MAX_DIM).unwrap();
        assert!(matches!(
            LatticeState::load(&mut bytes.as_slice()),
            Err(DecodeError::BadDimensions { .. })
        ));
    }

    #[test]
    fn malformed_boolean_is_rejected() {
        let state = LatticeState::new(2, 2, 0.02, 0.05).unwrap();
        let mut bytes = save_to_vec(&state);
        // first barrier byte sits right after the 25-byte header
        bytes[25] = 7;
        assert!(matches!(
            LatticeState::load(&mut bytes.as_slice()),
            Err(DecodeError::BadBool(7))
        ));
    }
}
