//! Read-only reductions over a lattice state.
//!
//! Used by tests, the facade, and perf reporting. No mutation, no observers
//! inside the numerics.

use super::lattice::LatticeState;

/// Total mass: sum of density over every cell.
pub fn total_mass(state: &LatticeState) -> f64 {
    state.density().sum()
}

/// Mean density over the lattice.
pub fn mean_density(state: &LatticeState) -> f64 {
    total_mass(state) / state.density().len() as f64
}

/// Largest flow speed anywhere on the lattice.
pub fn peak_speed(state: &LatticeState) -> f64 {
    state
        .ux()
        .as_slice()
        .iter()
        .zip(state.uy().as_slice())
        .map(|(ux, uy)| (ux * ux + uy * uy).sqrt())
        .fold(0.0, f64::max)
}

/// Number of solid cells on the barrier mask.
pub fn barrier_cell_count(state: &LatticeState) -> usize {
    state.barrier_mask().count_set()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_state_has_unit_mean_density() {
        let state = LatticeState::new(10, 10, 0.02, 0.05).unwrap();
        assert!((total_mass(&state) - 100.0).abs() < 1e-9);
        assert!((mean_density(&state) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn peak_speed_of_uniform_flow_is_inflow() {
        let state = LatticeState::new(8, 8, 0.02, 0.07).unwrap();
        assert!((peak_speed(&state) - 0.07).abs() < 1e-12);
    }

    #[test]
    fn barrier_count_follows_edits() {
        let mut state = LatticeState::new(6, 6, 0.02, 0.05).unwrap();
        assert_eq!(barrier_cell_count(&state), 0);
        state.set_barrier(true, 1, 1).unwrap();
        state.set_barrier(true, 2, 2).unwrap();
        assert_eq!(barrier_cell_count(&state), 2);
        state.set_barrier(false, 1, 1).unwrap();
        assert_eq!(barrier_cell_count(&state), 1);
    }
}
