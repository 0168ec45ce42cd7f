//! Millisecond wall clock for the perf-gated step path.
//!
//! `std::time::Instant` does not exist on wasm32, so there the clock reads
//! `js_sys::Date::now()`; natively it measures against a process-wide anchor
//! so both targets hand out comparable f64 millisecond readings.

#[cfg(not(target_arch = "wasm32"))]
fn anchor() -> std::time::Instant {
    use std::sync::OnceLock;
    static ANCHOR: OnceLock<std::time::Instant> = OnceLock::new();
    *ANCHOR.get_or_init(std::time::Instant::now)
}

/// Milliseconds since an arbitrary fixed origin; only differences between
/// two readings are meaningful.
pub(crate) fn now_ms() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        anchor().elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::now_ms;

    #[test]
    fn readings_never_run_backwards() {
        let a = now_ms();
        let b = now_ms();
        assert!(a >= 0.0);
        assert!(b >= a);
    }
}
