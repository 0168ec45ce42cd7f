//! BarrierMask - shared obstacle mask with explicit copy-on-write
//!
//! The mask is the only engine state with shared-ownership semantics: every
//! captured frame holds a clone, and all clones alias one buffer until the
//! engine detaches. Cells are AtomicBool (relaxed) so the pre-run aliased
//! mutation stays safe Rust; sharing is observable via `shares_buffer` so the
//! COW switch can be asserted, not assumed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct MaskBuf {
    height: usize,
    width: usize,
    cells: Vec<AtomicBool>,
}

impl MaskBuf {
    fn new(height: usize, width: usize) -> Self {
        let mut cells = Vec::with_capacity(height * width);
        cells.resize_with(height * width, || AtomicBool::new(false));
        Self { height, width, cells }
    }
}

/// Boolean obstacle mask, row-major, shared between the engine and frames.
pub struct BarrierMask {
    buf: Arc<MaskBuf>,
}

impl Clone for BarrierMask {
    /// Shares the underlying buffer (frame capture path).
    fn clone(&self) -> Self {
        Self { buf: Arc::clone(&self.buf) }
    }
}

impl BarrierMask {
    /// All-false mask.
    pub fn new(height: usize, width: usize) -> Self {
        Self { buf: Arc::new(MaskBuf::new(height, width)) }
    }

    #[inline]
    pub fn height(&self) -> usize { self.buf.height }

    #[inline]
    pub fn width(&self) -> usize { self.buf.width }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        debug_assert!(
            row < self.buf.height && col < self.buf.width,
            "mask idx: out of bounds ({}, {}) for {}x{} mask",
            row,
            col,
            self.buf.height,
            self.buf.width
        );
        row * self.buf.width + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.buf.cells[self.idx(row, col)].load(Ordering::Relaxed)
    }

    /// Store through a shared reference. Holders other than the writer see
    /// the change; the engine only uses this before the COW switch or after
    /// detaching.
    #[inline]
    pub fn set(&self, row: usize, col: usize, value: bool) {
        self.buf.cells[self.idx(row, col)].store(value, Ordering::Relaxed);
    }

    /// Fresh mask with the same cell values and a new buffer.
    pub fn deep_copy(&self) -> Self {
        let copy = BarrierMask::new(self.buf.height, self.buf.width);
        for (dst, src) in copy.buf.cells.iter().zip(self.buf.cells.iter()) {
            dst.store(src.load(Ordering::Relaxed), Ordering::Relaxed);
        }
        copy
    }

    /// The COW switch: replace this handle's buffer with a private copy.
    /// Other holders keep the old buffer untouched.
    pub fn detach(&mut self) {
        *self = self.deep_copy();
    }

    /// True when another holder shares this buffer.
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.buf) > 1
    }

    /// True when both handles alias the same buffer.
    pub fn shares_buffer(&self, other: &BarrierMask) -> bool {
        Arc::ptr_eq(&self.buf, &other.buf)
    }

    /// Fresh mask holding the windowed cells. Caller has validated bounds.
    pub fn window(&self, row: usize, col: usize, sub_height: usize, sub_width: usize) -> Self {
        debug_assert!(row + sub_height <= self.buf.height);
        debug_assert!(col + sub_width <= self.buf.width);
        let out = BarrierMask::new(sub_height, sub_width);
        for r in 0..sub_height {
            for c in 0..sub_width {
                out.set(r, c, self.get(row + r, col + c));
            }
        }
        out
    }

    /// Number of barrier cells.
    pub fn count_set(&self) -> usize {
        self.buf
            .cells
            .iter()
            .filter(|c| c.load(Ordering::Relaxed))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_buffer() {
        let a = BarrierMask::new(4, 4);
        let b = a.clone();
        assert!(a.shares_buffer(&b));
        assert!(a.is_shared());
        a.set(1, 2, true);
        assert!(b.get(1, 2));
    }

    #[test]
    fn detach_makes_buffer_private() {
        let mut a = BarrierMask::new(4, 4);
        a.set(0, 0, true);
        let b = a.clone();
        a.detach();
        assert!(!a.shares_buffer(&b));
        // values carried over, then diverge
        assert!(a.get(0, 0));
        a.set(3, 3, true);
        assert!(!b.get(3, 3));
    }

    #[test]
    fn is_shared_tracks_holders() {
        let a = BarrierMask::new(2, 2);
        assert!(!a.is_shared());
        let b = a.clone();
        assert!(a.is_shared());
        drop(b);
        assert!(!a.is_shared());
    }

    #[test]
    fn window_copies_cells() {
        let a = BarrierMask::new(4, 4);
        a.set(1, 1, true);
        a.set(2, 3, true);
        let w = a.window(1, 1, 2, 3);
        assert!(w.get(0, 0));
        assert!(w.get(1, 2));
        assert!(!w.get(0, 1));
        assert!(!w.shares_buffer(&a));
    }

    #[test]
    fn count_set_counts() {
        let a = BarrierMask::new(3, 3);
        assert_eq!(a.count_set(), 0);
        a.set(0, 0, true);
        a.set(2, 2, true);
        assert_eq!(a.count_set(), 2);
    }
}
