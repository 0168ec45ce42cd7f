//! DenseGrid - row-major f64 matrix for per-cell quantities
//!
//! Every lattice field (the nine distributions, density, velocity) is one of
//! these. Instead of a matrix library we keep a single linear Vec per field:
//! linear memory, SIMD-friendly, and trivial to hand to JS as a flat buffer.

/// Fixed-size 2D array of f64, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseGrid {
    height: usize,
    width: usize,
    data: Vec<f64>,
}

impl DenseGrid {
    /// All-zero grid.
    pub fn new(height: usize, width: usize) -> Self {
        Self::filled(height, width, 0.0)
    }

    /// Grid with every cell set to `value`.
    pub fn filled(height: usize, width: usize, value: f64) -> Self {
        Self {
            height,
            width,
            data: vec![value; height * width],
        }
    }

    #[inline]
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn width(&self) -> usize { self.width }

    #[inline]
    pub fn len(&self) -> usize { self.data.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    #[inline]
    pub fn idx(&self, row: usize, col: usize) -> usize {
        debug_assert!(
            row < self.height && col < self.width,
            "idx: out of bounds ({}, {}) for {}x{} grid",
            row,
            col,
            self.height,
            self.width
        );
        row * self.width + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[self.idx(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let i = self.idx(row, col);
        self.data[i] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Periodic shift of `src` by (`dr`, `dc`): `self[r][c] = src[r-dr][c-dc]`
    /// with toroidal wraparound. Writes the whole grid; `self` and `src` must
    /// have the same dimensions. This is the streaming primitive.
    pub fn shift_from(&mut self, src: &DenseGrid, dr: isize, dc: isize) {
        debug_assert_eq!(self.height, src.height);
        debug_assert_eq!(self.width, src.width);
        let h = self.height as isize;
        let w = self.width;
        let col_shift = dc.rem_euclid(w as isize) as usize;
        for r in 0..self.height {
            let sr = (r as isize - dr).rem_euclid(h) as usize;
            let src_row = &src.data[sr * w..sr * w + w];
            let dst_row = &mut self.data[r * w..r * w + w];
            // dst[c] = src[(c - dc) mod w]: rotate the row right by col_shift
            dst_row[col_shift..].copy_from_slice(&src_row[..w - col_shift]);
            dst_row[..col_shift].copy_from_slice(&src_row[w - col_shift..]);
        }
    }

    /// Independently-owned copy of the `sub_height` x `sub_width` window with
    /// top-left corner at (`row`, `col`). Caller has validated bounds.
    pub fn window(&self, row: usize, col: usize, sub_height: usize, sub_width: usize) -> DenseGrid {
        debug_assert!(row + sub_height <= self.height);
        debug_assert!(col + sub_width <= self.width);
        let mut out = DenseGrid::new(sub_height, sub_width);
        for r in 0..sub_height {
            let src_start = (row + r) * self.width + col;
            let dst_start = r * sub_width;
            out.data[dst_start..dst_start + sub_width]
                .copy_from_slice(&self.data[src_start..src_start + sub_width]);
        }
        out
    }
}
