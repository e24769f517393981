use crate::align::bounded::structs::bound::{Bound, BoundOrientation, EdgeBounds};
use crate::error::SearchError;

pub const MATCH: usize = 0;
pub const INSERT: usize = 1;
pub const DELETE: usize = 2;
pub const NUM_NORMAL_STATES: usize = 3;

/// Marks the missing neighbour-row offset of an inner bound on the first or
/// last row. Never dereferenced: the recurrences unroll those rows.
pub const NO_BLOCK: usize = usize::MAX;

/// Sparse storage for the three core states over the cells of a cloud.
///
/// `edg_inner` describes the active cells; `edg_outer` pads every inner
/// bound by one cell in the previous row, the next row, and both column
/// directions, so that every cell the Forward and Backward recurrences read
/// is backed by real storage. The data buffer is laid out bound-by-bound
/// over the outer set, three floats per cell.
///
/// Addressing goes through two maps: `omap_cur[i]` is the buffer offset of
/// outer bound `i`, and `imap_prv/cur/nxt[i]` are the offsets of inner
/// bound `i`'s first column evaluated inside the containing outer bound of
/// the row above, the same row, and the row below.
#[derive(Debug, Clone, Default)]
pub struct DpMatrixSparse {
    pub target_length: usize,
    pub profile_length: usize,
    pub edg_inner: EdgeBounds,
    pub edg_outer: EdgeBounds,
    omap_cur: Vec<usize>,
    imap_prv: Vec<usize>,
    imap_cur: Vec<usize>,
    imap_nxt: Vec<usize>,
    data: Vec<f32>,
    data_len: usize,
}

impl DpMatrixSparse {
    pub fn new(
        target_length: usize,
        profile_length: usize,
        edg_inner: &EdgeBounds,
    ) -> Result<Self, SearchError> {
        let mut matrix = Self::default();
        matrix.reuse(target_length, profile_length, edg_inner)?;
        Ok(matrix)
    }

    /// Reshape for a new cloud, keeping allocated capacity. The inner
    /// edgebounds must be row-indexed, sorted, merged, and indexed. Every
    /// cell is reset to log-space zero.
    pub fn reuse(
        &mut self,
        target_length: usize,
        profile_length: usize,
        edg_inner: &EdgeBounds,
    ) -> Result<(), SearchError> {
        debug_assert_eq!(edg_inner.orientation, BoundOrientation::Row);
        self.target_length = target_length;
        self.profile_length = profile_length;
        self.edg_inner.copy_from(edg_inner);

        self.build_outer();
        self.map_outer();
        self.map_inner()?;

        if self.data.len() < self.data_len {
            self.data.resize(self.data_len, f32::NEG_INFINITY);
        }
        self.fill(f32::NEG_INFINITY);
        Ok(())
    }

    /// Pad every inner bound into the rows above, at, and below itself,
    /// clipped to the embedding rectangle, then restore the sorted-merged
    /// invariant.
    fn build_outer(&mut self) {
        self.edg_outer.reuse(
            self.target_length,
            self.profile_length,
            BoundOrientation::Row,
        );
        for bound in self.edg_inner.iter() {
            let lb = bound.lb.saturating_sub(1);
            let rb = (bound.rb + 1).min(self.profile_length + 1);
            if bound.id > 0 {
                self.edg_outer.push(Bound::new(bound.id - 1, lb, rb));
            }
            self.edg_outer.push(Bound::new(bound.id, lb, rb));
            if bound.id < self.target_length {
                self.edg_outer.push(Bound::new(bound.id + 1, lb, rb));
            }
        }
        self.edg_outer.sort();
        self.edg_outer.merge();
        self.edg_outer.index();
    }

    fn map_outer(&mut self) {
        self.omap_cur.clear();
        let mut offset = 0;
        self.omap_cur.push(offset);
        for bound in self.edg_outer.iter() {
            offset += bound.width() * NUM_NORMAL_STATES;
            self.omap_cur.push(offset);
        }
        self.data_len = offset;
    }

    /// Pair every inner bound with its containing outer bound on the three
    /// neighbouring rows. A single forward walk suffices because both lists
    /// are sorted.
    fn map_inner(&mut self) -> Result<(), SearchError> {
        self.imap_prv.clear();
        self.imap_cur.clear();
        self.imap_nxt.clear();

        let mut cursor_prv = 0;
        let mut cursor_cur = 0;
        let mut cursor_nxt = 0;

        for bound in self.edg_inner.iter() {
            let prv = if bound.id == 0 {
                NO_BLOCK
            } else {
                self.containing_offset(&mut cursor_prv, bound.id - 1, bound.lb)
                    .ok_or_else(|| missing_outer(bound, bound.id - 1))?
            };
            let cur = self
                .containing_offset(&mut cursor_cur, bound.id, bound.lb)
                .ok_or_else(|| missing_outer(bound, bound.id))?;
            let nxt = if bound.id == self.target_length {
                NO_BLOCK
            } else {
                self.containing_offset(&mut cursor_nxt, bound.id + 1, bound.lb)
                    .ok_or_else(|| missing_outer(bound, bound.id + 1))?
            };

            self.imap_prv.push(prv);
            self.imap_cur.push(cur);
            self.imap_nxt.push(nxt);
        }
        Ok(())
    }

    /// Buffer offset of column `col` of row `id`, found by advancing a
    /// monotone cursor over the outer bound list.
    fn containing_offset(&self, cursor: &mut usize, id: usize, col: usize) -> Option<usize> {
        while *cursor < self.edg_outer.len() {
            let outer = self.edg_outer.get(*cursor);
            if outer.id < id || (outer.id == id && outer.rb <= col) {
                *cursor += 1;
                continue;
            }
            if outer.id == id && outer.contains(col) {
                return Some(self.omap_cur[*cursor] + (col - outer.lb) * NUM_NORMAL_STATES);
            }
            return None;
        }
        None
    }

    pub fn fill(&mut self, value: f32) {
        self.data[..self.data_len].fill(value);
    }

    /// Exponentiate every cell in place (log space to normal space).
    pub fn exp_all(&mut self) {
        for value in &mut self.data[..self.data_len] {
            *value = value.exp();
        }
    }

    #[inline]
    pub fn inner_bound(&self, bound_idx: usize) -> Bound {
        self.edg_inner.get(bound_idx)
    }

    /// Offset of inner bound `bound_idx`'s first column within its own row.
    #[inline]
    pub fn block_cur(&self, bound_idx: usize) -> usize {
        self.imap_cur[bound_idx]
    }

    /// Same column, evaluated in the row above.
    #[inline]
    pub fn block_prv(&self, bound_idx: usize) -> usize {
        self.imap_prv[bound_idx]
    }

    /// Same column, evaluated in the row below.
    #[inline]
    pub fn block_nxt(&self, bound_idx: usize) -> usize {
        self.imap_nxt[bound_idx]
    }

    #[inline]
    fn cell_idx(&self, block: usize, col_offset: isize, state: usize) -> usize {
        debug_assert!(block != NO_BLOCK, "dereferenced a missing neighbour row");
        debug_assert!(state < NUM_NORMAL_STATES);
        let idx = block as isize + col_offset * NUM_NORMAL_STATES as isize + state as isize;
        debug_assert!(
            idx >= 0 && (idx as usize) < self.data_len,
            "cell index {idx} outside data buffer of length {}",
            self.data_len
        );
        idx as usize
    }

    /// Read a state at `col_offset` columns right of a block's first
    /// column. Negative offsets reach the one-cell halo.
    #[inline]
    pub fn get(&self, block: usize, col_offset: isize, state: usize) -> f32 {
        self.data[self.cell_idx(block, col_offset, state)]
    }

    #[inline]
    pub fn set(&mut self, block: usize, col_offset: isize, state: usize, value: f32) {
        let idx = self.cell_idx(block, col_offset, state);
        self.data[idx] = value;
    }

    /// Address a cell by absolute coordinates through the outer bounds.
    /// Slower than the block accessors; used for introspection and
    /// verification.
    pub fn lookup(&self, row: usize, col: usize, state: usize) -> Option<f32> {
        if row > self.target_length {
            return None;
        }
        for idx in self.edg_outer.id_range(row) {
            let outer = self.edg_outer.get(idx);
            if outer.contains(col) {
                let offset = self.omap_cur[idx] + (col - outer.lb) * NUM_NORMAL_STATES + state;
                return Some(self.data[offset]);
            }
        }
        None
    }

    /// Write through the same path `lookup` reads; verification only.
    pub fn lookup_set(&mut self, row: usize, col: usize, state: usize, value: f32) -> bool {
        if row > self.target_length {
            return false;
        }
        for idx in self.edg_outer.id_range(row) {
            let outer = self.edg_outer.get(idx);
            if outer.contains(col) {
                let offset = self.omap_cur[idx] + (col - outer.lb) * NUM_NORMAL_STATES + state;
                self.data[offset] = value;
                return true;
            }
        }
        false
    }
}

fn missing_outer(inner: &Bound, row: usize) -> SearchError {
    SearchError::InvalidGeometry {
        row,
        col: inner.lb,
        state: "outer",
        details: format!(
            "no outer bound covers inner bound {{id: {}, lb: {}, rb: {}}} from row {row}",
            inner.id, inner.lb, inner.rb
        ),
    }
}
