/// A closed-open column interval on one row or antidiagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    /// Row index (row orientation) or antidiagonal index (antidiagonal
    /// orientation).
    pub id: usize,
    /// Leftmost covered column, inclusive.
    pub lb: usize,
    /// Rightmost covered column, exclusive.
    pub rb: usize,
}

impl Bound {
    pub fn new(id: usize, lb: usize, rb: usize) -> Self {
        debug_assert!(lb <= rb);
        Self { id, lb, rb }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.rb - self.lb
    }

    #[inline]
    pub fn contains(&self, col: usize) -> bool {
        self.lb <= col && col < self.rb
    }
}

/// Whether bound ids index antidiagonals (cloud-search output) or rows
/// (everything downstream of reorientation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundOrientation {
    Antidiagonal,
    #[default]
    Row,
}

/// An ordered set of bounds embedded in a `(Q + 1) x (T + 1)` matrix.
///
/// After `sort` + `merge` + `index`, bounds are sorted by id then left
/// bound, no two bounds on one id overlap or abut, and `id_range` answers
/// row lookups in constant time.
#[derive(Debug, Clone, Default)]
pub struct EdgeBounds {
    bounds: Vec<Bound>,
    pub target_length: usize,
    pub profile_length: usize,
    pub orientation: BoundOrientation,
    /// `ids_idx`: position of the first bound of each id, one slot past the
    /// largest representable id at the end.
    id_offsets: Vec<usize>,
}

impl EdgeBounds {
    pub fn new(orientation: BoundOrientation) -> Self {
        Self {
            orientation,
            ..Default::default()
        }
    }

    /// Reset to an empty set over new embedding dimensions, keeping
    /// allocated capacity.
    pub fn reuse(
        &mut self,
        target_length: usize,
        profile_length: usize,
        orientation: BoundOrientation,
    ) {
        self.bounds.clear();
        self.id_offsets.clear();
        self.target_length = target_length;
        self.profile_length = profile_length;
        self.orientation = orientation;
    }

    /// Largest id representable in the embedding under the current
    /// orientation.
    fn max_id(&self) -> usize {
        match self.orientation {
            BoundOrientation::Row => self.target_length,
            BoundOrientation::Antidiagonal => self.target_length + self.profile_length,
        }
    }

    pub fn push(&mut self, bound: Bound) {
        debug_assert!(bound.id <= self.max_id());
        self.bounds.push(bound);
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Bound {
        self.bounds[idx]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bound> {
        self.bounds.iter()
    }

    pub fn sort(&mut self) {
        self.bounds.sort_unstable_by_key(|b| (b.id, b.lb));
    }

    /// Coalesce overlapping or abutting bounds that share an id. Requires
    /// sorted bounds.
    pub fn merge(&mut self) {
        let mut merged: usize = 0;
        for i in 1..self.bounds.len() {
            let bound = self.bounds[i];
            let last = &mut self.bounds[merged];
            if bound.id == last.id && bound.lb <= last.rb {
                last.rb = last.rb.max(bound.rb);
            } else {
                merged += 1;
                self.bounds[merged] = bound;
            }
        }
        if !self.bounds.is_empty() {
            self.bounds.truncate(merged + 1);
        }
    }

    /// Build the id lookup index. Requires sorted bounds.
    pub fn index(&mut self) {
        let slots = self.max_id() + 2;
        self.id_offsets.clear();
        self.id_offsets.resize(slots, 0);

        let mut bound_idx = 0;
        for id in 0..slots - 1 {
            self.id_offsets[id] = bound_idx;
            while bound_idx < self.bounds.len() && self.bounds[bound_idx].id == id {
                bound_idx += 1;
            }
        }
        self.id_offsets[slots - 1] = bound_idx;
    }

    /// The range of bound-list positions whose bounds lie on `id`. Requires
    /// `index()` to have run.
    #[inline]
    pub fn id_range(&self, id: usize) -> std::ops::Range<usize> {
        debug_assert!(!self.id_offsets.is_empty(), "edgebounds are not indexed");
        self.id_offsets[id]..self.id_offsets[id + 1]
    }

    /// Total number of covered cells.
    pub fn count_cells(&self) -> usize {
        self.bounds.iter().map(Bound::width).sum()
    }

    /// Become a copy of another set, reusing this set's buffers.
    pub fn copy_from(&mut self, other: &EdgeBounds) {
        self.reuse(other.target_length, other.profile_length, other.orientation);
        self.bounds.extend_from_slice(&other.bounds);
        self.id_offsets.extend_from_slice(&other.id_offsets);
    }

    /// Append another set of bounds, then restore the sorted-merged
    /// invariant. Both sets must share orientation and embedding.
    pub fn union_with(&mut self, other: &EdgeBounds) {
        debug_assert_eq!(self.orientation, other.orientation);
        debug_assert_eq!(self.target_length, other.target_length);
        debug_assert_eq!(self.profile_length, other.profile_length);
        self.bounds.extend_from_slice(&other.bounds);
        self.sort();
        self.merge();
    }

    /// Convert an antidiagonal-indexed set into a row-indexed set: cell
    /// `(d, k)` becomes `(row = k, col = d - k)`. The result is sorted,
    /// merged, and indexed.
    pub fn reorient_into(&self, row_bounds: &mut EdgeBounds) {
        debug_assert_eq!(self.orientation, BoundOrientation::Antidiagonal);
        row_bounds.reuse(
            self.target_length,
            self.profile_length,
            BoundOrientation::Row,
        );
        for bound in &self.bounds {
            for k in bound.lb..bound.rb {
                let col = bound.id - k;
                row_bounds.push(Bound::new(k, col, col + 1));
            }
        }
        row_bounds.sort();
        row_bounds.merge();
        row_bounds.index();
    }

    /// Check the post-finalisation invariant: sorted by id then lb, and no
    /// overlapping or abutting bounds within an id.
    pub fn is_valid(&self) -> bool {
        self.bounds.windows(2).all(|pair| {
            let (a, b) = (pair[0], pair[1]);
            a.id < b.id || (a.id == b.id && a.rb < b.lb)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds_from(list: &[(usize, usize, usize)]) -> EdgeBounds {
        let mut edges = EdgeBounds::new(BoundOrientation::Row);
        edges.reuse(10, 10, BoundOrientation::Row);
        for &(id, lb, rb) in list {
            edges.push(Bound::new(id, lb, rb));
        }
        edges
    }

    #[test]
    fn sort_merge_coalesces_overlapping_and_abutting() {
        let mut edges = bounds_from(&[(2, 4, 6), (1, 0, 3), (2, 6, 8), (2, 1, 5), (3, 2, 3)]);
        edges.sort();
        edges.merge();
        let collected: Vec<Bound> = edges.iter().copied().collect();
        assert_eq!(
            collected,
            vec![Bound::new(1, 0, 3), Bound::new(2, 1, 8), Bound::new(3, 2, 3)]
        );
        assert!(edges.is_valid());
    }

    #[test]
    fn sort_merge_is_idempotent() {
        let mut once = bounds_from(&[(0, 1, 4), (0, 3, 5), (4, 2, 3), (2, 0, 1), (2, 1, 2)]);
        once.sort();
        once.merge();
        let mut twice = once.clone();
        twice.sort();
        twice.merge();
        assert_eq!(
            once.iter().copied().collect::<Vec<_>>(),
            twice.iter().copied().collect::<Vec<_>>()
        );
    }

    #[test]
    fn index_answers_row_lookups() {
        let mut edges = bounds_from(&[(1, 0, 2), (1, 4, 6), (3, 1, 2)]);
        edges.sort();
        edges.merge();
        edges.index();
        assert_eq!(edges.id_range(0), 0..0);
        assert_eq!(edges.id_range(1), 0..2);
        assert_eq!(edges.id_range(2), 2..2);
        assert_eq!(edges.id_range(3), 2..3);
        assert_eq!(edges.id_range(4), 3..3);
    }

    #[test]
    fn count_cells_sums_widths() {
        let edges = bounds_from(&[(0, 0, 4), (5, 2, 3)]);
        assert_eq!(edges.count_cells(), 5);
    }

    #[test]
    fn union_restores_invariants() {
        let mut a = bounds_from(&[(0, 0, 3), (2, 2, 4)]);
        a.sort();
        a.merge();
        let mut b = bounds_from(&[(0, 2, 5), (1, 1, 2)]);
        b.sort();
        b.merge();
        a.union_with(&b);
        let collected: Vec<Bound> = a.iter().copied().collect();
        assert_eq!(
            collected,
            vec![Bound::new(0, 0, 5), Bound::new(1, 1, 2), Bound::new(2, 2, 4)]
        );
    }

    #[test]
    fn reorient_maps_antidiagonal_cells_to_rows() {
        let mut diag = EdgeBounds::new(BoundOrientation::Antidiagonal);
        diag.reuse(4, 4, BoundOrientation::Antidiagonal);
        // cells (1,1), (2,0) on d=2 and (1,2), (2,1) on d=3
        diag.push(Bound::new(2, 1, 3));
        diag.push(Bound::new(3, 1, 3));

        let mut rows = EdgeBounds::new(BoundOrientation::Row);
        diag.reorient_into(&mut rows);
        let collected: Vec<Bound> = rows.iter().copied().collect();
        assert_eq!(
            collected,
            vec![Bound::new(1, 1, 3), Bound::new(2, 0, 2)]
        );
    }

    #[test]
    fn reuse_keeps_capacity() {
        let mut edges = bounds_from(&[(0, 0, 1), (1, 0, 1), (2, 0, 1)]);
        let capacity = edges.bounds.capacity();
        edges.reuse(10, 10, BoundOrientation::Row);
        assert!(edges.is_empty());
        assert_eq!(edges.bounds.capacity(), capacity);
    }
}
