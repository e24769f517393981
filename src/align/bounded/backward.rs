use crate::align::bounded::structs::dp_matrix_sparse::{DELETE, INSERT, MATCH};
use crate::align::bounded::structs::{DpMatrixSparse, DpMatrixSpecial};
use crate::error::SearchError;
use crate::log_sum::{LogSpace, Semiring};
use crate::structs::profile::{
    SPECIAL_B, SPECIAL_C, SPECIAL_E, SPECIAL_J, SPECIAL_LOOP, SPECIAL_MOVE, SPECIAL_N, TRANS_BM,
    TRANS_DD, TRANS_DM, TRANS_II, TRANS_IM, TRANS_MD, TRANS_MI, TRANS_MM,
};
use crate::structs::{Profile, Sequence};

/// Bounded Backward over the log-space semiring. Returns the final score in
/// nats; on a complete run it agrees with the Forward score.
pub fn backward_bounded(
    profile: &Profile,
    target: &Sequence,
    matrix: &mut DpMatrixSparse,
    specials: &mut DpMatrixSpecial,
    row_range: Option<(usize, usize)>,
) -> Result<f32, SearchError> {
    backward_bounded_in::<LogSpace>(profile, target, matrix, specials, row_range)
}

/// Bounded Backward, generic over the probability semiring. Iterates rows
/// `q_hi - 1 ..= q_lo` after seeding row `q_hi`, and finishes with `N(q_lo)`.
pub fn backward_bounded_in<S: Semiring>(
    profile: &Profile,
    target: &Sequence,
    matrix: &mut DpMatrixSparse,
    specials: &mut DpMatrixSpecial,
    row_range: Option<(usize, usize)>,
) -> Result<f32, SearchError> {
    let target_length = target.length;
    let profile_length = profile.length;
    let (row_lo, row_hi) = row_range.unwrap_or((0, target_length));
    debug_assert!(row_lo < row_hi && row_hi <= target_length);

    let sc_e = if profile.is_local { S::ONE } else { S::ZERO };

    matrix.fill(S::ZERO);
    specials.reuse(target_length, S::ZERO);

    // seed row: all suffix mass flows out through C
    let c_hi = S::from_log(profile.special_transition(SPECIAL_C, SPECIAL_MOVE));
    let e_hi = S::prod(
        c_hi,
        S::from_log(profile.special_transition(SPECIAL_E, SPECIAL_MOVE)),
    );
    specials.set(SPECIAL_C, row_hi, c_hi);
    specials.set(SPECIAL_E, row_hi, e_hi);

    fill_row_cells::<S>(profile, matrix, specials, row_hi, sc_e, None, profile_length);

    for row in (row_lo + 1..row_hi).rev() {
        let next_residue = target.digits[row + 1];

        let b = begin_state::<S>(profile, matrix, row, next_residue, profile_length);
        specials.set(SPECIAL_B, row, b);

        let j = S::sum(
            S::prod(
                specials.get(SPECIAL_J, row + 1),
                S::from_log(profile.special_transition(SPECIAL_J, SPECIAL_LOOP)),
            ),
            S::prod(
                b,
                S::from_log(profile.special_transition(SPECIAL_J, SPECIAL_MOVE)),
            ),
        );
        specials.set(SPECIAL_J, row, j);

        let c = S::prod(
            specials.get(SPECIAL_C, row + 1),
            S::from_log(profile.special_transition(SPECIAL_C, SPECIAL_LOOP)),
        );
        specials.set(SPECIAL_C, row, c);

        let e = S::sum(
            S::prod(
                j,
                S::from_log(profile.special_transition(SPECIAL_E, SPECIAL_LOOP)),
            ),
            S::prod(
                c,
                S::from_log(profile.special_transition(SPECIAL_E, SPECIAL_MOVE)),
            ),
        );
        specials.set(SPECIAL_E, row, e);

        let n = S::sum(
            S::prod(
                specials.get(SPECIAL_N, row + 1),
                S::from_log(profile.special_transition(SPECIAL_N, SPECIAL_LOOP)),
            ),
            S::prod(
                b,
                S::from_log(profile.special_transition(SPECIAL_N, SPECIAL_MOVE)),
            ),
        );
        specials.set(SPECIAL_N, row, n);

        fill_row_cells::<S>(
            profile,
            matrix,
            specials,
            row,
            sc_e,
            Some(next_residue),
            profile_length,
        );
    }

    // final row: only N and B are reachable
    let next_residue = target.digits[row_lo + 1];
    let b = begin_state::<S>(profile, matrix, row_lo, next_residue, profile_length);
    specials.set(SPECIAL_B, row_lo, b);
    let score = S::sum(
        S::prod(
            specials.get(SPECIAL_N, row_lo + 1),
            S::from_log(profile.special_transition(SPECIAL_N, SPECIAL_LOOP)),
        ),
        S::prod(
            b,
            S::from_log(profile.special_transition(SPECIAL_N, SPECIAL_MOVE)),
        ),
    );
    specials.set(SPECIAL_N, row_lo, score);

    if score.is_nan() || score == f32::INFINITY {
        return Err(SearchError::NumericOverflow {
            row: row_lo,
            value: score,
        });
    }
    Ok(score)
}

/// Sum the paths that leave B on `row` into a match on `row + 1`.
fn begin_state<S: Semiring>(
    profile: &Profile,
    matrix: &DpMatrixSparse,
    row: usize,
    next_residue: u8,
    profile_length: usize,
) -> f32 {
    let mut b = S::ZERO;
    for bound_idx in matrix.edg_inner.id_range(row + 1) {
        let bound = matrix.inner_bound(bound_idx);
        let col_lo = bound.lb.max(1);
        let col_hi = bound.rb.min(profile_length + 1);
        let block = matrix.block_cur(bound_idx);
        for col in col_lo..col_hi {
            let m = S::prod(
                S::prod(
                    matrix.get(block, (col - bound.lb) as isize, MATCH),
                    S::from_log(profile.transition_score(col - 1, TRANS_BM)),
                ),
                S::from_log(profile.match_score(col, next_residue)),
            );
            b = S::sum(b, m);
        }
    }
    b
}

/// Fill the core-state cells of one row, right to left. `next_residue` is
/// `None` on the seed row, whose cells see no row below them.
#[allow(clippy::too_many_arguments)]
fn fill_row_cells<S: Semiring>(
    profile: &Profile,
    matrix: &mut DpMatrixSparse,
    specials: &DpMatrixSpecial,
    row: usize,
    sc_e: f32,
    next_residue: Option<u8>,
    profile_length: usize,
) {
    let e_row = specials.get(SPECIAL_E, row);
    let e_term = S::prod(e_row, sc_e);

    for bound_idx in matrix.edg_inner.id_range(row).rev() {
        let bound = matrix.inner_bound(bound_idx);
        let col_lo = bound.lb.max(1);
        let col_hi = bound.rb.min(profile_length);
        if col_hi < col_lo {
            continue;
        }

        let block_cur = matrix.block_cur(bound_idx);
        let block_nxt = next_residue.map(|_| matrix.block_nxt(bound_idx));

        // the bound's rightmost column: the alignment can only end here
        let edge_offset = (col_hi - bound.lb) as isize;
        matrix.set(block_cur, edge_offset, MATCH, e_term);
        matrix.set(block_cur, edge_offset, INSERT, S::ZERO);
        matrix.set(block_cur, edge_offset, DELETE, e_term);

        for col in (col_lo..col_hi).rev() {
            let col_offset = (col - bound.lb) as isize;
            let right_offset = col_offset + 1;

            let d_right = matrix.get(block_cur, right_offset, DELETE);

            let (m_next, i_next) = match (next_residue, block_nxt) {
                (Some(residue), Some(block_nxt)) => {
                    let m_next = S::prod(
                        matrix.get(block_nxt, right_offset, MATCH),
                        S::from_log(profile.match_score(col + 1, residue)),
                    );
                    let i_next = S::prod(
                        matrix.get(block_nxt, col_offset, INSERT),
                        S::from_log(profile.insert_score(col, residue)),
                    );
                    (m_next, i_next)
                }
                _ => (S::ZERO, S::ZERO),
            };

            let m = S::sum(
                S::sum(
                    S::prod(
                        m_next,
                        S::from_log(profile.transition_score(col, TRANS_MM)),
                    ),
                    S::prod(
                        i_next,
                        S::from_log(profile.transition_score(col, TRANS_MI)),
                    ),
                ),
                S::sum(
                    S::prod(
                        d_right,
                        S::from_log(profile.transition_score(col, TRANS_MD)),
                    ),
                    e_term,
                ),
            );

            let i = S::sum(
                S::prod(
                    m_next,
                    S::from_log(profile.transition_score(col, TRANS_IM)),
                ),
                S::prod(
                    i_next,
                    S::from_log(profile.transition_score(col, TRANS_II)),
                ),
            );

            let d = S::sum(
                S::prod(
                    m_next,
                    S::from_log(profile.transition_score(col, TRANS_DM)),
                ),
                S::sum(
                    S::prod(
                        d_right,
                        S::from_log(profile.transition_score(col, TRANS_DD)),
                    ),
                    e_term,
                ),
            );

            matrix.set(block_cur, col_offset, MATCH, m);
            matrix.set(block_cur, col_offset, INSERT, i);
            matrix.set(block_cur, col_offset, DELETE, d);
        }
    }
}
