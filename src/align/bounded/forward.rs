use crate::align::bounded::structs::dp_matrix_sparse::{DELETE, INSERT, MATCH};
use crate::align::bounded::structs::{DpMatrixSparse, DpMatrixSpecial};
use crate::error::SearchError;
use crate::log_sum::{LogSpace, Semiring};
use crate::structs::profile::{
    SPECIAL_B, SPECIAL_C, SPECIAL_E, SPECIAL_J, SPECIAL_LOOP, SPECIAL_MOVE, SPECIAL_N, TRANS_BM,
    TRANS_DD, TRANS_DM, TRANS_II, TRANS_IM, TRANS_MD, TRANS_MI, TRANS_MM,
};
use crate::structs::{Profile, Sequence};

/// Bounded Forward over the log-space semiring. Returns the final score in
/// nats.
pub fn forward_bounded(
    profile: &Profile,
    target: &Sequence,
    matrix: &mut DpMatrixSparse,
    specials: &mut DpMatrixSpecial,
    row_range: Option<(usize, usize)>,
) -> Result<f32, SearchError> {
    forward_bounded_in::<LogSpace>(profile, target, matrix, specials, row_range)
}

/// Bounded Forward, generic over the probability semiring.
///
/// Fills `matrix` (shaped for the cloud) and `specials` and returns
/// `C(q_hi) * tau_C_move`. When `row_range = (q_lo, q_hi)` is given, row
/// `q_lo` is the initial row and only rows `q_lo + 1 ..= q_hi` are
/// computed; the default range is the whole target.
pub fn forward_bounded_in<S: Semiring>(
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

    // the alignment may end from any live column in local mode, only from
    // the final column in glocal
    let sc_e = if profile.is_local { S::ONE } else { S::ZERO };

    matrix.fill(S::ZERO);
    specials.reuse(target_length, S::ZERO);

    // initial row: all mass sits in N, with a free move into B
    specials.set(SPECIAL_N, row_lo, S::ONE);
    specials.set(
        SPECIAL_B,
        row_lo,
        S::from_log(profile.special_transition(SPECIAL_N, SPECIAL_MOVE)),
    );

    for row in row_lo + 1..=row_hi {
        let residue = target.digits[row];
        let prv_b = specials.get(SPECIAL_B, row - 1);
        let mut e_acc = S::ZERO;

        for bound_idx in matrix.edg_inner.id_range(row) {
            let bound = matrix.inner_bound(bound_idx);
            // the leftmost live column of the bound stays at semiring zero;
            // walking from one column before the bound makes the halo reads
            // of the first computed column fall inside the outer block
            let col_lo = bound.lb.saturating_sub(1);
            let col_hi = bound.rb.min(profile_length + 1);
            if col_hi - col_lo < 2 {
                continue;
            }

            let block_cur = matrix.block_cur(bound_idx);
            let block_prv = matrix.block_prv(bound_idx);

            let mut compute_cell = |matrix: &mut DpMatrixSparse, col: usize, is_right_edge: bool| {
                let col_offset = (col - bound.lb) as isize;
                let diag_offset = col_offset - 1;

                let prv_m = S::prod(
                    matrix.get(block_prv, diag_offset, MATCH),
                    S::from_log(profile.transition_score(col - 1, TRANS_MM)),
                );
                let prv_i = S::prod(
                    matrix.get(block_prv, diag_offset, INSERT),
                    S::from_log(profile.transition_score(col - 1, TRANS_IM)),
                );
                let prv_d = S::prod(
                    matrix.get(block_prv, diag_offset, DELETE),
                    S::from_log(profile.transition_score(col - 1, TRANS_DM)),
                );
                let prv_begin = S::prod(
                    prv_b,
                    S::from_log(profile.transition_score(col - 1, TRANS_BM)),
                );
                let m = S::prod(
                    S::sum(S::sum(prv_m, prv_i), S::sum(prv_d, prv_begin)),
                    S::from_log(profile.match_score(col, residue)),
                );

                let i = if is_right_edge {
                    // an insert cannot emit past the bound's last column
                    S::ZERO
                } else {
                    let prv_m = S::prod(
                        matrix.get(block_prv, col_offset, MATCH),
                        S::from_log(profile.transition_score(col, TRANS_MI)),
                    );
                    let prv_i = S::prod(
                        matrix.get(block_prv, col_offset, INSERT),
                        S::from_log(profile.transition_score(col, TRANS_II)),
                    );
                    S::prod(
                        S::sum(prv_m, prv_i),
                        S::from_log(profile.insert_score(col, residue)),
                    )
                };

                let prv_m = S::prod(
                    matrix.get(block_cur, diag_offset, MATCH),
                    S::from_log(profile.transition_score(col - 1, TRANS_MD)),
                );
                let prv_d = S::prod(
                    matrix.get(block_cur, diag_offset, DELETE),
                    S::from_log(profile.transition_score(col - 1, TRANS_DD)),
                );
                let d = S::sum(prv_m, prv_d);

                matrix.set(block_cur, col_offset, MATCH, m);
                matrix.set(block_cur, col_offset, INSERT, i);
                matrix.set(block_cur, col_offset, DELETE, d);

                e_acc = S::sum(e_acc, S::sum(S::prod(m, sc_e), S::prod(d, sc_e)));
            };

            for col in col_lo + 1..col_hi - 1 {
                compute_cell(matrix, col, false);
            }
            compute_cell(matrix, col_hi - 1, true);
        }

        specials.set(SPECIAL_E, row, e_acc);

        let j = S::sum(
            S::prod(
                specials.get(SPECIAL_J, row - 1),
                S::from_log(profile.special_transition(SPECIAL_J, SPECIAL_LOOP)),
            ),
            S::prod(
                e_acc,
                S::from_log(profile.special_transition(SPECIAL_E, SPECIAL_LOOP)),
            ),
        );
        specials.set(SPECIAL_J, row, j);

        let c = S::sum(
            S::prod(
                specials.get(SPECIAL_C, row - 1),
                S::from_log(profile.special_transition(SPECIAL_C, SPECIAL_LOOP)),
            ),
            S::prod(
                e_acc,
                S::from_log(profile.special_transition(SPECIAL_E, SPECIAL_MOVE)),
            ),
        );
        specials.set(SPECIAL_C, row, c);

        let n = S::prod(
            specials.get(SPECIAL_N, row - 1),
            S::from_log(profile.special_transition(SPECIAL_N, SPECIAL_LOOP)),
        );
        specials.set(SPECIAL_N, row, n);

        let b = S::sum(
            S::prod(
                n,
                S::from_log(profile.special_transition(SPECIAL_N, SPECIAL_MOVE)),
            ),
            S::prod(
                j,
                S::from_log(profile.special_transition(SPECIAL_J, SPECIAL_MOVE)),
            ),
        );
        specials.set(SPECIAL_B, row, b);
    }

    let score = S::prod(
        specials.get(SPECIAL_C, row_hi),
        S::from_log(profile.special_transition(SPECIAL_C, SPECIAL_MOVE)),
    );

    if score.is_nan() || score == f32::INFINITY {
        return Err(SearchError::NumericOverflow {
            row: row_hi,
            value: score,
        });
    }
    Ok(score)
}
