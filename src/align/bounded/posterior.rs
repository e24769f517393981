use crate::align::bounded::structs::dp_matrix_sparse::{DELETE, INSERT, MATCH};
use crate::align::bounded::structs::{DpMatrixSparse, DpMatrixSpecial};
use crate::structs::profile::{
    SPECIAL_B, SPECIAL_C, SPECIAL_E, SPECIAL_J, SPECIAL_LOOP, SPECIAL_N,
};
use crate::structs::Profile;

/// Combine filled Forward and Backward matrices into per-cell posterior
/// probabilities, renormalised so that every row's emitting states sum
/// to one.
///
/// The posterior matrices come out in normal space: cell `(q, t, s)` holds
/// the probability that the alignment emits residue `q` from state `s` at
/// profile position `t`. Delete cells carry no emission and are zeroed, as
/// are the leftmost live column and the rightmost live column's insert of
/// every bound.
#[allow(clippy::too_many_arguments)]
pub fn posterior_bounded(
    profile: &Profile,
    forward_matrix: &DpMatrixSparse,
    forward_specials: &DpMatrixSpecial,
    backward_matrix: &DpMatrixSparse,
    backward_specials: &DpMatrixSpecial,
    posterior_matrix: &mut DpMatrixSparse,
    posterior_specials: &mut DpMatrixSpecial,
    overall_score: f32,
    row_range: Option<(usize, usize)>,
) {
    let target_length = forward_matrix.target_length;
    let profile_length = forward_matrix.profile_length;
    let (row_lo, row_hi) = row_range.unwrap_or((0, target_length));

    // a range with no alignment mass at all decodes to all-zero posteriors
    // rather than poisoning the matrix with NaN
    let overall_score = if overall_score.is_finite() {
        overall_score
    } else {
        0.0
    };

    posterior_matrix.fill(f32::NEG_INFINITY);
    posterior_specials.reuse(target_length, f32::NEG_INFINITY);

    // log-space pass: posterior = forward * backward / overall
    for row in row_lo + 1..=row_hi {
        for bound_idx in posterior_matrix.edg_inner.id_range(row) {
            let bound = posterior_matrix.inner_bound(bound_idx);
            let col_lo = bound.lb;
            let col_hi = bound.rb.min(profile_length + 1);
            let block = posterior_matrix.block_cur(bound_idx);

            for col in col_lo + 1..col_hi.saturating_sub(1) {
                let offset = (col - bound.lb) as isize;
                let m = forward_matrix.get(block, offset, MATCH)
                    + backward_matrix.get(block, offset, MATCH)
                    - overall_score;
                let i = forward_matrix.get(block, offset, INSERT)
                    + backward_matrix.get(block, offset, INSERT)
                    - overall_score;
                posterior_matrix.set(block, offset, MATCH, m);
                posterior_matrix.set(block, offset, INSERT, i);
            }

            // the rightmost live column emits through match only; the
            // leftmost stays at zero
            if col_hi - col_lo > 1 {
                let offset = (col_hi - 1 - bound.lb) as isize;
                let m = forward_matrix.get(block, offset, MATCH)
                    + backward_matrix.get(block, offset, MATCH)
                    - overall_score;
                posterior_matrix.set(block, offset, MATCH, m);
            }
        }

        let n = forward_specials.get(SPECIAL_N, row - 1)
            + backward_specials.get(SPECIAL_N, row)
            + profile.special_transition(SPECIAL_N, SPECIAL_LOOP)
            - overall_score;
        posterior_specials.set(SPECIAL_N, row, n);

        let j = forward_specials.get(SPECIAL_J, row - 1)
            + backward_specials.get(SPECIAL_J, row)
            + profile.special_transition(SPECIAL_J, SPECIAL_LOOP)
            - overall_score;
        posterior_specials.set(SPECIAL_J, row, j);

        let c = forward_specials.get(SPECIAL_C, row - 1)
            + backward_specials.get(SPECIAL_C, row)
            + profile.special_transition(SPECIAL_C, SPECIAL_LOOP)
            - overall_score;
        posterior_specials.set(SPECIAL_C, row, c);
    }

    posterior_matrix.exp_all();
    posterior_specials.exp_all();

    // normal-space pass: scale each row by the reciprocal of its total
    // emitting mass
    for row in row_lo + 1..=row_hi {
        let mut denom = 0.0f32;

        for bound_idx in posterior_matrix.edg_inner.id_range(row) {
            let bound = posterior_matrix.inner_bound(bound_idx);
            let col_hi = bound.rb.min(profile_length + 1);
            let block = posterior_matrix.block_cur(bound_idx);
            for col in bound.lb + 1..col_hi {
                let offset = (col - bound.lb) as isize;
                denom += posterior_matrix.get(block, offset, MATCH);
                denom += posterior_matrix.get(block, offset, INSERT);
            }
        }

        denom += posterior_specials.get(SPECIAL_N, row)
            + posterior_specials.get(SPECIAL_J, row)
            + posterior_specials.get(SPECIAL_C, row);

        // a row with no reachable mass scales to all-zero rather than NaN
        let scale = if denom > 0.0 && denom.is_finite() {
            1.0 / denom
        } else {
            0.0
        };

        for bound_idx in posterior_matrix.edg_inner.id_range(row) {
            let bound = posterior_matrix.inner_bound(bound_idx);
            let col_lo = bound.lb;
            let col_hi = bound.rb.min(profile_length + 1);
            let block = posterior_matrix.block_cur(bound_idx);

            for col in col_lo..col_hi {
                let offset = (col - bound.lb) as isize;
                let is_left_edge = col == col_lo;
                let is_right_edge = col == col_hi - 1;

                if is_left_edge {
                    posterior_matrix.set(block, offset, MATCH, 0.0);
                    posterior_matrix.set(block, offset, INSERT, 0.0);
                } else {
                    let m = posterior_matrix.get(block, offset, MATCH);
                    posterior_matrix.set(block, offset, MATCH, m * scale);
                    if is_right_edge {
                        posterior_matrix.set(block, offset, INSERT, 0.0);
                    } else {
                        let i = posterior_matrix.get(block, offset, INSERT);
                        posterior_matrix.set(block, offset, INSERT, i * scale);
                    }
                }
                posterior_matrix.set(block, offset, DELETE, 0.0);
            }
        }

        posterior_specials.scale_row(row, scale);
        posterior_specials.set(SPECIAL_E, row, 0.0);
        posterior_specials.set(SPECIAL_B, row, 0.0);
    }
}
