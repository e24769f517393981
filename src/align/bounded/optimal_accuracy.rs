use crate::align::bounded::structs::dp_matrix_sparse::{DELETE, INSERT, MATCH};
use crate::align::bounded::structs::{DpMatrixSparse, DpMatrixSpecial};
use crate::structs::profile::{
    SPECIAL_B, SPECIAL_C, SPECIAL_E, SPECIAL_J, SPECIAL_LOOP, SPECIAL_MOVE, SPECIAL_N, TRANS_BM,
    TRANS_DD, TRANS_DM, TRANS_II, TRANS_IM, TRANS_MD, TRANS_MI, TRANS_MM,
};
use crate::structs::Profile;

/// A candidate is only viable when the model can actually take the
/// transition; the accumulated accuracy itself carries no transition cost.
#[inline]
fn gated(transition_score: f32, value: f32) -> f32 {
    if transition_score == f32::NEG_INFINITY {
        f32::NEG_INFINITY
    } else {
        value
    }
}

/// Max-plus recurrence over the posterior matrix: each cell's value is the
/// best achievable sum of posteriors along any path that reaches it under
/// the Forward topology. Returns the final accumulated accuracy,
/// `C(q_hi)`: the expected number of correctly emitted residues of the
/// best alignment.
#[allow(clippy::too_many_arguments)]
pub fn optimal_accuracy_bounded(
    profile: &Profile,
    posterior_matrix: &DpMatrixSparse,
    posterior_specials: &DpMatrixSpecial,
    optimal_matrix: &mut DpMatrixSparse,
    optimal_specials: &mut DpMatrixSpecial,
    row_range: Option<(usize, usize)>,
) -> f32 {
    let target_length = posterior_matrix.target_length;
    let profile_length = posterior_matrix.profile_length;
    let (row_lo, row_hi) = row_range.unwrap_or((0, target_length));

    let sc_e = if profile.is_local {
        0.0
    } else {
        f32::NEG_INFINITY
    };

    optimal_matrix.fill(f32::NEG_INFINITY);
    optimal_specials.reuse(target_length, f32::NEG_INFINITY);
    optimal_specials.set(SPECIAL_N, row_lo, 0.0);
    optimal_specials.set(SPECIAL_B, row_lo, 0.0);

    for row in row_lo + 1..=row_hi {
        let prv_b = optimal_specials.get(SPECIAL_B, row - 1);
        let mut e_best = f32::NEG_INFINITY;

        for bound_idx in optimal_matrix.edg_inner.id_range(row) {
            let bound = optimal_matrix.inner_bound(bound_idx);
            let col_lo = bound.lb.saturating_sub(1);
            let col_hi = bound.rb.min(profile_length + 1);
            if col_hi - col_lo < 2 {
                continue;
            }

            let block_cur = optimal_matrix.block_cur(bound_idx);
            let block_prv = optimal_matrix.block_prv(bound_idx);

            let mut compute_cell =
                |optimal_matrix: &mut DpMatrixSparse, col: usize, is_right_edge: bool| {
                    let col_offset = (col - bound.lb) as isize;
                    let diag_offset = col_offset - 1;

                    let post_m = posterior_matrix.get(block_cur, col_offset, MATCH);
                    let post_i = posterior_matrix.get(block_cur, col_offset, INSERT);
                    let post_d = posterior_matrix.get(block_cur, col_offset, DELETE);

                    let m = gated(
                        profile.transition_score(col - 1, TRANS_MM),
                        optimal_matrix.get(block_prv, diag_offset, MATCH) + post_m,
                    )
                    .max(gated(
                        profile.transition_score(col - 1, TRANS_IM),
                        optimal_matrix.get(block_prv, diag_offset, INSERT) + post_m,
                    ))
                    .max(gated(
                        profile.transition_score(col - 1, TRANS_DM),
                        optimal_matrix.get(block_prv, diag_offset, DELETE) + post_m,
                    ))
                    .max(gated(
                        profile.transition_score(col - 1, TRANS_BM),
                        prv_b + post_m,
                    ));

                    let i = if is_right_edge {
                        f32::NEG_INFINITY
                    } else {
                        gated(
                            profile.transition_score(col, TRANS_MI),
                            optimal_matrix.get(block_prv, col_offset, MATCH) + post_i,
                        )
                        .max(gated(
                            profile.transition_score(col, TRANS_II),
                            optimal_matrix.get(block_prv, col_offset, INSERT) + post_i,
                        ))
                    };

                    let d = gated(
                        profile.transition_score(col - 1, TRANS_MD),
                        optimal_matrix.get(block_cur, diag_offset, MATCH) + post_d,
                    )
                    .max(gated(
                        profile.transition_score(col - 1, TRANS_DD),
                        optimal_matrix.get(block_cur, diag_offset, DELETE) + post_d,
                    ));

                    optimal_matrix.set(block_cur, col_offset, MATCH, m);
                    optimal_matrix.set(block_cur, col_offset, INSERT, i);
                    optimal_matrix.set(block_cur, col_offset, DELETE, d);

                    e_best = e_best.max(m + sc_e);
                    if is_right_edge {
                        e_best = e_best.max(d + sc_e);
                    }
                };

            for col in col_lo + 1..col_hi - 1 {
                compute_cell(optimal_matrix, col, false);
            }
            compute_cell(optimal_matrix, col_hi - 1, true);
        }

        optimal_specials.set(SPECIAL_E, row, e_best);

        let j = gated(
            profile.special_transition(SPECIAL_J, SPECIAL_LOOP),
            optimal_specials.get(SPECIAL_J, row - 1) + posterior_specials.get(SPECIAL_J, row),
        )
        .max(gated(
            profile.special_transition(SPECIAL_E, SPECIAL_LOOP),
            e_best,
        ));
        optimal_specials.set(SPECIAL_J, row, j);

        let c = gated(
            profile.special_transition(SPECIAL_C, SPECIAL_LOOP),
            optimal_specials.get(SPECIAL_C, row - 1) + posterior_specials.get(SPECIAL_C, row),
        )
        .max(gated(
            profile.special_transition(SPECIAL_E, SPECIAL_MOVE),
            e_best,
        ));
        optimal_specials.set(SPECIAL_C, row, c);

        let n = gated(
            profile.special_transition(SPECIAL_N, SPECIAL_LOOP),
            optimal_specials.get(SPECIAL_N, row - 1) + posterior_specials.get(SPECIAL_N, row),
        );
        optimal_specials.set(SPECIAL_N, row, n);

        let b = gated(profile.special_transition(SPECIAL_N, SPECIAL_MOVE), n)
            .max(gated(profile.special_transition(SPECIAL_J, SPECIAL_MOVE), j));
        optimal_specials.set(SPECIAL_B, row, b);
    }

    optimal_specials.get(SPECIAL_C, row_hi)
}
