use crate::align::bounded::structs::dp_matrix_sparse::{DELETE, INSERT, MATCH};
use crate::align::bounded::structs::{DpMatrixSparse, DpMatrixSpecial};
use crate::error::SearchError;
use crate::structs::profile::{
    SPECIAL_B, SPECIAL_C, SPECIAL_E, SPECIAL_J, SPECIAL_LOOP, SPECIAL_MOVE, SPECIAL_N, TRANS_BM,
    TRANS_DD, TRANS_DM, TRANS_II, TRANS_IM, TRANS_MD, TRANS_MI, TRANS_MM,
};
use crate::structs::trace::State;
use crate::structs::{Profile, Trace};

#[inline]
fn gated(transition_score: f32, value: f32) -> f32 {
    if transition_score == f32::NEG_INFINITY {
        f32::NEG_INFINITY
    } else {
        value
    }
}

/// Pick the best-scoring candidate state; earlier entries win ties, so
/// callers list candidates in the order `M > I > D > B > N > J > C > E`.
fn best_candidate(candidates: &[(State, f32)]) -> Option<(State, f32)> {
    let mut best: Option<(State, f32)> = None;
    for &(state, score) in candidates {
        if score == f32::NEG_INFINITY {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((state, score)),
        }
    }
    best
}

/// Greedy traceback of the optimal-accuracy matrix, from the terminal
/// state at `row_hi` back to the start state. The trace comes out in
/// start-to-end order.
#[allow(clippy::too_many_arguments)]
pub fn traceback_bounded(
    profile: &Profile,
    posterior_matrix: &DpMatrixSparse,
    posterior_specials: &DpMatrixSpecial,
    optimal_matrix: &DpMatrixSparse,
    optimal_specials: &DpMatrixSpecial,
    trace: &mut Trace,
    row_range: Option<(usize, usize)>,
) -> Result<(), SearchError> {
    let target_length = optimal_matrix.target_length;
    let (row_lo, row_hi) = row_range.unwrap_or((0, target_length));

    trace.reuse(target_length, optimal_matrix.profile_length);

    let mut row = row_hi;
    let mut col = 0usize;
    let mut prv_state = State::C;
    trace.push(State::T, row, 0, 0.0);
    trace.push(State::C, row, 0, posterior_specials.get(SPECIAL_C, row));

    let step_limit = 4 * (target_length + optimal_matrix.profile_length + 4);

    while prv_state != State::S {
        if trace.len() > step_limit {
            return Err(SearchError::InvalidGeometry {
                row,
                col,
                state: "traceback",
                details: "traceback failed to reach the start state".to_string(),
            });
        }
        if row == row_lo {
            if prv_state == State::B {
                trace.push(State::N, row, 0, 0.0);
            }
            trace.push(State::S, row, 0, 0.0);
            break;
        }

        // locate the cell's storage blocks when we sit in the core model
        let mut block_cur = 0;
        let mut block_prv = 0;
        let mut col_offset = 0isize;
        if prv_state.is_core() {
            let mut found = false;
            for bound_idx in optimal_matrix.edg_inner.id_range(row) {
                let bound = optimal_matrix.inner_bound(bound_idx);
                if bound.contains(col) {
                    block_cur = optimal_matrix.block_cur(bound_idx);
                    block_prv = optimal_matrix.block_prv(bound_idx);
                    col_offset = (col - bound.lb) as isize;
                    found = true;
                    break;
                }
            }
            if !found {
                return Err(SearchError::InvalidGeometry {
                    row,
                    col,
                    state: "traceback",
                    details: format!("state {prv_state} left the cloud"),
                });
            }
        }

        let chosen = match prv_state {
            State::C => best_candidate(&[
                (
                    State::C,
                    gated(
                        profile.special_transition(SPECIAL_C, SPECIAL_LOOP),
                        optimal_specials.get(SPECIAL_C, row - 1)
                            + posterior_specials.get(SPECIAL_C, row),
                    ),
                ),
                (
                    State::E,
                    gated(
                        profile.special_transition(SPECIAL_E, SPECIAL_MOVE),
                        optimal_specials.get(SPECIAL_E, row),
                    ),
                ),
            ]),

            State::J => best_candidate(&[
                (
                    State::J,
                    gated(
                        profile.special_transition(SPECIAL_J, SPECIAL_LOOP),
                        optimal_specials.get(SPECIAL_J, row - 1)
                            + posterior_specials.get(SPECIAL_J, row),
                    ),
                ),
                (
                    State::E,
                    gated(
                        profile.special_transition(SPECIAL_E, SPECIAL_LOOP),
                        optimal_specials.get(SPECIAL_E, row),
                    ),
                ),
            ]),

            State::E => {
                // the end state gathers from every live match cell on the
                // row, and from delete at each bound's right edge
                let mut best: Option<(State, f32, usize)> = None;
                for bound_idx in optimal_matrix.edg_inner.id_range(row) {
                    let bound = optimal_matrix.inner_bound(bound_idx);
                    let block = optimal_matrix.block_cur(bound_idx);
                    let col_hi = bound.rb.min(optimal_matrix.profile_length + 1);
                    for cell_col in bound.lb..col_hi {
                        let offset = (cell_col - bound.lb) as isize;
                        let m = optimal_matrix.get(block, offset, MATCH);
                        let is_better = match best {
                            Some((_, best_score, _)) => m > best_score,
                            None => m > f32::NEG_INFINITY,
                        };
                        if is_better {
                            best = Some((State::M, m, cell_col));
                        }
                        if cell_col == col_hi - 1 {
                            let d = optimal_matrix.get(block, offset, DELETE);
                            let is_better = match best {
                                Some((_, best_score, _)) => d > best_score,
                                None => d > f32::NEG_INFINITY,
                            };
                            if is_better {
                                best = Some((State::D, d, cell_col));
                            }
                        }
                    }
                }
                best.map(|(state, score, best_col)| {
                    col = best_col;
                    (state, score)
                })
            }

            State::M => {
                let diag_offset = col_offset - 1;
                let result = best_candidate(&[
                    (
                        State::M,
                        gated(
                            profile.transition_score(col - 1, TRANS_MM),
                            optimal_matrix.get(block_prv, diag_offset, MATCH),
                        ),
                    ),
                    (
                        State::I,
                        gated(
                            profile.transition_score(col - 1, TRANS_IM),
                            optimal_matrix.get(block_prv, diag_offset, INSERT),
                        ),
                    ),
                    (
                        State::D,
                        gated(
                            profile.transition_score(col - 1, TRANS_DM),
                            optimal_matrix.get(block_prv, diag_offset, DELETE),
                        ),
                    ),
                    (
                        State::B,
                        gated(
                            profile.transition_score(col - 1, TRANS_BM),
                            optimal_specials.get(SPECIAL_B, row - 1),
                        ),
                    ),
                ]);
                row -= 1;
                col -= 1;
                result
            }

            State::I => {
                let result = best_candidate(&[
                    (
                        State::M,
                        gated(
                            profile.transition_score(col, TRANS_MI),
                            optimal_matrix.get(block_prv, col_offset, MATCH),
                        ),
                    ),
                    (
                        State::I,
                        gated(
                            profile.transition_score(col, TRANS_II),
                            optimal_matrix.get(block_prv, col_offset, INSERT),
                        ),
                    ),
                ]);
                row -= 1;
                result
            }

            State::D => {
                let diag_offset = col_offset - 1;
                let result = best_candidate(&[
                    (
                        State::M,
                        gated(
                            profile.transition_score(col - 1, TRANS_MD),
                            optimal_matrix.get(block_cur, diag_offset, MATCH),
                        ),
                    ),
                    (
                        State::D,
                        gated(
                            profile.transition_score(col - 1, TRANS_DD),
                            optimal_matrix.get(block_cur, diag_offset, DELETE),
                        ),
                    ),
                ]);
                col -= 1;
                result
            }

            State::B => best_candidate(&[
                (
                    State::N,
                    gated(
                        profile.special_transition(SPECIAL_N, SPECIAL_MOVE),
                        optimal_specials.get(SPECIAL_N, row),
                    ),
                ),
                (
                    State::J,
                    gated(
                        profile.special_transition(SPECIAL_J, SPECIAL_MOVE),
                        optimal_specials.get(SPECIAL_J, row),
                    ),
                ),
            ]),

            State::N => Some((State::N, optimal_specials.get(SPECIAL_N, row - 1))),

            State::S | State::T => None,
        };

        let Some((state, _score)) = chosen else {
            return Err(SearchError::InvalidGeometry {
                row,
                col,
                state: "traceback",
                details: format!("no viable predecessor from state {prv_state}"),
            });
        };

        let posterior = match state {
            State::M | State::I => cell_posterior(posterior_matrix, row, col, state),
            _ => 0.0,
        };
        trace.push(state, row, if state.is_core() { col } else { 0 }, posterior);

        // flanking states consume a residue only when they loop
        if matches!(state, State::N | State::J | State::C) && state == prv_state {
            row -= 1;
        }
        prv_state = state;
    }

    trace.reverse();
    Ok(())
}

fn cell_posterior(posterior_matrix: &DpMatrixSparse, row: usize, col: usize, state: State) -> f32 {
    let state_idx = match state {
        State::M => MATCH,
        State::I => INSERT,
        _ => return 0.0,
    };
    posterior_matrix.lookup(row, col, state_idx).unwrap_or(0.0)
}
