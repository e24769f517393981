use crate::align::bounded::structs::{
    Bound, BoundOrientation, CloudMatrixLinear, CloudSearchParams, EdgeBounds, Seed,
};
use crate::error::SearchError;
use crate::log_sum::log_sum;
use crate::structs::profile::{
    TRANS_DD, TRANS_DM, TRANS_II, TRANS_IM, TRANS_MD, TRANS_MI, TRANS_MM,
};
use crate::structs::{Profile, Sequence};

/// What one directional sweep did: the best cell score it saw, how many
/// antidiagonals it computed, and whether pruning killed it before it ever
/// left the warm-up.
#[derive(Debug, Clone, Copy)]
pub struct CloudSweepStats {
    pub max_score: f32,
    pub num_antidiagonals: usize,
    pub died_in_warm_up: bool,
}

fn validate_seed(profile: &Profile, target: &Sequence, seed: &Seed) -> Result<(), SearchError> {
    let anchors_ordered =
        seed.target_start <= seed.target_end && seed.profile_start <= seed.profile_end;
    let anchors_in_range =
        seed.target_end <= target.length && seed.profile_end <= profile.length;
    if !anchors_ordered || !anchors_in_range {
        return Err(SearchError::InvalidAnchor {
            target_start: seed.target_start,
            target_end: seed.target_end,
            target_length: target.length,
            profile_start: seed.profile_start,
            profile_end: seed.profile_end,
            profile_length: profile.length,
        });
    }
    Ok(())
}

/// Trim one antidiagonal's intervals against the running maximum: advance
/// from each end until a cell's best state clears `limit`, dropping
/// intervals that never do.
fn trim_intervals(
    cloud_matrix: &CloudMatrixLinear,
    stripe: usize,
    limit: f32,
    prev: &[(usize, usize)],
    out: &mut Vec<(usize, usize)>,
) {
    for &(lb, rb) in prev {
        let Some(new_lb) = (lb..rb).find(|&k| cloud_matrix.cell_max(stripe, k) >= limit) else {
            continue;
        };
        let new_rb = (new_lb..rb)
            .rev()
            .find(|&k| cloud_matrix.cell_max(stripe, k) >= limit)
            .expect("left scan succeeded");
        out.push((new_lb, new_rb + 1));
    }
}

/// Clip intervals to `[min_row, max_row]` and coalesce any that meet after
/// growth, in place.
fn clip_and_coalesce(intervals: &mut Vec<(usize, usize)>, min_row: usize, max_row: usize) {
    let mut kept = 0;
    for i in 0..intervals.len() {
        let (lb, rb) = intervals[i];
        let lb = lb.max(min_row);
        let rb = rb.min(max_row + 1);
        if lb >= rb {
            continue;
        }
        if kept > 0 && lb <= intervals[kept - 1].1 {
            intervals[kept - 1].1 = intervals[kept - 1].1.max(rb);
        } else {
            intervals[kept] = (lb, rb);
            kept += 1;
        }
    }
    intervals.truncate(kept);
}

/// Sweep antidiagonally from the seed's begin anchor toward the far corner
/// of the matrix, recording the surviving cell intervals of every
/// antidiagonal into `bounds` (antidiagonal-indexed).
pub fn cloud_search_forward(
    profile: &Profile,
    target: &Sequence,
    seed: &Seed,
    cloud_matrix: &mut CloudMatrixLinear,
    params: &CloudSearchParams,
    bounds: &mut EdgeBounds,
) -> Result<CloudSweepStats, SearchError> {
    validate_seed(profile, target, seed)?;

    let target_length = target.length;
    let profile_length = profile.length;
    let row_beg = seed.target_start.max(1);
    let col_beg = seed.profile_start.max(1);

    bounds.reuse(target_length, profile_length, BoundOrientation::Antidiagonal);
    cloud_matrix.reuse(target_length);

    let first_diag = row_beg + col_beg;
    let last_diag = target_length + profile_length;

    let mut prev: Vec<(usize, usize)> = Vec::with_capacity(4);
    let mut cur: Vec<(usize, usize)> = Vec::with_capacity(4);
    let mut total_max = f32::NEG_INFINITY;
    let mut prev_diag_max = f32::NEG_INFINITY;
    let mut num_antidiagonals = 0;
    let mut died_in_warm_up = false;

    for d in first_diag..=last_diag {
        let stripe_0 = d % 3; // current
        let stripe_1 = (d + 2) % 3; // one back
        let stripe_2 = (d + 1) % 3; // two back

        // the sweep triangle: rows the antidiagonal intersects inside
        // [row_beg, Q] x [col_beg, T]
        let min_row = row_beg.max(d.saturating_sub(profile_length));
        let max_row = target_length.min(d - col_beg);
        if min_row > max_row {
            break;
        }

        if d == first_diag {
            cur.clear();
            cur.push((row_beg, row_beg + 1));
        } else {
            if prev_diag_max < total_max - params.beta {
                died_in_warm_up = num_antidiagonals <= params.gamma;
                break;
            }

            cur.clear();
            if num_antidiagonals <= params.gamma {
                cur.extend_from_slice(&prev);
            } else {
                trim_intervals(
                    cloud_matrix,
                    stripe_1,
                    total_max - params.alpha,
                    &prev,
                    &mut cur,
                );
                if cur.is_empty() {
                    break;
                }
            }

            // each interval reaches one row further down the antidiagonal
            for interval in cur.iter_mut() {
                interval.1 += 1;
            }
            clip_and_coalesce(&mut cur, min_row, max_row);
            if cur.is_empty() {
                break;
            }
        }

        cloud_matrix.reset_antidiagonal(stripe_0);
        let mut diag_max = f32::NEG_INFINITY;

        for &(lb, rb) in cur.iter() {
            for k in lb..rb {
                let row = k;
                let col = d - k;
                let residue = target.digits[row];

                if d == first_diag {
                    let m = profile.match_score(col, residue);
                    cloud_matrix.set_match(stripe_0, k, m);
                    diag_max = diag_max.max(m);
                    continue;
                }

                let prv_m = cloud_matrix.get_match(stripe_2, k - 1)
                    + profile.transition_score(col - 1, TRANS_MM);
                let prv_i = cloud_matrix.get_insert(stripe_2, k - 1)
                    + profile.transition_score(col - 1, TRANS_IM);
                let prv_d = cloud_matrix.get_delete(stripe_2, k - 1)
                    + profile.transition_score(col - 1, TRANS_DM);
                let m = profile.match_score(col, residue)
                    + log_sum(log_sum(prv_m, prv_i), prv_d);

                let prv_m = cloud_matrix.get_match(stripe_1, k - 1)
                    + profile.transition_score(col, TRANS_MI);
                let prv_i = cloud_matrix.get_insert(stripe_1, k - 1)
                    + profile.transition_score(col, TRANS_II);
                let i = profile.insert_score(col, residue) + log_sum(prv_m, prv_i);

                let prv_m = cloud_matrix.get_match(stripe_1, k)
                    + profile.transition_score(col - 1, TRANS_MD);
                let prv_d = cloud_matrix.get_delete(stripe_1, k)
                    + profile.transition_score(col - 1, TRANS_DD);
                let del = log_sum(prv_m, prv_d);

                cloud_matrix.set_match(stripe_0, k, m);
                cloud_matrix.set_insert(stripe_0, k, i);
                cloud_matrix.set_delete(stripe_0, k, del);
                diag_max = diag_max.max(m).max(i).max(del);
            }
            bounds.push(Bound::new(d, lb, rb));
        }

        total_max = total_max.max(diag_max);
        prev_diag_max = diag_max;
        num_antidiagonals += 1;
        std::mem::swap(&mut prev, &mut cur);
    }

    Ok(CloudSweepStats {
        max_score: total_max,
        num_antidiagonals,
        died_in_warm_up,
    })
}

/// Sweep antidiagonally from the seed's end anchor back toward the matrix
/// origin, the mirror image of `cloud_search_forward`.
pub fn cloud_search_backward(
    profile: &Profile,
    target: &Sequence,
    seed: &Seed,
    cloud_matrix: &mut CloudMatrixLinear,
    params: &CloudSearchParams,
    bounds: &mut EdgeBounds,
) -> Result<CloudSweepStats, SearchError> {
    validate_seed(profile, target, seed)?;

    let target_length = target.length;
    let profile_length = profile.length;
    let row_end = seed.target_end.min(target_length).max(1);
    let col_end = seed.profile_end.min(profile_length).max(1);

    bounds.reuse(target_length, profile_length, BoundOrientation::Antidiagonal);
    cloud_matrix.reuse(target_length);

    let first_diag = row_end + col_end;

    let mut prev: Vec<(usize, usize)> = Vec::with_capacity(4);
    let mut cur: Vec<(usize, usize)> = Vec::with_capacity(4);
    let mut total_max = f32::NEG_INFINITY;
    let mut prev_diag_max = f32::NEG_INFINITY;
    let mut num_antidiagonals = 0;
    let mut died_in_warm_up = false;

    for d in (0..=first_diag).rev() {
        let stripe_0 = d % 3; // current
        let stripe_1 = (d + 1) % 3; // one ahead
        let stripe_2 = (d + 2) % 3; // two ahead

        // rows the antidiagonal intersects inside [0, row_end] x [0, col_end]
        let min_row = d.saturating_sub(col_end);
        let max_row = row_end.min(d);

        if d == first_diag {
            cur.clear();
            cur.push((row_end, row_end + 1));
        } else {
            if prev_diag_max < total_max - params.beta {
                died_in_warm_up = num_antidiagonals <= params.gamma;
                break;
            }

            cur.clear();
            if num_antidiagonals <= params.gamma {
                cur.extend_from_slice(&prev);
            } else {
                trim_intervals(
                    cloud_matrix,
                    stripe_1,
                    total_max - params.alpha,
                    &prev,
                    &mut cur,
                );
                if cur.is_empty() {
                    break;
                }
            }

            // each interval reaches one row further up the antidiagonal
            for interval in cur.iter_mut() {
                interval.0 = interval.0.saturating_sub(1);
            }
            clip_and_coalesce(&mut cur, min_row, max_row);
            if cur.is_empty() {
                break;
            }
        }

        cloud_matrix.reset_antidiagonal(stripe_0);
        let mut diag_max = f32::NEG_INFINITY;

        for &(lb, rb) in cur.iter() {
            for k in lb..rb {
                let row = k;
                let col = d - k;

                if d == first_diag {
                    cloud_matrix.set_match(stripe_0, k, 0.0);
                    diag_max = diag_max.max(0.0);
                    continue;
                }

                // suffix scores read the cell one row and/or column ahead;
                // anything outside the sweep rectangle contributes nothing
                let in_next_row = row < target_length;
                let next_residue = if in_next_row {
                    target.digits[row + 1]
                } else {
                    0
                };

                let m_diag = if in_next_row && col < profile_length {
                    cloud_matrix.get_match(stripe_2, k + 1)
                        + profile.match_score(col + 1, next_residue)
                } else {
                    f32::NEG_INFINITY
                };
                let i_down = if in_next_row {
                    cloud_matrix.get_insert(stripe_1, k + 1)
                        + profile.insert_score(col, next_residue)
                } else {
                    f32::NEG_INFINITY
                };
                let d_right = cloud_matrix.get_delete(stripe_1, k);

                let m = log_sum(
                    log_sum(
                        m_diag + profile.transition_score(col, TRANS_MM),
                        i_down + profile.transition_score(col, TRANS_MI),
                    ),
                    d_right + profile.transition_score(col, TRANS_MD),
                );
                let i = log_sum(
                    m_diag + profile.transition_score(col, TRANS_IM),
                    i_down + profile.transition_score(col, TRANS_II),
                );
                let del = log_sum(
                    m_diag + profile.transition_score(col, TRANS_DM),
                    d_right + profile.transition_score(col, TRANS_DD),
                );

                cloud_matrix.set_match(stripe_0, k, m);
                cloud_matrix.set_insert(stripe_0, k, i);
                cloud_matrix.set_delete(stripe_0, k, del);
                diag_max = diag_max.max(m).max(i).max(del);
            }
            bounds.push(Bound::new(d, lb, rb));
        }

        total_max = total_max.max(diag_max);
        prev_diag_max = diag_max;
        num_antidiagonals += 1;
        std::mem::swap(&mut prev, &mut cur);
    }

    Ok(CloudSweepStats {
        max_score: total_max,
        num_antidiagonals,
        died_in_warm_up,
    })
}
