mod common;

use common::{favoring_profile, full_rectangle_bounds, named_sequence, seed};

use cloudseqs::align::bounded::structs::dp_matrix_sparse::{DELETE, INSERT, MATCH};
use cloudseqs::align::bounded::structs::{
    CloudMatrixLinear, CloudSearchParams, DpMatrixSparse, DpMatrixSpecial, EdgeBounds,
};
use cloudseqs::align::bounded::{
    backward_bounded, cloud_search_backward, cloud_search_forward, forward_bounded,
    forward_bounded_in, optimal_accuracy_bounded, posterior_bounded, traceback_bounded,
};
use cloudseqs::log_sum::{LogSpace, NormalSpace};
use cloudseqs::structs::profile::{SPECIAL_C, SPECIAL_J, SPECIAL_N};
use cloudseqs::structs::trace::State;
use cloudseqs::structs::{Profile, Sequence, Trace};

fn matrices(
    profile: &Profile,
    target: &Sequence,
    bounds: &EdgeBounds,
) -> (DpMatrixSparse, DpMatrixSpecial) {
    (
        DpMatrixSparse::new(target.length, profile.length, bounds).unwrap(),
        DpMatrixSpecial::new(target.length),
    )
}

#[test]
fn forward_is_semiring_invariant() {
    let mut profile = favoring_profile(5, b'A', 0.9, true);
    let target = named_sequence("tgt", b"AAAAA");
    profile.configure_for_target_length(target.length);
    let bounds = full_rectangle_bounds(target.length, profile.length);

    let (mut matrix, mut specials) = matrices(&profile, &target, &bounds);
    let log_score =
        forward_bounded_in::<LogSpace>(&profile, &target, &mut matrix, &mut specials, None)
            .unwrap();
    let normal_score =
        forward_bounded_in::<NormalSpace>(&profile, &target, &mut matrix, &mut specials, None)
            .unwrap();

    let relative = (log_score.exp() - normal_score).abs() / normal_score;
    assert!(
        relative < 1e-4,
        "log {} (exp {}) vs normal {normal_score}",
        log_score,
        log_score.exp()
    );
}

#[test]
fn forward_and_backward_scores_agree() {
    let mut profile = favoring_profile(6, b'A', 0.9, true);
    let target = named_sequence("tgt", b"AAAGAA");
    profile.configure_for_target_length(target.length);
    let bounds = full_rectangle_bounds(target.length, profile.length);

    let (mut fwd_matrix, mut fwd_specials) = matrices(&profile, &target, &bounds);
    let (mut bck_matrix, mut bck_specials) = matrices(&profile, &target, &bounds);

    let forward_score =
        forward_bounded(&profile, &target, &mut fwd_matrix, &mut fwd_specials, None).unwrap();
    let backward_score =
        backward_bounded(&profile, &target, &mut bck_matrix, &mut bck_specials, None).unwrap();

    assert!(
        (forward_score - backward_score).abs() < 1e-4,
        "forward {forward_score} vs backward {backward_score}"
    );
}

#[test]
fn posterior_rows_are_normalised() {
    let mut profile = favoring_profile(5, b'A', 0.9, true);
    let target = named_sequence("tgt", b"AAGAA");
    profile.configure_for_target_length(target.length);
    let bounds = full_rectangle_bounds(target.length, profile.length);

    let (mut fwd_matrix, mut fwd_specials) = matrices(&profile, &target, &bounds);
    let (mut bck_matrix, mut bck_specials) = matrices(&profile, &target, &bounds);
    let (mut post_matrix, mut post_specials) = matrices(&profile, &target, &bounds);

    let forward_score =
        forward_bounded(&profile, &target, &mut fwd_matrix, &mut fwd_specials, None).unwrap();
    backward_bounded(&profile, &target, &mut bck_matrix, &mut bck_specials, None).unwrap();
    posterior_bounded(
        &profile,
        &fwd_matrix,
        &fwd_specials,
        &bck_matrix,
        &bck_specials,
        &mut post_matrix,
        &mut post_specials,
        forward_score,
        None,
    );

    for row in 1..=target.length {
        let mut total = 0.0f32;
        for bound_idx in post_matrix.edg_inner.id_range(row) {
            let bound = post_matrix.edg_inner.get(bound_idx);
            for col in bound.lb..bound.rb.min(profile.length + 1) {
                total += post_matrix.lookup(row, col, MATCH).unwrap();
                total += post_matrix.lookup(row, col, INSERT).unwrap();
                // delete states carry no emission probability
                assert_eq!(post_matrix.lookup(row, col, DELETE), Some(0.0));
            }
        }
        total += post_specials.get(SPECIAL_N, row)
            + post_specials.get(SPECIAL_J, row)
            + post_specials.get(SPECIAL_C, row);
        assert!(
            (total - 1.0).abs() < 1e-6,
            "row {row} posterior mass is {total}"
        );
    }
}

/// Transitions a start-to-end trace is allowed to take.
fn transition_allowed(from: State, to: State) -> bool {
    use State::*;
    matches!(
        (from, to),
        (S, N)
            | (N, N)
            | (N, B)
            | (B, M)
            | (M, M)
            | (M, I)
            | (M, D)
            | (M, E)
            | (I, M)
            | (I, I)
            | (D, M)
            | (D, D)
            | (D, E)
            | (E, J)
            | (E, C)
            | (J, J)
            | (J, B)
            | (C, C)
            | (C, T)
    )
}

#[test]
fn traceback_stays_inside_the_cloud_and_obeys_the_topology() {
    let mut profile = favoring_profile(6, b'A', 0.9, true);
    let target = named_sequence("tgt", b"AAAAAA");
    profile.configure_for_target_length(target.length);

    // the full bounded pipeline, by hand
    let mut cloud_matrix = CloudMatrixLinear::default();
    let mut forward_bounds = EdgeBounds::default();
    let mut backward_bounds = EdgeBounds::default();
    let params = CloudSearchParams::default();
    let anchors = seed(1, 6, 1, 6);

    cloud_search_forward(
        &profile,
        &target,
        &anchors,
        &mut cloud_matrix,
        &params,
        &mut forward_bounds,
    )
    .unwrap();
    cloud_search_backward(
        &profile,
        &target,
        &anchors,
        &mut cloud_matrix,
        &params,
        &mut backward_bounds,
    )
    .unwrap();
    forward_bounds.union_with(&backward_bounds);
    let mut row_bounds = EdgeBounds::default();
    forward_bounds.reorient_into(&mut row_bounds);

    let (mut fwd_matrix, mut fwd_specials) = matrices(&profile, &target, &row_bounds);
    let (mut bck_matrix, mut bck_specials) = matrices(&profile, &target, &row_bounds);
    let (mut post_matrix, mut post_specials) = matrices(&profile, &target, &row_bounds);
    let (mut opt_matrix, mut opt_specials) = matrices(&profile, &target, &row_bounds);

    let forward_score =
        forward_bounded(&profile, &target, &mut fwd_matrix, &mut fwd_specials, None).unwrap();
    backward_bounded(&profile, &target, &mut bck_matrix, &mut bck_specials, None).unwrap();
    posterior_bounded(
        &profile,
        &fwd_matrix,
        &fwd_specials,
        &bck_matrix,
        &bck_specials,
        &mut post_matrix,
        &mut post_specials,
        forward_score,
        None,
    );
    optimal_accuracy_bounded(
        &profile,
        &post_matrix,
        &post_specials,
        &mut opt_matrix,
        &mut opt_specials,
        None,
    );

    let mut trace = Trace::new(target.length, profile.length);
    traceback_bounded(
        &profile,
        &post_matrix,
        &post_specials,
        &opt_matrix,
        &opt_specials,
        &mut trace,
        None,
    )
    .unwrap();

    assert!(trace.len() >= 4);
    assert_eq!(trace.steps.first().unwrap().state, State::S);
    assert_eq!(trace.steps.last().unwrap().state, State::T);

    for step in &trace.steps {
        if step.state.is_core() {
            let live = row_bounds
                .id_range(step.target_idx)
                .map(|idx| row_bounds.get(idx))
                .any(|b| b.contains(step.profile_idx));
            assert!(
                live,
                "{} at ({}, {}) is outside the cloud",
                step.state, step.target_idx, step.profile_idx
            );
        }
    }

    for pair in trace.steps.windows(2) {
        assert!(
            transition_allowed(pair[0].state, pair[1].state),
            "illegal transition {} -> {}",
            pair[0].state,
            pair[1].state
        );
    }

    // the alignment should be the plain five-or-six match diagonal
    let matches = trace.steps.iter().filter(|s| s.state == State::M).count();
    assert!(matches >= 5);
}
