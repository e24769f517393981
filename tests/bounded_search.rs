mod common;

use common::{dense_forward, favoring_profile, named_sequence, seed};

use cloudseqs::align::bounded::structs::{CloudSearchParams, DomainParams};
use cloudseqs::error::SearchError;
use cloudseqs::search::{SearchOutcome, SearchParams, SearchResult, Worker};
use cloudseqs::structs::amino::AMINO_ALPHABET_SIZE;
use cloudseqs::structs::profile::{
    NUM_TRANSITIONS, TRANS_BM, TRANS_DD, TRANS_DM, TRANS_II, TRANS_IM, TRANS_MD, TRANS_MI,
    TRANS_MM,
};
use cloudseqs::structs::Profile;

fn complete(outcome: SearchOutcome) -> Box<SearchResult> {
    match outcome {
        SearchOutcome::Complete(result) => result,
        SearchOutcome::EmptyCloud => panic!("expected a complete search"),
    }
}

#[test]
fn small_search_covers_the_full_rectangle() {
    let mut profile = favoring_profile(5, b'A', 0.9, true);
    let target = named_sequence("tgt", b"AAAAA");
    let mut worker = Worker::new();

    let result = complete(
        worker
            .search(&mut profile, &target, &seed(1, 5, 1, 5), &SearchParams::default())
            .unwrap(),
    );

    // every in-model cell is live
    for row in 1..=5usize {
        for col in 1..=5usize {
            let live = result
                .edge_bounds
                .id_range(row)
                .map(|idx| result.edge_bounds.get(idx))
                .any(|b| b.contains(col));
            assert!(live, "cell ({row},{col}) missing from the cloud");
        }
    }
    assert!(result.cell_stats.cloud_cells >= 34);
    assert_eq!(result.cell_stats.total_cells, 36);

    // with the whole matrix live, the bounded score is the dense score
    let dense = dense_forward(&profile, &target);
    assert!(
        (result.scores.nat_score - dense).abs() < 1e-4,
        "bounded {} vs dense {dense}",
        result.scores.nat_score
    );

    assert_eq!(result.domains.len(), 1);
    assert_eq!(result.domains[0].range.start, 1);
    assert_eq!(result.domains[0].range.end, 5);
}

#[test]
fn short_target_against_long_profile_completes() {
    let mut profile = favoring_profile(10, b'A', 0.9, true);
    let target = named_sequence("tgt", b"AAA");
    let mut worker = Worker::new();

    let result = complete(
        worker
            .search(&mut profile, &target, &seed(1, 3, 1, 3), &SearchParams::default())
            .unwrap(),
    );

    assert!(result.scores.nat_score.is_finite());
    assert!(result.cell_stats.cloud_cells > 0);
}

#[test]
fn reversed_anchor_is_an_invalid_anchor() {
    let mut profile = favoring_profile(5, b'A', 0.9, true);
    let target = named_sequence("tgt", b"AAAAA");
    let mut worker = Worker::new();

    let result = worker.search(&mut profile, &target, &seed(4, 2, 1, 5), &SearchParams::default());
    assert!(matches!(result, Err(SearchError::InvalidAnchor { .. })));
}

#[test]
fn empty_target_is_invalid_input() {
    let mut profile = favoring_profile(5, b'A', 0.9, true);
    let target = named_sequence("tgt", b"");
    let mut worker = Worker::new();

    let result = worker.search(&mut profile, &target, &seed(1, 1, 1, 1), &SearchParams::default());
    assert!(matches!(result, Err(SearchError::InvalidInput(_))));
}

/// A profile so sharply peaked that a mismatched target collapses the
/// sweep within the warm-up.
fn hostile_profile(length: usize) -> Profile {
    let weight = 0.999_999f32;
    let mut match_row = [((1.0 - weight) / 19.0f32).ln(); AMINO_ALPHABET_SIZE];
    match_row[0] = weight.ln(); // A

    let mut transition = [f32::NEG_INFINITY; NUM_TRANSITIONS];
    transition[TRANS_MM] = 0.998f32.ln();
    transition[TRANS_MI] = 0.001f32.ln();
    transition[TRANS_MD] = 0.001f32.ln();
    transition[TRANS_IM] = 0.999f32.ln();
    transition[TRANS_II] = 0.001f32.ln();
    transition[TRANS_DM] = 0.999f32.ln();
    transition[TRANS_DD] = 0.001f32.ln();
    transition[TRANS_BM] = (1.0 / length as f32).ln();

    Profile::new(
        "hostile",
        &vec![match_row; length],
        &vec![match_row; length],
        &vec![transition; length + 1],
        &vec![b'A'; length],
        true,
    )
    .unwrap()
}

#[test]
fn hopeless_seed_reports_an_empty_cloud() {
    let mut profile = hostile_profile(12);
    let target = named_sequence("tgt", b"CCCCCCCCCCCC");
    let mut worker = Worker::new();

    let outcome = worker
        .search(&mut profile, &target, &seed(1, 12, 1, 12), &SearchParams::default())
        .unwrap();
    assert!(matches!(outcome, SearchOutcome::EmptyCloud));
}

#[test]
fn two_hits_decompose_into_two_domains() {
    let mut profile = favoring_profile(12, b'A', 0.9, true);

    // hits at target positions 5..=15 and 25..=35, background-ish elsewhere
    let mut residues = vec![b'G'; 40];
    for pos in 5..=15usize {
        residues[pos - 1] = b'A';
    }
    for pos in 25..=35usize {
        residues[pos - 1] = b'A';
    }
    let target = named_sequence("tgt", &residues);

    // wide-open pruning so the cloud spans the low-scoring gap
    let params = SearchParams {
        cloud: CloudSearchParams {
            alpha: 500.0,
            beta: 1000.0,
            gamma: 5,
        },
        domain: DomainParams::default(),
        target_count: 1,
    };

    let mut worker = Worker::new();
    let result = complete(
        worker
            .search(&mut profile, &target, &seed(5, 35, 1, 12), &params)
            .unwrap(),
    );

    assert_eq!(
        result.domains.len(),
        2,
        "domains: {:?}",
        result
            .domains
            .iter()
            .map(|d| (d.range.start, d.range.end))
            .collect::<Vec<_>>()
    );

    let overlap = |range: &cloudseqs::align::bounded::DomainRange, lo: usize, hi: usize| {
        let begin = range.start.max(lo);
        let end = range.end.min(hi);
        let covered = end.saturating_sub(begin) + usize::from(end >= begin);
        covered as f32 / (hi - lo + 1) as f32
    };
    assert!(overlap(&result.domains[0].range, 5, 15) >= 0.8);
    assert!(overlap(&result.domains[1].range, 25, 35) >= 0.8);
}

#[test]
fn repeated_searches_through_one_worker_are_identical() {
    let mut profile = favoring_profile(5, b'A', 0.9, true);
    let target = named_sequence("tgt", b"AAAAA");
    let mut worker = Worker::new();
    let params = SearchParams::default();

    let first = complete(
        worker
            .search(&mut profile, &target, &seed(1, 5, 1, 5), &params)
            .unwrap(),
    );
    let second = complete(
        worker
            .search(&mut profile, &target, &seed(1, 5, 1, 5), &params)
            .unwrap(),
    );

    assert_eq!(first.scores.nat_score, second.scores.nat_score);
    assert_eq!(first.scores.bit_score, second.scores.bit_score);
    assert_eq!(first.cell_stats.cloud_cells, second.cell_stats.cloud_cells);
    assert_eq!(first.domains.len(), second.domains.len());
    for (a, b) in first.domains.iter().zip(&second.domains) {
        assert_eq!(a.range, b.range);
        assert_eq!(a.nat_score, b.nat_score);
        assert_eq!(a.alignment.cigar, b.alignment.cigar);
    }
    assert_eq!(first.alignment.cigar, second.alignment.cigar);
}
