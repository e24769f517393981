#![allow(dead_code)]

use cloudseqs::align::bounded::structs::{Bound, BoundOrientation, EdgeBounds, Seed};
use cloudseqs::log_sum::log_sum;
use cloudseqs::structs::amino::{AMINO_ALPHABET_SIZE, AMINO_BACKGROUND_FREQUENCIES};
use cloudseqs::structs::profile::{
    NUM_TRANSITIONS, SPECIAL_C, SPECIAL_E, SPECIAL_J, SPECIAL_LOOP, SPECIAL_MOVE, SPECIAL_N,
    TRANS_BM, TRANS_DD, TRANS_DM, TRANS_II, TRANS_IM, TRANS_MD, TRANS_MI, TRANS_MM,
};
use cloudseqs::structs::{Profile, Sequence};

/// A profile whose match states strongly favour one residue at every
/// position, with inserts emitting the background.
pub fn favoring_profile(length: usize, favored: u8, weight: f32, multihit: bool) -> Profile {
    let favored_idx = cloudseqs::structs::amino::digitize(favored) as usize;
    assert!(favored_idx < AMINO_ALPHABET_SIZE);

    let mut match_row = [((1.0 - weight) / 19.0f32).ln(); AMINO_ALPHABET_SIZE];
    match_row[favored_idx] = weight.ln();

    let mut insert_row = [0.0f32; AMINO_ALPHABET_SIZE];
    for (value, freq) in insert_row.iter_mut().zip(AMINO_BACKGROUND_FREQUENCIES) {
        *value = freq.ln();
    }

    let mut transition = [f32::NEG_INFINITY; NUM_TRANSITIONS];
    transition[TRANS_MM] = 0.6f32.ln();
    transition[TRANS_MI] = 0.2f32.ln();
    transition[TRANS_MD] = 0.2f32.ln();
    transition[TRANS_IM] = 0.5f32.ln();
    transition[TRANS_II] = 0.5f32.ln();
    transition[TRANS_DM] = 0.5f32.ln();
    transition[TRANS_DD] = 0.5f32.ln();
    transition[TRANS_BM] = (1.0 / length as f32).ln();

    Profile::new(
        "test-profile",
        &vec![match_row; length],
        &vec![insert_row; length],
        &vec![transition; length + 1],
        &vec![favored.to_ascii_uppercase(); length],
        multihit,
    )
    .unwrap()
}

pub fn named_sequence(name: &str, residues: &[u8]) -> Sequence {
    let mut sequence = Sequence::from_utf8(residues).unwrap();
    sequence.name = name.to_string();
    sequence
}

pub fn seed(
    target_start: usize,
    target_end: usize,
    profile_start: usize,
    profile_end: usize,
) -> Seed {
    Seed {
        target_name: "test-target".to_string(),
        target_start,
        target_end,
        profile_start,
        profile_end,
    }
}

/// Row-indexed edgebounds covering the entire embedding rectangle.
pub fn full_rectangle_bounds(target_length: usize, profile_length: usize) -> EdgeBounds {
    let mut bounds = EdgeBounds::new(BoundOrientation::Row);
    bounds.reuse(target_length, profile_length, BoundOrientation::Row);
    for row in 0..=target_length {
        bounds.push(Bound::new(row, 0, profile_length + 1));
    }
    bounds.sort();
    bounds.merge();
    bounds.index();
    bounds
}

/// Quadratic-space Forward in log space, mirroring the bounded
/// implementation's boundary conventions: column zero is impossible, the
/// final column's insert state does not exist, and the length model is
/// whatever the profile is currently configured for.
pub fn dense_forward(profile: &Profile, target: &Sequence) -> f32 {
    let q = target.length;
    let t = profile.length;
    let neg_inf = f32::NEG_INFINITY;

    let mut m = vec![vec![neg_inf; t + 1]; q + 1];
    let mut i = vec![vec![neg_inf; t + 1]; q + 1];
    let mut d = vec![vec![neg_inf; t + 1]; q + 1];
    let mut n = vec![neg_inf; q + 1];
    let mut b = vec![neg_inf; q + 1];
    let mut j = vec![neg_inf; q + 1];
    let mut c = vec![neg_inf; q + 1];
    let mut e = vec![neg_inf; q + 1];

    n[0] = 0.0;
    b[0] = profile.special_transition(SPECIAL_N, SPECIAL_MOVE);

    for row in 1..=q {
        let residue = target.digits[row];
        let mut e_acc = neg_inf;

        for col in 1..=t {
            let prv_m = m[row - 1][col - 1] + profile.transition_score(col - 1, TRANS_MM);
            let prv_i = i[row - 1][col - 1] + profile.transition_score(col - 1, TRANS_IM);
            let prv_d = d[row - 1][col - 1] + profile.transition_score(col - 1, TRANS_DM);
            let prv_b = b[row - 1] + profile.transition_score(col - 1, TRANS_BM);
            m[row][col] = profile.match_score(col, residue)
                + log_sum(log_sum(prv_m, prv_i), log_sum(prv_d, prv_b));

            i[row][col] = if col == t {
                neg_inf
            } else {
                let prv_m = m[row - 1][col] + profile.transition_score(col, TRANS_MI);
                let prv_i = i[row - 1][col] + profile.transition_score(col, TRANS_II);
                profile.insert_score(col, residue) + log_sum(prv_m, prv_i)
            };

            let prv_m = m[row][col - 1] + profile.transition_score(col - 1, TRANS_MD);
            let prv_d = d[row][col - 1] + profile.transition_score(col - 1, TRANS_DD);
            d[row][col] = log_sum(prv_m, prv_d);

            e_acc = log_sum(e_acc, log_sum(m[row][col], d[row][col]));
        }

        e[row] = e_acc;
        j[row] = log_sum(
            j[row - 1] + profile.special_transition(SPECIAL_J, SPECIAL_LOOP),
            e[row] + profile.special_transition(SPECIAL_E, SPECIAL_LOOP),
        );
        c[row] = log_sum(
            c[row - 1] + profile.special_transition(SPECIAL_C, SPECIAL_LOOP),
            e[row] + profile.special_transition(SPECIAL_E, SPECIAL_MOVE),
        );
        n[row] = n[row - 1] + profile.special_transition(SPECIAL_N, SPECIAL_LOOP);
        b[row] = log_sum(
            n[row] + profile.special_transition(SPECIAL_N, SPECIAL_MOVE),
            j[row] + profile.special_transition(SPECIAL_J, SPECIAL_MOVE),
        );
    }

    c[q] + profile.special_transition(SPECIAL_C, SPECIAL_MOVE)
}
