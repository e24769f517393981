use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::structs::amino::{
    AMINO_ALPHABET_SIZE, AMINO_BACKGROUND_FREQUENCIES, AMINO_UNKNOWN, MAX_ALPHABET_SIZE,
};

/// Core-model transition indices into a profile position's transition row.
pub const TRANS_MM: usize = 0;
pub const TRANS_MI: usize = 1;
pub const TRANS_MD: usize = 2;
pub const TRANS_IM: usize = 3;
pub const TRANS_II: usize = 4;
pub const TRANS_DM: usize = 5;
pub const TRANS_DD: usize = 6;
pub const TRANS_BM: usize = 7;
pub const NUM_TRANSITIONS: usize = 8;

/// Special-state indices for the `(Q+1) x 5` bookkeeping matrix and the
/// profile's special transition table.
pub const SPECIAL_E: usize = 0;
pub const SPECIAL_N: usize = 1;
pub const SPECIAL_J: usize = 2;
pub const SPECIAL_C: usize = 3;
pub const SPECIAL_B: usize = 4;
pub const NUM_SPECIAL_STATES: usize = 5;

pub const SPECIAL_LOOP: usize = 0;
pub const SPECIAL_MOVE: usize = 1;

const EMISSION_SUM_TOLERANCE: f32 = 1e-4;

/// Location and scale of a fitted score distribution, used to turn a bit
/// score into a p-value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DistParams {
    pub mu: f32,
    pub lambda: f32,
}

impl Default for DistParams {
    fn default() -> Self {
        Self {
            mu: 0.0,
            lambda: std::f32::consts::LN_2,
        }
    }
}

/// A profile hidden Markov model over the amino alphabet.
///
/// Transitions are natural-log probabilities. Emissions arrive as log
/// probabilities and are stored as log odds against the background
/// distribution, so a background-neutral residue scores zero. Position 0 of
/// each per-position table is a pad so that profile position `t` lives at
/// index `t`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub accession: String,
    /// Number of match positions.
    pub length: usize,
    /// Consensus residue bytes, 1-based with a pad at index 0.
    pub consensus: Vec<u8>,
    /// Match emissions, `(length + 1) * MAX_ALPHABET_SIZE`, row-major.
    match_scores: Vec<f32>,
    /// Insert emissions, same shape as `match_scores`.
    insert_scores: Vec<f32>,
    /// Core transitions, `(length + 1) * NUM_TRANSITIONS`, row-major.
    transitions: Vec<f32>,
    /// `{E, N, J, C, B} x {LOOP, MOVE}` transitions; N/C/J pairs are set by
    /// `configure_for_target_length`.
    pub special_transitions: [[f32; 2]; NUM_SPECIAL_STATES],
    /// Mean residue composition of the model.
    pub mean_composition: Vec<f32>,
    pub is_local: bool,
    pub is_multihit: bool,
    /// The target length the length model is currently configured for.
    pub target_length: usize,
    pub msv_dist: DistParams,
    pub viterbi_dist: DistParams,
    pub forward_dist: DistParams,
}

impl Profile {
    /// Build a profile from per-position log-probability tables.
    ///
    /// `match_emissions` and `insert_emissions` carry one row of 20 canonical
    /// log probabilities per match position (1..=length); `transitions`
    /// carries `length + 1` rows of 8 (position 0 holds the entry
    /// transitions read as `t - 1` values by the recurrences).
    pub fn new(
        name: impl Into<String>,
        match_emissions: &[[f32; AMINO_ALPHABET_SIZE]],
        insert_emissions: &[[f32; AMINO_ALPHABET_SIZE]],
        transitions: &[[f32; NUM_TRANSITIONS]],
        consensus: &[u8],
        is_multihit: bool,
    ) -> Result<Self, SearchError> {
        let length = match_emissions.len();
        if length == 0 {
            return Err(SearchError::InvalidInput(
                "profile must have at least one match position".to_string(),
            ));
        }
        if insert_emissions.len() != length {
            return Err(SearchError::InvalidInput(format!(
                "insert emission rows ({}) do not match profile length ({length})",
                insert_emissions.len()
            )));
        }
        if transitions.len() != length + 1 {
            return Err(SearchError::InvalidInput(format!(
                "transition rows ({}) must be profile length + 1 ({})",
                transitions.len(),
                length + 1
            )));
        }
        if consensus.len() != length {
            return Err(SearchError::InvalidInput(format!(
                "consensus length ({}) does not match profile length ({length})",
                consensus.len()
            )));
        }

        let mut match_scores = vec![f32::NEG_INFINITY; (length + 1) * MAX_ALPHABET_SIZE];
        let mut insert_scores = vec![f32::NEG_INFINITY; (length + 1) * MAX_ALPHABET_SIZE];
        let mut flat_transitions = vec![f32::NEG_INFINITY; (length + 1) * NUM_TRANSITIONS];

        for (row, (match_row, insert_row)) in
            match_emissions.iter().zip(insert_emissions).enumerate()
        {
            let t = row + 1;
            check_emission_row(t, match_row)?;
            check_emission_row(t, insert_row)?;
            let offset = t * MAX_ALPHABET_SIZE;
            for residue in 0..AMINO_ALPHABET_SIZE {
                let background = AMINO_BACKGROUND_FREQUENCIES[residue].ln();
                match_scores[offset + residue] = match_row[residue] - background;
                insert_scores[offset + residue] = insert_row[residue] - background;
            }
            // the unknown residue scores as its expected odds under the
            // background; gap / non-residue / missing stay impossible
            match_scores[offset + AMINO_UNKNOWN as usize] = expected_odds(match_row);
            insert_scores[offset + AMINO_UNKNOWN as usize] = expected_odds(insert_row);
        }

        for (t, row) in transitions.iter().enumerate() {
            let offset = t * NUM_TRANSITIONS;
            flat_transitions[offset..offset + NUM_TRANSITIONS].copy_from_slice(row);
        }

        let mut consensus_padded = Vec::with_capacity(length + 1);
        consensus_padded.push(b'-');
        consensus_padded.extend(consensus.iter().map(|c| c.to_ascii_uppercase()));

        let mut special_transitions = [[f32::NEG_INFINITY; 2]; NUM_SPECIAL_STATES];
        special_transitions[SPECIAL_E] = if is_multihit {
            [0.5f32.ln(), 0.5f32.ln()]
        } else {
            [f32::NEG_INFINITY, 0.0]
        };

        let mut profile = Self {
            name: name.into(),
            accession: String::new(),
            length,
            consensus: consensus_padded,
            match_scores,
            insert_scores,
            transitions: flat_transitions,
            special_transitions,
            mean_composition: AMINO_BACKGROUND_FREQUENCIES.to_vec(),
            is_local: true,
            is_multihit,
            target_length: 0,
            msv_dist: DistParams::default(),
            viterbi_dist: DistParams::default(),
            forward_dist: DistParams::default(),
        };
        profile.configure_for_target_length(1);
        Ok(profile)
    }

    /// Set the geometric length model for a target of `length` residues.
    ///
    /// The N, C and J states share one loop/move pair derived from the
    /// expected number of aligned passes through the model.
    pub fn configure_for_target_length(&mut self, length: usize) {
        let num_hits: f32 = if self.is_multihit { 1.0 } else { 0.0 };
        let move_prob = (2.0 + num_hits) / (length as f32 + 2.0 + num_hits);
        let loop_score = (1.0 - move_prob).ln();
        let move_score = move_prob.ln();

        for state in [SPECIAL_N, SPECIAL_C, SPECIAL_J] {
            self.special_transitions[state] = [loop_score, move_score];
        }
        self.target_length = length;
    }

    #[inline]
    pub fn match_score(&self, profile_idx: usize, residue: u8) -> f32 {
        self.match_scores[profile_idx * MAX_ALPHABET_SIZE + residue as usize]
    }

    #[inline]
    pub fn insert_score(&self, profile_idx: usize, residue: u8) -> f32 {
        self.insert_scores[profile_idx * MAX_ALPHABET_SIZE + residue as usize]
    }

    #[inline]
    pub fn transition_score(&self, profile_idx: usize, transition: usize) -> f32 {
        self.transitions[profile_idx * NUM_TRANSITIONS + transition]
    }

    #[inline]
    pub fn special_transition(&self, state: usize, transition: usize) -> f32 {
        self.special_transitions[state][transition]
    }
}

fn check_emission_row(t: usize, row: &[f32; AMINO_ALPHABET_SIZE]) -> Result<(), SearchError> {
    let total: f32 = row.iter().map(|score| score.exp()).sum();
    if (total - 1.0).abs() > EMISSION_SUM_TOLERANCE {
        return Err(SearchError::InvalidInput(format!(
            "emission row at position {t} sums to {total} in normal space"
        )));
    }
    Ok(())
}

fn expected_odds(row: &[f32; AMINO_ALPHABET_SIZE]) -> f32 {
    // the background-weighted mean of the odds ratios collapses to the
    // total emission probability, which is ~1 for a valid row
    row.iter().map(|score| score.exp()).sum::<f32>().ln()
}
