use crate::align::bounded::structs::dp_matrix_sparse::{INSERT, MATCH};
use crate::align::bounded::structs::DpMatrixSparse;
use crate::structs::amino::AMINO_ALPHABET_SIZE;
use crate::structs::{Profile, Sequence};

/// Prior weight on the biased-composition hypothesis.
const NULL2_OMEGA: f32 = 1.0 / 256.0;

/// Score of the target under the geometric null model, in nats.
pub fn null1_score(target_length: usize) -> f32 {
    let p1 = target_length as f32 / (target_length as f32 + 1.0);
    target_length as f32 * p1.ln() + (1.0 - p1).ln()
}

/// Composition-bias correction, in nats, for the rows `row_range` of a
/// normalised posterior matrix.
///
/// The posterior-weighted occupancy of each profile position gives an
/// expected emission distribution; residues the biased model prefers over
/// the background accrue positive score, tempered by the omega prior.
pub fn null2_score(
    posterior_matrix: &DpMatrixSparse,
    profile: &Profile,
    target: &Sequence,
    row_range: (usize, usize),
) -> f32 {
    let (row_lo, row_hi) = row_range;
    let profile_length = profile.length;

    let mut match_occupancy = vec![0.0f32; profile_length + 1];
    let mut insert_occupancy = vec![0.0f32; profile_length + 1];

    for row in row_lo + 1..=row_hi {
        for bound_idx in posterior_matrix.edg_inner.id_range(row) {
            let bound = posterior_matrix.inner_bound(bound_idx);
            let col_hi = bound.rb.min(profile_length + 1);
            let block = posterior_matrix.block_cur(bound_idx);
            for col in bound.lb..col_hi {
                let offset = (col - bound.lb) as isize;
                match_occupancy[col] += posterior_matrix.get(block, offset, MATCH);
                insert_occupancy[col] += posterior_matrix.get(block, offset, INSERT);
            }
        }
    }

    let total_occupancy: f32 =
        match_occupancy.iter().sum::<f32>() + insert_occupancy.iter().sum::<f32>();
    if total_occupancy <= 0.0 {
        return 0.0;
    }

    // posterior-weighted mean odds of each residue against the background
    let mut expected_odds = [0.0f32; AMINO_ALPHABET_SIZE];
    for col in 1..=profile_length {
        if match_occupancy[col] == 0.0 && insert_occupancy[col] == 0.0 {
            continue;
        }
        for (residue, odds) in expected_odds.iter_mut().enumerate() {
            *odds += match_occupancy[col] * profile.match_score(col, residue as u8).exp()
                + insert_occupancy[col] * profile.insert_score(col, residue as u8).exp();
        }
    }
    for odds in expected_odds.iter_mut() {
        *odds /= total_occupancy;
    }

    let mut score = 0.0f32;
    for row in row_lo + 1..=row_hi {
        let residue = target.digits[row] as usize;
        let ratio = if residue < AMINO_ALPHABET_SIZE {
            expected_odds[residue]
        } else {
            1.0
        };
        score += ((1.0 - NULL2_OMEGA) + NULL2_OMEGA * ratio).ln();
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null1_matches_geometric_model() {
        let score = null1_score(100);
        let p1 = 100.0f32 / 101.0;
        assert!((score - (100.0 * p1.ln() + (1.0 - p1).ln())).abs() < 1e-6);
        assert!(score < 0.0);
    }

    #[test]
    fn null1_grows_with_length() {
        assert!(null1_score(200) < null1_score(100));
    }
}
