use crate::align::bounded::structs::{DomainParams, DpMatrixSpecial};
use crate::structs::profile::{
    SPECIAL_B, SPECIAL_C, SPECIAL_E, SPECIAL_J, SPECIAL_LOOP, SPECIAL_N,
};
use crate::structs::Profile;

/// An inclusive query-row span believed to contain one domain.
///
/// A region that the occupancy scan cannot split may still contain more
/// than one domain; such envelopes are reported whole, not subdivided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainRange {
    pub start: usize,
    pub end: usize,
}

/// Reusable buffers for the domain definer: per-position core-model
/// occupancy and the cumulative begin/end posterior mass.
#[derive(Debug, Clone, Default)]
pub struct DomainDef {
    m_occ: Vec<f32>,
    b_tot: Vec<f32>,
    e_tot: Vec<f32>,
    pub ranges: Vec<DomainRange>,
}

impl DomainDef {
    /// Scan the special-state Forward/Backward values for spans of the
    /// target that are probably inside the core model.
    ///
    /// A region opens when the occupancy `m_occ` clears `rt1` and closes at
    /// the first position where the occupancy, net of the end-state mass
    /// just spent, falls under `rt2`. A region still open at the end of the
    /// target is closed there.
    pub fn decode(
        &mut self,
        profile: &Profile,
        target_length: usize,
        forward_specials: &DpMatrixSpecial,
        backward_specials: &DpMatrixSpecial,
        overall_score: f32,
        params: &DomainParams,
    ) {
        self.m_occ.clear();
        self.b_tot.clear();
        self.e_tot.clear();
        self.ranges.clear();
        self.m_occ.resize(target_length + 1, 0.0);
        self.b_tot.resize(target_length + 1, 0.0);
        self.e_tot.resize(target_length + 1, 0.0);

        let n_loop = profile.special_transition(SPECIAL_N, SPECIAL_LOOP);
        let j_loop = profile.special_transition(SPECIAL_J, SPECIAL_LOOP);
        let c_loop = profile.special_transition(SPECIAL_C, SPECIAL_LOOP);

        for row in 1..=target_length {
            let b_mass = (forward_specials.get(SPECIAL_B, row - 1)
                + backward_specials.get(SPECIAL_B, row - 1)
                - overall_score)
                .exp();
            self.b_tot[row] = self.b_tot[row - 1] + b_mass;

            let e_mass = (forward_specials.get(SPECIAL_E, row)
                + backward_specials.get(SPECIAL_E, row)
                - overall_score)
                .exp();
            self.e_tot[row] = self.e_tot[row - 1] + e_mass;

            let n_mass = (forward_specials.get(SPECIAL_N, row - 1)
                + backward_specials.get(SPECIAL_N, row)
                + n_loop
                - overall_score)
                .exp();
            let j_mass = (forward_specials.get(SPECIAL_J, row - 1)
                + backward_specials.get(SPECIAL_J, row)
                + j_loop
                - overall_score)
                .exp();
            let c_mass = (forward_specials.get(SPECIAL_C, row - 1)
                + backward_specials.get(SPECIAL_C, row)
                + c_loop
                - overall_score)
                .exp();

            self.m_occ[row] = 1.0 - (n_mass + j_mass + c_mass);
        }

        let mut in_domain = false;
        let mut domain_start = 0;
        for row in 1..=target_length {
            let occupancy = self.m_occ[row];
            if !in_domain {
                if occupancy >= params.rt1 {
                    in_domain = true;
                    domain_start = row;
                }
            } else {
                let end_spent = self.e_tot[row] - self.e_tot[row - 1];
                if occupancy - end_spent < params.rt2 {
                    self.ranges.push(DomainRange {
                        start: domain_start,
                        end: row,
                    });
                    in_domain = false;
                }
            }
        }
        if in_domain {
            self.ranges.push(DomainRange {
                start: domain_start,
                end: target_length,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::amino::AMINO_ALPHABET_SIZE;
    use crate::structs::profile::{NUM_TRANSITIONS, SPECIAL_MOVE};

    fn test_profile() -> Profile {
        let emission = [(1.0f32 / AMINO_ALPHABET_SIZE as f32).ln(); AMINO_ALPHABET_SIZE];
        let transition = [0.25f32.ln(); NUM_TRANSITIONS];
        let mut profile =
            Profile::new("prf", &[emission; 2], &[emission; 2], &[transition; 3], b"AA", true)
                .unwrap();
        profile.configure_for_target_length(10);
        profile
    }

    /// Hand-build special matrices whose occupancy is ~1 on the given rows
    /// and ~0 elsewhere.
    fn specials_with_occupancy(
        target_length: usize,
        occupied: &[(usize, usize)],
    ) -> (DpMatrixSpecial, DpMatrixSpecial, f32) {
        let overall = 0.0f32;
        let mut fwd = DpMatrixSpecial::new(target_length);
        let mut bck = DpMatrixSpecial::new(target_length);
        let in_any = |row: usize| occupied.iter().any(|&(s, e)| s <= row && row <= e);

        for row in 0..=target_length {
            for state in [SPECIAL_N, SPECIAL_J, SPECIAL_C] {
                // occupied rows get negligible flanking-state mass
                let mass: f32 = if in_any(row) || in_any(row + 1) {
                    1e-6
                } else {
                    1.0
                };
                fwd.set(state, row, (mass / 3.0f32).sqrt().ln());
                bck.set(state, row, (mass / 3.0f32).sqrt().ln());
            }
            // end mass released on the last row of each occupied span
            let e_mass: f32 = if occupied.iter().any(|&(_, e)| e == row) {
                0.9
            } else {
                1e-9
            };
            fwd.set(SPECIAL_E, row, e_mass.sqrt().ln());
            bck.set(SPECIAL_E, row, e_mass.sqrt().ln());
            fwd.set(SPECIAL_B, row, (1e-9f32).ln());
            bck.set(SPECIAL_B, row, (1e-9f32).ln());
        }
        (fwd, bck, overall)
    }

    #[test]
    fn finds_two_separated_regions() {
        let mut profile = test_profile();
        // make the loop transitions nearly free so the hand-built masses
        // dominate the scan
        for state in [SPECIAL_N, SPECIAL_J, SPECIAL_C] {
            profile.special_transitions[state][SPECIAL_LOOP] = 0.0;
            profile.special_transitions[state][SPECIAL_MOVE] = 0.0;
        }

        let (fwd, bck, overall) = specials_with_occupancy(30, &[(5, 10), (20, 25)]);
        let mut def = DomainDef::default();
        def.decode(&profile, 30, &fwd, &bck, overall, &DomainParams::default());

        assert_eq!(def.ranges.len(), 2, "ranges: {:?}", def.ranges);
        let first = def.ranges[0];
        let second = def.ranges[1];
        assert!(first.start >= 4 && first.start <= 6);
        assert!(first.end >= 10 && first.end <= 12);
        assert!(second.start >= 19 && second.start <= 21);
        assert!(second.end >= 25 && second.end <= 27);
    }

    #[test]
    fn open_region_is_closed_at_target_end() {
        let profile = test_profile();
        let (fwd, bck, overall) = specials_with_occupancy(10, &[(6, 10)]);
        let mut def = DomainDef::default();
        def.decode(&profile, 10, &fwd, &bck, overall, &DomainParams::default());
        assert_eq!(def.ranges.len(), 1);
        assert_eq!(def.ranges[0].end, 10);
    }
}
