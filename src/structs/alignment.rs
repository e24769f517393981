use std::fmt::Write as _;

use crate::structs::trace::{State, Trace};
use crate::structs::{Profile, Sequence};

/// The scores that feed the final bit score and E-value of an alignment.
#[derive(Debug, Clone, Copy)]
pub struct ScoreParams {
    pub forward_score_nats: f32,
    pub null_score_nats: f32,
    pub bias_correction_score_nats: f32,
    pub target_count: usize,
}

impl ScoreParams {
    pub fn new(target_count: usize) -> Self {
        Self {
            forward_score_nats: 0.0,
            null_score_nats: 0.0,
            bias_correction_score_nats: 0.0,
            target_count,
        }
    }
}

/// A decorated optimal-accuracy alignment: coordinates, identity counts,
/// final scores, and two rendered forms.
#[derive(Debug, Clone, Default)]
pub struct Alignment {
    pub profile_name: String,
    pub target_name: String,
    /// First and last aligned target positions (1-based, inclusive).
    pub target_start: usize,
    pub target_end: usize,
    /// First and last aligned profile positions (1-based, inclusive).
    pub profile_start: usize,
    pub profile_end: usize,
    /// Number of core-model steps between the begin and end states.
    pub length: usize,
    pub num_matches: usize,
    pub num_mismatches: usize,
    pub num_gaps: usize,
    pub percent_identity: f32,
    pub score_nats: f32,
    pub score_bits: f32,
    pub pvalue: f64,
    pub evalue: f64,
    /// Compact single-line form, e.g. `4M1I7M2D`.
    pub cigar: String,
    /// Consensus line of the three-line rendering.
    pub profile_string: String,
    /// Centre line: the residue where target and consensus agree.
    pub middle_string: String,
    /// Target line of the three-line rendering.
    pub target_string: String,
}

impl Alignment {
    /// Decorate a traceback. The trace must be in start-to-end order; the
    /// longest begin-to-end span is the one reported.
    pub fn from_trace(
        trace: &Trace,
        profile: &Profile,
        target: &Sequence,
        params: &ScoreParams,
    ) -> Self {
        let mut alignment = Alignment {
            profile_name: profile.name.clone(),
            target_name: target.name.clone(),
            ..Default::default()
        };

        alignment.score_nats = params.forward_score_nats;
        alignment.score_bits = (params.forward_score_nats
            - params.null_score_nats
            - params.bias_correction_score_nats)
            / std::f32::consts::LN_2;
        let dist = &profile.forward_dist;
        alignment.pvalue = f64::min(
            (-dist.lambda as f64 * (alignment.score_bits - dist.mu) as f64).exp(),
            1.0,
        );
        alignment.evalue = alignment.pvalue * params.target_count as f64;

        let Some((span_start, span_end)) = longest_span(trace) else {
            return alignment;
        };
        let core = &trace.steps[span_start + 1..span_end];

        for step in core {
            match step.state {
                State::M => {
                    let consensus = profile.consensus[step.profile_idx];
                    let residue = target.bytes[step.target_idx];
                    if consensus == residue {
                        alignment.num_matches += 1;
                    } else {
                        alignment.num_mismatches += 1;
                    }
                    alignment.profile_string.push(consensus as char);
                    alignment.middle_string.push(if consensus == residue {
                        residue as char
                    } else {
                        ' '
                    });
                    alignment.target_string.push(residue as char);
                }
                State::I => {
                    alignment.num_gaps += 1;
                    alignment.profile_string.push('.');
                    alignment.middle_string.push(' ');
                    alignment
                        .target_string
                        .push(target.bytes[step.target_idx].to_ascii_lowercase() as char);
                }
                State::D => {
                    alignment.num_gaps += 1;
                    alignment
                        .profile_string
                        .push(profile.consensus[step.profile_idx] as char);
                    alignment.middle_string.push(' ');
                    alignment.target_string.push('-');
                }
                _ => {}
            }
        }

        alignment.length = core.len();
        if alignment.length > 0 {
            alignment.percent_identity = alignment.num_matches as f32 / alignment.length as f32;
        }

        if let Some(first) = core.iter().find(|s| s.state == State::M) {
            alignment.target_start = first.target_idx;
            alignment.profile_start = first.profile_idx;
        }
        if let Some(last) = core.iter().rev().find(|s| s.state == State::M) {
            alignment.target_end = last.target_idx;
            alignment.profile_end = last.profile_idx;
        }

        alignment.cigar = cigar_of(core.iter().map(|s| s.state));
        alignment
    }

    /// One tab-separated result row.
    pub fn tab_string(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.1}\t{:.1}\t{:.2e}\t{:.2e}\t{:.3}",
            self.target_name,
            self.profile_name,
            self.target_start,
            self.target_end,
            self.profile_start,
            self.profile_end,
            self.score_nats,
            self.score_bits,
            self.pvalue,
            self.evalue,
            self.percent_identity,
        )
    }

    /// The three-line human-readable rendering.
    pub fn pretty_string(&self) -> String {
        let width = self.profile_name.len().max(self.target_name.len());
        format!(
            "{:>width$} {}\n{:>width$} {}\n{:>width$} {}\n",
            self.profile_name,
            self.profile_string,
            "",
            self.middle_string,
            self.target_name,
            self.target_string,
        )
    }
}

/// The begin/end index pair of the longest `B .. E` span in the trace.
fn longest_span(trace: &Trace) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut open: Option<usize> = None;
    for (idx, step) in trace.steps.iter().enumerate() {
        match step.state {
            State::B => open = Some(idx),
            State::E => {
                if let Some(begin) = open.take() {
                    let longer = match best {
                        Some((b, e)) => idx - begin > e - b,
                        None => true,
                    };
                    if longer {
                        best = Some((begin, idx));
                    }
                }
            }
            _ => {}
        }
    }
    best
}

fn cigar_of(states: impl Iterator<Item = State>) -> String {
    let mut cigar = String::new();
    let mut run: Option<(State, usize)> = None;
    for state in states.filter(|s| s.is_core()) {
        match run {
            Some((current, count)) if current == state => run = Some((current, count + 1)),
            Some((current, count)) => {
                let _ = write!(cigar, "{count}{current}");
                run = Some((state, 1));
            }
            None => run = Some((state, 1)),
        }
    }
    if let Some((current, count)) = run {
        let _ = write!(cigar, "{count}{current}");
    }
    cigar
}
