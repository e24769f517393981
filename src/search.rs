use crate::align::bounded::structs::{
    CloudMatrixLinear, CloudSearchParams, DomainParams, DpMatrixSparse, DpMatrixSpecial,
    EdgeBounds, Seed,
};
use crate::align::bounded::{
    backward_bounded, cloud_search_backward, cloud_search_forward, forward_bounded, null1_score,
    null2_score, optimal_accuracy_bounded, posterior_bounded, traceback_bounded, DomainDef,
    DomainRange,
};
use crate::error::SearchError;
use crate::structs::alignment::ScoreParams;
use crate::structs::{Alignment, Profile, Sequence, Trace};

/// Everything tunable about one search.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    pub cloud: CloudSearchParams,
    pub domain: DomainParams,
    /// Number of targets in the database, for E-value scaling.
    pub target_count: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            cloud: CloudSearchParams::default(),
            domain: DomainParams::default(),
            target_count: 1,
        }
    }
}

/// The sequence-level scores of a completed search.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalScores {
    pub nat_score: f32,
    pub bit_score: f32,
    pub pvalue: f64,
    pub evalue: f64,
}

/// How much of the full matrix the cloud actually touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellStats {
    pub cloud_cells: usize,
    pub total_cells: usize,
}

impl CellStats {
    pub fn percent_cells(&self) -> f32 {
        if self.total_cells == 0 {
            0.0
        } else {
            self.cloud_cells as f32 / self.total_cells as f32
        }
    }
}

/// One domain of a completed search, rescored and aligned on its own.
#[derive(Debug, Clone)]
pub struct Domain {
    pub range: DomainRange,
    pub nat_score: f32,
    pub bias_score: f32,
    pub bit_score: f32,
    pub pvalue: f64,
    pub alignment: Alignment,
}

/// A completed search: sequence scores, the domain decomposition, the best
/// domain's alignment, and the cloud itself for introspection.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub scores: FinalScores,
    pub domains: Vec<Domain>,
    pub alignment: Alignment,
    pub edge_bounds: EdgeBounds,
    pub cell_stats: CellStats,
}

/// Either a full result, or the structured report that pruning closed the
/// cloud before it left the warm-up; the caller falls back to the fast
/// filter's own score for the latter.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Complete(Box<SearchResult>),
    EmptyCloud,
}

/// One worker's private, reusable buffers. Searches run through the same
/// worker reuse every allocation whose capacity already fits.
#[derive(Debug, Default)]
pub struct Worker {
    cloud_matrix: CloudMatrixLinear,
    forward_bounds: EdgeBounds,
    backward_bounds: EdgeBounds,
    row_bounds: EdgeBounds,
    forward_matrix: DpMatrixSparse,
    forward_specials: DpMatrixSpecial,
    backward_matrix: DpMatrixSparse,
    backward_specials: DpMatrixSpecial,
    posterior_matrix: DpMatrixSparse,
    posterior_specials: DpMatrixSpecial,
    optimal_matrix: DpMatrixSparse,
    optimal_specials: DpMatrixSpecial,
    domain_def: DomainDef,
    trace: Trace,
}

impl Worker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the full bounded pipeline for one (profile, target, seed)
    /// triple. The profile's length model is reconfigured for the target,
    /// so workers sharing profiles must hand each worker its own clone.
    pub fn search(
        &mut self,
        profile: &mut Profile,
        target: &Sequence,
        seed: &Seed,
        params: &SearchParams,
    ) -> Result<SearchOutcome, SearchError> {
        validate(profile, target, params)?;
        profile.configure_for_target_length(target.length);

        let target_length = target.length;
        let profile_length = profile.length;

        let forward_stats = cloud_search_forward(
            profile,
            target,
            seed,
            &mut self.cloud_matrix,
            &params.cloud,
            &mut self.forward_bounds,
        )?;
        let backward_stats = cloud_search_backward(
            profile,
            target,
            seed,
            &mut self.cloud_matrix,
            &params.cloud,
            &mut self.backward_bounds,
        )?;

        if forward_stats.died_in_warm_up && backward_stats.died_in_warm_up {
            return Ok(SearchOutcome::EmptyCloud);
        }

        self.forward_bounds.union_with(&self.backward_bounds);
        self.forward_bounds.reorient_into(&mut self.row_bounds);

        let cell_stats = CellStats {
            cloud_cells: self.row_bounds.count_cells(),
            total_cells: (target_length + 1) * (profile_length + 1),
        };

        self.forward_matrix
            .reuse(target_length, profile_length, &self.row_bounds)?;
        self.backward_matrix
            .reuse(target_length, profile_length, &self.row_bounds)?;
        self.posterior_matrix
            .reuse(target_length, profile_length, &self.row_bounds)?;
        self.optimal_matrix
            .reuse(target_length, profile_length, &self.row_bounds)?;

        let forward_score = forward_bounded(
            profile,
            target,
            &mut self.forward_matrix,
            &mut self.forward_specials,
            None,
        )?;
        backward_bounded(
            profile,
            target,
            &mut self.backward_matrix,
            &mut self.backward_specials,
            None,
        )?;

        posterior_bounded(
            profile,
            &self.forward_matrix,
            &self.forward_specials,
            &self.backward_matrix,
            &self.backward_specials,
            &mut self.posterior_matrix,
            &mut self.posterior_specials,
            forward_score,
            None,
        );

        let null_score = null1_score(target_length);
        let bias_score = null2_score(
            &self.posterior_matrix,
            profile,
            target,
            (0, target_length),
        );
        let scores = final_scores(
            profile,
            forward_score,
            null_score,
            bias_score,
            params.target_count,
        );

        self.domain_def.decode(
            profile,
            target_length,
            &self.forward_specials,
            &self.backward_specials,
            forward_score,
            &params.domain,
        );
        let mut ranges = std::mem::take(&mut self.domain_def.ranges);
        if ranges.is_empty() {
            ranges.push(DomainRange {
                start: 1,
                end: target_length,
            });
        }

        let mut domains = Vec::with_capacity(ranges.len());
        for range in &ranges {
            domains.push(self.rescore_domain(
                profile,
                target,
                *range,
                null_score,
                params.target_count,
            )?);
        }
        self.domain_def.ranges = ranges;

        let best = domains
            .iter()
            .max_by(|a, b| a.bit_score.total_cmp(&b.bit_score))
            .expect("at least one domain");
        let alignment = best.alignment.clone();

        Ok(SearchOutcome::Complete(Box::new(SearchResult {
            scores,
            domains,
            alignment,
            edge_bounds: self.row_bounds.clone(),
            cell_stats,
        })))
    }

    /// Rerun the bounded stages restricted to one envelope and align it.
    fn rescore_domain(
        &mut self,
        profile: &Profile,
        target: &Sequence,
        range: DomainRange,
        null_score: f32,
        target_count: usize,
    ) -> Result<Domain, SearchError> {
        let row_range = Some((range.start - 1, range.end));

        let nat_score = forward_bounded(
            profile,
            target,
            &mut self.forward_matrix,
            &mut self.forward_specials,
            row_range,
        )?;
        backward_bounded(
            profile,
            target,
            &mut self.backward_matrix,
            &mut self.backward_specials,
            row_range,
        )?;
        posterior_bounded(
            profile,
            &self.forward_matrix,
            &self.forward_specials,
            &self.backward_matrix,
            &self.backward_specials,
            &mut self.posterior_matrix,
            &mut self.posterior_specials,
            nat_score,
            row_range,
        );
        let bias_score = null2_score(
            &self.posterior_matrix,
            profile,
            target,
            (range.start - 1, range.end),
        );

        optimal_accuracy_bounded(
            profile,
            &self.posterior_matrix,
            &self.posterior_specials,
            &mut self.optimal_matrix,
            &mut self.optimal_specials,
            row_range,
        );
        traceback_bounded(
            profile,
            &self.posterior_matrix,
            &self.posterior_specials,
            &self.optimal_matrix,
            &self.optimal_specials,
            &mut self.trace,
            row_range,
        )?;

        let score_params = ScoreParams {
            forward_score_nats: nat_score,
            null_score_nats: null_score,
            bias_correction_score_nats: bias_score,
            target_count,
        };
        let alignment = Alignment::from_trace(&self.trace, profile, target, &score_params);

        Ok(Domain {
            range,
            nat_score,
            bias_score,
            bit_score: alignment.score_bits,
            pvalue: alignment.pvalue,
            alignment,
        })
    }
}

fn validate(
    profile: &Profile,
    target: &Sequence,
    params: &SearchParams,
) -> Result<(), SearchError> {
    if target.length == 0 {
        return Err(SearchError::InvalidInput(
            "target sequence is empty".to_string(),
        ));
    }
    if profile.length == 0 {
        return Err(SearchError::InvalidInput("profile is empty".to_string()));
    }
    if !profile.is_local {
        return Err(SearchError::InvalidInput(
            "glocal-configured profiles are not supported".to_string(),
        ));
    }
    let cloud = &params.cloud;
    if !(cloud.alpha > 0.0 && cloud.beta >= cloud.alpha) {
        return Err(SearchError::InvalidInput(format!(
            "cloud pruning requires 0 < alpha <= beta, got alpha = {}, beta = {}",
            cloud.alpha, cloud.beta
        )));
    }
    let domain = &params.domain;
    if !(domain.rt2 > 0.0 && domain.rt2 <= domain.rt1 && domain.rt1 <= 1.0) {
        return Err(SearchError::InvalidInput(format!(
            "domain thresholds require 0 < rt2 <= rt1 <= 1, got rt1 = {}, rt2 = {}",
            domain.rt1, domain.rt2
        )));
    }
    Ok(())
}

fn final_scores(
    profile: &Profile,
    nat_score: f32,
    null_score: f32,
    bias_score: f32,
    target_count: usize,
) -> FinalScores {
    let bit_score = (nat_score - null_score - bias_score) / std::f32::consts::LN_2;
    let dist = &profile.forward_dist;
    let pvalue = f64::min(
        (-dist.lambda as f64 * (bit_score - dist.mu) as f64).exp(),
        1.0,
    );
    FinalScores {
        nat_score,
        bit_score,
        pvalue,
        evalue: pvalue * target_count as f64,
    }
}
