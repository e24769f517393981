/// Tuning for the cloud-search pruning sweep.
///
/// `alpha` trims cells off each antidiagonal, `beta` terminates a whole
/// sweep, and `gamma` grants the first antidiagonals immunity from
/// trimming.
#[derive(Debug, Clone, Copy)]
pub struct CloudSearchParams {
    /// Per-antidiagonal drop, in nats, below the running maximum at which a
    /// cell is trimmed.
    pub alpha: f32,
    /// Drop, in nats, below the running maximum at which the sweep ends.
    /// Must be at least `alpha`.
    pub beta: f32,
    /// Number of antidiagonals to compute before any trimming.
    pub gamma: usize,
}

impl Default for CloudSearchParams {
    fn default() -> Self {
        Self {
            alpha: 12.0,
            beta: 20.0,
            gamma: 5,
        }
    }
}

/// Thresholds for the domain definer's scan over the per-position
/// probability of being inside the core model.
#[derive(Debug, Clone, Copy)]
pub struct DomainParams {
    /// Occupancy at which a domain region opens.
    pub rt1: f32,
    /// Occupancy (net of the end-state mass just spent) at which it closes.
    pub rt2: f32,
}

impl Default for DomainParams {
    fn default() -> Self {
        Self { rt1: 0.25, rt2: 0.10 }
    }
}
