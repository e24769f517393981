use serde::{Deserialize, Serialize};

/// A coarse alignment produced by the upstream fast filter. Only the anchor
/// coordinates are used: the cloud search grows outward from
/// `(target_start, profile_start)` and `(target_end, profile_end)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    pub target_name: String,
    pub target_start: usize,
    pub target_end: usize,
    pub profile_start: usize,
    pub profile_end: usize,
}
