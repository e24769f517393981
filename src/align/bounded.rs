pub mod backward;
pub mod cloud_search;
pub mod domains;
pub mod forward;
pub mod null;
pub mod optimal_accuracy;
pub mod posterior;
pub mod structs;
pub mod traceback;

pub use backward::{backward_bounded, backward_bounded_in};
pub use cloud_search::{cloud_search_backward, cloud_search_forward, CloudSweepStats};
pub use domains::{DomainDef, DomainRange};
pub use forward::{forward_bounded, forward_bounded_in};
pub use null::{null1_score, null2_score};
pub use optimal_accuracy::optimal_accuracy_bounded;
pub use posterior::posterior_bounded;
pub use traceback::traceback_bounded;
