use thiserror::Error;

/// Everything that can go wrong inside a single search.
///
/// An empty cloud is not represented here: pruning away the whole search
/// space is a structured outcome (`search::SearchOutcome::EmptyCloud`), not
/// a failure.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Profile or sequence violated a boundary constraint.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Seed anchor out of range or reversed.
    #[error(
        "invalid seed anchor: target {target_start}..{target_end} (length {target_length}), \
         profile {profile_start}..{profile_end} (length {profile_length})"
    )]
    InvalidAnchor {
        target_start: usize,
        target_end: usize,
        target_length: usize,
        profile_start: usize,
        profile_end: usize,
        profile_length: usize,
    },

    /// An internal invariant of the sparse matrix or edgebound structures
    /// was violated. This indicates a bug in cloud search or matrix
    /// construction, not bad input.
    #[error("sparse matrix geometry violated at row {row}, column {col} ({state}): {details}")]
    InvalidGeometry {
        row: usize,
        col: usize,
        state: &'static str,
        details: String,
    },

    /// A computed score became non-finite in the wrong direction.
    #[error("non-finite score at row {row}: {value}")]
    NumericOverflow { row: usize, value: f32 },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
