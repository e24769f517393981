pub mod bound;
pub mod cloud_matrix;
pub mod dp_matrix_sparse;
pub mod dp_matrix_special;
pub mod params;
pub mod seed;

pub use bound::{Bound, BoundOrientation, EdgeBounds};
pub use cloud_matrix::CloudMatrixLinear;
pub use dp_matrix_sparse::DpMatrixSparse;
pub use dp_matrix_special::DpMatrixSpecial;
pub use params::{CloudSearchParams, DomainParams};
pub use seed::Seed;
