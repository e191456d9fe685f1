//! Crew pairing for a single day: role partition, restriction filtering and
//! maximum-cardinality matching.

pub mod constraints;
pub mod matching;

pub use constraints::{build_allowed_pairs, PairingProblem};
pub use matching::max_bipartite_pairings;
