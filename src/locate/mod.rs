//! Facility location models.

pub mod base;
pub mod builder;
pub mod coverage;
pub mod p_center;
pub mod p_dispersion;
pub mod p_median;
pub mod problem;
pub mod solver;

pub use base::{BaseOutput, LocateSolver};
pub use coverage::{Lscp, Lscpb, Mclp};
pub use p_center::PCenter;
pub use p_dispersion::PDispersion;
pub use p_median::{KNearestPMedian, PMedian};
pub use problem::{MilpProblem, Sense, VarId, VarKind};
pub use solver::{HighsSolver, SolveStatus, Solution, Solver};
