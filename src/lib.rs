//! Facility location models formulated as mixed-integer linear programs.
//!
//! Each model is built either from a client × facility cost matrix or from
//! a pair of geometry layers, then solved through a [`Solver`] (HiGHS by
//! default):
//!
//! ```no_run
//! use ndarray::array;
//! use spopt_locate::{HighsSolver, LocateSolver, BaseOutput, Lscp};
//!
//! let cost = array![[1.0, 9.0], [8.0, 2.0]];
//! let mut lscp = Lscp::from_cost_matrix(&cost, 5.0, None, Lscp::DEFAULT_NAME)?;
//! lscp.solve(&HighsSolver::new(), true)?;
//! println!("{:?}", lscp.fac2cli()?);
//! # Ok::<(), spopt_locate::LocateError>(())
//! ```

pub mod distance;
pub mod error;
pub mod layer;
pub mod locate;

pub use distance::DistanceMetric;
pub use error::{LocateError, LocateResult};
pub use layer::GeoFrame;
pub use locate::{
    BaseOutput, HighsSolver, KNearestPMedian, LocateSolver, Lscp, Lscpb, Mclp, PCenter,
    PDispersion, PMedian, SolveStatus, Solver,
};
