//! Error types for model construction and solving.

use thiserror::Error;

use crate::locate::solver::SolveStatus;

/// Errors raised while building, solving, or reading a location model.
#[derive(Error, Debug)]
pub enum LocateError {
    /// Demand and facility layers use different coordinate reference systems
    #[error("Geodataframes crs are different: gdf_demand-{demand:?}, gdf_fac-{facility:?}")]
    CrsMismatch {
        demand: Option<String>,
        facility: Option<String>,
    },

    /// A layer that must carry a CRS does not
    #[error("GeoDataFrame {layer} does not have a valid CRS")]
    MissingCrs { layer: &'static str },

    #[error("column `{0}` not found")]
    MissingColumn(String),

    /// Attribute or geometry column length disagrees with the layer length
    #[error("column `{column}` has {got} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("geometry at row {0} is empty and has no centroid")]
    EmptyGeometry(usize),

    #[error("unknown distance metric `{0}`")]
    UnknownMetric(String),

    #[error("invalid cost matrix: {0}")]
    InvalidCostMatrix(String),

    /// A weight or capacity entry is negative or not finite
    #[error("{what}[{index}] = {value} is not a finite non-negative number")]
    InvalidValue {
        what: &'static str,
        index: usize,
        value: f64,
    },

    #[error("{what} has length {got}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("predefined facility index {index} is out of range for {n_facilities} facilities")]
    PredefinedOutOfRange { index: usize, n_facilities: usize },

    /// A k-nearest candidate count is zero or exceeds the number of facilities
    #[error(
        "The value of k should be no more than the number of total facilities ({n_facilities}) \
         and at least 1, got {k} for client {client}"
    )]
    InvalidK {
        client: usize,
        k: usize,
        n_facilities: usize,
    },

    /// The instance is provably infeasible before any solver time is spent
    #[error("{0}")]
    Specification(String),

    #[error("model `{0}` requests zero facilities")]
    NoFacilitiesRequested(String),

    /// The solver returned something other than an optimal solution
    #[error("model `{name}` is {status}")]
    Status { name: String, status: SolveStatus },

    #[error("model `{0}` has not been solved")]
    NotSolved(String),

    #[error("results for model `{0}` were not extracted; solve with results enabled")]
    ResultsUnavailable(String),

    #[error("solver failure: {0}")]
    Solver(String),
}

/// Result type for location model operations.
pub type LocateResult<T> = Result<T, LocateError>;
