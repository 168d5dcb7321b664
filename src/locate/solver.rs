//! HiGHS MIP solver interface
//!
//! Models never talk to a solver library directly. They build a
//! [`MilpProblem`] and pass it to a [`Solver`], which reports a
//! [`SolveStatus`] plus one value per variable. [`HighsSolver`] is the
//! provided implementation.

use std::fmt;

use highs::{Col, HighsModelStatus, RowProblem, Sense as HighsSense};
use log::{debug, info};

use crate::error::LocateResult;
use crate::locate::problem::{MilpProblem, Sense, VarId};

/// Outcome class of a solve. Only `Optimal` lets result extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Undefined,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Undefined => "undefined",
        };
        f.write_str(s)
    }
}

/// Result of solving a MIP problem
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolveStatus,
    pub objective: f64,
    /// Variable values in creation order; empty unless `status` is optimal.
    pub values: Vec<f64>,
}

impl Solution {
    /// Value of `id`. Solutions kept by a model carry one value per variable.
    pub fn value(&self, id: VarId) -> f64 {
        self.values[id.index()]
    }
}

/// Anything able to solve a [`MilpProblem`].
pub trait Solver {
    fn solve(&self, problem: &MilpProblem) -> LocateResult<Solution>;
}

/// HiGHS-backed [`Solver`].
#[derive(Debug, Clone)]
pub struct HighsSolver {
    /// Suppress HiGHS console output
    pub quiet: bool,
    /// Wall-clock limit in seconds
    pub time_limit: Option<f64>,
    pub mip_rel_gap: Option<f64>,
    pub threads: Option<i32>,
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self {
            quiet: true,
            time_limit: None,
            mip_rel_gap: None,
            threads: None,
        }
    }
}

impl HighsSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_mip_rel_gap(mut self, gap: f64) -> Self {
        self.mip_rel_gap = Some(gap);
        self
    }

    pub fn with_threads(mut self, threads: i32) -> Self {
        self.threads = Some(threads);
        self
    }
}

fn map_status(status: HighsModelStatus) -> SolveStatus {
    match status {
        HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => SolveStatus::Optimal,
        HighsModelStatus::Infeasible => SolveStatus::Infeasible,
        HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
            SolveStatus::Unbounded
        }
        _ => SolveStatus::Undefined,
    }
}

impl Solver for HighsSolver {
    fn solve(&self, problem: &MilpProblem) -> LocateResult<Solution> {
        // Create row-based problem
        let mut pb = RowProblem::new();

        // In highs 1.12+, integrality must be set when adding the column
        let cols: Vec<Col> = problem
            .variables()
            .iter()
            .map(|v| pb.add_column_with_integrality(v.cost, v.lower..=v.upper, v.kind.is_integer()))
            .collect();

        for row in problem.rows() {
            let terms: Vec<(Col, f64)> = row
                .terms
                .iter()
                .map(|&(id, coef)| (cols[id.index()], coef))
                .collect();
            pb.add_row(row.lower..=row.upper, terms);
        }

        let sense = match problem.sense() {
            Sense::Maximize => HighsSense::Maximise,
            Sense::Minimize => HighsSense::Minimise,
        };
        let mut model = pb.optimise(sense);
        if self.quiet {
            model.make_quiet();
        }
        if let Some(limit) = self.time_limit {
            model.set_option("time_limit", limit);
        }
        if let Some(gap) = self.mip_rel_gap {
            model.set_option("mip_rel_gap", gap);
        }
        if let Some(threads) = self.threads {
            model.set_option("threads", threads);
        }

        debug!(
            "solving `{}` with HiGHS: {} columns, {} rows",
            problem.name(),
            problem.num_variables(),
            problem.num_rows()
        );
        let solved = model.solve();
        let raw = solved.status();
        let status = map_status(raw);
        info!("HiGHS finished `{}` with status {:?}", problem.name(), raw);

        if status != SolveStatus::Optimal {
            return Ok(Solution {
                status,
                objective: f64::NAN,
                values: Vec::new(),
            });
        }

        let values = solved.get_solution().columns().to_vec();
        Ok(Solution {
            status,
            objective: solved.objective_value(),
            values,
        })
    }
}
