//! Shared model contract and result extraction.
//!
//! Every location model owns a [`ModelCore`] (name, assembled problem, last
//! solve) and implements [`LocateSolver`]. Models that relate facilities to
//! clients also implement [`BaseOutput`], which derives `fac2cli` / `cli2fac`
//! from the solved variable values.

use log::{info, warn};
use ndarray::Array2;

use crate::error::{LocateError, LocateResult};
use crate::locate::builder::ClientAssignment;
use crate::locate::problem::{MilpProblem, VarId};
use crate::locate::solver::{SolveStatus, Solution, Solver};

/// Solved binaries above this value count as selected.
pub const SELECTED: f64 = 0.5;

pub(crate) fn open_flags(solution: &Solution, vars: &[VarId]) -> Vec<bool> {
    vars.iter().map(|&v| solution.value(v) > SELECTED).collect()
}

/// Binary coverage matrix: `aij[i][j] = 1` iff `cost[i][j] <= service_radius`.
pub fn coverage_matrix(cost_matrix: &Array2<f64>, service_radius: f64) -> Array2<u8> {
    cost_matrix.mapv(|d| u8::from(d <= service_radius))
}

/// Reject empty matrices and entries that are negative or not finite.
pub fn validate_cost_matrix(cost_matrix: &Array2<f64>) -> LocateResult<()> {
    let (n_rows, n_cols) = cost_matrix.dim();
    if n_rows == 0 || n_cols == 0 {
        return Err(LocateError::InvalidCostMatrix(format!(
            "matrix must be non-empty, got shape {n_rows}x{n_cols}"
        )));
    }
    if let Some(((i, j), v)) = cost_matrix
        .indexed_iter()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(LocateError::InvalidCostMatrix(format!(
            "entry [{i}, {j}] = {v} is not a finite non-negative number"
        )));
    }
    Ok(())
}

pub fn validate_len(what: &'static str, expected: usize, got: usize) -> LocateResult<()> {
    if expected != got {
        return Err(LocateError::DimensionMismatch { what, expected, got });
    }
    Ok(())
}

/// Length check plus finite, non-negative entries (weights, capacities).
pub fn validate_values(what: &'static str, expected: usize, values: &[f64]) -> LocateResult<()> {
    validate_len(what, expected, values.len())?;
    match values.iter().position(|v| !v.is_finite() || *v < 0.0) {
        Some(index) => Err(LocateError::InvalidValue {
            what,
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

/// Number of clients that no candidate facility covers.
pub fn uncoverable_clients(aij: &Array2<u8>) -> usize {
    aij.rows().into_iter().filter(|row| row.iter().all(|&a| a == 0)).count()
}

pub(crate) fn warn_uncoverable(name: &str, aij: &Array2<u8>) {
    let n = uncoverable_clients(aij);
    if n > 0 {
        warn!(
            "model `{name}`: {n} clients are outside the service radius of every candidate facility"
        );
    }
}

/// Name, assembled problem and last solve of one model instance.
#[derive(Debug, Clone)]
pub struct ModelCore {
    name: String,
    problem: MilpProblem,
    status: Option<SolveStatus>,
    solution: Option<Solution>,
}

impl ModelCore {
    pub fn new(problem: MilpProblem) -> Self {
        Self {
            name: problem.name().to_string(),
            problem,
            status: None,
            solution: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn problem(&self) -> &MilpProblem {
        &self.problem
    }

    pub fn status(&self) -> Option<SolveStatus> {
        self.status
    }

    /// The last optimal solution.
    pub fn solution(&self) -> LocateResult<&Solution> {
        self.solution
            .as_ref()
            .ok_or_else(|| LocateError::NotSolved(self.name.clone()))
    }

    /// Hand the problem to `solver` and keep the solution only if optimal.
    pub fn run(&mut self, solver: &dyn Solver) -> LocateResult<&Solution> {
        self.solution = None;
        let solution = solver.solve(&self.problem)?;
        self.status = Some(solution.status);
        check_status(&self.name, solution.status)?;
        let n_vars = self.problem.num_variables();
        if solution.values.len() != n_vars {
            return Err(LocateError::Solver(format!(
                "model `{}`: solver returned {} values for {n_vars} variables",
                self.name,
                solution.values.len()
            )));
        }
        info!(
            "model `{}` solved to optimality, objective {}",
            self.name, solution.objective
        );
        Ok(self.solution.insert(solution))
    }
}

/// Fail with the status name unless the solve was optimal.
pub fn check_status(name: &str, status: SolveStatus) -> LocateResult<()> {
    match status {
        SolveStatus::Optimal => Ok(()),
        status => Err(LocateError::Status {
            name: name.to_string(),
            status,
        }),
    }
}

/// Cardinality targets of zero are rejected before the solver runs.
pub fn ensure_facilities_requested(name: &str, p_facilities: usize) -> LocateResult<()> {
    if p_facilities == 0 {
        return Err(LocateError::NoFacilitiesRequested(name.to_string()));
    }
    Ok(())
}

/// Construct / solve contract shared by every location model.
pub trait LocateSolver {
    fn core(&self) -> &ModelCore;

    fn fac_vars(&self) -> &[VarId];

    /// Solve the model. With `results` the facility/client arrays and the
    /// model's derived metrics are extracted; without it they stay unset.
    fn solve(&mut self, solver: &dyn Solver, results: bool) -> LocateResult<()>;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn problem(&self) -> &MilpProblem {
        self.core().problem()
    }

    fn status(&self) -> Option<SolveStatus> {
        self.core().status()
    }

    fn objective_value(&self) -> LocateResult<f64> {
        Ok(self.core().solution()?.objective)
    }

    /// Indices of the facilities opened by the last optimal solve.
    fn selected_facilities(&self) -> LocateResult<Vec<usize>> {
        let solution = self.core().solution()?;
        Ok(selected(solution, self.fac_vars()))
    }
}

pub fn selected(solution: &Solution, vars: &[VarId]) -> Vec<usize> {
    vars.iter()
        .enumerate()
        .filter(|(_, &v)| solution.value(v) > SELECTED)
        .map(|(j, _)| j)
        .collect()
}

/// Facility ↔ client adjacency of a solved model.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    n_clients: usize,
    fac2cli: Option<Vec<Vec<usize>>>,
    cli2fac: Option<Vec<Vec<usize>>>,
}

impl Adjacency {
    pub fn new(n_clients: usize) -> Self {
        Self {
            n_clients,
            fac2cli: None,
            cli2fac: None,
        }
    }

    pub fn clear(&mut self) {
        self.fac2cli = None;
        self.cli2fac = None;
    }
}

/// Facility/client output arrays.
pub trait BaseOutput: LocateSolver {
    fn adjacency(&self) -> &Adjacency;

    fn adjacency_mut(&mut self) -> &mut Adjacency;

    /// The model's rule for which clients a facility serves.
    fn facility_clients(&self, solution: &Solution) -> Vec<Vec<usize>>;

    /// Build `fac2cli` from the last optimal solution.
    fn facility_client_array(&mut self) -> LocateResult<()> {
        let fac2cli = self.facility_clients(self.core().solution()?);
        self.adjacency_mut().fac2cli = Some(fac2cli);
        Ok(())
    }

    /// Build `cli2fac` as the inverse of `fac2cli`.
    fn client_facility_array(&mut self) -> LocateResult<()> {
        let n_clients = self.adjacency().n_clients;
        let cli2fac = client_facility_array(self.fac2cli()?, n_clients);
        self.adjacency_mut().cli2fac = Some(cli2fac);
        Ok(())
    }

    fn fac2cli(&self) -> LocateResult<&[Vec<usize>]> {
        self.adjacency()
            .fac2cli
            .as_deref()
            .ok_or_else(|| LocateError::ResultsUnavailable(self.name().to_string()))
    }

    fn cli2fac(&self) -> LocateResult<&[Vec<usize>]> {
        self.adjacency()
            .cli2fac
            .as_deref()
            .ok_or_else(|| LocateError::ResultsUnavailable(self.name().to_string()))
    }
}

/// For each open facility, the clients it covers in `aij`. With
/// `client_mask`, only clients whose own flag is set are kept.
pub fn facility_client_array(
    aij: &Array2<u8>,
    open: &[bool],
    client_mask: Option<&[bool]>,
) -> Vec<Vec<usize>> {
    open.iter()
        .enumerate()
        .map(|(j, &is_open)| {
            if !is_open {
                return Vec::new();
            }
            aij.column(j)
                .iter()
                .enumerate()
                .filter(|(i, &a)| a > 0 && client_mask.map_or(true, |m| m[*i]))
                .map(|(i, _)| i)
                .collect()
        })
        .collect()
}

/// For each open facility, the clients whose assignment to it is selected.
pub fn assignment_facility_client_array(
    open: &[bool],
    assign: &[ClientAssignment],
    solution: &Solution,
) -> Vec<Vec<usize>> {
    let mut fac2cli = vec![Vec::new(); open.len()];
    for (i, row) in assign.iter().enumerate() {
        for &(j, z) in row {
            if open[j] && solution.value(z) > SELECTED {
                fac2cli[j].push(i);
            }
        }
    }
    fac2cli
}

/// Demand-weighted mean cost over the realized (client, facility) pairs.
pub fn mean_distance(
    cost_matrix: &Array2<f64>,
    weights: &[f64],
    assign: &[ClientAssignment],
    solution: &Solution,
) -> f64 {
    let total_weight: f64 = weights.iter().sum();
    if total_weight == 0.0 {
        return 0.0;
    }
    let total: f64 = assign
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().map(move |&(j, z)| (i, j, z)))
        .filter(|&(_, _, z)| solution.value(z) > SELECTED)
        .map(|(i, j, _)| weights[i] * cost_matrix[[i, j]])
        .sum();
    total / total_weight
}

/// Inverse of `fac2cli`: for each client, the facilities listing it.
pub fn client_facility_array(fac2cli: &[Vec<usize>], n_clients: usize) -> Vec<Vec<usize>> {
    let mut cli2fac = vec![Vec::new(); n_clients];
    for (j, clients) in fac2cli.iter().enumerate() {
        for &i in clients {
            cli2fac[i].push(j);
        }
    }
    cli2fac
}

pub fn uncovered_clients(cli2fac: &[Vec<usize>]) -> usize {
    cli2fac.iter().filter(|f| f.is_empty()).count()
}

/// Percentage of clients with at least one covering facility.
pub fn coverage_percentage(n_cli_uncov: usize, n_clients: usize) -> f64 {
    if n_clients == 0 {
        return 0.0;
    }
    (1.0 - n_cli_uncov as f64 / n_clients as f64) * 100.0
}

/// Percentage of clients covered by more than one facility.
pub fn backup_percentage(cli2fac: &[Vec<usize>]) -> f64 {
    if cli2fac.is_empty() {
        return 0.0;
    }
    let backed = cli2fac.iter().filter(|f| f.len() > 1).count();
    backed as f64 / cli2fac.len() as f64 * 100.0
}
