//! Coverage location problems: LSCP, LSCP-B and MCLP
//!
//! LSCP: Location Set Covering Problem - minimize facilities to cover all demand
//! LSCP-B: LSCP with backup - maximize clients covered twice under the LSCP budget
//! MCLP: Maximum Coverage Location Problem - maximize coverage with p facilities

use log::debug;
use ndarray::Array2;

use crate::distance::DistanceMetric;
use crate::error::{LocateError, LocateResult};
use crate::layer::{cost_matrix_from_layers, GeoFrame};
use crate::locate::base::{
    backup_percentage, coverage_matrix, coverage_percentage, ensure_facilities_requested,
    facility_client_array, open_flags, selected, uncovered_clients, validate_cost_matrix,
    validate_values, warn_uncoverable, Adjacency, BaseOutput, LocateSolver, ModelCore,
};
use crate::locate::builder::{
    add_backup_covering_constraint, add_client_integer_variable, add_facility_budget_constraint,
    add_facility_constraint, add_facility_integer_variable, add_maximal_coverage_constraint,
    add_predefined_facility_constraint, add_set_covering_constraint,
};
use crate::locate::problem::{MilpProblem, Sense, VarId};
use crate::locate::solver::{Solution, Solver};

/// Location Set Covering Problem.
///
/// Minimize `sum_j y[j]` subject to every client being within the service
/// radius of at least one open facility.
#[derive(Debug, Clone)]
pub struct Lscp {
    core: ModelCore,
    aij: Array2<u8>,
    fac_vars: Vec<VarId>,
    predefined: Option<Vec<usize>>,
    adjacency: Adjacency,
}

impl Lscp {
    pub const DEFAULT_NAME: &'static str = "LSCP";

    pub fn from_cost_matrix(
        cost_matrix: &Array2<f64>,
        service_radius: f64,
        predefined_facilities: Option<&[usize]>,
        name: &str,
    ) -> LocateResult<Self> {
        validate_cost_matrix(cost_matrix)?;
        let (n_cli, n_fac) = cost_matrix.dim();

        let mut problem = MilpProblem::new(name, Sense::Minimize);
        let fac_vars = add_facility_integer_variable(&mut problem, n_fac, "y[{i}]");

        let aij = coverage_matrix(cost_matrix, service_radius);
        warn_uncoverable(name, &aij);

        if let Some(predefined) = predefined_facilities {
            add_predefined_facility_constraint(&mut problem, &fac_vars, predefined)?;
        }

        problem.set_objective(fac_vars.iter().map(|&y| (y, 1.0)));
        add_set_covering_constraint(&mut problem, &aij, &fac_vars);

        debug!(
            "built `{name}`: {n_cli} clients, {n_fac} facilities, {} rows",
            problem.num_rows()
        );

        Ok(Self {
            core: ModelCore::new(problem),
            aij,
            fac_vars,
            predefined: predefined_facilities.map(<[usize]>::to_vec),
            adjacency: Adjacency::new(n_cli),
        })
    }

    /// Build from demand and facility layers; the cost matrix is the
    /// pairwise `distance_metric` distance between their points.
    #[allow(clippy::too_many_arguments)]
    pub fn from_geodataframe(
        demand: &GeoFrame,
        facility: &GeoFrame,
        demand_col: &str,
        facility_col: &str,
        service_radius: f64,
        predefined_facility_col: Option<&str>,
        distance_metric: DistanceMetric,
        name: &str,
    ) -> LocateResult<Self> {
        let predefined = predefined_facility_col
            .map(|col| facility.flagged_rows(col))
            .transpose()?;
        let distances =
            cost_matrix_from_layers(demand, facility, demand_col, facility_col, distance_metric)?;
        Self::from_cost_matrix(&distances, service_radius, predefined.as_deref(), name)
    }

    pub fn aij(&self) -> &Array2<u8> {
        &self.aij
    }

    pub fn predefined_facilities(&self) -> Option<&[usize]> {
        self.predefined.as_deref()
    }
}

impl LocateSolver for Lscp {
    fn core(&self) -> &ModelCore {
        &self.core
    }

    fn fac_vars(&self) -> &[VarId] {
        &self.fac_vars
    }

    fn solve(&mut self, solver: &dyn Solver, results: bool) -> LocateResult<()> {
        self.adjacency.clear();
        self.core.run(solver)?;
        if results {
            self.facility_client_array()?;
            self.client_facility_array()?;
        }
        Ok(())
    }
}

impl BaseOutput for Lscp {
    fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    fn adjacency_mut(&mut self) -> &mut Adjacency {
        &mut self.adjacency
    }

    fn facility_clients(&self, solution: &Solution) -> Vec<Vec<usize>> {
        facility_client_array(&self.aij, &open_flags(solution, &self.fac_vars), None)
    }
}

/// Location Set Covering Problem with backup coverage.
///
/// Two-phase: an LSCP is solved first and its optimal facility count becomes
/// the budget `sum_j y[j] <= LSCP*`. The model then maximizes `sum_i u[i]`
/// subject to `sum_{j: aij=1} y[j] >= 1 + u[i]`, so `u[i] = 1` only for
/// clients covered at least twice.
#[derive(Debug, Clone)]
pub struct Lscpb {
    core: ModelCore,
    aij: Array2<u8>,
    fac_vars: Vec<VarId>,
    cli_vars: Vec<VarId>,
    lscp_obj_value: f64,
    adjacency: Adjacency,
    backup_perc: Option<f64>,
}

impl Lscpb {
    pub const DEFAULT_NAME: &'static str = "LSCP-B";

    /// Build the backup model from an LSCP that has already been solved to
    /// optimality; its coverage matrix and predefined facilities carry over.
    pub fn from_lscp(lscp: &Lscp, name: &str) -> LocateResult<Self> {
        let lscp_obj_value = selected(lscp.core().solution()?, lscp.fac_vars()).len() as f64;
        let aij = lscp.aij().clone();
        let (n_cli, n_fac) = aij.dim();

        let mut problem = MilpProblem::new(name, Sense::Maximize);
        let fac_vars = add_facility_integer_variable(&mut problem, n_fac, "y[{i}]");
        let cli_vars = add_client_integer_variable(&mut problem, n_cli, "x[{i}]");

        if let Some(predefined) = lscp.predefined_facilities() {
            add_predefined_facility_constraint(&mut problem, &fac_vars, predefined)?;
        }

        problem.set_objective(cli_vars.iter().map(|&u| (u, 1.0)));
        add_facility_budget_constraint(&mut problem, &fac_vars, lscp_obj_value);
        add_backup_covering_constraint(&mut problem, &aij, &fac_vars, &cli_vars);

        debug!("built `{name}` with facility budget {lscp_obj_value}");

        Ok(Self {
            core: ModelCore::new(problem),
            aij,
            fac_vars,
            cli_vars,
            lscp_obj_value,
            adjacency: Adjacency::new(n_cli),
            backup_perc: None,
        })
    }

    /// Solve the LSCP phase with `solver`, then build the backup model.
    pub fn from_cost_matrix(
        cost_matrix: &Array2<f64>,
        service_radius: f64,
        solver: &dyn Solver,
        predefined_facilities: Option<&[usize]>,
        name: &str,
    ) -> LocateResult<Self> {
        let mut lscp = Lscp::from_cost_matrix(
            cost_matrix,
            service_radius,
            predefined_facilities,
            Lscp::DEFAULT_NAME,
        )?;
        lscp.solve(solver, false)?;
        Self::from_lscp(&lscp, name)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_geodataframe(
        demand: &GeoFrame,
        facility: &GeoFrame,
        demand_col: &str,
        facility_col: &str,
        service_radius: f64,
        solver: &dyn Solver,
        predefined_facility_col: Option<&str>,
        distance_metric: DistanceMetric,
        name: &str,
    ) -> LocateResult<Self> {
        let predefined = predefined_facility_col
            .map(|col| facility.flagged_rows(col))
            .transpose()?;
        let distances =
            cost_matrix_from_layers(demand, facility, demand_col, facility_col, distance_metric)?;
        Self::from_cost_matrix(&distances, service_radius, solver, predefined.as_deref(), name)
    }

    pub fn aij(&self) -> &Array2<u8> {
        &self.aij
    }

    pub fn cli_vars(&self) -> &[VarId] {
        &self.cli_vars
    }

    /// Facility budget taken from the LSCP phase.
    pub fn lscp_obj_value(&self) -> f64 {
        self.lscp_obj_value
    }

    /// Share of clients covered by more than one open facility.
    pub fn get_percentage(&mut self) -> LocateResult<()> {
        let perc = backup_percentage(self.cli2fac()?);
        self.backup_perc = Some(perc);
        Ok(())
    }

    pub fn backup_perc(&self) -> LocateResult<f64> {
        self.backup_perc
            .ok_or_else(|| LocateError::ResultsUnavailable(self.name().to_string()))
    }
}

impl LocateSolver for Lscpb {
    fn core(&self) -> &ModelCore {
        &self.core
    }

    fn fac_vars(&self) -> &[VarId] {
        &self.fac_vars
    }

    fn solve(&mut self, solver: &dyn Solver, results: bool) -> LocateResult<()> {
        self.adjacency.clear();
        self.backup_perc = None;
        self.core.run(solver)?;
        if results {
            self.facility_client_array()?;
            self.client_facility_array()?;
            self.get_percentage()?;
        }
        Ok(())
    }
}

impl BaseOutput for Lscpb {
    fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    fn adjacency_mut(&mut self) -> &mut Adjacency {
        &mut self.adjacency
    }

    fn facility_clients(&self, solution: &Solution) -> Vec<Vec<usize>> {
        facility_client_array(&self.aij, &open_flags(solution, &self.fac_vars), None)
    }
}

/// Maximal Covering Location Problem.
///
/// Maximize `sum_i w[i] u[i]` subject to `u[i] <= sum_{j: aij=1} y[j]` and
/// `sum_j y[j] = p`.
#[derive(Debug, Clone)]
pub struct Mclp {
    core: ModelCore,
    aij: Array2<u8>,
    fac_vars: Vec<VarId>,
    cli_vars: Vec<VarId>,
    weights: Vec<f64>,
    p_facilities: usize,
    adjacency: Adjacency,
    n_cli_uncov: Option<usize>,
    perc_cov: Option<f64>,
}

impl Mclp {
    pub const DEFAULT_NAME: &'static str = "MCLP";

    pub fn from_cost_matrix(
        cost_matrix: &Array2<f64>,
        weights: &[f64],
        service_radius: f64,
        p_facilities: usize,
        predefined_facilities: Option<&[usize]>,
        name: &str,
    ) -> LocateResult<Self> {
        validate_cost_matrix(cost_matrix)?;
        let (n_cli, n_fac) = cost_matrix.dim();
        validate_values("weights", n_cli, weights)?;

        let mut problem = MilpProblem::new(name, Sense::Maximize);
        let fac_vars = add_facility_integer_variable(&mut problem, n_fac, "x[{i}]");
        let cli_vars = add_client_integer_variable(&mut problem, n_cli, "y[{i}]");

        let aij = coverage_matrix(cost_matrix, service_radius);

        problem.set_objective(cli_vars.iter().zip(weights).map(|(&u, &w)| (u, w)));

        if let Some(predefined) = predefined_facilities {
            add_predefined_facility_constraint(&mut problem, &fac_vars, predefined)?;
        }
        add_maximal_coverage_constraint(&mut problem, &aij, &fac_vars, &cli_vars);
        add_facility_constraint(&mut problem, &fac_vars, p_facilities);

        debug!(
            "built `{name}`: {n_cli} clients, {n_fac} facilities, p = {p_facilities}, {} rows",
            problem.num_rows()
        );

        Ok(Self {
            core: ModelCore::new(problem),
            aij,
            fac_vars,
            cli_vars,
            weights: weights.to_vec(),
            p_facilities,
            adjacency: Adjacency::new(n_cli),
            n_cli_uncov: None,
            perc_cov: None,
        })
    }

    /// `weights_col` names the demand layer attribute holding client weights.
    #[allow(clippy::too_many_arguments)]
    pub fn from_geodataframe(
        demand: &GeoFrame,
        facility: &GeoFrame,
        demand_col: &str,
        facility_col: &str,
        weights_col: &str,
        service_radius: f64,
        p_facilities: usize,
        predefined_facility_col: Option<&str>,
        distance_metric: DistanceMetric,
        name: &str,
    ) -> LocateResult<Self> {
        let predefined = predefined_facility_col
            .map(|col| facility.flagged_rows(col))
            .transpose()?;
        let service_load = demand.attribute(weights_col)?;
        let distances =
            cost_matrix_from_layers(demand, facility, demand_col, facility_col, distance_metric)?;
        Self::from_cost_matrix(
            &distances,
            service_load,
            service_radius,
            p_facilities,
            predefined.as_deref(),
            name,
        )
    }

    pub fn aij(&self) -> &Array2<u8> {
        &self.aij
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn p_facilities(&self) -> usize {
        self.p_facilities
    }

    /// Count clients no open facility covers.
    pub fn uncovered_clients(&mut self) -> LocateResult<()> {
        let n = uncovered_clients(self.cli2fac()?);
        self.n_cli_uncov = Some(n);
        Ok(())
    }

    /// Percentage of clients covered; needs [`Mclp::uncovered_clients`] first.
    pub fn get_percentage(&mut self) -> LocateResult<()> {
        let n_cli_uncov = self.n_cli_uncov()?;
        self.perc_cov = Some(coverage_percentage(n_cli_uncov, self.aij.nrows()));
        Ok(())
    }

    pub fn n_cli_uncov(&self) -> LocateResult<usize> {
        self.n_cli_uncov
            .ok_or_else(|| LocateError::ResultsUnavailable(self.name().to_string()))
    }

    pub fn perc_cov(&self) -> LocateResult<f64> {
        self.perc_cov
            .ok_or_else(|| LocateError::ResultsUnavailable(self.name().to_string()))
    }
}

impl LocateSolver for Mclp {
    fn core(&self) -> &ModelCore {
        &self.core
    }

    fn fac_vars(&self) -> &[VarId] {
        &self.fac_vars
    }

    fn solve(&mut self, solver: &dyn Solver, results: bool) -> LocateResult<()> {
        ensure_facilities_requested(self.name(), self.p_facilities)?;
        self.adjacency.clear();
        self.n_cli_uncov = None;
        self.perc_cov = None;
        self.core.run(solver)?;
        if results {
            self.facility_client_array()?;
            self.client_facility_array()?;
            self.uncovered_clients()?;
            self.get_percentage()?;
        }
        Ok(())
    }
}

impl BaseOutput for Mclp {
    fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    fn adjacency_mut(&mut self) -> &mut Adjacency {
        &mut self.adjacency
    }

    // Only clients the solver marked covered are attributed to a facility.
    fn facility_clients(&self, solution: &Solution) -> Vec<Vec<usize>> {
        let open = open_flags(solution, &self.fac_vars);
        let covered = open_flags(solution, &self.cli_vars);
        facility_client_array(&self.aij, &open, Some(&covered))
    }
}
