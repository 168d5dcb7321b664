//! P-Center Problem
//!
//! Minimize the maximum distance from any demand point to its assigned facility.

use log::debug;
use ndarray::Array2;

use crate::distance::DistanceMetric;
use crate::error::LocateResult;
use crate::layer::{cost_matrix_from_layers, GeoFrame};
use crate::locate::base::{
    assignment_facility_client_array, ensure_facilities_requested, open_flags,
    validate_cost_matrix, Adjacency, BaseOutput, LocateSolver, ModelCore,
};
use crate::locate::builder::{
    add_assignment_constraint, add_client_assign_variable, add_facility_constraint,
    add_facility_integer_variable, add_minimized_max_variable, add_minimized_maximum_constraint,
    add_opening_constraint, add_predefined_facility_constraint, ClientAssignment,
};
use crate::locate::problem::{MilpProblem, Sense, VarId, VarKind};
use crate::locate::solver::{Solution, Solver};

#[derive(Debug, Clone)]
pub struct PCenter {
    core: ModelCore,
    fac_vars: Vec<VarId>,
    assign: Vec<ClientAssignment>,
    max_var: VarId,
    p_facilities: usize,
    adjacency: Adjacency,
}

impl PCenter {
    pub const DEFAULT_NAME: &'static str = "P-Center";

    pub fn from_cost_matrix(
        cost_matrix: &Array2<f64>,
        p_facilities: usize,
        predefined_facilities: Option<&[usize]>,
        name: &str,
    ) -> LocateResult<Self> {
        validate_cost_matrix(cost_matrix)?;
        let (n_cli, n_fac) = cost_matrix.dim();

        // W = maximum distance, y[j] = facility j selected, z[i][j] = i assigned to j
        let mut problem = MilpProblem::new(name, Sense::Minimize);
        let max_var = add_minimized_max_variable(&mut problem);
        let fac_vars = add_facility_integer_variable(&mut problem, n_fac, "y[{i}]");
        let candidates: Vec<Vec<usize>> = vec![(0..n_fac).collect(); n_cli];
        let assign =
            add_client_assign_variable(&mut problem, &candidates, "z[{i}_{j}]", VarKind::Binary);

        problem.set_objective([(max_var, 1.0)]);

        add_facility_constraint(&mut problem, &fac_vars, p_facilities);
        add_assignment_constraint(&mut problem, &assign, None);
        add_opening_constraint(&mut problem, &fac_vars, &assign);
        add_minimized_maximum_constraint(&mut problem, max_var, &assign, cost_matrix);
        if let Some(predefined) = predefined_facilities {
            add_predefined_facility_constraint(&mut problem, &fac_vars, predefined)?;
        }

        debug!(
            "built `{name}`: {n_cli} clients, {n_fac} facilities, p = {p_facilities}, {} rows",
            problem.num_rows()
        );

        Ok(Self {
            core: ModelCore::new(problem),
            fac_vars,
            assign,
            max_var,
            p_facilities,
            adjacency: Adjacency::new(n_cli),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_geodataframe(
        demand: &GeoFrame,
        facility: &GeoFrame,
        demand_col: &str,
        facility_col: &str,
        p_facilities: usize,
        predefined_facility_col: Option<&str>,
        distance_metric: DistanceMetric,
        name: &str,
    ) -> LocateResult<Self> {
        let predefined = predefined_facility_col
            .map(|col| facility.flagged_rows(col))
            .transpose()?;
        let distances =
            cost_matrix_from_layers(demand, facility, demand_col, facility_col, distance_metric)?;
        Self::from_cost_matrix(&distances, p_facilities, predefined.as_deref(), name)
    }

    pub fn p_facilities(&self) -> usize {
        self.p_facilities
    }

    /// Solved maximum client-to-facility distance.
    pub fn max_distance(&self) -> LocateResult<f64> {
        Ok(self.core.solution()?.value(self.max_var))
    }
}

impl LocateSolver for PCenter {
    fn core(&self) -> &ModelCore {
        &self.core
    }

    fn fac_vars(&self) -> &[VarId] {
        &self.fac_vars
    }

    fn solve(&mut self, solver: &dyn Solver, results: bool) -> LocateResult<()> {
        ensure_facilities_requested(self.name(), self.p_facilities)?;
        self.adjacency.clear();
        self.core.run(solver)?;
        if results {
            self.facility_client_array()?;
            self.client_facility_array()?;
        }
        Ok(())
    }
}

impl BaseOutput for PCenter {
    fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    fn adjacency_mut(&mut self) -> &mut Adjacency {
        &mut self.adjacency
    }

    fn facility_clients(&self, solution: &Solution) -> Vec<Vec<usize>> {
        let open = open_flags(solution, &self.fac_vars);
        assignment_facility_client_array(&open, &self.assign, solution)
    }
}
