//! P-Dispersion Problem
//!
//! Maximize the minimum distance between any two selected facilities.

use log::debug;
use ndarray::Array2;

use crate::distance::{distance_matrix, DistanceMetric};
use crate::error::{LocateError, LocateResult};
use crate::layer::GeoFrame;
use crate::locate::base::{
    ensure_facilities_requested, validate_cost_matrix, LocateSolver, ModelCore,
};
use crate::locate::builder::{
    add_facility_constraint, add_facility_integer_variable, add_maximized_min_variable,
    add_p_dispersion_interfacility_constraint, add_predefined_facility_constraint,
};
use crate::locate::problem::{MilpProblem, Sense, VarId};
use crate::locate::solver::Solver;

/// Maximize `D` subject to `sum_j y[j] = p` and, for every pair of sites,
/// `D <= d[j][k] + M (2 - y[j] - y[k])`.
///
/// The model has sites only and no clients, so there is no `fac2cli` /
/// `cli2fac` adjacency. The solved outputs are
/// [`selected_facilities`](LocateSolver::selected_facilities) and
/// [`min_distance`](PDispersion::min_distance), both read directly off the
/// solution whatever `results` is.
#[derive(Debug, Clone)]
pub struct PDispersion {
    core: ModelCore,
    fac_vars: Vec<VarId>,
    disperse_var: VarId,
    p_facilities: usize,
}

impl PDispersion {
    pub const DEFAULT_NAME: &'static str = "P-Dispersion";

    /// `cost_matrix` is the square facility-to-facility distance matrix.
    pub fn from_cost_matrix(
        cost_matrix: &Array2<f64>,
        p_facilities: usize,
        predefined_facilities: Option<&[usize]>,
        name: &str,
    ) -> LocateResult<Self> {
        validate_cost_matrix(cost_matrix)?;
        let (n_rows, n_fac) = cost_matrix.dim();
        if n_rows != n_fac {
            return Err(LocateError::InvalidCostMatrix(format!(
                "p-dispersion needs a square facility matrix, got {n_rows}x{n_fac}"
            )));
        }

        let mut problem = MilpProblem::new(name, Sense::Maximize);
        let disperse_var = add_maximized_min_variable(&mut problem);
        problem.set_objective([(disperse_var, 1.0)]);
        let fac_vars = add_facility_integer_variable(&mut problem, n_fac, "y[{i}]");

        add_facility_constraint(&mut problem, &fac_vars, p_facilities);
        if let Some(predefined) = predefined_facilities {
            add_predefined_facility_constraint(&mut problem, &fac_vars, predefined)?;
        }
        add_p_dispersion_interfacility_constraint(
            &mut problem,
            disperse_var,
            &fac_vars,
            cost_matrix,
        );

        debug!(
            "built `{name}`: {n_fac} facilities, p = {p_facilities}, {} rows",
            problem.num_rows()
        );

        Ok(Self {
            core: ModelCore::new(problem),
            fac_vars,
            disperse_var,
            p_facilities,
        })
    }

    /// Build from a facility layer; distances are taken between its points.
    pub fn from_geodataframe(
        facility: &GeoFrame,
        facility_col: &str,
        p_facilities: usize,
        predefined_facility_col: Option<&str>,
        distance_metric: DistanceMetric,
        name: &str,
    ) -> LocateResult<Self> {
        let predefined = predefined_facility_col
            .map(|col| facility.flagged_rows(col))
            .transpose()?;
        let fac = facility.point_coordinates(facility_col, "Facility")?;
        let distances = distance_matrix(&fac, &fac, distance_metric);
        Self::from_cost_matrix(&distances, p_facilities, predefined.as_deref(), name)
    }

    pub fn p_facilities(&self) -> usize {
        self.p_facilities
    }

    /// Solved minimum distance between any two selected facilities.
    pub fn min_distance(&self) -> LocateResult<f64> {
        Ok(self.core.solution()?.value(self.disperse_var))
    }
}

impl LocateSolver for PDispersion {
    fn core(&self) -> &ModelCore {
        &self.core
    }

    fn fac_vars(&self) -> &[VarId] {
        &self.fac_vars
    }

    fn solve(&mut self, solver: &dyn Solver, _results: bool) -> LocateResult<()> {
        ensure_facilities_requested(self.name(), self.p_facilities)?;
        self.core.run(solver)?;
        Ok(())
    }
}
