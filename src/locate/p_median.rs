//! P-Median Problem
//!
//! Minimize total weighted distance by locating exactly p facilities,
//! optionally under facility capacities. [`KNearestPMedian`] restricts each
//! client to its k nearest candidate sites and widens that set only where
//! the restricted model cannot serve a client.

use log::debug;
use ndarray::Array2;

use crate::distance::DistanceMetric;
use crate::error::{LocateError, LocateResult};
use crate::layer::{cost_matrix_from_layers, require_crs, GeoFrame};
use crate::locate::base::{
    assignment_facility_client_array, ensure_facilities_requested, mean_distance, open_flags,
    validate_cost_matrix, validate_len, validate_values, Adjacency, BaseOutput, LocateSolver,
    ModelCore,
};
use crate::locate::builder::{
    add_assignment_constraint, add_client_assign_variable, add_facility_capacity_constraint,
    add_facility_constraint, add_facility_integer_variable, add_opening_constraint,
    add_placeholder_variable, add_predefined_facility_constraint, ClientAssignment,
};
use crate::locate::problem::{MilpProblem, Sense, VarId, VarKind};
use crate::locate::solver::{Solution, Solver};

/// Placeholder assignments above this value mean the client went unserved.
const PLACEHOLDER_TOL: f64 = 1e-6;

/// Default candidate-set size of the k-nearest model.
pub const DEFAULT_K: usize = 5;

/// Fail when even the `p` largest capacities cannot hold total demand.
pub(crate) fn check_capacity(
    p_facilities: usize,
    capacities: &[f64],
    weights: &[f64],
) -> LocateResult<()> {
    if p_facilities == 0 {
        return Ok(());
    }
    let mut sorted = capacities.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let highest: f64 = sorted.iter().take(p_facilities).sum();
    let demand: f64 = weights.iter().sum();
    if highest < demand {
        return Err(LocateError::Specification(format!(
            "Problem is infeasible. The highest possible capacity {highest}, coming from the \
             {p_facilities} sites with the highest capacity, is smaller than the total demand \
             {demand}."
        )));
    }
    Ok(())
}

fn open_and_assigned(
    solution: &Solution,
    fac_vars: &[VarId],
    assign: &[ClientAssignment],
) -> Vec<Vec<usize>> {
    assignment_facility_client_array(&open_flags(solution, fac_vars), assign, solution)
}

/// Capacitated / uncapacitated P-Median.
///
/// Minimize `sum_i sum_j w[i] d[i][j] z[i][j]` subject to `sum_j z[i][j] = 1`,
/// `z[i][j] <= y[j]`, `sum_j y[j] = p` and, with capacities,
/// `sum_i w[i] z[i][j] <= cap[j] y[j]`.
#[derive(Debug, Clone)]
pub struct PMedian {
    core: ModelCore,
    cost_matrix: Array2<f64>,
    weights: Vec<f64>,
    fac_vars: Vec<VarId>,
    assign: Vec<ClientAssignment>,
    p_facilities: usize,
    adjacency: Adjacency,
    mean_dist: Option<f64>,
}

impl PMedian {
    pub const DEFAULT_NAME: &'static str = "P-Median";

    pub fn from_cost_matrix(
        cost_matrix: &Array2<f64>,
        weights: &[f64],
        p_facilities: usize,
        capacities: Option<&[f64]>,
        predefined_facilities: Option<&[usize]>,
        name: &str,
    ) -> LocateResult<Self> {
        validate_cost_matrix(cost_matrix)?;
        let (n_cli, n_fac) = cost_matrix.dim();
        validate_values("weights", n_cli, weights)?;
        if let Some(caps) = capacities {
            validate_values("capacities", n_fac, caps)?;
            check_capacity(p_facilities, caps, weights)?;
        }

        let mut problem = MilpProblem::new(name, Sense::Minimize);
        let fac_vars = add_facility_integer_variable(&mut problem, n_fac, "y[{i}]");
        let candidates: Vec<Vec<usize>> = vec![(0..n_fac).collect(); n_cli];
        let assign =
            add_client_assign_variable(&mut problem, &candidates, "z[{i}_{j}]", VarKind::Binary);

        problem.set_objective(assign.iter().enumerate().flat_map(|(i, row)| {
            row.iter()
                .map(move |&(j, z)| (z, weights[i] * cost_matrix[[i, j]]))
        }));

        add_assignment_constraint(&mut problem, &assign, None);
        add_facility_constraint(&mut problem, &fac_vars, p_facilities);
        add_opening_constraint(&mut problem, &fac_vars, &assign);
        if let Some(caps) = capacities {
            add_facility_capacity_constraint(&mut problem, &fac_vars, &assign, weights, caps);
        }
        if let Some(predefined) = predefined_facilities {
            add_predefined_facility_constraint(&mut problem, &fac_vars, predefined)?;
        }

        debug!(
            "built `{name}`: {n_cli} clients, {n_fac} facilities, p = {p_facilities}, {} rows",
            problem.num_rows()
        );

        Ok(Self {
            core: ModelCore::new(problem),
            cost_matrix: cost_matrix.clone(),
            weights: weights.to_vec(),
            fac_vars,
            assign,
            p_facilities,
            adjacency: Adjacency::new(n_cli),
            mean_dist: None,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_geodataframe(
        demand: &GeoFrame,
        facility: &GeoFrame,
        demand_col: &str,
        facility_col: &str,
        weights_col: &str,
        p_facilities: usize,
        facility_capacity_col: Option<&str>,
        predefined_facility_col: Option<&str>,
        distance_metric: DistanceMetric,
        name: &str,
    ) -> LocateResult<Self> {
        let predefined = predefined_facility_col
            .map(|col| facility.flagged_rows(col))
            .transpose()?;
        let capacities = facility_capacity_col
            .map(|col| facility.attribute(col))
            .transpose()?;
        let weights = demand.attribute(weights_col)?;
        let distances =
            cost_matrix_from_layers(demand, facility, demand_col, facility_col, distance_metric)?;
        Self::from_cost_matrix(
            &distances,
            weights,
            p_facilities,
            capacities,
            predefined.as_deref(),
            name,
        )
    }

    pub fn cost_matrix(&self) -> &Array2<f64> {
        &self.cost_matrix
    }

    pub fn p_facilities(&self) -> usize {
        self.p_facilities
    }

    /// Demand-weighted mean distance between clients and their facility.
    pub fn mean_dist(&self) -> LocateResult<f64> {
        self.mean_dist
            .ok_or_else(|| LocateError::ResultsUnavailable(self.name().to_string()))
    }

    pub fn compute_mean_dist(&mut self) -> LocateResult<()> {
        let solution = self.core.solution()?;
        let mean = mean_distance(&self.cost_matrix, &self.weights, &self.assign, solution);
        self.mean_dist = Some(mean);
        Ok(())
    }
}

impl LocateSolver for PMedian {
    fn core(&self) -> &ModelCore {
        &self.core
    }

    fn fac_vars(&self) -> &[VarId] {
        &self.fac_vars
    }

    fn solve(&mut self, solver: &dyn Solver, results: bool) -> LocateResult<()> {
        ensure_facilities_requested(self.name(), self.p_facilities)?;
        self.adjacency.clear();
        self.mean_dist = None;
        self.core.run(solver)?;
        if results {
            self.facility_client_array()?;
            self.client_facility_array()?;
            self.compute_mean_dist()?;
        }
        Ok(())
    }
}

impl BaseOutput for PMedian {
    fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    fn adjacency_mut(&mut self) -> &mut Adjacency {
        &mut self.adjacency
    }

    fn facility_clients(&self, solution: &Solution) -> Vec<Vec<usize>> {
        open_and_assigned(solution, &self.fac_vars, &self.assign)
    }
}

/// The `k` cheapest facilities of every client, ties broken by index.
fn nearest_candidates(cost_matrix: &Array2<f64>, k_array: &[usize]) -> Vec<Vec<usize>> {
    cost_matrix
        .rows()
        .into_iter()
        .zip(k_array)
        .map(|(row, &k)| {
            let mut order: Vec<usize> = (0..row.len()).collect();
            order.sort_by(|&a, &b| row[a].total_cmp(&row[b]).then(a.cmp(&b)));
            order.truncate(k);
            order
        })
        .collect()
}

fn validate_k_array(k_array: &[usize], n_clients: usize, n_facilities: usize) -> LocateResult<()> {
    validate_len("k_array", n_clients, k_array.len())?;
    if let Some((client, &k)) = k_array
        .iter()
        .enumerate()
        .find(|(_, &k)| k == 0 || k > n_facilities)
    {
        return Err(LocateError::InvalidK {
            client,
            k,
            n_facilities,
        });
    }
    Ok(())
}

/// Flat price of one placeholder assignment. It exceeds the cost of any
/// complete assignment, so a placeholder survives in an optimal solution
/// only when no complete assignment fits the candidate sets.
fn placeholder_penalty(cost_matrix: &Array2<f64>, weights: &[f64]) -> f64 {
    let max_cost = cost_matrix.iter().copied().fold(0.0, f64::max);
    weights.iter().sum::<f64>() * max_cost + 1.0
}

/// Clients whose `k` grows after a solve that left `unserved` on placeholders.
///
/// Unserved clients are widened when all of them still can be. Otherwise a
/// saturated client is blocked by others' narrow candidate sets, so every
/// client below `n_facilities` is widened. Empty means nothing can grow.
fn clients_to_widen(k_array: &[usize], unserved: &[usize], n_facilities: usize) -> Vec<usize> {
    if unserved.iter().all(|&i| k_array[i] < n_facilities) {
        return unserved.to_vec();
    }
    (0..k_array.len())
        .filter(|&i| k_array[i] < n_facilities)
        .collect()
}

/// P-Median restricted to each client's k nearest candidate sites.
///
/// Each client also gets a placeholder assignment `g[i]` priced above any
/// complete assignment. When a solve uses placeholders the candidate sets
/// are widened by one and the model is rebuilt; `solve` repeats until every
/// client is served by a real facility. A placeholder left in use once
/// every `k` equals the number of facilities means no assignment fits the
/// capacities, reported as `Specification`.
#[derive(Debug, Clone)]
pub struct KNearestPMedian {
    name: String,
    cost_matrix: Array2<f64>,
    weights: Vec<f64>,
    capacities: Option<Vec<f64>>,
    predefined: Option<Vec<usize>>,
    p_facilities: usize,
    k_array: Vec<usize>,
    core: ModelCore,
    fac_vars: Vec<VarId>,
    assign: Vec<ClientAssignment>,
    placeholders: Vec<VarId>,
    adjacency: Adjacency,
    mean_dist: Option<f64>,
}

impl KNearestPMedian {
    pub const DEFAULT_NAME: &'static str = "k-nearest-p-median";

    /// `k_array` defaults to `min(n_facilities, 5)` for every client.
    pub fn from_cost_matrix(
        cost_matrix: &Array2<f64>,
        weights: &[f64],
        p_facilities: usize,
        capacities: Option<&[f64]>,
        k_array: Option<&[usize]>,
        predefined_facilities: Option<&[usize]>,
        name: &str,
    ) -> LocateResult<Self> {
        validate_cost_matrix(cost_matrix)?;
        let (n_cli, n_fac) = cost_matrix.dim();
        validate_values("weights", n_cli, weights)?;

        let k_array = match k_array {
            Some(k) => k.to_vec(),
            None => vec![n_fac.min(DEFAULT_K); n_cli],
        };
        validate_k_array(&k_array, n_cli, n_fac)?;

        if let Some(caps) = capacities {
            validate_values("capacities", n_fac, caps)?;
            check_capacity(p_facilities, caps, weights)?;
        }

        let mut model = Self {
            name: name.to_string(),
            cost_matrix: cost_matrix.clone(),
            weights: weights.to_vec(),
            capacities: capacities.map(<[f64]>::to_vec),
            predefined: predefined_facilities.map(<[usize]>::to_vec),
            p_facilities,
            k_array,
            core: ModelCore::new(MilpProblem::new(name, Sense::Minimize)),
            fac_vars: Vec::new(),
            assign: Vec::new(),
            placeholders: Vec::new(),
            adjacency: Adjacency::new(n_cli),
            mean_dist: None,
        };
        model.assemble()?;
        Ok(model)
    }

    /// Both layers must carry a CRS, and the same one.
    #[allow(clippy::too_many_arguments)]
    pub fn from_geodataframe(
        demand: &GeoFrame,
        facility: &GeoFrame,
        demand_col: &str,
        facility_col: &str,
        weights_col: &str,
        p_facilities: usize,
        facility_capacity_col: Option<&str>,
        k_array: Option<&[usize]>,
        predefined_facility_col: Option<&str>,
        distance_metric: DistanceMetric,
        name: &str,
    ) -> LocateResult<Self> {
        require_crs(demand, "gdf_demand")?;
        require_crs(facility, "gdf_facility")?;

        let predefined = predefined_facility_col
            .map(|col| facility.flagged_rows(col))
            .transpose()?;
        let capacities = facility_capacity_col
            .map(|col| facility.attribute(col))
            .transpose()?;
        let weights = demand.attribute(weights_col)?;
        if let Some(k) = k_array {
            validate_k_array(k, demand.len(), facility.len())?;
        }
        let distances =
            cost_matrix_from_layers(demand, facility, demand_col, facility_col, distance_metric)?;
        Self::from_cost_matrix(
            &distances,
            weights,
            p_facilities,
            capacities,
            k_array,
            predefined.as_deref(),
            name,
        )
    }

    /// (Re)build the problem for the current `k_array`.
    fn assemble(&mut self) -> LocateResult<()> {
        let (n_cli, n_fac) = self.cost_matrix.dim();
        let mut problem = MilpProblem::new(&self.name, Sense::Minimize);

        let fac_vars = add_facility_integer_variable(&mut problem, n_fac, "y[{i}]");
        let candidates = nearest_candidates(&self.cost_matrix, &self.k_array);
        let assign =
            add_client_assign_variable(&mut problem, &candidates, "z[{i}_{j}]", VarKind::Binary);
        let placeholders = add_placeholder_variable(&mut problem, n_cli, "g[{i}]");

        let cost_matrix = &self.cost_matrix;
        let weights = &self.weights;
        let penalty = placeholder_penalty(cost_matrix, weights);
        let assignment_cost = assign.iter().enumerate().flat_map(|(i, row)| {
            row.iter()
                .map(move |&(j, z)| (z, weights[i] * cost_matrix[[i, j]]))
        });
        let placeholder_cost = placeholders.iter().map(|&g| (g, penalty));
        problem.set_objective(assignment_cost.chain(placeholder_cost));

        add_assignment_constraint(&mut problem, &assign, Some(&placeholders));
        add_facility_constraint(&mut problem, &fac_vars, self.p_facilities);
        add_opening_constraint(&mut problem, &fac_vars, &assign);
        if let Some(caps) = &self.capacities {
            add_facility_capacity_constraint(&mut problem, &fac_vars, &assign, weights, caps);
        }
        if let Some(predefined) = &self.predefined {
            add_predefined_facility_constraint(&mut problem, &fac_vars, predefined)?;
        }

        debug!(
            "built `{}`: {n_cli} clients, {n_fac} facilities, {} assignment variables",
            self.name,
            assign.iter().map(Vec::len).sum::<usize>()
        );

        self.core = ModelCore::new(problem);
        self.fac_vars = fac_vars;
        self.assign = assign;
        self.placeholders = placeholders;
        Ok(())
    }

    /// Candidate-set size per client; grows across iterative solves.
    pub fn k_array(&self) -> &[usize] {
        &self.k_array
    }

    pub fn cost_matrix(&self) -> &Array2<f64> {
        &self.cost_matrix
    }

    pub fn p_facilities(&self) -> usize {
        self.p_facilities
    }

    pub fn mean_dist(&self) -> LocateResult<f64> {
        self.mean_dist
            .ok_or_else(|| LocateError::ResultsUnavailable(self.name.clone()))
    }

    pub fn compute_mean_dist(&mut self) -> LocateResult<()> {
        let solution = self.core.solution()?;
        let mean = mean_distance(&self.cost_matrix, &self.weights, &self.assign, solution);
        self.mean_dist = Some(mean);
        Ok(())
    }
}

impl LocateSolver for KNearestPMedian {
    fn core(&self) -> &ModelCore {
        &self.core
    }

    fn fac_vars(&self) -> &[VarId] {
        &self.fac_vars
    }

    fn solve(&mut self, solver: &dyn Solver, results: bool) -> LocateResult<()> {
        ensure_facilities_requested(&self.name, self.p_facilities)?;
        self.adjacency.clear();
        self.mean_dist = None;
        let n_fac = self.cost_matrix.ncols();

        loop {
            let solution = self.core.run(solver)?;
            let unserved: Vec<usize> = self
                .placeholders
                .iter()
                .enumerate()
                .filter(|(_, &g)| solution.value(g) > PLACEHOLDER_TOL)
                .map(|(i, _)| i)
                .collect();
            if unserved.is_empty() {
                break;
            }

            let widen = clients_to_widen(&self.k_array, &unserved, n_fac);
            if widen.is_empty() {
                return Err(LocateError::Specification(format!(
                    "Problem is infeasible. Client {} cannot be assigned to any facility \
                     within the available capacity.",
                    unserved[0]
                )));
            }
            for &i in &widen {
                self.k_array[i] += 1;
            }
            debug!(
                "`{}`: {} clients unserved, widening candidate sets of {} clients",
                self.name,
                unserved.len(),
                widen.len()
            );
            self.assemble()?;
        }

        if results {
            self.facility_client_array()?;
            self.client_facility_array()?;
            self.compute_mean_dist()?;
        }
        Ok(())
    }
}

impl BaseOutput for KNearestPMedian {
    fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    fn adjacency_mut(&mut self) -> &mut Adjacency {
        &mut self.adjacency
    }

    fn facility_clients(&self, solution: &Solution) -> Vec<Vec<usize>> {
        open_and_assigned(solution, &self.fac_vars, &self.assign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::base::tests::ScriptedSolver;
    use ndarray::array;

    fn cost() -> Array2<f64> {
        array![[1.0, 4.0, 3.0], [2.0, 1.0, 5.0]]
    }

    #[test]
    fn capacity_check_uses_the_p_largest_sites() {
        assert!(check_capacity(2, &[1.0, 5.0, 4.0], &[4.0, 5.0]).is_ok());
        let err = check_capacity(1, &[1.0, 5.0, 4.0], &[4.0, 5.0]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Problem is infeasible. The highest possible capacity 5"));
    }

    #[test]
    fn p_median_dense_formulation() {
        let pm =
            PMedian::from_cost_matrix(&cost(), &[1.0, 1.0], 1, None, None, "P-Median").unwrap();
        // 3 y + 6 z
        assert_eq!(pm.problem().num_variables(), 9);
        // 2 assign + 1 count + 6 opening
        assert_eq!(pm.problem().num_rows(), 9);
    }

    #[test]
    fn p_median_extraction() {
        let mut pm =
            PMedian::from_cost_matrix(&cost(), &[1.0, 3.0], 1, None, None, "P-Median").unwrap();
        // y = [1, 0, 0], z[0][0] = 1, z[1][0] = 1
        let values = vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        pm.solve(&ScriptedSolver::optimal(values), true).unwrap();
        assert_eq!(pm.fac2cli().unwrap(), &[vec![0, 1], vec![], vec![]]);
        assert_eq!(pm.cli2fac().unwrap(), &[vec![0], vec![0]]);
        assert!((pm.mean_dist().unwrap() - (1.0 + 3.0 * 2.0) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn nearest_candidates_break_ties_by_index() {
        let cost = array![[2.0, 1.0, 1.0, 0.5]];
        assert_eq!(nearest_candidates(&cost, &[3]), vec![vec![3, 1, 2]]);
    }

    #[test]
    fn k_array_is_validated() {
        let k = [1, 4];
        let err =
            KNearestPMedian::from_cost_matrix(&cost(), &[1.0, 1.0], 1, None, Some(&k), None, "k")
                .unwrap_err();
        assert!(matches!(err, LocateError::InvalidK { client: 1, k: 4, n_facilities: 3 }));
        assert!(err.to_string().starts_with("The value of k should be no more"));

        let k = [0, 1];
        let err =
            KNearestPMedian::from_cost_matrix(&cost(), &[1.0, 1.0], 1, None, Some(&k), None, "k")
                .unwrap_err();
        assert!(matches!(err, LocateError::InvalidK { k: 0, .. }));

        let err =
            KNearestPMedian::from_cost_matrix(&cost(), &[1.0, 1.0], 1, None, Some(&[1]), None, "k")
                .unwrap_err();
        assert!(matches!(err, LocateError::DimensionMismatch { what: "k_array", .. }));
    }

    #[test]
    fn default_k_is_capped_by_facility_count() {
        let model =
            KNearestPMedian::from_cost_matrix(&cost(), &[1.0, 1.0], 1, None, None, None, "k")
                .unwrap();
        assert_eq!(model.k_array(), &[3, 3]);
    }

    #[test]
    fn placeholder_use_widens_k_and_resolves() {
        let k = [1, 1];
        let mut model =
            KNearestPMedian::from_cost_matrix(&cost(), &[1.0, 1.0], 1, None, Some(&k), None, "k")
                .unwrap();
        // first build: y0..y2, z[0_0], z[1_1], g0, g1
        assert_eq!(model.problem().num_variables(), 7);

        let first = Solution {
            status: crate::locate::solver::SolveStatus::Optimal,
            objective: 0.0,
            values: vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        };
        // rebuilt: y0..y2, z[0_0], z[1_1], z[1_0], g0, g1
        let second = Solution {
            status: crate::locate::solver::SolveStatus::Optimal,
            objective: 0.0,
            values: vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0],
        };
        model.solve(&ScriptedSolver::new(vec![first, second]), true).unwrap();

        assert_eq!(model.k_array(), &[1, 2]);
        assert_eq!(model.fac2cli().unwrap(), &[vec![0, 1], vec![], vec![]]);
        assert!((model.mean_dist().unwrap() - 1.5).abs() < 1e-12);
    }

    fn optimal(values: Vec<f64>) -> Solution {
        Solution {
            status: crate::locate::solver::SolveStatus::Optimal,
            objective: 0.0,
            values,
        }
    }

    #[test]
    fn widening_targets_unserved_clients_until_one_saturates() {
        assert_eq!(clients_to_widen(&[1, 2, 1], &[0, 2], 3), vec![0, 2]);
        assert_eq!(clients_to_widen(&[3, 1, 2], &[0], 3), vec![1, 2]);
        assert!(clients_to_widen(&[3, 3], &[1], 3).is_empty());
    }

    #[test]
    fn placeholder_outprices_every_complete_assignment() {
        let penalty = placeholder_penalty(&cost(), &[2.0, 0.5]);
        assert!(penalty > 2.0 * 5.0 + 0.5 * 5.0);
        assert_eq!(placeholder_penalty(&array![[0.0]], &[0.0]), 1.0);
    }

    #[test]
    fn saturated_client_on_placeholder_widens_the_others() {
        let cost = array![[10.0, 1.0], [0.0, 5.0]];
        let (weights, caps, k) = ([2.0, 1.0], [2.0, 1.0], [2, 1]);
        let mut model =
            KNearestPMedian::from_cost_matrix(&cost, &weights, 2, Some(&caps), Some(&k), None, "k")
                .unwrap();
        // y0, y1, z[0_1], z[0_0], z[1_0], g0, g1: client 0 is full width yet unserved
        let first = optimal(vec![1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
        // y0, y1, z[0_1], z[0_0], z[1_0], z[1_1], g0, g1
        let second = optimal(vec![1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
        model.solve(&ScriptedSolver::new(vec![first, second]), true).unwrap();

        assert_eq!(model.k_array(), &[2, 2]);
        assert_eq!(model.fac2cli().unwrap(), &[vec![0], vec![1]]);
        assert!((model.mean_dist().unwrap() - 25.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn placeholder_at_full_width_is_infeasible_and_keeps_k() {
        let cost = array![[1.0, 2.0], [2.0, 1.0], [1.0, 1.0]];
        let caps = [3.0, 3.0];
        let mut model =
            KNearestPMedian::from_cost_matrix(&cost, &[2.0; 3], 2, Some(&caps), None, None, "k")
                .unwrap();
        assert_eq!(model.k_array(), &[2, 2, 2]);
        // y0, y1, z[0_0], z[0_1], z[1_1], z[1_0], z[2_0], z[2_1], g0, g1, g2
        let values = vec![1.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let err = model.solve(&ScriptedSolver::optimal(values), true).unwrap_err();

        assert!(matches!(&err, LocateError::Specification(msg) if msg.contains("Client 2")));
        assert_eq!(model.k_array(), &[2, 2, 2]);
        assert!(matches!(model.fac2cli(), Err(LocateError::ResultsUnavailable(_))));
    }

    #[test]
    fn weights_and_capacities_must_be_finite_and_non_negative() {
        let err = PMedian::from_cost_matrix(&cost(), &[1.0, -2.0], 1, None, None, "P-Median")
            .unwrap_err();
        assert!(matches!(err, LocateError::InvalidValue { what: "weights", index: 1, .. }));

        let caps = [5.0, f64::NAN, 5.0];
        let err =
            KNearestPMedian::from_cost_matrix(&cost(), &[1.0, 1.0], 1, Some(&caps), None, None, "k")
                .unwrap_err();
        assert!(matches!(err, LocateError::InvalidValue { what: "capacities", index: 1, .. }));
    }

    #[test]
    fn zero_facilities_fails_before_solving() {
        let mut model =
            KNearestPMedian::from_cost_matrix(&cost(), &[1.0, 1.0], 0, None, None, None, "k")
                .unwrap();
        let err = model.solve(&ScriptedSolver::new(vec![]), true).unwrap_err();
        assert!(matches!(err, LocateError::NoFacilitiesRequested(_)));
    }
}
