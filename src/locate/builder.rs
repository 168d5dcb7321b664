//! Decision-variable factory and constraint families.
//!
//! Each function appends variables or rows to a [`MilpProblem`] and returns
//! the handles it created, so the calling model stores them in explicit
//! fields. Variable names follow a template in which `{i}` (and `{j}` for
//! assignment variables) is replaced by the index.

use ndarray::Array2;

use crate::error::{LocateError, LocateResult};
use crate::locate::problem::{MilpProblem, VarId, VarKind};

/// Candidate (facility, variable) pairs of one client.
pub type ClientAssignment = Vec<(usize, VarId)>;

fn binary_vars(problem: &mut MilpProblem, n: usize, template: &str) -> Vec<VarId> {
    (0..n)
        .map(|i| {
            let name = template.replace("{i}", &i.to_string());
            problem.add_variable(name, VarKind::Binary, 0.0..=1.0)
        })
        .collect()
}

/// Binary "facility j is open" variables.
pub fn add_facility_integer_variable(
    problem: &mut MilpProblem,
    n_facilities: usize,
    template: &str,
) -> Vec<VarId> {
    binary_vars(problem, n_facilities, template)
}

/// Binary "client i is covered" variables.
pub fn add_client_integer_variable(
    problem: &mut MilpProblem,
    n_clients: usize,
    template: &str,
) -> Vec<VarId> {
    binary_vars(problem, n_clients, template)
}

/// Assignment variables `z[i][j]`, one per (client, candidate facility).
pub fn add_client_assign_variable(
    problem: &mut MilpProblem,
    candidates: &[Vec<usize>],
    template: &str,
    kind: VarKind,
) -> Vec<ClientAssignment> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, facs)| {
            facs.iter()
                .map(|&j| {
                    let name = template
                        .replace("{i}", &i.to_string())
                        .replace("{j}", &j.to_string());
                    (j, problem.add_variable(name, kind, 0.0..=1.0))
                })
                .collect()
        })
        .collect()
}

/// Continuous placeholder assignment `g[i] ∈ [0, 1]`, taken when client i
/// cannot be served by any of its candidates.
pub fn add_placeholder_variable(
    problem: &mut MilpProblem,
    n_clients: usize,
    template: &str,
) -> Vec<VarId> {
    (0..n_clients)
        .map(|i| {
            let name = template.replace("{i}", &i.to_string());
            problem.add_variable(name, VarKind::Continuous, 0.0..=1.0)
        })
        .collect()
}

/// Continuous `D >= 0`: the minimum pairwise distance being maximized.
pub fn add_maximized_min_variable(problem: &mut MilpProblem) -> VarId {
    problem.add_variable("D".to_string(), VarKind::Continuous, 0.0..)
}

/// Continuous `W >= 0`: the maximum assignment cost being minimized.
pub fn add_minimized_max_variable(problem: &mut MilpProblem) -> VarId {
    problem.add_variable("W".to_string(), VarKind::Continuous, 0.0..)
}

/// Fix `y[j] = 1` for every predefined facility index.
pub fn add_predefined_facility_constraint(
    problem: &mut MilpProblem,
    fac_vars: &[VarId],
    predefined: &[usize],
) -> LocateResult<()> {
    let n_facilities = fac_vars.len();
    if let Some(&index) = predefined.iter().find(|&&j| j >= n_facilities) {
        return Err(LocateError::PredefinedOutOfRange {
            index,
            n_facilities,
        });
    }
    for &j in predefined {
        problem.add_row(format!("predefined[{j}]"), vec![(fac_vars[j], 1.0)], 1.0..=1.0);
    }
    Ok(())
}

/// `sum_j y[j] = p`
pub fn add_facility_constraint(problem: &mut MilpProblem, fac_vars: &[VarId], p_facilities: usize) {
    let p = p_facilities as f64;
    let terms = fac_vars.iter().map(|&y| (y, 1.0)).collect();
    problem.add_row("facility_count".to_string(), terms, p..=p);
}

/// `sum_j y[j] <= bound`
pub fn add_facility_budget_constraint(problem: &mut MilpProblem, fac_vars: &[VarId], bound: f64) {
    let terms = fac_vars.iter().map(|&y| (y, 1.0)).collect();
    problem.add_row("facility_budget".to_string(), terms, ..=bound);
}

fn covering_terms(aij: &Array2<u8>, fac_vars: &[VarId], i: usize) -> Vec<(VarId, f64)> {
    aij.row(i)
        .iter()
        .zip(fac_vars)
        .filter(|(&a, _)| a > 0)
        .map(|(_, &y)| (y, 1.0))
        .collect()
}

/// `sum_{j: aij=1} y[j] >= 1` for every client.
///
/// A client with no covering candidate yields an empty row `0 >= 1`, which
/// the solver reports as infeasible.
pub fn add_set_covering_constraint(
    problem: &mut MilpProblem,
    aij: &Array2<u8>,
    fac_vars: &[VarId],
) {
    for i in 0..aij.nrows() {
        let terms = covering_terms(aij, fac_vars, i);
        problem.add_row(format!("cover[{i}]"), terms, 1.0..);
    }
}

/// `sum_{j: aij=1} y[j] - u[i] >= 1` for every client: at least one cover,
/// and two whenever `u[i] = 1`.
pub fn add_backup_covering_constraint(
    problem: &mut MilpProblem,
    aij: &Array2<u8>,
    fac_vars: &[VarId],
    cli_vars: &[VarId],
) {
    for (i, &u) in cli_vars.iter().enumerate() {
        let mut terms = covering_terms(aij, fac_vars, i);
        terms.push((u, -1.0));
        problem.add_row(format!("backup[{i}]"), terms, 1.0..);
    }
}

/// `u[i] - sum_{j: aij=1} y[j] <= 0` for every client.
pub fn add_maximal_coverage_constraint(
    problem: &mut MilpProblem,
    aij: &Array2<u8>,
    fac_vars: &[VarId],
    cli_vars: &[VarId],
) {
    for (i, &u) in cli_vars.iter().enumerate() {
        let mut terms: Vec<(VarId, f64)> = covering_terms(aij, fac_vars, i)
            .into_iter()
            .map(|(y, _)| (y, -1.0))
            .collect();
        terms.push((u, 1.0));
        problem.add_row(format!("max_cover[{i}]"), terms, ..=0.0);
    }
}

/// `sum_j z[i][j] (+ g[i]) = 1` for every client.
pub fn add_assignment_constraint(
    problem: &mut MilpProblem,
    assign: &[ClientAssignment],
    placeholders: Option<&[VarId]>,
) {
    for (i, row) in assign.iter().enumerate() {
        let mut terms: Vec<(VarId, f64)> = row.iter().map(|&(_, z)| (z, 1.0)).collect();
        if let Some(g) = placeholders {
            terms.push((g[i], 1.0));
        }
        problem.add_row(format!("assign[{i}]"), terms, 1.0..=1.0);
    }
}

/// `z[i][j] - y[j] <= 0`: assign only to open facilities.
pub fn add_opening_constraint(
    problem: &mut MilpProblem,
    fac_vars: &[VarId],
    assign: &[ClientAssignment],
) {
    for (i, row) in assign.iter().enumerate() {
        for &(j, z) in row {
            problem.add_row(format!("open[{i}_{j}]"), vec![(z, 1.0), (fac_vars[j], -1.0)], ..=0.0);
        }
    }
}

/// `sum_i w[i] z[i][j] - cap[j] y[j] <= 0` for every facility.
pub fn add_facility_capacity_constraint(
    problem: &mut MilpProblem,
    fac_vars: &[VarId],
    assign: &[ClientAssignment],
    weights: &[f64],
    capacities: &[f64],
) {
    let mut load: Vec<Vec<(VarId, f64)>> = vec![Vec::new(); fac_vars.len()];
    for (i, row) in assign.iter().enumerate() {
        for &(j, z) in row {
            load[j].push((z, weights[i]));
        }
    }
    for (j, mut terms) in load.into_iter().enumerate() {
        terms.push((fac_vars[j], -capacities[j]));
        problem.add_row(format!("capacity[{j}]"), terms, ..=0.0);
    }
}

/// `sum_j d[i][j] z[i][j] - W <= 0` for every client.
pub fn add_minimized_maximum_constraint(
    problem: &mut MilpProblem,
    max_var: VarId,
    assign: &[ClientAssignment],
    cost_matrix: &Array2<f64>,
) {
    for (i, row) in assign.iter().enumerate() {
        let mut terms: Vec<(VarId, f64)> =
            row.iter().map(|&(j, z)| (z, cost_matrix[[i, j]])).collect();
        terms.push((max_var, -1.0));
        problem.add_row(format!("minmax[{i}]"), terms, ..=0.0);
    }
}

/// `D + M y[j] + M y[k] <= d[j][k] + 2M` for every unordered facility pair,
/// i.e. `D <= d[j][k] + M (2 - y[j] - y[k])`.
///
/// `M` is the largest entry of `cost_matrix`. With either site closed the
/// row allows `D <= d[j][k] + M`, which no achievable minimum distance can
/// exceed, so only pairs of open sites bind.
pub fn add_p_dispersion_interfacility_constraint(
    problem: &mut MilpProblem,
    disperse_var: VarId,
    fac_vars: &[VarId],
    cost_matrix: &Array2<f64>,
) {
    let big_m = cost_matrix.iter().copied().fold(0.0, f64::max);
    let n = fac_vars.len();
    for j in 0..n {
        for k in (j + 1)..n {
            let terms = vec![(disperse_var, 1.0), (fac_vars[j], big_m), (fac_vars[k], big_m)];
            let rhs = cost_matrix[[j, k]] + 2.0 * big_m;
            problem.add_row(format!("disperse[{j}_{k}]"), terms, ..=rhs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::problem::Sense;
    use ndarray::array;

    fn problem() -> MilpProblem {
        MilpProblem::new("t", Sense::Minimize)
    }

    #[test]
    fn variables_follow_templates() {
        let mut pb = problem();
        let y = add_facility_integer_variable(&mut pb, 3, "y[{i}]");
        let candidates = [vec![0, 2], vec![1]];
        let z = add_client_assign_variable(&mut pb, &candidates, "z[{i}_{j}]", VarKind::Binary);
        let d = add_maximized_min_variable(&mut pb);

        assert_eq!(pb.variable(y[2]).name, "y[2]");
        assert_eq!(pb.variable(z[0][1].1).name, "z[0_2]");
        assert_eq!(z[1][0].0, 1);
        assert_eq!(pb.variable(d).kind, VarKind::Continuous);
        assert_eq!(pb.variable(d).upper, f64::INFINITY);
        assert_eq!(pb.num_variables(), 3 + 3 + 1);
    }

    #[test]
    fn predefined_out_of_range() {
        let mut pb = problem();
        let y = add_facility_integer_variable(&mut pb, 2, "y[{i}]");
        let err = add_predefined_facility_constraint(&mut pb, &y, &[0, 2]).unwrap_err();
        assert!(matches!(err, LocateError::PredefinedOutOfRange { index: 2, n_facilities: 2 }));
        assert_eq!(pb.num_rows(), 0);

        add_predefined_facility_constraint(&mut pb, &y, &[1]).unwrap();
        let row = &pb.rows()[0];
        assert_eq!((row.lower, row.upper), (1.0, 1.0));
        assert_eq!(row.terms, vec![(y[1], 1.0)]);
    }

    #[test]
    fn covering_rows_use_only_covering_sites() {
        let aij = array![[1, 0, 1], [0, 0, 0]];
        let mut pb = problem();
        let y = add_facility_integer_variable(&mut pb, 3, "y[{i}]");
        add_set_covering_constraint(&mut pb, &aij, &y);
        assert_eq!(pb.rows()[0].terms, vec![(y[0], 1.0), (y[2], 1.0)]);
        assert!(pb.rows()[1].terms.is_empty());
        assert_eq!(pb.rows()[1].lower, 1.0);
    }

    #[test]
    fn backup_and_maximal_rows() {
        let aij = array![[1, 1]];
        let mut pb = problem();
        let y = add_facility_integer_variable(&mut pb, 2, "y[{i}]");
        let u = add_client_integer_variable(&mut pb, 1, "u[{i}]");
        add_backup_covering_constraint(&mut pb, &aij, &y, &u);
        add_maximal_coverage_constraint(&mut pb, &aij, &y, &u);

        let backup = &pb.rows()[0];
        assert_eq!(backup.terms, vec![(y[0], 1.0), (y[1], 1.0), (u[0], -1.0)]);
        assert_eq!(backup.lower, 1.0);

        let maximal = &pb.rows()[1];
        assert_eq!(maximal.terms, vec![(y[0], -1.0), (y[1], -1.0), (u[0], 1.0)]);
        assert_eq!(maximal.upper, 0.0);
    }

    #[test]
    fn capacity_rows_collect_client_loads() {
        let mut pb = problem();
        let y = add_facility_integer_variable(&mut pb, 2, "y[{i}]");
        let candidates = [vec![0, 1], vec![0]];
        let z = add_client_assign_variable(&mut pb, &candidates, "z[{i}_{j}]", VarKind::Binary);
        add_facility_capacity_constraint(&mut pb, &y, &z, &[2.0, 3.0], &[4.0, 1.0]);
        let cap0 = &pb.rows()[0];
        assert_eq!(cap0.terms, vec![(z[0][0].1, 2.0), (z[1][0].1, 3.0), (y[0], -4.0)]);
        let cap1 = &pb.rows()[1];
        assert_eq!(cap1.terms, vec![(z[0][1].1, 2.0), (y[1], -1.0)]);
    }

    #[test]
    fn dispersion_uses_matrix_maximum_as_big_m() {
        let cost = array![[0.0, 3.0, 5.0], [3.0, 0.0, 4.0], [5.0, 4.0, 0.0]];
        let mut pb = MilpProblem::new("t", Sense::Maximize);
        let d = add_maximized_min_variable(&mut pb);
        let y = add_facility_integer_variable(&mut pb, 3, "y[{i}]");
        add_p_dispersion_interfacility_constraint(&mut pb, d, &y, &cost);

        assert_eq!(pb.num_rows(), 3);
        let row = &pb.rows()[0];
        assert_eq!(row.terms, vec![(d, 1.0), (y[0], 5.0), (y[1], 5.0)]);
        assert_eq!(row.upper, 3.0 + 10.0);
    }
}
