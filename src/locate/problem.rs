//! Solver-neutral MILP representation.
//!
//! Models are assembled into a [`MilpProblem`] and handed to a
//! [`Solver`](crate::locate::solver::Solver). Variables are addressed by
//! [`VarId`], their position in creation order, which is also the order
//! solution values come back in.

use std::ops::{Bound, RangeBounds};

/// Handle to a variable of one [`MilpProblem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Integer,
    Continuous,
}

impl VarKind {
    pub fn is_integer(self) -> bool {
        matches!(self, VarKind::Binary | VarKind::Integer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
    /// Objective coefficient
    pub cost: f64,
}

/// One linear row `lower <= sum(coef * var) <= upper`.
#[derive(Debug, Clone)]
pub struct Row {
    pub name: String,
    pub terms: Vec<(VarId, f64)>,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone)]
pub struct MilpProblem {
    name: String,
    sense: Sense,
    variables: Vec<Variable>,
    rows: Vec<Row>,
}

fn bounds_of(range: impl RangeBounds<f64>) -> (f64, f64) {
    let lower = match range.start_bound() {
        Bound::Included(&v) | Bound::Excluded(&v) => v,
        Bound::Unbounded => f64::NEG_INFINITY,
    };
    let upper = match range.end_bound() {
        Bound::Included(&v) | Bound::Excluded(&v) => v,
        Bound::Unbounded => f64::INFINITY,
    };
    (lower, upper)
}

impl MilpProblem {
    pub fn new(name: &str, sense: Sense) -> Self {
        Self {
            name: name.to_string(),
            sense,
            variables: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Register a new variable. Bounds are given as a range, e.g. `0.0..=1.0`
    /// or `0.0..` for a non-negative unbounded variable.
    pub fn add_variable(
        &mut self,
        name: String,
        kind: VarKind,
        bounds: impl RangeBounds<f64>,
    ) -> VarId {
        let (lower, upper) = bounds_of(bounds);
        let id = VarId(self.variables.len());
        self.variables.push(Variable {
            name,
            kind,
            lower,
            upper,
            cost: 0.0,
        });
        id
    }

    /// Add a row; zero coefficients are dropped.
    pub fn add_row(
        &mut self,
        name: String,
        terms: Vec<(VarId, f64)>,
        bounds: impl RangeBounds<f64>,
    ) {
        let (lower, upper) = bounds_of(bounds);
        let terms = terms.into_iter().filter(|(_, coef)| *coef != 0.0).collect();
        self.rows.push(Row {
            name,
            terms,
            lower,
            upper,
        });
    }

    /// Replace the objective with `sum(coef * var)`.
    pub fn set_objective(&mut self, terms: impl IntoIterator<Item = (VarId, f64)>) {
        for v in &mut self.variables {
            v.cost = 0.0;
        }
        for (id, coef) in terms {
            self.variables[id.0].cost += coef;
        }
    }

    /// Evaluate the objective at `values` (one entry per variable).
    pub fn objective_at(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(v, x)| v.cost * x)
            .sum()
    }
}
