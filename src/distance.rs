use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use rayon::prelude::*;

use crate::error::LocateError;

/// Pairwise distance metric between two planar points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    SqEuclidean,
    Manhattan,
    Chebyshev,
}

impl DistanceMetric {
    #[inline]
    pub fn distance(self, a: [f64; 2], b: [f64; 2]) -> f64 {
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        match self {
            DistanceMetric::Euclidean => (dx * dx + dy * dy).sqrt(),
            DistanceMetric::SqEuclidean => dx * dx + dy * dy,
            DistanceMetric::Manhattan => dx.abs() + dy.abs(),
            DistanceMetric::Chebyshev => dx.abs().max(dy.abs()),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = LocateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "sqeuclidean" => Ok(DistanceMetric::SqEuclidean),
            "cityblock" | "manhattan" => Ok(DistanceMetric::Manhattan),
            "chebyshev" => Ok(DistanceMetric::Chebyshev),
            _ => Err(LocateError::UnknownMetric(s.to_string())),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::SqEuclidean => "sqeuclidean",
            DistanceMetric::Manhattan => "cityblock",
            DistanceMetric::Chebyshev => "chebyshev",
        };
        f.write_str(name)
    }
}

/// Compute the distance matrix between two point sets (rows = `origins`,
/// columns = `destinations`).
pub fn distance_matrix(
    origins: &[[f64; 2]],
    destinations: &[[f64; 2]],
    metric: DistanceMetric,
) -> Array2<f64> {
    let n1 = origins.len();
    let n2 = destinations.len();

    // Compute distances in parallel for large matrices
    let distances: Vec<f64> = if n1 * n2 > 10000 {
        origins
            .par_iter()
            .flat_map_iter(|&a| destinations.iter().map(move |&b| metric.distance(a, b)))
            .collect()
    } else {
        let mut distances = Vec::with_capacity(n1 * n2);
        for &a in origins {
            for &b in destinations {
                distances.push(metric.distance(a, b));
            }
        }
        distances
    };

    // Row-major, one row per origin
    Array2::from_shape_fn((n1, n2), |(r, c)| distances[r * n2 + c])
}

/// Compute Euclidean distance matrix
pub fn euclidean_matrix(origins: &[[f64; 2]], destinations: &[[f64; 2]]) -> Array2<f64> {
    distance_matrix(origins, destinations, DistanceMetric::Euclidean)
}

/// Compute Manhattan distance matrix
pub fn manhattan_matrix(origins: &[[f64; 2]], destinations: &[[f64; 2]]) -> Array2<f64> {
    distance_matrix(origins, destinations, DistanceMetric::Manhattan)
}
