//! Geometry layers feeding the location models.
//!
//! A [`GeoFrame`] is a minimal table of geometries: an optional coordinate
//! reference system, one or more named geometry columns and any number of
//! numeric attribute columns (demand weights, capacities, predefined-site
//! flags). Models only ever read point coordinates out of it; non-point
//! geometries are reduced to their centroids with a warning.

use std::collections::BTreeMap;

use geo::{Centroid, Geometry, Point};
use log::warn;
use ndarray::Array2;

use crate::distance::{distance_matrix, DistanceMetric};
use crate::error::{LocateError, LocateResult};

pub const DEFAULT_GEOMETRY_COLUMN: &str = "geometry";

#[derive(Debug, Clone, Default)]
pub struct GeoFrame {
    crs: Option<String>,
    len: usize,
    geometries: BTreeMap<String, Vec<Geometry<f64>>>,
    attributes: BTreeMap<String, Vec<f64>>,
}

impl GeoFrame {
    /// Create a layer whose geometries live in the `"geometry"` column.
    pub fn new(crs: Option<&str>, geometry: Vec<Geometry<f64>>) -> Self {
        let len = geometry.len();
        let mut geometries = BTreeMap::new();
        geometries.insert(DEFAULT_GEOMETRY_COLUMN.to_string(), geometry);
        Self {
            crs: crs.map(str::to_string),
            len,
            geometries,
            attributes: BTreeMap::new(),
        }
    }

    pub fn from_points(crs: Option<&str>, points: &[[f64; 2]]) -> Self {
        let geometry = points
            .iter()
            .map(|&[x, y]| Geometry::Point(Point::new(x, y)))
            .collect();
        Self::new(crs, geometry)
    }

    pub fn with_geometry_column(
        mut self,
        name: &str,
        geometry: Vec<Geometry<f64>>,
    ) -> LocateResult<Self> {
        self.check_len(name, geometry.len())?;
        self.geometries.insert(name.to_string(), geometry);
        Ok(self)
    }

    pub fn with_attribute(mut self, name: &str, values: Vec<f64>) -> LocateResult<Self> {
        self.check_len(name, values.len())?;
        self.attributes.insert(name.to_string(), values);
        Ok(self)
    }

    fn check_len(&self, column: &str, got: usize) -> LocateResult<()> {
        if got != self.len {
            return Err(LocateError::ColumnLength {
                column: column.to_string(),
                expected: self.len,
                got,
            });
        }
        Ok(())
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn geometry(&self, column: &str) -> LocateResult<&[Geometry<f64>]> {
        self.geometries
            .get(column)
            .map(Vec::as_slice)
            .ok_or_else(|| LocateError::MissingColumn(column.to_string()))
    }

    pub fn attribute(&self, column: &str) -> LocateResult<&[f64]> {
        self.attributes
            .get(column)
            .map(Vec::as_slice)
            .ok_or_else(|| LocateError::MissingColumn(column.to_string()))
    }

    /// Row indices whose value in `column` is non-zero.
    pub fn flagged_rows(&self, column: &str) -> LocateResult<Vec<usize>> {
        Ok(self
            .attribute(column)?
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, _)| i)
            .collect())
    }

    /// Planar coordinates of a geometry column.
    ///
    /// If the column is not made up purely of points every geometry is
    /// replaced by its centroid and a warning is logged. `role` names the
    /// layer in that warning ("Demand", "Facility").
    pub fn point_coordinates(&self, column: &str, role: &str) -> LocateResult<Vec<[f64; 2]>> {
        let geometry = self.geometry(column)?;

        let all_points = !geometry.is_empty()
            && geometry.iter().all(|g| matches!(g, Geometry::Point(_)));
        if !all_points {
            warn!(
                "{role} layer contains mixed type geometries or is not a point. \
                 Be sure deriving centroid from geometries doesn't affect the results."
            );
        }

        geometry
            .iter()
            .enumerate()
            .map(|(row, g)| {
                let point = match g {
                    Geometry::Point(p) => Some(*p),
                    other => other.centroid(),
                };
                point
                    .map(|p| [p.x(), p.y()])
                    .ok_or(LocateError::EmptyGeometry(row))
            })
            .collect()
    }
}

/// Fail unless both layers share one coordinate reference system.
pub fn ensure_same_crs(demand: &GeoFrame, facility: &GeoFrame) -> LocateResult<()> {
    if demand.crs() != facility.crs() {
        return Err(LocateError::CrsMismatch {
            demand: demand.crs.clone(),
            facility: facility.crs.clone(),
        });
    }
    Ok(())
}

/// Fail when `layer` carries no CRS.
pub fn require_crs(layer: &GeoFrame, name: &'static str) -> LocateResult<()> {
    match layer.crs() {
        Some(crs) if !crs.is_empty() => Ok(()),
        _ => Err(LocateError::MissingCrs { layer: name }),
    }
}

/// Client × facility cost matrix computed from two layers.
pub fn cost_matrix_from_layers(
    demand: &GeoFrame,
    facility: &GeoFrame,
    demand_col: &str,
    facility_col: &str,
    metric: DistanceMetric,
) -> LocateResult<Array2<f64>> {
    ensure_same_crs(demand, facility)?;
    let dem = demand.point_coordinates(demand_col, "Demand")?;
    let fac = facility.point_coordinates(facility_col, "Facility")?;
    Ok(distance_matrix(&dem, &fac, metric))
}
