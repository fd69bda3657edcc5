//! Regular sampling grid clipped to a [`Boundary`].
//!
//! The mesh is seeded on the boundary's outward-rounded bounding box, so the
//! origin is always the rounded minimum corner. Axes follow half-open range
//! semantics: values are `rmin + i * step` for every `i` keeping the value
//! strictly below `rmax`.
//!
//! Points come out in reading order: latitude rows from north to south, and
//! west to east within a row.

use crate::boundary::Boundary;
use crate::compute::validation::validate_step;
use crate::config::{GridFields, GridMode};
use crate::error::{BrammError, Result};
use bramm_types::table::PointTable;
use bramm_types::value::Value;
use geo::Point;
use std::path::Path;

/// Largest mesh, in points, a grid may produce.
pub const MAX_GRID_POINTS: usize = 25_000_000;

/// Coordinate axes of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    /// Ascending (west to east).
    pub longitudes: Vec<f64>,
    /// Descending (north to south).
    pub latitudes: Vec<f64>,
}

impl GridAxes {
    /// Number of mesh points, `None` on overflow.
    pub fn size(&self) -> Option<usize> {
        self.longitudes.len().checked_mul(self.latitudes.len())
    }
}

/// Builds regular grids of candidate sampling points inside a boundary.
///
/// # Examples
///
/// ```rust
/// use bramm::{Boundary, GridMode, RegularGrid};
/// use geo::polygon;
///
/// let boundary = Boundary::from_polygon(polygon![
///     (x: 2.0, y: 45.0),
///     (x: 3.5, y: 45.0),
///     (x: 3.5, y: 46.2),
///     (x: 2.0, y: 46.2),
/// ])?;
/// let grid = RegularGrid::new(boundary);
///
/// let inside = grid.retrieve_grid(1.0, GridMode::InsideOnly)?;
/// assert_eq!(inside.len(), 4);
/// # Ok::<(), bramm::BrammError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RegularGrid {
    boundary: Boundary,
    fields: GridFields,
}

impl RegularGrid {
    pub fn new(boundary: Boundary) -> Self {
        Self {
            boundary,
            fields: GridFields::default(),
        }
    }

    /// Grid over the boundary stored in a GeoJSON file.
    pub fn from_boundary_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Boundary::from_path(path)?))
    }

    pub fn with_fields(mut self, fields: GridFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn fields(&self) -> &GridFields {
        &self.fields
    }

    /// Mesh axes at `step` degrees.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `step` is not a finite positive number or if the
    /// mesh would exceed [`MAX_GRID_POINTS`].
    pub fn axes(&self, step: f64) -> Result<GridAxes> {
        validate_step(step)?;
        let (lon_rmin, lat_rmin, lon_rmax, lat_rmax) = self.boundary.rounded_bounds();

        let longitudes = arange(lon_rmin as f64, lon_rmax as f64, step)?;
        let mut latitudes = arange(lat_rmin as f64, lat_rmax as f64, step)?;
        latitudes.reverse();

        let axes = GridAxes {
            longitudes,
            latitudes,
        };
        match axes.size() {
            Some(size) if size <= MAX_GRID_POINTS => Ok(axes),
            _ => Err(too_many_points(step)),
        }
    }

    /// Every mesh point over the rounded bounding box, in reading order.
    pub fn mesh(&self, step: f64) -> Result<Vec<Point>> {
        let axes = self.axes(step)?;
        log::debug!(
            "Mesh of {} x {} points with step {}",
            axes.longitudes.len(),
            axes.latitudes.len(),
            step
        );

        let mut points = Vec::with_capacity(axes.size().unwrap_or_default());
        for &lat in &axes.latitudes {
            for &lon in &axes.longitudes {
                points.push(Point::new(lon, lat));
            }
        }
        Ok(points)
    }

    /// Mesh points inside the boundary (edges included), in reading order.
    pub fn inside_points(&self, step: f64) -> Result<Vec<Point>> {
        let inside: Vec<Point> = self
            .mesh(step)?
            .into_iter()
            .filter(|p| self.boundary.contains(p.x(), p.y()))
            .collect();
        log::info!("{} grid points inside the boundary at step {}", inside.len(), step);
        Ok(inside)
    }

    /// Grid as a point table.
    ///
    /// [`GridMode::InsideOnly`] returns the longitude and latitude columns of
    /// the inside points; [`GridMode::Annotated`] returns the whole mesh with
    /// an extra boolean inside column.
    pub fn retrieve_grid(&self, step: f64, mode: GridMode) -> Result<PointTable> {
        let mut columns = vec![self.fields.longitude.clone(), self.fields.latitude.clone()];

        match mode {
            GridMode::InsideOnly => {
                let mut table = PointTable::new(columns);
                for point in self.inside_points(step)? {
                    table.push(vec![Value::from(point.x()), Value::from(point.y())])?;
                }
                Ok(table)
            }
            GridMode::Annotated => {
                columns.push(self.fields.inside.clone());
                let mut table = PointTable::new(columns);
                let mut inside_count = 0usize;
                for point in self.mesh(step)? {
                    let inside = self.boundary.contains(point.x(), point.y());
                    inside_count += usize::from(inside);
                    table.push(vec![
                        Value::from(point.x()),
                        Value::from(point.y()),
                        Value::from(inside),
                    ])?;
                }
                log::info!(
                    "{} of {} grid points inside the boundary at step {}",
                    inside_count,
                    table.len(),
                    step
                );
                Ok(table)
            }
        }
    }
}

fn too_many_points(step: f64) -> BrammError {
    BrammError::InvalidConfig(format!(
        "Grid step {} yields more than {} points",
        step, MAX_GRID_POINTS
    ))
}

/// `start + i * step` for every `i` keeping the value below `stop`.
fn arange(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    let span = ((stop - start) / step).ceil().max(0.0);
    if span > MAX_GRID_POINTS as f64 {
        return Err(too_many_points(step));
    }
    Ok((0..span as usize)
        .map(|i| start + i as f64 * step)
        .filter(|v| *v < stop)
        .collect())
}
