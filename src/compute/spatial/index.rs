//! Great-circle nearest-neighbor index backed by an R*-tree.
//!
//! Reference points are embedded on the unit sphere as 3D cartesian vectors.
//! The R-tree orders candidates by squared chord length, which is monotonic
//! in central angle, so the first candidate returned by
//! `nearest_neighbor_iter_with_distance_2` is the great-circle nearest one.
//! No latitude-dependent envelope correction is needed and queries near the
//! antimeridian or the poles behave like any other query.
//!
//! ## Ties
//!
//! Several reference points can sit at exactly the same chord distance from a
//! query (duplicated sampling sites are common in survey data). The index
//! then returns the candidate with the smallest position in the slice it was
//! built from, independent of the tree's internal layout.

use super::sphere::{haversine_radians, unit_vector};
use geo::Point;
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use smallvec::SmallVec;

/// A reference point with its position in the build slice.
#[derive(Debug, Clone, Copy)]
struct IndexedVector {
    idx: usize,
    xyz: [f64; 3],
}

impl RTreeObject for IndexedVector {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xyz)
    }
}

impl PointDistance for IndexedVector {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.xyz[0] - point[0];
        let dy = self.xyz[1] - point[1];
        let dz = self.xyz[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Result of a nearest-neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the neighbor in the slice the index was built from.
    pub index: usize,
    /// Central angle to the neighbor, in radians.
    pub distance: f64,
}

/// Static nearest-neighbor index over radian (lon, lat) points.
///
/// # Examples
///
/// ```
/// use bramm::compute::spatial::{NearestIndex, to_radians};
/// use geo::Point;
///
/// let reference = vec![
///     to_radians(Point::new(2.0, 45.0)),
///     to_radians(Point::new(3.0, 46.0)),
/// ];
/// let index = NearestIndex::build(&reference);
///
/// let hit = index.nearest(to_radians(Point::new(2.9, 45.8))).unwrap();
/// assert_eq!(hit.index, 1);
/// ```
pub struct NearestIndex {
    tree: RTree<IndexedVector>,
    points: Vec<Point>,
}

impl NearestIndex {
    /// Bulk-load the index. `points` must be in radians.
    pub fn build(points: &[Point]) -> Self {
        let vectors: Vec<IndexedVector> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| IndexedVector {
                idx,
                xyz: unit_vector(*p),
            })
            .collect();

        log::debug!("Building nearest-neighbor index over {} points", vectors.len());

        Self {
            tree: RTree::bulk_load(vectors),
            points: points.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nearest reference point to `query` (radians), `None` on an empty index.
    pub fn nearest(&self, query: Point) -> Option<Neighbor> {
        let target = unit_vector(query);
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&target);

        let (first, best) = candidates.next()?;
        let mut tied: SmallVec<[usize; 4]> = SmallVec::new();
        tied.push(first.idx);
        for (candidate, dist_2) in candidates {
            if dist_2 > best {
                break;
            }
            tied.push(candidate.idx);
        }

        if tied.len() > 1 {
            log::trace!("{} equidistant candidates, keeping lowest position", tied.len());
        }

        let index = tied.iter().copied().min()?;
        Some(Neighbor {
            index,
            distance: haversine_radians(query, self.points[index]),
        })
    }
}
