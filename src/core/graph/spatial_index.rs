use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// Bucket size of the kd-tree leaves
const BUCKET_SIZE: usize = 32;

/// Type alias for the static 2D kd-tree over cell coordinates
///
/// The immutable tree accepts any number of points sharing a coordinate,
/// e.g. cells on a grid or duplicated centroids.
type CellTree = ImmutableKdTree<f64, u64, 2, BUCKET_SIZE>;

/// Nearest neighbour index over a fixed set of 2D cell positions
///
/// Built once and queried for many cells. An index over zero points is
/// valid; every query against it is undefined (`None`).
///
/// ### Fields
///
/// * `tree` - The kd-tree, `None` if no points were supplied
/// * `n_points` - Number of indexed points
pub struct SpatialIndex {
    tree: Option<CellTree>,
    n_points: usize,
}

impl SpatialIndex {
    /// Build the index
    ///
    /// ### Params
    ///
    /// * `points` - The 2D coordinates to index. Non-finite coordinates are
    ///   skipped.
    ///
    /// ### Returns
    ///
    /// Initialised index
    pub fn new(points: &[[f64; 2]]) -> Self {
        let finite: Vec<[f64; 2]> = points
            .iter()
            .filter(|p| is_finite_point(p))
            .copied()
            .collect();
        let n_points = finite.len();

        Self {
            tree: if n_points > 0 {
                Some(ImmutableKdTree::new_from_slice(&finite))
            } else {
                None
            },
            n_points,
        }
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.n_points
    }

    pub fn is_empty(&self) -> bool {
        self.n_points == 0
    }

    /// Euclidean distance to the nearest indexed point
    ///
    /// ### Params
    ///
    /// * `query` - The query position
    ///
    /// ### Returns
    ///
    /// The distance, or `None` if the index is empty or the query is not
    /// finite
    pub fn nearest_distance(&self, query: &[f64; 2]) -> Option<f64> {
        if !is_finite_point(query) {
            return None;
        }
        self.tree
            .as_ref()
            .map(|tree| tree.nearest_one::<SquaredEuclidean>(query).distance.sqrt())
    }

    /// Mean nearest neighbour distance of a set of query positions
    ///
    /// ### Params
    ///
    /// * `queries` - The query positions. Non-finite positions are skipped.
    ///
    /// ### Returns
    ///
    /// The mean distance, or `None` if there are no finite queries or the
    /// index is empty
    pub fn mean_nearest_distance(&self, queries: &[[f64; 2]]) -> Option<f64> {
        let mut total = 0.0;
        let mut n = 0_usize;
        for q in queries.iter().filter(|q| is_finite_point(q)) {
            total += self.nearest_distance(q)?;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        Some(total / n as f64)
    }
}

#[inline]
fn is_finite_point(p: &[f64; 2]) -> bool {
    p[0].is_finite() && p[1].is_finite()
}

///////////
// Tests //
///////////
