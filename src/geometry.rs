//! Geometry of the three-marker pattern and the triplet search.

use crate::config::GeometryConfig;
use crate::constants::{DEGENERATE_DISTANCE, SPACING_SCORE_WEIGHT};
use crate::fusion::FusedPoint;
use serde::Serialize;

/// Shape measurements of three points ordered by x
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripletGeometry {
    /// Distance between the first and middle point
    pub d12: f64,
    /// Distance between the middle and last point
    pub d23: f64,
    /// Perpendicular distance of the middle point from the outer line
    pub collinearity_error: f64,
    /// `d12 / d23`
    pub spacing_ratio: f64,
}

impl TripletGeometry {
    /// Sentinel for unmeasurable shapes
    pub const DEGENERATE: Self = Self {
        d12: 0.0,
        d23: 0.0,
        collinearity_error: f64::INFINITY,
        spacing_ratio: f64::INFINITY,
    };

    /// Measure three points after ordering them by x
    ///
    /// Coincident points give [`TripletGeometry::DEGENERATE`].
    #[must_use]
    pub fn measure(points: [(f64, f64); 3]) -> Self {
        Self::measure_sorted(sort_by_x(points))
    }

    fn measure_sorted(sorted: [(f64, f64); 3]) -> Self {
        let (d12, d23) = neighbour_distances(&sorted);
        let [p1, p2, p3] = sorted;
        let baseline = (p3.0 - p1.0, p3.1 - p1.1);
        let baseline_length = baseline.0.hypot(baseline.1);

        if d12 < DEGENERATE_DISTANCE || d23 < DEGENERATE_DISTANCE || baseline_length < DEGENERATE_DISTANCE {
            return Self {
                d12,
                d23,
                ..Self::DEGENERATE
            };
        }

        // Project the middle point onto the outer line
        let offset = (p2.0 - p1.0, p2.1 - p1.1);
        let t = (offset.0 * baseline.0 + offset.1 * baseline.1) / (baseline_length * baseline_length);
        let foot = (p1.0 + t * baseline.0, p1.1 + t * baseline.1);

        Self {
            d12,
            d23,
            collinearity_error: (p2.0 - foot.0).hypot(p2.1 - foot.1),
            spacing_ratio: d12 / d23,
        }
    }

    /// Measure fused points, `DEGENERATE` unless there are exactly three
    #[must_use]
    pub fn from_points(points: &[FusedPoint]) -> Self {
        match points {
            [a, b, c] => Self::measure([(a.x, a.y), (b.x, b.y), (c.x, c.y)]),
            _ => Self::DEGENERATE,
        }
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !self.collinearity_error.is_finite() || !self.spacing_ratio.is_finite()
    }
}

fn sort_by_x(points: [(f64, f64); 3]) -> [(f64, f64); 3] {
    let mut sorted = points;
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    sorted
}

fn neighbour_distances([p1, p2, p3]: &[(f64, f64); 3]) -> (f64, f64) {
    (
        (p2.0 - p1.0).hypot(p2.1 - p1.1),
        (p3.0 - p2.0).hypot(p3.1 - p2.1),
    )
}

/// An accepted triplet and its score
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTriplet {
    pub points: [FusedPoint; 3],
    pub geometry: TripletGeometry,
    pub score: f64,
}

/// Searches fused candidates for the best pattern-conforming triplet
#[derive(Debug, Clone)]
pub struct GeometricValidator {
    collinearity_tolerance: f64,
    spacing_tolerance: f64,
    min_distance: f64,
    max_distance: f64,
}

impl GeometricValidator {
    #[must_use]
    pub fn new(config: &GeometryConfig) -> Self {
        Self {
            collinearity_tolerance: config.collinearity_tolerance,
            spacing_tolerance: config.spacing_tolerance,
            min_distance: config.min_marker_distance,
            max_distance: config.max_marker_distance,
        }
    }

    /// Whether a measured shape satisfies every pattern constraint
    #[must_use]
    pub fn accepts(&self, geometry: &TripletGeometry) -> bool {
        if geometry.is_degenerate() {
            return false;
        }
        if !self.spacing_in_range(geometry.d12, geometry.d23) {
            return false;
        }
        if (geometry.spacing_ratio - 1.0).abs() > self.spacing_tolerance {
            return false;
        }
        geometry.collinearity_error <= self.collinearity_tolerance
    }

    fn spacing_in_range(&self, d12: f64, d23: f64) -> bool {
        let range = self.min_distance..=self.max_distance;
        range.contains(&d12) && range.contains(&d23)
    }

    /// Find the lowest-scoring valid triplet
    ///
    /// Score is `collinearity_error + 10 * |spacing_ratio - 1|`; the first
    /// combination in `i < j < k` order wins exact ties.
    #[must_use]
    pub fn find_best_triplet(&self, points: &[FusedPoint]) -> Option<ValidatedTriplet> {
        let n = points.len();
        let mut best: Option<ValidatedTriplet> = None;

        for i in 0..n {
            for j in i + 1..n {
                for k in j + 1..n {
                    let triplet = [points[i], points[j], points[k]];
                    let sorted = sort_by_x(triplet.map(|p| (p.x, p.y)));

                    // Distance bounds before the projection
                    let (d12, d23) = neighbour_distances(&sorted);
                    if !self.spacing_in_range(d12, d23) {
                        continue;
                    }

                    let geometry = TripletGeometry::measure_sorted(sorted);
                    if !self.accepts(&geometry) {
                        continue;
                    }

                    let score =
                        geometry.collinearity_error + SPACING_SCORE_WEIGHT * (geometry.spacing_ratio - 1.0).abs();
                    if best.as_ref().map_or(true, |b| score < b.score) {
                        best = Some(ValidatedTriplet {
                            points: triplet,
                            geometry,
                            score,
                        });
                    }
                }
            }
        }

        best
    }
}
