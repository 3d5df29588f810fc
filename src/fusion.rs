//! Confidence-weighted spatial clustering of candidate points.

use crate::extractors::CandidatePoint;
use serde::Serialize;

/// Cluster representative produced by the fuser
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FusedPoint {
    pub x: f64,
    pub y: f64,
    /// Mean confidence of the cluster members
    pub confidence: f64,
}

impl FusedPoint {
    #[must_use]
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }

    /// Euclidean distance to a point
    #[must_use]
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Greedy confidence-ordered clustering
#[derive(Debug, Clone)]
pub struct CandidateFuser {
    merge_radius: f64,
}

impl CandidateFuser {
    #[must_use]
    pub fn new(merge_radius: f64) -> Self {
        Self { merge_radius }
    }

    /// Merge candidates that lie closer than the merge radius
    ///
    /// The strongest unused candidate seeds each cluster and absorbs every
    /// unused candidate within the radius of the seed. Equal confidences keep
    /// their input order.
    #[must_use]
    pub fn fuse(&self, candidates: &[CandidatePoint]) -> Vec<FusedPoint> {
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        // sort_by is stable
        order.sort_by(|&a, &b| candidates[b].confidence.total_cmp(&candidates[a].confidence));

        let mut used = vec![false; candidates.len()];
        let mut fused = Vec::new();

        for (rank, &seed_index) in order.iter().enumerate() {
            if used[seed_index] {
                continue;
            }
            used[seed_index] = true;
            let seed = &candidates[seed_index];
            let mut members = vec![seed];

            for &other_index in &order[rank + 1..] {
                if used[other_index] {
                    continue;
                }
                let other = &candidates[other_index];
                if (seed.x - other.x).hypot(seed.y - other.y) < self.merge_radius {
                    used[other_index] = true;
                    members.push(other);
                }
            }

            fused.push(Self::merge(&members));
        }

        fused
    }

    fn merge(members: &[&CandidatePoint]) -> FusedPoint {
        #[allow(clippy::cast_precision_loss)]
        let count = members.len() as f64;
        let weight: f64 = members.iter().map(|m| m.confidence).sum();

        let (x, y) = if weight > 0.0 {
            (
                members.iter().map(|m| m.x * m.confidence).sum::<f64>() / weight,
                members.iter().map(|m| m.y * m.confidence).sum::<f64>() / weight,
            )
        } else {
            (
                members.iter().map(|m| m.x).sum::<f64>() / count,
                members.iter().map(|m| m.y).sum::<f64>() / count,
            )
        };

        FusedPoint::new(x, y, weight / count)
    }
}

/// Keep the `limit` most confident points, ties in input order
#[must_use]
pub fn strongest(points: &[FusedPoint], limit: usize) -> Vec<FusedPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    sorted.truncate(limit);
    sorted
}
