//! Aggregate statistics over a run.
//!
//! Positions feeding the per-identity error statistics pass through the IQR
//! outlier filter first; jitter is measured on the unfiltered trajectory.

use crate::constants::MARKER_COUNT;
use crate::detector::FrameResult;
use crate::outlier_filter::OutlierFilter;
use serde::Serialize;

/// Statistical summary of a series of values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    /// Mean value of the data
    pub mean: f64,
    /// Population standard deviation of the data
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Range (max - min) of the data
    pub range: f64,
}

impl Statistics {
    /// Summarize a series, `None` when it is empty
    #[must_use]
    pub fn from_values(data: &[f64]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
            range: max - min,
        })
    }
}

/// Ordered positions reported for one identity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trajectory {
    pub id: usize,
    pub points: Vec<(f64, f64)>,
}

impl Trajectory {
    #[must_use]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.points.push((x, y));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distances between consecutive samples
    #[must_use]
    pub fn displacements(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|pair| (pair[1].0 - pair[0].0).hypot(pair[1].1 - pair[0].1))
            .collect()
    }
}

/// Frame-to-frame displacement of one identity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JitterStats {
    pub mean: f64,
    pub std_dev: f64,
    pub max: f64,
}

impl JitterStats {
    /// Needs at least two samples
    #[must_use]
    pub fn from_trajectory(trajectory: &Trajectory) -> Option<Self> {
        let stats = Statistics::from_values(&trajectory.displacements())?;
        Some(Self {
            mean: stats.mean,
            std_dev: stats.std_dev,
            max: stats.max,
        })
    }
}

/// Shape quality over the successful frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeometrySummary {
    pub collinearity_mean: f64,
    pub collinearity_max: f64,
    pub spacing_ratio_mean: f64,
    pub spacing_ratio_std: f64,
}

/// Position statistics of one identity after outlier rejection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityStatistics {
    pub id: usize,
    pub detected_frames: usize,
    pub rejected_outliers: usize,
    pub mean_position: Option<(f64, f64)>,
    /// Population std of the radial distances to the mean position
    pub std_deviation: Option<f64>,
    pub x: Option<Statistics>,
    pub y: Option<Statistics>,
    pub jitter: Option<JitterStats>,
}

impl IdentityStatistics {
    /// Analyze one trajectory
    #[must_use]
    pub fn from_trajectory(trajectory: &Trajectory, outlier_filter: &OutlierFilter) -> Self {
        let filtered = outlier_filter.filter(&trajectory.points);
        let inliers = &filtered.inliers;

        let xs: Vec<f64> = inliers.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = inliers.iter().map(|p| p.1).collect();
        let x = Statistics::from_values(&xs);
        let y = Statistics::from_values(&ys);

        let mean_position = x.zip(y).map(|(x, y)| (x.mean, y.mean));
        let std_deviation = mean_position.and_then(|(mx, my)| {
            let radial: Vec<f64> = inliers.iter().map(|p| (p.0 - mx).hypot(p.1 - my)).collect();
            Statistics::from_values(&radial).map(|s| s.std_dev)
        });

        Self {
            id: trajectory.id,
            detected_frames: inliers.len(),
            rejected_outliers: filtered.rejected,
            mean_position,
            std_deviation,
            x,
            y,
            jitter: JitterStats::from_trajectory(trajectory),
        }
    }
}

/// Summary of a whole run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatistics {
    pub total_frames: usize,
    pub successful_frames: usize,
    /// Fraction of frames with a full triplet, 0 for an empty run
    pub success_rate: f64,
    pub geometry: Option<GeometrySummary>,
    pub identities: Vec<IdentityStatistics>,
}

/// Accumulates frame results as they are produced
#[derive(Debug, Clone)]
pub struct StatisticsCollector {
    total_frames: usize,
    successful_frames: usize,
    collinearity: Vec<f64>,
    spacing_ratio: Vec<f64>,
    trajectories: [Trajectory; MARKER_COUNT],
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_frames: 0,
            successful_frames: 0,
            collinearity: Vec::new(),
            spacing_ratio: Vec::new(),
            trajectories: std::array::from_fn(Trajectory::new),
        }
    }

    /// Record one frame; only successful frames extend the trajectories
    pub fn record(&mut self, result: &FrameResult) {
        self.total_frames += 1;
        if !result.success {
            return;
        }

        self.successful_frames += 1;
        if result.geometry_error.is_finite() && result.spacing_ratio.is_finite() {
            self.collinearity.push(result.geometry_error);
            self.spacing_ratio.push(result.spacing_ratio);
        }
        for detection in &result.detections {
            if let Some(trajectory) = self.trajectories.get_mut(detection.id) {
                trajectory.push(detection.x, detection.y);
            }
        }
    }

    #[must_use]
    pub fn trajectories(&self) -> &[Trajectory; MARKER_COUNT] {
        &self.trajectories
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Summarize everything recorded so far
    #[must_use]
    pub fn summarize(&self, iqr_multiplier: f64) -> RunStatistics {
        let outlier_filter = OutlierFilter::new(iqr_multiplier);

        let geometry = Statistics::from_values(&self.collinearity)
            .zip(Statistics::from_values(&self.spacing_ratio))
            .map(|(collinearity, spacing)| GeometrySummary {
                collinearity_mean: collinearity.mean,
                collinearity_max: collinearity.max,
                spacing_ratio_mean: spacing.mean,
                spacing_ratio_std: spacing.std_dev,
            });

        #[allow(clippy::cast_precision_loss)]
        let success_rate = if self.total_frames > 0 {
            self.successful_frames as f64 / self.total_frames as f64
        } else {
            0.0
        };

        RunStatistics {
            total_frames: self.total_frames,
            successful_frames: self.successful_frames,
            success_rate,
            geometry,
            identities: self
                .trajectories
                .iter()
                .map(|trajectory| IdentityStatistics::from_trajectory(trajectory, &outlier_filter))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Detection;

    fn frame(index: u64, points: &[(f64, f64)], error: f64) -> FrameResult {
        let detections: Vec<Detection> = points
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| Detection {
                id,
                x,
                y,
                confidence: 0.9,
            })
            .collect();
        FrameResult {
            frame_index: index,
            timestamp: index as f64 / 30.0,
            success: detections.len() == MARKER_COUNT,
            detections,
            geometry_error: error,
            spacing_ratio: 1.0,
            extrapolated: Vec::new(),
        }
    }

    #[test]
    fn test_statistics_calculation() {
        let stats = Statistics::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.range, 4.0);
        assert!((stats.std_dev - std::f64::consts::SQRT_2).abs() < 1e-10);
        assert!(Statistics::from_values(&[]).is_none());
    }

    #[test]
    fn test_jitter() {
        let mut trajectory = Trajectory::new(0);
        trajectory.push(0.0, 0.0);
        assert!(JitterStats::from_trajectory(&trajectory).is_none());

        trajectory.push(3.0, 4.0);
        trajectory.push(3.0, 5.0);
        let jitter = JitterStats::from_trajectory(&trajectory).unwrap();
        assert!((jitter.mean - 3.0).abs() < 1e-12);
        assert!((jitter.max - 5.0).abs() < 1e-12);
        assert!((jitter.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_collector_counts_frames() {
        let mut collector = StatisticsCollector::new();
        collector.record(&frame(0, &[(100.0, 0.0), (200.0, 0.0), (300.0, 0.0)], 0.5));
        collector.record(&frame(1, &[(100.0, 0.0)], f64::INFINITY));
        collector.record(&frame(2, &[(102.0, 0.0), (202.0, 0.0), (302.0, 0.0)], 1.5));

        let stats = collector.summarize(3.0);
        assert_eq!(stats.total_frames, 3);
        assert_eq!(stats.successful_frames, 2);
        assert!((stats.success_rate - 2.0 / 3.0).abs() < 1e-12);

        let geometry = stats.geometry.unwrap();
        assert!((geometry.collinearity_mean - 1.0).abs() < 1e-12);
        assert!((geometry.collinearity_max - 1.5).abs() < 1e-12);
        assert_eq!(geometry.spacing_ratio_std, 0.0);

        assert_eq!(stats.identities.len(), 3);
        assert_eq!(stats.identities[0].detected_frames, 2);
        assert_eq!(stats.identities[0].mean_position, Some((101.0, 0.0)));
    }

    #[test]
    fn test_outlier_excluded_from_identity_statistics() {
        let mut trajectory = Trajectory::new(1);
        for i in 0..100 {
            let t = f64::from(i);
            trajectory.push(500.0 + (t * 0.7).sin(), 400.0 + (t * 1.3).cos());
        }
        trajectory.push(5000.0, 5000.0);

        let stats = IdentityStatistics::from_trajectory(&trajectory, &OutlierFilter::new(3.0));
        assert_eq!(stats.detected_frames, 100);
        assert_eq!(stats.rejected_outliers, 1);
        let (mx, my) = stats.mean_position.unwrap();
        assert!((mx - 500.0).abs() < 1.0);
        assert!((my - 400.0).abs() < 1.0);
        assert!(stats.x.unwrap().max < 502.0);
        // Jitter still sees the jump
        assert!(stats.jitter.unwrap().max > 6000.0);
    }

    #[test]
    fn test_empty_run() {
        let stats = StatisticsCollector::new().summarize(3.0);
        assert_eq!(stats.total_frames, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.geometry.is_none());
        assert!(stats.identities.iter().all(|i| i.mean_position.is_none() && i.std_deviation.is_none()));
    }
}
