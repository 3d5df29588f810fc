//! Outlier rejection and run statistics

mod test_helpers;

use ir_marker_tracker::{
    config::DetectionMode,
    detector::MarkerDetector,
    outlier_filter::OutlierFilter,
    statistics::{IdentityStatistics, Statistics, Trajectory},
    Result,
};
use test_helpers::{config_with_mode, fused_triplet};

/// Small deterministic wobble around zero
fn wobble(frame: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let step = (frame % 5) as f64;
    step * 0.5
}

/// One far sample among a hundred steady ones is rejected and does not skew
/// the statistics
#[test]
fn test_single_outlier_is_rejected() {
    let mut trajectory = Trajectory::new(0);
    for frame in 0..100 {
        trajectory.push(100.0 + wobble(frame), 200.0 - wobble(frame));
    }
    trajectory.push(5000.0, 5000.0);

    let stats = IdentityStatistics::from_trajectory(&trajectory, &OutlierFilter::new(3.0));

    assert_eq!(stats.detected_frames, 100);
    assert_eq!(stats.rejected_outliers, 1);
    let (mx, my) = stats.mean_position.unwrap_or((f64::NAN, f64::NAN));
    assert!((mx - 101.0).abs() < 1e-9);
    assert!((my - 199.0).abs() < 1e-9);
    assert!(stats.std_deviation.is_some_and(|std| std < 2.0));
}

/// A stricter multiplier never keeps more samples than a looser one
#[test]
fn test_multiplier_is_monotonic() {
    let samples: Vec<(f64, f64)> = (0..40)
        .map(|i| {
            let x = f64::from(i);
            (x * x * 0.1, 10.0 + x)
        })
        .collect();

    let mut previous = usize::MAX;
    for multiplier in [3.0, 1.5, 0.5, 0.0] {
        let kept = OutlierFilter::new(multiplier).filter(&samples).inliers.len();
        assert!(kept <= previous, "Multiplier {multiplier} kept {kept} > {previous}");
        previous = kept;
    }
}

/// The detector's run statistics ignore a single wild frame
#[test]
fn test_run_statistics_with_outlier_frame() -> Result<()> {
    let mut config = config_with_mode(DetectionMode::Fusion);
    config.smoothing.filter = "none".to_string();
    let mut detector = MarkerDetector::new(config)?;

    for frame in 0..100 {
        if frame == 50 {
            detector.process_candidates(fused_triplet(5000.0, 5000.0, 100.0))?;
        }
        detector.process_candidates(fused_triplet(100.0 + wobble(frame), 300.0, 100.0))?;
    }

    let stats = detector.statistics();
    assert_eq!(stats.total_frames, 101);
    assert_eq!(stats.successful_frames, 101);
    assert_eq!(stats.identities.len(), 3);

    for identity in &stats.identities {
        assert_eq!(identity.rejected_outliers, 1, "Identity {}", identity.id);
        assert_eq!(identity.detected_frames, 100);

        let expected_x = 101.0 + 100.0 * f64::from(u32::try_from(identity.id).unwrap_or(0));
        let (mx, my) = identity.mean_position.unwrap_or((f64::NAN, f64::NAN));
        assert!((mx - expected_x).abs() < 1e-9, "Identity {} mean x {mx}", identity.id);
        assert!((my - 300.0).abs() < 1e-9);
    }

    Ok(())
}

/// Frames without a triplet count toward the rate but not the trajectories
#[test]
fn test_success_rate() -> Result<()> {
    let mut detector = MarkerDetector::new(config_with_mode(DetectionMode::Strict))?;
    for frame in 0..8 {
        if frame % 4 == 3 {
            detector.process_candidates(Vec::new())?;
        } else {
            detector.process_candidates(fused_triplet(100.0, 300.0, 100.0))?;
        }
    }

    let stats = detector.statistics();
    assert_eq!(stats.total_frames, 8);
    assert_eq!(stats.successful_frames, 6);
    assert!((stats.success_rate - 0.75).abs() < 1e-12);
    assert_eq!(detector.trajectories()[1].len(), 6);

    let geometry = stats.geometry.ok_or_else(|| ir_marker_tracker::Error::InvalidInput("missing geometry".into()))?;
    assert!(geometry.collinearity_max < 1e-9);
    assert!((geometry.spacing_ratio_mean - 1.0).abs() < 1e-9);

    Ok(())
}

/// An empty run has a zero rate and no positions
#[test]
fn test_empty_run() -> Result<()> {
    let detector = MarkerDetector::new(config_with_mode(DetectionMode::Fusion))?;
    let stats = detector.statistics();

    assert_eq!(stats.total_frames, 0);
    assert_eq!(stats.success_rate, 0.0);
    assert!(stats.geometry.is_none());
    assert!(stats.identities.iter().all(|identity| identity.mean_position.is_none()));

    Ok(())
}

/// Basic descriptive statistics
#[test]
fn test_descriptive_statistics() {
    let stats = Statistics::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
    let stats = stats.unwrap_or_else(|| panic!("non-empty input"));
    assert!((stats.mean - 5.0).abs() < 1e-12);
    assert!((stats.std_dev - 2.0).abs() < 1e-12);
    assert_eq!(stats.range, 7.0);
    assert!(Statistics::from_values(&[]).is_none());
}
