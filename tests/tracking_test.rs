//! Identity tracking and motion smoothing across frames

mod test_helpers;

use ir_marker_tracker::{
    config::{DetectionMode, SmoothingConfig},
    detector::MarkerDetector,
    filters::create_filter,
    fusion::FusedPoint,
    smoother::MotionSmoother,
    tracker::IdentityTracker,
    Result,
};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use test_helpers::{assert_near, config_with_mode, fused_triplet};

/// Identities stay attached to their markers when the candidate order shuffles
#[test]
fn test_identity_survives_reordering() {
    let mut tracker = IdentityTracker::new(150.0);
    tracker.associate(&fused_triplet(100.0, 200.0, 300.0));

    let shuffled = vec![
        FusedPoint::new(705.0, 203.0, 0.9),
        FusedPoint::new(103.0, 198.0, 0.9),
        FusedPoint::new(402.0, 201.0, 0.9),
    ];
    let assignments = tracker.associate(&shuffled);

    let xs: Vec<(usize, f64)> = assignments.iter().map(|a| (a.id, a.point.x)).collect();
    assert_eq!(xs, vec![(0, 103.0), (1, 402.0), (2, 705.0)]);
}

/// Jumps beyond the limit re-seed a stale identity instead of matching
#[test]
fn test_large_jump_reseeds() {
    let mut tracker = IdentityTracker::new(150.0);
    tracker.associate(&fused_triplet(100.0, 200.0, 300.0));

    // Marker 2 vanished, marker 0 moved far away
    let assignments = tracker.associate(&[FusedPoint::new(400.0, 200.0, 0.9), FusedPoint::new(1000.0, 600.0, 0.9)]);

    assert_eq!(assignments.len(), 2);
    assert_eq!(assignments[0].id, 0);
    assert_eq!(assignments[0].point.x, 1000.0);
    assert_eq!(assignments[1].id, 1);
    assert_eq!(tracker.slots()[2].last_position, Some((700.0, 200.0)));
}

/// No two assignments in a frame share an identity
#[test]
fn test_assignments_are_unique() {
    let mut tracker = IdentityTracker::new(150.0);
    let mut rng = StdRng::seed_from_u64(3);
    let jitter = Normal::new(0.0, 20.0).unwrap();

    for _ in 0..50 {
        let points: Vec<FusedPoint> = (0..3)
            .map(|i| {
                FusedPoint::new(
                    200.0 + 60.0 * f64::from(i) + jitter.sample(&mut rng),
                    240.0 + jitter.sample(&mut rng),
                    0.8,
                )
            })
            .collect();
        let assignments = tracker.associate(&points);

        assert_eq!(assignments.len(), 3);
        let mut ids: Vec<usize> = assignments.iter().map(|a| a.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3, "Duplicate identity in {ids:?}");
    }
}

/// The Kalman smoother reduces measurement noise on constant velocity motion
#[test]
fn test_kalman_reduces_noise() -> Result<()> {
    let mut smoother = MotionSmoother::new(&SmoothingConfig::default())?;
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 3.0).unwrap();

    let mut raw_error = 0.0;
    let mut filtered_error = 0.0;
    for t in 0..60 {
        let truth = (100.0 + 2.0 * f64::from(t), 50.0 + f64::from(t));
        let measured = (truth.0 + noise.sample(&mut rng), truth.1 + noise.sample(&mut rng));
        let filtered = smoother.smooth(0, measured.0, measured.1)?;

        // Skip the settling period
        if t >= 10 {
            raw_error += (measured.0 - truth.0).powi(2) + (measured.1 - truth.1).powi(2);
            filtered_error += (filtered.0 - truth.0).powi(2) + (filtered.1 - truth.1).powi(2);
        }
    }

    assert!(
        filtered_error < raw_error,
        "Filtered error {filtered_error:.1} should be below raw error {raw_error:.1}"
    );

    Ok(())
}

/// A noiseless constant velocity track is followed exactly once converged
#[test]
fn test_kalman_converges_on_clean_motion() -> Result<()> {
    let mut filter = create_filter("kalman", 1.0, 5.0)?;

    let mut last = (0.0, 0.0);
    for t in 0..40 {
        last = filter.apply(100.0 + 2.0 * f64::from(t), 50.0 + f64::from(t));
    }
    assert_near(last, (178.0, 89.0), 0.05);

    let predicted = filter.predict().unwrap_or((f64::NAN, f64::NAN));
    assert_near(predicted, (180.0, 90.0), 0.1);

    Ok(())
}

/// Missing markers are extrapolated from their motion when requested
#[test]
fn test_missing_marker_is_extrapolated() -> Result<()> {
    let mut config = config_with_mode(DetectionMode::Fusion);
    config.smoothing.emit_predictions = true;
    let mut detector = MarkerDetector::new(config)?;

    for t in 0..30 {
        detector.process_candidates(fused_triplet(100.0 + 2.0 * f64::from(t), 240.0, 100.0))?;
    }
    let result = detector.process_candidates(fused_triplet(160.0, 240.0, 100.0)[..2].to_vec())?;

    assert!(!result.success);
    assert_eq!(result.extrapolated.len(), 1);
    let extrapolation = result.extrapolated[0];
    assert_eq!(extrapolation.id, 2);
    assert_near((extrapolation.x, extrapolation.y), (360.0, 240.0), 1.0);

    Ok(())
}

/// Predictions stay internal by default
#[test]
fn test_predictions_hidden_by_default() -> Result<()> {
    let mut detector = MarkerDetector::new(config_with_mode(DetectionMode::Fusion))?;
    detector.process_candidates(fused_triplet(100.0, 240.0, 100.0))?;
    let result = detector.process_candidates(Vec::new())?;

    assert!(result.extrapolated.is_empty());
    assert!(result.detections.is_empty());

    Ok(())
}

/// An identity re-seeded onto a far marker restarts from the raw position
#[test]
fn test_reseeded_identity_reports_raw_position() -> Result<()> {
    let mut detector = MarkerDetector::new(config_with_mode(DetectionMode::Fusion))?;
    for _ in 0..20 {
        detector.process_candidates(fused_triplet(100.0, 200.0, 300.0))?;
    }

    // Marker 0 is lost and a new point appears out of its reach
    let result = detector.process_candidates(vec![
        FusedPoint::new(400.0, 200.0, 0.9),
        FusedPoint::new(700.0, 200.0, 0.9),
        FusedPoint::new(1000.0, 600.0, 0.9),
    ])?;

    assert!(result.success);
    let reseeded = result.detection(0).map(|d| (d.x, d.y));
    assert_eq!(reseeded, Some((1000.0, 600.0)));
    assert_near(result.detection(1).map_or((f64::NAN, f64::NAN), |d| (d.x, d.y)), (400.0, 200.0), 0.5);
    assert_near(result.detection(2).map_or((f64::NAN, f64::NAN), |d| (d.x, d.y)), (700.0, 200.0), 0.5);

    // The restarted track is smoothed from its new position on
    let result = detector.process_candidates(vec![
        FusedPoint::new(400.0, 200.0, 0.9),
        FusedPoint::new(700.0, 200.0, 0.9),
        FusedPoint::new(1004.0, 600.0, 0.9),
    ])?;
    let x = result.detection(0).map_or(f64::NAN, |d| d.x);
    assert!(x > 1000.0 && x < 1004.0, "Restarted track at {x}");

    Ok(())
}
