//! Helper functions and utilities for tests
#![allow(dead_code)]

use ir_marker_tracker::{
    config::{Config, DetectionMode},
    fusion::FusedPoint,
    Result,
};
use opencv::{
    core::{Mat, Point, Scalar, CV_8UC3},
    imgproc,
    prelude::*,
};

/// Default frame width of synthetic frames
pub const FRAME_WIDTH: i32 = 640;

/// Default frame height of synthetic frames
pub const FRAME_HEIGHT: i32 = 480;

/// Radius of a synthetic marker
pub const MARKER_RADIUS: i32 = 6;

/// Create a dark BGR frame with a bright disk at every marker position
pub fn marker_frame(markers: &[(i32, i32)]) -> Result<Mat> {
    let mut frame =
        Mat::new_rows_cols_with_default(FRAME_HEIGHT, FRAME_WIDTH, CV_8UC3, Scalar::all(0.0))?;
    for &(x, y) in markers {
        imgproc::circle(
            &mut frame,
            Point::new(x, y),
            MARKER_RADIUS,
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;
    }
    Ok(frame)
}

/// Create a uniformly filled BGR frame
pub fn uniform_frame(value: f64) -> Result<Mat> {
    Ok(Mat::new_rows_cols_with_default(
        FRAME_HEIGHT,
        FRAME_WIDTH,
        CV_8UC3,
        Scalar::all(value),
    )?)
}

/// Horizontal marker triplet with 100 px spacing
pub fn horizontal_triplet(left: i32, y: i32) -> [(i32, i32); 3] {
    [(left, y), (left + 100, y), (left + 200, y)]
}

/// Fused candidates of a horizontal triplet
pub fn fused_triplet(left: f64, y: f64, spacing: f64) -> Vec<FusedPoint> {
    (0..3)
        .map(|i| FusedPoint::new(left + spacing * f64::from(i), y, 0.9))
        .collect()
}

/// Configuration with the given mode and no preview window
pub fn config_with_mode(mode: DetectionMode) -> Config {
    let mut config = Config::default();
    config.geometry.mode = mode;
    config
}

/// Assert that a position lies within `tolerance` pixels of the expected one
pub fn assert_near(actual: (f64, f64), expected: (f64, f64), tolerance: f64) {
    let distance = (actual.0 - expected.0).hypot(actual.1 - expected.1);
    assert!(
        distance <= tolerance,
        "Position ({:.2}, {:.2}) is {distance:.2} px from ({:.2}, {:.2})",
        actual.0,
        actual.1,
        expected.0,
        expected.1
    );
}
