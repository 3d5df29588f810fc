//! Annotation of frames with tracking results.

use crate::constants::MARKER_COUNT;
use crate::detector::FrameResult;
use crate::utils::pixel_point;
use crate::Result;
use opencv::core::{Mat, Point, Scalar};
use opencv::imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8};
use opencv::prelude::*;

/// Per-identity BGR colors
const IDENTITY_COLORS: [(f64, f64, f64); MARKER_COUNT] = [(255.0, 0.0, 0.0), (0.0, 255.0, 0.0), (0.0, 0.0, 255.0)];

fn identity_color(id: usize) -> Scalar {
    let (b, g, r) = IDENTITY_COLORS[id % MARKER_COUNT];
    Scalar::new(b, g, r, 0.0)
}

/// Return a BGR copy of the frame with markers and status drawn on it
///
/// # Errors
///
/// Returns an error if an `OpenCV` drawing call fails
pub fn draw_overlay(frame: &Mat, result: &FrameResult) -> Result<Mat> {
    let mut canvas = if frame.channels() == 1 {
        let mut bgr = Mat::default();
        imgproc::cvt_color_def(frame, &mut bgr, imgproc::COLOR_GRAY2BGR)?;
        bgr
    } else {
        frame.try_clone()?
    };
    let (width, height) = (canvas.cols(), canvas.rows());

    for detection in &result.detections {
        let color = identity_color(detection.id);
        let center = pixel_point(detection.x, detection.y, width, height);
        imgproc::circle(&mut canvas, center, 5, color, -1, LINE_8, 0)?;
        imgproc::circle(&mut canvas, center, 8, color, 2, LINE_8, 0)?;
        imgproc::put_text(
            &mut canvas,
            &format!("M{}", detection.id + 1),
            Point::new(center.x + 10, center.y),
            FONT_HERSHEY_SIMPLEX,
            0.5,
            color,
            1,
            LINE_8,
            false,
        )?;
    }

    // Predicted positions as hollow rings
    for extrapolation in &result.extrapolated {
        let center = pixel_point(extrapolation.x, extrapolation.y, width, height);
        imgproc::circle(&mut canvas, center, 8, identity_color(extrapolation.id), 1, LINE_8, 0)?;
    }

    let (label, status_color) = if result.success {
        ("OK", Scalar::new(0.0, 255.0, 0.0, 0.0))
    } else {
        ("FAIL", Scalar::new(0.0, 0.0, 255.0, 0.0))
    };
    imgproc::put_text(
        &mut canvas,
        &format!("{label}: {}/{MARKER_COUNT}", result.detections.len()),
        Point::new(10, 30),
        FONT_HERSHEY_SIMPLEX,
        0.7,
        status_color,
        2,
        LINE_8,
        false,
    )?;

    if result.geometry_error.is_finite() {
        imgproc::put_text(
            &mut canvas,
            &format!(
                "collinearity {:.2}px  ratio {:.3}",
                result.geometry_error, result.spacing_ratio
            ),
            Point::new(10, 55),
            FONT_HERSHEY_SIMPLEX,
            0.5,
            Scalar::new(0.0, 255.0, 255.0, 0.0),
            1,
            LINE_8,
            false,
        )?;
    }

    Ok(canvas)
}
