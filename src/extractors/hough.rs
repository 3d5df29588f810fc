use super::{CandidateExtractor, CandidatePoint, MethodTag};
use crate::config::ExtractionConfig;
use crate::constants::CONFIDENCE_REFERENCE_INTENSITY;
use crate::preprocess::PreparedFrame;
use crate::utils::safe_cast::f64_to_i32;
use crate::Result;
use log::trace;
use opencv::core::{self, Mat, Point, Scalar, Vec3f, Vector, CV_8UC1};
use opencv::imgproc;
use opencv::prelude::*;
use std::f64::consts::PI;

/// Circular shapes found by the gradient Hough transform
#[derive(Debug, Clone)]
pub struct HoughCircleExtractor {
    min_radius: i32,
    max_radius: i32,
    min_distance: f64,
    canny_threshold: f64,
    accumulator_threshold: f64,
    min_area: f64,
    max_area: f64,
    min_confidence: f64,
}

impl HoughCircleExtractor {
    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_radius: config.hough_min_radius,
            max_radius: config.hough_max_radius,
            min_distance: config.hough_min_distance,
            canny_threshold: config.hough_canny_threshold,
            accumulator_threshold: config.hough_accumulator_threshold,
            min_area: config.min_blob_area,
            max_area: config.max_blob_area,
            min_confidence: config.min_confidence,
        }
    }

    /// Mean intensity inside a filled disk, `None` if the disk covers no pixel
    fn disk_mean(gray: &Mat, center: Point, radius: i32) -> Result<Option<f64>> {
        let mut mask = Mat::new_rows_cols_with_default(gray.rows(), gray.cols(), CV_8UC1, Scalar::all(0.0))?;
        imgproc::circle(&mut mask, center, radius, Scalar::all(255.0), -1, imgproc::LINE_8, 0)?;
        if core::count_non_zero(&mask)? == 0 {
            return Ok(None);
        }
        Ok(Some(core::mean(gray, &mask)?[0]))
    }
}

impl CandidateExtractor for HoughCircleExtractor {
    fn extract(&self, frame: &PreparedFrame) -> Result<Vec<CandidatePoint>> {
        let mut circles = Vector::<Vec3f>::new();
        imgproc::hough_circles(
            &frame.filtered,
            &mut circles,
            imgproc::HOUGH_GRADIENT,
            1.0,
            self.min_distance,
            self.canny_threshold,
            self.accumulator_threshold,
            self.min_radius,
            self.max_radius,
        )?;

        let mut candidates = Vec::with_capacity(circles.len());
        for circle in circles.iter() {
            let x = f64::from(circle[0]).round();
            let y = f64::from(circle[1]).round();
            let radius = f64::from(circle[2]).round();

            let area = PI * radius * radius;
            if area <= self.min_area || area >= self.max_area {
                continue;
            }

            let center = Point::new(f64_to_i32(x)?, f64_to_i32(y)?);
            let Some(mean) = Self::disk_mean(&frame.gray, center, f64_to_i32(radius)?)? else {
                continue;
            };

            let confidence = (mean / CONFIDENCE_REFERENCE_INTENSITY).min(1.0);
            if confidence > self.min_confidence {
                candidates.push(CandidatePoint::new(x, y, confidence, self.method()));
            } else {
                trace!("Hough circle at ({x}, {y}) r={radius} rejected, confidence {confidence:.2}");
            }
        }

        Ok(candidates)
    }

    fn method(&self) -> MethodTag {
        MethodTag::HoughCircles
    }
}
