use super::{CandidateExtractor, CandidatePoint, MethodTag};
use crate::config::ExtractionConfig;
use crate::constants::CONFIDENCE_REFERENCE_INTENSITY;
use crate::extractors::components::morphology;
use crate::preprocess::PreparedFrame;
use crate::Result;
use opencv::core::{self, Mat, Point, Scalar, Vector, CV_8UC1};
use opencv::imgproc;
use opencv::prelude::*;

/// Bright, unsaturated regions in HSV space
///
/// IR markers saturate the sensor and appear white, so high value with low
/// saturation separates them from colored highlights.
#[derive(Debug, Clone)]
pub struct ColorPlaneExtractor {
    min_value: f64,
    max_saturation: f64,
    min_area: f64,
    max_area: f64,
    min_confidence: f64,
}

impl ColorPlaneExtractor {
    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_value: config.min_value,
            max_saturation: config.max_saturation,
            min_area: config.min_blob_area,
            max_area: config.max_blob_area,
            min_confidence: config.min_confidence,
        }
    }

    fn white_mask(&self, frame: &Mat) -> Result<Mat> {
        let mut hsv = Mat::default();
        if frame.channels() == 1 {
            let mut bgr = Mat::default();
            imgproc::cvt_color_def(frame, &mut bgr, imgproc::COLOR_GRAY2BGR)?;
            imgproc::cvt_color_def(&bgr, &mut hsv, imgproc::COLOR_BGR2HSV)?;
        } else {
            imgproc::cvt_color_def(frame, &mut hsv, imgproc::COLOR_BGR2HSV)?;
        }

        let mut mask = Mat::default();
        core::in_range(
            &hsv,
            &Scalar::new(0.0, 0.0, self.min_value, 0.0),
            &Scalar::new(180.0, self.max_saturation, 255.0, 0.0),
            &mut mask,
        )?;

        morphology(&mask, imgproc::MORPH_CLOSE, 1)
    }

    /// Region center: ellipse fit when possible, otherwise moment centroid
    fn region_center(contour: &Vector<Point>) -> Result<Option<(f64, f64)>> {
        if contour.len() >= 5 {
            let ellipse = imgproc::fit_ellipse(contour)?;
            return Ok(Some((f64::from(ellipse.center.x), f64::from(ellipse.center.y))));
        }
        let moments = imgproc::moments_def(contour)?;
        if moments.m00 <= 0.0 {
            return Ok(None);
        }
        Ok(Some((moments.m10 / moments.m00, moments.m01 / moments.m00)))
    }

    fn region_mean(gray: &Mat, contour: &Vector<Point>) -> Result<f64> {
        let mut region = Mat::new_rows_cols_with_default(gray.rows(), gray.cols(), CV_8UC1, Scalar::all(0.0))?;
        let polygons = Vector::<Vector<Point>>::from_iter([contour.clone()]);
        imgproc::fill_poly_def(&mut region, &polygons, Scalar::all(255.0))?;
        if core::count_non_zero(&region)? == 0 {
            return Ok(0.0);
        }
        Ok(core::mean(gray, &region)?[0])
    }
}

impl CandidateExtractor for ColorPlaneExtractor {
    fn extract(&self, frame: &PreparedFrame) -> Result<Vec<CandidatePoint>> {
        let mask = self.white_mask(&frame.frame)?;

        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours_def(&mask, &mut contours, imgproc::RETR_EXTERNAL, imgproc::CHAIN_APPROX_SIMPLE)?;

        let mut candidates = Vec::new();
        for contour in contours.iter() {
            let area = imgproc::contour_area_def(&contour)?;
            if area <= self.min_area || area >= self.max_area {
                continue;
            }

            let Some((x, y)) = Self::region_center(&contour)? else {
                continue;
            };

            let confidence = (Self::region_mean(&frame.gray, &contour)? / CONFIDENCE_REFERENCE_INTENSITY).min(1.0);
            if confidence > self.min_confidence {
                candidates.push(CandidatePoint::new(x, y, confidence, self.method()));
            }
        }

        Ok(candidates)
    }

    fn method(&self) -> MethodTag {
        MethodTag::ColorPlane
    }
}
