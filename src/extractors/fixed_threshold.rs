use super::components::{bbox_candidates, morphology};
use super::{CandidateExtractor, CandidatePoint, MethodTag};
use crate::config::ExtractionConfig;
use crate::preprocess::PreparedFrame;
use crate::Result;
use opencv::core::Mat;
use opencv::imgproc;

/// Bright blobs above a global intensity cutoff
#[derive(Debug, Clone)]
pub struct FixedThresholdExtractor {
    threshold: f64,
    min_area: f64,
    max_area: f64,
}

impl FixedThresholdExtractor {
    #[must_use]
    pub fn new(threshold: f64, min_area: f64, max_area: f64) -> Self {
        Self {
            threshold,
            min_area,
            max_area,
        }
    }

    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.fixed_threshold, config.min_blob_area, config.max_blob_area)
    }
}

impl CandidateExtractor for FixedThresholdExtractor {
    fn extract(&self, frame: &PreparedFrame) -> Result<Vec<CandidatePoint>> {
        let mut binary = Mat::default();
        imgproc::threshold(&frame.gray, &mut binary, self.threshold, 255.0, imgproc::THRESH_BINARY)?;

        let closed = morphology(&binary, imgproc::MORPH_CLOSE, 2)?;
        bbox_candidates(&closed, self.min_area, self.max_area, self.method())
    }

    fn method(&self) -> MethodTag {
        MethodTag::FixedThreshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::Preprocessor;
    use opencv::core::{Point, Scalar, CV_8UC1};

    #[test]
    fn test_detects_bright_disk() {
        let mut frame = Mat::new_rows_cols_with_default(120, 160, CV_8UC1, Scalar::all(20.0)).unwrap();
        imgproc::circle(&mut frame, Point::new(80, 60), 6, Scalar::all(255.0), -1, imgproc::LINE_8, 0).unwrap();
        let prepared = Preprocessor::new().prepare(&frame).unwrap();

        let candidates = FixedThresholdExtractor::from_config(&ExtractionConfig::default())
            .extract(&prepared)
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].x - 80.5).abs() <= 1.0);
        assert!((candidates[0].y - 60.5).abs() <= 1.0);
        // A filled disk covers about pi/4 of its bounding box
        assert!(candidates[0].confidence > 0.6 && candidates[0].confidence <= 1.0);
    }

    #[test]
    fn test_ignores_dim_frame() {
        let frame = Mat::new_rows_cols_with_default(60, 60, CV_8UC1, Scalar::all(150.0)).unwrap();
        let prepared = Preprocessor::new().prepare(&frame).unwrap();
        let candidates = FixedThresholdExtractor::new(200.0, 20.0, 500.0).extract(&prepared).unwrap();
        assert!(candidates.is_empty());
    }
}
