use super::components::bbox_candidates;
use super::{CandidateExtractor, CandidatePoint, MethodTag};
use crate::config::ExtractionConfig;
use crate::preprocess::PreparedFrame;
use crate::Result;
use opencv::core::Mat;
use opencv::imgproc;

/// Blobs brighter than their Gaussian-weighted neighbourhood
///
/// Works on the smoothed image, so it tolerates uneven illumination that
/// defeats a single global cutoff.
#[derive(Debug, Clone)]
pub struct AdaptiveThresholdExtractor {
    block_size: i32,
    c: f64,
    min_area: f64,
    max_area: f64,
}

impl AdaptiveThresholdExtractor {
    #[must_use]
    pub fn new(block_size: i32, c: f64, min_area: f64, max_area: f64) -> Self {
        Self {
            block_size,
            c,
            min_area,
            max_area,
        }
    }

    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.adaptive_block_size,
            config.adaptive_c,
            config.min_blob_area,
            config.max_blob_area,
        )
    }
}

impl CandidateExtractor for AdaptiveThresholdExtractor {
    fn extract(&self, frame: &PreparedFrame) -> Result<Vec<CandidatePoint>> {
        let mut binary = Mat::default();
        imgproc::adaptive_threshold(
            &frame.filtered,
            &mut binary,
            255.0,
            imgproc::ADAPTIVE_THRESH_GAUSSIAN_C,
            imgproc::THRESH_BINARY,
            self.block_size,
            self.c,
        )?;

        bbox_candidates(&binary, self.min_area, self.max_area, self.method())
    }

    fn method(&self) -> MethodTag {
        MethodTag::AdaptiveThreshold
    }
}
