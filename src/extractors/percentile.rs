use super::components::{connected_blobs, mean_label_intensity, morphology};
use super::{CandidateExtractor, CandidatePoint, MethodTag};
use crate::config::ExtractionConfig;
use crate::preprocess::PreparedFrame;
use crate::Result;
use opencv::core::Mat;
use opencv::imgproc;
use opencv::prelude::*;

/// Blobs above a cutoff derived from the frame's own brightness
///
/// The cutoff is the configured intensity percentile of the grayscale frame,
/// but never below the floor, so a dark frame does not turn noise into blobs.
#[derive(Debug, Clone)]
pub struct PercentileThresholdExtractor {
    percentile: f64,
    floor: f64,
    min_area: f64,
    max_area: f64,
}

impl PercentileThresholdExtractor {
    #[must_use]
    pub fn new(percentile: f64, floor: f64, min_area: f64, max_area: f64) -> Self {
        Self {
            percentile,
            floor,
            min_area,
            max_area,
        }
    }

    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.intensity_percentile,
            config.percentile_floor,
            config.min_blob_area,
            config.max_blob_area,
        )
    }

    /// Binarization cutoff for a grayscale frame
    ///
    /// # Errors
    ///
    /// Returns an error if the pixel data cannot be read
    pub fn cutoff(&self, gray: &Mat) -> Result<f64> {
        Ok(intensity_percentile(gray, self.percentile)?.max(self.floor))
    }
}

/// Percentile of an 8-bit image with linear interpolation between ranks
fn intensity_percentile(gray: &Mat, percentile: f64) -> Result<f64> {
    let owned;
    let bytes = if gray.is_continuous() {
        gray.data_bytes()?
    } else {
        owned = gray.try_clone()?;
        owned.data_bytes()?
    };
    if bytes.is_empty() {
        return Ok(0.0);
    }

    let mut histogram = [0usize; 256];
    for &value in bytes {
        histogram[usize::from(value)] += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let rank = percentile.clamp(0.0, 100.0) / 100.0 * (bytes.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (lower_rank, upper_rank) = (rank.floor() as usize, rank.ceil() as usize);

    let value_at = |target: usize| -> f64 {
        let mut seen = 0;
        for (value, &count) in histogram.iter().enumerate() {
            seen += count;
            if seen > target {
                #[allow(clippy::cast_precision_loss)]
                return value as f64;
            }
        }
        255.0
    };

    let lower = value_at(lower_rank);
    let upper = value_at(upper_rank);
    #[allow(clippy::cast_precision_loss)]
    let fraction = rank - lower_rank as f64;
    Ok(lower + (upper - lower) * fraction)
}

impl CandidateExtractor for PercentileThresholdExtractor {
    fn extract(&self, frame: &PreparedFrame) -> Result<Vec<CandidatePoint>> {
        let cutoff = self.cutoff(&frame.gray)?;

        let mut binary = Mat::default();
        imgproc::threshold(&frame.gray, &mut binary, cutoff, 255.0, imgproc::THRESH_BINARY)?;
        let closed = morphology(&binary, imgproc::MORPH_CLOSE, 2)?;
        let cleaned = morphology(&closed, imgproc::MORPH_OPEN, 1)?;

        let components = connected_blobs(&cleaned)?;
        let mut candidates = Vec::new();
        for blob in components.blobs.iter().filter(|b| b.area_within(self.min_area, self.max_area)) {
            let mean = mean_label_intensity(&frame.gray, &components.labels, blob)?;
            let (x, y) = blob.centroid;
            candidates.push(CandidatePoint::new(x, y, mean / 255.0, self.method()));
        }

        Ok(candidates)
    }

    fn method(&self) -> MethodTag {
        MethodTag::PercentileThreshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::Preprocessor;
    use opencv::core::{Point, Rect, Scalar, CV_8UC1};

    #[test]
    fn test_intensity_percentile() {
        // 100 pixels valued 0..=99
        let mut gray = Mat::new_rows_cols_with_default(10, 10, CV_8UC1, Scalar::all(0.0)).unwrap();
        for i in 0..100 {
            *gray.at_2d_mut::<u8>(i / 10, i % 10).unwrap() = u8::try_from(i).unwrap();
        }
        assert!((intensity_percentile(&gray, 50.0).unwrap() - 49.5).abs() < 1e-9);
        assert!((intensity_percentile(&gray, 95.0).unwrap() - 94.05).abs() < 1e-9);
        assert_eq!(intensity_percentile(&gray, 0.0).unwrap(), 0.0);
        assert_eq!(intensity_percentile(&gray, 100.0).unwrap(), 99.0);
    }

    #[test]
    fn test_cutoff_respects_floor() {
        let gray = Mat::new_rows_cols_with_default(20, 20, CV_8UC1, Scalar::all(30.0)).unwrap();
        let extractor = PercentileThresholdExtractor::new(95.0, 100.0, 20.0, 500.0);
        assert_eq!(extractor.cutoff(&gray).unwrap(), 100.0);
    }

    #[test]
    fn test_detects_blob_with_centroid() {
        let mut frame = Mat::new_rows_cols_with_default(100, 100, CV_8UC1, Scalar::all(10.0)).unwrap();
        imgproc::rectangle(&mut frame, Rect::new(40, 30, 8, 8), Scalar::all(250.0), -1, imgproc::LINE_8, 0).unwrap();
        let prepared = Preprocessor::new().prepare(&frame).unwrap();

        let candidates = PercentileThresholdExtractor::from_config(&ExtractionConfig::default())
            .extract(&prepared)
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].x - 43.5).abs() < 1e-9);
        assert!((candidates[0].y - 33.5).abs() < 1e-9);
        assert!((candidates[0].confidence - 250.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_dark_frame_yields_nothing() {
        let mut frame = Mat::new_rows_cols_with_default(60, 60, CV_8UC1, Scalar::all(0.0)).unwrap();
        imgproc::circle(&mut frame, Point::new(30, 30), 4, Scalar::all(60.0), -1, imgproc::LINE_8, 0).unwrap();
        let prepared = Preprocessor::new().prepare(&frame).unwrap();
        let candidates = PercentileThresholdExtractor::from_config(&ExtractionConfig::default())
            .extract(&prepared)
            .unwrap();
        assert!(candidates.is_empty());
    }
}
