//! Candidate extractors.
//!
//! Each extractor scans a preprocessed frame with a different cue and returns
//! weighted candidate points. Extractors hold only immutable parameters, so
//! they are independent of each other and of the order they run in.

/// Shared connected-component and morphology helpers
pub mod components;

/// Global intensity cutoff
pub mod fixed_threshold;

/// Locally adaptive (Gaussian mean) threshold
pub mod adaptive_threshold;

/// Circular Hough transform
pub mod hough;

/// HSV value/saturation segmentation
pub mod color_plane;

/// Cutoff derived from the frame's intensity percentile
pub mod percentile;

use crate::config::ExtractionConfig;
use crate::preprocess::PreparedFrame;
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Names accepted by [`create_extractor`]
pub const EXTRACTOR_NAMES: [&str; 5] = [
    "fixed_threshold",
    "adaptive_threshold",
    "hough_circles",
    "color_plane",
    "percentile_threshold",
];

/// Which extraction method produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodTag {
    FixedThreshold,
    AdaptiveThreshold,
    HoughCircles,
    ColorPlane,
    PercentileThreshold,
}

impl MethodTag {
    /// Configuration name of the method
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::FixedThreshold => "fixed_threshold",
            Self::AdaptiveThreshold => "adaptive_threshold",
            Self::HoughCircles => "hough_circles",
            Self::ColorPlane => "color_plane",
            Self::PercentileThreshold => "percentile_threshold",
        }
    }
}

impl fmt::Display for MethodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single method's raw detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidatePoint {
    pub x: f64,
    pub y: f64,
    /// Always within [0, 1]
    pub confidence: f64,
    pub source: MethodTag,
}

impl CandidatePoint {
    /// Create a candidate, clamping the confidence into [0, 1]
    #[must_use]
    pub fn new(x: f64, y: f64, confidence: f64, source: MethodTag) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self {
            x,
            y,
            confidence,
            source,
        }
    }
}

/// Trait for all candidate extractors
pub trait CandidateExtractor: Send + Sync {
    /// Scan a prepared frame for marker candidates
    ///
    /// # Errors
    ///
    /// Returns an error if an `OpenCV` operation fails
    fn extract(&self, frame: &PreparedFrame) -> Result<Vec<CandidatePoint>>;

    /// Method tag attached to every candidate of this extractor
    fn method(&self) -> MethodTag;

    /// Get extractor name
    fn name(&self) -> &'static str {
        self.method().name()
    }
}

/// Create an extractor by name
///
/// # Errors
///
/// Returns `Error::ExtractorError` for an unknown name
pub fn create_extractor(name: &str, config: &ExtractionConfig) -> Result<Box<dyn CandidateExtractor>> {
    match name.to_lowercase().as_str() {
        "fixed_threshold" | "threshold" => Ok(Box::new(fixed_threshold::FixedThresholdExtractor::from_config(config))),
        "adaptive_threshold" | "adaptive" => Ok(Box::new(adaptive_threshold::AdaptiveThresholdExtractor::from_config(
            config,
        ))),
        "hough_circles" | "hough" => Ok(Box::new(hough::HoughCircleExtractor::from_config(config))),
        "color_plane" | "hsv" => Ok(Box::new(color_plane::ColorPlaneExtractor::from_config(config))),
        "percentile_threshold" | "percentile" => Ok(Box::new(percentile::PercentileThresholdExtractor::from_config(
            config,
        ))),
        _ => Err(Error::ExtractorError(format!("Unknown extractor: {name}"))),
    }
}

/// Create every extractor listed in the configuration, in order
///
/// # Errors
///
/// Returns `Error::ExtractorError` if any name is unknown
pub fn create_extractors(config: &ExtractionConfig) -> Result<Vec<Box<dyn CandidateExtractor>>> {
    config
        .extractors
        .iter()
        .map(|name| create_extractor(name, config))
        .collect()
}
