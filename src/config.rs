//! Configuration management for the marker tracker

use crate::constants::{
    DEFAULT_ADAPTIVE_BLOCK_SIZE, DEFAULT_ADAPTIVE_C, DEFAULT_CLUSTER_MERGE_RADIUS, DEFAULT_COLLINEARITY_TOLERANCE,
    DEFAULT_FIXED_THRESHOLD, DEFAULT_FPS, DEFAULT_HOUGH_ACCUMULATOR_THRESHOLD, DEFAULT_HOUGH_CANNY_THRESHOLD,
    DEFAULT_HOUGH_MAX_RADIUS, DEFAULT_HOUGH_MIN_DISTANCE, DEFAULT_HOUGH_MIN_RADIUS, DEFAULT_INTENSITY_PERCENTILE,
    DEFAULT_IQR_MULTIPLIER, DEFAULT_KALMAN_MEASUREMENT_NOISE, DEFAULT_KALMAN_PROCESS_NOISE, DEFAULT_MAX_BLOB_AREA,
    DEFAULT_MAX_IDENTITY_JUMP, DEFAULT_MAX_MARKER_DISTANCE, DEFAULT_MAX_SATURATION, DEFAULT_MIN_BLOB_AREA,
    DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_MARKER_DISTANCE, DEFAULT_MIN_VALUE, DEFAULT_PERCENTILE_FLOOR,
    DEFAULT_SPACING_TOLERANCE, MARKER_COUNT,
};
use crate::extractors::EXTRACTOR_NAMES;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tracker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Candidate extraction configuration
    pub extraction: ExtractionConfig,

    /// Candidate fusion configuration
    pub fusion: FusionConfig,

    /// Pattern geometry configuration
    pub geometry: GeometryConfig,

    /// Identity tracking configuration
    pub tracking: TrackingConfig,

    /// Motion smoothing configuration
    pub smoothing: SmoothingConfig,

    /// Aggregate statistics configuration
    pub statistics: StatisticsConfig,

    /// Output configuration for the application
    pub output: OutputConfig,
}

/// Candidate extractor parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Extractors to run, by name, in this order
    pub extractors: Vec<String>,

    /// Minimum blob area in pixels (exclusive)
    pub min_blob_area: f64,

    /// Maximum blob area in pixels (exclusive)
    pub max_blob_area: f64,

    /// Global intensity cutoff of the fixed threshold extractor
    pub fixed_threshold: f64,

    /// Neighbourhood size of the adaptive threshold (odd)
    pub adaptive_block_size: i32,

    /// Constant subtracted from the local mean
    pub adaptive_c: f64,

    /// Smallest circle radius searched by the Hough extractor
    pub hough_min_radius: i32,

    /// Largest circle radius searched by the Hough extractor
    pub hough_max_radius: i32,

    /// Minimum distance between detected circle centers
    pub hough_min_distance: f64,

    /// Upper Canny threshold of the Hough gradient method
    pub hough_canny_threshold: f64,

    /// Accumulator threshold of the Hough gradient method
    pub hough_accumulator_threshold: f64,

    /// Minimum HSV value of a marker pixel
    pub min_value: f64,

    /// Maximum HSV saturation of a marker pixel
    pub max_saturation: f64,

    /// Intensity percentile used by the percentile extractor
    pub intensity_percentile: f64,

    /// Lower bound of the percentile cutoff
    pub percentile_floor: f64,

    /// Confidence floor of the Hough and color plane extractors
    pub min_confidence: f64,
}

/// Fusion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Radius in pixels within which candidates are merged
    pub cluster_merge_radius: f64,

    /// Number of markers in the pattern
    pub expected_marker_count: usize,
}

/// Detection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Track the strongest fused candidates
    Fusion,
    /// Track only a geometrically validated triplet
    Strict,
}

/// Pattern geometry parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Detection mode
    pub mode: DetectionMode,

    /// Maximum perpendicular offset of the middle marker in pixels
    pub collinearity_tolerance: f64,

    /// Allowed deviation of the spacing ratio from 1.0
    pub spacing_tolerance: f64,

    /// Minimum distance between neighbouring markers in pixels
    pub min_marker_distance: f64,

    /// Maximum distance between neighbouring markers in pixels
    pub max_marker_distance: f64,
}

/// Identity tracking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Largest displacement between frames accepted as the same identity
    pub max_identity_jump: f64,
}

/// Motion smoothing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter type (`kalman` or `none`)
    pub filter: String,

    /// Process noise scale
    pub kalman_process_noise: f64,

    /// Measurement noise scale
    pub kalman_measurement_noise: f64,

    /// Report predicted positions of unmatched identities
    pub emit_predictions: bool,
}

/// Aggregate statistics parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// IQR multiplier of the outlier fences
    pub iqr_multiplier: f64,
}

/// Application output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory for reports and frames
    pub directory: PathBuf,

    /// Frame rate used when the source does not report one
    pub fallback_fps: f64,

    /// Write every annotated frame as an image
    pub save_frames: bool,

    /// Show a preview window
    pub display: bool,

    /// Optional annotated video output path
    pub overlay_video: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            extractors: vec![
                "fixed_threshold".to_string(),
                "adaptive_threshold".to_string(),
                "hough_circles".to_string(),
                "color_plane".to_string(),
            ],
            min_blob_area: DEFAULT_MIN_BLOB_AREA,
            max_blob_area: DEFAULT_MAX_BLOB_AREA,
            fixed_threshold: DEFAULT_FIXED_THRESHOLD,
            adaptive_block_size: DEFAULT_ADAPTIVE_BLOCK_SIZE,
            adaptive_c: DEFAULT_ADAPTIVE_C,
            hough_min_radius: DEFAULT_HOUGH_MIN_RADIUS,
            hough_max_radius: DEFAULT_HOUGH_MAX_RADIUS,
            hough_min_distance: DEFAULT_HOUGH_MIN_DISTANCE,
            hough_canny_threshold: DEFAULT_HOUGH_CANNY_THRESHOLD,
            hough_accumulator_threshold: DEFAULT_HOUGH_ACCUMULATOR_THRESHOLD,
            min_value: DEFAULT_MIN_VALUE,
            max_saturation: DEFAULT_MAX_SATURATION,
            intensity_percentile: DEFAULT_INTENSITY_PERCENTILE,
            percentile_floor: DEFAULT_PERCENTILE_FLOOR,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            cluster_merge_radius: DEFAULT_CLUSTER_MERGE_RADIUS,
            expected_marker_count: MARKER_COUNT,
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            mode: DetectionMode::Fusion,
            collinearity_tolerance: DEFAULT_COLLINEARITY_TOLERANCE,
            spacing_tolerance: DEFAULT_SPACING_TOLERANCE,
            min_marker_distance: DEFAULT_MIN_MARKER_DISTANCE,
            max_marker_distance: DEFAULT_MAX_MARKER_DISTANCE,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_identity_jump: DEFAULT_MAX_IDENTITY_JUMP,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "kalman".to_string(),
            kalman_process_noise: DEFAULT_KALMAN_PROCESS_NOISE,
            kalman_measurement_noise: DEFAULT_KALMAN_MEASUREMENT_NOISE,
            emit_predictions: false,
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("results"),
            fallback_fps: DEFAULT_FPS,
            save_frames: false,
            display: false,
            overlay_video: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let extraction = &self.extraction;

        if extraction.extractors.is_empty() {
            return Err(Error::ConfigError("At least one extractor must be enabled".to_string()));
        }
        if let Some(unknown) = extraction
            .extractors
            .iter()
            .find(|name| !EXTRACTOR_NAMES.contains(&name.as_str()))
        {
            return Err(Error::ConfigError(format!("Unknown extractor: {unknown}")));
        }
        if !extraction.min_blob_area.is_finite()
            || !extraction.max_blob_area.is_finite()
            || extraction.min_blob_area < 0.0
            || extraction.min_blob_area >= extraction.max_blob_area
        {
            return Err(Error::ConfigError(
                "Blob area window must satisfy 0 <= min_blob_area < max_blob_area".to_string(),
            ));
        }
        if !(0.0..=255.0).contains(&extraction.fixed_threshold) {
            return Err(Error::ConfigError("Fixed threshold must be between 0 and 255".to_string()));
        }
        if extraction.adaptive_block_size < 3 || extraction.adaptive_block_size % 2 == 0 {
            return Err(Error::ConfigError(
                "Adaptive block size must be odd and at least 3".to_string(),
            ));
        }
        if extraction.hough_min_radius < 0 || extraction.hough_min_radius > extraction.hough_max_radius {
            return Err(Error::ConfigError(
                "Hough radius range must satisfy 0 <= min <= max".to_string(),
            ));
        }
        if let Some((name, _)) = [
            ("adaptive_c", extraction.adaptive_c),
            ("hough_min_distance", extraction.hough_min_distance),
            ("hough_canny_threshold", extraction.hough_canny_threshold),
            ("hough_accumulator_threshold", extraction.hough_accumulator_threshold),
            ("min_value", extraction.min_value),
            ("max_saturation", extraction.max_saturation),
            ("percentile_floor", extraction.percentile_floor),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        {
            return Err(Error::ConfigError(format!("Extraction parameter {name} must be finite")));
        }
        if !(0.0..=100.0).contains(&extraction.intensity_percentile) {
            return Err(Error::ConfigError("Intensity percentile must be between 0 and 100".to_string()));
        }
        if !(0.0..=1.0).contains(&extraction.min_confidence) {
            return Err(Error::ConfigError("Minimum confidence must be between 0.0 and 1.0".to_string()));
        }

        if !self.fusion.cluster_merge_radius.is_finite() || self.fusion.cluster_merge_radius <= 0.0 {
            return Err(Error::ConfigError("Cluster merge radius must be positive".to_string()));
        }
        if self.fusion.expected_marker_count != MARKER_COUNT {
            return Err(Error::ConfigError(format!(
                "Expected marker count must be {MARKER_COUNT}, got {}",
                self.fusion.expected_marker_count
            )));
        }

        let geometry = &self.geometry;
        if !geometry.collinearity_tolerance.is_finite() || geometry.collinearity_tolerance < 0.0 {
            return Err(Error::ConfigError("Collinearity tolerance must be non-negative".to_string()));
        }
        if !(0.0..1.0).contains(&geometry.spacing_tolerance) {
            return Err(Error::ConfigError("Spacing tolerance must be in [0.0, 1.0)".to_string()));
        }
        if !geometry.min_marker_distance.is_finite()
            || !geometry.max_marker_distance.is_finite()
            || geometry.min_marker_distance < 0.0
            || geometry.min_marker_distance > geometry.max_marker_distance
        {
            return Err(Error::ConfigError(
                "Marker distance range must satisfy 0 <= min <= max".to_string(),
            ));
        }

        if !self.tracking.max_identity_jump.is_finite() || self.tracking.max_identity_jump <= 0.0 {
            return Err(Error::ConfigError("Maximum identity jump must be positive".to_string()));
        }

        let smoothing = &self.smoothing;
        if [smoothing.kalman_process_noise, smoothing.kalman_measurement_noise]
            .iter()
            .any(|noise| !noise.is_finite() || *noise <= 0.0)
        {
            return Err(Error::ConfigError("Kalman noise scales must be positive".to_string()));
        }

        if !self.statistics.iqr_multiplier.is_finite() || self.statistics.iqr_multiplier < 0.0 {
            return Err(Error::ConfigError("IQR multiplier must be non-negative".to_string()));
        }

        if !self.output.fallback_fps.is_finite() || self.output.fallback_fps <= 0.0 {
            return Err(Error::ConfigError("Fallback FPS must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# IR Marker Tracker Configuration

# Candidate extraction
extraction:
  extractors: [fixed_threshold, adaptive_threshold, hough_circles, color_plane]
  min_blob_area: 20.0
  max_blob_area: 500.0
  fixed_threshold: 200.0
  adaptive_block_size: 31
  adaptive_c: 2.0
  hough_min_radius: 5
  hough_max_radius: 40
  hough_min_distance: 40.0
  hough_canny_threshold: 150.0
  hough_accumulator_threshold: 25.0
  min_value: 200.0
  max_saturation: 100.0
  intensity_percentile: 95.0
  percentile_floor: 100.0
  min_confidence: 0.3

# Candidate fusion
fusion:
  cluster_merge_radius: 20.0
  expected_marker_count: 3

# Pattern geometry (mode: fusion or strict)
geometry:
  mode: fusion
  collinearity_tolerance: 5.0
  spacing_tolerance: 0.1
  min_marker_distance: 50.0
  max_marker_distance: 400.0

# Identity tracking
tracking:
  max_identity_jump: 150.0

# Motion smoothing (filter: kalman or none)
smoothing:
  filter: kalman
  kalman_process_noise: 1.0
  kalman_measurement_noise: 5.0
  emit_predictions: false

# Aggregate statistics
statistics:
  iqr_multiplier: 3.0

# Application output
output:
  directory: results
  fallback_fps: 30.0
  save_frames: false
  display: false
  overlay_video: null
"#;
