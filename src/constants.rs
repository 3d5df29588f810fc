//! Constants used throughout the library

/// Number of markers in the rigid pattern (and of identity slots)
pub const MARKER_COUNT: usize = 3;

/// Default frames per second assumption when the source reports none
pub const DEFAULT_FPS: f64 = 30.0;

/// Preprocessing kernels
pub const GAUSSIAN_KERNEL_SIZE: i32 = 5;
pub const GAUSSIAN_SIGMA: f64 = 1.5;
pub const MEDIAN_KERNEL_SIZE: i32 = 5;

/// Blob area window in pixels (exclusive on both ends)
pub const DEFAULT_MIN_BLOB_AREA: f64 = 20.0;
pub const DEFAULT_MAX_BLOB_AREA: f64 = 500.0;

/// Global binarization cutoff for the fixed threshold extractor
pub const DEFAULT_FIXED_THRESHOLD: f64 = 200.0;

/// Adaptive threshold neighbourhood and offset
pub const DEFAULT_ADAPTIVE_BLOCK_SIZE: i32 = 31;
pub const DEFAULT_ADAPTIVE_C: f64 = 2.0;

/// Hough circle transform parameters
pub const DEFAULT_HOUGH_MIN_RADIUS: i32 = 5;
pub const DEFAULT_HOUGH_MAX_RADIUS: i32 = 40;
pub const DEFAULT_HOUGH_MIN_DISTANCE: f64 = 40.0;
pub const DEFAULT_HOUGH_CANNY_THRESHOLD: f64 = 150.0;
pub const DEFAULT_HOUGH_ACCUMULATOR_THRESHOLD: f64 = 25.0;

/// HSV window of the color plane extractor
pub const DEFAULT_MIN_VALUE: f64 = 200.0;
pub const DEFAULT_MAX_SATURATION: f64 = 100.0;

/// Percentile threshold extractor
pub const DEFAULT_INTENSITY_PERCENTILE: f64 = 95.0;
pub const DEFAULT_PERCENTILE_FLOOR: f64 = 100.0;

/// Mean intensity that maps to full confidence for disk/contour extractors
pub const CONFIDENCE_REFERENCE_INTENSITY: f64 = 200.0;

/// Candidates at or below this confidence are discarded
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// Confidence for a blob whose bounding box is empty
pub const FALLBACK_BLOB_CONFIDENCE: f64 = 0.5;

/// Fusion radius in pixels
pub const DEFAULT_CLUSTER_MERGE_RADIUS: f64 = 20.0;

/// Geometric constraints of the pattern
pub const DEFAULT_COLLINEARITY_TOLERANCE: f64 = 5.0;
pub const DEFAULT_SPACING_TOLERANCE: f64 = 0.10;
pub const DEFAULT_MIN_MARKER_DISTANCE: f64 = 50.0;
pub const DEFAULT_MAX_MARKER_DISTANCE: f64 = 400.0;

/// Weight of the spacing term in the triplet score
pub const SPACING_SCORE_WEIGHT: f64 = 10.0;

/// Distances below this are treated as degenerate geometry
pub const DEGENERATE_DISTANCE: f64 = 1.0;

/// Maximum frame-to-frame displacement of one identity
pub const DEFAULT_MAX_IDENTITY_JUMP: f64 = 150.0;

/// Kalman noise scales
pub const DEFAULT_KALMAN_PROCESS_NOISE: f64 = 1.0;
pub const DEFAULT_KALMAN_MEASUREMENT_NOISE: f64 = 5.0;

/// IQR multiplier of the outlier filter
pub const DEFAULT_IQR_MULTIPLIER: f64 = 3.0;
