//! Detection and tracking of three collinear infrared markers in video.
//!
//! The markers form a rigid pattern: collinear, equally spaced, with a bounded
//! separation. Each frame goes through this pipeline:
//! 1. Preprocessing to a smoothed intensity image
//! 2. Several independent candidate extractors (thresholds, Hough circles,
//!    HSV segmentation)
//! 3. Confidence-weighted fusion of nearby candidates
//! 4. Selection of the triplet, optionally validated against the pattern
//! 5. Identity assignment with a maximum plausible displacement
//! 6. Per-identity constant-velocity Kalman smoothing
//!
//! Trajectories are cleaned with an IQR outlier filter before run statistics
//! are computed.
//!
//! # Examples
//!
//! ## Processing a video
//!
//! ```no_run
//! use ir_marker_tracker::{config::Config, detector::MarkerDetector};
//! use opencv::{core::Mat, prelude::*, videoio};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut detector = MarkerDetector::new(Config::default())?;
//! let mut capture = videoio::VideoCapture::from_file("markers.mp4", videoio::CAP_ANY)?;
//! detector.set_frame_rate(capture.get(videoio::CAP_PROP_FPS)?)?;
//!
//! let mut frame = Mat::default();
//! while capture.read(&mut frame)? && !frame.empty() {
//!     let result = detector.detect(&frame)?;
//!     if result.success {
//!         for detection in &result.detections {
//!             println!("Marker {}: ({:.2}, {:.2})", detection.id, detection.x, detection.y);
//!         }
//!     }
//! }
//!
//! let stats = detector.statistics();
//! println!("Success rate: {:.1}%", stats.success_rate * 100.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Replaying fused candidates
//!
//! ```
//! use ir_marker_tracker::{
//!     config::{Config, DetectionMode},
//!     detector::MarkerDetector,
//!     fusion::FusedPoint,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::default();
//! config.geometry.mode = DetectionMode::Strict;
//! let mut detector = MarkerDetector::new(config)?;
//!
//! let result = detector.process_candidates(vec![
//!     FusedPoint::new(100.0, 300.0, 0.9),
//!     FusedPoint::new(200.0, 300.0, 0.92),
//!     FusedPoint::new(300.0, 300.0, 0.88),
//! ])?;
//! assert!(result.success);
//! assert!(result.geometry_error < 1e-9);
//! # Ok(())
//! # }
//! ```

/// Frame preprocessing
pub mod preprocess;

/// Candidate extractors and their factory
pub mod extractors;

/// Candidate fusion
pub mod fusion;

/// Pattern geometry and triplet validation
pub mod geometry;

/// Identity tracking across frames
pub mod tracker;

/// Position filters for smoothing marker motion
pub mod filters;

/// Per-identity motion smoothing
pub mod smoother;

/// IQR outlier rejection
pub mod outlier_filter;

/// Run statistics
pub mod statistics;

/// The detection and tracking engine
pub mod detector;

/// Frame sources and sinks
pub mod video;

/// Result annotation
pub mod overlay;

/// JSON and text reports
pub mod report;

/// Utility functions for coordinate conversion
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
