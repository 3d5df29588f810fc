//! The per-frame detection and tracking engine.

use crate::config::{Config, DetectionMode};
use crate::constants::MARKER_COUNT;
use crate::extractors::{create_extractors, CandidateExtractor, CandidatePoint};
use crate::fusion::{strongest, CandidateFuser, FusedPoint};
use crate::geometry::{GeometricValidator, TripletGeometry};
use crate::preprocess::Preprocessor;
use crate::smoother::MotionSmoother;
use crate::statistics::{RunStatistics, StatisticsCollector, Trajectory};
use crate::tracker::IdentityTracker;
use crate::{Error, Result};
use log::{debug, info, trace};
use opencv::core::{Mat, Size};
use opencv::prelude::*;
use serde::Serialize;

/// A marker resolved in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub id: usize,
    /// Smoothed position
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

/// Predicted position of an identity that was not resolved
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extrapolation {
    pub id: usize,
    pub x: f64,
    pub y: f64,
}

/// Outcome of one frame
///
/// Geometry fields are infinite when no valid triplet was measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameResult {
    pub frame_index: u64,
    /// Seconds since the first frame
    pub timestamp: f64,
    /// Ordered by identity
    pub detections: Vec<Detection>,
    pub success: bool,
    pub geometry_error: f64,
    pub spacing_ratio: f64,
    pub extrapolated: Vec<Extrapolation>,
}

impl FrameResult {
    /// Detection of one identity, if resolved
    #[must_use]
    pub fn detection(&self, id: usize) -> Option<&Detection> {
        self.detections.iter().find(|d| d.id == id)
    }
}

/// Marker triplet detector and tracker
pub struct MarkerDetector {
    config: Config,
    preprocessor: Preprocessor,
    extractors: Vec<Box<dyn CandidateExtractor>>,
    fuser: CandidateFuser,
    validator: GeometricValidator,
    tracker: IdentityTracker,
    smoother: MotionSmoother,
    statistics: StatisticsCollector,
    frame_index: u64,
    fps: f64,
    frame_size: Option<Size>,
}

impl MarkerDetector {
    /// Create a detector from a configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration is invalid, or a
    /// factory error for unknown extractor or filter names
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let extractors = create_extractors(&config.extraction)?;
        let smoother = MotionSmoother::new(&config.smoothing)?;

        info!(
            "Marker detector ready: mode {:?}, extractors [{}], filter {}",
            config.geometry.mode,
            extractors.iter().map(|e| e.name()).collect::<Vec<_>>().join(", "),
            smoother.filter_type()
        );

        Ok(Self {
            preprocessor: Preprocessor::new(),
            extractors,
            fuser: CandidateFuser::new(config.fusion.cluster_merge_radius),
            validator: GeometricValidator::new(&config.geometry),
            tracker: IdentityTracker::new(config.tracking.max_identity_jump),
            smoother,
            statistics: StatisticsCollector::new(),
            frame_index: 0,
            fps: config.output.fallback_fps,
            frame_size: None,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set the frame rate used for timestamps
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for a non-positive or non-finite rate
    pub fn set_frame_rate(&mut self, fps: f64) -> Result<()> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(Error::InvalidInput(format!("Invalid frame rate: {fps}")));
        }
        self.fps = fps;
        Ok(())
    }

    #[must_use]
    pub fn frame_rate(&self) -> f64 {
        self.fps
    }

    /// Number of frames processed so far
    #[must_use]
    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }

    /// Run every extractor on a frame and return their raw candidates
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFrame` for malformed frames or an `OpenCV` error
    pub fn extract_candidates(&mut self, frame: &Mat) -> Result<Vec<CandidatePoint>> {
        Preprocessor::check_frame(frame)?;
        self.check_frame_size(frame)?;

        let prepared = self.preprocessor.prepare(frame)?;
        let mut candidates = Vec::new();
        for extractor in &self.extractors {
            let found = extractor.extract(&prepared)?;
            trace!("{}: {} candidates", extractor.name(), found.len());
            candidates.extend(found);
        }
        Ok(candidates)
    }

    /// Detect and track the markers in the next frame
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFrame` for malformed frames or an `OpenCV` error
    pub fn detect(&mut self, frame: &Mat) -> Result<FrameResult> {
        let candidates = self.extract_candidates(frame)?;
        let fused = self.fuser.fuse(&candidates);
        debug!(
            "Frame {}: {} candidates fused into {}",
            self.frame_index,
            candidates.len(),
            fused.len()
        );
        self.process_candidates(fused)
    }

    /// Select, track and smooth an already fused candidate set
    ///
    /// Advances the frame counter exactly like [`MarkerDetector::detect`].
    ///
    /// # Errors
    ///
    /// Returns an error if a position filter cannot be created
    pub fn process_candidates(&mut self, fused: Vec<FusedPoint>) -> Result<FrameResult> {
        let frame_index = self.frame_index;
        self.frame_index += 1;
        #[allow(clippy::cast_precision_loss)]
        let timestamp = frame_index as f64 / self.fps;

        let (selected, geometry) = match self.config.geometry.mode {
            DetectionMode::Strict => match self.validator.find_best_triplet(&fused) {
                Some(triplet) => (triplet.points.to_vec(), triplet.geometry),
                None => (Vec::new(), TripletGeometry::DEGENERATE),
            },
            DetectionMode::Fusion => {
                let selected = strongest(&fused, MARKER_COUNT);
                let geometry = TripletGeometry::from_points(&selected);
                (selected, geometry)
            }
        };

        let assignments = self.tracker.associate(&selected);

        let mut detections = Vec::with_capacity(assignments.len());
        for assignment in &assignments {
            if assignment.reseeded {
                self.smoother.restart(assignment.id);
            }
            let (x, y) = self.smoother.smooth(assignment.id, assignment.point.x, assignment.point.y)?;
            detections.push(Detection {
                id: assignment.id,
                x,
                y,
                confidence: assignment.point.confidence,
            });
        }

        let mut extrapolated = Vec::new();
        for id in 0..MARKER_COUNT {
            if detections.iter().any(|d| d.id == id) {
                continue;
            }
            if let Some((x, y)) = self.smoother.predict(id) {
                if self.config.smoothing.emit_predictions {
                    extrapolated.push(Extrapolation { id, x, y });
                }
            }
        }

        let success = detections.len() == MARKER_COUNT;
        if !success {
            debug!("Frame {frame_index}: {} of {MARKER_COUNT} markers resolved", detections.len());
        }

        let result = FrameResult {
            frame_index,
            timestamp,
            detections,
            success,
            geometry_error: geometry.collinearity_error,
            spacing_ratio: geometry.spacing_ratio,
            extrapolated,
        };
        self.statistics.record(&result);

        Ok(result)
    }

    /// Positions reported in successful frames, per identity
    #[must_use]
    pub fn trajectories(&self) -> &[Trajectory; MARKER_COUNT] {
        self.statistics.trajectories()
    }

    /// Summary of every frame processed so far
    #[must_use]
    pub fn statistics(&self) -> RunStatistics {
        self.statistics.summarize(self.config.statistics.iqr_multiplier)
    }

    /// Forget identities, filters, accumulated statistics and the frame size
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.smoother.reset();
        self.statistics.clear();
        self.frame_index = 0;
        self.frame_size = None;
    }

    fn check_frame_size(&mut self, frame: &Mat) -> Result<()> {
        let size = frame.size()?;
        match self.frame_size {
            None => {
                self.frame_size = Some(size);
                Ok(())
            }
            Some(expected) if expected == size => Ok(()),
            Some(expected) => Err(Error::InvalidFrame(format!(
                "Frame size {}x{} differs from {}x{}",
                size.width, size.height, expected.width, expected.height
            ))),
        }
    }
}
