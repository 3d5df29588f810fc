//! Frame preprocessing: intensity conversion and edge-preserving smoothing.

use crate::constants::{GAUSSIAN_KERNEL_SIZE, GAUSSIAN_SIGMA, MEDIAN_KERNEL_SIZE};
use crate::{Error, Result};
use opencv::core::{Mat, Size, CV_8U};
use opencv::imgproc;
use opencv::prelude::*;

/// A frame together with the derived images the extractors consume
pub struct PreparedFrame {
    /// The input frame (1 or 3 channels, BGR order)
    pub frame: Mat,
    /// Single-channel intensity image
    pub gray: Mat,
    /// Gaussian then median smoothed intensity image
    pub filtered: Mat,
}

/// Converts raw frames to `(gray, filtered)` pairs
#[derive(Debug, Clone)]
pub struct Preprocessor {
    gaussian_kernel: i32,
    gaussian_sigma: f64,
    median_kernel: i32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    /// Create a preprocessor with the standard 5x5 kernels
    #[must_use]
    pub fn new() -> Self {
        Self {
            gaussian_kernel: GAUSSIAN_KERNEL_SIZE,
            gaussian_sigma: GAUSSIAN_SIGMA,
            median_kernel: MEDIAN_KERNEL_SIZE,
        }
    }

    /// Check that a frame satisfies the input contract
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFrame` if the frame is empty, not 8-bit, or has
    /// a channel count other than 1 or 3
    pub fn check_frame(frame: &Mat) -> Result<()> {
        if frame.empty() {
            return Err(Error::InvalidFrame("Frame is empty".to_string()));
        }
        if frame.depth() != CV_8U {
            return Err(Error::InvalidFrame(format!(
                "Expected 8-bit frame, got depth {}",
                frame.depth()
            )));
        }
        let channels = frame.channels();
        if channels != 1 && channels != 3 {
            return Err(Error::InvalidFrame(format!(
                "Expected 1 or 3 channels, got {channels}"
            )));
        }
        Ok(())
    }

    /// Convert a frame to intensity and smooth it
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is malformed or an `OpenCV` call fails
    pub fn prepare(&self, frame: &Mat) -> Result<PreparedFrame> {
        Self::check_frame(frame)?;

        let gray = if frame.channels() == 3 {
            let mut gray = Mat::default();
            imgproc::cvt_color_def(frame, &mut gray, imgproc::COLOR_BGR2GRAY)?;
            gray
        } else {
            frame.try_clone()?
        };

        // Broad blur first, then drop isolated noise pixels
        let mut blurred = Mat::default();
        imgproc::gaussian_blur_def(
            &gray,
            &mut blurred,
            Size::new(self.gaussian_kernel, self.gaussian_kernel),
            self.gaussian_sigma,
        )?;

        let mut filtered = Mat::default();
        imgproc::median_blur(&blurred, &mut filtered, self.median_kernel)?;

        Ok(PreparedFrame {
            frame: frame.try_clone()?,
            gray,
            filtered,
        })
    }
}
