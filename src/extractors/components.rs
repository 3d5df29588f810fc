//! Connected components and morphology shared by the threshold extractors.

use super::{CandidatePoint, MethodTag};
use crate::constants::FALLBACK_BLOB_CONFIDENCE;
use crate::Result;
use opencv::core::{self, Mat, Point, Size, CV_32S};
use opencv::imgproc;
use opencv::prelude::*;

/// One 8-connected foreground component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    pub label: i32,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub area: i32,
    /// Pixel centroid reported by the labelling
    pub centroid: (f64, f64),
}

impl Blob {
    /// Center of the bounding box
    #[must_use]
    pub fn bbox_center(&self) -> (f64, f64) {
        (
            f64::from(self.left) + f64::from(self.width) / 2.0,
            f64::from(self.top) + f64::from(self.height) / 2.0,
        )
    }

    /// Filled fraction of the bounding box
    #[must_use]
    pub fn fill_ratio(&self) -> f64 {
        let bbox_area = f64::from(self.width) * f64::from(self.height);
        if bbox_area > 0.0 {
            (f64::from(self.area) / bbox_area).min(1.0)
        } else {
            FALLBACK_BLOB_CONFIDENCE
        }
    }

    /// Whether the area lies strictly inside `(min_area, max_area)`
    #[must_use]
    pub fn area_within(&self, min_area: f64, max_area: f64) -> bool {
        let area = f64::from(self.area);
        min_area < area && area < max_area
    }
}

/// Labelled components of a binary image
pub struct Components {
    /// Per-pixel label image (`CV_32S`)
    pub labels: Mat,
    /// Foreground components, background excluded
    pub blobs: Vec<Blob>,
}

/// Apply a 3x3 elliptical morphology operation
///
/// # Errors
///
/// Returns an error if an `OpenCV` operation fails
pub fn morphology(binary: &Mat, operation: i32, iterations: i32) -> Result<Mat> {
    let kernel = imgproc::get_structuring_element_def(imgproc::MORPH_ELLIPSE, Size::new(3, 3))?;
    let mut output = Mat::default();
    imgproc::morphology_ex(
        binary,
        &mut output,
        operation,
        &kernel,
        Point::new(-1, -1),
        iterations,
        core::BORDER_CONSTANT,
        imgproc::morphology_default_border_value()?,
    )?;
    Ok(output)
}

/// Label the 8-connected components of a binary image
///
/// # Errors
///
/// Returns an error if an `OpenCV` operation fails
pub fn connected_blobs(binary: &Mat) -> Result<Components> {
    let mut labels = Mat::default();
    let mut stats = Mat::default();
    let mut centroids = Mat::default();
    let count = imgproc::connected_components_with_stats(binary, &mut labels, &mut stats, &mut centroids, 8, CV_32S)?;

    let mut blobs = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
    // Label 0 is the background
    for label in 1..count {
        blobs.push(Blob {
            label,
            left: *stats.at_2d::<i32>(label, imgproc::CC_STAT_LEFT)?,
            top: *stats.at_2d::<i32>(label, imgproc::CC_STAT_TOP)?,
            width: *stats.at_2d::<i32>(label, imgproc::CC_STAT_WIDTH)?,
            height: *stats.at_2d::<i32>(label, imgproc::CC_STAT_HEIGHT)?,
            area: *stats.at_2d::<i32>(label, imgproc::CC_STAT_AREA)?,
            centroid: (*centroids.at_2d::<f64>(label, 0)?, *centroids.at_2d::<f64>(label, 1)?),
        });
    }

    Ok(Components { labels, blobs })
}

/// Turn the components of a binary image into bounding-box candidates
///
/// Components outside the area window are skipped; confidence is the filled
/// fraction of the bounding box.
///
/// # Errors
///
/// Returns an error if an `OpenCV` operation fails
pub fn bbox_candidates(binary: &Mat, min_area: f64, max_area: f64, source: MethodTag) -> Result<Vec<CandidatePoint>> {
    let components = connected_blobs(binary)?;

    Ok(components
        .blobs
        .iter()
        .filter(|blob| blob.area_within(min_area, max_area))
        .map(|blob| {
            let (x, y) = blob.bbox_center();
            CandidatePoint::new(x, y, blob.fill_ratio(), source)
        })
        .collect())
}

/// Mean intensity of the pixels carrying a blob's label
///
/// # Errors
///
/// Returns an error if pixel access fails
pub fn mean_label_intensity(gray: &Mat, labels: &Mat, blob: &Blob) -> Result<f64> {
    let mut sum = 0.0;
    let mut count = 0u32;
    for row in blob.top..blob.top + blob.height {
        for col in blob.left..blob.left + blob.width {
            if *labels.at_2d::<i32>(row, col)? == blob.label {
                sum += f64::from(*gray.at_2d::<u8>(row, col)?);
                count += 1;
            }
        }
    }
    Ok(if count > 0 { sum / f64::from(count) } else { 0.0 })
}
