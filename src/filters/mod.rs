//! Per-identity position filters.
//!
//! A filter smooths the measured positions of one marker and can extrapolate
//! its position through frames in which the marker was not resolved.

/// Constant-velocity Kalman filter
pub mod kalman;

use crate::Result;

/// Trait for all position filters
pub trait PositionFilter: Send + Sync {
    /// Feed a measurement and return the filtered position
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64);

    /// Advance one frame without a measurement
    ///
    /// Returns `None` until the filter has seen its first measurement.
    fn predict(&mut self) -> Option<(f64, f64)>;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
#[derive(Debug, Default)]
pub struct NoFilter {
    last: Option<(f64, f64)>,
}

impl PositionFilter for NoFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        self.last = Some((x, y));
        (x, y)
    }

    fn predict(&mut self) -> Option<(f64, f64)> {
        self.last
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a position filter by type name
///
/// # Errors
///
/// Returns `Error::FilterError` for an unknown filter type
pub fn create_filter(filter_type: &str, process_noise: f64, measurement_noise: f64) -> Result<Box<dyn PositionFilter>> {
    match filter_type.to_lowercase().as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter::default())),
        "kalman" => Ok(Box::new(kalman::KalmanFilter::new(process_noise, measurement_noise))),
        _ => Err(crate::Error::FilterError(format!("Unknown filter type: {filter_type}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter::default();
        assert_eq!(filter.predict(), None);
        let (x, y) = filter.apply(10.0, 20.0);
        assert_eq!(x, 10.0);
        assert_eq!(y, 20.0);
        assert_eq!(filter.predict(), Some((10.0, 20.0)));
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none", 1.0, 5.0).is_ok());
        assert_eq!(create_filter("Kalman", 1.0, 5.0).unwrap().name(), "KalmanFilter");
        assert!(create_filter("unknown", 1.0, 5.0).is_err());
    }
}
