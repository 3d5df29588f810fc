//! Per-identity motion smoothing.

use crate::config::SmoothingConfig;
use crate::constants::MARKER_COUNT;
use crate::filters::{create_filter, PositionFilter};
use crate::{Error, Result};
use log::debug;

/// One lazily created position filter per identity
pub struct MotionSmoother {
    filters: [Option<Box<dyn PositionFilter>>; MARKER_COUNT],
    filter_type: String,
    process_noise: f64,
    measurement_noise: f64,
}

impl MotionSmoother {
    /// Create a smoother
    ///
    /// # Errors
    ///
    /// Returns `Error::FilterError` if the filter type is unknown
    pub fn new(config: &SmoothingConfig) -> Result<Self> {
        // Fail at construction rather than on the first detection
        create_filter(
            &config.filter,
            config.kalman_process_noise,
            config.kalman_measurement_noise,
        )?;

        Ok(Self {
            filters: std::array::from_fn(|_| None),
            filter_type: config.filter.clone(),
            process_noise: config.kalman_process_noise,
            measurement_noise: config.kalman_measurement_noise,
        })
    }

    /// Filter a measured position of one identity
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an identity outside the slot range
    pub fn smooth(&mut self, id: usize, x: f64, y: f64) -> Result<(f64, f64)> {
        let slot = self
            .filters
            .get_mut(id)
            .ok_or_else(|| Error::InvalidInput(format!("Identity {id} out of range")))?;

        let filter = match slot.take() {
            Some(filter) => filter,
            None => {
                debug!("Starting {} for identity {id}", self.filter_type);
                create_filter(&self.filter_type, self.process_noise, self.measurement_noise)?
            }
        };

        Ok(slot.insert(filter).apply(x, y))
    }

    /// Discard the motion history of one identity
    ///
    /// The next measurement of that identity is reported unfiltered.
    pub fn restart(&mut self, id: usize) {
        if let Some(filter) = self.filters.get_mut(id).and_then(Option::as_mut) {
            debug!("Restarting {} for identity {id}", filter.name());
            filter.reset();
        }
    }

    /// Extrapolate an identity that has no measurement this frame
    ///
    /// Returns `None` for identities that were never measured.
    pub fn predict(&mut self, id: usize) -> Option<(f64, f64)> {
        self.filters.get_mut(id)?.as_mut()?.predict()
    }

    /// Drop every filter
    pub fn reset(&mut self) {
        for slot in &mut self.filters {
            *slot = None;
        }
    }

    #[must_use]
    pub fn filter_type(&self) -> &str {
        &self.filter_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_raw() {
        let mut smoother = MotionSmoother::new(&SmoothingConfig::default()).unwrap();
        assert_eq!(smoother.smooth(1, 42.0, 17.0).unwrap(), (42.0, 17.0));
        assert_eq!(smoother.predict(0), None);
        assert!(smoother.predict(1).is_some());
    }

    #[test]
    fn test_identities_are_independent() {
        let mut smoother = MotionSmoother::new(&SmoothingConfig::default()).unwrap();
        smoother.smooth(0, 0.0, 0.0).unwrap();
        smoother.smooth(0, 10.0, 0.0).unwrap();
        assert_eq!(smoother.smooth(2, 500.0, 500.0).unwrap(), (500.0, 500.0));
    }

    #[test]
    fn test_out_of_range_identity() {
        let mut smoother = MotionSmoother::new(&SmoothingConfig::default()).unwrap();
        assert!(matches!(smoother.smooth(3, 0.0, 0.0), Err(Error::InvalidInput(_))));
        assert_eq!(smoother.predict(7), None);
    }

    #[test]
    fn test_pass_through() {
        let config = SmoothingConfig {
            filter: "none".to_string(),
            ..SmoothingConfig::default()
        };
        let mut smoother = MotionSmoother::new(&config).unwrap();
        smoother.smooth(0, 1.0, 1.0).unwrap();
        assert_eq!(smoother.smooth(0, 9.0, 3.0).unwrap(), (9.0, 3.0));
    }

    #[test]
    fn test_unknown_filter_rejected() {
        let config = SmoothingConfig {
            filter: "particle".to_string(),
            ..SmoothingConfig::default()
        };
        assert!(MotionSmoother::new(&config).is_err());
    }

    #[test]
    fn test_restart_forgets_one_identity() {
        let mut smoother = MotionSmoother::new(&SmoothingConfig::default()).unwrap();
        for i in 0..10 {
            smoother.smooth(0, 100.0 + f64::from(i), 100.0).unwrap();
            smoother.smooth(1, 400.0, 100.0).unwrap();
        }

        smoother.restart(0);
        assert_eq!(smoother.predict(0), None);
        assert_eq!(smoother.smooth(0, 1000.0, 600.0).unwrap(), (1000.0, 600.0));
        assert!(smoother.predict(1).is_some());

        // Unused and out of range identities are ignored
        smoother.restart(2);
        smoother.restart(9);
    }

    #[test]
    fn test_reset() {
        let mut smoother = MotionSmoother::new(&SmoothingConfig::default()).unwrap();
        smoother.smooth(0, 5.0, 5.0).unwrap();
        smoother.reset();
        assert_eq!(smoother.predict(0), None);
    }
}
