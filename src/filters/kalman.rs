use super::PositionFilter;
use log::warn;
use nalgebra::{Matrix2, Matrix4, Vector2, Vector4};

/// Constant-velocity Kalman filter over image position
///
/// Time is measured in frames, so velocities are pixels per frame.
pub struct KalmanFilter {
    // State: [x, y, vx, vy]
    state: Vector4<f64>,
    // State covariance
    covariance: Matrix4<f64>,
    // Process noise
    process_noise: Matrix4<f64>,
    // Measurement noise
    measurement_noise: Matrix2<f64>,
    // State transition matrix
    transition: Matrix4<f64>,
    // Measurement matrix
    measurement: Matrix2x4<f64>,
    initialized: bool,
}

type Matrix2x4<T> = nalgebra::Matrix<T, nalgebra::U2, nalgebra::U4, nalgebra::ArrayStorage<T, 2, 4>>;

impl KalmanFilter {
    /// Create a filter with isotropic process and measurement noise
    #[must_use]
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        let dt = 1.0;

        #[rustfmt::skip]
        let transition = Matrix4::new(
            1.0, 0.0, dt, 0.0,
            0.0, 1.0, 0.0, dt,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        // We only measure position
        #[rustfmt::skip]
        let measurement = Matrix2x4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
        );

        Self {
            state: Vector4::zeros(),
            covariance: Matrix4::identity(),
            process_noise: Matrix4::identity() * process_noise,
            measurement_noise: Matrix2::identity() * measurement_noise,
            transition,
            measurement,
            initialized: false,
        }
    }

    fn position(&self) -> (f64, f64) {
        (self.state[0], self.state[1])
    }

    fn predict_step(&mut self) {
        self.state = self.transition * self.state;
        self.covariance = self.transition * self.covariance * self.transition.transpose() + self.process_noise;
    }

    fn update(&mut self, measurement: Vector2<f64>) {
        let innovation = measurement - self.measurement * self.state;
        let innovation_cov = self.measurement * self.covariance * self.measurement.transpose() + self.measurement_noise;

        let Some(inverse) = innovation_cov.try_inverse() else {
            warn!("Singular innovation covariance, skipping correction");
            return;
        };
        let gain = self.covariance * self.measurement.transpose() * inverse;

        self.state += gain * innovation;
        self.covariance = (Matrix4::identity() - gain * self.measurement) * self.covariance;
    }
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_KALMAN_PROCESS_NOISE,
            crate::constants::DEFAULT_KALMAN_MEASUREMENT_NOISE,
        )
    }
}

impl PositionFilter for KalmanFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        if !self.initialized {
            // First measurement is reported as is
            self.state = Vector4::new(x, y, 0.0, 0.0);
            self.covariance = Matrix4::identity();
            self.initialized = true;
            return (x, y);
        }

        self.predict_step();
        self.update(Vector2::new(x, y));
        self.position()
    }

    fn predict(&mut self) -> Option<(f64, f64)> {
        if !self.initialized {
            return None;
        }
        self.predict_step();
        Some(self.position())
    }

    fn reset(&mut self) {
        self.state = Vector4::zeros();
        self.covariance = Matrix4::identity();
        self.initialized = false;
    }

    fn name(&self) -> &str {
        "KalmanFilter"
    }
}
