use super::calculator::{ensure_dimensions, flow_from_area, CalculationError, Calculator};
use super::geometry::{segment_area, segment_area_at_offset};
use std::f64::consts::PI;

pub struct CircularCalculator {
    pipe_radius: f64,
    circle_area: f64,
}

impl CircularCalculator {
    pub fn new(pipe_radius: f64) -> Result<Self, CalculationError> {
        ensure_dimensions(&[("pipe radius", pipe_radius)])?;

        Ok(CircularCalculator {
            pipe_radius,
            circle_area: PI * pipe_radius.powi(2),
        })
    }

    pub fn pipe_radius(&self) -> f64 {
        self.pipe_radius
    }

    fn wetted_area(&self, depth: f64) -> f64 {
        if depth <= 0.0 {
            0.0
        } else if depth < self.pipe_radius {
            segment_area(self.pipe_radius, depth)
        } else if depth == self.pipe_radius {
            self.circle_area / 2.0
        } else if depth < self.pipe_radius * 2.0 {
            self.circle_area - segment_area_at_offset(self.pipe_radius, depth - self.pipe_radius)
        } else {
            self.circle_area
        }
    }
}

impl Calculator for CircularCalculator {
    fn perform_calculation(&self, depth: f64, velocity: f64) -> f64 {
        flow_from_area(self.wetted_area(depth), velocity)
    }
}
