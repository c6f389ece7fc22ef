use super::calculator::{ensure_dimensions, flow_from_area, CalculationError, Calculator};
use super::geometry::{segment_area, segment_area_at_offset};
use std::f64::consts::PI;

/// Section made of a half-circle invert and a half-circle crown joined by
/// vertical walls, both circles having a diameter equal to the width.
pub struct TwoCircleAndRectangleCalculator {
    height: f64,
    width: f64,
}

impl TwoCircleAndRectangleCalculator {
    pub fn new(width: f64, height: f64) -> Result<Self, CalculationError> {
        ensure_dimensions(&[("width", width), ("height", height)])?;
        if height < width {
            return Err(CalculationError::InvalidParameter(format!(
                "Height {} must be at least the width {}",
                height, width
            )));
        }

        Ok(TwoCircleAndRectangleCalculator { height, width })
    }

    fn wetted_area(&self, depth: f64) -> f64 {
        let radius = self.width / 2.0;
        let half_circle = PI * radius.powi(2) / 2.0;
        let wall_height = self.height - self.width;
        let crown_springing = self.height - radius;

        if depth <= 0.0 {
            0.0
        } else if depth < radius {
            segment_area(radius, depth)
        } else if depth < crown_springing {
            half_circle + (depth - radius) * self.width
        } else if depth < self.height {
            let into_crown = depth - crown_springing;
            let wetted_crown = half_circle - segment_area_at_offset(radius, into_crown);
            half_circle + wall_height * self.width + wetted_crown
        } else {
            2.0 * half_circle + wall_height * self.width
        }
    }
}

impl Calculator for TwoCircleAndRectangleCalculator {
    fn perform_calculation(&self, depth: f64, velocity: f64) -> f64 {
        flow_from_area(self.wetted_area(depth), velocity)
    }
}
