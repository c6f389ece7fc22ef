use super::calculator::{ensure_dimensions, CalculationError, Calculator};

pub struct RectangularCalculator {
    channel_width: f64,
}

impl RectangularCalculator {
    pub fn new(width: f64) -> Result<Self, CalculationError> {
        ensure_dimensions(&[("channel width", width)])?;

        Ok(RectangularCalculator {
            channel_width: width,
        })
    }
}

impl Calculator for RectangularCalculator {
    fn perform_calculation(&self, depth: f64, velocity: f64) -> f64 {
        let flow = depth * velocity * self.channel_width * 1000.0;
        flow.max(0.0)
    }
}
