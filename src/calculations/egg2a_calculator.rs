use super::calculator::{ensure_dimensions, CalculationError, Calculator};
use super::egg_calculator::EggCalculator;
use super::wetted_area::WettedAreaParameters;

/// Egg profile with a narrower invert than type 1: radius1 is a quarter of
/// the height/width difference rather than a half.
pub struct Egg2ACalculator {
    params: WettedAreaParameters,
}

impl Egg2ACalculator {
    pub fn new(height: f64, width: f64, radius3: f64) -> Result<Self, CalculationError> {
        ensure_dimensions(&[("height", height), ("width", width), ("radius3", radius3)])?;
        if height <= width {
            return Err(CalculationError::InvalidParameter(format!(
                "Egg height {} must exceed width {}",
                height, width
            )));
        }

        let radius1 = (height - width) / 4.0;
        let radius2 = width / 2.0;
        let offset = radius3 - radius2;
        if offset <= 0.0 {
            return Err(CalculationError::InvalidParameter(format!(
                "R3 {} must exceed half the width {}",
                radius3, radius2
            )));
        }

        Ok(Egg2ACalculator {
            params: WettedAreaParameters::new(height, radius1, radius2, radius3, offset),
        })
    }
}

impl EggCalculator for Egg2ACalculator {
    fn wetted_area_parameters(&self) -> &WettedAreaParameters {
        &self.params
    }
}

impl Calculator for Egg2ACalculator {
    fn perform_calculation(&self, depth: f64, velocity: f64) -> f64 {
        self.perform_egg_calculation(depth, velocity)
    }
}
