use super::calculator::{ensure_dimensions, CalculationError, Calculator};
use super::egg_calculator::EggCalculator;
use super::wetted_area::WettedAreaParameters;

/// Standard egg profile whose radii are fixed proportions of the height.
pub struct Egg2Calculator {
    params: WettedAreaParameters,
}

impl Egg2Calculator {
    pub fn new(height: f64) -> Result<Self, CalculationError> {
        ensure_dimensions(&[("height", height)])?;

        let radius1 = height / 12.0;
        let radius2 = height / 3.0;
        let radius3 = 8.0 * height / 9.0;
        let offset = 5.0 * height / 9.0;

        Ok(Egg2Calculator {
            params: WettedAreaParameters::new(height, radius1, radius2, radius3, offset),
        })
    }
}

impl EggCalculator for Egg2Calculator {
    fn wetted_area_parameters(&self) -> &WettedAreaParameters {
        &self.params
    }
}

impl Calculator for Egg2Calculator {
    fn perform_calculation(&self, depth: f64, velocity: f64) -> f64 {
        self.perform_egg_calculation(depth, velocity)
    }
}
