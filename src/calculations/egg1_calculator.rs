use super::calculator::{ensure_dimensions, CalculationError, Calculator};
use super::egg_calculator::EggCalculator;
use super::wetted_area::WettedAreaParameters;

pub struct Egg1Calculator {
    params: WettedAreaParameters,
}

impl Egg1Calculator {
    pub fn new(width: f64, height: f64, radius3: f64) -> Result<Self, CalculationError> {
        ensure_dimensions(&[("width", width), ("height", height), ("radius3", radius3)])?;
        if height <= width {
            return Err(CalculationError::InvalidParameter(format!(
                "Egg height {} must exceed width {}",
                height, width
            )));
        }

        let radius1 = (height - width) / 2.0;
        let radius2 = width / 2.0;
        let offset = radius3 - radius2;
        if offset <= 0.0 {
            return Err(CalculationError::InvalidParameter(format!(
                "R3 {} must exceed half the width {}",
                radius3, radius2
            )));
        }

        Ok(Egg1Calculator {
            params: WettedAreaParameters::new(height, radius1, radius2, radius3, offset),
        })
    }
}

impl EggCalculator for Egg1Calculator {
    fn wetted_area_parameters(&self) -> &WettedAreaParameters {
        &self.params
    }
}

impl Calculator for Egg1Calculator {
    fn perform_calculation(&self, depth: f64, velocity: f64) -> f64 {
        self.perform_egg_calculation(depth, velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derives_radii_from_width_and_height() {
        let calc = Egg1Calculator::new(0.6, 0.9, 0.9).unwrap();
        let params = calc.wetted_area_parameters();
        assert_relative_eq!(params.radius1, 0.15, epsilon = 1e-12);
        assert_relative_eq!(params.radius2, 0.3, epsilon = 1e-12);
        assert_relative_eq!(params.offset, 0.6, epsilon = 1e-12);
        assert_relative_eq!(params.height1, 0.06, epsilon = 1e-12);
        assert_relative_eq!(params.height2, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn full_pipe_exceeds_half_pipe() {
        let calc = Egg1Calculator::new(0.6, 0.9, 0.9).unwrap();
        let full = calc.perform_calculation(0.9, 1.0);
        let half = calc.perform_calculation(0.45, 1.0);
        assert!(full >= half);
        assert_relative_eq!(full, 485.4492281625128, epsilon = 1e-6);
        assert_relative_eq!(half, 183.35530123990695, epsilon = 1e-6);
        assert_eq!(calc.perform_calculation(0.0, 1.0), 0.0);
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(Egg1Calculator::new(f64::NAN, 0.9, 0.9).is_err());
        assert!(Egg1Calculator::new(0.6, 0.9, f64::NAN).is_err());
        assert!(Egg1Calculator::new(0.9, 0.6, 0.9).is_err());
    }

    #[test]
    fn side_radius_must_clear_the_crown() {
        assert!(matches!(
            Egg1Calculator::new(0.6, 0.9, 0.3),
            Err(CalculationError::InvalidParameter(_))
        ));
        assert!(Egg1Calculator::new(0.6, 0.9, 0.2).is_err());
        assert!(Egg1Calculator::new(0.6, 0.9, 0.31).is_ok());
    }
}
