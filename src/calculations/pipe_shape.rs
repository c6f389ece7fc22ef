use std::fmt;
use std::str::FromStr;

use super::calculator::{CalculationError, Calculator};
use super::circular_calculator::CircularCalculator;
use super::egg1_calculator::Egg1Calculator;
use super::egg2_calculator::Egg2Calculator;
use super::egg2a_calculator::Egg2ACalculator;
use super::r3_calculator::{r3_calculator, EggForm};
use super::rectangular_calculator::RectangularCalculator;
use super::two_circle_and_rectangle_calculator::TwoCircleAndRectangleCalculator;

/// Written to the FDV header when the section has no single characteristic size.
pub const UNKNOWN_PIPE_SIZE: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeShape {
    Circular,
    Rectangular,
    EggType1,
    EggType2,
    EggType2a,
    TwoCirclesAndRectangle,
}

impl PipeShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipeShape::Circular => "Circular",
            PipeShape::Rectangular => "Rectangular",
            PipeShape::EggType1 => "Egg Type 1",
            PipeShape::EggType2 => "Egg Type 2",
            PipeShape::EggType2a => "Egg Type 2a",
            PipeShape::TwoCirclesAndRectangle => "Two Circles and a Rectangle",
        }
    }
}

impl fmt::Display for PipeShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipeShape {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Circular" => Ok(PipeShape::Circular),
            "Rectangular" => Ok(PipeShape::Rectangular),
            "Egg Type 1" => Ok(PipeShape::EggType1),
            "Egg Type 2" => Ok(PipeShape::EggType2),
            "Egg Type 2a" => Ok(PipeShape::EggType2a),
            "Two Circles and a Rectangle" => Ok(PipeShape::TwoCirclesAndRectangle),
            other => Err(CalculationError::UnsupportedPipeType(other.to_string())),
        }
    }
}

/// A calculator together with the size written to the FDV header.
pub struct PipeCalculator {
    pub calculator: Box<dyn Calculator>,
    pub pipe_size: f64,
}

fn parse_dimension(value: &str) -> Result<f64, CalculationError> {
    value.trim().parse::<f64>().map_err(|_| {
        CalculationError::InvalidParameter(format!("Pipe size '{}' is not a number", value.trim()))
    })
}

fn parse_dimensions(
    pipe_size_param: &str,
    expected: &[usize],
    shape: PipeShape,
) -> Result<Vec<f64>, CalculationError> {
    let values = pipe_size_param
        .split(',')
        .map(parse_dimension)
        .collect::<Result<Vec<_>, _>>()?;
    if !expected.contains(&values.len()) {
        return Err(CalculationError::InvalidParameter(format!(
            "{} expects {:?} comma-separated dimensions, got {}",
            shape,
            expected,
            values.len()
        )));
    }
    Ok(values)
}

/// Resolves R3 from width and height when the size list omits it.
fn egg_radius3(values: &[f64], form: EggForm) -> Result<f64, CalculationError> {
    match values.get(2) {
        Some(&r3) => Ok(r3),
        None => {
            let r3 = r3_calculator(values[0], values[1], form)
                .map_err(|e| CalculationError::InvalidParameter(format!("R3: {}", e)))?;
            log::info!("R3 value calculated for {}: {}", form, r3);
            Ok(r3)
        }
    }
}

/// Builds the calculator for a pipe shape from its size string.
///
/// Circular and rectangular sizes are a single dimension in millimetres.
/// Egg and two-circle sizes are comma-separated dimensions in metres:
/// `width,height[,r3]` for egg types 1 and 2a, `height` for egg type 2 and
/// `height,width` for two circles and a rectangle.
pub fn build_calculator(
    shape: PipeShape,
    pipe_size_param: &str,
) -> Result<PipeCalculator, CalculationError> {
    let mut pipe_size = UNKNOWN_PIPE_SIZE;

    let calculator: Box<dyn Calculator> = match shape {
        PipeShape::Circular => {
            let size = parse_dimension(pipe_size_param)? / 1000.0;
            if size > 0.0 {
                pipe_size = size;
            }
            Box::new(CircularCalculator::new(size / 2.0)?)
        }
        PipeShape::Rectangular => {
            let size = parse_dimension(pipe_size_param)? / 1000.0;
            if size > 0.0 {
                pipe_size = size;
            }
            Box::new(RectangularCalculator::new(size)?)
        }
        PipeShape::EggType1 => {
            let values = parse_dimensions(pipe_size_param, &[2, 3], shape)?;
            let r3 = egg_radius3(&values, EggForm::Type1)?;
            Box::new(Egg1Calculator::new(values[0], values[1], r3)?)
        }
        PipeShape::EggType2a => {
            let values = parse_dimensions(pipe_size_param, &[2, 3], shape)?;
            let r3 = egg_radius3(&values, EggForm::Type2)?;
            Box::new(Egg2ACalculator::new(values[1], values[0], r3)?)
        }
        PipeShape::EggType2 => {
            let height = parse_dimension(pipe_size_param)?;
            Box::new(Egg2Calculator::new(height)?)
        }
        PipeShape::TwoCirclesAndRectangle => {
            let values = parse_dimensions(pipe_size_param, &[2], shape)?;
            Box::new(TwoCircleAndRectangleCalculator::new(values[1], values[0])?)
        }
    };

    Ok(PipeCalculator {
        calculator,
        pipe_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_every_shape_name() {
        for shape in [
            PipeShape::Circular,
            PipeShape::Rectangular,
            PipeShape::EggType1,
            PipeShape::EggType2,
            PipeShape::EggType2a,
            PipeShape::TwoCirclesAndRectangle,
        ] {
            assert_eq!(shape.as_str().parse::<PipeShape>(), Ok(shape));
        }
    }

    #[test]
    fn unknown_shape_is_unsupported() {
        assert_eq!(
            "Oval".parse::<PipeShape>(),
            Err(CalculationError::UnsupportedPipeType("Oval".to_string()))
        );
    }

    #[test]
    fn circular_size_is_a_diameter_in_millimetres() {
        let built = build_calculator(PipeShape::Circular, "1000").unwrap();
        assert_relative_eq!(built.pipe_size, 1.0);
        assert_relative_eq!(
            built.calculator.perform_calculation(0.5, 1.0),
            std::f64::consts::PI * 0.25 / 2.0 * 1000.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn rectangular_size_is_a_width_in_millimetres() {
        let built = build_calculator(PipeShape::Rectangular, "1000").unwrap();
        assert_relative_eq!(built.pipe_size, 1.0);
        assert_relative_eq!(built.calculator.perform_calculation(0.2, 0.5), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn non_fixed_shapes_use_unknown_size() {
        let built = build_calculator(PipeShape::EggType2, "1.0").unwrap();
        assert_eq!(built.pipe_size, UNKNOWN_PIPE_SIZE);
        let built = build_calculator(PipeShape::TwoCirclesAndRectangle, "1.0, 0.6").unwrap();
        assert_eq!(built.pipe_size, UNKNOWN_PIPE_SIZE);
        assert_relative_eq!(
            built.calculator.perform_calculation(0.5, 1.0),
            261.37166941154067,
            epsilon = 1e-6
        );
    }

    #[test]
    fn egg_r3_is_solved_when_omitted() {
        let explicit = build_calculator(PipeShape::EggType1, "0.6,0.9,0.9").unwrap();
        let solved = build_calculator(PipeShape::EggType1, "0.6,0.9").unwrap();
        assert_relative_eq!(
            explicit.calculator.perform_calculation(0.5, 1.0),
            solved.calculator.perform_calculation(0.5, 1.0),
            epsilon = 1e-6
        );

        let egg2a = build_calculator(PipeShape::EggType2a, "0.6,0.9").unwrap();
        assert_relative_eq!(
            egg2a.calculator.perform_calculation(0.9, 1.0),
            432.42760495407595,
            epsilon = 1e-2
        );
    }

    #[test]
    fn unsolvable_egg_is_invalid() {
        assert!(matches!(
            build_calculator(PipeShape::EggType1, "1.2,0.9"),
            Err(CalculationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn malformed_sizes_are_invalid_parameters() {
        assert!(matches!(
            build_calculator(PipeShape::Circular, "abc"),
            Err(CalculationError::InvalidParameter(_))
        ));
        assert!(matches!(
            build_calculator(PipeShape::EggType1, "0.6"),
            Err(CalculationError::InvalidParameter(_))
        ));
        assert!(matches!(
            build_calculator(PipeShape::EggType1, "0.6,0.9,0.25"),
            Err(CalculationError::InvalidParameter(_))
        ));
        assert!(matches!(
            build_calculator(PipeShape::TwoCirclesAndRectangle, "1.0,x"),
            Err(CalculationError::InvalidParameter(_))
        ));
        assert!(build_calculator(PipeShape::Circular, "NaN").is_err());
        assert!(build_calculator(PipeShape::Circular, "0").is_err());
    }
}
