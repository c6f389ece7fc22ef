use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MAX_ITERATIONS: usize = 1000;
const PRECISION: f64 = 1e-5;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum R3CalculatorError {
    #[error("width and height are geometrically inconsistent for this egg form")]
    MathDomainError,
    #[error("R3 did not converge within {} iterations", MAX_ITERATIONS)]
    ConvergenceError,
}

/// Selects how the invert radius is derived from width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EggForm {
    /// radius1 = (h - w) / 2
    Type1,
    /// radius1 = (h - w) / 4
    Type2,
}

impl EggForm {
    fn invert_divisor(self) -> f64 {
        match self {
            EggForm::Type1 => 2.0,
            EggForm::Type2 => 4.0,
        }
    }
}

impl FromStr for EggForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "Egg Type 1" => Ok(EggForm::Type1),
            "2" | "Egg Type 2" | "Egg Type 2a" => Ok(EggForm::Type2),
            other => Err(format!("Unknown egg form: {}", other)),
        }
    }
}

impl fmt::Display for EggForm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EggForm::Type1 => write!(f, "Egg Type 1"),
            EggForm::Type2 => write!(f, "Egg Type 2"),
        }
    }
}

/// Solves for the side-arc radius that closes an egg profile of width `w`
/// and height `h` smoothly.
pub fn r3_calculator(w: f64, h: f64, egg_form: EggForm) -> Result<f64, R3CalculatorError> {
    let r2 = w / 2.0;
    let r1 = (h - w) / egg_form.invert_divisor();
    let h2 = h - r2;
    let mut r3 = h;

    for _ in 0..MAX_ITERATIONS {
        let offset = r3 - r2;
        let square_term = (r3 - r1).powi(2) - (h2 - r1).powi(2);

        if square_term < 0.0 || square_term.is_nan() {
            return Err(R3CalculatorError::MathDomainError);
        }

        let diff = offset - square_term.sqrt();

        if diff.abs() <= PRECISION {
            return Ok(r3);
        }

        r3 += diff / 10.0;
    }

    Err(R3CalculatorError::ConvergenceError)
}
