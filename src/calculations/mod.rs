//! Pipe cross-section models converting depth and velocity readings into flow.

pub mod calculator;
pub mod circular_calculator;
pub mod egg1_calculator;
pub mod egg2_calculator;
pub mod egg2a_calculator;
pub mod egg_calculator;
pub mod geometry;
pub mod pipe_shape;
pub mod r3_calculator;
pub mod rectangular_calculator;
pub mod two_circle_and_rectangle_calculator;
pub mod wetted_area;

pub use calculator::{CalculationError, Calculator};
pub use pipe_shape::{build_calculator, PipeCalculator, PipeShape, UNKNOWN_PIPE_SIZE};
pub use r3_calculator::{r3_calculator, EggForm, R3CalculatorError};
