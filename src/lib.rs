//! Flow calculation for common sewer cross-sections and writers for the
//! fixed-width FDV flow and rainfall interchange files.

pub mod backend;
pub mod calculations;
pub mod fdv;
pub mod utils;

pub use calculations::{build_calculator, r3_calculator, CalculationError, Calculator, EggForm, PipeShape};
pub use fdv::{FdvError, FlowFileWriter, FlowReading, RainfallFileWriter};
