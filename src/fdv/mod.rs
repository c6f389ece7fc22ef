//! Fixed-width FDV flow and rainfall file writers.

pub mod columns;
pub mod flow_writer;
pub(crate) mod layout;
pub mod rainfall_writer;

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::calculations::CalculationError;

pub use flow_writer::{FlowFileWriter, FlowReading};
pub use layout::{identifier_line, MAX_SITE_NAME_LEN, RECORDS_PER_LINE};
pub use rainfall_writer::RainfallFileWriter;

#[derive(Error, Debug)]
pub enum FdvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}
