//! Ingestion, session state and batch conversion around the FDV writers.

pub mod batch_processing;
pub mod command_handler;
pub mod config;
pub mod file_processor;
pub mod site_info;

pub use batch_processing::{BatchProcessingError, BatchProcessor};
pub use command_handler::{CommandHandler, SessionError};
pub use config::{BatchManifest, ConfigError, ConversionJob};
pub use file_processor::FileProcessorError;
pub use site_info::{ColumnKind, MonitorType};
