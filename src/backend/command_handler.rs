use crate::backend::file_processor::{FileProcessor, FileProcessorError, ProcessedFileData, TIMESTAMP_FORMAT};
use crate::backend::site_info::{first_column, ColumnKind, ColumnMapping, MonitorType};
use crate::calculations::{build_calculator, r3_calculator, CalculationError, EggForm, PipeShape, R3CalculatorError};
use crate::fdv::{columns, FdvError, FlowFileWriter, RainfallFileWriter};
use crate::utils::logger::clear_logs;
use chrono::{Duration, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No data loaded. Process a file first.")]
    NoData,
    #[error("No {0:?} column available")]
    MissingColumn(ColumnKind),
    #[error("Failed to parse timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Error processing file: {0}")]
    FileProcessor(#[from] FileProcessorError),
    #[error("Error creating output: {0}")]
    Fdv(#[from] FdvError),
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),
    #[error("Error calculating R3 value: {0}")]
    R3(#[from] R3CalculatorError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFileSummary {
    pub column_mapping: ColumnMapping,
    pub monitor_type: MonitorType,
    pub start_timestamp: String,
    pub end_timestamp: String,
    /// Seconds between readings.
    pub interval: i64,
    pub site_id: String,
    pub site_name: String,
    pub gaps: usize,
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampUpdateSummary {
    pub start_timestamp: String,
    pub end_timestamp: String,
    pub interval: i64,
    pub row_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NullReadings {
    pub depth: usize,
    pub velocity: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowConversionSummary {
    pub output_path: PathBuf,
    pub site_name: String,
    pub depth_column: String,
    pub velocity_column: Option<String>,
    pub pipe_shape: String,
    pub pipe_size: String,
    pub records: usize,
    pub null_readings: NullReadings,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RainfallConversionSummary {
    pub output_path: PathBuf,
    pub site_name: String,
    pub rainfall_column: String,
    pub records: usize,
    pub null_readings: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct R3Summary {
    pub width: f64,
    pub height: f64,
    pub egg_form: String,
    pub r3: f64,
}

/// Accepts the `datetime-local` form as well as the canonical one.
pub fn parse_session_timestamp(timestamp: &str) -> Result<NaiveDateTime, SessionError> {
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT))
        .map_err(|_| SessionError::InvalidTimestamp(timestamp.to_string()))
}

/// State of one conversion session: the processed series and the site it
/// belongs to.
pub struct CommandHandler {
    filepath: PathBuf,
    site_id: String,
    site_name: String,
    data_frame: Option<DataFrame>,
    start_timestamp: Option<NaiveDateTime>,
    end_timestamp: Option<NaiveDateTime>,
    column_mapping: ColumnMapping,
    monitor_type: MonitorType,
    interval: Duration,
    gaps: usize,
    time_col: Option<String>,
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHandler {
    pub fn new() -> CommandHandler {
        CommandHandler {
            filepath: PathBuf::new(),
            site_id: String::new(),
            site_name: String::new(),
            data_frame: None,
            start_timestamp: None,
            end_timestamp: None,
            column_mapping: ColumnMapping::new(),
            monitor_type: MonitorType::Unknown,
            interval: Duration::zero(),
            gaps: 0,
            time_col: None,
        }
    }

    pub fn process_file(&mut self, file_path: &Path) -> Result<ProcessedFileSummary, SessionError> {
        self.filepath = file_path.to_path_buf();
        let mut file_processor = FileProcessor::new(None)?;
        let processed_data = file_processor.process_file(file_path).map_err(|e| {
            log::error!("Error processing file: {}", e);
            e
        })?;
        self.update_from_processed_data(processed_data);

        log::info!("File processed successfully.");
        log::info!("Gaps: {}", self.gaps);
        log::info!("Range: {} to {}", self.start_string(), self.end_string());
        log::info!("Monitor type: {}", self.monitor_type);

        Ok(ProcessedFileSummary {
            column_mapping: self.column_mapping.clone(),
            monitor_type: self.monitor_type,
            start_timestamp: self.start_string(),
            end_timestamp: self.end_string(),
            interval: self.interval.num_seconds(),
            site_id: self.site_id.clone(),
            site_name: self.site_name.clone(),
            gaps: self.gaps,
            row_count: self.data_frame.as_ref().map_or(0, |df| df.height()),
        })
    }

    fn update_from_processed_data(&mut self, processed_data: ProcessedFileData) {
        self.site_id = processed_data.site_id;
        self.site_name = processed_data.site_name;
        self.data_frame = Some(processed_data.df);
        self.start_timestamp = Some(processed_data.start_timestamp);
        self.end_timestamp = Some(processed_data.end_timestamp);
        self.column_mapping = processed_data.column_mapping;
        self.monitor_type = processed_data.monitor_type;
        self.interval = processed_data.interval;
        self.gaps = processed_data.gaps_filled;
        self.time_col = Some(processed_data.time_col);
    }

    fn start_string(&self) -> String {
        self.start_timestamp
            .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    }

    fn end_string(&self) -> String {
        self.end_timestamp
            .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    }

    pub fn update_timestamps(
        &mut self,
        start_time: &str,
        end_time: &str,
    ) -> Result<TimestampUpdateSummary, SessionError> {
        let new_start = parse_session_timestamp(start_time)?;
        let new_end = parse_session_timestamp(end_time)?;

        let mut file_processor = FileProcessor::new(None)?;
        file_processor.df = Some(self.data_frame.clone().ok_or(SessionError::NoData)?);
        file_processor.time_col = self.time_col.clone();
        file_processor.interval = Some(self.interval);

        let updated_data = file_processor.update_timestamps(new_start, new_end).map_err(|e| {
            log::error!("Error updating timestamps: {}", e);
            e
        })?;
        self.start_timestamp = Some(updated_data.start_timestamp);
        self.end_timestamp = Some(updated_data.end_timestamp);
        self.interval = updated_data.interval;
        self.data_frame = file_processor.df;

        log::info!(
            "Timestamps updated. New range: {} to {}",
            self.start_string(),
            self.end_string()
        );

        Ok(TimestampUpdateSummary {
            start_timestamp: self.start_string(),
            end_timestamp: self.end_string(),
            interval: self.interval.num_seconds(),
            row_count: updated_data.row_count,
        })
    }

    pub fn update_site_id(&mut self, site_id: String) {
        self.site_id = site_id;
        log::info!("Site ID updated. {}", self.site_id);
    }

    pub fn update_site_name(&mut self, site_name: String) {
        self.site_name = site_name;
        log::info!("Site name updated. {}", self.site_name);
    }

    pub fn reset(&mut self) {
        *self = CommandHandler::new();
        clear_logs();
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    pub fn monitor_type(&self) -> MonitorType {
        self.monitor_type
    }

    pub fn column_mapping(&self) -> &ColumnMapping {
        &self.column_mapping
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn data_frame(&self) -> Option<&DataFrame> {
        self.data_frame.as_ref()
    }

    fn loaded(&self) -> Result<(&DataFrame, NaiveDateTime, NaiveDateTime), SessionError> {
        match (self.data_frame.as_ref(), self.start_timestamp, self.end_timestamp) {
            (Some(df), Some(start), Some(end)) => Ok((df, start, end)),
            _ => Err(SessionError::NoData),
        }
    }

    fn resolve_column(&self, requested: Option<&str>, kind: ColumnKind) -> Result<String, SessionError> {
        requested
            .or_else(|| first_column(&self.column_mapping, kind))
            .map(String::from)
            .ok_or(SessionError::MissingColumn(kind))
    }

    /// Writes the flow file for the loaded series.
    ///
    /// Unnamed columns default to the first depth and velocity columns the
    /// headers were classified as; a depth-only file gets zero velocity.
    pub fn create_fdv_flow(
        &mut self,
        output_path: &Path,
        depth_col: Option<&str>,
        velocity_col: Option<&str>,
        pipe_shape: &str,
        pipe_size: &str,
    ) -> Result<FlowConversionSummary, SessionError> {
        let (df, start, end) = self.loaded()?;
        let depth_col = self.resolve_column(depth_col, ColumnKind::Depth)?;
        let velocity_col = velocity_col
            .or_else(|| first_column(&self.column_mapping, ColumnKind::Velocity))
            .map(String::from);

        let shape: PipeShape = pipe_shape.parse()?;
        let pipe = build_calculator(shape, pipe_size)?;
        let readings = columns::flow_readings(df, &depth_col, velocity_col.as_deref())?;

        let mut writer = FlowFileWriter::new(BufWriter::new(File::create(output_path)?));
        writer.set_site_name(&self.site_name);
        writer.set_pipe_size(pipe.pipe_size);
        writer.set_calculator(pipe.calculator);
        writer.set_starting_time(start);
        writer.set_ending_time(end);
        writer.set_interval(self.interval.num_minutes());
        writer.create_fdv_flow(readings)?;

        let null_readings = NullReadings {
            depth: writer.null_readings(),
            velocity: writer.velocity_null_readings(),
        };
        let records = writer.records_written();
        writer.into_inner()?;

        log::info!("FDV flow created successfully. Output: {}", output_path.display());
        log::info!(
            "Null readings: Depth: {}, Velocity: {}",
            null_readings.depth,
            null_readings.velocity
        );

        Ok(FlowConversionSummary {
            output_path: output_path.to_path_buf(),
            site_name: self.site_name.clone(),
            depth_column: depth_col,
            velocity_column: velocity_col,
            pipe_shape: shape.to_string(),
            pipe_size: pipe_size.to_string(),
            records,
            null_readings,
        })
    }

    pub fn create_rainfall(
        &mut self,
        output_path: &Path,
        rainfall_col: Option<&str>,
    ) -> Result<RainfallConversionSummary, SessionError> {
        let (df, start, end) = self.loaded()?;
        let rainfall_col = self.resolve_column(rainfall_col, ColumnKind::Rainfall)?;
        let samples = columns::rainfall_samples(df, &rainfall_col)?;

        let mut writer = RainfallFileWriter::new(BufWriter::new(File::create(output_path)?));
        writer.set_site_name(&self.site_name);
        writer.set_starting_time(start);
        writer.set_ending_time(end);
        writer.set_interval(self.interval.num_minutes());
        let null_readings = writer.create_fdv_rainfall(samples)?;
        let records = writer.records_written();
        writer.into_inner()?;

        log::info!("Rainfall creation successful. Output: {}", output_path.display());
        log::info!("Null readings: {}", null_readings);

        Ok(RainfallConversionSummary {
            output_path: output_path.to_path_buf(),
            site_name: self.site_name.clone(),
            rainfall_column: rainfall_col,
            records,
            null_readings,
        })
    }

    pub fn calculate_r3(&self, width: f64, height: f64, egg_form: &str) -> Result<R3Summary, SessionError> {
        let form = egg_form.parse::<EggForm>().map_err(|e: String| {
            log::error!("{}", e);
            SessionError::InvalidParameter(e)
        })?;

        let r3 = r3_calculator(width, height, form).map_err(|e| {
            log::error!("Error calculating R3 value: {}", e);
            e
        })?;
        log::info!("R3 value calculated successfully: {}", r3);

        Ok(R3Summary {
            width,
            height,
            egg_form: form.to_string(),
            r3,
        })
    }
}
