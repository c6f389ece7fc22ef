use crate::backend::site_info::{ColumnInfo, ColumnKind, ColumnMapping, MonitorType, SiteInfo};
use calamine::{open_workbook, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use log::{error, info, warn};
use polars::prelude::*;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

/// Canonical timestamp rendering used across the session layer.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TIMESTAMP_FORMATS: [&str; 8] = [
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y%m%d%H%M%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];
const FORMAT_SAMPLE_ROWS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    pub headers: Vec<String>,
    pub data: Vec<Vec<String>>,
}

impl FileData {
    fn column_index(&self, column: &str) -> Result<usize, FileProcessorError> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or(FileProcessorError::TimestampColumnNotFound)
    }
}

pub struct FileProcessor {
    timestamp_keywords: Vec<String>,
    pub(crate) time_col: Option<String>,
    pub df: Option<DataFrame>,
    pub(crate) interval: Option<Duration>,
    column_patterns: Vec<(ColumnKind, Regex)>,
    site_info: SiteInfo,
}

pub struct ProcessedFileData {
    pub df: DataFrame,
    pub time_col: String,
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    pub gaps_filled: usize,
    pub interval: Duration,
    pub column_mapping: ColumnMapping,
    pub monitor_type: MonitorType,
    pub site_id: String,
    pub site_name: String,
}

pub struct UpdatedTimestampData {
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    pub interval: Duration,
    pub row_count: usize,
}

#[derive(Error, Debug)]
pub enum FileProcessorError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Unsupported file format: {0}")]
    UnsupportedFileFormat(String),
    #[error("FileData is empty")]
    EmptyFileData,
    #[error("Timestamp column not found")]
    TimestampColumnNotFound,
    #[error("Unable to identify timestamp format")]
    TimestampFormatNotIdentified,
    #[error("No sheets found in Excel file")]
    SheetNotFound,
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Excel error: {0}")]
    ExcelError(#[from] calamine::XlsxError),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Pattern error: {0}")]
    RegexError(#[from] regex::Error),
}

/// Most frequent gap between consecutive sorted timestamps.
///
/// Ties go to the shorter interval.
pub fn modal_interval(timestamps: &[NaiveDateTime]) -> Option<Duration> {
    let mut intervals: BTreeMap<Duration, usize> = BTreeMap::new();
    for window in timestamps.windows(2) {
        if let [prev, next] = window {
            let diff = *next - *prev;
            if diff > Duration::zero() {
                *intervals.entry(diff).or_insert(0) += 1;
            }
        }
    }
    intervals
        .into_iter()
        .rev()
        .max_by_key(|&(_, count)| count)
        .map(|(interval, _)| interval)
}

/// Last day Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// `None` for numbers that cannot be an Excel serial date, such as
/// `20240101000000` written as a plain number.
fn excel_serial_to_datetime(epoch: NaiveDateTime, serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let days = Duration::try_days(serial.trunc() as i64)?;
    let seconds = Duration::try_seconds((serial.fract() * 86400.0).round() as i64)?;
    epoch.checked_add_signed(days)?.checked_add_signed(seconds)
}

impl FileProcessor {
    pub fn new(timestamp_keywords: Option<Vec<String>>) -> Result<Self, FileProcessorError> {
        let column_patterns = vec![
            (ColumnKind::Depth, Regex::new(r"(?i)(\d+)_(\d+)\|.*(Depth|Level)\|(m|mm)")?),
            (ColumnKind::Flow, Regex::new(r"(?i)(\d+)_(\d+)\|.*Flow\|(l/s|m3/s)")?),
            (ColumnKind::Velocity, Regex::new(r"(?i)(\d+)_(\d+)\|.*Velocity\|m/s")?),
            (ColumnKind::Rainfall, Regex::new(r"(?i)(\d+)_(\d+)\|.*Rainfall\|mm")?),
        ];

        Ok(FileProcessor {
            timestamp_keywords: timestamp_keywords.unwrap_or_else(|| {
                ["timestamp", "time stamp", "time", "date", "datetime"]
                    .iter()
                    .map(|k| k.to_string())
                    .collect()
            }),
            time_col: None,
            df: None,
            interval: None,
            column_patterns,
            site_info: SiteInfo::new()?,
        })
    }

    pub fn read_file(&self, file_path: &Path) -> Result<FileData, FileProcessorError> {
        if !file_path.exists() {
            return Err(FileProcessorError::FileNotFound(file_path.display().to_string()));
        }
        let extension = file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| FileProcessorError::UnsupportedFileFormat("Unknown".to_string()))?;

        match extension.to_lowercase().as_str() {
            "xlsx" => self.read_excel(file_path),
            "csv" => self.read_csv(file_path),
            _ => {
                error!("Unsupported file format: {}", extension);
                Err(FileProcessorError::UnsupportedFileFormat(extension.to_string()))
            }
        }
    }

    fn read_excel(&self, file_path: &Path) -> Result<FileData, FileProcessorError> {
        info!("Reading Excel file: {}", file_path.display());

        let mut workbook: Xlsx<_> = open_workbook(file_path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(FileProcessorError::SheetNotFound)?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());
        let headers = rows.next().unwrap_or_default();
        let data: Vec<Vec<String>> = rows.collect();

        if data.is_empty() {
            error!("Excel file is empty: {}", file_path.display());
            return Err(FileProcessorError::EmptyFileData);
        }
        let mut file_data = FileData { headers, data };
        self.convert_excel_timestamp(&mut file_data)?;

        Ok(file_data)
    }

    fn read_csv(&self, file_path: &Path) -> Result<FileData, FileProcessorError> {
        info!("Reading CSV file: {}", file_path.display());

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(file_path)?;

        let headers = reader.headers()?.iter().map(|s| s.trim().to_string()).collect();
        let data: Vec<Vec<String>> = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(|s| s.to_string()).collect()))
            .collect::<Result<_, _>>()?;

        if data.is_empty() {
            error!("CSV file is empty: {}", file_path.display());
            return Err(FileProcessorError::EmptyFileData);
        }

        Ok(FileData { headers, data })
    }

    /// Rewrites Excel serial day numbers in the timestamp column as text.
    pub fn convert_excel_timestamp(&self, file_data: &mut FileData) -> Result<(), FileProcessorError> {
        let timestamp_column = self.identify_timestamp_column(file_data)?;
        let column_index = file_data.column_index(&timestamp_column)?;

        let excel_epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| FileProcessorError::ParseError("Invalid Excel epoch".to_string()))?;

        file_data.data.par_iter_mut().for_each(|row| {
            if let Some(timestamp) = row.get_mut(column_index) {
                if let Some(datetime) = timestamp
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(|serial| excel_serial_to_datetime(excel_epoch, serial))
                {
                    *timestamp = datetime.format(TIMESTAMP_FORMAT).to_string();
                }
            }
        });
        Ok(())
    }

    pub fn identify_timestamp_column(&self, file_data: &FileData) -> Result<String, FileProcessorError> {
        file_data
            .headers
            .iter()
            .find(|col| {
                let lower = col.to_lowercase();
                self.timestamp_keywords.iter().any(|keyword| lower.contains(keyword.as_str()))
            })
            .cloned()
            .ok_or(FileProcessorError::TimestampColumnNotFound)
    }

    /// Picks the format that parses most of the leading rows.
    pub fn identify_timestamp_format(
        &self,
        file_data: &FileData,
        timestamp_column: &str,
    ) -> Result<&'static str, FileProcessorError> {
        let column_index = file_data.column_index(timestamp_column)?;
        let mut format_counts = [0usize; TIMESTAMP_FORMATS.len()];
        for row in file_data.data.iter().take(FORMAT_SAMPLE_ROWS) {
            if let Some(timestamp) = row.get(column_index) {
                let timestamp = timestamp.trim();
                if let Some(found) = TIMESTAMP_FORMATS
                    .iter()
                    .position(|format| NaiveDateTime::parse_from_str(timestamp, format).is_ok())
                {
                    format_counts[found] += 1;
                }
            }
        }

        format_counts
            .iter()
            .enumerate()
            .rev()
            .filter(|&(_, &count)| count > 0)
            .max_by_key(|&(_, &count)| count)
            .map(|(index, _)| TIMESTAMP_FORMATS[index])
            .ok_or(FileProcessorError::TimestampFormatNotIdentified)
    }

    /// Parses every row's timestamp, dropping rows that do not parse.
    fn parse_rows<'a>(
        &self,
        file_data: &'a FileData,
        column_index: usize,
        format: &str,
    ) -> Result<Vec<(NaiveDateTime, &'a Vec<String>)>, FileProcessorError> {
        let mut rows: Vec<(NaiveDateTime, &Vec<String>)> = file_data
            .data
            .par_iter()
            .filter_map(|row| {
                row.get(column_index)
                    .and_then(|ts| NaiveDateTime::parse_from_str(ts.trim(), format).ok())
                    .map(|ts| (ts, row))
            })
            .collect();

        let skipped = file_data.data.len() - rows.len();
        if skipped > 0 {
            warn!("Skipped {} rows with unreadable timestamps", skipped);
        }
        if rows.is_empty() {
            return Err(FileProcessorError::ParseError("No valid timestamps found".to_string()));
        }
        rows.sort_by_key(|(ts, _)| *ts);
        Ok(rows)
    }

    /// Builds a regular series from the first to the last timestamp, one row
    /// per interval, inserting empty rows where the logger recorded nothing.
    pub fn create_timestamp_series(
        &mut self,
        file_data: &FileData,
        timestamp_column: &str,
        format: &str,
    ) -> Result<(DataFrame, usize), FileProcessorError> {
        let column_index = file_data.column_index(timestamp_column)?;
        let rows = self.parse_rows(file_data, column_index, format)?;
        let timestamps: Vec<NaiveDateTime> = rows.iter().map(|(ts, _)| *ts).collect();

        let (start, end) = match (timestamps.first(), timestamps.last()) {
            (Some(start), Some(end)) => (*start, *end),
            _ => return Err(FileProcessorError::ParseError("No valid timestamps found".to_string())),
        };
        let interval = modal_interval(&timestamps).ok_or_else(|| {
            FileProcessorError::ParseError("Could not determine a mode interval".to_string())
        })?;
        self.interval = Some(interval);

        let data_map: HashMap<NaiveDateTime, &Vec<String>> = rows.into_iter().collect();

        let mut series_timestamps = Vec::new();
        let mut series_rows: Vec<Option<&Vec<String>>> = Vec::new();
        let mut gap_count = 0;
        let mut current = start;
        while current <= end {
            let row = data_map.get(&current).copied();
            if row.is_none() {
                gap_count += 1;
            }
            series_timestamps.push(current);
            series_rows.push(row);
            current += interval;
        }
        if data_map.len() + gap_count > series_rows.len() {
            warn!(
                "{} rows fall between {}-second interval slots and were dropped",
                data_map.len() + gap_count - series_rows.len(),
                interval.num_seconds()
            );
        }

        let mut columns = Vec::with_capacity(file_data.headers.len());
        for (i, header) in file_data.headers.iter().enumerate() {
            let series = if i == column_index {
                Series::new(header.as_str().into(), series_timestamps.clone())
            } else {
                let values: Vec<Option<f64>> = series_rows
                    .iter()
                    .map(|row| {
                        row.and_then(|r| r.get(i))
                            .and_then(|cell| cell.trim().parse::<f64>().ok())
                            .filter(|v| v.is_finite())
                    })
                    .collect();
                Series::new(header.as_str().into(), values)
            };
            columns.push(series);
        }

        Ok((DataFrame::new(columns)?, gap_count))
    }

    fn extract_columns(pattern: &Regex, df_columns: &[String]) -> Vec<ColumnInfo> {
        df_columns
            .iter()
            .enumerate()
            .filter_map(|(index, col)| {
                pattern.captures(col).map(|caps| ColumnInfo {
                    name: col.to_string(),
                    index,
                    site_id: caps.get(1).map(|m| m.as_str().to_string()),
                    channel: caps.get(2).map(|m| m.as_str().to_string()),
                })
            })
            .collect()
    }

    pub fn get_column_mapping(&self) -> Result<ColumnMapping, FileProcessorError> {
        let df = self
            .df
            .as_ref()
            .ok_or_else(|| FileProcessorError::ParseError("DataFrame not available".to_string()))?;
        let df_columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

        let mut column_mapping = ColumnMapping::new();
        if let Some(timestamp_col) = self.time_col.as_ref() {
            if let Some(index) = df_columns.iter().position(|c| c == timestamp_col) {
                column_mapping.insert(
                    ColumnKind::Timestamp,
                    vec![ColumnInfo {
                        name: timestamp_col.clone(),
                        index,
                        site_id: None,
                        channel: None,
                    }],
                );
            }
        }
        for (kind, pattern) in &self.column_patterns {
            let cols = Self::extract_columns(pattern, &df_columns);
            if !cols.is_empty() {
                column_mapping.insert(*kind, cols);
            }
        }
        Ok(column_mapping)
    }

    pub fn process_file(&mut self, file_path: &Path) -> Result<ProcessedFileData, FileProcessorError> {
        let file_data = self.read_file(file_path)?;
        let timestamp_column = self.identify_timestamp_column(&file_data)?;
        self.time_col = Some(timestamp_column.clone());
        let timestamp_format = self.identify_timestamp_format(&file_data, &timestamp_column)?;
        info!("Timestamp column '{}' uses format {}", timestamp_column, timestamp_format);

        let (df, gaps_filled) =
            self.create_timestamp_series(&file_data, &timestamp_column, timestamp_format)?;
        let (start_timestamp, end_timestamp) = time_bounds(&df, &timestamp_column)?;
        self.df = Some(df.clone());

        let column_mapping = self.get_column_mapping()?;
        let file_name = file_path.to_string_lossy();
        self.site_info.extract_site_info(&file_name, &column_mapping);

        let interval = self.interval.ok_or_else(|| {
            FileProcessorError::ParseError("Could not determine a mode interval".to_string())
        })?;

        Ok(ProcessedFileData {
            df,
            time_col: timestamp_column,
            start_timestamp,
            end_timestamp,
            gaps_filled,
            interval,
            column_mapping,
            monitor_type: self.site_info.monitor_type(),
            site_id: self.site_info.site_id().to_string(),
            site_name: self.site_info.site_name().to_string(),
        })
    }

    /// Narrows the loaded series to `[new_start, new_end]`.
    pub fn update_timestamps(
        &mut self,
        new_start: NaiveDateTime,
        new_end: NaiveDateTime,
    ) -> Result<UpdatedTimestampData, FileProcessorError> {
        let df = self.df.as_ref().ok_or_else(|| {
            FileProcessorError::ParseError("No data loaded. Cannot update timestamps.".to_string())
        })?;
        let time_col = self.time_col.as_ref().ok_or(FileProcessorError::TimestampColumnNotFound)?;

        if new_start >= new_end {
            return Err(FileProcessorError::ParseError(
                "Start time must be before end time".to_string(),
            ));
        }

        let mask = df
            .column(time_col)?
            .datetime()?
            .as_datetime_iter()
            .map(|opt_dt| opt_dt.map(|dt| dt >= new_start && dt <= new_end).unwrap_or(false))
            .collect::<BooleanChunked>();

        let filtered_df = df.filter(&mask)?;
        if filtered_df.height() == 0 {
            return Err(FileProcessorError::ParseError(
                "No data in the specified time range".to_string(),
            ));
        }

        let (start_timestamp, end_timestamp) = time_bounds(&filtered_df, time_col)?;
        let interval = match self.interval {
            Some(interval) => interval,
            None => {
                let timestamps = datetimes(&filtered_df, time_col)?;
                modal_interval(&timestamps).ok_or_else(|| {
                    FileProcessorError::ParseError("Could not determine a mode interval".to_string())
                })?
            }
        };
        self.interval = Some(interval);

        let row_count = filtered_df.height();
        self.df = Some(filtered_df);

        Ok(UpdatedTimestampData {
            start_timestamp,
            end_timestamp,
            interval,
            row_count,
        })
    }
}

fn datetimes(df: &DataFrame, time_col: &str) -> Result<Vec<NaiveDateTime>, FileProcessorError> {
    Ok(df
        .column(time_col)?
        .datetime()?
        .as_datetime_iter()
        .flatten()
        .collect())
}

fn time_bounds(
    df: &DataFrame,
    time_col: &str,
) -> Result<(NaiveDateTime, NaiveDateTime), FileProcessorError> {
    let timestamps = datetimes(df, time_col)?;
    match (timestamps.iter().min(), timestamps.iter().max()) {
        (Some(start), Some(end)) => Ok((*start, *end)),
        _ => Err(FileProcessorError::ParseError("No valid timestamps found".to_string())),
    }
}
