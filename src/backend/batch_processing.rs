use crate::backend::command_handler::{CommandHandler, SessionError};
use crate::backend::config::ConversionJob;
use crate::backend::site_info::MonitorType;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

pub const ZIP_FILE_NAME: &str = "processed_files.zip";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFileInfo {
    pub input_path: PathBuf,
    pub monitor_type: MonitorType,
    pub conversion_output_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchProcessingError {
    #[error("File processing error: {0}")]
    FileProcessingError(String),
    #[error("{path}: {source}")]
    Session {
        path: PathBuf,
        #[source]
        source: SessionError,
    },
    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Default)]
pub struct BatchProcessor {
    pub processed_files: Vec<ProcessedFileInfo>,
}

impl BatchProcessor {
    pub fn new() -> Self {
        BatchProcessor::default()
    }

    /// Converts every job in parallel and packs the outputs into
    /// `processed_files.zip` inside `output_dir`. One failed job fails the batch.
    pub fn process_convert_and_zip(
        &mut self,
        jobs: &[ConversionJob],
        output_dir: &Path,
    ) -> Result<PathBuf, BatchProcessingError> {
        let start_time = Instant::now();
        log::info!("Starting batch processing {} files...", jobs.len());

        fs::create_dir_all(output_dir)?;

        let results: Result<Vec<_>, _> = jobs
            .par_iter()
            .map(|job| {
                log::info!("Processing file: {:?}", job.filepath);

                if !job.filepath.exists() {
                    return Err(BatchProcessingError::FileProcessingError(format!(
                        "Input file does not exist: {:?}",
                        job.filepath
                    )));
                }

                Self::process_and_convert_file(job, output_dir).map_err(|source| {
                    BatchProcessingError::Session {
                        path: job.filepath.clone(),
                        source,
                    }
                })
            })
            .collect();

        self.processed_files = results.map_err(|e| {
            log::error!("Error during processing or conversion: {}", e);
            e
        })?;

        log::info!("File processing and conversion completed. Starting zip creation...");

        let zip_path = output_dir.join(ZIP_FILE_NAME);
        self.create_zip_file(&zip_path)?;

        log::info!(
            "Batch processing and zipping completed in {:?}. Output zip file: {:?}",
            start_time.elapsed(),
            zip_path
        );

        Ok(zip_path)
    }

    /// Runs one job in its own session.
    fn process_and_convert_file(
        job: &ConversionJob,
        output_dir: &Path,
    ) -> Result<ProcessedFileInfo, SessionError> {
        let mut handler = CommandHandler::new();
        handler.process_file(&job.filepath)?;

        if let Some(site_name) = &job.sitename {
            handler.update_site_name(site_name.clone());
        }
        if job.start.is_some() || job.end.is_some() {
            let (start, end) = match (&job.start, &job.end) {
                (Some(start), Some(end)) => (start.clone(), end.clone()),
                _ => {
                    return Err(SessionError::InvalidParameter(
                        "A time range needs both start and end".to_string(),
                    ))
                }
            };
            handler.update_timestamps(&start, &end)?;
        }

        let monitor_type = handler.monitor_type();
        let output_filename = format!("{}.{}", handler.site_name(), monitor_type.output_extension());
        let output_path = output_dir.join(output_filename);

        match monitor_type {
            MonitorType::Flow | MonitorType::Depth => {
                let pipe_shape = job.pipeshape.as_deref().ok_or_else(|| {
                    SessionError::InvalidParameter(
                        "Pipe shape is required for flow/depth conversion".to_string(),
                    )
                })?;
                let pipe_size = job.pipesize.as_deref().ok_or_else(|| {
                    SessionError::InvalidParameter(
                        "Pipe size is required for flow/depth conversion".to_string(),
                    )
                })?;
                handler.create_fdv_flow(&output_path, None, None, pipe_shape, pipe_size)?;
            }
            MonitorType::Rainfall => {
                handler.create_rainfall(&output_path, None)?;
            }
            MonitorType::Unknown => {
                return Err(SessionError::InvalidParameter(format!(
                    "Unsupported monitor type: {}",
                    monitor_type
                )))
            }
        }

        Ok(ProcessedFileInfo {
            input_path: job.filepath.clone(),
            monitor_type,
            conversion_output_path: output_path,
        })
    }

    fn create_zip_file(&self, zip_path: &Path) -> Result<(), BatchProcessingError> {
        let mut zip = ZipWriter::new(File::create(zip_path)?);

        for processed_file in &self.processed_files {
            let options: FileOptions<'static, ()> = FileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(0o644);
            let output_path = &processed_file.conversion_output_path;
            log::info!("Adding file to zip: {:?}", output_path);
            let file_name = output_path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| {
                    BatchProcessingError::FileProcessingError(
                        "Invalid or non-UTF8 file name".to_string(),
                    )
                })?;
            zip.start_file(file_name, options)?;
            let mut file = File::open(output_path)?;
            io::copy(&mut file, &mut zip)?;
        }
        zip.finish()?;
        Ok(())
    }
}
