use chrono::NaiveDateTime;
use std::collections::VecDeque;
use std::io::{self, Write};

use super::layout::{identifier_line, write_tail, RecordLines, TimeRange};
use super::FdvError;

/// Samples held back for redistribution before they are written.
pub const DRAIN_SIZE: usize = 10;
/// Intensities below this are treated as dry.
const DRY_THRESHOLD: f64 = 1.0e-5;
/// How many preceding dry samples a wet sample may be spread over.
const MAX_SPREAD: usize = 4;
/// Largest intensity spread back over a dry spell; the excess stays put.
const SPREAD_CAP: f64 = 6.0;

fn rainfall_header_lines() -> Vec<String> {
    vec![
        "**DATA_FORMAT:           1,ASCII".to_string(),
        identifier_line("SHUTTE"),
        "**FIELD:                 1,INTENSITY".to_string(),
        "**UNITS:                 1,MM/HR".to_string(),
        "**FORMAT:                2,F15.1,[5]".to_string(),
        "**RECORD_LENGTH:         I2,75".to_string(),
        "**CONSTANTS:             35,LOCATION,0_ANT_RAIN,1_ANT_RAIN,2_ANT_RAIN,".to_string(),
        "*+                       3_ANT_RAIN,4_ANT_RAIN,5_ANT_RAIN,6_ANT_RAIN,".to_string(),
        "*+                       7_ANT_RAIN,8_ANT_RAIN,9_ANT_RAIN,10_ANT_RAIN,".to_string(),
        "*+                       11_ANT_RAIN,12_ANT_RAIN,13_ANT_RAIN,14_ANT_RAIN,".to_string(),
        "*+                       15_ANT_RAIN,16_ANT_RAIN,17_ANT_RAIN,18_ANT_RAIN,".to_string(),
        "*+                       19_ANT_RAIN,20_ANT_RAIN,21_ANT_RAIN,22_ANT_RAIN,".to_string(),
        "*+                       23_ANT_RAIN,24_ANT_RAIN,25_ANT_RAIN,26_ANT_RAIN,".to_string(),
        "*+                       27_ANT_RAIN,28_ANT_RAIN,29_ANT_RAIN,30_ANT_RAIN,".to_string(),
        "*+                       START,END,INTERVAL".to_string(),
        "**C_UNITS:               35, ,MM,MM,MM,MM,MM,MM,MM,MM,MM,MM,".to_string(),
        "**C_UNITS:               MM,MM,MM,MM,MM,MM,MM,MM,MM,MM,MM,".to_string(),
        "**C_UNITS:               MM,MM,MM,MM,MM,MM,MM,MM,MM,MM,GMT,GMT,MIN".to_string(),
        "**C_FORMAT:              8,A20,F7.2/15F5.1/15F5.1/D10,2X,D10,I4".to_string(),
        "*CSTART".to_string(),
        "UNKNOWN              -1.0 ".to_string(),
        "-1.0 ".repeat(15),
        "-1.0 ".repeat(15),
    ]
}

/// Writes a rainfall intensity file, `%15.1f` per record, five to a line.
///
/// Samples pass through a short buffer so that a wet sample following a dry
/// spell can be spread back over up to four of the dry slots before they are
/// written.
pub struct RainfallFileWriter<W: Write> {
    output: W,
    header_lines: Vec<String>,
    time_range: TimeRange,
    lines: RecordLines,
    null_readings: usize,
    output_buffer: VecDeque<f64>,
}

impl<W: Write> RainfallFileWriter<W> {
    pub fn new(output: W) -> Self {
        RainfallFileWriter {
            output,
            header_lines: rainfall_header_lines(),
            time_range: TimeRange::default(),
            lines: RecordLines::default(),
            null_readings: 0,
            output_buffer: VecDeque::with_capacity(DRAIN_SIZE + 1),
        }
    }

    pub fn set_site_name(&mut self, site_name: &str) {
        self.header_lines[1] = identifier_line(site_name);
    }

    pub fn set_starting_time(&mut self, starting_time: NaiveDateTime) {
        self.time_range.start_ts = Some(starting_time);
    }

    pub fn set_ending_time(&mut self, ending_time: NaiveDateTime) {
        self.time_range.end_ts = Some(ending_time);
    }

    /// Logging interval in whole minutes.
    pub fn set_interval(&mut self, interval: i64) {
        self.time_range.interval = Some(interval);
    }

    pub fn write_header(&mut self) -> Result<(), FdvError> {
        self.time_range.validate()?;
        for line in &self.header_lines {
            writeln!(self.output, "{}", line)?;
        }
        self.time_range.write(&mut self.output)
    }

    /// Writes buffered samples, oldest first, until `drain_size` remain.
    pub fn drain_output_buffer(&mut self, drain_size: usize) -> io::Result<()> {
        while self.output_buffer.len() > drain_size {
            if let Some(sample) = self.output_buffer.pop_front() {
                self.lines
                    .write_record(&mut self.output, format_args!("{:15.1}", sample))?;
            }
        }
        Ok(())
    }

    pub fn insert_value(&mut self, sample_value: f64) -> io::Result<()> {
        let mut sample = sample_value;
        if sample > DRY_THRESHOLD {
            let dry = self
                .output_buffer
                .iter()
                .rev()
                .take(MAX_SPREAD)
                .take_while(|&&pending| pending < DRY_THRESHOLD)
                .count();
            let first_dry = self.output_buffer.len() - dry;

            if dry > 0 && sample > SPREAD_CAP {
                let spread = SPREAD_CAP / dry as f64;
                for pending in self.output_buffer.range_mut(first_dry..) {
                    *pending = spread;
                }
                sample = sample_value - SPREAD_CAP;
            } else {
                sample /= (dry + 1) as f64;
                for pending in self.output_buffer.range_mut(first_dry..) {
                    *pending = sample;
                }
            }
        }

        self.output_buffer.push_back(sample);
        if self.output_buffer.len() >= DRAIN_SIZE {
            self.drain_output_buffer(DRAIN_SIZE)?;
        }
        Ok(())
    }

    /// Feeds every sample through the redistribution buffer, then flushes it.
    ///
    /// Missing samples are written as 0.0 and counted; the count is returned.
    pub fn write_values<I>(&mut self, samples: I) -> Result<usize, FdvError>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        self.lines.reset();
        self.output_buffer.clear();
        self.null_readings = 0;

        for sample in samples {
            let value = match sample.filter(|v| !v.is_nan()) {
                Some(value) => value,
                None => {
                    self.null_readings += 1;
                    0.0
                }
            };
            self.insert_value(value)?;
        }

        self.drain_output_buffer(0)?;
        self.lines.finish_line(&mut self.output)?;

        Ok(self.null_readings)
    }

    pub fn write_tail(&mut self) -> Result<(), FdvError> {
        write_tail(&mut self.output)?;
        self.output.flush()?;
        Ok(())
    }

    pub fn create_fdv_rainfall<I>(&mut self, samples: I) -> Result<usize, FdvError>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        self.write_header()?;
        self.write_values(samples)?;
        self.write_tail()?;

        log::info!(
            "FDV rainfall creation completed successfully. Records: {}. Null readings: {}",
            self.lines.value_count(),
            self.null_readings
        );

        Ok(self.null_readings)
    }

    pub fn null_readings(&self) -> usize {
        self.null_readings
    }

    pub fn records_written(&self) -> usize {
        self.lines.value_count()
    }

    pub fn pending_samples(&self) -> usize {
        self.output_buffer.len()
    }

    pub fn into_inner(mut self) -> Result<W, FdvError> {
        self.output.flush()?;
        Ok(self.output)
    }
}
