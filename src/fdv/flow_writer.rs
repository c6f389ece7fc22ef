use chrono::NaiveDateTime;
use std::io::Write;

use super::layout::{identifier_line, write_tail, RecordLines, TimeRange};
use super::FdvError;
use crate::calculations::{Calculator, UNKNOWN_PIPE_SIZE};

const PIPE_SIZE_LINE: usize = 11;

fn flow_header_lines() -> Vec<String> {
    vec![
        "**DATA_FORMAT:           1,ASCII".to_string(),
        identifier_line("SHUTTERT"),
        "**FIELD:                 3,FLOW,DEPTH,VELOCITY".to_string(),
        "**UNITS:                 3,L/S,MM,M/S".to_string(),
        "**FORMAT:                3,2I5,F5,[5]".to_string(),
        "**RECORD_LENGTH:         I2,75".to_string(),
        "**CONSTANTS:             6,HEIGHT,MIN_VEL,MANHOLE_NO,".to_string(),
        "*+START,END,INTERVAL".to_string(),
        "**C_UNITS:               6,MM,M/S,,GMT,GMT,MIN".to_string(),
        "**C_FORMAT:              10,I5,1X,F5,1X,A20/D10,1X,D10,1X,I2".to_string(),
        "*CSTART".to_string(),
        pipe_size_line(UNKNOWN_PIPE_SIZE),
    ]
}

fn pipe_size_line(pipe_size: f64) -> String {
    format!("{:7.3} UNKNOWN", pipe_size)
}

/// One logger row feeding a flow file. `None` marks a missing reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowReading {
    pub depth: Option<f64>,
    pub velocity: Option<f64>,
}

impl FlowReading {
    pub fn new(depth: f64, velocity: f64) -> Self {
        FlowReading {
            depth: Some(depth),
            velocity: Some(velocity),
        }
    }
}

/// Writes a flow/depth/velocity (FDV) file for one site and time range.
///
/// Each record is `flow depth velocity` formatted `%5.0f%5.0f%5.2f` (L/s, mm,
/// m/s), five records to a line. The writer owns its output for the length of
/// the conversion.
pub struct FlowFileWriter<W: Write> {
    output: W,
    header_lines: Vec<String>,
    time_range: TimeRange,
    calculator: Option<Box<dyn Calculator>>,
    lines: RecordLines,
    null_readings: usize,
    velocity_null_readings: usize,
}

impl<W: Write> FlowFileWriter<W> {
    pub fn new(output: W) -> Self {
        FlowFileWriter {
            output,
            header_lines: flow_header_lines(),
            time_range: TimeRange::default(),
            calculator: None,
            lines: RecordLines::default(),
            null_readings: 0,
            velocity_null_readings: 0,
        }
    }

    /// Pipe size in metres, or `UNKNOWN_PIPE_SIZE` when the section has none.
    pub fn set_pipe_size(&mut self, pipe_size: f64) {
        self.header_lines[PIPE_SIZE_LINE] = pipe_size_line(pipe_size);
    }

    pub fn set_site_name(&mut self, site_name: &str) {
        self.header_lines[1] = identifier_line(site_name);
    }

    pub fn set_calculator(&mut self, calculator: Box<dyn Calculator>) {
        self.calculator = Some(calculator);
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

    pub fn validate_parameters(&self) -> Result<(), FdvError> {
        self.time_range.validate()?;
        if self.calculator.is_none() {
            return Err(FdvError::InvalidParameter(
                "Calculator is not set. Use set_calculator().".to_string(),
            ));
        }
        Ok(())
    }

    pub fn write_header(&mut self) -> Result<(), FdvError> {
        self.validate_parameters()?;
        for line in &self.header_lines {
            writeln!(self.output, "{}", line)?;
        }
        self.time_range.write(&mut self.output)
    }

    /// Writes one record per reading and returns the number of missing depths.
    ///
    /// Missing values are written as 0.0. A zero depth or velocity gives zero
    /// flow without consulting the calculator.
    pub fn write_values<I>(&mut self, readings: I) -> Result<usize, FdvError>
    where
        I: IntoIterator<Item = FlowReading>,
    {
        let calculator = self.calculator.as_ref().ok_or_else(|| {
            FdvError::InvalidParameter("Calculator is not set. Use set_calculator().".to_string())
        })?;

        self.lines.reset();
        self.null_readings = 0;
        self.velocity_null_readings = 0;

        for reading in readings {
            let depth = match reading.depth.filter(|v| !v.is_nan()) {
                Some(depth) => depth,
                None => {
                    self.null_readings += 1;
                    0.0
                }
            };
            let velocity = match reading.velocity.filter(|v| !v.is_nan()) {
                Some(velocity) => velocity,
                None => {
                    self.velocity_null_readings += 1;
                    0.0
                }
            };

            let flow = if depth == 0.0 || velocity == 0.0 {
                0.0
            } else {
                calculator.perform_calculation(depth, velocity)
            };

            self.lines.write_record(
                &mut self.output,
                format_args!(
                    "{:5.0}{:5.0}{:5.2}",
                    flow,
                    (depth * 1000.0).round_ties_even(),
                    velocity
                ),
            )?;
        }
        self.lines.finish_line(&mut self.output)?;

        Ok(self.null_readings)
    }

    pub fn write_tail(&mut self) -> Result<(), FdvError> {
        write_tail(&mut self.output)?;
        self.output.flush()?;
        Ok(())
    }

    /// Runs header, values and tail in order and returns the missing-depth count.
    pub fn create_fdv_flow<I>(&mut self, readings: I) -> Result<usize, FdvError>
    where
        I: IntoIterator<Item = FlowReading>,
    {
        self.write_header()?;
        self.write_values(readings)?;
        self.write_tail()?;

        log::info!(
            "FDV flow creation completed successfully. Records: {}. Null readings: Depth: {}, Velocity: {}",
            self.lines.value_count(),
            self.null_readings,
            self.velocity_null_readings
        );

        Ok(self.null_readings)
    }

    pub fn null_readings(&self) -> usize {
        self.null_readings
    }

    pub fn velocity_null_readings(&self) -> usize {
        self.velocity_null_readings
    }

    pub fn records_written(&self) -> usize {
        self.lines.value_count()
    }

    /// Flushes and hands back the output stream.
    pub fn into_inner(mut self) -> Result<W, FdvError> {
        self.output.flush()?;
        Ok(self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::circular_calculator::CircularCalculator;
    use crate::calculations::rectangular_calculator::RectangularCalculator;
    use chrono::NaiveDate;

    fn configured_writer() -> FlowFileWriter<Vec<u8>> {
        let mut writer = FlowFileWriter::new(Vec::new());
        writer.set_site_name("Bridge Street Outfall");
        writer.set_pipe_size(1.0);
        writer.set_starting_time(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        );
        writer.set_ending_time(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 55, 0).unwrap(),
        );
        writer.set_interval(5);
        writer.set_calculator(Box::new(RectangularCalculator::new(1.0).unwrap()));
        writer
    }

    fn output_of(writer: FlowFileWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn header_layout() {
        let mut writer = configured_writer();
        writer.write_header().unwrap();
        let text = output_of(writer);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 14);
        assert_eq!(lines[0], "**DATA_FORMAT:           1,ASCII");
        assert_eq!(lines[1], "**IDENTIFIER:            1,BRIDGE STREET O");
        assert_eq!(lines[11], "  1.000 UNKNOWN");
        assert_eq!(lines[12], "202401010000 202401010055   5");
        assert_eq!(lines[13], "*CEND");
    }

    #[test]
    fn unknown_pipe_size_marker() {
        let mut writer = configured_writer();
        writer.set_pipe_size(UNKNOWN_PIPE_SIZE);
        writer.write_header().unwrap();
        assert!(output_of(writer).contains("\n -1.000 UNKNOWN\n"));
    }

    #[test]
    fn record_formatting() {
        let mut writer = configured_writer();
        writer.write_values([FlowReading::new(0.2, 0.5)]).unwrap();
        assert_eq!(output_of(writer), "  100  200 0.50\n");
    }

    #[test]
    fn zero_depth_or_velocity_gives_zero_flow() {
        let mut writer = configured_writer();
        writer
            .write_values([FlowReading::new(0.0, 0.5), FlowReading::new(0.2, 0.0)])
            .unwrap();
        assert_eq!(output_of(writer), "    0    0 0.50    0  200 0.00\n");
    }

    #[test]
    fn missing_values_are_zeroed_and_counted() {
        let mut writer = configured_writer();
        let readings = [
            FlowReading { depth: None, velocity: Some(0.5) },
            FlowReading { depth: Some(0.1), velocity: None },
            FlowReading { depth: Some(f64::NAN), velocity: Some(0.5) },
            FlowReading::new(0.1, 0.5),
        ];
        let nulls = writer.write_values(readings).unwrap();
        assert_eq!(nulls, 2);
        assert_eq!(writer.null_readings(), 2);
        assert_eq!(writer.velocity_null_readings(), 1);
        assert_eq!(
            output_of(writer),
            "    0    0 0.50    0  100 0.00    0    0 0.50   50  100 0.50\n"
        );
    }

    #[test]
    fn twelve_rows_make_three_data_lines() {
        let mut writer = configured_writer();
        let readings = vec![FlowReading::new(0.2, 0.5); 12];
        writer.create_fdv_flow(readings).unwrap();
        let text = output_of(writer);

        let data: Vec<&str> = text
            .lines()
            .skip_while(|line| *line != "*CEND")
            .skip(1)
            .take_while(|line| !line.is_empty())
            .collect();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0], "  100  200 0.50".repeat(5));
        assert_eq!(data[1].len(), 75);
        assert_eq!(data[2], "  100  200 0.50".repeat(2));
        assert!(text.ends_with("  100  200 0.50\n\n*END\n"));
    }

    #[test]
    fn whole_lines_end_without_blank_padding() {
        let mut writer = configured_writer();
        writer.create_fdv_flow(vec![FlowReading::new(0.2, 0.5); 10]).unwrap();
        let text = output_of(writer);
        assert!(text.ends_with(&format!("{}\n\n*END\n", "  100  200 0.50".repeat(5))));
    }

    #[test]
    fn circular_half_full_record() {
        let mut writer = configured_writer();
        writer.set_calculator(Box::new(CircularCalculator::new(0.5).unwrap()));
        writer.write_values([FlowReading::new(0.5, 1.0)]).unwrap();
        assert_eq!(output_of(writer), "  393  500 1.00\n");
    }

    #[test]
    fn half_millimetre_depths_round_to_even() {
        let mut writer = configured_writer();
        writer
            .write_values([
                FlowReading::new(0.0125, 0.5),
                FlowReading::new(0.0005, 0.5),
                FlowReading::new(0.0015, 0.5),
            ])
            .unwrap();
        let text = output_of(writer);
        let depths: Vec<&str> = text.split_whitespace().skip(1).step_by(3).collect();
        assert_eq!(depths, vec!["12", "0", "2"]);
    }

    #[test]
    fn header_requires_configuration() {
        let mut writer = FlowFileWriter::new(Vec::new());
        assert!(matches!(writer.write_header(), Err(FdvError::InvalidParameter(_))));

        let mut writer = configured_writer();
        writer.calculator = None;
        assert!(writer.write_header().is_err());
        assert!(writer.write_values([FlowReading::new(0.1, 0.1)]).is_err());
    }
}
