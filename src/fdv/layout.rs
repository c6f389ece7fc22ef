use chrono::NaiveDateTime;
use std::io::{self, Write};

use super::FdvError;

pub const RECORDS_PER_LINE: usize = 5;
pub const MAX_SITE_NAME_LEN: usize = 15;
const HEADER_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";
const IDENTIFIER_PREFIX: &str = "**IDENTIFIER:            1,";

/// Counts records on the current data line and breaks the line after every
/// fifth record.
#[derive(Debug, Default)]
pub(crate) struct RecordLines {
    value_count: usize,
}

impl RecordLines {
    pub(crate) fn reset(&mut self) {
        self.value_count = 0;
    }

    pub(crate) fn value_count(&self) -> usize {
        self.value_count
    }

    pub(crate) fn write_record<W: Write>(
        &mut self,
        writer: &mut W,
        record: std::fmt::Arguments,
    ) -> io::Result<()> {
        writer.write_fmt(record)?;
        self.value_count += 1;
        if self.value_count % RECORDS_PER_LINE == 0 {
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Terminates a trailing partial line.
    pub(crate) fn finish_line<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.value_count % RECORDS_PER_LINE != 0 {
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// Start/end/interval metadata shared by flow and rainfall headers.
#[derive(Debug, Default, Clone)]
pub(crate) struct TimeRange {
    pub(crate) start_ts: Option<NaiveDateTime>,
    pub(crate) end_ts: Option<NaiveDateTime>,
    pub(crate) interval: Option<i64>,
}

impl TimeRange {
    pub(crate) fn validate(&self) -> Result<(), FdvError> {
        let start = self.start_ts.ok_or_else(|| {
            FdvError::InvalidParameter("Starting time is not set. Use set_starting_time().".into())
        })?;
        let end = self.end_ts.ok_or_else(|| {
            FdvError::InvalidParameter("Ending time is not set. Use set_ending_time().".into())
        })?;
        let interval = self.interval.ok_or_else(|| {
            FdvError::InvalidParameter("Interval is not set. Use set_interval().".into())
        })?;
        if end < start {
            return Err(FdvError::InvalidParameter(format!(
                "Ending time {} precedes starting time {}",
                end, start
            )));
        }
        if interval < 0 {
            return Err(FdvError::InvalidParameter(format!(
                "Interval must not be negative, got {}",
                interval
            )));
        }
        Ok(())
    }

    /// Writes the `START END   INTERVAL` line followed by `*CEND`.
    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> Result<(), FdvError> {
        self.validate()?;
        if let (Some(start), Some(end), Some(interval)) = (self.start_ts, self.end_ts, self.interval)
        {
            writeln!(
                writer,
                "{} {}   {}",
                start.format(HEADER_TIMESTAMP_FORMAT),
                end.format(HEADER_TIMESTAMP_FORMAT),
                interval
            )?;
        }
        writeln!(writer, "*CEND")?;
        Ok(())
    }
}

/// `**IDENTIFIER:` line carrying the upper-cased site name, cut to 15 characters.
pub fn identifier_line(site_name: &str) -> String {
    let truncated: String = site_name.chars().take(MAX_SITE_NAME_LEN).collect();
    format!("{}{}", IDENTIFIER_PREFIX, truncated.to_uppercase())
}

pub(crate) fn write_tail<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "\n*END")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn identifier_is_truncated_and_upper_cased() {
        assert_eq!(identifier_line("abc"), "**IDENTIFIER:            1,ABC");
        assert_eq!(
            identifier_line("a very long site name"),
            "**IDENTIFIER:            1,A VERY LONG SIT"
        );
    }

    #[test]
    fn five_records_per_line() {
        let mut out = Vec::new();
        let mut lines = RecordLines::default();
        for n in 0..7 {
            lines.write_record(&mut out, format_args!("{:3}", n)).unwrap();
        }
        lines.finish_line(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "  0  1  2  3  4\n  5  6\n");
        assert_eq!(lines.value_count(), 7);
    }

    #[test]
    fn full_last_line_gets_no_extra_break() {
        let mut out = Vec::new();
        let mut lines = RecordLines::default();
        for n in 0..5 {
            lines.write_record(&mut out, format_args!("{}", n)).unwrap();
        }
        lines.finish_line(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "01234\n");
    }

    #[test]
    fn time_range_line() {
        let range = TimeRange {
            start_ts: Some(ts(1, 0, 0)),
            end_ts: Some(ts(2, 23, 55)),
            interval: Some(5),
        };
        let mut out = Vec::new();
        range.write(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "202403010000 202403022355   5\n*CEND\n"
        );
    }

    #[test]
    fn incomplete_time_range_is_rejected() {
        let range = TimeRange {
            start_ts: Some(ts(1, 0, 0)),
            end_ts: None,
            interval: Some(5),
        };
        assert!(matches!(range.validate(), Err(FdvError::InvalidParameter(_))));

        let reversed = TimeRange {
            start_ts: Some(ts(2, 0, 0)),
            end_ts: Some(ts(1, 0, 0)),
            interval: Some(5),
        };
        assert!(reversed.validate().is_err());

        let negative = TimeRange {
            start_ts: Some(ts(1, 0, 0)),
            end_ts: Some(ts(1, 1, 0)),
            interval: Some(-5),
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn sub_minute_interval_is_written_as_zero() {
        let range = TimeRange {
            start_ts: Some(ts(1, 0, 0)),
            end_ts: Some(ts(1, 0, 2)),
            interval: Some(0),
        };
        let mut out = Vec::new();
        range.write(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "202403010000 202403010002   0\n*CEND\n"
        );
    }
}
