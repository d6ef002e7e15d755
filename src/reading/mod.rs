pub mod data;

use chrono::{DateTime, Local};
use csv::{QuoteStyle, WriterBuilder};
use data::ReadingRecord;
use std::io;

pub const DATE_FORMAT: &str = "%d/%m/%y";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A measurement value together with the local time it was received.
#[derive(Debug, Clone)]
pub struct Reading {
    pub timestamp: DateTime<Local>,
    pub value: String,
}

impl Reading {
    pub fn now(value: String) -> Self {
        Reading {
            timestamp: Local::now(),
            value,
        }
    }

    pub fn to_record(&self) -> ReadingRecord {
        ReadingRecord {
            date: self.timestamp.format(DATE_FORMAT).to_string(),
            time: self.timestamp.format(TIME_FORMAT).to_string(),
            value: self.value.clone(),
        }
    }

    /// Writes the reading as a single headerless, unquoted CSV line.
    pub fn write_line<W: io::Write>(&self, out: W) -> io::Result<()> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .from_writer(out);
        writer.serialize(self.to_record())?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn reading_at(value: &str) -> Reading {
        Reading {
            timestamp: Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap(),
            value: value.to_string(),
        }
    }

    #[test]
    fn record_uses_day_month_short_year() {
        let record = reading_at("1234.5").to_record();
        assert_eq!(
            record,
            ReadingRecord {
                date: "07/03/24".to_string(),
                time: "09:05:02".to_string(),
                value: "1234.5".to_string(),
            }
        );
    }

    #[test]
    fn line_is_timestamp_then_value() {
        let mut out = Vec::new();
        reading_at("+0012.34E+00").write_line(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "07/03/24,09:05:02,+0012.34E+00\n");
    }

    #[test]
    fn now_stamps_current_time() {
        let before = Local::now();
        let reading = Reading::now("1".to_string());
        assert!(reading.timestamp >= before);
        assert_eq!(reading.value, "1");
    }
}
