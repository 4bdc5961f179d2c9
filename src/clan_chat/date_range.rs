use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Invalid date format `{0}`. Please use YYYY-MM-DD")]
    Format(String),
    #[error("Start date must be before end date")]
    Reversed,
}

/// Inclusive range of whole days, in UTC
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn parse(start: &str, end: &str) -> Result<Self, DateRangeError> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;

        if start > end {
            return Err(DateRangeError::Reversed);
        }

        Ok(Self { start, end })
    }

    /// 00:00:00 on the first day
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// 23:59:59 on the last day
    pub fn end_time(&self) -> DateTime<Utc> {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        self.end.and_time(end_of_day).and_utc()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|_| DateRangeError::Format(text.to_owned()))
}
