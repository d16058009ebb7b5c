use chrono::{NaiveDate, Weekday};
use thiserror::Error;

/// Jours « désignés » de la rotation : début de semaine et week-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationOptions {
    pub week_start: Weekday,
    pub weekend: [Weekday; 2],
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            week_start: Weekday::Sun,
            weekend: [Weekday::Sat, Weekday::Sun],
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid range: end {end} precedes start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid date (expected YYYY-MM-DD): {input:?}")]
    DateParse { input: String },
    #[error("duplicate staff id: {0}")]
    DuplicateStaff(String),
    #[error("unknown staff id: {0}")]
    UnknownStaff(String),
    #[error("invalid staff: {0}")]
    InvalidStaff(&'static str),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
