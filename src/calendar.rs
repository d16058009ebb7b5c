//! Dates calendaires : parsing strict, plages inclusives, semaines.
//!
//! Aucune notion de fuseau horaire : tout est `NaiveDate`.

use crate::scheduler::SchedError;
use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use std::collections::BTreeSet;
use std::fmt;

const ISO_DATE: &str = "%Y-%m-%d";

/// Parse une date `YYYY-MM-DD`. Jamais de valeur par défaut silencieuse.
pub fn parse_date(raw: &str) -> Result<NaiveDate, SchedError> {
    let err = || SchedError::DateParse {
        input: raw.to_string(),
    };
    // chrono tolère `2025-9-1` ; on veut la forme canonique uniquement
    if raw.len() != 10 {
        return Err(err());
    }
    NaiveDate::parse_from_str(raw, ISO_DATE).map_err(|_| err())
}

/// Plage de dates inclusive `[start, end]`, `start <= end` garanti.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, SchedError> {
        if end < start {
            return Err(SchedError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, SchedError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Du `start` au dernier jour du mois situé `months - 1` mois plus loin.
    pub fn for_months(start: NaiveDate, months: u32) -> Result<Self, SchedError> {
        let overflow = || SchedError::Other(anyhow::anyhow!("date overflow from {start}"));
        let first = start.with_day(1).ok_or_else(overflow)?;
        let end = first
            .checked_add_months(Months::new(months.max(1)))
            .and_then(|d| d.pred_opt())
            .ok_or_else(overflow)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Nombre de jours, bornes incluses.
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Plus petite plage couvrant les deux.
    pub fn union(&self, other: &DateRange) -> DateRange {
        DateRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Séquence ordonnée des jours de la plage.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..{}", self.start, self.end)
        }
    }
}

/// Le jour `weekday` le plus proche, au plus tard `date`.
pub fn week_start_on_or_before(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let back = (date.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    date - Duration::days(i64::from(back))
}

pub fn is_weekend(date: NaiveDate, weekend: &[Weekday]) -> bool {
    weekend.contains(&date.weekday())
}

/// Regroupe des jours fériés en séries consécutives (affichage).
pub fn group_holidays(holidays: &BTreeSet<NaiveDate>) -> Vec<DateRange> {
    let mut out: Vec<DateRange> = Vec::new();
    for &day in holidays {
        match out.last_mut() {
            Some(run) if run.end.succ_opt() == Some(day) => run.end = day,
            _ => out.push(DateRange::single(day)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn parse_rejects_malformed_dates() {
        assert!(parse_date("2025-09-01").is_ok());
        for bad in ["", "2025-9-1", "2025-02-30", "01/09/2025", "2025-09-01T00:00"] {
            assert!(
                matches!(parse_date(bad), Err(SchedError::DateParse { .. })),
                "{bad} should fail"
            );
        }
    }

    #[test]
    fn reversed_range_is_an_error() {
        let err = DateRange::parse("2025-09-14", "2025-09-01").unwrap_err();
        assert!(matches!(err, SchedError::InvalidRange { .. }));
    }

    #[test]
    fn days_are_inclusive_and_ordered() {
        let range = DateRange::parse("2025-02-27", "2025-03-02").unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(
            days,
            vec![d("2025-02-27"), d("2025-02-28"), d("2025-03-01"), d("2025-03-02")]
        );
        assert_eq!(range.len(), 4);
        assert_eq!(DateRange::single(d("2025-01-01")).days().count(), 1);
    }

    #[test]
    fn month_window_ends_on_last_day() {
        let r = DateRange::for_months(d("2025-09-01"), 1).unwrap();
        assert_eq!(r.end(), d("2025-09-30"));
        let r = DateRange::for_months(d("2025-11-15"), 3).unwrap();
        assert_eq!(r.end(), d("2026-01-31"));
        let r = DateRange::for_months(d("2024-02-10"), 0).unwrap();
        assert_eq!(r.end(), d("2024-02-29"));
    }

    #[test]
    fn week_start_goes_backwards() {
        // 2025-09-03 est un mercredi
        assert_eq!(week_start_on_or_before(d("2025-09-03"), Weekday::Sun), d("2025-08-31"));
        assert_eq!(week_start_on_or_before(d("2025-08-31"), Weekday::Sun), d("2025-08-31"));
        assert_eq!(week_start_on_or_before(d("2025-09-03"), Weekday::Mon), d("2025-09-01"));
    }

    #[test]
    fn holidays_grouped_in_runs() {
        let set: BTreeSet<_> = ["2025-12-24", "2025-12-25", "2025-12-26", "2026-01-01"]
            .iter()
            .map(|s| d(s))
            .collect();
        let runs = group_holidays(&set);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].to_string(), "2025-12-24..2025-12-26");
        assert_eq!(runs[1].to_string(), "2026-01-01");
    }
}
