#![forbid(unsafe_code)]
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use permanence::{
    parse_date, DateRange, LeaveInterval, ManualOverrides, Override, SchedError,
    ScheduleRequest, Scheduler, Staff, StaffId,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn d(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

fn staff_ab() -> Vec<Staff> {
    vec![Staff::new("A", "A"), Staff::new("B", "B")]
}

fn leave(id: &str, start: &str, end: &str) -> LeaveInterval {
    LeaveInterval::new(StaffId::new(id), d(start), d(end)).unwrap()
}

fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

#[test]
fn two_staff_share_weekdays_evenly() {
    let staff = staff_ab();
    let range = DateRange::parse("2025-09-01", "2025-09-14").unwrap();
    let days = Scheduler::new().compute(&ScheduleRequest::new(&staff, range));
    assert_eq!(days.len(), 14);

    let count = |id: &str| {
        days.iter()
            .filter(|r| !is_weekend(r.date))
            .filter(|r| r.staff_id.as_ref().map(StaffId::as_str) == Some(id))
            .count() as i64
    };
    assert!((count("A") - count("B")).abs() <= 1);
}

#[test]
fn holiday_weekday_stays_blank() {
    let staff = vec![Staff::new("A", "A")];
    let holidays: BTreeSet<_> = [d("2025-09-03")].into_iter().collect();
    let range = DateRange::parse("2025-09-01", "2025-09-05").unwrap();
    let days = Scheduler::new().compute(&ScheduleRequest::new(&staff, range).holidays(&holidays));

    let day = days.iter().find(|r| r.date == d("2025-09-03")).unwrap();
    assert_eq!(day.staff_id, None);
    assert!(day.holiday);
    assert!(days.iter().filter(|r| r.date != d("2025-09-03")).all(|r| !r.holiday));
}

#[test]
fn staff_on_leave_is_skipped() {
    let staff = staff_ab();
    let leaves = vec![leave("A", "2025-09-02", "2025-09-04")];
    let range = DateRange::parse("2025-09-01", "2025-09-05").unwrap();
    let days = Scheduler::new().compute(&ScheduleRequest::new(&staff, range).leaves(&leaves));

    for r in &days {
        if ["2025-09-02", "2025-09-03", "2025-09-04"].contains(&r.date.to_string().as_str()) {
            assert_eq!(r.staff_id, Some(StaffId::new("B")));
            assert!(r.leave);
            assert!(!r.needs_review);
        }
    }
    assert_eq!(days[0].staff_id, Some(StaffId::new("A")));
}

#[test]
fn everyone_on_leave_forces_and_flags() {
    let staff = staff_ab();
    let leaves = vec![
        leave("A", "2025-09-02", "2025-09-04"),
        leave("B", "2025-09-02", "2025-09-04"),
    ];
    let range = DateRange::parse("2025-09-02", "2025-09-04").unwrap();
    let days = Scheduler::new().compute(&ScheduleRequest::new(&staff, range).leaves(&leaves));

    let first = &days[0];
    assert_eq!(first.date, d("2025-09-02"));
    assert!(first.needs_review);
    // membre de la semaine de l'ancre
    assert_eq!(first.staff_id, Some(StaffId::new("A")));
    assert!(days.iter().all(|r| r.needs_review && r.staff_id.is_some()));
}

#[test]
fn manual_override_wins() {
    let staff = staff_ab();
    let mut overrides = ManualOverrides::new();
    overrides.set(d("2025-09-03"), Override::Assign(StaffId::new("B")));
    let range = DateRange::parse("2025-09-01", "2025-09-07").unwrap();
    let days = Scheduler::new().compute(&ScheduleRequest::new(&staff, range).overrides(&overrides));

    let day = days.iter().find(|r| r.date == d("2025-09-03")).unwrap();
    assert_eq!(day.staff_id, Some(StaffId::new("B")));
    assert!(day.manual);
    // la rotation aurait choisi A toute la semaine
    assert_eq!(days[1].staff_id, Some(StaffId::new("A")));
}

#[test]
fn override_applies_on_holidays_weekends_and_with_auto_off() {
    let staff = staff_ab();
    let holidays: BTreeSet<_> = [d("2025-09-03")].into_iter().collect();
    let mut overrides = ManualOverrides::new();
    overrides.set(d("2025-09-03"), Override::Assign(StaffId::new("A")));
    overrides.set(d("2025-09-06"), Override::Assign(StaffId::new("B")));
    let range = DateRange::parse("2025-09-01", "2025-09-07").unwrap();
    let request = ScheduleRequest::new(&staff, range)
        .holidays(&holidays)
        .overrides(&overrides)
        .auto(false);
    let days = Scheduler::new().compute(&request);

    assert_eq!(days[2].staff_id, Some(StaffId::new("A")));
    assert!(days[2].holiday);
    assert_eq!(days[5].staff_id, Some(StaffId::new("B")));
    assert_eq!(days[0].staff_id, None);
}

#[test]
fn auto_off_leaves_everything_blank() {
    let staff = staff_ab();
    let range = DateRange::parse("2025-09-01", "2025-09-07").unwrap();
    let days = Scheduler::new().compute(&ScheduleRequest::new(&staff, range).auto(false));
    assert!(days.iter().all(|r| r.staff_id.is_none()));
}

#[test]
fn shortened_edit_blanks_trailing_days() {
    let staff = staff_ab();
    let mut overrides = ManualOverrides::new();
    overrides.edit_range(
        Some(DateRange::parse("2025-09-03", "2025-09-07").unwrap()),
        DateRange::parse("2025-09-03", "2025-09-05").unwrap(),
        Some(StaffId::new("B")),
    );
    let range = DateRange::parse("2025-09-01", "2025-09-14").unwrap();
    let days = Scheduler::new().compute(&ScheduleRequest::new(&staff, range).overrides(&overrides));

    let at = |s: &str| days.iter().find(|r| r.date == d(s)).unwrap();
    assert_eq!(at("2025-09-05").staff_id, Some(StaffId::new("B")));
    assert_eq!(at("2025-09-06").staff_id, None);
    assert_eq!(at("2025-09-07").staff_id, None);
    assert!(at("2025-09-07").manual);
}

#[test]
fn consecutive_months_both_have_assignments() {
    let staff = staff_ab();
    let september = DateRange::for_months(d("2025-09-01"), 1).unwrap();
    let october = DateRange::for_months(d("2025-10-01"), 1).unwrap();
    let s = Scheduler::new();
    assert_eq!(s.compute(&ScheduleRequest::new(&staff, september)).len(), 30);
    let next = s.compute(&ScheduleRequest::new(&staff, october));
    assert_eq!(next.len(), 31);
    assert!(next.iter().any(|r| r.staff_id.is_some()));
}

#[test]
fn reversed_or_malformed_range_is_rejected() {
    let staff = staff_ab();
    let s = Scheduler::new();
    let req = ScheduleRequest::new(&staff, DateRange::single(d("2025-09-01")));
    assert!(matches!(
        s.compute_between(req, "2025-09-30", "2025-09-01"),
        Err(SchedError::InvalidRange { .. })
    ));
    assert!(matches!(
        s.compute_between(req, "2025-02-30", "2025-03-01"),
        Err(SchedError::DateParse { .. })
    ));
}

fn base() -> NaiveDate {
    d("2020-01-01")
}

proptest! {
    #[test]
    fn one_record_per_day_in_order(offset in 0i64..3000, span in 0i64..200) {
        let staff = staff_ab();
        let start = base() + Duration::days(offset);
        let range = DateRange::new(start, start + Duration::days(span)).unwrap();
        let days = Scheduler::new().compute(&ScheduleRequest::new(&staff, range));
        prop_assert_eq!(days.len() as i64, span + 1);
        for (i, r) in days.iter().enumerate() {
            prop_assert_eq!(r.date, start + Duration::days(i as i64));
        }
    }

    #[test]
    fn overrides_always_win(
        offset in 0i64..1000,
        picks in proptest::collection::vec((0i64..28, proptest::option::of(0usize..3)), 0..10),
        auto in any::<bool>(),
    ) {
        let staff = vec![Staff::new("A", "A"), Staff::new("B", "B"), Staff::new("C", "C")];
        let start = base() + Duration::days(offset);
        let range = DateRange::new(start, start + Duration::days(27)).unwrap();
        let holidays: BTreeSet<_> = [start + Duration::days(3)].into_iter().collect();
        let mut overrides = ManualOverrides::new();
        for (delta, who) in &picks {
            let value = match who {
                Some(i) => Override::Assign(staff[*i].id.clone()),
                None => Override::Unassign,
            };
            overrides.set(start + Duration::days(*delta), value);
        }
        let request = ScheduleRequest::new(&staff, range)
            .holidays(&holidays)
            .overrides(&overrides)
            .auto(auto);
        for r in Scheduler::new().compute(&request) {
            match overrides.get(r.date) {
                Some(v) => {
                    prop_assert_eq!(r.staff_id.as_ref(), v.staff());
                    prop_assert!(r.manual);
                }
                None => prop_assert!(!r.manual),
            }
        }
    }

    #[test]
    fn leave_respected_unless_everyone_is_away(
        offset in 0i64..1000,
        raw_leaves in proptest::collection::vec((0usize..3, 0i64..21, 0i64..5), 0..8),
    ) {
        let staff = vec![Staff::new("A", "A"), Staff::new("B", "B"), Staff::new("C", "C")];
        let start = base() + Duration::days(offset);
        let range = DateRange::new(start, start + Duration::days(20)).unwrap();
        let leaves: Vec<_> = raw_leaves
            .iter()
            .map(|(who, from, len)| {
                let s = start + Duration::days(*from);
                LeaveInterval::new(staff[*who].id.clone(), s, s + Duration::days(*len)).unwrap()
            })
            .collect();
        let days = Scheduler::new().compute(&ScheduleRequest::new(&staff, range).leaves(&leaves));
        for r in days {
            let away = |id: &StaffId| leaves.iter().any(|l| &l.staff_id == id && l.covers(r.date));
            let all_away = staff.iter().all(|s| away(&s.id));
            prop_assert_eq!(r.leave, staff.iter().any(|s| away(&s.id)));
            if let Some(id) = &r.staff_id {
                prop_assert_eq!(r.needs_review, all_away);
                if !all_away {
                    prop_assert!(!away(id));
                }
            } else {
                prop_assert!(!r.needs_review);
            }
        }
    }

    #[test]
    fn paired_weeks_split_evenly(monday_offset in 0i64..400, pairs in 1i64..6) {
        let staff = staff_ab();
        // 2020-01-06 est un lundi
        let start = d("2020-01-06") + Duration::weeks(monday_offset);
        let range = DateRange::new(start, start + Duration::weeks(2 * pairs) - Duration::days(1)).unwrap();
        let days = Scheduler::new().compute(&ScheduleRequest::new(&staff, range));
        let count = |id: &str| days.iter().filter(|r| r.staff_id.as_ref().map(StaffId::as_str) == Some(id)).count() as i64;
        prop_assert!((count("A") - count("B")).abs() <= 1);
        prop_assert_eq!(count("A") + count("B"), 10 * pairs);
    }
}
