//! Rapport d'équité depuis le 1er janvier : part réelle de permanence de
//! chaque membre comparée à une répartition égale.

use crate::calendar::DateRange;
use crate::model::{on_leave, AssignmentDay, LeaveInterval, Staff, StaffId};
use crate::scheduler::SchedError;
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Ligne du rapport pour un membre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub staff_id: StaffId,
    pub staff_name: String,
    pub on_call_days: u32,
    pub working_days: u32,
    pub percent_share: f64,
    pub deviation: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportRequest<'a> {
    pub staff: &'a [Staff],
    pub assignments: &'a [AssignmentDay],
    pub holidays: &'a BTreeSet<NaiveDate>,
    pub leaves: &'a [LeaveInterval],
    /// Date de référence ; aujourd'hui (UTC) si absente.
    pub today: Option<NaiveDate>,
}

/// Fenêtre du rapport : 1er janvier de l'année de `today` jusqu'à `today`.
pub fn report_window(today: NaiveDate) -> Result<DateRange, SchedError> {
    let jan_first = NaiveDate::from_ymd_opt(today.year(), 1, 1)
        .ok_or_else(|| SchedError::Other(anyhow::anyhow!("no January 1st for {today}")))?;
    DateRange::new(jan_first, today)
}

pub fn compute_report(request: &ReportRequest<'_>) -> Result<Vec<ReportRow>, SchedError> {
    let staff = dedup_staff(request.staff);
    if staff.is_empty() {
        return Ok(Vec::new());
    }

    let today = request.today.unwrap_or_else(|| Utc::now().date_naive());
    let window = report_window(today)?;
    let holidays: BTreeSet<NaiveDate> = request
        .holidays
        .iter()
        .copied()
        .filter(|d| window.contains(*d))
        .collect();
    let leaves = request.leaves;

    let mut on_call: HashMap<&StaffId, u32> = staff.iter().map(|s| (&s.id, 0)).collect();
    for a in request.assignments {
        let Some(id) = a.staff_id.as_ref() else {
            continue;
        };
        if !window.contains(a.date) || holidays.contains(&a.date) || on_leave(leaves, id, a.date) {
            continue;
        }
        if let Some(count) = on_call.get_mut(id) {
            *count += 1;
        }
    }

    let mut working: HashMap<&StaffId, u32> = staff.iter().map(|s| (&s.id, 0)).collect();
    let mut any_effective_day = false;
    for day in window.days().filter(|d| !holidays.contains(d)) {
        let present: Vec<&StaffId> = staff
            .iter()
            .map(|s| &s.id)
            .filter(|id| !on_leave(leaves, id, day))
            .collect();
        // jour où tout le monde est absent : ne compte pour personne
        if present.is_empty() {
            continue;
        }
        any_effective_day = true;
        for id in present {
            if let Some(count) = working.get_mut(id) {
                *count += 1;
            }
        }
    }
    if !any_effective_day {
        working.values_mut().for_each(|v| *v = 0);
    }

    let equal_share = 100.0 / staff.len() as f64;
    let mut rows: Vec<ReportRow> = staff
        .iter()
        .map(|s| {
            let wd = working.get(&s.id).copied().unwrap_or(0);
            let oc = on_call.get(&s.id).copied().unwrap_or(0);
            let percent = if wd > 0 {
                f64::from(oc) / f64::from(wd) * 100.0
            } else {
                0.0
            };
            ReportRow {
                staff_id: s.id.clone(),
                staff_name: s.name.clone(),
                on_call_days: oc,
                working_days: wd,
                percent_share: round2(percent),
                deviation: round2(percent - equal_share),
            }
        })
        .collect();

    rows.sort_by(|a, b| compare_names(&a.staff_name, &b.staff_name));

    #[cfg(feature = "logging")]
    tracing::debug!(window = %window, rows = rows.len(), "fairness report computed");

    Ok(rows)
}

/// Première occurrence de chaque identifiant, ordre conservé.
fn dedup_staff(staff: &[Staff]) -> Vec<&Staff> {
    let mut seen = HashSet::new();
    staff.iter().filter(|s| seen.insert(&s.id)).collect()
}

fn round2(x: f64) -> f64 {
    let r = (x * 100.0).round() / 100.0;
    // évite un « -0.00 » à l'affichage
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Clé de tri : minuscules sans diacritiques (`Émile` -> `emile`).
fn fold_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Ordre alphabétique : lettre de base d'abord, puis casse et accents,
/// enfin octet par octet pour rester total.
fn compare_names(a: &str, b: &str) -> Ordering {
    fold_key(a)
        .cmp(&fold_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}
