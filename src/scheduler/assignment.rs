use super::{util, RotationOptions, ScheduleRequest};
use crate::calendar::{is_weekend, week_start_on_or_before};
use crate::model::{on_leave, AssignmentDay, Staff, StaffId};
use chrono::NaiveDate;

pub(super) fn compute_assignments(
    request: &ScheduleRequest<'_>,
    opts: RotationOptions,
) -> Vec<AssignmentDay> {
    let anchor = week_start_on_or_before(request.range.start(), opts.week_start);

    request
        .range
        .days()
        .map(|day| assign_day(request, opts, anchor, day))
        .collect()
}

/// Règles par jour, de la plus prioritaire à la moins prioritaire :
/// forçage, férié/week-end, auto désactivé, rotation.
fn assign_day(
    request: &ScheduleRequest<'_>,
    opts: RotationOptions,
    anchor: NaiveDate,
    day: NaiveDate,
) -> AssignmentDay {
    let mut out = AssignmentDay::new(day, None);
    out.holiday = request.holidays.contains(&day);
    out.leave = request
        .staff
        .iter()
        .any(|s| on_leave(request.leaves, &s.id, day));

    if let Some(value) = request.overrides.get(day) {
        out.manual = true;
        out.staff_id = value.staff().cloned();
        return out;
    }

    if out.holiday || is_weekend(day, &opts.weekend) || !request.auto {
        return out;
    }

    if let Some((staff_id, forced)) = pick_rotation(request, opts, anchor, day) {
        out.staff_id = Some(staff_id);
        out.needs_review = forced;
    }
    out
}

/// Premier membre sans congé à partir de l'index de la semaine. Si tout le
/// monde est absent, le membre de la semaine est imposé (`forced`).
fn pick_rotation(
    request: &ScheduleRequest<'_>,
    opts: RotationOptions,
    anchor: NaiveDate,
    day: NaiveDate,
) -> Option<(StaffId, bool)> {
    let staff = request.staff;
    if staff.is_empty() {
        return None;
    }

    let total = staff.len();
    let base = util::rotation_index(anchor, day, opts.week_start, total);

    let eligible = (0..total)
        .map(|offset| &staff[(base + offset) % total])
        .find(|s| !on_leave(request.leaves, &s.id, day));

    match eligible {
        Some(s) => Some((s.id.clone(), false)),
        None => {
            #[cfg(feature = "logging")]
            tracing::warn!(%day, staff = staff[base].id.as_str(), "everyone on leave, forcing rotation pick");
            Some((staff[base].id.clone(), true))
        }
    }
}

/// Nombre de jours affectés par membre, dans l'ordre du roster.
pub fn assignment_counts(days: &[AssignmentDay], staff: &[Staff]) -> Vec<(StaffId, usize)> {
    staff
        .iter()
        .map(|s| {
            let count = days
                .iter()
                .filter(|d| d.staff_id.as_ref() == Some(&s.id))
                .count();
            (s.id.clone(), count)
        })
        .collect()
}
