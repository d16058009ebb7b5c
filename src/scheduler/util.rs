use crate::calendar::week_start_on_or_before;
use chrono::{NaiveDate, Weekday};

/// Position de départ dans la rotation pour la semaine contenant `day`,
/// comptée en semaines depuis `anchor`.
pub(super) fn rotation_index(
    anchor: NaiveDate,
    day: NaiveDate,
    week_start: Weekday,
    staff_count: usize,
) -> usize {
    let week = week_start_on_or_before(day, week_start);
    let weeks_since = (week - anchor).num_days().div_euclid(7);
    // rem_euclid : reste positif même avant l'ancre
    weeks_since.rem_euclid(staff_count as i64) as usize
}
