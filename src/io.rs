use crate::calendar::parse_date;
use crate::model::{AssignmentDay, LeaveInterval, Roster, Staff, StaffId};
use crate::report::ReportRow;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::path::Path;

pub const ASSIGNMENTS_HEADER: [&str; 6] = [
    "date",
    "staffId",
    "staffName",
    "manualFlag",
    "holidayFlag",
    "leaveFlag",
];

pub const REPORT_HEADER: [&str; 6] = [
    "staffId",
    "staffName",
    "onCallDays",
    "workingDays",
    "percentShare",
    "deviation",
];

fn flag(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Export CSV du planning: header `date,staffId,staffName,manualFlag,holidayFlag,leaveFlag`
pub fn export_assignments_csv<W: std::io::Write>(
    out: W,
    days: &[AssignmentDay],
    roster: &Roster,
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(out);
    w.write_record(ASSIGNMENTS_HEADER)?;
    for day in days {
        let date = day.date.to_string();
        let staff_id = day.staff_id.as_ref().map(StaffId::as_str).unwrap_or("");
        let staff_name = day
            .staff_id
            .as_ref()
            .and_then(|id| roster.find(id))
            .map(|s| s.name.as_str())
            .unwrap_or("");
        w.write_record([
            date.as_str(),
            staff_id,
            staff_name,
            flag(day.manual),
            flag(day.holiday),
            flag(day.leave),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_assignments_csv_to_path<P: AsRef<Path>>(
    path: P,
    days: &[AssignmentDay],
    roster: &Roster,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    export_assignments_csv(file, days, roster)
}

/// Export CSV du rapport d'équité, pourcentages à deux décimales.
pub fn export_report_csv<W: std::io::Write>(out: W, rows: &[ReportRow]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(out);
    w.write_record(REPORT_HEADER)?;
    for r in rows {
        let on_call = r.on_call_days.to_string();
        let working = r.working_days.to_string();
        let share = format!("{:.2}", r.percent_share);
        let deviation = format!("{:.2}", r.deviation);
        w.write_record([
            r.staff_id.as_str(),
            r.staff_name.as_str(),
            on_call.as_str(),
            working.as_str(),
            share.as_str(),
            deviation.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Import de membres: header `name[,id][,color]`. Sans `id`, l'identifiant
/// est dérivé du nom ; un identifiant déjà présent fait échouer l'import.
pub fn import_staff_csv<P: AsRef<Path>>(path: P, roster: &mut Roster) -> anyhow::Result<usize> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    // on valide tout avant de toucher au roster
    let mut staged = roster.clone();
    let mut added = 0usize;
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let row = line + 2;
        let name = rec.get(0).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid staff row {row} (empty name)");
        }
        let color = rec
            .get(2)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        match rec.get(1).map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => {
                let mut staff = Staff::new(id, name);
                staff.color = color;
                staged
                    .add_staff(staff)
                    .with_context(|| format!("staff row {row}"))?;
            }
            None => {
                staged
                    .add_named(name, color)
                    .with_context(|| format!("staff row {row}"))?;
            }
        }
        added += 1;
    }
    *roster = staged;
    Ok(added)
}

/// Import de congés: header `staffId,start,end` (dates `YYYY-MM-DD`, incluses)
pub fn import_leaves_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<LeaveInterval>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let staff = rec.get(0).context("missing staffId")?.trim();
        if staff.is_empty() {
            bail!("invalid leave row (empty staffId)");
        }
        let start = parse_date(rec.get(1).context("missing start")?.trim())?;
        let end = parse_date(rec.get(2).context("missing end")?.trim())?;
        let leave = LeaveInterval::new(StaffId::new(staff), start, end)
            .with_context(|| format!("leave for {staff}"))?;
        out.push(leave);
    }
    Ok(out)
}
