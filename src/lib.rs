#![forbid(unsafe_code)]
//! Permanence — planification d'une permanence hebdomadaire tournante.
//!
//! - Un membre (ou personne) par jour, rotation à la semaine.
//! - Jours fériés, week-ends, congés et forçages manuels.
//! - Rapport d'équité depuis le 1er janvier.
//! - Dates calendaires uniquement (`NaiveDate`) ; stockage JSON, export CSV.

pub mod calendar;
pub mod io;
pub mod model;
pub mod report;
pub mod scheduler;
pub mod storage;

pub use calendar::{parse_date, DateRange};
pub use model::{
    AppState, AssignmentDay, LeaveInterval, ManualOverrides, Override, Roster, Staff, StaffId,
};
pub use report::{compute_report, ReportRequest, ReportRow};
pub use scheduler::{RotationOptions, SchedError, ScheduleRequest, Scheduler};
pub use storage::{JsonStorage, Storage};
