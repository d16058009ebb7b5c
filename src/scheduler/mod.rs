mod assignment;
mod types;
mod util;

pub use assignment::assignment_counts;
pub use types::{RotationOptions, SchedError};

use crate::calendar::DateRange;
use crate::model::{AppState, AssignmentDay, LeaveInterval, ManualOverrides, Staff};
use chrono::NaiveDate;
use std::collections::BTreeSet;

static NO_HOLIDAYS: BTreeSet<NaiveDate> = BTreeSet::new();
static NO_OVERRIDES: ManualOverrides = ManualOverrides::new();

/// Entrées d'un calcul de planning. Tout est emprunté : rien n'est modifié.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleRequest<'a> {
    pub staff: &'a [Staff],
    pub range: DateRange,
    pub holidays: &'a BTreeSet<NaiveDate>,
    pub leaves: &'a [LeaveInterval],
    pub overrides: &'a ManualOverrides,
    pub auto: bool,
}

impl<'a> ScheduleRequest<'a> {
    /// Requête sans férié, congé ni forçage, rotation automatique active.
    pub fn new(staff: &'a [Staff], range: DateRange) -> Self {
        Self {
            staff,
            range,
            holidays: &NO_HOLIDAYS,
            leaves: &[],
            overrides: &NO_OVERRIDES,
            auto: true,
        }
    }

    /// Requête couvrant la plage affichée d'un état persisté.
    pub fn from_state(state: &'a AppState) -> Result<Self, SchedError> {
        Ok(Self {
            staff: state.staff.members(),
            range: state.range()?,
            holidays: &state.holidays,
            leaves: &state.leaves,
            overrides: &state.manual_assignments,
            auto: state.auto_schedule,
        })
    }

    pub fn holidays(mut self, holidays: &'a BTreeSet<NaiveDate>) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn leaves(mut self, leaves: &'a [LeaveInterval]) -> Self {
        self.leaves = leaves;
        self
    }

    pub fn overrides(mut self, overrides: &'a ManualOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn auto(mut self, auto: bool) -> Self {
        self.auto = auto;
        self
    }

    pub fn range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }
}

/// Planificateur à rotation hebdomadaire. Sans état : chaque appel part
/// uniquement de sa requête.
#[derive(Debug, Default, Clone, Copy)]
pub struct Scheduler {
    options: RotationOptions,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RotationOptions) -> Self {
        Self { options }
    }

    /// Un enregistrement par jour de la plage, dans l'ordre.
    pub fn compute(&self, request: &ScheduleRequest<'_>) -> Vec<AssignmentDay> {
        #[cfg(feature = "logging")]
        tracing::debug!(
            range = %request.range,
            staff = request.staff.len(),
            auto = request.auto,
            "computing assignments"
        );
        assignment::compute_assignments(request, self.options)
    }

    /// Variante à partir de bornes texte `YYYY-MM-DD`.
    pub fn compute_between(
        &self,
        request: ScheduleRequest<'_>,
        start: &str,
        end: &str,
    ) -> Result<Vec<AssignmentDay>, SchedError> {
        let range = DateRange::parse(start, end)?;
        Ok(self.compute(&request.range(range)))
    }
}
