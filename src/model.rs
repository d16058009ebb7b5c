use crate::calendar::{parse_date, DateRange};
use crate::scheduler::SchedError;
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

/// Identifiant fort pour un membre de la permanence
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl StaffId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Membre de la permanence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Staff {
    pub fn new<I: AsRef<str>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: StaffId::new(id),
            name: name.into(),
            color: None,
        }
    }
}

/// Liste ordonnée des membres ; l'ordre est celui de la rotation.
///
/// L'unicité des identifiants est garantie à l'entrée : ajout, import et
/// désérialisation refusent un doublon au lieu de le réparer après coup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Staff>", into = "Vec<Staff>")]
pub struct Roster {
    members: Vec<Staff>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[Staff] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &StaffId) -> bool {
        self.find(id).is_some()
    }

    pub fn find<'a>(&'a self, id: &StaffId) -> Option<&'a Staff> {
        self.members.iter().find(|s| &s.id == id)
    }

    pub fn add_staff(&mut self, staff: Staff) -> Result<(), SchedError> {
        if staff.id.as_str().trim().is_empty() {
            return Err(SchedError::InvalidStaff("empty id"));
        }
        if self.contains(&staff.id) {
            return Err(SchedError::DuplicateStaff(staff.id.as_str().to_string()));
        }
        self.members.push(staff);
        Ok(())
    }

    /// Dérive un identifiant libre à partir d'un nom : trois premiers
    /// caractères, puis `-2`, `-3`… tant que l'identifiant est pris.
    pub fn derive_id(&self, name: &str) -> Result<StaffId, SchedError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SchedError::InvalidStaff("empty name"));
        }
        let base: String = name.chars().take(3).collect();
        let mut candidate = StaffId::new(&base);
        let mut n = 2u32;
        while self.contains(&candidate) {
            candidate = StaffId::new(format!("{base}-{n}"));
            n += 1;
        }
        Ok(candidate)
    }

    /// Ajoute un membre à partir de son nom, identifiant dérivé.
    pub fn add_named(&mut self, name: &str, color: Option<String>) -> Result<StaffId, SchedError> {
        let id = self.derive_id(name)?;
        self.members.push(Staff {
            id: id.clone(),
            name: name.trim().to_string(),
            color,
        });
        Ok(id)
    }

    pub fn update_staff(&mut self, staff: Staff) -> Result<(), SchedError> {
        let slot = self
            .members
            .iter_mut()
            .find(|s| s.id == staff.id)
            .ok_or_else(|| SchedError::UnknownStaff(staff.id.as_str().to_string()))?;
        *slot = staff;
        Ok(())
    }

    pub fn remove_staff(&mut self, id: &StaffId) -> Result<Staff, SchedError> {
        let pos = self
            .members
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| SchedError::UnknownStaff(id.as_str().to_string()))?;
        Ok(self.members.remove(pos))
    }
}

impl TryFrom<Vec<Staff>> for Roster {
    type Error = SchedError;

    fn try_from(members: Vec<Staff>) -> Result<Self, Self::Error> {
        let mut roster = Roster::new();
        for staff in members {
            roster.add_staff(staff)?;
        }
        Ok(roster)
    }
}

impl From<Roster> for Vec<Staff> {
    fn from(roster: Roster) -> Self {
        roster.members
    }
}

/// Congé d'un membre, bornes incluses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLeave")]
pub struct LeaveInterval {
    pub staff_id: StaffId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LeaveInterval {
    pub fn new(staff_id: StaffId, start: NaiveDate, end: NaiveDate) -> Result<Self, SchedError> {
        if end < start {
            return Err(SchedError::InvalidRange { start, end });
        }
        Ok(Self {
            staff_id,
            start,
            end,
        })
    }

    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Forme persistée d'un congé, validée par `LeaveInterval::new`.
#[derive(Deserialize)]
struct RawLeave {
    staff_id: StaffId,
    start: String,
    end: String,
}

impl TryFrom<RawLeave> for LeaveInterval {
    type Error = SchedError;

    fn try_from(raw: RawLeave) -> Result<Self, Self::Error> {
        LeaveInterval::new(raw.staff_id, parse_date(&raw.start)?, parse_date(&raw.end)?)
    }
}

/// Vrai si `staff` a un congé couvrant `day`.
pub fn on_leave(leaves: &[LeaveInterval], staff: &StaffId, day: NaiveDate) -> bool {
    leaves
        .iter()
        .any(|l| &l.staff_id == staff && l.covers(day))
}

/// Forçage manuel d'un jour. L'absence d'entrée signifie « laisser la
/// rotation décider » ; `Unassign` force un jour vide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Override {
    Assign(StaffId),
    Unassign,
}

impl Override {
    pub fn staff(&self) -> Option<&StaffId> {
        match self {
            Override::Assign(id) => Some(id),
            Override::Unassign => None,
        }
    }

    fn from_option(staff: Option<StaffId>) -> Self {
        staff.map_or(Override::Unassign, Override::Assign)
    }
}

/// Forçages indexés par date. Sérialisé en `{ "YYYY-MM-DD": "id" | "" }`,
/// la chaîne vide représentant `Override::Unassign`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct ManualOverrides {
    entries: BTreeMap<NaiveDate, Override>,
}

impl ManualOverrides {
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, day: NaiveDate) -> Option<&Override> {
        self.entries.get(&day)
    }

    pub fn set(&mut self, day: NaiveDate, value: Override) {
        self.entries.insert(day, value);
    }

    pub fn clear(&mut self, day: NaiveDate) -> Option<Override> {
        self.entries.remove(&day)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, NaiveDate, Override> {
        self.entries.iter()
    }

    /// Affectation d'un jour depuis le calendrier : `None` rend le jour à
    /// la rotation (l'entrée disparaît), ce n'est pas un forçage à vide.
    pub fn assign_day(&mut self, day: NaiveDate, staff: Option<StaffId>) {
        match staff {
            Some(id) => {
                self.entries.insert(day, Override::Assign(id));
            }
            None => {
                self.entries.remove(&day);
            }
        }
    }

    /// Édition d'une affectation sur une plage. Les jours de `previous`
    /// qui sortent de `new` sont forcés à vide.
    pub fn edit_range(
        &mut self,
        previous: Option<DateRange>,
        new: DateRange,
        staff: Option<StaffId>,
    ) {
        let span = previous.map_or(new, |p| p.union(&new));
        let value = Override::from_option(staff);
        for day in span.days() {
            let v = if new.contains(day) {
                value.clone()
            } else {
                Override::Unassign
            };
            self.entries.insert(day, v);
        }
    }

    pub fn remove_range(&mut self, range: DateRange) -> usize {
        let before = self.entries.len();
        self.entries.retain(|day, _| !range.contains(*day));
        before - self.entries.len()
    }

    /// Oublie les forçages pointant vers un membre supprimé.
    pub fn forget_staff(&mut self, id: &StaffId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, v| v.staff() != Some(id));
        before - self.entries.len()
    }
}

impl FromIterator<(NaiveDate, Override)> for ManualOverrides {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, Override)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, String>> for ManualOverrides {
    type Error = SchedError;

    fn try_from(raw: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|(day, staff)| -> Result<_, SchedError> {
                let value = if staff.is_empty() {
                    Override::Unassign
                } else {
                    Override::Assign(StaffId(staff))
                };
                Ok((parse_date(&day)?, value))
            })
            .collect()
    }
}

impl From<ManualOverrides> for BTreeMap<String, String> {
    fn from(overrides: ManualOverrides) -> Self {
        overrides
            .entries
            .into_iter()
            .map(|(day, v)| {
                let staff = match v {
                    Override::Assign(id) => id.0,
                    Override::Unassign => String::new(),
                };
                (day.to_string(), staff)
            })
            .collect()
    }
}

/// Résultat de la planification pour un jour.
///
/// `leave` signale qu'au moins un membre est en congé ce jour-là, que la
/// personne affectée le soit ou non : c'est une information d'affichage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentDay {
    pub date: NaiveDate,
    pub staff_id: Option<StaffId>,
    pub manual: bool,
    pub holiday: bool,
    pub leave: bool,
    pub needs_review: bool,
}

impl AssignmentDay {
    /// Enregistrement minimal (date + membre), sans drapeaux.
    pub fn new(date: NaiveDate, staff_id: Option<StaffId>) -> Self {
        Self {
            date,
            staff_id,
            manual: false,
            holiday: false,
            leave: false,
            needs_review: false,
        }
    }
}

pub const SCHEMA_VERSION: u32 = 1;

/// État persisté de l'application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub schema_version: u32,
    pub staff: Roster,
    #[serde(deserialize_with = "strict_dates")]
    pub holidays: BTreeSet<NaiveDate>,
    pub leaves: Vec<LeaveInterval>,
    pub manual_assignments: ManualOverrides,
    pub months_to_show: u32,
    pub auto_schedule: bool,
    #[serde(deserialize_with = "strict_date")]
    pub range_start: NaiveDate,
}

// chrono accepte `2025-9-3` en désérialisation ; l'état passe par `parse_date`
fn strict_date<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(de)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

fn strict_dates<'de, D: Deserializer<'de>>(de: D) -> Result<BTreeSet<NaiveDate>, D::Error> {
    Vec::<String>::deserialize(de)?
        .iter()
        .map(|raw| parse_date(raw).map_err(serde::de::Error::custom))
        .collect()
}

impl Default for AppState {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self {
            schema_version: SCHEMA_VERSION,
            staff: Roster::default(),
            holidays: BTreeSet::new(),
            leaves: Vec::new(),
            manual_assignments: ManualOverrides::default(),
            months_to_show: 1,
            auto_schedule: true,
            range_start: today.with_day(1).unwrap_or(today),
        }
    }
}

impl AppState {
    /// Plage affichée : `range_start` jusqu'à la fin du dernier mois visible.
    pub fn range(&self) -> Result<DateRange, SchedError> {
        DateRange::for_months(self.range_start, self.months_to_show)
    }

    pub fn add_holidays(&mut self, range: DateRange) -> usize {
        range.days().filter(|d| self.holidays.insert(*d)).count()
    }

    /// Retire les jours fériés de la plage ; renvoie le nombre retiré.
    pub fn remove_holidays(&mut self, range: DateRange) -> usize {
        range.days().filter(|d| self.holidays.remove(d)).count()
    }

    /// Retire un membre ainsi que ses congés et forçages.
    pub fn remove_staff(&mut self, id: &StaffId) -> Result<Staff, SchedError> {
        let removed = self.staff.remove_staff(id)?;
        self.leaves.retain(|l| &l.staff_id != id);
        self.manual_assignments.forget_staff(id);
        Ok(removed)
    }

    pub fn add_leave(&mut self, leave: LeaveInterval) -> Result<(), SchedError> {
        if !self.staff.contains(&leave.staff_id) {
            return Err(SchedError::UnknownStaff(leave.staff_id.as_str().to_string()));
        }
        self.leaves.push(leave);
        Ok(())
    }
}
