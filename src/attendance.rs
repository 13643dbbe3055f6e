//! Daily attendance sessions for students and teachers.
//!
//! A session holds one record per roster entity for a single date. Records
//! are derived from the roster and never persisted; opening a session for
//! another date starts over.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Hadir,
    Sakit,
    Izin,
    Alpha,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [Self::Hadir, Self::Sakit, Self::Izin, Self::Alpha];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|st| st.label().eq_ignore_ascii_case(s.trim()))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hadir => "Hadir",
            Self::Sakit => "Sakit",
            Self::Izin => "Izin",
            Self::Alpha => "Alpha",
        }
    }

    /// Whether the edit form offers a note for this status.
    pub fn takes_note(self) -> bool {
        matches!(self, Self::Sakit | Self::Izin)
    }
}

pub const UNMARKED_LABEL: &str = "Belum Absen";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendeeKind {
    Student,
    Teacher,
}

/// How a freshly opened session marks its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InitialMarking {
    Present,
    Unmarked,
}

/// Display data copied from the roster. `group_id` is the class id for
/// students and the subject id for teachers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: String,
    pub code: String,
    pub name: String,
    pub group_id: String,
    pub group_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentTimes {
    pub check_in: NaiveTime,
    pub check_out: Option<NaiveTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceDefaults {
    pub student: PresentTimes,
    pub teacher: PresentTimes,
}

impl Default for AttendanceDefaults {
    fn default() -> Self {
        Self {
            student: PresentTimes {
                check_in: hm(7, 10),
                check_out: None,
            },
            teacher: PresentTimes {
                check_in: hm(7, 0),
                check_out: Some(hm(15, 30)),
            },
        }
    }
}

impl AttendanceDefaults {
    pub fn for_kind(&self, kind: AttendeeKind) -> PresentTimes {
        match kind {
            AttendeeKind::Student => self.student,
            AttendeeKind::Teacher => self.teacher,
        }
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

pub fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

fn ser_hhmm<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
    match t {
        Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub attendee: Attendee,
    /// `None` is "Belum Absen".
    pub status: Option<AttendanceStatus>,
    #[serde(serialize_with = "ser_hhmm")]
    pub check_in: Option<NaiveTime>,
    #[serde(serialize_with = "ser_hhmm")]
    pub check_out: Option<NaiveTime>,
    pub note: Option<String>,
    #[serde(skip)]
    last_present: PresentTimes,
}

impl AttendanceRecord {
    fn new(attendee: Attendee, present: PresentTimes, marking: InitialMarking) -> Self {
        let mut rec = Self {
            attendee,
            status: None,
            check_in: None,
            check_out: None,
            note: None,
            last_present: present,
        };
        if marking == InitialMarking::Present {
            rec.mark_present();
        }
        rec
    }

    fn mark_present(&mut self) {
        self.status = Some(AttendanceStatus::Hadir);
        self.check_in = Some(self.last_present.check_in);
        self.check_out = self.last_present.check_out;
    }

    pub fn status_label(&self) -> &'static str {
        self.status.map(AttendanceStatus::label).unwrap_or(UNMARKED_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    #[error("no attendance record for {0}")]
    UnknownAttendee(String),

    #[error("check-out is only recorded for teachers")]
    CheckOutNotTracked,

    #[error("{0} has not checked in")]
    NotCheckedIn(String),

    #[error("check-out {check_out} is before check-in {check_in}")]
    CheckOutBeforeCheckIn {
        check_in: NaiveTime,
        check_out: NaiveTime,
    },
}

/// Tally per status. Counts always sum to `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    #[serde(rename = "Hadir")]
    pub hadir: usize,
    #[serde(rename = "Sakit")]
    pub sakit: usize,
    #[serde(rename = "Izin")]
    pub izin: usize,
    #[serde(rename = "Alpha")]
    pub alpha: usize,
    #[serde(rename = "Belum Absen")]
    pub unmarked: usize,
    pub total: usize,
}

impl AttendanceSummary {
    pub fn of<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Self {
        let mut out = Self::default();
        for r in records {
            out.total += 1;
            match r.status {
                Some(AttendanceStatus::Hadir) => out.hadir += 1,
                Some(AttendanceStatus::Sakit) => out.sakit += 1,
                Some(AttendanceStatus::Izin) => out.izin += 1,
                Some(AttendanceStatus::Alpha) => out.alpha += 1,
                None => out.unmarked += 1,
            }
        }
        out
    }

    #[cfg(test)]
    pub fn count(&self, status: AttendanceStatus) -> usize {
        match status {
            AttendanceStatus::Hadir => self.hadir,
            AttendanceStatus::Sakit => self.sakit,
            AttendanceStatus::Izin => self.izin,
            AttendanceStatus::Alpha => self.alpha,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceStore {
    kind: AttendeeKind,
    date: NaiveDate,
    marking: InitialMarking,
    present: PresentTimes,
    records: Vec<AttendanceRecord>,
}

impl AttendanceStore {
    pub fn initialize(
        kind: AttendeeKind,
        date: NaiveDate,
        roster: Vec<Attendee>,
        present: PresentTimes,
        marking: InitialMarking,
    ) -> Self {
        let records = roster
            .into_iter()
            .map(|a| AttendanceRecord::new(a, present, marking))
            .collect();
        Self {
            kind,
            date,
            marking,
            present,
            records,
        }
    }

    pub fn kind(&self) -> AttendeeKind {
        self.kind
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn marking(&self) -> InitialMarking {
        self.marking
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&AttendanceRecord> {
        self.records.iter().find(|r| r.attendee.id == id)
    }

    /// Follows the current roster order: new entities get a default record,
    /// removed ones are dropped, kept ones refresh their display data.
    pub fn sync_roster(&mut self, roster: Vec<Attendee>) {
        let mut old = std::mem::take(&mut self.records);
        self.records = roster
            .into_iter()
            .map(|a| match old.iter().position(|r| r.attendee.id == a.id) {
                Some(pos) => {
                    let mut rec = old.swap_remove(pos);
                    rec.attendee = a;
                    rec
                }
                None => AttendanceRecord::new(a, self.present, self.marking),
            })
            .collect();
    }

    pub fn set_status(
        &mut self,
        id: &str,
        status: AttendanceStatus,
        note: Option<&str>,
    ) -> Result<&AttendanceRecord, AttendanceError> {
        let rec = self.record_mut(id)?;
        if status == AttendanceStatus::Hadir {
            rec.mark_present();
        } else {
            rec.status = Some(status);
            rec.check_in = None;
            rec.check_out = None;
        }
        rec.note = note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        Ok(rec)
    }

    /// Marks present at `at`; that time becomes the last-known check-in.
    /// A known check-out earlier than `at` moves to the later of `at` and
    /// the session default, so teachers keep a check-out.
    pub fn check_in(&mut self, id: &str, at: NaiveTime) -> Result<&AttendanceRecord, AttendanceError> {
        let default_out = self.present.check_out;
        let rec = self.record_mut(id)?;
        rec.last_present.check_in = at;
        if rec.last_present.check_out.is_some_and(|out| out < at) {
            rec.last_present.check_out = Some(default_out.map_or(at, |d| d.max(at)));
        }
        rec.mark_present();
        rec.note = None;
        Ok(rec)
    }

    pub fn check_out(&mut self, id: &str, at: NaiveTime) -> Result<&AttendanceRecord, AttendanceError> {
        if self.kind != AttendeeKind::Teacher {
            return Err(AttendanceError::CheckOutNotTracked);
        }
        let rec = self.record_mut(id)?;
        let (Some(AttendanceStatus::Hadir), Some(check_in)) = (rec.status, rec.check_in) else {
            return Err(AttendanceError::NotCheckedIn(id.to_string()));
        };
        if at < check_in {
            return Err(AttendanceError::CheckOutBeforeCheckIn {
                check_in,
                check_out: at,
            });
        }
        rec.last_present.check_out = Some(at);
        rec.check_out = Some(at);
        Ok(rec)
    }

    pub fn summarize(&self) -> AttendanceSummary {
        AttendanceSummary::of(&self.records)
    }

    /// Case-insensitive match on name, code and, for teachers, subject name.
    pub fn filter(&self, query: &str) -> Vec<&AttendanceRecord> {
        self.scoped(None, query)
    }

    /// `filter` restricted to one group (a class id for students).
    pub fn scoped(&self, group_id: Option<&str>, query: &str) -> Vec<&AttendanceRecord> {
        let needle = query.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| group_id.map_or(true, |g| r.attendee.group_id == g))
            .filter(|r| needle.is_empty() || self.record_matches(r, &needle))
            .collect()
    }

    fn record_matches(&self, r: &AttendanceRecord, needle: &str) -> bool {
        let a = &r.attendee;
        if a.name.to_lowercase().contains(needle) || a.code.to_lowercase().contains(needle) {
            return true;
        }
        self.kind == AttendeeKind::Teacher
            && a.group_label
                .as_deref()
                .is_some_and(|l| l.to_lowercase().contains(needle))
    }

    fn record_mut(&mut self, id: &str) -> Result<&mut AttendanceRecord, AttendanceError> {
        self.records
            .iter_mut()
            .find(|r| r.attendee.id == id)
            .ok_or_else(|| AttendanceError::UnknownAttendee(id.to_string()))
    }
}
