use crate::attendance::AttendanceSummary;
use crate::model::{ActiveStatus, Officer, Student, Teacher};
use serde::Serialize;
use std::collections::HashSet;

/// A roster member with an active flag and a grouping value
/// (class, subject or department).
pub trait Member {
    fn is_active(&self) -> bool;
    fn group(&self) -> &str;
}

impl Member for Student {
    fn is_active(&self) -> bool {
        self.status == ActiveStatus::Active
    }
    fn group(&self) -> &str {
        &self.class_id
    }
}

impl Member for Teacher {
    fn is_active(&self) -> bool {
        self.status == ActiveStatus::Active
    }
    fn group(&self) -> &str {
        &self.subject_id
    }
}

impl Member for Officer {
    fn is_active(&self) -> bool {
        self.status == ActiveStatus::Active
    }
    fn group(&self) -> &str {
        &self.department
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub distinct_groups: usize,
}

pub fn roster_stats<'a, M: Member + 'a>(items: impl IntoIterator<Item = &'a M>) -> RosterStats {
    let mut total = 0;
    let mut active = 0;
    let mut groups = HashSet::new();
    for m in items {
        total += 1;
        if m.is_active() {
            active += 1;
        }
        groups.insert(m.group());
    }
    RosterStats {
        total,
        active,
        inactive: total - active,
        distinct_groups: groups.len(),
    }
}

/// Officers whose position mentions "Kepala".
pub fn senior_officers<'a>(officers: impl IntoIterator<Item = &'a Officer>) -> usize {
    officers
        .into_iter()
        .filter(|o| o.position.contains("Kepala"))
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_students: usize,
    pub total_teachers: usize,
    pub total_classes: usize,
    pub total_officers: usize,
    pub student_attendance: AttendanceSummary,
    pub teacher_attendance: AttendanceSummary,
}
