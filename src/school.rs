//! The school aggregate: all roster stores of a workspace plus the two
//! attendance sessions, with the cross-store reference rules.
//!
//! References are checked at write time (student → class, class → major,
//! teacher → subject). Deleting a referenced record is refused.

use crate::attendance::{
    AttendanceDefaults, AttendanceStore, Attendee, AttendeeKind, InitialMarking,
};
use crate::error::{FieldError, StoreError, ValidationError};
use crate::model::*;
use crate::repo::{SnapshotBackend, SnapshotRepository};
use crate::roster::{ListFilter, RosterEntity, RosterStore};
use crate::seed;
use crate::stats::DashboardOverview;
use chrono::NaiveDate;
use tracing::info;

pub struct School {
    pub students: RosterStore<Student>,
    pub teachers: RosterStore<Teacher>,
    pub officers: RosterStore<Officer>,
    pub classes: RosterStore<Class>,
    pub majors: RosterStore<Major>,
    pub subjects: RosterStore<Subject>,
    student_attendance: AttendanceStore,
    teacher_attendance: AttendanceStore,
    defaults: AttendanceDefaults,
}

/// Store access and reference rules for one roster kind.
pub trait SchoolEntity: RosterEntity {
    fn store(school: &School) -> &RosterStore<Self>;
    fn store_mut(school: &mut School) -> &mut RosterStore<Self>;

    fn check_references(_school: &School, _fields: &Self::Fields) -> Vec<FieldError> {
        Vec::new()
    }

    /// Describes the first record that still points at `id`.
    fn referenced_by(_school: &School, _id: &str) -> Option<String> {
        None
    }
}

impl School {
    pub fn open<B>(backend: B, today: NaiveDate, defaults: AttendanceDefaults) -> Self
    where
        B: SnapshotBackend + Clone + 'static,
    {
        fn store<E, B>(backend: &B, seed: Vec<E>) -> RosterStore<E>
        where
            E: RosterEntity + 'static,
            B: SnapshotBackend + Clone + 'static,
        {
            RosterStore::new(
                seed,
                Box::new(SnapshotRepository::<E, B>::new(
                    backend.clone(),
                    E::KIND.storage_key(),
                )),
            )
        }

        let mut school = Self {
            students: store(&backend, seed::students()),
            teachers: store(&backend, seed::teachers()),
            officers: store(&backend, seed::officers()),
            classes: store(&backend, seed::classes()),
            majors: store(&backend, seed::majors()),
            subjects: store(&backend, seed::subjects()),
            student_attendance: empty_session(AttendeeKind::Student, today, &defaults),
            teacher_attendance: empty_session(AttendeeKind::Teacher, today, &defaults),
            defaults,
        };
        school.open_attendance(AttendeeKind::Student, today, InitialMarking::Present);
        school.open_attendance(AttendeeKind::Teacher, today, InitialMarking::Present);
        info!(
            students = school.students.len(),
            teachers = school.teachers.len(),
            classes = school.classes.len(),
            "school opened"
        );
        school
    }

    pub fn list<E: SchoolEntity>(&self, filter: &ListFilter) -> Vec<&E> {
        E::store(self).list(filter)
    }

    pub fn create<E: SchoolEntity>(&mut self, input: &E::Input) -> Result<E, StoreError> {
        let fields = E::validate(input)?;
        let refs = E::check_references(self, &fields);
        if !refs.is_empty() {
            return Err(ValidationError::new(refs).into());
        }
        E::store_mut(self).insert_validated(fields)
    }

    pub fn update<E: SchoolEntity>(&mut self, id: &str, input: &E::Input) -> Result<E, StoreError> {
        let fields = E::validate(input)?;
        let refs = E::check_references(self, &fields);
        if !refs.is_empty() {
            return Err(ValidationError::new(refs).into());
        }
        E::store_mut(self).update_validated(id, fields)
    }

    /// Ok(false) when the id was already absent.
    pub fn delete<E: SchoolEntity>(&mut self, id: &str) -> Result<bool, StoreError> {
        if !E::store(self).contains(id) {
            return Ok(false);
        }
        if let Some(by) = E::referenced_by(self, id) {
            return Err(StoreError::InUse {
                kind: E::KIND.noun(),
                id: id.to_string(),
                by,
            });
        }
        Ok(E::store_mut(self).delete(id))
    }

    /// Restores the seed for one kind. References held by other kinds are
    /// not rewritten; rows pointing at vanished records show no label.
    pub fn reset<E: SchoolEntity>(&mut self) {
        E::store_mut(self).reset_to_seed();
    }

    pub fn class_label(&self, class_id: &str) -> Option<&str> {
        self.classes.get(class_id).map(|c| c.label.as_str())
    }

    pub fn class_by_label(&self, label: &str) -> Option<&Class> {
        let label = label.trim();
        self.classes
            .all()
            .iter()
            .find(|c| c.label.eq_ignore_ascii_case(label))
    }

    pub fn major_name(&self, major_id: &str) -> Option<&str> {
        self.majors.get(major_id).map(|m| m.name.as_str())
    }

    pub fn subject_name(&self, subject_id: &str) -> Option<&str> {
        self.subjects.get(subject_id).map(|s| s.name.as_str())
    }

    /// Whether the student's class belongs to `major_id`.
    pub fn student_in_major(&self, student: &Student, major_id: &str) -> bool {
        self.classes
            .get(&student.class_id)
            .is_some_and(|c| c.major_id == major_id)
    }

    pub fn students_in_class(&self, class_id: &str) -> usize {
        self.students
            .all()
            .iter()
            .filter(|s| s.class_id == class_id)
            .count()
    }

    /// Applies to sessions opened afterwards.
    pub fn set_attendance_defaults(&mut self, defaults: AttendanceDefaults) {
        self.defaults = defaults;
    }

    fn attendees(&self, kind: AttendeeKind) -> Vec<Attendee> {
        match kind {
            AttendeeKind::Student => self
                .students
                .all()
                .iter()
                .map(|s| Attendee {
                    id: s.id.clone(),
                    code: s.nis.clone(),
                    name: s.name.clone(),
                    group_id: s.class_id.clone(),
                    group_label: self.class_label(&s.class_id).map(str::to_string),
                })
                .collect(),
            AttendeeKind::Teacher => self
                .teachers
                .all()
                .iter()
                .map(|t| Attendee {
                    id: t.id.clone(),
                    code: t.nip.clone(),
                    name: t.name.clone(),
                    group_id: t.subject_id.clone(),
                    group_label: self.subject_name(&t.subject_id).map(str::to_string),
                })
                .collect(),
        }
    }

    /// Starts a fresh session, discarding the previous day's state.
    pub fn open_attendance(&mut self, kind: AttendeeKind, date: NaiveDate, marking: InitialMarking) {
        let session = AttendanceStore::initialize(
            kind,
            date,
            self.attendees(kind),
            self.defaults.for_kind(kind),
            marking,
        );
        *self.session_slot(kind) = session;
    }

    /// Current session after following roster changes.
    pub fn attendance(&mut self, kind: AttendeeKind) -> &mut AttendanceStore {
        let roster = self.attendees(kind);
        let session = self.session_slot(kind);
        session.sync_roster(roster);
        session
    }

    fn session_slot(&mut self, kind: AttendeeKind) -> &mut AttendanceStore {
        match kind {
            AttendeeKind::Student => &mut self.student_attendance,
            AttendeeKind::Teacher => &mut self.teacher_attendance,
        }
    }

    pub fn overview(&mut self) -> DashboardOverview {
        let student_attendance = self.attendance(AttendeeKind::Student).summarize();
        let teacher_attendance = self.attendance(AttendeeKind::Teacher).summarize();
        DashboardOverview {
            total_students: self.students.len(),
            total_teachers: self.teachers.len(),
            total_classes: self.classes.len(),
            total_officers: self.officers.len(),
            student_attendance,
            teacher_attendance,
        }
    }
}

fn empty_session(kind: AttendeeKind, date: NaiveDate, defaults: &AttendanceDefaults) -> AttendanceStore {
    AttendanceStore::initialize(
        kind,
        date,
        Vec::new(),
        defaults.for_kind(kind),
        InitialMarking::Present,
    )
}

impl SchoolEntity for Student {
    fn store(school: &School) -> &RosterStore<Self> {
        &school.students
    }
    fn store_mut(school: &mut School) -> &mut RosterStore<Self> {
        &mut school.students
    }

    fn check_references(school: &School, fields: &StudentFields) -> Vec<FieldError> {
        if school.classes.contains(&fields.class_id) {
            return Vec::new();
        }
        vec![FieldError::new("classId", "Kelas tidak ditemukan")]
    }
}

impl SchoolEntity for Teacher {
    fn store(school: &School) -> &RosterStore<Self> {
        &school.teachers
    }
    fn store_mut(school: &mut School) -> &mut RosterStore<Self> {
        &mut school.teachers
    }

    fn check_references(school: &School, fields: &TeacherFields) -> Vec<FieldError> {
        if school.subjects.contains(&fields.subject_id) {
            return Vec::new();
        }
        vec![FieldError::new("subjectId", "Mata pelajaran tidak ditemukan")]
    }
}

impl SchoolEntity for Officer {
    fn store(school: &School) -> &RosterStore<Self> {
        &school.officers
    }
    fn store_mut(school: &mut School) -> &mut RosterStore<Self> {
        &mut school.officers
    }
}

impl SchoolEntity for Class {
    fn store(school: &School) -> &RosterStore<Self> {
        &school.classes
    }
    fn store_mut(school: &mut School) -> &mut RosterStore<Self> {
        &mut school.classes
    }

    fn check_references(school: &School, fields: &ClassFields) -> Vec<FieldError> {
        if school.majors.contains(&fields.major_id) {
            return Vec::new();
        }
        vec![FieldError::new("majorId", "Jurusan tidak ditemukan")]
    }

    fn referenced_by(school: &School, id: &str) -> Option<String> {
        school
            .students
            .all()
            .iter()
            .find(|s| s.class_id == id)
            .map(|s| format!("student {}", s.name))
    }
}

impl SchoolEntity for Major {
    fn store(school: &School) -> &RosterStore<Self> {
        &school.majors
    }
    fn store_mut(school: &mut School) -> &mut RosterStore<Self> {
        &mut school.majors
    }

    fn referenced_by(school: &School, id: &str) -> Option<String> {
        school
            .classes
            .all()
            .iter()
            .find(|c| c.major_id == id)
            .map(|c| format!("class {}", c.label))
    }
}

impl SchoolEntity for Subject {
    fn store(school: &School) -> &RosterStore<Self> {
        &school.subjects
    }
    fn store_mut(school: &mut School) -> &mut RosterStore<Self> {
        &mut school.subjects
    }

    fn referenced_by(school: &School, id: &str) -> Option<String> {
        school
            .teachers
            .all()
            .iter()
            .find(|t| t.subject_id == id)
            .map(|t| format!("teacher {}", t.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::AttendanceStatus;
    use crate::repo::MemorySnapshots;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 30).expect("date")
    }

    fn school() -> (School, MemorySnapshots) {
        let backend = MemorySnapshots::new();
        let school = School::open(backend.clone(), today(), AttendanceDefaults::default());
        (school, backend)
    }

    fn major_input(name: &str) -> MajorInput {
        MajorInput {
            name: Some(name.into()),
        }
    }

    #[test]
    fn major_names_are_unique_case_insensitively() {
        let (mut school, _) = school();
        let err = school
            .create::<Major>(&major_input("multimedia"))
            .expect_err("duplicate");
        assert_eq!(err.code(), "validation_failed");
        assert_eq!(school.majors.len(), 3);

        let created = school
            .create::<Major>(&major_input("Akuntansi"))
            .expect("new major");
        assert_eq!(school.majors.all()[0].id, created.id);
    }

    #[test]
    fn deleting_a_referenced_major_is_refused() {
        let (mut school, _) = school();
        let err = school.delete::<Major>("major-1").expect_err("in use");
        assert_eq!(err.code(), "in_use");
        assert!(school.majors.contains("major-1"));
        assert_eq!(
            school.classes.get("class-1").map(|c| c.major_id.as_str()),
            Some("major-1")
        );

        let created = school
            .create::<Major>(&major_input("Tata Boga"))
            .expect("create");
        assert!(school.delete::<Major>(&created.id).expect("delete"));
        assert!(!school.delete::<Major>(&created.id).expect("again"));
    }

    #[test]
    fn class_in_use_by_students_cannot_be_deleted() {
        let (mut school, _) = school();
        assert_eq!(school.delete::<Class>("class-1").expect_err("in use").code(), "in_use");
        // XII RPL 2 has no students.
        assert!(school.delete::<Class>("class-2").expect("delete"));
    }

    #[test]
    fn student_must_reference_an_existing_class() {
        let (mut school, _) = school();
        let input = StudentInput {
            nis: Some("5555".into()),
            name: Some("Tanpa Kelas".into()),
            class_id: Some("class-404".into()),
            gender: Some("L".into()),
            status: Some("Aktif".into()),
        };
        let err = school.create::<Student>(&input).expect_err("dangling class");
        let StoreError::Validation(v) = err else {
            panic!("expected validation error");
        };
        assert!(v.has_field("classId"));
        assert_eq!(school.students.len(), 8);
    }

    #[test]
    fn teacher_subject_must_exist_and_subject_in_use_is_kept() {
        let (mut school, _) = school();
        let input = TeacherInput {
            nip: Some("1".into()),
            name: Some("Guru Baru".into()),
            subject_id: Some("subject-99".into()),
            gender: Some("P".into()),
            status: Some("Aktif".into()),
        };
        assert!(school.create::<Teacher>(&input).is_err());
        assert_eq!(school.delete::<Subject>("subject-1").expect_err("used").code(), "in_use");
        assert!(school.delete::<Subject>("subject-6").expect("unused"));
    }

    #[test]
    fn major_filter_follows_class_relation() {
        let (school, _) = school();
        let in_tkj: Vec<&str> = school
            .students
            .all()
            .iter()
            .filter(|s| school.student_in_major(s, "major-2"))
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(in_tkj, ["3", "6"]);
    }

    #[test]
    fn attendance_follows_roster_changes() {
        let (mut school, _) = school();
        school
            .attendance(AttendeeKind::Student)
            .set_status("1", AttendanceStatus::Alpha, None)
            .expect("set");
        school.students.delete("8");
        let session = school.attendance(AttendeeKind::Student);
        assert_eq!(session.records().len(), 7);
        assert_eq!(
            session.get("1").and_then(|r| r.status),
            Some(AttendanceStatus::Alpha)
        );
        let scoped = session.scoped(Some("class-1"), "");
        assert_eq!(scoped.len(), 3);
        assert_eq!(scoped[0].attendee.group_label.as_deref(), Some("XII RPL 1"));
    }

    #[test]
    fn reopening_attendance_discards_previous_state() {
        let (mut school, _) = school();
        school
            .attendance(AttendeeKind::Teacher)
            .set_status("2", AttendanceStatus::Sakit, Some("demam"))
            .expect("set");
        let tomorrow = today().succ_opt().expect("date");
        school.open_attendance(AttendeeKind::Teacher, tomorrow, InitialMarking::Present);
        let session = school.attendance(AttendeeKind::Teacher);
        assert_eq!(session.date(), tomorrow);
        assert_eq!(session.summarize().hadir, 4);
    }

    #[test]
    fn overview_counts_rosters_and_attendance() {
        let (mut school, _) = school();
        let o = school.overview();
        assert_eq!(o.total_students, 8);
        assert_eq!(o.total_teachers, 4);
        assert_eq!(o.total_classes, 7);
        assert_eq!(o.total_officers, 5);
        assert_eq!(o.student_attendance.hadir, 8);
        assert_eq!(o.teacher_attendance.total, 4);
    }

    #[test]
    fn snapshots_are_written_per_kind() {
        let (mut school, backend) = school();
        school
            .create::<Major>(&major_input("Akuntansi"))
            .expect("create");
        assert!(backend.contains("edutrack-majors"));
        assert!(!backend.contains("edutrack-students"));
        school.reset::<Major>();
        assert!(!backend.contains("edutrack-majors"));
        assert_eq!(school.majors.len(), 3);
    }
}
