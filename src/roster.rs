//! Roster stores: ordered in-memory entity lists backed by a snapshot
//! repository, with field validation and per-kind uniqueness rules.

use crate::error::{FieldError, StoreError, ValidationError};
use crate::model::*;
use crate::repo::Repository;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

pub trait RosterEntity: Clone + Serialize + DeserializeOwned {
    type Input: DeserializeOwned;
    type Fields;

    const KIND: RosterKind;

    /// `(field, message)` reported when `unique_key` collides.
    const UNIQUE: Option<(&'static str, &'static str)> = None;

    fn id(&self) -> &str;

    fn validate(input: &Self::Input) -> Result<Self::Fields, ValidationError>;

    /// Builds a new record. `roster_len` is the list length before insertion.
    fn create(id: String, fields: Self::Fields, roster_len: usize) -> Self;

    /// Overwrites the editable fields; id and avatar are kept.
    fn apply(&mut self, fields: Self::Fields);

    /// Text fields searched by `ListFilter::query`.
    fn search_fields(&self) -> Vec<&str>;

    /// Value compared against `ListFilter::category`.
    fn category(&self) -> Option<&str> {
        None
    }

    fn unique_key(&self) -> Option<&str> {
        None
    }

    fn fields_unique_key(_fields: &Self::Fields) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub query: Option<String>,
    pub category: Option<String>,
}

impl ListFilter {
    #[cfg(test)]
    pub fn query(q: &str) -> Self {
        Self {
            query: Some(q.to_string()),
            category: None,
        }
    }

    pub fn matches<E: RosterEntity>(&self, item: &E) -> bool {
        let query_ok = match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let needle = q.to_lowercase();
                item.search_fields()
                    .iter()
                    .any(|f| f.to_lowercase().contains(&needle))
            }
        };
        let category_ok = match self.category.as_deref() {
            None | Some("") => true,
            Some(c) => item.category() == Some(c),
        };
        query_ok && category_ok
    }
}

pub struct RosterStore<E: RosterEntity> {
    items: Vec<E>,
    seed: Vec<E>,
    repo: Box<dyn Repository<E>>,
}

impl<E: RosterEntity> RosterStore<E> {
    /// Reads the repository once. A saved snapshot supersedes the seed; an
    /// unreadable one is logged and ignored.
    pub fn new(seed: Vec<E>, repo: Box<dyn Repository<E>>) -> Self {
        let items = match repo.load() {
            Ok(Some(saved)) => saved,
            Ok(None) => seed.clone(),
            Err(e) => {
                warn!(key = E::KIND.storage_key(), error = %e, "failed to load snapshot, using seed");
                seed.clone()
            }
        };
        Self { items, seed, repo }
    }

    pub fn all(&self) -> &[E] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.items.iter().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn list(&self, filter: &ListFilter) -> Vec<&E> {
        self.items.iter().filter(|e| filter.matches(*e)).collect()
    }

    #[cfg(test)]
    pub fn create(&mut self, input: &E::Input) -> Result<E, StoreError> {
        let fields = E::validate(input)?;
        self.insert_validated(fields)
    }

    pub fn insert_validated(&mut self, fields: E::Fields) -> Result<E, StoreError> {
        self.check_unique(&fields, None)?;
        let entity = E::create(Uuid::new_v4().to_string(), fields, self.items.len());
        self.items.insert(0, entity.clone());
        self.persist();
        Ok(entity)
    }

    #[cfg(test)]
    pub fn update(&mut self, id: &str, input: &E::Input) -> Result<E, StoreError> {
        let fields = E::validate(input)?;
        self.update_validated(id, fields)
    }

    pub fn update_validated(&mut self, id: &str, fields: E::Fields) -> Result<E, StoreError> {
        let Some(pos) = self.items.iter().position(|e| e.id() == id) else {
            return Err(StoreError::NotFound {
                kind: E::KIND.noun(),
                id: id.to_string(),
            });
        };
        self.check_unique(&fields, Some(id))?;
        self.items[pos].apply(fields);
        let updated = self.items[pos].clone();
        self.persist();
        Ok(updated)
    }

    /// Returns whether a record was removed. Absent ids are a no-op.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|e| e.id() != id);
        let removed = self.items.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn reset_to_seed(&mut self) {
        if let Err(e) = self.repo.clear() {
            warn!(key = E::KIND.storage_key(), error = %e, "failed to clear snapshot");
        }
        self.items = self.seed.clone();
        info!(kind = E::KIND.method_prefix(), count = self.items.len(), "roster reset to seed");
    }

    fn check_unique(&self, fields: &E::Fields, editing: Option<&str>) -> Result<(), ValidationError> {
        let (Some((field, message)), Some(key)) = (E::UNIQUE, E::fields_unique_key(fields)) else {
            return Ok(());
        };
        let key = key.to_lowercase();
        let taken = self.items.iter().any(|e| {
            Some(e.id()) != editing && e.unique_key().map(str::to_lowercase) == Some(key.clone())
        });
        if taken {
            return Err(ValidationError::single(field, message));
        }
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.repo.save(&self.items) {
            warn!(key = E::KIND.storage_key(), error = %e, "failed to save snapshot");
        }
    }
}

fn required(
    errors: &mut Vec<FieldError>,
    value: &Option<String>,
    field: &'static str,
    message: &str,
) -> String {
    let v = value.as_deref().map(str::trim).unwrap_or("");
    if v.is_empty() {
        errors.push(FieldError::new(field, message));
    }
    v.to_string()
}

fn parse_gender(errors: &mut Vec<FieldError>, value: &Option<String>) -> Option<Gender> {
    let g = value.as_deref().and_then(Gender::parse);
    if g.is_none() {
        errors.push(FieldError::new("gender", "Jenis kelamin harus dipilih"));
    }
    g
}

fn parse_status(errors: &mut Vec<FieldError>, value: &Option<String>) -> Option<ActiveStatus> {
    let s = value.as_deref().and_then(ActiveStatus::parse);
    if s.is_none() {
        errors.push(FieldError::new("status", "Status harus dipilih"));
    }
    s
}

fn finish<T>(errors: Vec<FieldError>, fields: Option<T>) -> Result<T, ValidationError> {
    match fields {
        Some(f) if errors.is_empty() => Ok(f),
        _ => Err(ValidationError::new(errors)),
    }
}

pub fn student_avatar(roster_len: usize) -> String {
    format!("student-avatar-{}", (roster_len % 5) + 1)
}

pub const STAFF_AVATAR: &str = "user-avatar-1";

impl RosterEntity for Student {
    type Input = StudentInput;
    type Fields = StudentFields;
    const KIND: RosterKind = RosterKind::Students;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(input: &StudentInput) -> Result<StudentFields, ValidationError> {
        let mut errors = Vec::new();
        let name = required(&mut errors, &input.name, "name", "Nama tidak boleh kosong");
        let nis = required(&mut errors, &input.nis, "nis", "NIS tidak boleh kosong");
        let class_id = required(&mut errors, &input.class_id, "classId", "Kelas harus dipilih");
        let gender = parse_gender(&mut errors, &input.gender);
        let status = parse_status(&mut errors, &input.status);
        let fields = gender.zip(status).map(|(gender, status)| StudentFields {
            nis,
            name,
            class_id,
            gender,
            status,
        });
        finish(errors, fields)
    }

    fn create(id: String, f: StudentFields, roster_len: usize) -> Self {
        Self {
            id,
            nis: f.nis,
            name: f.name,
            class_id: f.class_id,
            gender: f.gender,
            status: f.status,
            avatar: student_avatar(roster_len),
        }
    }

    fn apply(&mut self, f: StudentFields) {
        self.nis = f.nis;
        self.name = f.name;
        self.class_id = f.class_id;
        self.gender = f.gender;
        self.status = f.status;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.nis]
    }

    fn category(&self) -> Option<&str> {
        Some(&self.class_id)
    }
}

impl RosterEntity for Teacher {
    type Input = TeacherInput;
    type Fields = TeacherFields;
    const KIND: RosterKind = RosterKind::Teachers;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(input: &TeacherInput) -> Result<TeacherFields, ValidationError> {
        let mut errors = Vec::new();
        let name = required(&mut errors, &input.name, "name", "Nama tidak boleh kosong");
        let nip = required(&mut errors, &input.nip, "nip", "NIP tidak boleh kosong");
        let subject_id = required(
            &mut errors,
            &input.subject_id,
            "subjectId",
            "Mata pelajaran harus dipilih",
        );
        let gender = parse_gender(&mut errors, &input.gender);
        let status = parse_status(&mut errors, &input.status);
        let fields = gender.zip(status).map(|(gender, status)| TeacherFields {
            nip,
            name,
            subject_id,
            gender,
            status,
        });
        finish(errors, fields)
    }

    fn create(id: String, f: TeacherFields, _roster_len: usize) -> Self {
        Self {
            id,
            nip: f.nip,
            name: f.name,
            subject_id: f.subject_id,
            gender: f.gender,
            status: f.status,
            avatar: STAFF_AVATAR.to_string(),
        }
    }

    fn apply(&mut self, f: TeacherFields) {
        self.nip = f.nip;
        self.name = f.name;
        self.subject_id = f.subject_id;
        self.gender = f.gender;
        self.status = f.status;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.nip]
    }

    fn category(&self) -> Option<&str> {
        Some(&self.subject_id)
    }
}

impl RosterEntity for Officer {
    type Input = OfficerInput;
    type Fields = OfficerFields;
    const KIND: RosterKind = RosterKind::Officers;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(input: &OfficerInput) -> Result<OfficerFields, ValidationError> {
        let mut errors = Vec::new();
        let name = required(&mut errors, &input.name, "name", "Nama tidak boleh kosong");
        let nip = required(&mut errors, &input.nip, "nip", "NIP tidak boleh kosong");
        let position = required(
            &mut errors,
            &input.position,
            "position",
            "Jabatan tidak boleh kosong",
        );
        let department = required(
            &mut errors,
            &input.department,
            "department",
            "Bagian tidak boleh kosong",
        );
        let gender = parse_gender(&mut errors, &input.gender);
        let status = parse_status(&mut errors, &input.status);
        let fields = gender.zip(status).map(|(gender, status)| OfficerFields {
            nip,
            name,
            position,
            department,
            gender,
            status,
        });
        finish(errors, fields)
    }

    fn create(id: String, f: OfficerFields, _roster_len: usize) -> Self {
        Self {
            id,
            nip: f.nip,
            name: f.name,
            position: f.position,
            department: f.department,
            gender: f.gender,
            status: f.status,
            avatar: STAFF_AVATAR.to_string(),
        }
    }

    fn apply(&mut self, f: OfficerFields) {
        self.nip = f.nip;
        self.name = f.name;
        self.position = f.position;
        self.department = f.department;
        self.gender = f.gender;
        self.status = f.status;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.nip, &self.position]
    }

    fn category(&self) -> Option<&str> {
        Some(&self.department)
    }
}

impl RosterEntity for Class {
    type Input = ClassInput;
    type Fields = ClassFields;
    const KIND: RosterKind = RosterKind::Classes;
    const UNIQUE: Option<(&'static str, &'static str)> = Some(("label", "Kelas sudah ada"));

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(input: &ClassInput) -> Result<ClassFields, ValidationError> {
        let mut errors = Vec::new();
        let name = required(&mut errors, &input.name, "name", "Tingkat kelas tidak boleh kosong");
        let label = required(&mut errors, &input.label, "label", "Nama kelas tidak boleh kosong");
        let major_id = required(&mut errors, &input.major_id, "majorId", "Jurusan harus dipilih");
        finish(
            errors,
            Some(ClassFields {
                name,
                label,
                major_id,
            }),
        )
    }

    fn create(id: String, f: ClassFields, _roster_len: usize) -> Self {
        Self {
            id,
            name: f.name,
            label: f.label,
            major_id: f.major_id,
        }
    }

    fn apply(&mut self, f: ClassFields) {
        self.name = f.name;
        self.label = f.label;
        self.major_id = f.major_id;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.label, &self.name]
    }

    fn category(&self) -> Option<&str> {
        Some(&self.major_id)
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.label)
    }

    fn fields_unique_key(fields: &ClassFields) -> Option<&str> {
        Some(&fields.label)
    }
}

impl RosterEntity for Major {
    type Input = MajorInput;
    type Fields = MajorFields;
    const KIND: RosterKind = RosterKind::Majors;
    const UNIQUE: Option<(&'static str, &'static str)> = Some(("name", "Jurusan sudah ada"));

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(input: &MajorInput) -> Result<MajorFields, ValidationError> {
        let mut errors = Vec::new();
        let name = required(&mut errors, &input.name, "name", "Nama jurusan tidak boleh kosong");
        finish(errors, Some(MajorFields { name }))
    }

    fn create(id: String, f: MajorFields, _roster_len: usize) -> Self {
        Self { id, name: f.name }
    }

    fn apply(&mut self, f: MajorFields) {
        self.name = f.name;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name]
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn fields_unique_key(fields: &MajorFields) -> Option<&str> {
        Some(&fields.name)
    }
}

impl RosterEntity for Subject {
    type Input = SubjectInput;
    type Fields = SubjectFields;
    const KIND: RosterKind = RosterKind::Subjects;
    const UNIQUE: Option<(&'static str, &'static str)> =
        Some(("code", "Kode mata pelajaran sudah ada"));

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(input: &SubjectInput) -> Result<SubjectFields, ValidationError> {
        let mut errors = Vec::new();
        let name = required(
            &mut errors,
            &input.name,
            "name",
            "Nama mata pelajaran tidak boleh kosong",
        );
        let code = required(
            &mut errors,
            &input.code,
            "code",
            "Kode mata pelajaran tidak boleh kosong",
        );
        finish(errors, Some(SubjectFields { name, code }))
    }

    fn create(id: String, f: SubjectFields, _roster_len: usize) -> Self {
        Self {
            id,
            name: f.name,
            code: f.code,
        }
    }

    fn apply(&mut self, f: SubjectFields) {
        self.name = f.name;
        self.code = f.code;
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.code]
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.code)
    }

    fn fields_unique_key(fields: &SubjectFields) -> Option<&str> {
        Some(&fields.code)
    }
}
