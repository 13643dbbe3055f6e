use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    L,
    P,
}

impl Gender {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Some(Self::L),
            "P" => Some(Self::P),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActiveStatus {
    #[serde(rename = "Aktif")]
    Active,
    #[serde(rename = "Tidak Aktif")]
    Inactive,
}

impl ActiveStatus {
    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("aktif") {
            Some(Self::Active)
        } else if t.eq_ignore_ascii_case("tidak aktif") {
            Some(Self::Inactive)
        } else {
            None
        }
    }
}

/// The six managed roster kinds. Each one owns a snapshot key in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RosterKind {
    Students,
    Teachers,
    Officers,
    Classes,
    Majors,
    Subjects,
}

impl RosterKind {
    pub const ALL: [RosterKind; 6] = [
        Self::Students,
        Self::Teachers,
        Self::Officers,
        Self::Classes,
        Self::Majors,
        Self::Subjects,
    ];

    pub fn from_prefix(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.method_prefix() == s)
    }

    pub fn method_prefix(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::Officers => "officers",
            Self::Classes => "classes",
            Self::Majors => "majors",
            Self::Subjects => "subjects",
        }
    }

    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Students => "edutrack-students",
            Self::Teachers => "edutrack-teachers",
            Self::Officers => "edutrack-officers",
            Self::Classes => "edutrack-classes",
            Self::Majors => "edutrack-majors",
            Self::Subjects => "edutrack-subjects",
        }
    }

    /// Singular noun used in error messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Students => "student",
            Self::Teachers => "teacher",
            Self::Officers => "officer",
            Self::Classes => "class",
            Self::Majors => "major",
            Self::Subjects => "subject",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub nis: String,
    pub name: String,
    pub class_id: String,
    pub gender: Gender,
    pub status: ActiveStatus,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub nip: String,
    pub name: String,
    pub subject_id: String,
    pub gender: Gender,
    pub status: ActiveStatus,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Officer {
    pub id: String,
    pub nip: String,
    pub name: String,
    pub position: String,
    pub department: String,
    pub gender: Gender,
    pub status: ActiveStatus,
    pub avatar: String,
}

/// A class group. `name` is the grade level (`XII`), `label` the full
/// user-facing label (`XII RPL 1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
    pub label: String,
    pub major_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Major {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
}

// Form inputs. Everything is optional so that a missing field becomes a
// field-level validation error instead of a deserialization failure.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentInput {
    pub nis: Option<String>,
    pub name: Option<String>,
    pub class_id: Option<String>,
    pub gender: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeacherInput {
    pub nip: Option<String>,
    pub name: Option<String>,
    pub subject_id: Option<String>,
    pub gender: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfficerInput {
    pub nip: Option<String>,
    pub name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub gender: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassInput {
    pub name: Option<String>,
    pub label: Option<String>,
    pub major_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MajorInput {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubjectInput {
    pub name: Option<String>,
    pub code: Option<String>,
}

// Validated field sets.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentFields {
    pub nis: String,
    pub name: String,
    pub class_id: String,
    pub gender: Gender,
    pub status: ActiveStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherFields {
    pub nip: String,
    pub name: String,
    pub subject_id: String,
    pub gender: Gender,
    pub status: ActiveStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficerFields {
    pub nip: String,
    pub name: String,
    pub position: String,
    pub department: String,
    pub gender: Gender,
    pub status: ActiveStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFields {
    pub name: String,
    pub label: String,
    pub major_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MajorFields {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectFields {
    pub name: String,
    pub code: String,
}
