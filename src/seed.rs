//! Fixed sample data used when a workspace has no saved snapshot.

use crate::model::*;

const MAJORS: [(&str, &str); 3] = [
    ("major-1", "Rekayasa Perangkat Lunak"),
    ("major-2", "Teknik Komputer & Jaringan"),
    ("major-3", "Multimedia"),
];

// (id, grade, label, major id)
const CLASSES: [(&str, &str, &str, &str); 7] = [
    ("class-1", "XII", "XII RPL 1", "major-1"),
    ("class-2", "XII", "XII RPL 2", "major-1"),
    ("class-3", "XI", "XI TKJ 1", "major-2"),
    ("class-4", "XI", "XI TKJ 2", "major-2"),
    ("class-5", "X", "X MM 1", "major-3"),
    ("class-6", "X", "X MM 2", "major-3"),
    ("class-7", "X", "X MM 3", "major-3"),
];

const SUBJECT_NAMES: [&str; 6] = [
    "Matematika",
    "RPL",
    "Bahasa Indonesia",
    "Bahasa Inggris",
    "Pendidikan Agama",
    "Jaringan Komputer",
];

pub fn majors() -> Vec<Major> {
    MAJORS
        .iter()
        .map(|(id, name)| Major {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
}

pub fn classes() -> Vec<Class> {
    CLASSES
        .iter()
        .map(|(id, grade, label, major_id)| Class {
            id: id.to_string(),
            name: grade.to_string(),
            label: label.to_string(),
            major_id: major_id.to_string(),
        })
        .collect()
}

/// Initials of the name (at most four, uppercased) followed by the 1-based
/// position: `Bahasa Indonesia` at position 3 becomes `BI3`.
pub fn subject_code(name: &str, position: usize) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .take(4)
        .collect();
    format!("{}{}", initials, position)
}

pub fn subjects() -> Vec<Subject> {
    SUBJECT_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| Subject {
            id: format!("subject-{}", i + 1),
            name: name.to_string(),
            code: subject_code(name, i + 1),
        })
        .collect()
}

fn student(
    id: &str,
    nis: &str,
    name: &str,
    class_id: &str,
    gender: Gender,
    status: ActiveStatus,
    avatar: u8,
) -> Student {
    Student {
        id: id.to_string(),
        nis: nis.to_string(),
        name: name.to_string(),
        class_id: class_id.to_string(),
        gender,
        status,
        avatar: format!("student-avatar-{}", avatar),
    }
}

pub fn students() -> Vec<Student> {
    use ActiveStatus::*;
    use Gender::*;
    vec![
        student("1", "12345", "Ahmad Budi Santoso", "class-1", L, Active, 1),
        student("2", "12346", "Citra Lestari Dewi", "class-1", P, Active, 2),
        student("3", "12347", "Deni Setiawan Putra", "class-4", L, Active, 3),
        student("4", "12348", "Eka Putri Wulandari", "class-7", P, Inactive, 4),
        student("5", "12349", "Fajar Nugraha", "class-1", L, Active, 5),
        student("6", "12350", "Gita Amelia", "class-4", P, Active, 1),
        student("7", "12351", "Hadi Prasetyo", "class-7", L, Active, 2),
        student("8", "12352", "Indah Permata", "class-7", P, Active, 2),
    ]
}

pub fn teachers() -> Vec<Teacher> {
    let rows = [
        ("1", "196805121994032008", "Dr. Siti Nurhaliza, S.Pd., M.Pd", "subject-1", Gender::P),
        ("2", "198203151997031004", "Ahmad Fauzi, S.Kom., M.T", "subject-2", Gender::L),
        ("3", "197506082006042018", "Dra. Indira Sari, M.Pd", "subject-3", Gender::P),
        ("4", "198912102015032007", "Sri Wahyuni, S.Pd", "subject-4", Gender::P),
    ];
    rows.iter()
        .map(|(id, nip, name, subject_id, gender)| Teacher {
            id: id.to_string(),
            nip: nip.to_string(),
            name: name.to_string(),
            subject_id: subject_id.to_string(),
            gender: *gender,
            status: ActiveStatus::Active,
            avatar: "user-avatar-1".to_string(),
        })
        .collect()
}

pub fn officers() -> Vec<Officer> {
    let rows = [
        ("1", "197001011995031001", "Bambang Suryadi", "Kepala Tata Usaha", "Tata Usaha", Gender::L, ActiveStatus::Active),
        ("2", "198505202010012003", "Rina Marlina", "Staf Administrasi", "Tata Usaha", Gender::P, ActiveStatus::Active),
        ("3", "197803142003121002", "Agus Salim", "Kepala Keamanan", "Keamanan", Gender::L, ActiveStatus::Active),
        ("4", "199002172015042001", "Dewi Kartika", "Pustakawan", "Perpustakaan", Gender::P, ActiveStatus::Active),
        ("5", "198111112008011004", "Slamet Riyadi", "Petugas Kebersihan", "Kebersihan", Gender::L, ActiveStatus::Inactive),
    ];
    rows.iter()
        .map(|(id, nip, name, position, department, gender, status)| Officer {
            id: id.to_string(),
            nip: nip.to_string(),
            name: name.to_string(),
            position: position.to_string(),
            department: department.to_string(),
            gender: *gender,
            status: *status,
            avatar: "user-avatar-1".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_codes_use_initials_and_position() {
        let codes: Vec<String> = subjects().into_iter().map(|s| s.code).collect();
        assert_eq!(codes, ["M1", "R2", "BI3", "BI4", "PA5", "JK6"]);
        assert_eq!(subject_code("teknik komputer dan jaringan lanjut", 9), "TKDJ9");
    }

    #[test]
    fn seed_references_resolve() {
        let classes = classes();
        let majors = majors();
        let subjects = subjects();
        for s in students() {
            assert!(classes.iter().any(|c| c.id == s.class_id), "{}", s.name);
        }
        for c in &classes {
            assert!(majors.iter().any(|m| m.id == c.major_id), "{}", c.label);
        }
        for t in teachers() {
            assert!(subjects.iter().any(|s| s.id == t.subject_id), "{}", t.name);
        }
    }
}
