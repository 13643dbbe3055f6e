//! CSV templates handed out for bulk roster import.

use crate::model::RosterKind;
use serde::Serialize;

const GENDER_COLUMN: &str = "jenis_kelamin (L/P)";
const STATUS_COLUMN: &str = "status (Aktif/Tidak Aktif)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportTemplate {
    pub filename: String,
    pub content: String,
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_line(cells: &[&str]) -> String {
    let mut line = cells
        .iter()
        .map(|c| csv_quote(c))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// `None` for kinds that have no import flow.
pub fn import_template(kind: RosterKind) -> Option<ImportTemplate> {
    let (filename, code_column, group_column, examples): (_, _, _, [[&str; 5]; 2]) = match kind {
        RosterKind::Students => (
            "template_import_siswa.csv",
            "nis",
            "kelas",
            [
                ["John Doe", "12345", "XII RPL 1", "L", "Aktif"],
                ["Jane Smith", "12346", "XII RPL 1", "P", "Aktif"],
            ],
        ),
        RosterKind::Teachers => (
            "template_import_guru.csv",
            "nip",
            "mata_pelajaran",
            [
                ["John Doe", "198001012005011001", "Matematika", "L", "Aktif"],
                ["Jane Smith", "198502022010012002", "Bahasa Inggris", "P", "Aktif"],
            ],
        ),
        _ => return None,
    };

    let mut content = csv_line(&["nama", code_column, group_column, GENDER_COLUMN, STATUS_COLUMN]);
    for row in &examples {
        content.push_str(&csv_line(row));
    }
    Some(ImportTemplate {
        filename: filename.to_string(),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_template_matches_import_layout() {
        let t = import_template(RosterKind::Students).expect("template");
        assert_eq!(t.filename, "template_import_siswa.csv");
        assert_eq!(
            t.content,
            "nama,nis,kelas,jenis_kelamin (L/P),status (Aktif/Tidak Aktif)\n\
             John Doe,12345,XII RPL 1,L,Aktif\n\
             Jane Smith,12346,XII RPL 1,P,Aktif\n"
        );
    }

    #[test]
    fn teacher_template_has_subject_column() {
        let t = import_template(RosterKind::Teachers).expect("template");
        let header = t.content.lines().next().expect("header");
        assert_eq!(
            header,
            "nama,nip,mata_pelajaran,jenis_kelamin (L/P),status (Aktif/Tidak Aktif)"
        );
        assert_eq!(t.content.lines().count(), 3);
    }

    #[test]
    fn reference_kinds_have_no_template() {
        assert!(import_template(RosterKind::Majors).is_none());
        assert!(import_template(RosterKind::Officers).is_none());
    }

    #[test]
    fn quoting_escapes_commas_and_quotes() {
        assert_eq!(csv_quote("Dr. A, M.Pd"), "\"Dr. A, M.Pd\"");
        assert_eq!(csv_quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
