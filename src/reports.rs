use chrono::NaiveDate;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportType {
    #[serde(rename = "Rekap Harian")]
    DailyRecap,
    #[serde(rename = "Rekap Mingguan")]
    WeeklyRecap,
    #[serde(rename = "Rekap Bulanan")]
    MonthlyRecap,
    #[serde(rename = "Laporan Absensi Siswa")]
    StudentAttendance,
    #[serde(rename = "Laporan Absensi Guru")]
    TeacherAttendance,
    #[serde(rename = "Laporan Keterlambatan")]
    Lateness,
}

impl ReportType {
    pub const ALL: [ReportType; 6] = [
        Self::DailyRecap,
        Self::WeeklyRecap,
        Self::MonthlyRecap,
        Self::StudentAttendance,
        Self::TeacherAttendance,
        Self::Lateness,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::DailyRecap => "Rekap Harian",
            Self::WeeklyRecap => "Rekap Mingguan",
            Self::MonthlyRecap => "Rekap Bulanan",
            Self::StudentAttendance => "Laporan Absensi Siswa",
            Self::TeacherAttendance => "Laporan Absensi Guru",
            Self::Lateness => "Laporan Keterlambatan",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == s.trim())
    }
}

fn ser_ymd<S: Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&d.format("%Y-%m-%d").to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub report_type: ReportType,
    #[serde(serialize_with = "ser_ymd")]
    pub start_date: NaiveDate,
    #[serde(serialize_with = "ser_ymd")]
    pub end_date: NaiveDate,
    pub title: String,
}

/// Accepts a request when the range is not inverted. No report body is
/// produced; the title is what the caller shows as confirmation.
pub fn request_report(
    report_type: ReportType,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Option<ReportRequest> {
    if start_date > end_date {
        return None;
    }
    let title = format!(
        "Laporan \"{}\" dari {} - {} telah dibuat.",
        report_type.label(),
        start_date.format("%d/%m/%y"),
        end_date.format("%d/%m/%y")
    );
    Some(ReportRequest {
        report_type,
        start_date,
        end_date,
        title,
    })
}
