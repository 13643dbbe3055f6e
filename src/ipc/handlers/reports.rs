use crate::ipc::helpers::{finish, get_date, get_optional_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::reports::{request_report, ReportType};
use serde_json::{json, Value};
use tracing::info;

fn report_request(params: &Value) -> Result<Value, HandlerErr> {
    let mut missing = Vec::new();
    let report_type = get_optional_str(params, "reportType");
    let start = get_date(params, "startDate")?;
    let end = get_date(params, "endDate")?;
    if report_type.is_none() {
        missing.push(json!({ "field": "reportType", "message": "Jenis laporan harus dipilih" }));
    }
    if start.is_none() {
        missing.push(json!({ "field": "startDate", "message": "Tanggal mulai harus dipilih" }));
    }
    if end.is_none() {
        missing.push(json!({ "field": "endDate", "message": "Tanggal selesai harus dipilih" }));
    }
    let (Some(raw_type), Some(start), Some(end)) = (report_type, start, end) else {
        return Err(HandlerErr::new("validation_failed", "Parameter Tidak Lengkap")
            .with_details(json!(missing)));
    };

    let report_type = ReportType::parse(&raw_type).ok_or_else(|| {
        HandlerErr::field("reportType", format!("jenis laporan tidak dikenal: {}", raw_type))
    })?;
    let request = request_report(report_type, start, end).ok_or_else(|| {
        HandlerErr::field("endDate", "Tanggal selesai tidak boleh sebelum tanggal mulai")
    })?;
    info!(report = report_type.label(), %start, %end, "report requested");
    Ok(json!(request))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "reports.request" => Some(finish(&req.id, report_request(&req.params))),
        _ => None,
    }
}
