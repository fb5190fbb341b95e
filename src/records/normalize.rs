//! Row normalization — both endpoint row shapes into [`CanonicalRecord`].
//!
//! Positional rows carry a fixed 6-column table layout and bury their dates
//! inside a free-text status blob; keyed rows name every field but need the
//! display blob synthesized. Either way the output is one canonical record
//! per raw row, and normalizing the same row twice yields identical output.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::dates::{extract_labeled_date, parse_day_first, DATE_LABELS};
use super::harm::classify_harm;
use super::{CanonicalRecord, RawRow};

/// Leading `CODE:` pattern of the positional type cell, e.g. `CP101:ให้ยาผิดชนิด`.
static TYPE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+\d+):(.*)$").expect("static pattern"));

/// Normalize one raw row into the canonical schema.
pub fn normalize_row(row: &RawRow) -> CanonicalRecord {
    match row {
        RawRow::Positional(cells) => normalize_positional(cells),
        RawRow::Keyed(fields) => normalize_keyed(fields),
    }
}

/// Positional layout: ID, type, location, related-location, severity-code,
/// status blob. Short rows pad with empty cells.
fn normalize_positional(cells: &[String]) -> CanonicalRecord {
    let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");

    let (type_code, type_details) = match TYPE_CODE.captures(cell(1)) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (String::new(), String::new()),
    };

    let severity_code = cell(4).to_string();
    let (clinical, general) = classify_harm(&severity_code);
    let blob = cell(5);
    let date_for = |label: &str| extract_labeled_date(label, blob);

    CanonicalRecord {
        incident_id: cell(0).to_string(),
        incident_type_code: type_code,
        incident_type_details: type_details,
        location: cell(2).to_string(),
        related_location: cell(3).to_string(),
        severity_code,
        harm_level_clinical: clinical.to_string(),
        harm_level_general: general.to_string(),
        incident_date: date_for(DATE_LABELS[0].1),
        discovery_date: date_for(DATE_LABELS[1].1),
        report_date: date_for(DATE_LABELS[2].1),
        confirmation_date: date_for(DATE_LABELS[3].1),
        notification_date: date_for(DATE_LABELS[4].1),
        status_date: date_for(DATE_LABELS[5].1),
        resolution_date: date_for(DATE_LABELS[6].1),
        status_info: blob.to_string(),
    }
}

/// Keyed layout: named fields straight off the paging endpoint.
fn normalize_keyed(fields: &BTreeMap<String, String>) -> CanonicalRecord {
    let get = |key: &str| fields.get(key).map(String::as_str).unwrap_or("");
    let date = |key: &str| parse_day_first(get(key));

    // The registry sends the severity code in RiskEffName despite the name
    // suggesting an effect/location type; classification follows it verbatim.
    let severity_code = get("RiskEffName").to_string();
    let (clinical, general) = classify_harm(&severity_code);

    CanonicalRecord {
        incident_id: get("Code").to_string(),
        incident_type_code: String::new(),
        incident_type_details: get("RiskName").to_string(),
        location: get("MainReferName").to_string(),
        related_location: get("CoEditorName").to_string(),
        severity_code,
        harm_level_clinical: clinical.to_string(),
        harm_level_general: general.to_string(),
        incident_date: date("RiskEffDate"),
        discovery_date: date("RiskDetectDate"),
        report_date: date("ReportDate"),
        confirmation_date: date("LoginConfirmDate"),
        notification_date: date("ConfirmDate"),
        status_date: date("StatusDate"),
        resolution_date: date("FinishDate_Edit"),
        status_info: synthesize_status_info(fields),
    }
}

/// Rebuild the registry's status display string from the keyed fields, with
/// the same label-and-pipe template the list page renders.
fn synthesize_status_info(fields: &BTreeMap<String, String>) -> String {
    let get = |key: &str, default: &str| -> String {
        fields
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };

    [
        get("EditStatusName", ""),
        format!(
            "วันที่เกิดเหตุ : {} วันที่ค้นพบ : {}",
            get("RiskEffDate", "-"),
            get("RiskDetectDate", "-"),
        ),
        format!("วันที่บันทึกรายงาน : {}", get("ReportDate", "-")),
        format!(
            "วันที่ยืนยัน : {} วันที่แจ้งเหตุ : {}",
            get("LoginConfirmDate", "-"),
            get("ConfirmDate", "-"),
        ),
        format!("วันที่ของสถานะ : {}", get("StatusDate", "-")),
        format!(
            "วันที่กลุ่ม/หน่วยงานหลักแก้ไขเสร็จ : {}",
            get("FinishDate_Edit", "-"),
        ),
    ]
    .join(" | ")
}
