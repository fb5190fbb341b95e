//! Date extraction from the registry's free-text status blobs.
//!
//! Status blobs interleave bilingual `label : DD/MM/YYYY` fragments separated
//! by pipes and spaces, e.g.
//! `อยู่ระหว่างดำเนินการ | วันที่เกิดเหตุ : 05/03/2024 วันที่ค้นพบ : 06/03/2024 | …`.
//! Seven labels are known; their patterns are compiled once. Parsing is
//! strict `%d/%m/%Y` — a fragment like `31/13/2024` is treated as absent
//! rather than guessed at.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// The status-blob date labels, paired with the canonical field they feed.
/// Order matches the export schema's date columns.
pub const DATE_LABELS: &[(&str, &str)] = &[
    ("Incident_Date", "วันที่เกิดเหตุ"),
    ("Discovery_Date", "วันที่ค้นพบ"),
    ("Report_Date", "วันที่บันทึกรายงาน"),
    ("Confirmation_Date", "วันที่ยืนยัน"),
    ("Notification_Date", "วันที่แจ้งเหตุ"),
    ("Status_Date", "วันที่ของสถานะ"),
    ("Resolution_Date", "วันที่กลุ่ม/หน่วยงานหลักแก้ไขเสร็จ"),
];

/// Precompiled patterns for the known labels. Unknown labels fall back to an
/// on-the-fly compile in [`extract_labeled_date`].
static LABEL_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    DATE_LABELS
        .iter()
        .map(|(_, label)| (*label, labeled_date_pattern(label)))
        .collect()
});

fn labeled_date_pattern(label: &str) -> Regex {
    Regex::new(&format!(
        r"{}\s*:\s*(\d{{2}}/\d{{2}}/\d{{4}})",
        regex::escape(label)
    ))
    .expect("escaped label pattern is always valid")
}

/// Find the first `label : DD/MM/YYYY` fragment in `text` and parse the date.
///
/// The label must match exactly (whitespace around the colon is tolerated).
/// Returns `None` when the label is absent or the captured date is not a real
/// calendar date.
pub fn extract_labeled_date(label: &str, text: &str) -> Option<NaiveDate> {
    let owned;
    let pattern = match LABEL_PATTERNS.get(label) {
        Some(p) => p,
        None => {
            owned = labeled_date_pattern(label);
            &owned
        }
    };
    let captured = pattern.captures(text)?.get(1)?.as_str();
    NaiveDate::parse_from_str(captured, "%d/%m/%Y").ok()
}

/// Lenient day-first parse for the keyed row shape's named date fields.
///
/// The endpoint sends these as `DD/MM/YYYY`, sometimes with a trailing time
/// component and occasionally with `-` separators or as a bare `-`
/// placeholder. Anything unparseable is the missing marker.
pub fn parse_day_first(text: &str) -> Option<NaiveDate> {
    let token = text.trim().split_whitespace().next()?;
    if token == "-" {
        return None;
    }
    NaiveDate::parse_from_str(token, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(token, "%d-%m-%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_date_after_known_label() {
        let text = "วันที่เกิดเหตุ : 05/03/2024 | other : x";
        assert_eq!(
            extract_labeled_date("วันที่เกิดเหตุ", text),
            Some(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
    }

    #[test]
    fn missing_label_returns_none() {
        let text = "วันที่ค้นพบ : 05/03/2024";
        assert_eq!(extract_labeled_date("วันที่เกิดเหตุ", text), None);
    }

    #[test]
    fn malformed_date_returns_none() {
        let text = "วันที่เกิดเหตุ : 31/13/2024";
        assert_eq!(extract_labeled_date("วันที่เกิดเหตุ", text), None);
    }

    #[test]
    fn out_of_range_day_returns_none() {
        let text = "วันที่เกิดเหตุ : 31/04/2024";
        assert_eq!(extract_labeled_date("วันที่เกิดเหตุ", text), None);
    }

    #[test]
    fn whitespace_around_colon_is_tolerated() {
        assert!(extract_labeled_date("วันที่ยืนยัน", "วันที่ยืนยัน:01/01/2023").is_some());
        assert!(extract_labeled_date("วันที่ยืนยัน", "วันที่ยืนยัน   :   01/01/2023").is_some());
    }

    #[test]
    fn first_occurrence_wins() {
        let text = "วันที่ของสถานะ : 02/02/2022 | วันที่ของสถานะ : 03/03/2023";
        assert_eq!(
            extract_labeled_date("วันที่ของสถานะ", text),
            Some(NaiveDate::from_ymd_opt(2022, 2, 2).unwrap())
        );
    }

    #[test]
    fn slash_heavy_label_is_escaped_not_interpreted() {
        let label = "วันที่กลุ่ม/หน่วยงานหลักแก้ไขเสร็จ";
        let text = "วันที่กลุ่ม/หน่วยงานหลักแก้ไขเสร็จ : 10/10/2024";
        assert_eq!(
            extract_labeled_date(label, text),
            Some(NaiveDate::from_ymd_opt(2024, 10, 10).unwrap())
        );
    }

    #[test]
    fn unknown_label_still_extracts() {
        assert_eq!(
            extract_labeled_date("Closed", "Closed : 09/08/2021"),
            Some(NaiveDate::from_ymd_opt(2021, 8, 9).unwrap())
        );
    }

    #[test]
    fn seven_labels_are_known() {
        assert_eq!(DATE_LABELS.len(), 7);
        assert_eq!(LABEL_PATTERNS.len(), 7);
    }

    #[test]
    fn day_first_parses_plain_date() {
        assert_eq!(
            parse_day_first("05/03/2024"),
            Some(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
    }

    #[test]
    fn day_first_ignores_time_suffix() {
        assert_eq!(
            parse_day_first("05/03/2024 14:30"),
            Some(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
    }

    #[test]
    fn day_first_accepts_dash_separators() {
        assert_eq!(
            parse_day_first("05-03-2024"),
            Some(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
    }

    #[test]
    fn day_first_placeholder_and_garbage_are_missing() {
        assert_eq!(parse_day_first("-"), None);
        assert_eq!(parse_day_first(""), None);
        assert_eq!(parse_day_first("   "), None);
        assert_eq!(parse_day_first("not a date"), None);
        assert_eq!(parse_day_first("31/13/2024"), None);
    }
}
