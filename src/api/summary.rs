//! Aggregation of canonical records into the summary payload.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::records::CanonicalRecord;

/// Severity bucket for records whose code is empty.
const UNKNOWN_SEVERITY: &str = "UNKNOWN";

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryPayload {
    pub schema_version: u32,
    pub updated_at: String,
    pub stale: bool,
    pub counts: Counts,
    pub by_severity: Vec<SeverityCount>,
    pub by_unit: Vec<UnitCount>,
    pub timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Counts {
    pub today: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCount {
    pub severity: String,
    pub n: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitCount {
    pub unit: String,
    pub n: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub n: usize,
}

/// Aggregate records against a reference date (the caller passes today's
/// UTC date; tests pass a fixed one).
pub fn aggregate(records: &[CanonicalRecord], today: NaiveDate) -> SummaryPayload {
    let counts_today = records
        .iter()
        .filter(|r| r.report_date == Some(today))
        .count();

    let mut by_severity: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_unit: BTreeMap<String, usize> = BTreeMap::new();
    let mut timeline: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for record in records {
        let severity = if record.severity_code.is_empty() {
            UNKNOWN_SEVERITY.to_string()
        } else {
            record.severity_code.clone()
        };
        *by_severity.entry(severity).or_default() += 1;

        if !record.location.is_empty() {
            *by_unit.entry(record.location.clone()).or_default() += 1;
        }

        if let Some(date) = record.report_date {
            *timeline.entry(date).or_default() += 1;
        }
    }

    SummaryPayload {
        schema_version: 1,
        updated_at: chrono::Utc::now().to_rfc3339(),
        stale: false,
        counts: Counts {
            today: counts_today,
        },
        by_severity: by_severity
            .into_iter()
            .map(|(severity, n)| SeverityCount { severity, n })
            .collect(),
        by_unit: by_unit
            .into_iter()
            .map(|(unit, n)| UnitCount { unit, n })
            .collect(),
        timeline: timeline
            .into_iter()
            .map(|(date, n)| TimelinePoint { date, n })
            .collect(),
    }
}
