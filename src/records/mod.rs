//! Data model for incident-report records.
//!
//! The paging endpoint returns rows in one of two physical shapes — keyed
//! (named fields) or positional (ordered text cells). Both normalize into
//! one [`CanonicalRecord`] with a fixed 16-column schema; the export, the
//! summary API and every test downstream are shape-independent.

pub mod dates;
pub mod harm;
pub mod normalize;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One record as returned by the paging endpoint, before normalization.
///
/// No uniqueness is enforced by the source; duplicate rows across paging
/// windows are possible and deliberately not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRow {
    /// Mapping from endpoint column name to cell text.
    Keyed(BTreeMap<String, String>),
    /// Ordered text cells (the table-scrape shape).
    Positional(Vec<String>),
}

impl RawRow {
    /// Build a keyed row from `(name, value)` pairs. Test/fixture helper.
    pub fn keyed<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RawRow::Keyed(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The normalized output schema. Field order here is the export column order.
///
/// Date fields are either a valid calendar date or `None` (an empty cell in
/// the export) — never raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(rename = "Incident_ID")]
    pub incident_id: String,
    #[serde(rename = "Incident_Type_Code")]
    pub incident_type_code: String,
    #[serde(rename = "Incident_Type_Details")]
    pub incident_type_details: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Related_Location")]
    pub related_location: String,
    #[serde(rename = "Severity_Code")]
    pub severity_code: String,
    #[serde(rename = "Harm_Level_Clinical")]
    pub harm_level_clinical: String,
    #[serde(rename = "Harm_Level_General")]
    pub harm_level_general: String,
    #[serde(rename = "Incident_Date")]
    pub incident_date: Option<NaiveDate>,
    #[serde(rename = "Discovery_Date")]
    pub discovery_date: Option<NaiveDate>,
    #[serde(rename = "Report_Date")]
    pub report_date: Option<NaiveDate>,
    #[serde(rename = "Confirmation_Date")]
    pub confirmation_date: Option<NaiveDate>,
    #[serde(rename = "Notification_Date")]
    pub notification_date: Option<NaiveDate>,
    #[serde(rename = "Status_Date")]
    pub status_date: Option<NaiveDate>,
    #[serde(rename = "Resolution_Date")]
    pub resolution_date: Option<NaiveDate>,
    #[serde(rename = "Status_Info")]
    pub status_info: String,
}

/// Export column order, for header assertions and the CSV reader.
pub const EXPORT_COLUMNS: &[&str] = &[
    "Incident_ID",
    "Incident_Type_Code",
    "Incident_Type_Details",
    "Location",
    "Related_Location",
    "Severity_Code",
    "Harm_Level_Clinical",
    "Harm_Level_General",
    "Incident_Date",
    "Discovery_Date",
    "Report_Date",
    "Confirmation_Date",
    "Notification_Date",
    "Status_Date",
    "Resolution_Date",
    "Status_Info",
];
