//! Harm-level classification from the registry's single-character severity code.
//!
//! The registry encodes severity on two axes with one code: letters `A`–`I`
//! are the clinical tiers (`I` is death), digits `1`–`5` are the general risk
//! tiers. Exactly one axis is populated per known code. Downstream consumers
//! match on these exact strings, so the label text is fixed.

/// Map a severity code to its `(clinical, general)` harm labels.
///
/// Unknown codes are not an error — both labels come back empty, matching
/// how the registry itself renders them. Input is trimmed first.
pub fn classify_harm(code: &str) -> (&'static str, &'static str) {
    match code.trim() {
        "A" | "B" => ("ไม่เกิดความรุนแรง (No Harm)", ""),
        "C" | "D" => ("เกิดความรุนแรงน้อย (Low Harm)", ""),
        "E" | "F" => ("เกิดความรุนแรงปานกลาง (Moderate Harm)", ""),
        "G" | "H" => ("เกิดความรุนแรงมาก (Severe Harm)", ""),
        "I" => ("เสียชีวิต (Death)", ""),
        "1" => ("", "น้อยมาก"),
        "2" => ("", "น้อย"),
        "3" => ("", "ปานกลาง"),
        "4" => ("", "สูง"),
        "5" => ("", "สูงมาก"),
        _ => ("", ""),
    }
}
