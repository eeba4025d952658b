//! Qualification engine: collected answers → qualified/not-qualified record.
//!
//! Pure functions only. Free-text numeric fields are parsed with lenient
//! extraction (first numeric token in the string); an unparsable field fails
//! its threshold instead of raising an error.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Flow step ids the engine reads numeric answers from.
const STEP_EXPERIENCE: &str = "experience";
const STEP_CTC: &str = "ctc";
const STEP_NOTICE: &str = "notice";
const STEP_COMPANY: &str = "company";
const STEP_PRODUCT: &str = "product";

/// Numeric thresholds a candidate is scored against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum years of product experience.
    pub experience_years: f64,
    /// Minimum current CTC in lakhs per annum.
    pub ctc_lpa: f64,
    /// Maximum notice period in days. Recorded for the admin but not
    /// gating under the default predicate.
    pub notice_days: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            experience_years: 2.0,
            ctc_lpa: 5.0,
            notice_days: 30.0,
        }
    }
}

/// Normalized screening outcome derived from a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationRecord {
    /// Current employer, verbatim.
    pub company: String,
    /// Parsed years of experience, if the answer contained a number.
    pub experience: Option<f64>,
    /// Parsed current CTC, if the answer contained a number.
    pub ctc: Option<f64>,
    /// Parsed notice period, if the answer contained a number.
    pub notice: Option<f64>,
    /// Product the candidate currently handles, verbatim.
    pub product: String,
    /// Whether the candidate clears the configured thresholds.
    pub qualified: bool,
}

/// Extract the first numeric token from a free-text answer.
///
/// `"around 3.5 years"` → `Some(3.5)`; `"fresher"` → `None`.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = NUMBER
        .get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("numeric token pattern is valid"));
    re.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Score collected answers against the thresholds.
///
/// Deterministic: the same answers and thresholds always produce the same
/// record. An unparsable experience or CTC answer fails its threshold check
/// (`qualified = false`) rather than erroring.
pub fn qualify(answers: &BTreeMap<String, String>, thresholds: &Thresholds) -> QualificationRecord {
    let text = |step: &str| answers.get(step).cloned().unwrap_or_default();
    let number = |step: &str| answers.get(step).and_then(|a| parse_leading_number(a));

    let experience = number(STEP_EXPERIENCE);
    let ctc = number(STEP_CTC);
    let notice = number(STEP_NOTICE);

    let qualified = experience.is_some_and(|e| e >= thresholds.experience_years)
        && ctc.is_some_and(|c| c >= thresholds.ctc_lpa);

    QualificationRecord {
        company: text(STEP_COMPANY),
        experience,
        ctc,
        notice,
        product: text(STEP_PRODUCT),
        qualified,
    }
}

impl QualificationRecord {
    /// Human-readable field summary for the admin escalation message.
    pub fn summary(&self) -> String {
        let fmt = |v: Option<f64>| match v {
            Some(n) => format!("{n}"),
            None => "?".to_string(),
        };
        format!(
            "company: {}\nexperience: {}\nctc: {}\nnotice: {}\nproduct: {}\nqualified: {}",
            self.company,
            fmt(self.experience),
            fmt(self.ctc),
            fmt(self.notice),
            self.product,
            if self.qualified { "yes" } else { "no" },
        )
    }
}
