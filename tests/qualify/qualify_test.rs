//! Tests for the qualification engine.

use std::collections::BTreeMap;

use sifter::qualify::{parse_leading_number, qualify, Thresholds};

fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn parses_integer_and_decimal_tokens() {
    assert_eq!(parse_leading_number("3 years"), Some(3.0));
    assert_eq!(parse_leading_number("around 3.5 years"), Some(3.5));
    assert_eq!(parse_leading_number("7 LPA fixed"), Some(7.0));
    assert_eq!(parse_leading_number("CTC is 12.75"), Some(12.75));
}

#[test]
fn no_number_means_none() {
    assert_eq!(parse_leading_number("fresher"), None);
    assert_eq!(parse_leading_number(""), None);
    assert_eq!(parse_leading_number("negotiable"), None);
}

#[test]
fn first_number_wins() {
    assert_eq!(parse_leading_number("2 to 3 years"), Some(2.0));
}

#[test]
fn qualifies_above_both_thresholds() {
    let record = qualify(
        &answers(&[
            ("company", "Acme"),
            ("experience", "3 years"),
            ("ctc", "7 LPA"),
            ("notice", "30 days"),
            ("product", "CRM"),
        ]),
        &Thresholds::default(),
    );

    assert!(record.qualified);
    assert_eq!(record.company, "Acme");
    assert_eq!(record.experience, Some(3.0));
    assert_eq!(record.ctc, Some(7.0));
    assert_eq!(record.notice, Some(30.0));
    assert_eq!(record.product, "CRM");
}

#[test]
fn exact_threshold_values_qualify() {
    let thresholds = Thresholds::default();
    let record = qualify(
        &answers(&[("experience", "2"), ("ctc", "5")]),
        &thresholds,
    );
    assert!(record.qualified);
}

#[test]
fn below_experience_threshold_disqualifies() {
    let record = qualify(
        &answers(&[("experience", "1 year"), ("ctc", "8 LPA")]),
        &Thresholds::default(),
    );
    assert!(!record.qualified);
}

#[test]
fn below_ctc_threshold_disqualifies() {
    let record = qualify(
        &answers(&[("experience", "5 years"), ("ctc", "3.5")]),
        &Thresholds::default(),
    );
    assert!(!record.qualified);
}

#[test]
fn unparsable_numeric_answer_fails_its_check() {
    let record = qualify(
        &answers(&[("experience", "fresher"), ("ctc", "10 LPA")]),
        &Thresholds::default(),
    );
    assert_eq!(record.experience, None);
    assert!(!record.qualified);
}

#[test]
fn notice_period_is_recorded_but_not_gating() {
    // Notice far above the threshold; still qualified.
    let record = qualify(
        &answers(&[
            ("experience", "4"),
            ("ctc", "9"),
            ("notice", "90 days"),
        ]),
        &Thresholds::default(),
    );
    assert_eq!(record.notice, Some(90.0));
    assert!(record.qualified);
}

#[test]
fn missing_answers_produce_empty_fields() {
    let record = qualify(&BTreeMap::new(), &Thresholds::default());
    assert_eq!(record.company, "");
    assert_eq!(record.product, "");
    assert_eq!(record.experience, None);
    assert!(!record.qualified);
}

#[test]
fn same_input_same_record() {
    let a = answers(&[("experience", "3"), ("ctc", "6")]);
    let thresholds = Thresholds::default();
    assert_eq!(qualify(&a, &thresholds), qualify(&a, &thresholds));
}

#[test]
fn summary_lists_every_field() {
    let record = qualify(
        &answers(&[
            ("company", "Acme"),
            ("experience", "3"),
            ("ctc", "7"),
            ("product", "CRM"),
        ]),
        &Thresholds::default(),
    );
    let summary = record.summary();
    assert!(summary.contains("company: Acme"));
    assert!(summary.contains("experience: 3"));
    assert!(summary.contains("ctc: 7"));
    assert!(summary.contains("notice: ?"));
    assert!(summary.contains("product: CRM"));
    assert!(summary.contains("qualified: yes"));
}

#[test]
fn custom_thresholds_shift_the_cutoff() {
    let thresholds = Thresholds {
        experience_years: 5.0,
        ctc_lpa: 10.0,
        notice_days: 30.0,
    };
    let record = qualify(&answers(&[("experience", "4"), ("ctc", "12")]), &thresholds);
    assert!(!record.qualified);
}
