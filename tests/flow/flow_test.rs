//! Tests for flow loading, validation, and prompt rendering.

use std::collections::BTreeMap;
use std::io::Write;

use sifter::flow::{FaqEntry, Flow, FlowError, FlowStep};

fn step(id: &str, match_tokens: Option<&str>, prompt: &str) -> FlowStep {
    FlowStep {
        id: id.to_owned(),
        match_tokens: match_tokens.map(str::to_owned),
        prompt: prompt.to_owned(),
    }
}

#[test]
fn default_screening_has_seven_steps() {
    let flow = Flow::default_screening();
    assert_eq!(flow.len(), 7);
    assert_eq!(flow.step(0).expect("gate step").id, "interest");
    assert_eq!(flow.step(6).expect("last step").id, "cv");
}

#[test]
fn empty_flow_is_rejected() {
    let result = Flow::new(Vec::new(), Vec::new());
    assert!(matches!(result, Err(FlowError::Empty)));
}

#[test]
fn duplicate_step_ids_are_rejected() {
    let result = Flow::new(
        vec![step("a", None, "one"), step("a", None, "two")],
        Vec::new(),
    );
    assert!(matches!(result, Err(FlowError::DuplicateStep(id)) if id == "a"));
}

#[test]
fn gate_on_a_later_step_is_rejected() {
    let result = Flow::new(
        vec![step("a", None, "one"), step("b", Some("yes"), "two")],
        Vec::new(),
    );
    assert!(matches!(result, Err(FlowError::UnexpectedGate(id)) if id == "b"));
}

#[test]
fn loads_flow_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"
[[step]]
id = "interest"
match = "yes|ok"
prompt = ""

[[step]]
id = "city"
prompt = "Which city are you based in?"

[[faq]]
key = "salary"
response = "Salary is discussed after screening."
"#
    )
    .expect("write flow toml");

    let flow = Flow::load(file.path()).expect("flow should load");
    assert_eq!(flow.len(), 2);
    assert!(flow.gate_matches("ok"));
    assert!(flow.detect_faq("what is the SALARY?").is_some());
}

#[test]
fn missing_flow_file_is_an_io_error() {
    let result = Flow::load(std::path::Path::new("/nonexistent/flow.toml"));
    assert!(matches!(result, Err(FlowError::Io(_))));
}

#[test]
fn prompt_fills_answer_placeholders() {
    let flow = Flow::new(
        vec![
            step("interest", Some("yes"), ""),
            step("company", None, "Which company?"),
            step("role", None, "What do you do at {company}?"),
        ],
        Vec::new(),
    )
    .expect("valid flow");

    let mut answers = BTreeMap::new();
    answers.insert("company".to_owned(), "Acme".to_owned());

    assert_eq!(
        flow.prompt(2, &answers).expect("prompt exists"),
        "What do you do at Acme?"
    );
}

#[test]
fn prompt_out_of_range_is_none() {
    let flow = Flow::default_screening();
    assert!(flow.prompt(99, &BTreeMap::new()).is_none());
}

#[test]
fn faq_matches_substring_case_insensitively() {
    let flow = Flow::new(
        vec![step("interest", Some("yes"), "")],
        vec![FaqEntry {
            key: "location".to_owned(),
            response: "The role is remote.".to_owned(),
        }],
    )
    .expect("valid flow");

    let faq = flow.detect_faq("What is the LOCATION of this job?");
    assert_eq!(faq.expect("faq hit").response, "The role is remote.");
    assert!(flow.detect_faq("no questions").is_none());
}
