//! Conversation flow definition: the ordered question script.
//!
//! A [`Flow`] is loaded once from TOML (or compiled-in defaults) and is
//! immutable at runtime. The first step is the *gate*: its match pattern is
//! a `|`-separated list of affirmative tokens interpreted as a yes/no
//! filter. Every later step captures the candidate's free-text answer
//! verbatim and asks the next prompt.

use std::collections::BTreeMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

/// Errors from flow loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// The flow file could not be read.
    #[error("failed to read flow file: {0}")]
    Io(#[from] std::io::Error),
    /// The flow file is not valid TOML.
    #[error("failed to parse flow TOML: {0}")]
    Parse(#[from] toml::de::Error),
    /// The flow has no steps.
    #[error("flow has no steps")]
    Empty,
    /// Two steps share the same id.
    #[error("duplicate step id: {0}")]
    DuplicateStep(String),
    /// A step other than the gate carries a match pattern.
    #[error("step {0} has a match pattern but only the first step may gate")]
    UnexpectedGate(String),
    /// The gate pattern could not be compiled.
    #[error("invalid gate pattern: {0}")]
    BadGatePattern(String),
}

/// One scripted question.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowStep {
    /// Unique step id; also the key the answer is stored under.
    pub id: String,
    /// Affirmative token list (`|`-separated), gate step only.
    #[serde(rename = "match")]
    pub match_tokens: Option<String>,
    /// Prompt sent when this step becomes current. May reference earlier
    /// answers as `{step_id}` placeholders.
    pub prompt: String,
}

/// A frequently-asked question answered out of band.
///
/// When an inbound message contains `key` (case-insensitively), the bot
/// replies with `response` followed by the current step's prompt and does
/// not advance the session.
#[derive(Debug, Clone, Deserialize)]
pub struct FaqEntry {
    /// Substring that triggers this FAQ.
    pub key: String,
    /// Canned response text.
    pub response: String,
}

/// TOML shape of a flow file.
#[derive(Debug, Deserialize)]
struct FlowFile {
    #[serde(rename = "step")]
    steps: Vec<FlowStep>,
    #[serde(rename = "faq", default)]
    faqs: Vec<FaqEntry>,
}

/// The immutable question script plus its compiled gate matcher.
#[derive(Debug)]
pub struct Flow {
    steps: Vec<FlowStep>,
    faqs: Vec<FaqEntry>,
    gate: Option<Regex>,
}

impl Flow {
    /// Build a flow from parts, validating the script invariants.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError`] if the flow is empty, a step id repeats, a
    /// non-gate step carries a match pattern, or the gate pattern cannot
    /// be compiled.
    pub fn new(steps: Vec<FlowStep>, faqs: Vec<FaqEntry>) -> Result<Self, FlowError> {
        if steps.is_empty() {
            return Err(FlowError::Empty);
        }

        let mut seen = std::collections::HashSet::new();
        for step in &steps {
            if !seen.insert(step.id.clone()) {
                return Err(FlowError::DuplicateStep(step.id.clone()));
            }
        }
        for step in steps.iter().skip(1) {
            if step.match_tokens.is_some() {
                return Err(FlowError::UnexpectedGate(step.id.clone()));
            }
        }

        let gate = match steps.first().and_then(|s| s.match_tokens.as_deref()) {
            Some(tokens) => Some(compile_gate(tokens)?),
            None => None,
        };

        Ok(Self { steps, faqs, gate })
    }

    /// Load a flow from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError`] on read, parse, or validation failure.
    pub fn load(path: &Path) -> Result<Self, FlowError> {
        let contents = std::fs::read_to_string(path)?;
        let file: FlowFile = toml::from_str(&contents)?;
        Self::new(file.steps, file.faqs)
    }

    /// The compiled-in default screening script.
    pub fn default_screening() -> Self {
        let steps = vec![
            step("interest", Some("yes|ya|sure|interested|haan|haanji|ok|haa"), ""),
            step("company", None, "Currently in which company are you working?"),
            step("notice", None, "Ok and your notice period?"),
            step("ctc", None, "Ok, What's your current CTC?"),
            step("product", None, "Ok, Which product are you currently handling?"),
            step("experience", None, "How many years of experience in this product?"),
            step("cv", None, "Kindly forward me your CV."),
        ];
        // The built-in script satisfies every validation invariant.
        Self::new(steps, Vec::new()).expect("default flow is valid")
    }

    /// Number of steps in the script.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the script is empty. Always false for a validated flow.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step at `index`, if within the script.
    pub fn step(&self, index: usize) -> Option<&FlowStep> {
        self.steps.get(index)
    }

    /// Whether `text` clears the gate step's affirmative filter.
    ///
    /// Tokens match case-insensitively on word boundaries, so "Yes please"
    /// clears a `yes|...` gate but "years" does not clear `ya`. A flow
    /// without a gate pattern accepts anything.
    pub fn gate_matches(&self, text: &str) -> bool {
        match &self.gate {
            Some(re) => re.is_match(text),
            None => true,
        }
    }

    /// Render the prompt for the step at `index`, filling `{step_id}`
    /// placeholders from the collected answers.
    pub fn prompt(&self, index: usize, answers: &BTreeMap<String, String>) -> Option<String> {
        let template = &self.step(index)?.prompt;
        let mut rendered = template.clone();
        for (id, answer) in answers {
            let placeholder = format!("{{{id}}}");
            if rendered.contains(&placeholder) {
                rendered = rendered.replace(&placeholder, answer);
            }
        }
        Some(rendered)
    }

    /// Find the FAQ triggered by `text`, if any.
    ///
    /// First entry whose key appears in the lowercased message wins.
    pub fn detect_faq(&self, text: &str) -> Option<&FaqEntry> {
        let lowered = text.to_lowercase();
        self.faqs
            .iter()
            .find(|f| lowered.contains(&f.key.to_lowercase()))
    }
}

fn step(id: &str, match_tokens: Option<&str>, prompt: &str) -> FlowStep {
    FlowStep {
        id: id.to_string(),
        match_tokens: match_tokens.map(str::to_string),
        prompt: prompt.to_string(),
    }
}

/// Compile a `|`-separated affirmative token list into a word-boundary,
/// case-insensitive matcher. Tokens are escaped, never raw regex.
fn compile_gate(tokens: &str) -> Result<Regex, FlowError> {
    let escaped: Vec<String> = tokens
        .split('|')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return Err(FlowError::BadGatePattern(tokens.to_string()));
    }
    let pattern = format!(r"\b(?:{})\b", escaped.join("|"));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| FlowError::BadGatePattern(e.to_string()))
}
