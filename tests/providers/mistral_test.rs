//! Tests for the Mistral wire format.

use sifter::providers::mistral::{build_request, parse_response, MistralProvider};
use sifter::providers::{ChatTurn, CompletionProvider, CompletionRequest, ProviderError, Role};

fn request() -> CompletionRequest {
    CompletionRequest {
        system: "You are a recruiting assistant.".to_owned(),
        history: vec![
            ChatTurn {
                role: Role::User,
                text: "hi".to_owned(),
            },
            ChatTurn {
                role: Role::Assistant,
                text: "hello!".to_owned(),
            },
        ],
        user: "what is the role?".to_owned(),
    }
}

#[test]
fn request_puts_system_first_and_user_last() {
    let api_request = build_request("mistral-small-latest", &request());

    assert_eq!(api_request.model, "mistral-small-latest");
    assert_eq!(api_request.messages.len(), 4);
    assert_eq!(api_request.messages[0].role, "system");
    assert_eq!(api_request.messages[1].role, "user");
    assert_eq!(api_request.messages[1].content, "hi");
    assert_eq!(api_request.messages[2].role, "assistant");
    assert_eq!(api_request.messages[3].role, "user");
    assert_eq!(api_request.messages[3].content, "what is the role?");
    assert!((api_request.temperature - 0.5).abs() < f64::EPSILON);
}

#[test]
fn request_serializes_to_the_expected_shape() {
    let api_request = build_request("mistral-small-latest", &request());
    let json = serde_json::to_value(&api_request).expect("serialize");

    assert_eq!(json["model"], "mistral-small-latest");
    assert_eq!(json["messages"][0]["role"], "system");
    assert!(json["temperature"].is_number());
}

#[test]
fn parses_the_first_choice() {
    let body = r#"{
        "choices": [
            {"message": {"role": "assistant", "content": "The role is remote."}},
            {"message": {"role": "assistant", "content": "ignored"}}
        ]
    }"#;
    let reply = parse_response(body).expect("parse ok");
    assert_eq!(reply, "The role is remote.");
}

#[test]
fn empty_choices_is_a_parse_error() {
    let result = parse_response(r#"{"choices": []}"#);
    assert!(matches!(result, Err(ProviderError::Parse(_))));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let result = parse_response("not json");
    assert!(matches!(result, Err(ProviderError::Parse(_))));
}

#[test]
fn debug_output_redacts_the_api_key() {
    let provider = MistralProvider::new("sk-secret".to_owned(), "mistral-small-latest".to_owned());
    let debug = format!("{provider:?}");
    assert!(!debug.contains("sk-secret"));
    assert_eq!(provider.model_id(), "mistral-small-latest");
}
