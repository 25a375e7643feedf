use super::*;
use crate::history::Role;

#[test]
fn parse_delta_line() {
    let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;

    assert_eq!(
        parse_stream_line(line),
        Some(StreamEvent::Delta("Hello".to_string()))
    );
}

#[test]
fn parse_done_marker() {
    assert_eq!(parse_stream_line("data: [DONE]"), Some(StreamEvent::Done));
}

#[test]
fn parse_skips_blank_and_comment_lines() {
    assert_eq!(parse_stream_line(""), None);
    assert_eq!(parse_stream_line(": keep-alive"), None);
}

#[test]
fn parse_skips_empty_delta() {
    // Role-only frames at stream start carry no content.
    let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
    assert_eq!(parse_stream_line(line), None);

    let empty = r#"data: {"choices":[{"delta":{"content":""}}]}"#;
    assert_eq!(parse_stream_line(empty), None);
}

#[test]
fn parse_skips_malformed_payload() {
    assert_eq!(parse_stream_line("data: {not json"), None);
}

#[test]
fn chat_request_serializes_to_openai_shape() {
    let messages = vec![
        Message::new(Role::System, "be helpful"),
        Message::new(Role::User, "hi"),
    ];
    let request = ChatRequest {
        model: "anthropic/claude-3-haiku",
        messages: &messages,
        stream: true,
    };

    let json = serde_json::to_value(&request).expect("serialize");

    assert_eq!(json["model"], "anthropic/claude-3-haiku");
    assert_eq!(json["stream"], true);
    assert_eq!(json["messages"][0]["role"], "system");
    assert_eq!(json["messages"][1]["content"], "hi");
}

#[test]
fn embeddings_response_rows_reorder_by_index() {
    let body = r#"{"data":[
        {"index":1,"embedding":[0.5,0.5]},
        {"index":0,"embedding":[1.0,0.0]}
    ]}"#;

    let mut response: EmbeddingsResponse = serde_json::from_str(body).expect("parse");
    response.data.sort_by_key(|row| row.index);

    assert_eq!(response.data[0].embedding, vec![1.0, 0.0]);
    assert_eq!(response.data[1].embedding, vec![0.5, 0.5]);
}

#[test]
fn chat_response_extracts_first_choice() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi there"}}]}"#;

    let response: ChatResponse = serde_json::from_str(body).expect("parse");

    assert_eq!(response.choices[0].message.content, "hi there");
}
