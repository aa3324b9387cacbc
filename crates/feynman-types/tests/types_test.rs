use feynman_types::{Conversation, Message, MessageKind, StreamEvent, ThreadHistory, normalize_history};

#[test]
fn test_conversation_roundtrip_keeps_messages() {
    let mut conv = Conversation::with_id("7", "Optics");
    conv.push_message(Message::user("why is the sky blue?", Vec::new()));
    conv.push_message(Message::bot("Rayleigh scattering."));

    let json = serde_json::to_string(&conv).unwrap();
    let back: Conversation = serde_json::from_str(&json).unwrap();

    assert_eq!(back.id, "7");
    assert_eq!(back.messages.len(), 2);
    assert_eq!(back.messages[1].kind, MessageKind::Bot);
}

#[test]
fn test_history_body_deserialization() {
    let body = r#"{"messages":[{"type":"human","content":"hi"},{"type":"ai","content":"hello"}]}"#;
    let history: ThreadHistory = serde_json::from_str(body).unwrap();
    let messages = normalize_history(&history.messages);

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "hi");
    assert_eq!(messages[1].content, "hello");
}

#[test]
fn test_history_body_without_messages() {
    let history: ThreadHistory = serde_json::from_str("{}").unwrap();
    assert!(history.messages.is_empty());
}

#[test]
fn test_stream_event_deserialization_content() {
    let event: StreamEvent = serde_json::from_str(r#"{"kind":"content","delta":""}"#).unwrap();
    assert_eq!(event, StreamEvent::content(""));
}
