use super::*;
use crate::state::test_helpers;
use tokio::time::{Duration, timeout};

fn message_row(conversation_id: Uuid) -> MessageRow {
    MessageRow {
        id: Uuid::new_v4(),
        conversation_id,
        sender_id: Uuid::new_v4(),
        sender_name: "ama".into(),
        sender_avatar_url: None,
        content: "hello".into(),
        message_type: "text".into(),
        read: false,
        created_at: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(1_700_000_000),
    }
}

#[test]
fn ms_converts_to_unix_milliseconds() {
    let t = OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(2);
    assert_eq!(ms(t), 2000);
    assert_eq!(ms(OffsetDateTime::UNIX_EPOCH), 0);
}

#[test]
fn message_response_serializes_flat_shape() {
    let row = message_row(Uuid::new_v4());
    let value = serde_json::to_value(message_to_response(row)).unwrap();
    assert_eq!(value.get("content").and_then(|v| v.as_str()), Some("hello"));
    assert_eq!(value.get("message_type").and_then(|v| v.as_str()), Some("text"));
    assert_eq!(value.get("read").and_then(serde_json::Value::as_bool), Some(false));
    assert_eq!(value.get("ts").and_then(serde_json::Value::as_i64), Some(1_700_000_000_000));
}

#[test]
fn message_to_data_flattens_fields() {
    let row = message_row(Uuid::new_v4());
    let data = message_to_data(&row);
    assert_eq!(data.get("content").and_then(|v| v.as_str()), Some("hello"));
    assert!(data.contains_key("sender_id"));
}

#[tokio::test]
async fn broadcast_new_message_reaches_channel_peers() {
    let state = test_helpers::test_app_state();
    let conversation_id = Uuid::new_v4();
    let (_client, mut rx) = test_helpers::seed_channel_client(&state, conversation_id).await;

    let row = message_row(conversation_id);
    broadcast_new_message(&state, &row, None).await;

    let frame = timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("frame delivered")
        .expect("channel open");
    assert_eq!(frame.syscall, "message:new");
    assert_eq!(frame.conversation_id, Some(conversation_id));
    assert_eq!(frame.data.get("content").and_then(|v| v.as_str()), Some("hello"));
}

#[tokio::test]
async fn broadcast_new_message_respects_exclusion() {
    let state = test_helpers::test_app_state();
    let conversation_id = Uuid::new_v4();
    let (sender, mut sender_rx) = test_helpers::seed_channel_client(&state, conversation_id).await;

    let row = message_row(conversation_id);
    broadcast_new_message(&state, &row, Some(sender)).await;
    assert!(sender_rx.try_recv().is_err());
}

#[test]
fn send_body_requires_content() {
    let err = parse_send_body(&SendMessageBody { content: None, message_type: None }).unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = parse_send_body(&SendMessageBody { content: Some("   ".into()), message_type: None }).unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[test]
fn send_body_defaults_to_text() {
    let body = SendMessageBody { content: Some("hi".into()), message_type: None };
    let (content, message_type) =
        parse_send_body(&body).unwrap();
    assert_eq!(content, "hi");
    assert_eq!(message_type, MessageType::Text);
}

#[test]
fn send_body_accepts_known_types_only() {
    let (_, message_type) = parse_send_body(&SendMessageBody {
        content: Some("pic".into()),
        message_type: Some("image".into()),
    })
    .unwrap();
    assert_eq!(message_type, MessageType::Image);

    let err = parse_send_body(&SendMessageBody {
        content: Some("clip".into()),
        message_type: Some("video".into()),
    })
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[test]
fn open_body_deserializes_camel_case() {
    let body: OpenConversationBody = serde_json::from_str(r#"{"userId":"abc"}"#).unwrap();
    assert_eq!(body.user_id.as_deref(), Some("abc"));
}
