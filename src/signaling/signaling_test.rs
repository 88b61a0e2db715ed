use super::*;
use crate::frame::Data;
use crate::state::test_helpers;
use tokio::time::{Duration, timeout};

#[test]
fn channel_name_is_prefix_plus_id() {
    let id = Uuid::new_v4();
    assert_eq!(channel_name(id), format!("webrtc-{id}"));
}

#[test]
fn channel_name_is_stable_across_calls() {
    let id = Uuid::new_v4();
    assert_eq!(channel_name(id), channel_name(id));
}

#[test]
fn distinct_ids_yield_distinct_names() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    assert_ne!(channel_name(a), channel_name(b));
}

#[test]
fn default_ice_servers_are_stun_urls() {
    assert!(!DEFAULT_ICE_SERVERS.is_empty());
    for url in DEFAULT_ICE_SERVERS {
        assert!(url.starts_with("stun:"), "unexpected ICE url: {url}");
    }
}

#[tokio::test]
async fn join_creates_channel_and_returns_name() {
    let state = test_helpers::test_app_state();
    let conversation_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    let (tx, _rx) = tokio::sync::mpsc::channel(4);

    let name = join_channel(&state, conversation_id, client_id, tx).await;
    assert_eq!(name, channel_name(conversation_id));

    let channels = state.channels.read().await;
    assert_eq!(channels.get(&conversation_id).map(|c| c.clients.len()), Some(1));
}

#[tokio::test]
async fn last_leave_evicts_channel() {
    let state = test_helpers::test_app_state();
    let conversation_id = Uuid::new_v4();
    let (a, _rx_a) = test_helpers::seed_channel_client(&state, conversation_id).await;
    let (b, _rx_b) = test_helpers::seed_channel_client(&state, conversation_id).await;

    leave_channel(&state, conversation_id, a).await;
    assert!(state.channels.read().await.contains_key(&conversation_id));

    leave_channel(&state, conversation_id, b).await;
    assert!(!state.channels.read().await.contains_key(&conversation_id));
}

#[tokio::test]
async fn leave_unknown_channel_is_noop() {
    let state = test_helpers::test_app_state();
    leave_channel(&state, Uuid::new_v4(), Uuid::new_v4()).await;
}

#[tokio::test]
async fn broadcast_excludes_sender() {
    let state = test_helpers::test_app_state();
    let conversation_id = Uuid::new_v4();
    let (sender, mut sender_rx) = test_helpers::seed_channel_client(&state, conversation_id).await;
    let (_peer, mut peer_rx) = test_helpers::seed_channel_client(&state, conversation_id).await;

    let frame = Frame::request("signal:offer", Data::new()).with_conversation_id(conversation_id);
    broadcast(&state, conversation_id, &frame, Some(sender)).await;

    let delivered = timeout(Duration::from_millis(200), peer_rx.recv())
        .await
        .expect("peer should receive broadcast")
        .expect("channel open");
    assert_eq!(delivered.syscall, "signal:offer");

    // Sender's own queue stays empty.
    assert!(sender_rx.try_recv().is_err());
}

#[tokio::test]
async fn broadcast_without_exclusion_reaches_all() {
    let state = test_helpers::test_app_state();
    let conversation_id = Uuid::new_v4();
    let (_a, mut rx_a) = test_helpers::seed_channel_client(&state, conversation_id).await;
    let (_b, mut rx_b) = test_helpers::seed_channel_client(&state, conversation_id).await;

    let frame = Frame::request("message:send", Data::new()).with_conversation_id(conversation_id);
    broadcast(&state, conversation_id, &frame, None).await;

    assert!(rx_a.try_recv().is_ok());
    assert!(rx_b.try_recv().is_ok());
}

#[tokio::test]
async fn broadcast_to_missing_channel_is_noop() {
    let state = test_helpers::test_app_state();
    let frame = Frame::request("signal:ice", Data::new());
    broadcast(&state, Uuid::new_v4(), &frame, None).await;
}
