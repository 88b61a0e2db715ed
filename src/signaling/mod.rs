//! Signaling channels — per-conversation broadcast for chat and WebRTC setup.
//!
//! DESIGN
//! ======
//! Each conversation maps to exactly one broadcast channel named
//! `webrtc-{conversationId}`. The name is a pure function of the conversation
//! id: distinct conversations never share a channel and the same conversation
//! always resolves to the same name — peers discover each other by this name,
//! so the format is wire-frozen.
//!
//! Deriving a name performs no I/O; a channel only carries traffic once a
//! client joins. Broadcasts are never re-delivered to the sender
//! (exclude-sender routing), matching WebRTC signaling semantics where a
//! peer must not answer its own offer.
//!
//! LIFECYCLE
//! =========
//! Channel state is created on first join and evicted when the last client
//! leaves (call end or socket teardown). There is no idle timeout; callers
//! own the release.

#[cfg(test)]
#[path = "signaling_test.rs"]
mod tests;

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::frame::Frame;
use crate::state::{AppState, ChannelState};

/// Prefix for every signaling channel name. Changing this breaks peer
/// discovery for all live conversations.
pub const CHANNEL_PREFIX: &str = "webrtc-";

/// Default STUN servers for NAT traversal. Callers may override entirely;
/// these are handed to clients in the `signal:join` acknowledgement so peer
/// connections work without extra configuration.
pub const DEFAULT_ICE_SERVERS: &[&str] = &[
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];

/// Derive the broadcast channel name for a conversation.
#[must_use]
pub fn channel_name(conversation_id: Uuid) -> String {
    format!("{CHANNEL_PREFIX}{conversation_id}")
}

// =============================================================================
// JOIN / LEAVE
// =============================================================================

/// Subscribe a client to a conversation's channel. Creates the channel state
/// on first join. Returns the channel name.
pub async fn join_channel(
    state: &AppState,
    conversation_id: Uuid,
    client_id: Uuid,
    tx: mpsc::Sender<Frame>,
) -> String {
    let mut channels = state.channels.write().await;
    let channel = channels
        .entry(conversation_id)
        .or_insert_with(|| ChannelState::new(conversation_id));
    channel.clients.insert(client_id, tx);
    info!(%conversation_id, %client_id, clients = channel.clients.len(), "client joined channel");
    channel.name.clone()
}

/// Unsubscribe a client. Evicts the channel state when the last client
/// leaves.
pub async fn leave_channel(state: &AppState, conversation_id: Uuid, client_id: Uuid) {
    let mut channels = state.channels.write().await;
    let Some(channel) = channels.get_mut(&conversation_id) else {
        return;
    };
    channel.clients.remove(&client_id);
    info!(%conversation_id, %client_id, remaining = channel.clients.len(), "client left channel");

    if channel.clients.is_empty() {
        channels.remove(&conversation_id);
        info!(%conversation_id, "evicted channel");
    }
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Broadcast a frame to all clients on a conversation's channel, optionally
/// excluding one (the sender, for self-echo suppression).
pub async fn broadcast(state: &AppState, conversation_id: Uuid, frame: &Frame, exclude: Option<Uuid>) {
    let channels = state.channels.read().await;
    let Some(channel) = channels.get(&conversation_id) else {
        return;
    };

    for (client_id, tx) in &channel.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: if a client's queue is full, skip it.
        let _ = tx.try_send(frame.clone());
    }
}
