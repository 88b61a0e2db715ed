//! Chat session state machine — conversation selection and sidebar.
//!
//! DESIGN
//! ======
//! One session per websocket connection. Selection and the mobile-sidebar
//! flag live in a single struct with private fields, so "selecting a
//! conversation closes the sidebar" is one transition, not two independent
//! flag writes. State is session-transient: it dies with the connection and
//! is never persisted.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use uuid::Uuid;

/// Which conversation the chat pane is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// No conversation open; the chat pane shows a placeholder.
    #[default]
    None,
    /// A single active conversation.
    Selected(Uuid),
}

impl Selection {
    #[must_use]
    pub fn conversation_id(self) -> Option<Uuid> {
        match self {
            Self::None => None,
            Self::Selected(id) => Some(id),
        }
    }
}

/// Session-transient UI state for one connected chat client.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    selection: Selection,
    sidebar_open: bool,
}

impl ChatSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a conversation. Valid from any state; closes an open mobile
    /// sidebar as part of the same transition.
    pub fn select(&mut self, conversation_id: Uuid) {
        self.selection = Selection::Selected(conversation_id);
        self.sidebar_open = false;
    }

    /// Drop the active selection. The sidebar flag is untouched.
    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Open the mobile sidebar overlay. Orthogonal to selection.
    pub fn open_sidebar(&mut self) {
        self.sidebar_open = true;
    }

    /// Close the mobile sidebar overlay. Orthogonal to selection.
    pub fn close_sidebar(&mut self) {
        self.sidebar_open = false;
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The active conversation id, if any.
    #[must_use]
    pub fn selected(&self) -> Option<Uuid> {
        self.selection.conversation_id()
    }

    #[must_use]
    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }
}
