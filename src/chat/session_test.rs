use super::*;

#[test]
fn starts_with_no_selection_and_closed_sidebar() {
    let session = ChatSession::new();
    assert_eq!(session.selection(), Selection::None);
    assert!(session.selected().is_none());
    assert!(!session.sidebar_open());
}

#[test]
fn select_from_no_selection() {
    let id = Uuid::new_v4();
    let mut session = ChatSession::new();
    session.select(id);
    assert_eq!(session.selection(), Selection::Selected(id));
    assert_eq!(session.selected(), Some(id));
}

#[test]
fn select_replaces_previous_selection() {
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let mut session = ChatSession::new();
    session.select(first);
    session.select(second);
    assert_eq!(session.selected(), Some(second));
}

#[test]
fn select_closes_open_sidebar_atomically() {
    let mut session = ChatSession::new();
    session.open_sidebar();
    assert!(session.sidebar_open());

    session.select(Uuid::new_v4());
    assert!(!session.sidebar_open());
    assert!(session.selected().is_some());
}

#[test]
fn sidebar_toggle_is_orthogonal_to_selection() {
    let id = Uuid::new_v4();
    let mut session = ChatSession::new();
    session.select(id);

    session.open_sidebar();
    assert!(session.sidebar_open());
    assert_eq!(session.selected(), Some(id));

    session.close_sidebar();
    assert!(!session.sidebar_open());
    assert_eq!(session.selected(), Some(id));
}

#[test]
fn clear_selection_keeps_sidebar_state() {
    let mut session = ChatSession::new();
    session.select(Uuid::new_v4());
    session.open_sidebar();
    session.clear_selection();
    assert_eq!(session.selection(), Selection::None);
    assert!(session.sidebar_open());
}

#[test]
fn selection_conversation_id_accessor() {
    let id = Uuid::new_v4();
    assert_eq!(Selection::Selected(id).conversation_id(), Some(id));
    assert_eq!(Selection::None.conversation_id(), None);
}
