//! Per-connection chat UI session state.

pub mod session;

pub use session::{ChatSession, Selection};
