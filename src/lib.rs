//! The New Alkebulan backend core.
//!
//! ARCHITECTURE
//! ============
//! A single Axum server for the community/marketplace app: conversations and
//! real-time messaging with WebRTC signaling relay, marketplace checkout
//! against a hosted payment provider, role activation, OAuth hand-off, and a
//! CSP violation sink. Durable state lives in Postgres; payment and identity
//! flows are delegated to their hosted providers — this process never stores
//! card data and never retries a provider call.

pub mod card;
pub mod chat;
pub mod db;
pub mod error;
pub mod frame;
pub mod numerology;
pub mod payments;
pub mod routes;
pub mod services;
pub mod signaling;
pub mod state;
