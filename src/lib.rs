//! wagate - multi-tenant HTTP gateway for WhatsApp Web automation sessions.
//!
//! Each session maps to one live connection to a sidecar automation engine,
//! attached to persistent credential state. The gateway exposes REST
//! endpoints for session lifecycle, messaging, chats, groups and contacts;
//! the engine owns everything protocol-shaped.

// The OpenAPI document is one large json! literal.
#![recursion_limit = "256"]

pub mod api;
pub mod auth;
pub mod client;
pub mod db;
pub mod qr;
pub mod session;
pub mod store;
pub mod user;
pub mod webhook;
