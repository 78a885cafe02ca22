//! Networking modules for the Slotbook REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` sends requests and handles token refresh, `resources` and `public`
//! wrap the provider and customer endpoints, `chat` wraps the assistant, and
//! `types` defines the shared wire schema.

pub mod api;
pub mod chat;
pub mod endpoints;
pub mod error;
pub mod public;
pub(crate) mod refresh;
pub mod request;
pub mod resources;
pub mod types;
