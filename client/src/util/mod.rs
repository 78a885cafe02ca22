//! Utility helpers shared across front ends.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules keep routing, navigation and display concerns out of the
//! API and state layers so every front end applies them identically.

pub mod auth;
pub mod format;
pub mod navigate;
