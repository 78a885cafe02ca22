//! Client-side state: the session observable, the booking wizard, and the
//! verification signal the wizard waits on.

pub mod auth;
pub mod verification;
pub mod wizard;
