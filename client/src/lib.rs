//! Slotbook booking client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Native client for the Slotbook service-booking backend. `net` talks to the
//! REST API (with transparent single-flight token refresh), `state` holds the
//! session observable and the customer booking wizard, and `util` carries
//! route-guard and display helpers shared by front ends such as the CLI.

pub mod config;
pub mod net;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::ClientConfig;
pub use net::api::ApiClient;
pub use net::error::ApiError;
pub use state::auth::{AuthState, Session};
pub use state::verification::VerificationBus;
pub use state::wizard::{BookingWizard, WizardError, WizardStep};
