//! Customer booking wizard.
//!
//! ARCHITECTURE
//! ============
//! One [`WizardStep`] value holds everything the current step needs, so
//! impossible combinations (a slot without a date, two steps at once) cannot
//! be represented. Transitions are methods on [`BookingWizard`]:
//!
//! ```text
//! ServiceSelection -> DateSelection -> SlotSelection -> ContactForm
//!                                                          |
//!                       Confirmed <- PendingVerification <-+
//! ```
//!
//! A failed transition leaves the step untouched and, for user-facing
//! failures, sets `banner`. Nothing retries automatically.

#[cfg(test)]
#[path = "wizard_test.rs"]
mod wizard_test;

use std::time::Duration;

use chrono::NaiveDate;
use uuid::Uuid;

use super::verification::{VerificationError, VerificationSignal};
use crate::net::error::ApiError;
use crate::net::public::{BookingBackend, BookingRequest};
use crate::net::types::{AvailableSlot, Service};

pub const SERVICES_ERROR: &str = "Error fetching services. Try again later";
pub const SELECT_SERVICE: &str = "Please select a service to continue.";
pub const SELECT_DATE: &str = "Please select a date.";
pub const PAST_DATE: &str = "Please choose today or a later date.";
pub const NO_SLOTS: &str = "No available slots for this date. Please choose another date.";
pub const SLOTS_ERROR: &str = "Error fetching available slots";
pub const BOOKING_ERROR: &str = "Error creating booking";
pub const VERIFICATION_TIMEOUT: &str = "Verification link was not opened in time. Please book again.";

pub const NAME_REQUIRED: &str = "Name is required";
pub const NAME_TOO_LONG: &str = "Name must be 50 characters or fewer";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";
pub const PHONE_TOO_LONG: &str = "Phone number must be 20 characters or fewer";

const MAX_NAME_CHARS: usize = 50;
const MAX_PHONE_CHARS: usize = 20;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WizardError {
    #[error("{0}")]
    Validation(String),
    #[error("cannot {action} while in {step}")]
    InvalidTransition { action: &'static str, step: &'static str },
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

/// Local handle for a submitted booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingReceipt {
    pub reference: Uuid,
    pub slug: String,
    pub service_id: i64,
    pub date: NaiveDate,
    pub slot: AvailableSlot,
    pub customer_email: String,
    /// Server message returned on submission.
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardStep {
    ServiceSelection { selected: Option<i64> },
    DateSelection { service_id: i64, date: Option<NaiveDate> },
    SlotSelection { service_id: i64, date: NaiveDate, slots: Vec<AvailableSlot> },
    ContactForm { service_id: i64, date: NaiveDate, slot: AvailableSlot },
    PendingVerification { receipt: BookingReceipt },
    Confirmed { receipt: BookingReceipt, message: String },
}

impl WizardStep {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ServiceSelection { .. } => "service selection",
            Self::DateSelection { .. } => "date selection",
            Self::SlotSelection { .. } => "slot selection",
            Self::ContactForm { .. } => "contact form",
            Self::PendingVerification { .. } => "pending verification",
            Self::Confirmed { .. } => "confirmed",
        }
    }
}

/// Contact form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl ContactDetails {
    /// Check the form and return it trimmed, with blank optionals dropped.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule's message.
    pub fn validate(&self) -> Result<Self, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(NAME_REQUIRED.to_owned());
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(NAME_TOO_LONG.to_owned());
        }

        let email = self.email.trim();
        if email.is_empty() {
            return Err(EMAIL_REQUIRED.to_owned());
        }
        if !is_email_shaped(email) {
            return Err(EMAIL_INVALID.to_owned());
        }

        let phone = non_blank(self.phone.as_deref());
        if phone.as_ref().is_some_and(|p| p.chars().count() > MAX_PHONE_CHARS) {
            return Err(PHONE_TOO_LONG.to_owned());
        }

        Ok(Self {
            name: name.to_owned(),
            email: email.to_owned(),
            phone,
            notes: non_blank(self.notes.as_deref()),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

pub struct BookingWizard {
    slug: String,
    services: Vec<Service>,
    services_loaded: bool,
    step: WizardStep,
    banner: Option<String>,
}

impl BookingWizard {
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            services: Vec::new(),
            services_loaded: false,
            step: WizardStep::ServiceSelection { selected: None },
            banner: None,
        }
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn step(&self) -> &WizardStep {
        &self.step
    }

    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Message to show above the current step, if any.
    #[must_use]
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Slots on offer; empty outside slot selection.
    #[must_use]
    pub fn available_slots(&self) -> &[AvailableSlot] {
        match &self.step {
            WizardStep::SlotSelection { slots, .. } => slots,
            _ => &[],
        }
    }

    /// Fetch the provider's services. Runs once per wizard; later calls
    /// return the cached list.
    ///
    /// # Errors
    ///
    /// `Api` when the fetch fails; the banner asks to try again later.
    pub async fn load_services(&mut self, backend: &dyn BookingBackend) -> Result<&[Service], WizardError> {
        if !self.services_loaded {
            match backend.services(&self.slug).await {
                Ok(services) => {
                    tracing::debug!(slug = %self.slug, count = services.len(), "services loaded");
                    self.services = services;
                    self.services_loaded = true;
                    self.banner = None;
                }
                Err(error) => return Err(self.api_failure(error, SERVICES_ERROR, false)),
            }
        }
        Ok(&self.services)
    }

    /// # Errors
    ///
    /// `InvalidTransition` outside service selection; `Validation` for an
    /// id that is not on offer.
    pub fn select_service(&mut self, service_id: i64) -> Result<(), WizardError> {
        if !matches!(self.step, WizardStep::ServiceSelection { .. }) {
            return Err(invalid("select a service", &self.step));
        }
        if !self.services.iter().any(|s| s.id == service_id) {
            return Err(self.validation(&format!("Unknown service: {service_id}")));
        }
        self.step = WizardStep::ServiceSelection { selected: Some(service_id) };
        self.banner = None;
        Ok(())
    }

    /// # Errors
    ///
    /// `Validation` (with banner) when no service is selected.
    pub fn continue_to_dates(&mut self) -> Result<(), WizardError> {
        match self.step {
            WizardStep::ServiceSelection { selected: Some(service_id) } => {
                self.step = WizardStep::DateSelection { service_id, date: None };
                self.banner = None;
                Ok(())
            }
            WizardStep::ServiceSelection { selected: None } => Err(self.validation(SELECT_SERVICE)),
            _ => Err(invalid("continue to dates", &self.step)),
        }
    }

    /// Choose the booking date; `today` is the earliest allowed.
    ///
    /// # Errors
    ///
    /// `Validation` for a past date; `InvalidTransition` outside date
    /// selection.
    pub fn pick_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), WizardError> {
        if !matches!(self.step, WizardStep::DateSelection { .. }) {
            return Err(invalid("pick a date", &self.step));
        }
        if date < today {
            return Err(self.validation(PAST_DATE));
        }
        if let WizardStep::DateSelection { date: slot, .. } = &mut self.step {
            *slot = Some(date);
        }
        self.banner = None;
        Ok(())
    }

    /// Fetch free slots for the chosen service and date. Returns how many
    /// were found; with none the wizard stays on date selection.
    ///
    /// # Errors
    ///
    /// `Validation` without a date; `Api` when the fetch fails.
    pub async fn fetch_slots(&mut self, backend: &dyn BookingBackend) -> Result<usize, WizardError> {
        let (service_id, date) = match self.step {
            WizardStep::DateSelection { service_id, date: Some(date) } => (service_id, date),
            WizardStep::DateSelection { date: None, .. } => return Err(self.validation(SELECT_DATE)),
            _ => return Err(invalid("fetch slots", &self.step)),
        };

        let slots = match backend.available_slots(&self.slug, service_id, date).await {
            Ok(slots) => slots,
            Err(error) => return Err(self.api_failure(error, SLOTS_ERROR, false)),
        };

        if slots.is_empty() {
            tracing::debug!(slug = %self.slug, service_id, %date, "no free slots");
            self.banner = Some(NO_SLOTS.to_owned());
            return Ok(0);
        }

        let count = slots.len();
        self.step = WizardStep::SlotSelection { service_id, date, slots };
        self.banner = None;
        Ok(count)
    }

    /// Pick a slot by position; goes straight to the contact form.
    ///
    /// # Errors
    ///
    /// `Validation` for an index out of range.
    pub fn choose_slot(&mut self, index: usize) -> Result<(), WizardError> {
        let WizardStep::SlotSelection { service_id, date, slots } = &self.step else {
            return Err(invalid("choose a slot", &self.step));
        };
        let (service_id, date) = (*service_id, *date);
        let Some(slot) = slots.get(index).cloned() else {
            return Err(self.validation(&format!("No slot number {}", index + 1)));
        };
        self.step = WizardStep::ContactForm { service_id, date, slot };
        self.banner = None;
        Ok(())
    }

    /// Validate the contact form and submit the booking.
    ///
    /// # Errors
    ///
    /// `Validation` before any request; `Api` when the server rejects it.
    /// Either way the form stays open.
    pub async fn submit(
        &mut self,
        contact: &ContactDetails,
        backend: &dyn BookingBackend,
    ) -> Result<BookingReceipt, WizardError> {
        let WizardStep::ContactForm { service_id, date, slot } = &self.step else {
            return Err(invalid("submit a booking", &self.step));
        };
        let (service_id, date, slot) = (*service_id, *date, slot.clone());

        let contact = contact.validate().map_err(|message| self.validation(&message))?;
        let request = BookingRequest {
            slot: slot.clone(),
            customer_name: contact.name,
            customer_email: contact.email.clone(),
            customer_phone: contact.phone,
            notes: contact.notes,
        };

        let message = match backend.create_booking(&self.slug, service_id, date, &request).await {
            Ok(message) => message,
            Err(error) => return Err(self.api_failure(error, BOOKING_ERROR, true)),
        };

        let receipt = BookingReceipt {
            reference: Uuid::new_v4(),
            slug: self.slug.clone(),
            service_id,
            date,
            slot,
            customer_email: contact.email,
            message,
        };
        tracing::info!(reference = %receipt.reference, slug = %self.slug, "booking pending verification");
        self.step = WizardStep::PendingVerification { receipt: receipt.clone() };
        self.banner = None;
        Ok(receipt)
    }

    /// Step back one screen. Slots are dropped when leaving slot selection
    /// and the date when leaving date selection.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` from the contact form onwards.
    pub fn back(&mut self) -> Result<(), WizardError> {
        self.step = match &self.step {
            WizardStep::ServiceSelection { .. } => WizardStep::ServiceSelection { selected: None },
            WizardStep::DateSelection { service_id, .. } => {
                WizardStep::ServiceSelection { selected: Some(*service_id) }
            }
            WizardStep::SlotSelection { service_id, date, .. } => {
                WizardStep::DateSelection { service_id: *service_id, date: Some(*date) }
            }
            step => return Err(invalid("go back", step)),
        };
        self.banner = None;
        Ok(())
    }

    /// Wait for the emailed link to be opened, then mark the booking
    /// confirmed.
    ///
    /// # Errors
    ///
    /// `Verification` when the wait times out; the booking stays pending.
    pub async fn await_verification(
        &mut self,
        signal: &dyn VerificationSignal,
        timeout: Duration,
    ) -> Result<String, WizardError> {
        let WizardStep::PendingVerification { receipt } = &self.step else {
            return Err(invalid("await verification", &self.step));
        };
        let receipt = receipt.clone();

        let message = match signal.wait_confirmed(timeout).await {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(error = %error, "booking verification not received");
                if error == VerificationError::TimedOut {
                    self.banner = Some(VERIFICATION_TIMEOUT.to_owned());
                }
                return Err(error.into());
            }
        };

        tracing::info!(reference = %receipt.reference, "booking confirmed");
        self.step = WizardStep::Confirmed { receipt, message: message.clone() };
        self.banner = None;
        Ok(message)
    }

    /// Start over, keeping the loaded services.
    pub fn restart(&mut self) {
        self.step = WizardStep::ServiceSelection { selected: None };
        self.banner = None;
    }

    fn validation(&mut self, message: &str) -> WizardError {
        self.banner = Some(message.to_owned());
        WizardError::Validation(message.to_owned())
    }

    /// Record a failed call. `prefer_server` shows the server's own message
    /// when it sent one.
    fn api_failure(&mut self, error: ApiError, fallback: &str, prefer_server: bool) -> WizardError {
        let message = if prefer_server { error.display_message(fallback) } else { fallback.to_owned() };
        tracing::warn!(error = %error, slug = %self.slug, step = self.step.name(), "wizard request failed");
        self.banner = Some(message.clone());
        WizardError::Api { message, source: error }
    }
}

fn invalid(action: &'static str, step: &WizardStep) -> WizardError {
    WizardError::InvalidTransition { action, step: step.name() }
}
