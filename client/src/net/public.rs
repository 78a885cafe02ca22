//! Anonymous customer booking endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! These are the calls the booking wizard makes on behalf of a visitor who
//! found a provider by slug. The wizard only sees them through the
//! [`BookingBackend`] trait so its transitions can be tested without HTTP.

#[cfg(test)]
#[path = "public_test.rs"]
mod public_test;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};

use super::api::ApiClient;
use super::endpoints;
use super::error::{ApiError, message_from_body};
use super::types::{AvailableSlot, BookingStatus, Service};

pub const BOOKING_CONFIRMED_MESSAGE: &str = "Your booking has been confirmed!";
pub const VERIFICATION_FAILED_MESSAGE: &str = "Verification failed. Please try again.";

/// Contact details and chosen slot for one booking submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub slot: AvailableSlot,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

impl BookingRequest {
    /// JSON body for the booking-creation endpoint.
    ///
    /// Absent phone is sent as `""` and absent notes as `null`, matching what
    /// the backend serializer accepts.
    #[must_use]
    pub fn payload(&self) -> Value {
        json!({
            "slot": self.slot.id,
            "start_time": self.slot.start_time,
            "end_time": self.slot.end_time,
            "customer_name": self.customer_name,
            "customer_email": self.customer_email,
            "customer_phone": self.customer_phone.as_deref().unwrap_or(""),
            "note": self.notes,
            "confirmed": true,
            "status": BookingStatus::Pending,
        })
    }
}

/// Public booking calls used by the wizard.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn services(&self, slug: &str) -> Result<Vec<Service>, ApiError>;

    async fn available_slots(&self, slug: &str, service_id: i64, date: NaiveDate) -> Result<Vec<AvailableSlot>, ApiError>;

    /// Submit a booking. Returns the server's message, if any.
    async fn create_booking(
        &self,
        slug: &str,
        service_id: i64,
        date: NaiveDate,
        booking: &BookingRequest,
    ) -> Result<Option<String>, ApiError>;
}

#[async_trait]
impl BookingBackend for ApiClient {
    async fn services(&self, slug: &str) -> Result<Vec<Service>, ApiError> {
        self.get(&endpoints::public_services(slug)).await?.json()
    }

    async fn available_slots(&self, slug: &str, service_id: i64, date: NaiveDate) -> Result<Vec<AvailableSlot>, ApiError> {
        self.get(&endpoints::available_slots(slug, service_id, date))
            .await?
            .json()
    }

    async fn create_booking(
        &self,
        slug: &str,
        service_id: i64,
        date: NaiveDate,
        booking: &BookingRequest,
    ) -> Result<Option<String>, ApiError> {
        let path = endpoints::create_booking(slug, service_id, date);
        let response = self.post_json(&path, booking.payload()).await?;
        tracing::info!(%slug, service_id, %date, status = response.status, "booking submitted");
        Ok(message_from_body(&response.body))
    }
}

/// Confirm a booking through the token from its emailed link.
///
/// Returns the message to show the customer. A booking that was already
/// confirmed counts as confirmed.
///
/// # Errors
///
/// Expired or unknown tokens come back as `Status`; show
/// `display_message(VERIFICATION_FAILED_MESSAGE)`.
pub async fn verify_booking_link(api: &ApiClient, token: &str) -> Result<String, ApiError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::InvalidRequest("verification token is empty".to_owned()));
    }
    let response = api.get(&endpoints::verify_booking(token)).await?;
    Ok(message_from_body(&response.body).unwrap_or_else(|| BOOKING_CONFIRMED_MESSAGE.to_owned()))
}
