//! Provider dashboard CRUD over one generic editor.
//!
//! DESIGN
//! ======
//! Services, availability slots and provider bookings share the same REST
//! shape (`collection/` and `collection/<id>/`). Each is a zero-sized
//! [`Resource`] that names its collection, its item and draft types, and how a
//! draft is encoded. [`ResourceEditor`] carries the calls.

#[cfg(test)]
#[path = "resources_test.rs"]
mod resources_test;

use std::marker::PhantomData;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::api::ApiClient;
use super::endpoints::{self, AVAILABILITY_SLOTS, DASHBOARD, PROVIDER_BOOKINGS, SERVICES};
use super::error::ApiError;
use super::request::{ApiRequest, ApiResponse, FormPart, RequestBody};
use super::types::{AvailabilitySlot, Booking, BookingStatus, Dashboard, Service};

pub trait Resource {
    /// Collection path with trailing slash.
    const COLLECTION: &'static str;
    /// Singular name used in logs and CLI output.
    const LABEL: &'static str;

    type Item: DeserializeOwned + Send;
    type Draft: PartialEq + Send + Sync;

    fn body(draft: &Self::Draft) -> RequestBody;
}

// =============================================================================
// Services
// =============================================================================

pub struct Services;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub filename: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDraft {
    pub name: String,
    pub description: String,
    /// Django duration, e.g. `"00:30:00"`.
    pub duration: String,
    pub price: String,
    /// Replaces the featured image when present; omitted otherwise.
    pub image: Option<ImageUpload>,
}

impl From<&Service> for ServiceDraft {
    fn from(service: &Service) -> Self {
        Self {
            name: service.name.clone(),
            description: service.description.clone(),
            duration: service.duration.clone(),
            price: service.price.clone(),
            image: None,
        }
    }
}

impl Resource for Services {
    const COLLECTION: &'static str = SERVICES;
    const LABEL: &'static str = "service";

    type Item = Service;
    type Draft = ServiceDraft;

    fn body(draft: &ServiceDraft) -> RequestBody {
        let mut parts = vec![
            FormPart::text("name", draft.name.as_str()),
            FormPart::text("description", draft.description.as_str()),
            FormPart::text("duration", draft.duration.as_str()),
            FormPart::text("price", draft.price.as_str()),
        ];
        if let Some(image) = &draft.image {
            parts.push(FormPart::File {
                name: "featured_img".to_owned(),
                filename: image.filename.clone(),
                mime: image.mime.clone(),
                bytes: image.bytes.clone(),
            });
        }
        RequestBody::Multipart(parts)
    }
}

// =============================================================================
// Availability slots
// =============================================================================

pub struct AvailabilitySlots;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDraft {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub is_recurring: bool,
    pub recurrence_pattern: String,
}

impl From<&AvailabilitySlot> for SlotDraft {
    fn from(slot: &AvailabilitySlot) -> Self {
        Self {
            date: slot.date,
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
            is_recurring: slot.is_recurring,
            recurrence_pattern: slot
                .recurrence_pattern
                .clone()
                .unwrap_or_else(|| DEFAULT_RECURRENCE.to_owned()),
        }
    }
}

pub const DEFAULT_RECURRENCE: &str = "weekly";

impl Resource for AvailabilitySlots {
    const COLLECTION: &'static str = AVAILABILITY_SLOTS;
    const LABEL: &'static str = "slot";

    type Item = AvailabilitySlot;
    type Draft = SlotDraft;

    fn body(draft: &SlotDraft) -> RequestBody {
        RequestBody::Json(json!({
            "date": endpoints::url_date(draft.date),
            "start_time": draft.start_time,
            "end_time": draft.end_time,
            "is_recurring": draft.is_recurring,
            "recurrence_pattern": draft.recurrence_pattern,
        }))
    }
}

// =============================================================================
// Provider bookings
// =============================================================================

pub struct ProviderBookings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub service_id: i64,
    pub date: NaiveDate,
    pub status: BookingStatus,
    pub start_time: String,
    /// Ask the server to email the customer about this booking.
    pub email_sent: bool,
}

impl Resource for ProviderBookings {
    const COLLECTION: &'static str = PROVIDER_BOOKINGS;
    const LABEL: &'static str = "booking";

    type Item = Booking;
    type Draft = BookingDraft;

    fn body(draft: &BookingDraft) -> RequestBody {
        RequestBody::Json(json!({
            "customer_name": draft.customer_name,
            "customer_email": draft.customer_email,
            "customer_phone": draft.customer_phone,
            "service_id": draft.service_id,
            "date": endpoints::url_date(draft.date),
            "status": draft.status,
            "start_time": draft.start_time,
            "email_sent": draft.email_sent,
        }))
    }
}

// =============================================================================
// Editor
// =============================================================================

pub type ServiceEditor = ResourceEditor<Services>;
pub type SlotEditor = ResourceEditor<AvailabilitySlots>;
pub type BookingEditor = ResourceEditor<ProviderBookings>;

pub struct ResourceEditor<R: Resource> {
    api: ApiClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceEditor<R> {
    fn clone(&self) -> Self {
        Self::new(self.api.clone())
    }
}

impl<R: Resource> ResourceEditor<R> {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api, _resource: PhantomData }
    }

    /// # Errors
    ///
    /// Propagates request and decode failures.
    pub async fn list(&self) -> Result<Vec<R::Item>, ApiError> {
        self.api.get(R::COLLECTION).await?.json()
    }

    /// # Errors
    ///
    /// Propagates request and decode failures.
    pub async fn get(&self, id: i64) -> Result<R::Item, ApiError> {
        self.api.get(&endpoints::detail(R::COLLECTION, id)).await?.json()
    }

    /// # Errors
    ///
    /// Propagates request failures; business errors arrive as `Status`.
    pub async fn create(&self, draft: &R::Draft) -> Result<ApiResponse, ApiError> {
        let req = ApiRequest { body: R::body(draft), ..ApiRequest::post(R::COLLECTION) };
        let response = self.api.request(&req).await?;
        tracing::info!(resource = R::LABEL, "created");
        Ok(response)
    }

    /// # Errors
    ///
    /// Propagates request failures; business errors arrive as `Status`.
    pub async fn update(&self, id: i64, draft: &R::Draft) -> Result<ApiResponse, ApiError> {
        let req = ApiRequest { body: R::body(draft), ..ApiRequest::put(endpoints::detail(R::COLLECTION, id)) };
        let response = self.api.request(&req).await?;
        tracing::info!(resource = R::LABEL, id, "updated");
        Ok(response)
    }

    /// Update only when `edited` differs from `original`. Returns `None`
    /// without a request when nothing changed.
    ///
    /// # Errors
    ///
    /// See [`ResourceEditor::update`].
    pub async fn update_if_changed(
        &self,
        id: i64,
        original: &R::Draft,
        edited: &R::Draft,
    ) -> Result<Option<ApiResponse>, ApiError> {
        if original == edited {
            tracing::debug!(resource = R::LABEL, id, "no changes; skipping update");
            return Ok(None);
        }
        self.update(id, edited).await.map(Some)
    }

    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&endpoints::detail(R::COLLECTION, id)).await?;
        tracing::info!(resource = R::LABEL, id, "deleted");
        Ok(())
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Provider profile with every service, slot and booking.
///
/// # Errors
///
/// Propagates request and decode failures.
pub async fn dashboard(api: &ApiClient) -> Result<Dashboard, ApiError> {
    api.get(DASHBOARD).await?.json()
}

/// Change the provider's public booking slug.
///
/// # Errors
///
/// Returns `InvalidRequest` for a blank slug; a taken slug comes back as a
/// `Status` whose server message names the conflict.
pub async fn update_profile(api: &ApiClient, user_slug: &str) -> Result<ApiResponse, ApiError> {
    let slug = user_slug.trim();
    if slug.is_empty() {
        return Err(ApiError::InvalidRequest("user slug cannot be empty".to_owned()));
    }
    api.put_json(DASHBOARD, json!({ "user_slug": slug })).await
}
