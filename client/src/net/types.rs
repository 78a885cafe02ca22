//! Wire DTOs for the Slotbook REST API.
//!
//! DESIGN
//! ======
//! Field names mirror the backend serializers so responses decode without
//! renaming glue. Django REST emits ids as numbers but some write-only
//! serializer fields (e.g. `service_id`) come back as strings, and decimals
//! come back as strings; the lenient deserializers below accept both shapes.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// A bookable service offered by a provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Django duration string, e.g. `"00:30:00"`.
    #[serde(default)]
    pub duration: String,
    /// Decimal price as sent by the server, e.g. `"25.00"`.
    #[serde(default, deserialize_with = "deserialize_decimal_string")]
    pub price: String,
    /// Absolute or media-relative URL of the featured image.
    #[serde(default)]
    pub featured_img: Option<String>,
}

/// A block of time during which a provider accepts bookings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    pub date: NaiveDate,
    /// `HH:MM` or `HH:MM:SS`, provider-local.
    pub start_time: String,
    pub end_time: String,
    /// Inactive slots stay on the dashboard but are never offered.
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_recurring: bool,
    /// `"daily"`, `"weekly"` or `"monthly"` when recurring.
    #[serde(default)]
    pub recurrence_pattern: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// A booking as listed on the provider dashboard.
///
/// The plain list endpoint reports the service as `service`; the dashboard
/// aggregate reports `service_id` and `service_name` instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    pub customer_name: String,
    pub customer_email: String,
    /// Empty when the customer left it out.
    #[serde(default)]
    pub customer_phone: String,
    /// Service id as reported by the plain list endpoint.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub service: Option<i64>,
    /// Service id as reported by the dashboard aggregate.
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub service_id: Option<i64>,
    #[serde(default)]
    pub service_name: Option<String>,
    /// ISO 8601 datetime of the appointment start.
    pub start_time: String,
    /// Time of day the appointment ends, when the serializer sends it.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Full end datetime; carries the date that `end_time` lacks.
    #[serde(default)]
    pub end_datetime: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
    /// Whether the customer was notified of the last status change.
    #[serde(default)]
    pub email_sent: bool,
    /// Customer notes from the booking form.
    #[serde(default)]
    pub note: Option<String>,
}

impl Booking {
    /// Service id from whichever field the endpoint populated.
    #[must_use]
    pub fn service_ref(&self) -> Option<i64> {
        self.service_id.or(self.service)
    }
}

/// A free time window offered to customers for one service and date.
///
/// Times are passed through verbatim; the server may send `HH:MM` or
/// `HH:MM:SS`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<i64>,
    pub start_time: String,
    pub end_time: String,
}

/// The signed-in provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    /// Login email.
    pub email: String,
    /// Display name chosen at registration.
    pub username: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Public booking slug; only present on newer backends.
    #[serde(default)]
    pub user_slug: Option<String>,
}

/// `GET /api/client/me/` aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(rename = "User")]
    pub user: ProviderUser,
    #[serde(rename = "Services", default)]
    pub services: Vec<Service>,
    #[serde(rename = "Slots", default)]
    pub slots: Vec<AvailabilitySlot>,
    #[serde(rename = "Bookings", default)]
    pub bookings: Vec<Booking>,
}

/// `GET /api/auth/check-auth/` body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAuthResponse {
    #[serde(default)]
    pub is_authenticated: bool,
    /// Why the visitor is anonymous, e.g. `"No token found"`.
    #[serde(default)]
    pub error: Option<String>,
}

/// Email and password login body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Provider sign-up body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    /// Confirmation; the server rejects a mismatch.
    pub password2: String,
}

/// A conversation with the assistant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Server id; numeric or UUID depending on backend version.
    #[serde(deserialize_with = "deserialize_id_string")]
    pub id: String,
    /// ISO 8601 creation time.
    #[serde(default)]
    pub started_at: Option<String>,
    /// Preview of the most recent message.
    #[serde(default)]
    pub last_message: Option<String>,
}

/// One turn in a chat session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    pub message: String,
    /// `"user"` or `"bot"`.
    pub sender: String,
}

fn integer_from_number(number: &Number) -> Option<i64> {
    if let Some(int) = number.as_i64() {
        return Some(int);
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    if let Some(float) = number.as_f64()
        && float.is_finite()
        && float.fract() == 0.0
        && float >= i64::MIN as f64
        && float <= i64::MAX as f64
    {
        return Some(float as i64);
    }
    None
}

fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => {
            integer_from_number(&number).ok_or_else(|| D::Error::custom("expected integer-compatible number"))
        }
        _ => Err(D::Error::custom("expected number")),
    }
}

/// Optional id that may arrive as a number, a numeric string, or `null`.
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(number) => integer_from_number(&number)
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected integer-compatible number")),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected integer id, got {text:?}"))),
        _ => Err(D::Error::custom("expected id")),
    }
}

fn deserialize_id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        _ => Err(D::Error::custom("expected string or number id")),
    }
}

fn deserialize_decimal_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(D::Error::custom("expected decimal")),
    }
}
