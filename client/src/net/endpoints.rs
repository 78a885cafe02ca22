//! Backend REST paths.
//!
//! Every path keeps the trailing slash the backend router expects.

#[cfg(test)]
#[path = "endpoints_test.rs"]
mod endpoints_test;

use chrono::NaiveDate;

pub const CHECK_AUTH: &str = "/api/auth/check-auth/";
pub const LOGIN: &str = "/api/auth/login/";
pub const LOGOUT: &str = "/api/auth/logout/";
pub const TOKEN_REFRESH: &str = "/api/auth/token/refresh/";
pub const REGISTER: &str = "/api/auth/register/";
pub const VERIFY_CODE: &str = "/api/auth/verify/";
pub const RESEND_CODE: &str = "/api/auth/verify/resend/";
pub const GOOGLE_OAUTH: &str = "/api/auth/oauth/google/";

pub const SERVICES: &str = "/api/client/services/";
pub const AVAILABILITY_SLOTS: &str = "/api/client/availability-slots/";
pub const PROVIDER_BOOKINGS: &str = "/api/client/bookings/";
pub const DASHBOARD: &str = "/api/client/me/";

pub const CHAT_SESSIONS: &str = "/api/chat/sessions/";

/// Endpoints where a 401 means the submitted credentials were rejected,
/// not that an access token expired.
const CREDENTIAL_ENDPOINTS: [&str; 5] = [LOGIN, REGISTER, VERIFY_CODE, RESEND_CODE, GOOGLE_OAUTH];

#[must_use]
pub fn is_credential_endpoint(path: &str) -> bool {
    CREDENTIAL_ENDPOINTS.contains(&strip_query(path))
}

#[must_use]
pub fn is_refresh_endpoint(path: &str) -> bool {
    strip_query(path) == TOKEN_REFRESH
}

#[must_use]
pub fn is_check_auth_endpoint(path: &str) -> bool {
    strip_query(path) == CHECK_AUTH
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(p, _)| p)
}

/// `/api/client/services/12/` style detail path under a collection.
#[must_use]
pub fn detail(collection: &str, id: i64) -> String {
    format!("{}/{id}/", collection.trim_end_matches('/'))
}

/// Booking date as it appears in URLs (`YYYY-MM-DD`).
#[must_use]
pub fn url_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[must_use]
pub fn public_services(slug: &str) -> String {
    format!("/api/bookings/services/{slug}/")
}

#[must_use]
pub fn available_slots(slug: &str, service_id: i64, date: NaiveDate) -> String {
    format!("/api/bookings/{slug}/{service_id}/{}/", url_date(date))
}

#[must_use]
pub fn create_booking(slug: &str, service_id: i64, date: NaiveDate) -> String {
    format!("/api/bookings/book/{slug}/{service_id}/{}/", url_date(date))
}

#[must_use]
pub fn verify_booking(token: &str) -> String {
    format!("/api/bookings/book/verify/{token}/")
}

#[must_use]
pub fn chat_send(session_id: &str) -> String {
    format!("/api/chat/{session_id}/send-msg/")
}

#[must_use]
pub fn chat_history(session_id: &str) -> String {
    format!("/api/chat/{session_id}/history/")
}
