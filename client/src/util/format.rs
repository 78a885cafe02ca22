//! Display helpers for dates, slots and prices.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use chrono::NaiveDate;

use crate::net::types::AvailableSlot;

/// "Today", "Tomorrow", "Yesterday", otherwise e.g. "October 21, 2026".
#[must_use]
pub fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_owned(),
        1 => "Tomorrow".to_owned(),
        -1 => "Yesterday".to_owned(),
        _ => date.format("%B %-d, %Y").to_string(),
    }
}

/// Drop a trailing `:SS` from an `HH:MM:SS` time.
#[must_use]
pub fn short_time(time: &str) -> &str {
    match time.split(':').count() {
        3 => time.rsplit_once(':').map_or(time, |(hm, _)| hm),
        _ => time,
    }
}

#[must_use]
pub fn slot_label(slot: &AvailableSlot) -> String {
    format!("{} - {}", short_time(&slot.start_time), short_time(&slot.end_time))
}

/// Prefix a decimal price string with a dollar sign.
#[must_use]
pub fn price_label(price: &str) -> String {
    if price.is_empty() { "-".to_owned() } else { format!("${price}") }
}
