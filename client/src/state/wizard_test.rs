use super::*;
use crate::state::verification::VerificationBus;
use crate::test_helpers::{MockBackend, client_for};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;

// =============================================================
// Helpers
// =============================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Services(String),
    Slots(String, i64, NaiveDate),
    Create(String, i64, NaiveDate, Value),
}

struct MockBooking {
    services: Mutex<Result<Vec<Service>, ApiError>>,
    slots: Mutex<Result<Vec<AvailableSlot>, ApiError>>,
    create: Mutex<Result<Option<String>, ApiError>>,
    calls: Mutex<Vec<Call>>,
}

impl MockBooking {
    fn new() -> Self {
        Self {
            services: Mutex::new(Ok(vec![service(1, "Haircut"), service(2, "Shave")])),
            slots: Mutex::new(Ok(vec![slot(Some(11), "10:00", "10:30"), slot(Some(12), "11:00", "11:30")])),
            create: Mutex::new(Ok(Some("Confirmation link was sent!".to_owned()))),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_slots(self, slots: Result<Vec<AvailableSlot>, ApiError>) -> Self {
        *self.slots.lock().unwrap() = slots;
        self
    }

    fn with_services(self, services: Result<Vec<Service>, ApiError>) -> Self {
        *self.services.lock().unwrap() = services;
        self
    }

    fn with_create(self, create: Result<Option<String>, ApiError>) -> Self {
        *self.create.lock().unwrap() = create;
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookingBackend for MockBooking {
    async fn services(&self, slug: &str) -> Result<Vec<Service>, ApiError> {
        self.calls.lock().unwrap().push(Call::Services(slug.to_owned()));
        self.services.lock().unwrap().clone()
    }

    async fn available_slots(&self, slug: &str, service_id: i64, date: NaiveDate) -> Result<Vec<AvailableSlot>, ApiError> {
        self.calls.lock().unwrap().push(Call::Slots(slug.to_owned(), service_id, date));
        self.slots.lock().unwrap().clone()
    }

    async fn create_booking(
        &self,
        slug: &str,
        service_id: i64,
        date: NaiveDate,
        booking: &BookingRequest,
    ) -> Result<Option<String>, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Create(slug.to_owned(), service_id, date, booking.payload()));
        self.create.lock().unwrap().clone()
    }
}

fn service(id: i64, name: &str) -> Service {
    Service {
        id,
        name: name.to_owned(),
        description: String::new(),
        duration: "00:30:00".to_owned(),
        price: "25.00".to_owned(),
        featured_img: None,
    }
}

fn slot(id: Option<i64>, start: &str, end: &str) -> AvailableSlot {
    AvailableSlot { id, start_time: start.to_owned(), end_time: end.to_owned() }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn day_d() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 21).unwrap()
}

fn jane() -> ContactDetails {
    ContactDetails { name: "Jane".to_owned(), email: "jane@x.com".to_owned(), phone: None, notes: None }
}

fn status_error(status: u16, body: Value) -> ApiError {
    ApiError::Status { status, body }
}

/// Wizard sitting on the contact form for service 1, `day_d`, slot 10:00.
async fn at_contact_form(backend: &MockBooking) -> BookingWizard {
    let mut wizard = BookingWizard::new("pro-cuts");
    wizard.load_services(backend).await.unwrap();
    wizard.select_service(1).unwrap();
    wizard.continue_to_dates().unwrap();
    wizard.pick_date(day_d(), today()).unwrap();
    wizard.fetch_slots(backend).await.unwrap();
    wizard.choose_slot(0).unwrap();
    wizard
}

// =============================================================
// Service selection
// =============================================================

#[tokio::test]
async fn services_load_once_per_wizard() {
    let backend = MockBooking::new();
    let mut wizard = BookingWizard::new("pro-cuts");

    assert_eq!(wizard.load_services(&backend).await.unwrap().len(), 2);
    assert_eq!(wizard.load_services(&backend).await.unwrap().len(), 2);
    assert_eq!(backend.calls(), vec![Call::Services("pro-cuts".to_owned())]);
}

#[tokio::test]
async fn service_fetch_failure_sets_banner() {
    let backend = MockBooking::new().with_services(Err(status_error(500, json!({}))));
    let mut wizard = BookingWizard::new("pro-cuts");

    let err = wizard.load_services(&backend).await.unwrap_err();
    assert!(matches!(err, WizardError::Api { .. }));
    assert_eq!(wizard.banner(), Some(SERVICES_ERROR));
    assert!(wizard.services().is_empty());
}

#[test]
fn continue_without_selection_is_validation_error() {
    let mut wizard = BookingWizard::new("pro-cuts");
    let err = wizard.continue_to_dates().unwrap_err();
    assert!(matches!(err, WizardError::Validation(ref m) if m == SELECT_SERVICE));
    assert_eq!(wizard.banner(), Some(SELECT_SERVICE));
    assert_eq!(wizard.step(), &WizardStep::ServiceSelection { selected: None });
}

#[tokio::test]
async fn slots_cannot_be_fetched_without_a_service() {
    let backend = MockBooking::new();
    let mut wizard = BookingWizard::new("pro-cuts");

    let err = wizard.fetch_slots(&backend).await.unwrap_err();
    assert!(matches!(err, WizardError::InvalidTransition { .. }));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn unknown_service_is_rejected() {
    let backend = MockBooking::new();
    let mut wizard = BookingWizard::new("pro-cuts");
    wizard.load_services(&backend).await.unwrap();

    assert!(matches!(wizard.select_service(99), Err(WizardError::Validation(_))));
    assert_eq!(wizard.step(), &WizardStep::ServiceSelection { selected: None });
    assert_eq!(wizard.banner(), Some("Unknown service: 99"));

    wizard.select_service(1).unwrap();
    assert_eq!(wizard.banner(), None);
}

// =============================================================
// Date selection
// =============================================================

#[tokio::test]
async fn past_dates_are_rejected_and_today_is_allowed() {
    let backend = MockBooking::new();
    let mut wizard = BookingWizard::new("pro-cuts");
    wizard.load_services(&backend).await.unwrap();
    wizard.select_service(2).unwrap();
    wizard.continue_to_dates().unwrap();

    let yesterday = today().pred_opt().unwrap();
    assert!(matches!(wizard.pick_date(yesterday, today()), Err(WizardError::Validation(_))));
    assert_eq!(wizard.banner(), Some(PAST_DATE));

    wizard.pick_date(today(), today()).unwrap();
    assert_eq!(wizard.step(), &WizardStep::DateSelection { service_id: 2, date: Some(today()) });
    assert_eq!(wizard.banner(), None);
}

#[tokio::test]
async fn fetching_slots_requires_a_date() {
    let backend = MockBooking::new();
    let mut wizard = BookingWizard::new("pro-cuts");
    wizard.load_services(&backend).await.unwrap();
    wizard.select_service(1).unwrap();
    wizard.continue_to_dates().unwrap();

    let err = wizard.fetch_slots(&backend).await.unwrap_err();
    assert!(matches!(err, WizardError::Validation(ref m) if m == SELECT_DATE));
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn empty_slot_list_stays_on_date_selection() {
    let backend = MockBooking::new().with_slots(Ok(vec![]));
    let mut wizard = BookingWizard::new("pro-cuts");
    wizard.load_services(&backend).await.unwrap();
    wizard.select_service(1).unwrap();
    wizard.continue_to_dates().unwrap();
    wizard.pick_date(day_d(), today()).unwrap();

    assert_eq!(wizard.fetch_slots(&backend).await.unwrap(), 0);
    assert_eq!(wizard.step(), &WizardStep::DateSelection { service_id: 1, date: Some(day_d()) });
    assert_eq!(wizard.banner(), Some(NO_SLOTS));
    assert!(wizard.available_slots().is_empty());
}

#[tokio::test]
async fn slot_fetch_failure_keeps_date_selection() {
    let backend = MockBooking::new().with_slots(Err(status_error(500, json!({ "detail": "boom" }))));
    let mut wizard = BookingWizard::new("pro-cuts");
    wizard.load_services(&backend).await.unwrap();
    wizard.select_service(1).unwrap();
    wizard.continue_to_dates().unwrap();
    wizard.pick_date(day_d(), today()).unwrap();

    assert!(wizard.fetch_slots(&backend).await.is_err());
    assert_eq!(wizard.banner(), Some(SLOTS_ERROR));
    assert!(matches!(wizard.step(), WizardStep::DateSelection { .. }));
}

// =============================================================
// Slot selection and back navigation
// =============================================================

#[tokio::test]
async fn choosing_a_slot_goes_straight_to_contact_form() {
    let backend = MockBooking::new();
    let wizard = at_contact_form(&backend).await;

    assert_eq!(
        wizard.step(),
        &WizardStep::ContactForm { service_id: 1, date: day_d(), slot: slot(Some(11), "10:00", "10:30") }
    );
}

#[tokio::test]
async fn slot_index_out_of_range_is_rejected() {
    let backend = MockBooking::new();
    let mut wizard = BookingWizard::new("pro-cuts");
    wizard.load_services(&backend).await.unwrap();
    wizard.select_service(1).unwrap();
    wizard.continue_to_dates().unwrap();
    wizard.pick_date(day_d(), today()).unwrap();
    assert_eq!(wizard.fetch_slots(&backend).await.unwrap(), 2);

    assert!(matches!(wizard.choose_slot(2), Err(WizardError::Validation(_))));
    assert_eq!(wizard.available_slots().len(), 2);
    assert_eq!(wizard.banner(), Some("No slot number 3"));
}

#[tokio::test]
async fn back_is_asymmetric() {
    let backend = MockBooking::new();
    let mut wizard = BookingWizard::new("pro-cuts");
    wizard.load_services(&backend).await.unwrap();
    wizard.select_service(1).unwrap();
    wizard.continue_to_dates().unwrap();
    wizard.pick_date(day_d(), today()).unwrap();
    wizard.fetch_slots(&backend).await.unwrap();

    wizard.back().unwrap();
    assert_eq!(wizard.step(), &WizardStep::DateSelection { service_id: 1, date: Some(day_d()) });
    assert!(wizard.available_slots().is_empty());

    wizard.back().unwrap();
    assert_eq!(wizard.step(), &WizardStep::ServiceSelection { selected: Some(1) });

    wizard.back().unwrap();
    assert_eq!(wizard.step(), &WizardStep::ServiceSelection { selected: None });
}

#[tokio::test]
async fn no_back_from_contact_form() {
    let backend = MockBooking::new();
    let mut wizard = at_contact_form(&backend).await;

    let err = wizard.back().unwrap_err();
    assert!(matches!(err, WizardError::InvalidTransition { step: "contact form", .. }));
    assert!(matches!(wizard.step(), WizardStep::ContactForm { .. }));
}

// =============================================================
// Contact form
// =============================================================

#[test]
fn contact_validation_rules() {
    let long_name = ContactDetails { name: "x".repeat(51), ..jane() };
    assert_eq!(long_name.validate(), Err(NAME_TOO_LONG.to_owned()));

    let exactly_fifty = ContactDetails { name: "x".repeat(50), ..jane() };
    assert!(exactly_fifty.validate().is_ok());

    let blank_name = ContactDetails { name: "  ".to_owned(), ..jane() };
    assert_eq!(blank_name.validate(), Err(NAME_REQUIRED.to_owned()));

    let no_email = ContactDetails { email: String::new(), ..jane() };
    assert_eq!(no_email.validate(), Err(EMAIL_REQUIRED.to_owned()));

    for bad in ["jane", "@x.com", "jane@", "ja ne@x.com", "a@b@c"] {
        let contact = ContactDetails { email: bad.to_owned(), ..jane() };
        assert_eq!(contact.validate(), Err(EMAIL_INVALID.to_owned()), "{bad}");
    }

    let long_phone = ContactDetails { phone: Some("1".repeat(21)), ..jane() };
    assert_eq!(long_phone.validate(), Err(PHONE_TOO_LONG.to_owned()));
}

#[test]
fn contact_validation_trims_and_drops_blank_optionals() {
    let contact = ContactDetails {
        name: "  Jane ".to_owned(),
        email: " jane@x.com ".to_owned(),
        phone: Some("   ".to_owned()),
        notes: Some(" Window seat ".to_owned()),
    };
    let clean = contact.validate().unwrap();
    assert_eq!(clean.name, "Jane");
    assert_eq!(clean.email, "jane@x.com");
    assert_eq!(clean.phone, None);
    assert_eq!(clean.notes.as_deref(), Some("Window seat"));
}

#[tokio::test]
async fn invalid_contact_never_reaches_backend() {
    let backend = MockBooking::new();
    let mut wizard = at_contact_form(&backend).await;
    let before = backend.calls().len();

    let err = wizard.submit(&ContactDetails { name: String::new(), ..jane() }, &backend).await.unwrap_err();
    assert!(matches!(err, WizardError::Validation(_)));
    assert_eq!(wizard.banner(), Some(NAME_REQUIRED));
    assert_eq!(backend.calls().len(), before);
    assert!(matches!(wizard.step(), WizardStep::ContactForm { .. }));
}

#[tokio::test]
async fn submit_moves_to_pending_verification() {
    let backend = MockBooking::new();
    let mut wizard = at_contact_form(&backend).await;

    let receipt = wizard.submit(&jane(), &backend).await.expect("submitted");
    assert_eq!(receipt.service_id, 1);
    assert_eq!(receipt.date, day_d());
    assert_eq!(receipt.customer_email, "jane@x.com");
    assert_eq!(receipt.message.as_deref(), Some("Confirmation link was sent!"));
    assert_eq!(wizard.step(), &WizardStep::PendingVerification { receipt });

    let Some(Call::Create(slug, service_id, date, payload)) = backend.calls().pop() else {
        panic!("expected a create call");
    };
    assert_eq!((slug.as_str(), service_id, date), ("pro-cuts", 1, day_d()));
    assert_eq!(payload["slot"], 11);
    assert_eq!(payload["start_time"], "10:00");
    assert_eq!(payload["confirmed"], true);
    assert_eq!(payload["status"], "pending");
}

#[tokio::test]
async fn submit_failure_shows_server_message_and_stays() {
    let backend = MockBooking::new().with_create(Err(status_error(400, json!({ "message": "Slot just got taken" }))));
    let mut wizard = at_contact_form(&backend).await;

    assert!(wizard.submit(&jane(), &backend).await.is_err());
    assert_eq!(wizard.banner(), Some("Slot just got taken"));
    assert!(matches!(wizard.step(), WizardStep::ContactForm { .. }));
}

#[tokio::test]
async fn submit_failure_without_message_uses_generic_banner() {
    let backend = MockBooking::new().with_create(Err(status_error(500, Value::Null)));
    let mut wizard = at_contact_form(&backend).await;

    assert!(wizard.submit(&jane(), &backend).await.is_err());
    assert_eq!(wizard.banner(), Some(BOOKING_ERROR));
}

// =============================================================
// Verification
// =============================================================

#[tokio::test]
async fn verification_signal_confirms_booking() {
    let backend = MockBooking::new();
    let mut wizard = at_contact_form(&backend).await;
    wizard.submit(&jane(), &backend).await.unwrap();

    let bus = VerificationBus::new();
    let confirmer = bus.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        confirmer.confirm("Your booking has been confirmed!");
    });

    let message = wizard.await_verification(&bus, Duration::from_secs(5)).await.expect("confirmed");
    assert_eq!(message, "Your booking has been confirmed!");
    assert!(matches!(wizard.step(), WizardStep::Confirmed { .. }));
    assert!(matches!(wizard.back(), Err(WizardError::InvalidTransition { .. })));
}

#[tokio::test(start_paused = true)]
async fn verification_timeout_keeps_booking_pending() {
    let backend = MockBooking::new();
    let mut wizard = at_contact_form(&backend).await;
    wizard.submit(&jane(), &backend).await.unwrap();

    let err = wizard
        .await_verification(&VerificationBus::new(), Duration::from_secs(1800))
        .await
        .unwrap_err();
    assert!(matches!(err, WizardError::Verification(VerificationError::TimedOut)));
    assert_eq!(wizard.banner(), Some(VERIFICATION_TIMEOUT));
    assert!(matches!(wizard.step(), WizardStep::PendingVerification { .. }));
}

#[tokio::test]
async fn awaiting_verification_requires_a_submission() {
    let mut wizard = BookingWizard::new("pro-cuts");
    let err = wizard
        .await_verification(&VerificationBus::new(), Duration::from_millis(1))
        .await
        .unwrap_err();
    assert!(matches!(err, WizardError::InvalidTransition { .. }));
}

#[tokio::test]
async fn restart_keeps_loaded_services() {
    let backend = MockBooking::new();
    let mut wizard = at_contact_form(&backend).await;
    wizard.submit(&jane(), &backend).await.unwrap();

    wizard.restart();
    assert_eq!(wizard.step(), &WizardStep::ServiceSelection { selected: None });
    assert_eq!(wizard.services().len(), 2);
    wizard.load_services(&backend).await.unwrap();
    assert_eq!(backend.calls().iter().filter(|c| matches!(c, Call::Services(_))).count(), 1);
}

// =============================================================
// End to end over HTTP
// =============================================================

#[tokio::test]
async fn full_booking_posts_expected_payload() {
    let mock = MockBackend::new();
    mock.on("GET", "/api/bookings/services/pro-cuts/", 200, json!([{ "id": 7, "name": "Haircut", "price": "25.00" }]))
        .on(
            "GET",
            "/api/bookings/pro-cuts/7/2026-10-21/",
            200,
            json!([
                { "id": 31, "start_time": "10:00", "end_time": "10:30" },
                { "id": 32, "start_time": "11:00", "end_time": "11:30" }
            ]),
        )
        .on("POST", "/api/bookings/book/pro-cuts/7/2026-10-21/", 201, json!({ "message": "Booking confirmed!" }));
    let (api, _) = client_for(&mock.spawn().await);

    let mut wizard = BookingWizard::new("pro-cuts");
    wizard.load_services(&api).await.unwrap();
    wizard.select_service(7).unwrap();
    wizard.continue_to_dates().unwrap();
    wizard.pick_date(day_d(), today()).unwrap();
    assert_eq!(wizard.fetch_slots(&api).await.unwrap(), 2);
    wizard.choose_slot(0).unwrap();
    wizard.submit(&jane(), &api).await.expect("booked");

    let posted = mock.requests_to("/api/bookings/book/pro-cuts/7/2026-10-21/");
    assert_eq!(posted.len(), 1);
    assert_eq!(
        posted[0].body,
        json!({
            "slot": 31,
            "start_time": "10:00",
            "end_time": "10:30",
            "customer_name": "Jane",
            "customer_email": "jane@x.com",
            "customer_phone": "",
            "note": null,
            "confirmed": true,
            "status": "pending"
        })
    );
    assert!(matches!(wizard.step(), WizardStep::PendingVerification { .. }));
}
