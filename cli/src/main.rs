
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use client::config::ConfigError;
use client::net::chat::ChatApi;
use client::net::public::{VERIFICATION_FAILED_MESSAGE, verify_booking_link};
use client::net::resources::{
    BookingDraft, BookingEditor, DEFAULT_RECURRENCE, ImageUpload, ServiceDraft, ServiceEditor, SlotDraft,
    SlotEditor, dashboard, update_profile,
};
use client::net::types::{Booking, BookingStatus, Credentials, Registration};
use client::state::wizard::{ContactDetails, WizardStep};
use client::util::format::{format_date_label, price_label, slot_label};
use client::util::navigate::TracingNavigator;
use client::{ApiClient, ApiError, BookingWizard, ClientConfig, Session, VerificationBus, WizardError};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;

const ACCESS_COOKIE: &str = "access_token";
const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{}", .0.display_message("request failed"))]
    Api(#[from] ApiError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing credentials; pass --email and --password or set SLOTBOOK_EMAIL / SLOTBOOK_PASSWORD")]
    MissingCredentials,
    #[error("not logged in; pass --access-token/--refresh-token or --email/--password")]
    NotLoggedIn,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("input closed")]
    InputClosed,
}

#[derive(Parser, Debug)]
#[command(name = "slotbook", about = "Slotbook booking API CLI")]
struct Cli {
    /// Backend origin; overrides SLOTBOOK_API_URL from the environment.
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, env = "SLOTBOOK_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[arg(long, env = "SLOTBOOK_REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: Option<String>,

    #[arg(long, env = "SLOTBOOK_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "SLOTBOOK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

struct CliContext {
    config: ClientConfig,
    api: ApiClient,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Auth(AuthCommand),
    Services(ServicesCommand),
    Slots(SlotsCommand),
    Bookings(BookingsCommand),
    /// Show the provider dashboard, or change the public booking slug.
    Me {
        #[arg(long)]
        slug: Option<String>,
    },
    /// Book a service from a provider interactively.
    Book { slug: String },
    /// Confirm a booking with the token (or full link) from its email.
    VerifyBooking { token: String },
    Chat(ChatCommand),
}

#[derive(Args, Debug)]
struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
enum AuthSubcommand {
    Check,
    Login,
    Logout,
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Defaults to --password.
        #[arg(long)]
        password2: Option<String>,
    },
    /// Submit the emailed verification code, then log in.
    Verify {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        password: String,
    },
    Resend {
        #[arg(long)]
        email: String,
    },
    /// Log in with a Google ID token.
    Google { credential: String },
}

#[derive(Args, Debug)]
struct ServicesCommand {
    #[command(subcommand)]
    command: ServicesSubcommand,
}

#[derive(Args, Debug)]
struct ServiceFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Duration as `HH:MM:SS`.
    #[arg(long)]
    duration: Option<String>,
    #[arg(long)]
    price: Option<String>,
    /// Featured image file.
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ServicesSubcommand {
    List,
    Get { id: i64 },
    Create(ServiceFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: ServiceFields,
    },
    Delete { id: i64 },
}

#[derive(Args, Debug)]
struct SlotsCommand {
    #[command(subcommand)]
    command: SlotsSubcommand,
}

#[derive(Args, Debug)]
struct SlotFields {
    /// Date as `YYYY-MM-DD`.
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    start_time: Option<String>,
    #[arg(long)]
    end_time: Option<String>,
    #[arg(long)]
    recurring: Option<bool>,
    #[arg(long)]
    recurrence_pattern: Option<String>,
}

#[derive(Subcommand, Debug)]
enum SlotsSubcommand {
    List,
    Get { id: i64 },
    Create(SlotFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: SlotFields,
    },
    Delete { id: i64 },
}

#[derive(Args, Debug)]
struct BookingsCommand {
    #[command(subcommand)]
    command: BookingsSubcommand,
}

#[derive(Args, Debug)]
struct BookingFields {
    #[arg(long)]
    customer_name: Option<String>,
    #[arg(long)]
    customer_email: Option<String>,
    #[arg(long)]
    customer_phone: Option<String>,
    #[arg(long)]
    service_id: Option<i64>,
    /// Date as `YYYY-MM-DD`.
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    start_time: Option<String>,
    /// pending, confirmed or cancelled.
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    email_sent: Option<bool>,
}

#[derive(Subcommand, Debug)]
enum BookingsSubcommand {
    List,
    Get { id: i64 },
    Create(BookingFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: BookingFields,
    },
    Delete { id: i64 },
}

#[derive(Args, Debug)]
struct ChatCommand {
    #[command(subcommand)]
    command: ChatSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatSubcommand {
    Sessions,
    New,
    History { session_id: String },
    Send { session_id: String, message: String },
    Clear { session_id: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,client=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }

    tracing::debug!(base_url = %config.base_url, "client configured");
    let api = ApiClient::new(&config, Arc::new(TracingNavigator))?;
    if let Some(token) = &cli.access_token {
        api.seed_cookie(ACCESS_COOKIE, token)?;
    }
    if let Some(token) = &cli.refresh_token {
        api.seed_cookie(REFRESH_COOKIE, token)?;
    }

    let ctx = CliContext { config, api, email: cli.email, password: cli.password };

    match cli.command {
        Command::Auth(auth) => run_auth(&ctx, auth).await,
        Command::Services(services) => run_services(&ctx, services).await,
        Command::Slots(slots) => run_slots(&ctx, slots).await,
        Command::Bookings(bookings) => run_bookings(&ctx, bookings).await,
        Command::Me { slug } => run_me(&ctx, slug).await,
        Command::Book { slug } => run_book(&ctx, slug).await,
        Command::VerifyBooking { token } => {
            let message = verify_booking_link(&ctx.api, token_from_link(&token)).await?;
            println!("{message}");
            Ok(())
        }
        Command::Chat(chat) => run_chat(&ctx, chat).await,
    }
}

// =============================================================================
// Auth
// =============================================================================

fn credentials(ctx: &CliContext) -> Result<Credentials, CliError> {
    match (&ctx.email, &ctx.password) {
        (Some(email), Some(password)) => Ok(Credentials { email: email.clone(), password: password.clone() }),
        _ => Err(CliError::MissingCredentials),
    }
}

/// Session for provider commands: logs in with credentials when given,
/// otherwise relies on seeded token cookies.
async fn provider_session(ctx: &CliContext) -> Result<Session, CliError> {
    let session = Session::new(ctx.api.clone());
    if ctx.email.is_some() && ctx.password.is_some() {
        session.login(&credentials(ctx)?).await?;
    } else if !session.check_auth().await {
        return Err(CliError::NotLoggedIn);
    }
    Ok(session)
}

async fn run_auth(ctx: &CliContext, auth: AuthCommand) -> Result<(), CliError> {
    let session = Session::new(ctx.api.clone());
    match auth.command {
        AuthSubcommand::Check => {
            session.check_auth().await;
            let state = session.snapshot();
            print_json(&serde_json::json!({
                "is_authenticated": state.is_authenticated,
                "error": state.error,
            }))
        }
        AuthSubcommand::Login => {
            let payload = session.login(&credentials(ctx)?).await?;
            print_json(&payload)
        }
        AuthSubcommand::Logout => {
            session.logout().await;
            println!("logged out");
            Ok(())
        }
        AuthSubcommand::Register { email, username, password, password2 } => {
            let password2 = password2.unwrap_or_else(|| password.clone());
            let detail = session.register(&Registration { email, username, password, password2 }).await?;
            println!("{detail}");
            Ok(())
        }
        AuthSubcommand::Verify { email, code, password } => {
            let payload = session.verify_registration(&email, &code, &password).await?;
            print_json(&payload)
        }
        AuthSubcommand::Resend { email } => {
            let message = session.resend_code(&email).await?;
            println!("{}", message.unwrap_or_else(|| "verification code sent".to_owned()));
            Ok(())
        }
        AuthSubcommand::Google { credential } => {
            let payload = session.login_with_google(&credential).await?;
            print_json(&payload)
        }
    }
}

// =============================================================================
// Provider resources
// =============================================================================

async fn run_services(ctx: &CliContext, services: ServicesCommand) -> Result<(), CliError> {
    let session = provider_session(ctx).await?;
    let editor = ServiceEditor::new(session.api().clone());
    match services.command {
        ServicesSubcommand::List => print_json(&editor.list().await?),
        ServicesSubcommand::Get { id } => print_json(&editor.get(id).await?),
        ServicesSubcommand::Create(fields) => {
            let draft = ServiceDraft {
                name: required(fields.name, "--name")?,
                description: fields.description.unwrap_or_default(),
                duration: required(fields.duration, "--duration")?,
                price: required(fields.price, "--price")?,
                image: fields.image.as_deref().map(read_image).transpose()?,
            };
            print_json(&editor.create(&draft).await?.body)
        }
        ServicesSubcommand::Update { id, fields } => {
            let original = ServiceDraft::from(&editor.get(id).await?);
            let mut edited = original.clone();
            apply(&mut edited.name, fields.name);
            apply(&mut edited.description, fields.description);
            apply(&mut edited.duration, fields.duration);
            apply(&mut edited.price, fields.price);
            edited.image = fields.image.as_deref().map(read_image).transpose()?;
            print_update(editor.update_if_changed(id, &original, &edited).await?.map(|r| r.body))
        }
        ServicesSubcommand::Delete { id } => {
            editor.delete(id).await?;
            println!("deleted service {id}");
            Ok(())
        }
    }
}

async fn run_slots(ctx: &CliContext, slots: SlotsCommand) -> Result<(), CliError> {
    let session = provider_session(ctx).await?;
    let editor = SlotEditor::new(session.api().clone());
    match slots.command {
        SlotsSubcommand::List => print_json(&editor.list().await?),
        SlotsSubcommand::Get { id } => print_json(&editor.get(id).await?),
        SlotsSubcommand::Create(fields) => {
            let draft = SlotDraft {
                date: parse_date(&required(fields.date, "--date")?)?,
                start_time: required(fields.start_time, "--start-time")?,
                end_time: required(fields.end_time, "--end-time")?,
                is_recurring: fields.recurring.unwrap_or(false),
                recurrence_pattern: fields.recurrence_pattern.unwrap_or_else(|| DEFAULT_RECURRENCE.to_owned()),
            };
            print_json(&editor.create(&draft).await?.body)
        }
        SlotsSubcommand::Update { id, fields } => {
            let original = SlotDraft::from(&editor.get(id).await?);
            let mut edited = original.clone();
            if let Some(date) = fields.date {
                edited.date = parse_date(&date)?;
            }
            apply(&mut edited.start_time, fields.start_time);
            apply(&mut edited.end_time, fields.end_time);
            apply(&mut edited.is_recurring, fields.recurring);
            apply(&mut edited.recurrence_pattern, fields.recurrence_pattern);
            print_update(editor.update_if_changed(id, &original, &edited).await?.map(|r| r.body))
        }
        SlotsSubcommand::Delete { id } => {
            editor.delete(id).await?;
            println!("deleted slot {id}");
            Ok(())
        }
    }
}

async fn run_bookings(ctx: &CliContext, bookings: BookingsCommand) -> Result<(), CliError> {
    let session = provider_session(ctx).await?;
    let editor = BookingEditor::new(session.api().clone());
    match bookings.command {
        BookingsSubcommand::List => print_json(&editor.list().await?),
        BookingsSubcommand::Get { id } => print_json(&editor.get(id).await?),
        BookingsSubcommand::Create(fields) => {
            let draft = BookingDraft {
                customer_name: required(fields.customer_name, "--customer-name")?,
                customer_email: required(fields.customer_email, "--customer-email")?,
                customer_phone: fields.customer_phone.unwrap_or_default(),
                service_id: required(fields.service_id, "--service-id")?,
                date: parse_date(&required(fields.date, "--date")?)?,
                status: fields.status.as_deref().map(parse_status).transpose()?.unwrap_or_default(),
                start_time: required(fields.start_time, "--start-time")?,
                email_sent: fields.email_sent.unwrap_or(false),
            };
            print_json(&editor.create(&draft).await?.body)
        }
        BookingsSubcommand::Update { id, fields } => {
            let booking = editor.get(id).await?;
            let original = booking_draft(&booking, &fields)?;
            let mut edited = original.clone();
            apply(&mut edited.customer_name, fields.customer_name);
            apply(&mut edited.customer_email, fields.customer_email);
            apply(&mut edited.customer_phone, fields.customer_phone);
            apply(&mut edited.service_id, fields.service_id);
            apply(&mut edited.start_time, fields.start_time);
            apply(&mut edited.email_sent, fields.email_sent);
            if let Some(status) = fields.status.as_deref() {
                edited.status = parse_status(status)?;
            }
            if let Some(date) = fields.date.as_deref() {
                edited.date = parse_date(date)?;
            }
            print_update(editor.update_if_changed(id, &original, &edited).await?.map(|r| r.body))
        }
        BookingsSubcommand::Delete { id } => {
            editor.delete(id).await?;
            println!("deleted booking {id}");
            Ok(())
        }
    }
}

/// Editable view of a stored booking. The server reports the start as an
/// ISO datetime; date and time are split out of it.
fn booking_draft(booking: &Booking, fields: &BookingFields) -> Result<BookingDraft, CliError> {
    let (date, time) = booking
        .start_time
        .split_once(['T', ' '])
        .map_or((None, booking.start_time.as_str()), |(d, t)| (Some(d), t));
    let date = match (date, fields.date.as_deref()) {
        (Some(date), _) => parse_date(date)?,
        (None, Some(date)) => parse_date(date)?,
        (None, None) => return Err(CliError::InvalidArgument("--date is required for this booking".to_owned())),
    };
    let service_id = booking
        .service_ref()
        .or(fields.service_id)
        .ok_or_else(|| CliError::InvalidArgument("--service-id is required for this booking".to_owned()))?;

    Ok(BookingDraft {
        customer_name: booking.customer_name.clone(),
        customer_email: booking.customer_email.clone(),
        customer_phone: booking.customer_phone.clone(),
        service_id,
        date,
        status: booking.status,
        start_time: time.get(..5).unwrap_or(time).to_owned(),
        email_sent: booking.email_sent,
    })
}

async fn run_me(ctx: &CliContext, slug: Option<String>) -> Result<(), CliError> {
    let session = provider_session(ctx).await?;
    match slug {
        Some(slug) => print_json(&update_profile(session.api(), &slug).await?.body),
        None => print_json(&dashboard(session.api()).await?),
    }
}

// =============================================================================
// Booking wizard
// =============================================================================

struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self { lines: BufReader::new(tokio::io::stdin()).lines() }
    }

    async fn ask(&mut self, label: &str) -> Result<String, CliError> {
        print!("{label}");
        std::io::stdout().flush()?;
        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_owned()),
            None => Err(CliError::InputClosed),
        }
    }

    async fn ask_optional(&mut self, label: &str) -> Result<Option<String>, CliError> {
        let answer = self.ask(label).await?;
        Ok((!answer.is_empty()).then_some(answer))
    }
}

async fn run_book(ctx: &CliContext, slug: String) -> Result<(), CliError> {
    let mut wizard = BookingWizard::new(slug);
    let mut prompt = Prompt::new();

    let services = wizard.load_services(&ctx.api).await?;
    if services.is_empty() {
        println!("This provider offers no services yet.");
        return Ok(());
    }

    loop {
        match wizard.step().clone() {
            WizardStep::ServiceSelection { .. } => {
                println!("\nServices:");
                for (i, service) in wizard.services().iter().enumerate() {
                    println!("  {}. {} ({}, {})", i + 1, service.name, service.duration, price_label(&service.price));
                }
                let answer = prompt.ask("Choose a service: ").await?;
                let picked = answer
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| wizard.services().get(i))
                    .map(|s| s.id);
                if let Some(id) = picked {
                    wizard.select_service(id)?;
                }
                report(wizard.continue_to_dates());
            }
            WizardStep::DateSelection { .. } => {
                let answer = prompt.ask("Date (YYYY-MM-DD, or 'back'): ").await?;
                if answer.eq_ignore_ascii_case("back") {
                    report(wizard.back());
                    continue;
                }
                let today = Local::now().date_naive();
                match parse_date(&answer) {
                    Ok(date) => {
                        if report(wizard.pick_date(date, today)) {
                            match wizard.fetch_slots(&ctx.api).await {
                                Ok(0) | Err(_) => print_banner(&wizard),
                                Ok(_) => println!("\nFree slots on {}:", format_date_label(date, today)),
                            }
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            }
            WizardStep::SlotSelection { slots, .. } => {
                for (i, slot) in slots.iter().enumerate() {
                    println!("  {}. {}", i + 1, slot_label(slot));
                }
                let answer = prompt.ask("Choose a slot (or 'back'): ").await?;
                if answer.eq_ignore_ascii_case("back") {
                    report(wizard.back());
                    continue;
                }
                match answer.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
                    Some(index) => {
                        report(wizard.choose_slot(index));
                    }
                    None => println!("Enter a slot number."),
                }
            }
            WizardStep::ContactForm { slot, .. } => {
                println!("\nBooking {}", slot_label(&slot));
                let contact = ContactDetails {
                    name: prompt.ask("Name: ").await?,
                    email: prompt.ask("Email: ").await?,
                    phone: prompt.ask_optional("Phone (optional): ").await?,
                    notes: prompt.ask_optional("Notes (optional): ").await?,
                };
                if wizard.submit(&contact, &ctx.api).await.is_err() {
                    print_banner(&wizard);
                }
            }
            WizardStep::PendingVerification { receipt } => {
                println!(
                    "\n{}",
                    receipt
                        .message
                        .as_deref()
                        .unwrap_or("Booking received. Check your email for the confirmation link.")
                );
                println!("Reference: {}", receipt.reference);
                return await_confirmation(ctx, &mut wizard, prompt).await;
            }
            WizardStep::Confirmed { message, .. } => {
                println!("{message}");
                return Ok(());
            }
        }
    }
}

/// Read pasted links until one verifies, then wake the wizard through the
/// bus. Gives up quietly when stdin closes.
fn spawn_link_reader(api: ApiClient, bus: VerificationBus, mut prompt: Prompt) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Ok(link) = prompt.ask("Paste the confirmation link (or token): ").await else {
                return;
            };
            match verify_booking_link(&api, token_from_link(&link)).await {
                Ok(message) => {
                    bus.confirm(message);
                    return;
                }
                Err(err) => println!("{}", err.display_message(VERIFICATION_FAILED_MESSAGE)),
            }
        }
    })
}

async fn await_confirmation(ctx: &CliContext, wizard: &mut BookingWizard, prompt: Prompt) -> Result<(), CliError> {
    let bus = VerificationBus::new();
    let mut reader = spawn_link_reader(ctx.api.clone(), bus.clone(), prompt);

    let outcome = tokio::select! {
        biased;
        outcome = wizard.await_verification(&bus, ctx.config.verification_timeout) => Some(outcome),
        _ = &mut reader => None,
    };
    reader.abort();

    let outcome = match outcome {
        Some(outcome) => outcome,
        None if bus.is_confirmed() => wizard.await_verification(&bus, Duration::ZERO).await,
        None => {
            println!("Booking stays pending until the emailed link is opened.");
            return Ok(());
        }
    };

    match outcome {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(err) => {
            print_banner(wizard);
            Err(err.into())
        }
    }
}

/// Print a wizard rejection; true when the transition went through.
fn report(result: Result<(), WizardError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            println!("{err}");
            false
        }
    }
}

fn print_banner(wizard: &BookingWizard) {
    if let Some(banner) = wizard.banner() {
        println!("{banner}");
    }
}

// =============================================================================
// Chat
// =============================================================================

async fn run_chat(ctx: &CliContext, chat: ChatCommand) -> Result<(), CliError> {
    let session = provider_session(ctx).await?;
    let chat_api = ChatApi::new(session.api().clone());
    match chat.command {
        ChatSubcommand::Sessions => print_json(&chat_api.sessions().await?),
        ChatSubcommand::New => print_json(&chat_api.create_session().await?),
        ChatSubcommand::History { session_id } => print_json(&chat_api.history(&session_id).await?),
        ChatSubcommand::Send { session_id, message } => {
            println!("{}", chat_api.send_message(&session_id, &message).await?);
            Ok(())
        }
        ChatSubcommand::Clear { session_id } => {
            chat_api.clear_history(&session_id).await?;
            println!("cleared chat {session_id}");
            Ok(())
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_update(body: Option<serde_json::Value>) -> Result<(), CliError> {
    match body {
        Some(body) => print_json(&body),
        None => {
            println!("no changes");
            Ok(())
        }
    }
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T, CliError> {
    value.ok_or_else(|| CliError::InvalidArgument(format!("{flag} is required")))
}

fn apply<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CliError::InvalidArgument(format!("expected a YYYY-MM-DD date, got `{raw}`")))
}

fn parse_status(raw: &str) -> Result<BookingStatus, CliError> {
    raw.parse().map_err(CliError::InvalidArgument)
}

fn read_image(path: &Path) -> Result<ImageUpload, CliError> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_owned();
    let mime = match path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("gif") => Some("image/gif"),
        Some("webp") => Some("image/webp"),
        _ => None,
    };
    Ok(ImageUpload { filename, mime: mime.map(ToOwned::to_owned), bytes })
}

/// Accept either a bare token or a full `/booking/verify/<token>` link.
fn token_from_link(input: &str) -> &str {
    let trimmed = input.trim().trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
