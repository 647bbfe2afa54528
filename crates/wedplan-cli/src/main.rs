//! wedplan - command-line front end for the wedding-planning dashboard data.
//!
//! Wires configuration, logging, the storage gateway and the data provider
//! together, then runs one command against them.

use std::io;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Local;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wedplan_core::auth::Session;
use wedplan_core::local::LocalStorage;
use wedplan_core::models::{Client, Event, PaymentStatus, TeamMember, Vendor, VendorBooking};
use wedplan_core::signal::{self, RefreshSignal, DEFAULT_FLAGS};
use wedplan_core::summary::{upcoming_events, DashboardSummary};
use wedplan_core::utils::{format_currency, format_date, truncate_string};
use wedplan_core::{CacheStatus, Config, DataProvider, StorageGateway};

// ============================================================================
// Constants
// ============================================================================

/// Directory for a daily rolling log file, in addition to stderr
const LOG_DIR_ENV: &str = "WEDPLAN_LOG_DIR";

/// Number of upcoming events listed by `summary`
const UPCOMING_LIMIT: usize = 5;

/// Column width for event titles in the summary listing
const TITLE_WIDTH: usize = 32;

const USAGE: &str = "usage: wedplan [summary | seed | watch | signal <flag> | login <username> | logout]";

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug). The returned
/// guard must stay alive for the file writer to flush.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "wedplan.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

struct Services {
    config: Config,
    provider: Arc<DataProvider>,
    local: Arc<LocalStorage>,
}

impl Services {
    fn start() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let gateway = Arc::new(StorageGateway::open(&config));
        let provider = Arc::new(DataProvider::new(gateway, config.cache_settings()));

        let local = match config.data_dir() {
            Some(dir) => LocalStorage::open(&dir)?,
            None => {
                warn!("No data directory, local storage kept in memory");
                LocalStorage::in_memory()
            }
        };

        Ok(Self {
            config,
            provider,
            local: Arc::new(local),
        })
    }

    fn signal(&self) -> RefreshSignal {
        RefreshSignal::new(Arc::clone(&self.local))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();
    info!("wedplan starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("summary");

    let services = Services::start()?;
    if !services.provider.gateway().is_available() {
        eprintln!("Warning: storage unavailable, showing empty data");
    }

    match command {
        "summary" => summary(&services).await,
        "seed" => seed(&services).await,
        "watch" => watch(&services).await,
        "signal" => match args.get(1) {
            Some(flag) => {
                services.signal().raise(flag)?;
                println!("Raised {}", flag);
                Ok(())
            }
            None => bail!("missing flag name\n{}", USAGE),
        },
        "login" => match args.get(1) {
            Some(username) => {
                let mut session = Session::new(Arc::clone(&services.local));
                let data = session.sign_in(username)?;
                println!("Signed in as {}", data.username);
                Ok(())
            }
            None => bail!("missing username\n{}", USAGE),
        },
        "logout" => {
            let mut session = Session::new(Arc::clone(&services.local));
            session.load()?;
            session.sign_out(&services.provider).await?;
            println!("Signed out");
            Ok(())
        }
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("unknown command: {}\n{}", other, USAGE),
    }
}

/// Print headline numbers and the next few events
async fn summary(services: &Services) -> Result<()> {
    let provider = &services.provider;
    let snapshot = provider.refresh(false).await;
    let state = provider.state();
    if let Some(ref e) = state.error {
        eprintln!("Warning: refresh failed ({}), showing last loaded data", e);
    }

    let mut session = Session::new(Arc::clone(&services.local));
    match session.load() {
        Ok(true) => println!(
            "Signed in as {} ({} min left)",
            session.username().unwrap_or_default(),
            session
                .data
                .as_ref()
                .map(|d| d.minutes_until_expiry())
                .unwrap_or_default()
        ),
        Ok(false) => println!("Not signed in"),
        Err(e) => warn!(error = %e, "Failed to load session"),
    }

    let today = Local::now().date_naive();
    println!("{}", DashboardSummary::from_snapshot(&snapshot, today));

    let upcoming = upcoming_events(&snapshot, today, UPCOMING_LIMIT);
    if !upcoming.is_empty() {
        println!("\nUpcoming:");
        for event in upcoming {
            println!(
                "  {:<12} {:<width$} {:<20} {:<10} {} vendor(s)",
                format_date(&event.date),
                truncate_string(&event.title, TITLE_WIDTH),
                snapshot.resolve_client_name(event),
                event.status.to_string(),
                snapshot.bookings_for_client(event.client_id).len(),
                width = TITLE_WIDTH
            );
        }
    }

    let unsettled: Vec<_> = snapshot
        .vendor_bookings
        .iter()
        .filter(|b| !b.is_settled())
        .collect();
    if !unsettled.is_empty() {
        println!("\nAwaiting payment:");
        for booking in unsettled {
            let vendor = snapshot
                .vendor(booking.vendor_id)
                .map(|v| v.name.as_str())
                .unwrap_or("(removed vendor)");
            let client = snapshot
                .client(booking.client_id)
                .map(|c| c.name.as_str())
                .unwrap_or("(removed client)");
            println!(
                "  {:<12} {:<24} {:<20} {:>16} {}",
                format_date(&booking.event_date),
                truncate_string(vendor, 24),
                truncate_string(client, 20),
                format_currency(booking.price),
                booking.payment_status
            );
        }
    }

    if let Some(age) = provider.cache_age().await {
        println!("\nData loaded {}", age);
    }
    Ok(())
}

/// Insert a small demo data set
async fn seed(services: &Services) -> Result<()> {
    let provider = &services.provider;

    let mut budi = Client::new("Budi", "Pernikahan", "2025-01-01");
    budi.phone = "081234567890".to_string();
    budi.location = "Gedung Sate, Bandung".to_string();
    budi.services = vec!["dekorasi".to_string(), "katering".to_string()];
    let client_id = provider.add_client(budi).await?;

    let budi = provider
        .snapshot()
        .client(client_id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("client {} missing after insert", client_id))?;
    provider
        .add_event(Event::for_client(&budi, budi.event_date.clone()))
        .await?;

    let vendor = Vendor {
        name: "Dapur Ibu Catering".to_string(),
        category: "catering".to_string(),
        price: 15_000_000.0,
        services: vec!["prasmanan".to_string()],
        ..Default::default()
    };
    let price = vendor.price;
    let vendor_id = provider.add_vendor(vendor).await?;

    provider
        .add_vendor_booking(VendorBooking {
            client_id,
            vendor_id,
            event_date: budi.event_date.clone(),
            price,
            payment_status: PaymentStatus::Partial,
            ..Default::default()
        })
        .await?;

    provider
        .add_team_member(TeamMember {
            name: "Agus".to_string(),
            role: "coordinator".to_string(),
            skills: vec!["MC".to_string()],
            ..Default::default()
        })
        .await?;

    services.signal().raise(signal::CLIENT_ADDED)?;
    println!(
        "Seeded client #{} with one event and a {} booking",
        client_id,
        format_currency(price)
    );
    Ok(())
}

/// Keep the cache live: staleness timer, refresh flags, and a status line on
/// every change. Runs until Ctrl-C.
async fn watch(services: &Services) -> Result<()> {
    let provider = &services.provider;
    let timer = provider.spawn_staleness_timer();
    let watcher = signal::spawn_signal_watcher(
        provider,
        services.signal(),
        DEFAULT_FLAGS.iter().map(|s| s.to_string()).collect(),
        services.config.flag_poll_interval(),
    );

    let mut rx = provider.subscribe();
    provider.refresh(false).await;
    println!("Watching for changes (Ctrl-C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                match state.status {
                    CacheStatus::Fresh => println!(
                        "[fresh] {} clients, {} events, {} bookings",
                        state.snapshot.clients.len(),
                        state.snapshot.events.len(),
                        state.snapshot.vendor_bookings.len()
                    ),
                    CacheStatus::Error => println!(
                        "[error] {}",
                        state.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
                    ),
                    CacheStatus::Stale => {
                        // Reload straight away so the view never sits on stale data
                        provider.refresh(false).await;
                    }
                    CacheStatus::Loading => {}
                }
            }
        }
    }

    timer.abort();
    watcher.abort();
    info!("wedplan watch stopped");
    Ok(())
}
