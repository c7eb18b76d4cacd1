use std::{error::Error, fs::OpenOptions, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use pocketbook::{AppState, TokenConfig, build_router, count_users, graceful_shutdown};

/// The web server for pocketbook.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "POCKETBOOK_DB_PATH")]
    db_path: String,

    /// The IP address to listen on.
    #[arg(short, long, default_value = "127.0.0.1", env = "POCKETBOOK_ADDRESS")]
    address: String,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000, env = "POCKETBOOK_PORT")]
    port: u16,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC", env = "TIMEZONE")]
    timezone: String,

    /// The secret used to sign session tokens.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    secret: String,

    /// How many minutes an access token stays valid.
    #[arg(long, default_value_t = 5, env = "POCKETBOOK_ACCESS_TOKEN_MINUTES")]
    access_token_minutes: i64,

    /// How many days a refresh token stays valid.
    #[arg(long, default_value_t = 7, env = "POCKETBOOK_REFRESH_TOKEN_DAYS")]
    refresh_token_days: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging()?;

    let args = Args::parse();

    let addr: SocketAddr = format!("{}:{}", args.address, args.port).parse()?;

    let connection = Connection::open(&args.db_path)?;
    let token_config = TokenConfig {
        access_token_duration: Duration::minutes(args.access_token_minutes),
        refresh_token_duration: Duration::days(args.refresh_token_days),
    };
    let state =
        AppState::new(connection, &args.secret, &args.timezone)?.with_token_config(token_config);

    match state.db_connection.lock() {
        Ok(connection) => match count_users(&connection) {
            Ok(0) => tracing::warn!("No users have been registered yet."),
            Ok(count) => tracing::info!("Found {count} registered user(s)."),
            Err(error) => tracing::error!("Could not count users: {error}"),
        },
        Err(error) => tracing::error!("Could not acquire database lock: {error}"),
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    #[cfg(debug_assertions)]
    let router = router
        .layer(axum::middleware::from_fn(pocketbook::logging_middleware))
        .layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging() -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
