//! A small web application for tracking student attendance.
//!
//! Students and their daily attendance live in a SQLite database managed through
//! [`manager::AttendanceManager`]. The [`build_router`] function exposes it as a JSON API plus a
//! CSV export, and three static pages that drive the API from the browser.

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod extract;
pub mod manager;
pub mod models;
pub mod routes;
pub mod schema;
pub mod state;

use crate::config::Settings;
use crate::manager::AttendanceManager;
use crate::routes::{
    attendance_page, create_student_handler, export_handler, index_page, list_attendance_handler,
    list_students_handler, mark_attendance_handler, students_page,
};
use crate::state::AppState;

/// Installs the global `tracing` subscriber, filtered by `RUST_LOG` and defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

/// Connects to the configured database and runs the startup routine: create the schema if it
/// is absent and seed an empty roster when enabled.
pub fn open_manager(settings: &Settings) -> Result<AttendanceManager> {
    let mut manager = AttendanceManager::connect(&settings.database.url)
        .with_context(|| format!("failed to open database {}", settings.database.url))?;

    manager
        .initialize(settings.database.seed_sample_students)
        .context("failed to initialize database schema")?;

    Ok(manager)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/students", get(students_page))
        .route("/attendance", get(attendance_page))
        .route(
            "/api/students",
            get(list_students_handler).post(create_student_handler),
        )
        .route(
            "/api/attendance",
            get(list_attendance_handler).post(mark_attendance_handler),
        )
        .route("/attendance/export", get(export_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the HTTP server until Ctrl+C or SIGTERM.
pub async fn start_server(settings: Settings) -> Result<()> {
    info!("Initializing database...");
    let manager = open_manager(&settings)?;
    let app = build_router(AppState::new(manager));

    let address = settings.server.address();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
