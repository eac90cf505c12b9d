// Nexus Agent Backend - HTTP entrypoint

use std::fmt::Write as FmtWrite;
use std::fs::OpenOptions;
use std::io::LineWriter;

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use nexus_agent_backend::config::Config;
use nexus_agent_backend::{app, AppState};

/// Custom time formatter: [HH:mm:ss] [backend]
#[derive(Clone)]
struct BackendTimer;

impl FormatTime for BackendTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(w, "[{}] [backend]", now.format("%H:%M:%S"))
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables before reading LOG_FILE
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Stdout always; the file layer only when the log file can be opened
    let file_writer = match OpenOptions::new().create(true).append(true).open(&config.log_file) {
        Ok(file) => Some(tracing_appender::non_blocking(LineWriter::new(file))),
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", config.log_file, e);
            None
        }
    };
    let (file_layer, _guard) = match file_writer {
        Some((non_blocking, guard)) => (
            Some(
                fmt::layer()
                    .with_timer(BackendTimer)
                    .with_target(false)
                    .with_level(false)
                    .with_ansi(false)
                    .with_writer(non_blocking),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nexus_agent_backend=info,tower_http=info".into()),
        )
        .with(
            fmt::layer()
                .with_timer(BackendTimer)
                .with_target(false)
                .with_level(false)
                .with_ansi(true),
        )
        .with(file_layer)
        .init();

    if let Err(e) = config.validate() {
        tracing::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let state = match AppState::from_config(config.clone()) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize Realtime Database client: {}", e);
            std::process::exit(1);
        }
    };

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting Nexus Agent Backend on {} (model {})", addr, config.gemini_model);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!("Server error: {}", e);
    }
}
