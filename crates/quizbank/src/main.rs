mod app;
mod config;
mod handlers;
mod services;
mod state;
mod storage;

use anyhow::Result;
use clap::Parser;
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{app::create_app, config::Config, state::AppState};

/// Quizbank - Browse trivia questions page by page
#[derive(Parser, Debug)]
#[command(name = "quizbank")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,

    /// Path to the SQLite question database
    #[arg(long, short, env = "SQLITE_PATH")]
    database: Option<String>,

    /// Create the database and fill it with N generated questions before
    /// serving. Skipped when the database already holds questions.
    #[arg(long, value_name = "N")]
    seed_demo: Option<u32>,

    /// Serve generated demo questions from memory instead of a database
    #[arg(long)]
    in_memory: bool,
}

impl Cli {
    /// Layers command line overrides on top of the environment.
    fn config(&self) -> Config {
        self.apply(Config::from_env())
    }

    fn apply(&self, mut config: Config) -> Config {
        if let Some(path) = &self.database {
            config.sqlite_path = path.clone();
        }
        if let Some(count) = self.seed_demo {
            config.seed_demo_questions = count;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizbank=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cli.config();

    let state = build_state(&cli, &config).await?;

    let overlaps = state.question_service.audit_answer_overlaps().await?;
    if !overlaps.is_empty() {
        tracing::warn!(
            count = overlaps.len(),
            "Questions list their correct answer among the incorrect ones"
        );
    }

    // Build the application router
    let app = create_app(state, config.request_timeout());

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Picks the storage backend requested on the command line.
async fn build_state(cli: &Cli, config: &Config) -> Result<AppState> {
    if cli.in_memory {
        AppState::with_demo_data(config.demo_question_count())
    } else {
        AppState::new(config).await
    }
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
