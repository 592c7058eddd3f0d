//! Form Relay web server.
//!
//! Loads the form configuration once, then serves the contact form endpoint
//! until SIGINT or SIGTERM. Pass `--disable-mail` to run the full pipeline
//! without talking to the SMTP relay.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formrelay::config::delivery_mode_from_args;
use formrelay::mail::smtp_transport;
use formrelay::{build_router, AppState, DeliveryMode, FormConfig, MailDispatcher, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("form_relay_starting");

    // Load configuration; any problem here is fatal
    let server = ServerConfig::from_env();
    let form = FormConfig::from_path(&server.form_config_path).with_context(|| {
        format!(
            "Failed to load form configuration from {}",
            server.form_config_path
        )
    })?;

    let mode = delivery_mode_from_args(std::env::args().skip(1));

    info!(
        port = server.port,
        config_path = %server.form_config_path,
        expected_fields = form.expected_fields.len(),
        smtp_host = %form.host,
        smtp_port = form.port,
        smtp_auth = form.smtp_auth,
        smtp_security = ?form.smtp_secure,
        smtp_timeout_secs = server.smtp_timeout.as_secs(),
        "config_loaded"
    );

    if mode == DeliveryMode::Disabled {
        warn!("mail_delivery_disabled");
    }

    // Create the SMTP transport and dispatcher
    let transport =
        smtp_transport(&form, server.smtp_timeout).context("Failed to configure SMTP transport")?;
    let dispatcher = MailDispatcher::new(&form, Arc::new(transport), mode, server.smtp_timeout)
        .context("Failed to configure mail envelope")?;

    // Build the router
    let app = build_router(AppState::new(form, dispatcher));

    // Bind to address
    let addr = SocketAddr::new(server.bind_addr, server.port);
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
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
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
