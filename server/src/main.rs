//! Plauderei Server – Einstiegspunkt
//!
//! Laedt die Konfiguration (Pfad via PLAUDEREI_CONFIG, Standard
//! "plauderei.toml"), initialisiert das Logging und startet den Server.

use plauderei_server::config::{LoggingEinstellungen, ServerConfig};
use plauderei_server::Server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_pfad =
        std::env::var("PLAUDEREI_CONFIG").unwrap_or_else(|_| "plauderei.toml".to_string());
    let config = ServerConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging);

    tracing::info!(
        config = %config_pfad,
        adresse = %config.tcp_bind_adresse(),
        "Konfiguration geladen"
    );

    Server::neu(config).starten().await
}

/// Initialisiert tracing-subscriber gemaess Konfiguration
///
/// RUST_LOG uebersteuert das konfigurierte Level.
fn logging_initialisieren(logging: &LoggingEinstellungen) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
