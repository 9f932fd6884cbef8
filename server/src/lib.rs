//! plauderei-server – Server-Binary-Bibliothek
//!
//! Verdrahtet die Crates zum lauffaehigen Vermittlungs-Server:
//! Konfiguration laden, Dienste aufbauen, Signaling-Server starten,
//! Persistenz-Worker und Session-Watchdog betreiben, Shutdown
//! koordinieren.

pub mod config;
pub mod dienste;
pub mod persistenz;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use plauderei_db::{MemoryChatArchiv, MemoryVerlauf};
use plauderei_signaling::{SignalingConfig, SignalingServer, SignalingState};

use crate::config::ServerConfig;
use crate::dienste::{EinfacherTokenPruefer, StatischesGeo};
use crate::persistenz::{persistenz_worker, KanalSenke};

/// Der Plauderei-Server
///
/// Haelt die Konfiguration und startet alle Komponenten.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server mit der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Server und laeuft bis zum Shutdown-Signal (Ctrl+C)
    pub async fn starten(self) -> anyhow::Result<()> {
        let config = self.config;

        tracing::info!(
            name = %config.server.name,
            max_clients = config.server.max_clients,
            "Plauderei-Server startet"
        );

        // Persistenz: Ereignis-Senke + Worker auf In-Memory-Repositories
        let (senke, ereignis_rx) = KanalSenke::neu();
        let verlauf = Arc::new(MemoryVerlauf::neu());
        let archiv = Arc::new(MemoryChatArchiv::neu());

        let worker = tokio::spawn(persistenz_worker(
            ereignis_rx,
            Arc::clone(&verlauf),
            Arc::clone(&archiv),
        ));

        // Externe Dienste
        let auth = Arc::new(EinfacherTokenPruefer);
        let geo = Arc::new(StatischesGeo::neu(config.vermittlung.land_override.clone()));

        // Signaling-Zustand
        let signaling_config = SignalingConfig {
            max_clients: config.server.max_clients,
            keepalive_sek: config.netzwerk.keepalive_sek,
            verbindungs_timeout_sek: config.netzwerk.verbindungs_timeout_sek,
            standard_land: config.vermittlung.standard_land.clone(),
            max_session_dauer_sek: config.vermittlung.max_session_dauer_sek,
        };
        let state = SignalingState::neu(signaling_config, auth, geo, Arc::new(senke));

        // Shutdown-Koordination via watch-Kanal
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(fehler = %e, "Ctrl+C-Handler fehlgeschlagen");
                return;
            }
            tracing::info!("Ctrl+C empfangen, Server faehrt herunter");
            let _ = shutdown_tx.send(true);
        });

        // Session-Watchdog (beendet Gespraeche ueber dem Zeitlimit)
        if config.vermittlung.max_session_dauer_sek.is_some() {
            let watchdog_state = Arc::clone(&state);
            let mut watchdog_shutdown = shutdown_rx.clone();
            let intervall = Duration::from_secs(config.vermittlung.watchdog_intervall_sek);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(intervall);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            let beendet = watchdog_state.session_watchdog_durchlauf();
                            if beendet > 0 {
                                tracing::info!(
                                    anzahl = beendet,
                                    "Watchdog hat abgelaufene Sessions beendet"
                                );
                            }
                        }
                        Ok(()) = watchdog_shutdown.changed() => {
                            if *watchdog_shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
            });
        }

        // TCP-Signaling-Server (blockiert bis zum Shutdown)
        let bind_addr: SocketAddr = config.tcp_bind_adresse().parse().map_err(|e| {
            anyhow::anyhow!(
                "Ungueltige Bind-Adresse '{}': {e}",
                config.tcp_bind_adresse()
            )
        })?;
        let signaling = SignalingServer::neu(Arc::clone(&state), bind_addr);
        signaling.starten(shutdown_rx).await?;

        // Repositories sind in-memory, ein Drain bringt nichts mehr
        worker.abort();

        tracing::info!("Plauderei-Server beendet");
        Ok(())
    }
}
