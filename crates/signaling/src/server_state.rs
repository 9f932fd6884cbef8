//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt alle geteilten Services und Zustands-Manager als Arc-Referenzen,
//! die sicher zwischen tokio-Tasks geteilt werden koennen.

use plauderei_core::dienste::{GeoAufloeser, TokenPruefer};
use plauderei_core::event::EreignisSenke;
use plauderei_protocol::control::{ControlMessage, ControlPayload, SessionEndeGrund, SessionEndedNotice};
use std::sync::Arc;

use crate::broadcast::EventBroadcaster;
use crate::matchmaker::Matchmaker;
use crate::registry::ConnectionRegistry;
use crate::session::SessionStore;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Maximale gleichzeitige Clients
    pub max_clients: u32,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
    /// Laendercode wenn GeoIP die Adresse nicht aufloesen kann
    pub standard_land: String,
    /// Maximale Gespraechsdauer in Sekunden (None = unbegrenzt)
    pub max_session_dauer_sek: Option<u64>,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            max_clients: 512,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
            standard_land: "US".to_string(),
            max_session_dauer_sek: None,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
///
/// Alle Manager sind Clone-Shares auf denselben inneren Zustand.
pub struct SignalingState<A, G>
where
    A: TokenPruefer + 'static,
    G: GeoAufloeser + 'static,
{
    /// Server-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Token-Pruefung beim Login
    pub auth: Arc<A>,
    /// GeoIP-Aufloesung der Peer-Adresse
    pub geo: Arc<G>,
    /// Registry aller angemeldeten Verbindungen
    pub registry: ConnectionRegistry,
    /// Aktive Gespraechs-Sessions
    pub sessions: SessionStore,
    /// Lebenszyklus-Service (Pool, Vermittlung, Trennung)
    pub vermittler: Matchmaker,
    /// Event-Broadcaster (Pushes an Clients senden)
    pub broadcaster: EventBroadcaster,
    /// Senke fuer Persistenz-Ereignisse
    pub senke: Arc<dyn EreignisSenke>,
}

impl<A, G> SignalingState<A, G>
where
    A: TokenPruefer + 'static,
    G: GeoAufloeser + 'static,
{
    /// Erstellt einen neuen SignalingState
    pub fn neu(
        config: SignalingConfig,
        auth: Arc<A>,
        geo: Arc<G>,
        senke: Arc<dyn EreignisSenke>,
    ) -> Arc<Self> {
        let registry = ConnectionRegistry::neu();
        let sessions = SessionStore::neu();
        let vermittler = Matchmaker::neu(registry.clone(), sessions.clone(), senke.clone());

        Arc::new(Self {
            config: Arc::new(config),
            auth,
            geo,
            registry,
            sessions,
            vermittler,
            broadcaster: EventBroadcaster::neu(),
            senke,
        })
    }

    /// Beendet alle Sessions ueber dem Zeitlimit und informiert die
    /// Teilnehmer (Watchdog-Durchlauf)
    ///
    /// Gibt die Anzahl beendeter Sessions zurueck. Ohne konfiguriertes
    /// Zeitlimit passiert nichts.
    pub fn session_watchdog_durchlauf(&self) -> usize {
        let Some(max_dauer_sek) = self.config.max_session_dauer_sek else {
            return 0;
        };

        let beendete = self.vermittler.abgelaufene_beenden(max_dauer_sek);
        for ende in &beendete {
            for teilnehmer in &ende.session.teilnehmer {
                self.broadcaster.an_verbindung_senden(
                    teilnehmer.verbindung,
                    ControlMessage::push(ControlPayload::SessionEnded(SessionEndedNotice {
                        session_id: ende.session.id,
                        grund: SessionEndeGrund::Zeitlimit,
                    })),
                );
            }
        }
        beendete.len()
    }
}
