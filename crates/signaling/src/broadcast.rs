//! Event-Broadcaster – Sendet Pushes an einzelne Verbindungen
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen
//! Clients. Matched-Benachrichtigungen, Signaling-Zustellungen und
//! Chat-Nachrichten laufen ueber ihn an die jeweilige Gegenstelle.

use dashmap::DashMap;
use plauderei_core::types::ConnectionId;
use plauderei_protocol::control::ControlMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Client
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer verbundenen Client-Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub verbindung: ConnectionId,
    pub tx: mpsc::Sender<ControlMessage>,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, nachricht: ControlMessage) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.verbindung, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.verbindung, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Client-Sender, indiziert nach ConnectionId
    clients: DashMap<ConnectionId, ClientSender>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
            }),
        }
    }

    /// Registriert einen neuen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und sendet via TCP.
    pub fn client_registrieren(&self, verbindung: ConnectionId) -> mpsc::Receiver<ControlMessage> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        let sender = ClientSender { verbindung, tx };
        self.inner.clients.insert(verbindung, sender);
        tracing::debug!(verbindung = %verbindung, "Client im Broadcaster registriert");
        rx
    }

    /// Entfernt einen Client aus dem Broadcaster
    pub fn client_entfernen(&self, verbindung: ConnectionId) {
        self.inner.clients.remove(&verbindung);
        tracing::debug!(verbindung = %verbindung, "Client aus Broadcaster entfernt");
    }

    /// Sendet eine Nachricht an eine einzelne Verbindung
    ///
    /// Gibt `true` zurueck wenn der Client gefunden und die Nachricht
    /// eingereiht wurde.
    pub fn an_verbindung_senden(
        &self,
        verbindung: ConnectionId,
        nachricht: ControlMessage,
    ) -> bool {
        match self.inner.clients.get(&verbindung) {
            Some(sender) => sender.senden(nachricht),
            None => {
                tracing::debug!(verbindung = %verbindung, "Senden an unbekannte Verbindung");
                false
            }
        }
    }

    /// Gibt die Anzahl der registrierten Clients zurueck
    pub fn client_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, verbindung: ConnectionId) -> bool {
        self.inner.clients.contains_key(&verbindung)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_nachricht(id: u32) -> ControlMessage {
        ControlMessage::ping(id, 12345)
    }

    #[tokio::test]
    async fn client_registrieren_und_senden() {
        let broadcaster = EventBroadcaster::neu();
        let verbindung = ConnectionId::new();

        let mut rx = broadcaster.client_registrieren(verbindung);
        assert!(broadcaster.ist_registriert(verbindung));

        let gesendet = broadcaster.an_verbindung_senden(verbindung, test_nachricht(1));
        assert!(gesendet);

        let empfangen = rx.try_recv().expect("Nachricht muss vorhanden sein");
        assert_eq!(empfangen.request_id, 1);
    }

    #[tokio::test]
    async fn senden_an_unbekannte_verbindung() {
        let broadcaster = EventBroadcaster::neu();
        assert!(!broadcaster.an_verbindung_senden(ConnectionId::new(), test_nachricht(1)));
    }

    #[tokio::test]
    async fn senden_nach_entfernen_schlaegt_fehl() {
        let broadcaster = EventBroadcaster::neu();
        let verbindung = ConnectionId::new();

        let _rx = broadcaster.client_registrieren(verbindung);
        broadcaster.client_entfernen(verbindung);

        assert!(!broadcaster.ist_registriert(verbindung));
        assert!(!broadcaster.an_verbindung_senden(verbindung, test_nachricht(2)));
    }

    #[tokio::test]
    async fn volle_queue_verwirft_nachricht() {
        let broadcaster = EventBroadcaster::neu();
        let verbindung = ConnectionId::new();
        let _rx = broadcaster.client_registrieren(verbindung);

        for i in 0..SEND_QUEUE_GROESSE as u32 {
            assert!(broadcaster.an_verbindung_senden(verbindung, test_nachricht(i)));
        }
        // Queue ist voll, Nachricht wird verworfen statt zu blockieren
        assert!(!broadcaster.an_verbindung_senden(verbindung, test_nachricht(999)));
    }
}
