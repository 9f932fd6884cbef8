//! Persistenz-Ereignisse und Senken-Trait
//!
//! Der Kern meldet Lebenszyklus-Ereignisse (Session gestartet/beendet,
//! Chat-Nachricht weitergeleitet) an eine `EreignisSenke`. Die Zustellung
//! ist fire-and-forget: eine langsame oder ausgefallene Persistenz darf
//! Matching und Relay niemals blockieren oder fehlschlagen lassen.
//! Die konkrete Implementierung erfolgt im Server-Crate via tokio-Kanaelen;
//! bei Multi-Instance-Betrieb kann sie durch NATS oder PG NOTIFY ersetzt
//! werden.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SessionId, UserId};

/// Alle Ereignisse die der Kern an den Persistenz-Kollaborateur meldet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PersistenzEreignis {
    /// Zwei Verbindungen wurden zu einer Session vermittelt
    SessionGestartet {
        session_id: SessionId,
        teilnehmer: [UserId; 2],
        gestartet_am: DateTime<Utc>,
    },
    /// Eine Session wurde beendet (Auflegen, Trennung oder Watchdog)
    SessionBeendet {
        session_id: SessionId,
        beendet_am: DateTime<Utc>,
        dauer_sek: u64,
    },
    /// Eine Chat-Nachricht wurde an den Session-Partner weitergeleitet
    ChatNachrichtGespeichert {
        von: UserId,
        an: UserId,
        inhalt: String,
        zeitstempel: DateTime<Utc>,
    },
}

/// Senke fuer Persistenz-Ereignisse
///
/// `aufnehmen` darf nicht blockieren und keinen Fehler an den Aufrufer
/// zurueckgeben – die Senke ist dafuer verantwortlich, Ereignisse zu
/// puffern oder zu verwerfen wenn die Persistenz nicht erreichbar ist.
pub trait EreignisSenke: Send + Sync + 'static {
    /// Nimmt ein Ereignis zur asynchronen Verarbeitung auf
    fn aufnehmen(&self, ereignis: PersistenzEreignis);
}

/// Senke die alle Ereignisse verwirft (fuer Tests und Betrieb ohne Archiv)
#[derive(Debug, Clone, Copy, Default)]
pub struct VerwerfendeSenke;

impl EreignisSenke for VerwerfendeSenke {
    fn aufnehmen(&self, _ereignis: PersistenzEreignis) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ereignis_ist_serde_kompatibel() {
        let event = PersistenzEreignis::SessionGestartet {
            session_id: SessionId::new(),
            teilnehmer: [UserId::new(), UserId::new()],
            gestartet_am: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let _: PersistenzEreignis = serde_json::from_str(&json).unwrap();
    }

    #[test]
    fn verwerfende_senke_schluckt_alles() {
        let senke = VerwerfendeSenke;
        senke.aufnehmen(PersistenzEreignis::SessionBeendet {
            session_id: SessionId::new(),
            beendet_am: Utc::now(),
            dauer_sek: 42,
        });
    }
}
