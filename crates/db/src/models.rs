//! Datensaetze fuer Gespraechsverlauf und Chat-Archiv

use chrono::{DateTime, Utc};
use plauderei_core::types::{SessionId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Datensatz fuer ein vermitteltes Gespraech
///
/// Wird beim Session-Start angelegt und beim Ende mit Endzeitpunkt
/// und Dauer vervollstaendigt. Ein Eintrag ohne `beendet_am` gehoert
/// zu einer noch laufenden oder abgebrochenen Session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnrufRecord {
    pub id: Uuid,
    pub session_id: SessionId,
    /// Beide Teilnehmer, Reihenfolge ohne Bedeutung
    pub teilnehmer: [UserId; 2],
    pub gestartet_am: DateTime<Utc>,
    pub beendet_am: Option<DateTime<Utc>>,
    pub dauer_sek: Option<u64>,
}

impl AnrufRecord {
    /// Legt einen neuen Eintrag fuer eine gestartete Session an
    pub fn neu(
        session_id: SessionId,
        teilnehmer: [UserId; 2],
        gestartet_am: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            teilnehmer,
            gestartet_am,
            beendet_am: None,
            dauer_sek: None,
        }
    }

    /// Prueft ob der Benutzer an diesem Gespraech beteiligt war
    pub fn betrifft(&self, benutzer: UserId) -> bool {
        self.teilnehmer.contains(&benutzer)
    }
}

/// Datensatz fuer eine archivierte Chat-Nachricht
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatNachrichtRecord {
    pub id: Uuid,
    pub von: UserId,
    pub an: UserId,
    pub inhalt: String,
    pub gesendet_am: DateTime<Utc>,
}

impl ChatNachrichtRecord {
    /// Legt einen neuen Archiv-Eintrag an
    pub fn neu(von: UserId, an: UserId, inhalt: String, gesendet_am: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            von,
            an,
            inhalt,
            gesendet_am,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anruf_record_betrifft_beide_teilnehmer() {
        let a = UserId::new();
        let b = UserId::new();
        let record = AnrufRecord::neu(SessionId::new(), [a, b], Utc::now());
        assert!(record.betrifft(a));
        assert!(record.betrifft(b));
        assert!(!record.betrifft(UserId::new()));
        assert!(record.beendet_am.is_none());
    }
}
