//! In-Memory-Implementierungen der Repositories
//!
//! Haelt alle Datensaetze in einem `RwLock<Vec<_>>`. Ausreichend fuer
//! Single-Instance-Betrieb ohne dauerhafte Ablage und fuer Tests;
//! Daten gehen beim Neustart verloren.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use plauderei_core::{
    error::Result,
    types::{SessionId, UserId},
};
use tracing::debug;

use crate::models::{AnrufRecord, ChatNachrichtRecord};
use crate::repository::{ChatArchivRepository, VerlaufRepository};

// ---------------------------------------------------------------------------
// Gespraechsverlauf
// ---------------------------------------------------------------------------

/// In-Memory-Gespraechsverlauf
#[derive(Debug, Default)]
pub struct MemoryVerlauf {
    eintraege: RwLock<Vec<AnrufRecord>>,
}

impl MemoryVerlauf {
    /// Erstellt einen leeren Verlauf
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl gespeicherter Eintraege
    pub fn laenge(&self) -> usize {
        self.eintraege.read().len()
    }
}

impl VerlaufRepository for MemoryVerlauf {
    async fn anruf_beginnen(
        &self,
        session_id: SessionId,
        teilnehmer: [UserId; 2],
        gestartet_am: DateTime<Utc>,
    ) -> Result<AnrufRecord> {
        let record = AnrufRecord::neu(session_id, teilnehmer, gestartet_am);
        self.eintraege.write().push(record.clone());
        debug!(session = %session_id, "Verlaufseintrag angelegt");
        Ok(record)
    }

    async fn anruf_beenden(
        &self,
        session_id: SessionId,
        beendet_am: DateTime<Utc>,
        dauer_sek: u64,
    ) -> Result<bool> {
        let mut eintraege = self.eintraege.write();
        let offen = eintraege
            .iter_mut()
            .find(|r| r.session_id == session_id && r.beendet_am.is_none());
        match offen {
            Some(record) => {
                record.beendet_am = Some(beendet_am);
                record.dauer_sek = Some(dauer_sek);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn verlauf_fuer(&self, benutzer: UserId, limit: usize) -> Result<Vec<AnrufRecord>> {
        let eintraege = self.eintraege.read();
        let mut treffer: Vec<AnrufRecord> = eintraege
            .iter()
            .filter(|r| r.betrifft(benutzer))
            .cloned()
            .collect();
        treffer.sort_by(|a, b| b.gestartet_am.cmp(&a.gestartet_am));
        treffer.truncate(limit);
        Ok(treffer)
    }
}

// ---------------------------------------------------------------------------
// Chat-Archiv
// ---------------------------------------------------------------------------

/// In-Memory-Chat-Archiv
#[derive(Debug, Default)]
pub struct MemoryChatArchiv {
    nachrichten: RwLock<Vec<ChatNachrichtRecord>>,
}

impl MemoryChatArchiv {
    /// Erstellt ein leeres Archiv
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl archivierter Nachrichten
    pub fn laenge(&self) -> usize {
        self.nachrichten.read().len()
    }
}

impl ChatArchivRepository for MemoryChatArchiv {
    async fn speichern(
        &self,
        von: UserId,
        an: UserId,
        inhalt: String,
        gesendet_am: DateTime<Utc>,
    ) -> Result<ChatNachrichtRecord> {
        let record = ChatNachrichtRecord::neu(von, an, inhalt, gesendet_am);
        self.nachrichten.write().push(record.clone());
        Ok(record)
    }

    async fn nachrichten_zwischen(
        &self,
        a: UserId,
        b: UserId,
        limit: usize,
    ) -> Result<Vec<ChatNachrichtRecord>> {
        let nachrichten = self.nachrichten.read();
        let mut treffer: Vec<ChatNachrichtRecord> = nachrichten
            .iter()
            .filter(|n| (n.von == a && n.an == b) || (n.von == b && n.an == a))
            .cloned()
            .collect();
        treffer.sort_by(|x, y| x.gesendet_am.cmp(&y.gesendet_am));
        treffer.truncate(limit);
        Ok(treffer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn anruf_beginnen_und_beenden() {
        let repo = MemoryVerlauf::neu();
        let session = SessionId::new();
        let (a, b) = (UserId::new(), UserId::new());

        repo.anruf_beginnen(session, [a, b], Utc::now())
            .await
            .unwrap();
        assert_eq!(repo.laenge(), 1);

        let beendet = repo.anruf_beenden(session, Utc::now(), 42).await.unwrap();
        assert!(beendet);

        let verlauf = repo.verlauf_fuer(a, 10).await.unwrap();
        assert_eq!(verlauf.len(), 1);
        assert_eq!(verlauf[0].dauer_sek, Some(42));
    }

    #[tokio::test]
    async fn beenden_ohne_offenen_eintrag() {
        let repo = MemoryVerlauf::neu();
        let beendet = repo
            .anruf_beenden(SessionId::new(), Utc::now(), 1)
            .await
            .unwrap();
        assert!(!beendet);
    }

    #[tokio::test]
    async fn doppeltes_beenden_wirkt_nur_einmal() {
        let repo = MemoryVerlauf::neu();
        let session = SessionId::new();
        repo.anruf_beginnen(session, [UserId::new(), UserId::new()], Utc::now())
            .await
            .unwrap();

        assert!(repo.anruf_beenden(session, Utc::now(), 5).await.unwrap());
        assert!(!repo.anruf_beenden(session, Utc::now(), 9).await.unwrap());
    }

    #[tokio::test]
    async fn verlauf_liefert_neueste_zuerst() {
        let repo = MemoryVerlauf::neu();
        let benutzer = UserId::new();
        let partner = UserId::new();

        let frueh = Utc::now() - chrono::Duration::minutes(10);
        let spaet = Utc::now();
        let s1 = SessionId::new();
        let s2 = SessionId::new();
        repo.anruf_beginnen(s1, [benutzer, partner], frueh)
            .await
            .unwrap();
        repo.anruf_beginnen(s2, [benutzer, partner], spaet)
            .await
            .unwrap();

        let verlauf = repo.verlauf_fuer(benutzer, 10).await.unwrap();
        assert_eq!(verlauf.len(), 2);
        assert_eq!(verlauf[0].session_id, s2);

        let begrenzt = repo.verlauf_fuer(benutzer, 1).await.unwrap();
        assert_eq!(begrenzt.len(), 1);
    }

    #[tokio::test]
    async fn chat_archiv_beide_richtungen() {
        let archiv = MemoryChatArchiv::neu();
        let (a, b) = (UserId::new(), UserId::new());

        archiv
            .speichern(a, b, "Hallo".into(), Utc::now())
            .await
            .unwrap();
        archiv
            .speichern(b, a, "Hi".into(), Utc::now())
            .await
            .unwrap();
        archiv
            .speichern(a, UserId::new(), "Anderes Gespraech".into(), Utc::now())
            .await
            .unwrap();

        let verlauf = archiv.nachrichten_zwischen(a, b, 10).await.unwrap();
        assert_eq!(verlauf.len(), 2);
        assert_eq!(verlauf[0].inhalt, "Hallo");
    }
}
