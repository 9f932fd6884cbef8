//! Session-Store – Aktive 1:1-Gespraechs-Sessions
//!
//! Eine Session verbindet genau zwei Verbindungen. Der Store haelt alle
//! aktiven Sessions und einen Index von Verbindung zu Session, damit der
//! Relay-Pfad den Partner ohne Lebenszyklus-Lock nachschlagen kann.
//!
//! `beenden` ist idempotent: der erste Aufruf entfernt die Session und
//! liefert das Ende-Ergebnis, jeder weitere liefert `None`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use plauderei_core::types::{ConnectionId, SessionId, UserId};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Ein Teilnehmer einer Session
#[derive(Debug, Clone)]
pub struct SessionTeilnehmer {
    pub verbindung: ConnectionId,
    pub benutzer: UserId,
    pub land: String,
}

/// Eine aktive 1:1-Session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub teilnehmer: [SessionTeilnehmer; 2],
    pub gestartet_am: DateTime<Utc>,
}

impl Session {
    /// Gibt den jeweils anderen Teilnehmer zurueck
    pub fn partner_von(&self, verbindung: ConnectionId) -> Option<&SessionTeilnehmer> {
        let [a, b] = &self.teilnehmer;
        if a.verbindung == verbindung {
            Some(b)
        } else if b.verbindung == verbindung {
            Some(a)
        } else {
            None
        }
    }

    /// Beide Benutzer-IDs der Session
    pub fn benutzer(&self) -> [UserId; 2] {
        [self.teilnehmer[0].benutzer, self.teilnehmer[1].benutzer]
    }
}

/// Ergebnis eines Session-Endes
#[derive(Debug, Clone)]
pub struct SessionEnde {
    pub session: Session,
    pub beendet_am: DateTime<Utc>,
    pub dauer_sek: u64,
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Store aller aktiven Sessions
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    /// Aktive Sessions, indiziert nach SessionId
    sessions: DashMap<SessionId, Session>,
    /// Verbindung -> Session (fuer Partner-Lookup im Relay-Pfad)
    nach_verbindung: DashMap<ConnectionId, SessionId>,
}

impl SessionStore {
    /// Erstellt einen leeren Store
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: DashMap::new(),
                nach_verbindung: DashMap::new(),
            }),
        }
    }

    /// Legt eine neue Session fuer zwei Teilnehmer an
    pub fn erstellen(&self, a: SessionTeilnehmer, b: SessionTeilnehmer) -> Session {
        let session = Session {
            id: SessionId::new(),
            teilnehmer: [a, b],
            gestartet_am: Utc::now(),
        };
        self.inner
            .nach_verbindung
            .insert(session.teilnehmer[0].verbindung, session.id);
        self.inner
            .nach_verbindung
            .insert(session.teilnehmer[1].verbindung, session.id);
        self.inner.sessions.insert(session.id, session.clone());

        tracing::info!(
            session = %session.id,
            a = %session.teilnehmer[0].verbindung,
            b = %session.teilnehmer[1].verbindung,
            "Session gestartet"
        );
        session
    }

    /// Beendet eine Session (idempotent)
    ///
    /// Der erste Aufruf entfernt Session und Index-Eintraege und gibt das
    /// Ende-Ergebnis mit der Gespraechsdauer zurueck. Weitere Aufrufe
    /// geben `None` zurueck.
    pub fn beenden(&self, id: SessionId) -> Option<SessionEnde> {
        let (_, session) = self.inner.sessions.remove(&id)?;
        for teilnehmer in &session.teilnehmer {
            self.inner.nach_verbindung.remove(&teilnehmer.verbindung);
        }

        let beendet_am = Utc::now();
        let dauer_sek = beendet_am
            .signed_duration_since(session.gestartet_am)
            .num_seconds()
            .max(0) as u64;

        tracing::info!(session = %id, dauer_sek, "Session beendet");
        Some(SessionEnde {
            session,
            beendet_am,
            dauer_sek,
        })
    }

    /// Gibt die aktive Session einer Verbindung zurueck
    pub fn session_von(&self, verbindung: ConnectionId) -> Option<Session> {
        let session_id = *self.inner.nach_verbindung.get(&verbindung)?;
        self.inner.sessions.get(&session_id).map(|e| e.clone())
    }

    /// Gibt den Session-Partner einer Verbindung zurueck
    pub fn partner_von(&self, verbindung: ConnectionId) -> Option<SessionTeilnehmer> {
        let session = self.session_von(verbindung)?;
        session.partner_von(verbindung).cloned()
    }

    /// Anzahl aktiver Sessions
    pub fn aktive_anzahl(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Sessions die laenger als `max_dauer_sek` laufen (fuer den Watchdog)
    pub fn aeltere_als(&self, max_dauer_sek: u64) -> Vec<SessionId> {
        let jetzt = Utc::now();
        self.inner
            .sessions
            .iter()
            .filter(|e| {
                jetzt
                    .signed_duration_since(e.gestartet_am)
                    .num_seconds()
                    .max(0) as u64
                    > max_dauer_sek
            })
            .map(|e| e.id)
            .collect()
    }
}

impl Default for SessionStore {
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

    fn teilnehmer(land: &str) -> SessionTeilnehmer {
        SessionTeilnehmer {
            verbindung: ConnectionId::new(),
            benutzer: UserId::new(),
            land: land.to_string(),
        }
    }

    #[test]
    fn erstellen_und_partner_lookup() {
        let store = SessionStore::neu();
        let a = teilnehmer("DE");
        let b = teilnehmer("FR");
        let (a_id, b_id) = (a.verbindung, b.verbindung);

        let session = store.erstellen(a, b);
        assert_eq!(store.aktive_anzahl(), 1);

        let partner = store.partner_von(a_id).unwrap();
        assert_eq!(partner.verbindung, b_id);
        let partner = store.partner_von(b_id).unwrap();
        assert_eq!(partner.verbindung, a_id);

        assert!(store.session_von(ConnectionId::new()).is_none());
        assert_eq!(store.session_von(a_id).unwrap().id, session.id);
    }

    #[test]
    fn beenden_ist_idempotent() {
        let store = SessionStore::neu();
        let a = teilnehmer("DE");
        let a_id = a.verbindung;
        let session = store.erstellen(a, teilnehmer("FR"));

        let ende = store.beenden(session.id);
        assert!(ende.is_some());
        assert_eq!(store.aktive_anzahl(), 0);
        assert!(store.session_von(a_id).is_none());

        // Zweiter Aufruf wirkt nicht
        assert!(store.beenden(session.id).is_none());
    }

    #[test]
    fn partner_von_fremder_verbindung() {
        let store = SessionStore::neu();
        let session = store.erstellen(teilnehmer("DE"), teilnehmer("FR"));
        assert!(session.partner_von(ConnectionId::new()).is_none());
    }

    #[test]
    fn aeltere_als_findet_lange_sessions() {
        let store = SessionStore::neu();
        let session = store.erstellen(teilnehmer("DE"), teilnehmer("FR"));

        // Startzeit kuenstlich zuruecksetzen
        {
            let mut eintrag = store.inner.sessions.get_mut(&session.id).unwrap();
            eintrag.gestartet_am = Utc::now() - chrono::Duration::seconds(120);
        }

        assert!(store.aeltere_als(60).contains(&session.id));
        assert!(store.aeltere_als(300).is_empty());
    }
}
