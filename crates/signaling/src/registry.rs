//! Connection-Registry – Verwaltet alle aktiven Verbindungen
//!
//! Haelt fuer jede angemeldete Verbindung ihre Identitaet (Benutzer,
//! Land) und ihren Lebenszyklus-Zustand. Pro Benutzer ist genau eine
//! aktive Verbindung erlaubt.
//!
//! Die Registry selbst ist nur ein thread-sicherer Speicher. Alle
//! Zustands-Uebergaenge (Bereit -> ImPool -> InSession) laufen ueber den
//! `Matchmaker`, der sie unter seinem Lebenszyklus-Lock serialisiert.
//! Relay-Pfade lesen lock-frei direkt aus der Registry.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use plauderei_core::types::{ConnectionId, SessionId, UserId};
use std::sync::Arc;

use crate::error::{SignalingError, SignalingResult};

// ---------------------------------------------------------------------------
// Verbindungszustand
// ---------------------------------------------------------------------------

/// Lebenszyklus-Zustand einer angemeldeten Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbindungsZustand {
    /// Angemeldet, weder wartend noch im Gespraech
    Bereit,
    /// Wartet im Matching-Pool
    ImPool,
    /// In einer aktiven Gespraechs-Session
    InSession(SessionId),
}

// ---------------------------------------------------------------------------
// Verbindung
// ---------------------------------------------------------------------------

/// Eine angemeldete Client-Verbindung
#[derive(Debug, Clone)]
pub struct Verbindung {
    pub id: ConnectionId,
    pub benutzer: UserId,
    /// Laendercode (aus GeoIP oder Standard-Land)
    pub land: String,
    pub zustand: VerbindungsZustand,
    pub verbunden_am: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ConnectionRegistry
// ---------------------------------------------------------------------------

/// Registry aller angemeldeten Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<ConnectionRegistryInner>,
}

struct ConnectionRegistryInner {
    /// Alle Verbindungen, indiziert nach ConnectionId
    verbindungen: DashMap<ConnectionId, Verbindung>,
    /// Benutzer -> aktive Verbindung (fuer die Doppel-Anmeldungs-Pruefung)
    nach_benutzer: DashMap<UserId, ConnectionId>,
}

impl ConnectionRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(ConnectionRegistryInner {
                verbindungen: DashMap::new(),
                nach_benutzer: DashMap::new(),
            }),
        }
    }

    /// Registriert eine neue Verbindung fuer einen Benutzer
    ///
    /// # Fehler
    /// `DoppelteVerbindung` wenn der Benutzer bereits verbunden ist.
    pub fn registrieren(
        &self,
        benutzer: UserId,
        land: impl Into<String>,
    ) -> SignalingResult<Verbindung> {
        if self.inner.nach_benutzer.contains_key(&benutzer) {
            return Err(SignalingError::DoppelteVerbindung(benutzer));
        }

        let verbindung = Verbindung {
            id: ConnectionId::new(),
            benutzer,
            land: land.into(),
            zustand: VerbindungsZustand::Bereit,
            verbunden_am: Utc::now(),
        };
        self.inner.nach_benutzer.insert(benutzer, verbindung.id);
        self.inner
            .verbindungen
            .insert(verbindung.id, verbindung.clone());

        tracing::debug!(
            verbindung = %verbindung.id,
            benutzer = %benutzer,
            land = %verbindung.land,
            "Verbindung registriert"
        );
        Ok(verbindung)
    }

    /// Entfernt eine Verbindung aus der Registry
    pub fn entfernen(&self, id: ConnectionId) -> Option<Verbindung> {
        let (_, verbindung) = self.inner.verbindungen.remove(&id)?;
        self.inner.nach_benutzer.remove(&verbindung.benutzer);
        tracing::debug!(verbindung = %id, "Verbindung entfernt");
        Some(verbindung)
    }

    /// Gibt eine Kopie der Verbindungs-Info zurueck
    pub fn get(&self, id: ConnectionId) -> Option<Verbindung> {
        self.inner.verbindungen.get(&id).map(|e| e.clone())
    }

    /// Setzt den Lebenszyklus-Zustand einer Verbindung
    ///
    /// Gibt `false` zurueck wenn die Verbindung nicht (mehr) existiert.
    pub fn zustand_setzen(&self, id: ConnectionId, zustand: VerbindungsZustand) -> bool {
        match self.inner.verbindungen.get_mut(&id) {
            Some(mut eintrag) => {
                eintrag.zustand = zustand;
                true
            }
            None => false,
        }
    }

    /// Gibt die aktive Verbindung eines Benutzers zurueck
    pub fn verbindung_von_benutzer(&self, benutzer: &UserId) -> Option<ConnectionId> {
        self.inner.nach_benutzer.get(benutzer).map(|e| *e)
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, id: ConnectionId) -> bool {
        self.inner.verbindungen.contains_key(&id)
    }

    /// Anzahl registrierter Verbindungen
    pub fn anzahl(&self) -> usize {
        self.inner.verbindungen.len()
    }
}

impl Default for ConnectionRegistry {
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

    #[test]
    fn registrieren_und_entfernen() {
        let registry = ConnectionRegistry::neu();
        let benutzer = UserId::new();

        let verbindung = registry.registrieren(benutzer, "DE").unwrap();
        assert!(registry.ist_registriert(verbindung.id));
        assert_eq!(registry.anzahl(), 1);
        assert_eq!(
            registry.verbindung_von_benutzer(&benutzer),
            Some(verbindung.id)
        );
        assert_eq!(verbindung.zustand, VerbindungsZustand::Bereit);

        registry.entfernen(verbindung.id);
        assert!(!registry.ist_registriert(verbindung.id));
        assert!(registry.verbindung_von_benutzer(&benutzer).is_none());
    }

    #[test]
    fn doppelte_verbindung_wird_abgelehnt() {
        let registry = ConnectionRegistry::neu();
        let benutzer = UserId::new();

        registry.registrieren(benutzer, "DE").unwrap();
        let fehler = registry.registrieren(benutzer, "DE").unwrap_err();
        assert!(matches!(fehler, SignalingError::DoppelteVerbindung(_)));
        assert_eq!(registry.anzahl(), 1);
    }

    #[test]
    fn neue_verbindung_nach_entfernen_erlaubt() {
        let registry = ConnectionRegistry::neu();
        let benutzer = UserId::new();

        let erste = registry.registrieren(benutzer, "DE").unwrap();
        registry.entfernen(erste.id);
        assert!(registry.registrieren(benutzer, "FR").is_ok());
    }

    #[test]
    fn zustand_setzen() {
        let registry = ConnectionRegistry::neu();
        let verbindung = registry.registrieren(UserId::new(), "DE").unwrap();
        let session = SessionId::new();

        assert!(registry.zustand_setzen(verbindung.id, VerbindungsZustand::InSession(session)));
        assert_eq!(
            registry.get(verbindung.id).unwrap().zustand,
            VerbindungsZustand::InSession(session)
        );

        assert!(!registry.zustand_setzen(ConnectionId::new(), VerbindungsZustand::Bereit));
    }

    #[test]
    fn clone_teilt_inneren_state() {
        let r1 = ConnectionRegistry::neu();
        let r2 = r1.clone();
        let verbindung = r1.registrieren(UserId::new(), "DE").unwrap();
        assert!(r2.ist_registriert(verbindung.id));
    }
}
