//! Warte-Pool mit FIFO-Vermittlung
//!
//! Der Pool haelt alle wartenden Verbindungen in Beitrittsreihenfolge.
//! Bei jedem Beitritt wird sofort der aelteste kompatible Kandidat
//! gesucht; gibt es keinen, bleibt der Neuzugang im Pool stehen.
//!
//! Der Pool ist nicht threadsicher. Alle Zugriffe laufen ueber das
//! Lebenszyklus-Lock des Aufrufers, damit Vermittlung, Entfernen und
//! Zustandswechsel der Teilnehmer eine einzige atomare Einheit bilden.

use chrono::{DateTime, Utc};
use plauderei_core::types::{ConnectionId, UserId};
use tracing::debug;

use crate::error::PoolFehler;
use crate::filter::{kompatibel, MatchFilter};

// ---------------------------------------------------------------------------
// Pool-Eintrag
// ---------------------------------------------------------------------------

/// Ein wartender Teilnehmer im Pool
#[derive(Debug, Clone)]
pub struct PoolEintrag {
    /// Verbindungs-ID des Wartenden
    pub verbindung: ConnectionId,
    /// Benutzer-ID laut Auth-Dienst
    pub benutzer: UserId,
    /// Laendercode der Verbindung
    pub land: String,
    /// Filterkriterien des Wartenden
    pub filter: MatchFilter,
    /// Zeitpunkt des Beitritts
    pub beigetreten_am: DateTime<Utc>,
}

impl PoolEintrag {
    /// Erstellt einen neuen Eintrag mit aktuellem Zeitstempel
    pub fn neu(
        verbindung: ConnectionId,
        benutzer: UserId,
        land: impl Into<String>,
        filter: MatchFilter,
    ) -> Self {
        Self {
            verbindung,
            benutzer,
            land: land.into(),
            filter,
            beigetreten_am: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Vermittlungs-Ergebnis
// ---------------------------------------------------------------------------

/// Ergebnis eines Pool-Beitritts
#[derive(Debug)]
pub enum VermittlungsErgebnis {
    /// Kein kompatibler Kandidat – der Neuzugang wartet jetzt im Pool
    Wartend,
    /// Der aelteste kompatible Kandidat wurde aus dem Pool entnommen
    Vermittelt(PoolEintrag),
}

// ---------------------------------------------------------------------------
// MatchingPool
// ---------------------------------------------------------------------------

/// Warte-Pool in Beitrittsreihenfolge
#[derive(Debug, Default)]
pub struct MatchingPool {
    /// Wartende Eintraege, aeltester zuerst
    eintraege: Vec<PoolEintrag>,
}

impl MatchingPool {
    /// Erstellt einen leeren Pool
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl der wartenden Eintraege
    pub fn laenge(&self) -> usize {
        self.eintraege.len()
    }

    /// Gibt zurueck ob der Pool leer ist
    pub fn ist_leer(&self) -> bool {
        self.eintraege.is_empty()
    }

    /// Prueft ob eine Verbindung im Pool wartet
    pub fn enthaelt(&self, verbindung: ConnectionId) -> bool {
        self.eintraege.iter().any(|e| e.verbindung == verbindung)
    }

    /// Alle kompatiblen Kandidaten fuer einen Suchenden, aeltester zuerst
    ///
    /// Kompatibilitaet ist symmetrisch: der Filter des Suchenden muss das
    /// Land des Kandidaten akzeptieren und umgekehrt.
    pub fn kandidaten_fuer(&self, suchender: &PoolEintrag) -> Vec<&PoolEintrag> {
        self.eintraege
            .iter()
            .filter(|e| {
                e.verbindung != suchender.verbindung
                    && kompatibel(&suchender.land, &suchender.filter, &e.land, &e.filter)
            })
            .collect()
    }

    /// Versucht eine Vermittlung fuer den Neuzugang
    ///
    /// Findet sich ein kompatibler Kandidat, wird der aelteste aus dem
    /// Pool entnommen und zurueckgegeben; der Neuzugang wird in diesem
    /// Fall nie eingefuegt. Andernfalls wird der Neuzugang hinten
    /// angehaengt und wartet.
    ///
    /// # Fehler
    /// `PoolFehler::BereitsImPool` wenn die Verbindung schon wartet.
    pub fn vermittlung_suchen(
        &mut self,
        neuer: PoolEintrag,
    ) -> Result<VermittlungsErgebnis, PoolFehler> {
        if self.enthaelt(neuer.verbindung) {
            return Err(PoolFehler::BereitsImPool);
        }

        let position = self.eintraege.iter().position(|e| {
            kompatibel(&neuer.land, &neuer.filter, &e.land, &e.filter)
        });

        match position {
            Some(idx) => {
                let partner = self.eintraege.remove(idx);
                debug!(
                    verbindung = %neuer.verbindung,
                    partner = %partner.verbindung,
                    "Vermittlung gefunden"
                );
                Ok(VermittlungsErgebnis::Vermittelt(partner))
            }
            None => {
                debug!(
                    verbindung = %neuer.verbindung,
                    wartende = self.eintraege.len(),
                    "Kein Kandidat, Eintrag wartet"
                );
                self.eintraege.push(neuer);
                Ok(VermittlungsErgebnis::Wartend)
            }
        }
    }

    /// Entfernt eine Verbindung aus dem Pool
    ///
    /// Gibt den entfernten Eintrag zurueck, `None` wenn die Verbindung
    /// nicht wartete (kein Fehler – Verlassen ist idempotent).
    pub fn entfernen(&mut self, verbindung: ConnectionId) -> Option<PoolEintrag> {
        let idx = self
            .eintraege
            .iter()
            .position(|e| e.verbindung == verbindung)?;
        Some(self.eintraege.remove(idx))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
