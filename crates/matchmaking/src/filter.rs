//! Laender-Filter fuer die Vermittlung
//!
//! Ein Filter schraenkt ein, aus welchem Land der Gespraechspartner
//! stammen darf. Die Vermittlung wendet Filter immer symmetrisch an:
//! beide Seiten muessen das Land der jeweils anderen akzeptieren,
//! unabhaengig davon wer zuerst im Pool stand.

use serde::{Deserialize, Serialize};

/// Filterkriterien eines Pool-Eintrags
///
/// Laendercodes werden nur auf exakte Gleichheit verglichen, nie
/// interpretiert oder normalisiert – Gross/Kleinschreibung ist Sache
/// des Clients bzw. des GeoIP-Aufloesers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFilter {
    /// Gewuenschtes Land des Partners (None = jedes Land)
    #[serde(default)]
    pub land: Option<String>,
}

impl MatchFilter {
    /// Filter ohne Einschraenkung
    pub fn beliebig() -> Self {
        Self { land: None }
    }

    /// Filter auf ein bestimmtes Land
    pub fn nur_land(land: impl Into<String>) -> Self {
        Self {
            land: Some(land.into()),
        }
    }

    /// Prueft ob dieser Filter das gegebene Land akzeptiert
    pub fn akzeptiert(&self, land: &str) -> bool {
        match &self.land {
            Some(gewuenscht) => gewuenscht == land,
            None => true,
        }
    }
}

/// Symmetrische Kompatibilitaetspruefung zweier Pool-Teilnehmer
///
/// Beide Filter muessen das Land der Gegenseite akzeptieren. Die
/// Reihenfolge der Argumente ist damit bedeutungslos.
pub fn kompatibel(
    land_a: &str,
    filter_a: &MatchFilter,
    land_b: &str,
    filter_b: &MatchFilter,
) -> bool {
    filter_a.akzeptiert(land_b) && filter_b.akzeptiert(land_a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leerer_filter_akzeptiert_alles() {
        let filter = MatchFilter::beliebig();
        assert!(filter.akzeptiert("DE"));
        assert!(filter.akzeptiert("US"));
    }

    #[test]
    fn land_filter_vergleicht_exakt() {
        let filter = MatchFilter::nur_land("FR");
        assert!(filter.akzeptiert("FR"));
        assert!(!filter.akzeptiert("fr"));
        assert!(!filter.akzeptiert("DE"));
    }

    #[test]
    fn kompatibilitaet_ist_symmetrisch() {
        // A (FR) will nur US, B (US) hat keinen Filter
        let a = MatchFilter::nur_land("US");
        let b = MatchFilter::beliebig();
        assert!(kompatibel("FR", &a, "US", &b));
        assert!(kompatibel("US", &b, "FR", &a));
    }

    #[test]
    fn einseitige_ablehnung_verhindert_vermittlung() {
        // A (FR) will US, B (US) will DE – B lehnt A ab
        let a = MatchFilter::nur_land("US");
        let b = MatchFilter::nur_land("DE");
        assert!(!kompatibel("FR", &a, "US", &b));
        assert!(!kompatibel("US", &b, "FR", &a));
    }
}
