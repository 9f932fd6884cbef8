//! Schnittstellen zu externen Diensten
//!
//! Authentifizierung und Geolokalisierung sind keine Kernaufgaben – der
//! Kern definiert nur die Schnittstelle und vertraut den gelieferten
//! Werten fuer die Lebensdauer der Verbindung. Die konkreten
//! Implementierungen (Token-Dienst, GeoIP-Datenbank) liegen ausserhalb;
//! das Server-Crate bringt einfache Standard-Implementierungen mit.

use std::net::IpAddr;

use crate::error::Result;
use crate::types::UserId;

/// Prueft Login-Tokens und liefert die zugehoerige Benutzer-ID
///
/// Das Token-Format ist Sache des Auth-Dienstes; der Kern reicht das
/// Token unveraendert durch und uebernimmt die gelieferte UserId.
#[allow(async_fn_in_trait)]
pub trait TokenPruefer: Send + Sync {
    /// Validiert ein Token und gibt die Benutzer-ID zurueck
    ///
    /// Fehler werden als `PlaudereiError::Authentifizierung` gemeldet.
    async fn pruefen(&self, token: &str) -> Result<UserId>;
}

/// Loest eine Peer-Adresse zu einem Laendercode auf
///
/// Der Laendercode ist fuer den Kern ein opakes Filterattribut –
/// er wird nur auf Gleichheit verglichen, nie interpretiert.
pub trait GeoAufloeser: Send + Sync {
    /// Gibt den Laendercode der Adresse zurueck, `None` wenn unbekannt
    fn land_fuer(&self, adresse: IpAddr) -> Option<String>;
}
