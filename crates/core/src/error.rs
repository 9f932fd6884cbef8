//! Fehlertypen fuer Plauderei
//!
//! Deckt die Fehler der Service-Seams ab (Token-Pruefung, Persistenz).
//! Der Signaling-Service hat seinen eigenen Fehlertyp mit Protokoll-Bezug.

use thiserror::Error;

/// Globaler Result-Alias fuer Plauderei
pub type Result<T> = std::result::Result<T, PlaudereiError>;

/// Fehler der gemeinsamen Service-Traits
#[derive(Debug, Error)]
pub enum PlaudereiError {
    /// Token-Pruefung beim Login fehlgeschlagen
    #[error("Authentifizierung fehlgeschlagen: {0}")]
    Authentifizierung(String),

    /// Fehler im Persistenz-Backend oder anderer interner Fehler
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl PlaudereiError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = PlaudereiError::Authentifizierung("leeres Token".into());
        assert_eq!(
            e.to_string(),
            "Authentifizierung fehlgeschlagen: leeres Token"
        );
        let e = PlaudereiError::intern("Speicher nicht erreichbar");
        assert_eq!(e.to_string(), "Interner Fehler: Speicher nicht erreichbar");
    }
}
