//! Fehlertypen fuer den Signaling-Service

use plauderei_core::types::UserId;
use plauderei_protocol::control::ErrorCode;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Authentifizierungsfehler
    #[error("Authentifizierungsfehler: {0}")]
    Auth(String),

    /// Verbindung wurde getrennt
    #[error("Verbindung getrennt")]
    VerbindungGetrennt,

    /// Protokollfehler (ungueltiges Frame, falscher Zustand)
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    /// Der Benutzer hat bereits eine aktive Verbindung
    #[error("Benutzer {0} hat bereits eine aktive Verbindung")]
    DoppelteVerbindung(UserId),

    /// Die Verbindung wartet bereits im Pool
    #[error("Verbindung wartet bereits im Pool")]
    BereitsImPool,

    /// Die Verbindung ist bereits in einer aktiven Session
    #[error("Verbindung ist bereits in einer Session")]
    BereitsInSession,

    /// Die Verbindung hat keine aktive Session
    #[error("Keine aktive Session")]
    KeineAktiveSession,

    /// Der Session-Partner ist nicht (mehr) erreichbar
    #[error("Partner nicht erreichbar: {0}")]
    PartnerNichtErreichbar(String),

    /// Ressource nicht gefunden
    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    /// Server ist voll
    #[error("Server ist voll")]
    ServerVoll,

    /// Interner Fehler
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl SignalingError {
    /// Erstellt einen internen Fehler
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Erstellt einen Protokollfehler
    pub fn protokoll(msg: impl Into<String>) -> Self {
        Self::Protokoll(msg.into())
    }

    /// Zugehoeriger Fehler-Code fuer Error-Responses
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Auth(_) => ErrorCode::AuthFailed,
            Self::Protokoll(_) => ErrorCode::InvalidRequest,
            Self::DoppelteVerbindung(_) => ErrorCode::DuplicateConnection,
            Self::BereitsImPool => ErrorCode::AlreadyPooled,
            Self::BereitsInSession => ErrorCode::AlreadyInSession,
            Self::KeineAktiveSession => ErrorCode::NoActiveSession,
            Self::PartnerNichtErreichbar(_) => ErrorCode::PeerUnavailable,
            Self::NichtGefunden(_) => ErrorCode::NotFound,
            Self::ServerVoll => ErrorCode::ServerFull,
            Self::Io(_) | Self::VerbindungGetrennt | Self::Intern(_) => ErrorCode::InternalError,
        }
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_codes_zugeordnet() {
        assert_eq!(
            SignalingError::BereitsImPool.error_code(),
            ErrorCode::AlreadyPooled
        );
        assert_eq!(
            SignalingError::KeineAktiveSession.error_code(),
            ErrorCode::NoActiveSession
        );
        assert_eq!(
            SignalingError::PartnerNichtErreichbar("weg".into()).error_code(),
            ErrorCode::PeerUnavailable
        );
        assert_eq!(
            SignalingError::DoppelteVerbindung(UserId::new()).error_code(),
            ErrorCode::DuplicateConnection
        );
    }
}
