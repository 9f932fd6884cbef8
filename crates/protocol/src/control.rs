//! Control-Protokoll (TCP)
//!
//! Definiert alle Steuerungsnachrichten die ueber die TCP-Verbindung
//! zwischen Client und Server ausgetauscht werden: Login, Pool-Beitritt,
//! WebRTC-Signaling (Offer/Answer/ICE), Chat und Session-Ende.
//!
//! ## Design
//! - Request/Response Pattern: jede Nachricht hat eine `request_id: u32`
//! - Server-Pushes (Matched, Zustellungen, Notizen) tragen `request_id: 0`
//! - JSON-Serialisierung via serde (TCP, nicht zeitkritisch)
//! - Tagged Enums fuer typsichere Nachrichtentypen
//! - Signaling-Payloads (SDP, ICE-Kandidaten) sind fuer den Server opak
//!   und werden als `serde_json::Value` unveraendert weitergereicht

use chrono::{DateTime, Utc};
use plauderei_core::types::{ConnectionId, SessionId, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Error-Responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Allgemein
    InternalError,
    InvalidRequest,
    NotFound,
    // Auth
    AuthFailed,
    AlreadyLoggedIn,
    NotLoggedIn,
    // Registry & Pool
    DuplicateConnection,
    AlreadyPooled,
    AlreadyInSession,
    // Session & Relay
    NoActiveSession,
    PeerUnavailable,
    // Server
    ServerFull,
}

// ---------------------------------------------------------------------------
// Auth-Nachrichten
// ---------------------------------------------------------------------------

/// Login-Anfrage vom Client
///
/// Das Token stammt vom externen Auth-Dienst; der Server reicht es nur
/// zur Pruefung durch und vertraut der gelieferten Benutzer-ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Auth-Token (Format ist Sache des Auth-Dienstes)
    pub token: String,
    /// Client-Version fuer Kompatibilitaetspruefung
    pub client_version: String,
}

/// Erfolgreiche Login-Antwort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Zugewiesene Verbindungs-ID (Adressat fuer Signaling)
    pub connection_id: ConnectionId,
    /// Benutzer-ID laut Auth-Dienst
    pub user_id: UserId,
    /// Aufgeloester Laendercode der Verbindung
    pub land: String,
}

// ---------------------------------------------------------------------------
// Pool-Nachrichten
// ---------------------------------------------------------------------------

/// Dem Matching-Pool beitreten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolJoinRequest {
    /// Gewuenschtes Land des Partners (None = egal)
    #[serde(default)]
    pub land: Option<String>,
}

/// Antwort auf den Pool-Beitritt
///
/// `wartet = true` bedeutet: kein Kandidat verfuegbar, der Eintrag bleibt
/// im Pool. Bei sofortiger Vermittlung folgt eine `Matched`-Push-Nachricht
/// an beide Teilnehmer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolJoinResponse {
    pub wartet: bool,
}

/// Den Matching-Pool verlassen (Abbruch der Wartezeit)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolLeaveRequest {}

/// Antwort auf das Verlassen des Pools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolLeaveResponse {
    /// `false` wenn kein Pool-Eintrag vorhanden war (kein Fehler)
    pub entfernt: bool,
}

/// Push an beide Teilnehmer sobald eine Vermittlung zustande kam
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedNotice {
    pub session_id: SessionId,
    /// Verbindungs-ID des Partners (Ziel fuer Signaling-Nachrichten)
    pub peer: ConnectionId,
    /// Laendercode des Partners
    pub peer_land: String,
}

// ---------------------------------------------------------------------------
// Signaling-Nachrichten (WebRTC Offer/Answer/ICE)
// ---------------------------------------------------------------------------

/// Art einer Signaling-Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offer => write!(f, "offer"),
            Self::Answer => write!(f, "answer"),
            Self::IceCandidate => write!(f, "ice_candidate"),
        }
    }
}

/// Signaling-Nachricht vom Client an seinen Session-Partner
///
/// `to` wird vom Server nur gegen den tatsaechlichen Session-Partner
/// geprueft – eine fremde Zieladresse fuehrt zu `PEER_UNAVAILABLE`,
/// niemals zu einer Zustellung.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRequest {
    pub kind: SignalKind,
    pub to: ConnectionId,
    /// SDP bzw. ICE-Kandidat, fuer den Server opak
    pub payload: serde_json::Value,
}

/// Zustellung einer Signaling-Nachricht an den Partner (Push)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalDelivery {
    pub kind: SignalKind,
    pub from: ConnectionId,
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Chat-Nachrichten
// ---------------------------------------------------------------------------

/// Chat-Nachricht an den Session-Partner senden
///
/// Der Empfaenger wird ausschliesslich aus der aktiven Session des
/// Absenders abgeleitet, niemals vom Client mitgeliefert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSendRequest {
    pub inhalt: String,
}

/// Bestaetigung an den Absender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSendResponse {
    pub gesendet_am: DateTime<Utc>,
}

/// Zustellung einer Chat-Nachricht an den Partner (Push)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDelivery {
    pub from_user: UserId,
    pub inhalt: String,
    pub gesendet_am: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Session-Ende
// ---------------------------------------------------------------------------

/// Grund fuer das Ende einer Session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndeGrund {
    /// Ein Teilnehmer hat aufgelegt
    Aufgelegt,
    /// Ein Teilnehmer hat die Verbindung getrennt
    PartnerGetrennt,
    /// Maximale Gespraechsdauer erreicht (Watchdog)
    Zeitlimit,
}

/// Aktive Session beenden (Auflegen)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndRequest {
    pub grund: Option<String>,
}

/// Antwort auf das Auflegen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndResponse {
    /// `false` wenn keine aktive Session vorhanden war
    pub beendet: bool,
}

/// Push an den verbleibenden Teilnehmer wenn seine Session endet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndedNotice {
    pub session_id: SessionId,
    pub grund: SessionEndeGrund,
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Ping (Client -> Server oder Server -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingMessage {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (spiegelt Timestamp zurueck)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    /// Originaler Timestamp aus dem Ping
    pub echo_timestamp_ms: u64,
    /// Server-eigener Timestamp
    pub server_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Haupt-Enum: ControlPayload
// ---------------------------------------------------------------------------

/// Alle moeglichen Control-Nachrichten (typsicher via Tagged Enum)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlPayload {
    // Auth
    Login(LoginRequest),
    LoginResponse(LoginResponse),

    // Pool
    PoolJoin(PoolJoinRequest),
    PoolJoinResponse(PoolJoinResponse),
    PoolLeave(PoolLeaveRequest),
    PoolLeaveResponse(PoolLeaveResponse),
    Matched(MatchedNotice),

    // Signaling
    Signal(SignalRequest),
    SignalAck,
    SignalDelivery(SignalDelivery),

    // Chat
    ChatSend(ChatSendRequest),
    ChatSendResponse(ChatSendResponse),
    ChatDelivery(ChatDelivery),

    // Session
    SessionEnd(SessionEndRequest),
    SessionEndResponse(SessionEndResponse),
    SessionEnded(SessionEndedNotice),

    // Keepalive
    Ping(PingMessage),
    Pong(PongMessage),

    // Error
    Error(ErrorResponse),
}

/// Standardisierte Fehler-Antwort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    /// Optionale maschinenlesbare Details
    pub details: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Control-Frame (Umschlag fuer alle Nachrichten)
// ---------------------------------------------------------------------------

/// Control-Protokoll-Nachricht mit Request/Response-Zuordnung
///
/// Jede Nachricht traegt eine `request_id` die der Client vergibt.
/// Der Server kopiert die ID in die Antwort damit der Client
/// Request und Response zuordnen kann. Server-initiierte Pushes
/// verwenden `request_id: 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    /// Eindeutige Nachrichten-ID fuer Request/Response-Zuordnung
    pub request_id: u32,
    /// Inhalt der Nachricht
    pub payload: ControlPayload,
}

impl ControlMessage {
    /// Erstellt eine neue Control-Nachricht
    pub fn new(request_id: u32, payload: ControlPayload) -> Self {
        Self {
            request_id,
            payload,
        }
    }

    /// Erstellt einen Server-Push (request_id 0)
    pub fn push(payload: ControlPayload) -> Self {
        Self::new(0, payload)
    }

    /// Erstellt eine Ping-Nachricht
    pub fn ping(request_id: u32, timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            ControlPayload::Ping(PingMessage { timestamp_ms }),
        )
    }

    /// Erstellt eine Pong-Antwort
    pub fn pong(request_id: u32, echo_timestamp_ms: u64, server_timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            ControlPayload::Pong(PongMessage {
                echo_timestamp_ms,
                server_timestamp_ms,
            }),
        )
    }

    /// Erstellt eine Fehler-Antwort
    pub fn error(request_id: u32, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(
            request_id,
            ControlPayload::Error(ErrorResponse {
                code,
                message: message.into(),
                details: None,
            }),
        )
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_pong_serialisierung() {
        let ping = ControlMessage::ping(1, 1234567890);
        let json = ping.to_json().unwrap();
        let decoded = ControlMessage::from_json(&json).unwrap();
        assert_eq!(decoded.request_id, 1);
        if let ControlPayload::Ping(p) = decoded.payload {
            assert_eq!(p.timestamp_ms, 1234567890);
        } else {
            panic!("Erwartet Ping-Payload");
        }
    }

    #[test]
    fn pool_join_ohne_filter() {
        // Leeres Filter-Objekt muss deserialisierbar sein (land = None)
        let json = r#"{"request_id":7,"payload":{"type":"pool_join"}}"#;
        let msg = ControlMessage::from_json(json).unwrap();
        match msg.payload {
            ControlPayload::PoolJoin(req) => assert!(req.land.is_none()),
            _ => panic!("Erwartet PoolJoin-Payload"),
        }
    }

    #[test]
    fn signal_payload_bleibt_opak() {
        let payload = serde_json::json!({"sdp": "v=0...", "typ": "offer"});
        let msg = ControlMessage::new(
            3,
            ControlPayload::Signal(SignalRequest {
                kind: SignalKind::Offer,
                to: ConnectionId::new(),
                payload: payload.clone(),
            }),
        );
        let json = msg.to_json().unwrap();
        let decoded = ControlMessage::from_json(&json).unwrap();
        match decoded.payload {
            ControlPayload::Signal(req) => {
                assert_eq!(req.kind, SignalKind::Offer);
                assert_eq!(req.payload, payload);
            }
            _ => panic!("Erwartet Signal-Payload"),
        }
    }

    #[test]
    fn error_code_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::PeerUnavailable).unwrap();
        assert_eq!(json, "\"PEER_UNAVAILABLE\"");
        let json = serde_json::to_string(&ErrorCode::AlreadyPooled).unwrap();
        assert_eq!(json, "\"ALREADY_POOLED\"");
    }

    #[test]
    fn signal_kind_anzeige() {
        assert_eq!(SignalKind::IceCandidate.to_string(), "ice_candidate");
    }

    #[test]
    fn fehler_antwort() {
        let msg = ControlMessage::error(9, ErrorCode::NoActiveSession, "Keine aktive Session");
        assert_eq!(msg.request_id, 9);
        match msg.payload {
            ControlPayload::Error(e) => {
                assert_eq!(e.code, ErrorCode::NoActiveSession);
                assert!(e.details.is_none());
            }
            _ => panic!("Erwartet Error-Payload"),
        }
    }
}
