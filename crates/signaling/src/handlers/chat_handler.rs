//! Chat-Handler – Nachricht an den Session-Partner weiterleiten
//!
//! Der Empfaenger wird aus der aktiven Session des Absenders abgeleitet,
//! nie aus der Nachricht selbst. Nach erfolgreicher Einreihung wird ein
//! Persistenz-Ereignis an die Senke gemeldet; die Ablage laeuft
//! fire-and-forget und blockiert das Relay nicht.

use chrono::Utc;
use plauderei_core::dienste::{GeoAufloeser, TokenPruefer};
use plauderei_core::event::PersistenzEreignis;
use plauderei_core::types::{ConnectionId, UserId};
use plauderei_protocol::control::{
    ChatDelivery, ChatSendRequest, ChatSendResponse, ControlMessage, ControlPayload, ErrorCode,
};
use std::sync::Arc;

use crate::server_state::SignalingState;

/// Maximale Nachrichtenlaenge in Bytes
const MAX_NACHRICHTEN_LAENGE: usize = 4096;

/// Leitet eine Chat-Nachricht an den Session-Partner weiter
pub async fn handle_chat_send<A, G>(
    request: ChatSendRequest,
    request_id: u32,
    verbindung: ConnectionId,
    benutzer: UserId,
    state: &Arc<SignalingState<A, G>>,
) -> ControlMessage
where
    A: TokenPruefer + 'static,
    G: GeoAufloeser + 'static,
{
    if request.inhalt.trim().is_empty() {
        return ControlMessage::error(request_id, ErrorCode::InvalidRequest, "Leere Nachricht");
    }
    if request.inhalt.len() > MAX_NACHRICHTEN_LAENGE {
        return ControlMessage::error(
            request_id,
            ErrorCode::InvalidRequest,
            "Nachricht zu lang",
        );
    }

    let partner = match state.sessions.partner_von(verbindung) {
        Some(p) => p,
        None => {
            return ControlMessage::error(
                request_id,
                ErrorCode::NoActiveSession,
                "Keine aktive Session",
            );
        }
    };

    let gesendet_am = Utc::now();
    let zustellung = ControlMessage::push(ControlPayload::ChatDelivery(ChatDelivery {
        from_user: benutzer,
        inhalt: request.inhalt.clone(),
        gesendet_am,
    }));

    if !state
        .broadcaster
        .an_verbindung_senden(partner.verbindung, zustellung)
    {
        tracing::warn!(
            verbindung = %verbindung,
            partner = %partner.verbindung,
            "Chat-Zustellung fehlgeschlagen"
        );
        return ControlMessage::error(
            request_id,
            ErrorCode::PeerUnavailable,
            "Partner nicht erreichbar",
        );
    }

    state.senke.aufnehmen(PersistenzEreignis::ChatNachrichtGespeichert {
        von: benutzer,
        an: partner.benutzer,
        inhalt: request.inhalt,
        zeitstempel: gesendet_am,
    });

    tracing::debug!(
        verbindung = %verbindung,
        partner = %partner.verbindung,
        "Chat-Nachricht weitergeleitet"
    );
    ControlMessage::new(
        request_id,
        ControlPayload::ChatSendResponse(ChatSendResponse { gesendet_am }),
    )
}
