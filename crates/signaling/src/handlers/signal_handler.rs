//! Signal-Handler – WebRTC Offer/Answer/ICE-Relay
//!
//! Der Server interpretiert die Signaling-Payloads nicht, er reicht sie
//! nur durch. Zugestellt wird ausschliesslich an den Session-Partner:
//! die vom Client angegebene Zieladresse wird gegen die aktive Session
//! geprueft, alles andere wird abgelehnt.

use plauderei_core::dienste::{GeoAufloeser, TokenPruefer};
use plauderei_core::types::ConnectionId;
use plauderei_protocol::control::{
    ControlMessage, ControlPayload, ErrorCode, SignalDelivery, SignalRequest,
};
use std::sync::Arc;

use crate::server_state::SignalingState;

/// Leitet eine Signaling-Nachricht an den Session-Partner weiter
pub async fn handle_signal<A, G>(
    request: SignalRequest,
    request_id: u32,
    verbindung: ConnectionId,
    state: &Arc<SignalingState<A, G>>,
) -> ControlMessage
where
    A: TokenPruefer + 'static,
    G: GeoAufloeser + 'static,
{
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

    // Zieladresse muss der tatsaechliche Partner sein
    if request.to != partner.verbindung {
        tracing::warn!(
            verbindung = %verbindung,
            ziel = %request.to,
            partner = %partner.verbindung,
            "Signaling an fremde Zieladresse abgelehnt"
        );
        return ControlMessage::error(
            request_id,
            ErrorCode::PeerUnavailable,
            "Ziel ist nicht der Session-Partner",
        );
    }

    let zustellung = ControlMessage::push(ControlPayload::SignalDelivery(SignalDelivery {
        kind: request.kind,
        from: verbindung,
        payload: request.payload,
    }));

    if state
        .broadcaster
        .an_verbindung_senden(partner.verbindung, zustellung)
    {
        tracing::trace!(
            verbindung = %verbindung,
            partner = %partner.verbindung,
            kind = %request.kind,
            "Signaling weitergeleitet"
        );
        ControlMessage::new(request_id, ControlPayload::SignalAck)
    } else {
        ControlMessage::error(
            request_id,
            ErrorCode::PeerUnavailable,
            "Partner nicht erreichbar",
        )
    }
}
