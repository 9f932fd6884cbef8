//! Session-Handler – Auflegen und Partner-Benachrichtigung

use plauderei_core::dienste::{GeoAufloeser, TokenPruefer};
use plauderei_core::types::ConnectionId;
use plauderei_protocol::control::{
    ControlMessage, ControlPayload, SessionEndRequest, SessionEndResponse, SessionEndeGrund,
    SessionEndedNotice,
};
use std::sync::Arc;

use crate::server_state::SignalingState;

/// Beendet die aktive Session des Aufrufers (Auflegen)
///
/// Idempotent: ohne aktive Session wird `beendet: false` zurueckgegeben.
/// Der Partner bekommt einen SessionEnded-Push.
pub async fn handle_session_end<A, G>(
    request: SessionEndRequest,
    request_id: u32,
    verbindung: ConnectionId,
    state: &Arc<SignalingState<A, G>>,
) -> ControlMessage
where
    A: TokenPruefer + 'static,
    G: GeoAufloeser + 'static,
{
    let ende = match state.vermittler.session_beenden(verbindung) {
        Some(e) => e,
        None => {
            return ControlMessage::new(
                request_id,
                ControlPayload::SessionEndResponse(SessionEndResponse { beendet: false }),
            );
        }
    };

    if let Some(partner) = ende.session.partner_von(verbindung) {
        state.broadcaster.an_verbindung_senden(
            partner.verbindung,
            ControlMessage::push(ControlPayload::SessionEnded(SessionEndedNotice {
                session_id: ende.session.id,
                grund: SessionEndeGrund::Aufgelegt,
            })),
        );
    }

    tracing::info!(
        verbindung = %verbindung,
        session = %ende.session.id,
        dauer_sek = ende.dauer_sek,
        grund = ?request.grund,
        "Session aufgelegt"
    );
    ControlMessage::new(
        request_id,
        ControlPayload::SessionEndResponse(SessionEndResponse { beendet: true }),
    )
}
