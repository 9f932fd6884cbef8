//! Pool-Handler – Beitritt, Verlassen, Matched-Pushes
//!
//! Der Beitritt laeuft ueber den Matchmaker; kommt sofort eine
//! Vermittlung zustande, bekommen beide Teilnehmer einen Matched-Push
//! mit Session-ID, Partner-Verbindung und Partner-Land.

use plauderei_core::dienste::{GeoAufloeser, TokenPruefer};
use plauderei_core::types::ConnectionId;
use plauderei_matchmaking::MatchFilter;
use plauderei_protocol::control::{
    ControlMessage, ControlPayload, MatchedNotice, PoolJoinRequest, PoolJoinResponse,
    PoolLeaveResponse,
};
use std::sync::Arc;

use crate::matchmaker::Beitritt;
use crate::server_state::SignalingState;
use crate::session::Session;

/// Verarbeitet einen Pool-Beitritt
pub async fn handle_pool_join<A, G>(
    request: PoolJoinRequest,
    request_id: u32,
    verbindung: ConnectionId,
    state: &Arc<SignalingState<A, G>>,
) -> ControlMessage
where
    A: TokenPruefer + 'static,
    G: GeoAufloeser + 'static,
{
    let filter = MatchFilter { land: request.land };

    match state.vermittler.pool_beitreten(verbindung, filter) {
        Ok(Beitritt::Wartend) => {
            tracing::debug!(verbindung = %verbindung, "Wartet im Pool");
            ControlMessage::new(
                request_id,
                ControlPayload::PoolJoinResponse(PoolJoinResponse { wartet: true }),
            )
        }
        Ok(Beitritt::Vermittelt(session)) => {
            matched_pushes_senden(&session, state);
            ControlMessage::new(
                request_id,
                ControlPayload::PoolJoinResponse(PoolJoinResponse { wartet: false }),
            )
        }
        Err(e) => {
            tracing::debug!(verbindung = %verbindung, fehler = %e, "Pool-Beitritt abgelehnt");
            ControlMessage::error(request_id, e.error_code(), e.to_string())
        }
    }
}

/// Verarbeitet das Verlassen des Pools
pub async fn handle_pool_leave<A, G>(
    request_id: u32,
    verbindung: ConnectionId,
    state: &Arc<SignalingState<A, G>>,
) -> ControlMessage
where
    A: TokenPruefer + 'static,
    G: GeoAufloeser + 'static,
{
    let entfernt = state.vermittler.pool_verlassen(verbindung);
    ControlMessage::new(
        request_id,
        ControlPayload::PoolLeaveResponse(PoolLeaveResponse { entfernt }),
    )
}

/// Sendet Matched-Pushes an beide Teilnehmer einer neuen Session
pub fn matched_pushes_senden<A, G>(session: &Session, state: &Arc<SignalingState<A, G>>)
where
    A: TokenPruefer + 'static,
    G: GeoAufloeser + 'static,
{
    let [a, b] = &session.teilnehmer;
    for (empfaenger, partner) in [(a, b), (b, a)] {
        let zugestellt = state.broadcaster.an_verbindung_senden(
            empfaenger.verbindung,
            ControlMessage::push(ControlPayload::Matched(MatchedNotice {
                session_id: session.id,
                peer: partner.verbindung,
                peer_land: partner.land.clone(),
            })),
        );
        if !zugestellt {
            tracing::warn!(
                session = %session.id,
                verbindung = %empfaenger.verbindung,
                "Matched-Push nicht zustellbar"
            );
        }
    }
}
