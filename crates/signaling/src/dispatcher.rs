//! Message-Dispatcher – Routet ControlMessages an die richtigen Handler
//!
//! Der Dispatcher empfaengt ControlMessages von einer ClientConnection,
//! bestimmt den richtigen Handler und gibt die Antwort zurueck.
//!
//! ## Zustandspruefung
//! - `Login` nur solange die Verbindung nicht angemeldet ist
//! - Alle anderen Nachrichten erst nach erfolgreichem Login

use plauderei_core::dienste::{GeoAufloeser, TokenPruefer};
use plauderei_core::types::{ConnectionId, UserId};
use plauderei_protocol::control::{
    ControlMessage, ControlPayload, ErrorCode, LoginResponse, SessionEndeGrund, SessionEndedNotice,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::handlers::{chat_handler, pool_handler, session_handler, signal_handler};
use crate::server_state::SignalingState;

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
pub struct DispatcherContext {
    /// Peer-Adresse fuer GeoIP-Aufloesung
    pub peer_addr: SocketAddr,
    /// Verbindungs-ID nach erfolgreichem Login
    pub verbindung: Option<ConnectionId>,
    /// Benutzer-ID nach erfolgreichem Login
    pub benutzer: Option<UserId>,
}

impl DispatcherContext {
    /// Erstellt einen Kontext fuer eine frische Verbindung
    pub fn neu(peer_addr: SocketAddr) -> Self {
        Self {
            peer_addr,
            verbindung: None,
            benutzer: None,
        }
    }
}

/// Zentraler Message-Dispatcher
///
/// Routet eingehende ControlMessages an die entsprechenden Handler und
/// gibt die Antwort-ControlMessage zurueck.
pub struct MessageDispatcher<A, G>
where
    A: TokenPruefer + 'static,
    G: GeoAufloeser + 'static,
{
    state: Arc<SignalingState<A, G>>,
}

impl<A, G> MessageDispatcher<A, G>
where
    A: TokenPruefer + 'static,
    G: GeoAufloeser + 'static,
{
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState<A, G>>) -> Self {
        Self { state }
    }

    /// Verarbeitet eine eingehende ControlMessage und gibt die Antwort zurueck
    ///
    /// Gibt `None` zurueck wenn keine Antwort gesendet werden soll
    /// (z.B. bei Pong-Antworten die intern verarbeitet werden).
    pub async fn dispatch(
        &self,
        message: ControlMessage,
        ctx: &mut DispatcherContext,
    ) -> Option<ControlMessage> {
        let request_id = message.request_id;

        match message.payload {
            // -------------------------------------------------------------------
            // Login (immer erlaubt solange nicht angemeldet)
            // -------------------------------------------------------------------
            ControlPayload::Login(req) => {
                if ctx.verbindung.is_some() {
                    return Some(ControlMessage::error(
                        request_id,
                        ErrorCode::AlreadyLoggedIn,
                        "Bereits angemeldet",
                    ));
                }

                // Client-Limit pruefen
                if self.state.registry.anzahl() as u32 >= self.state.config.max_clients {
                    return Some(ControlMessage::error(
                        request_id,
                        ErrorCode::ServerFull,
                        "Server ist voll",
                    ));
                }

                let benutzer = match self.state.auth.pruefen(&req.token).await {
                    Ok(uid) => uid,
                    Err(e) => {
                        tracing::warn!(peer = %ctx.peer_addr, fehler = %e, "Login abgelehnt");
                        return Some(ControlMessage::error(
                            request_id,
                            ErrorCode::AuthFailed,
                            "Token ungueltig",
                        ));
                    }
                };

                let land = self
                    .state
                    .geo
                    .land_fuer(ctx.peer_addr.ip())
                    .unwrap_or_else(|| self.state.config.standard_land.clone());

                let verbindung = match self.state.vermittler.verbinden(benutzer, land) {
                    Ok(v) => v,
                    Err(e) => {
                        return Some(ControlMessage::error(
                            request_id,
                            e.error_code(),
                            e.to_string(),
                        ));
                    }
                };

                ctx.verbindung = Some(verbindung.id);
                ctx.benutzer = Some(benutzer);
                tracing::info!(
                    verbindung = %verbindung.id,
                    benutzer = %benutzer,
                    land = %verbindung.land,
                    client_version = %req.client_version,
                    "Verbindung angemeldet"
                );

                Some(ControlMessage::new(
                    request_id,
                    ControlPayload::LoginResponse(LoginResponse {
                        connection_id: verbindung.id,
                        user_id: benutzer,
                        land: verbindung.land,
                    }),
                ))
            }

            // -------------------------------------------------------------------
            // Keepalive
            // -------------------------------------------------------------------
            ControlPayload::Ping(ping) => {
                let server_ts = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;
                Some(ControlMessage::pong(
                    request_id,
                    ping.timestamp_ms,
                    server_ts,
                ))
            }

            ControlPayload::Pong(_) => {
                // Pong-Antworten vom Client werden nur geloggt (RTT-Messung)
                tracing::trace!("Pong empfangen (RTT-Messung)");
                None
            }

            // -------------------------------------------------------------------
            // Anmeldung erfordernde Nachrichten
            // -------------------------------------------------------------------
            payload => {
                let (verbindung, benutzer) = match (ctx.verbindung, ctx.benutzer) {
                    (Some(v), Some(b)) => (v, b),
                    _ => {
                        return Some(ControlMessage::error(
                            request_id,
                            ErrorCode::NotLoggedIn,
                            "Nicht angemeldet – bitte zuerst Login senden",
                        ));
                    }
                };

                self.dispatch_angemeldet(payload, request_id, verbindung, benutzer)
                    .await
            }
        }
    }

    /// Routet Nachrichten die eine Anmeldung erfordern
    async fn dispatch_angemeldet(
        &self,
        payload: ControlPayload,
        request_id: u32,
        verbindung: ConnectionId,
        benutzer: UserId,
    ) -> Option<ControlMessage> {
        match payload {
            ControlPayload::PoolJoin(req) => Some(
                pool_handler::handle_pool_join(req, request_id, verbindung, &self.state).await,
            ),

            ControlPayload::PoolLeave(_) => {
                Some(pool_handler::handle_pool_leave(request_id, verbindung, &self.state).await)
            }

            ControlPayload::Signal(req) => Some(
                signal_handler::handle_signal(req, request_id, verbindung, &self.state).await,
            ),

            ControlPayload::ChatSend(req) => Some(
                chat_handler::handle_chat_send(req, request_id, verbindung, benutzer, &self.state)
                    .await,
            ),

            ControlPayload::SessionEnd(req) => Some(
                session_handler::handle_session_end(req, request_id, verbindung, &self.state)
                    .await,
            ),

            // Login/Ping/Pong werden bereits in `dispatch` verarbeitet und
            // kommen hier nicht an. Server->Client Nachrichten vom Client
            // sind Protokollfehler.
            ControlPayload::Login(_)
            | ControlPayload::Ping(_)
            | ControlPayload::Pong(_)
            | ControlPayload::LoginResponse(_)
            | ControlPayload::PoolJoinResponse(_)
            | ControlPayload::PoolLeaveResponse(_)
            | ControlPayload::Matched(_)
            | ControlPayload::SignalAck
            | ControlPayload::SignalDelivery(_)
            | ControlPayload::ChatSendResponse(_)
            | ControlPayload::ChatDelivery(_)
            | ControlPayload::SessionEndResponse(_)
            | ControlPayload::SessionEnded(_)
            | ControlPayload::Error(_) => {
                tracing::warn!(request_id, "Unerwartete Nachricht vom Client empfangen");
                Some(ControlMessage::error(
                    request_id,
                    ErrorCode::InvalidRequest,
                    "Unerwartete Nachricht",
                ))
            }
        }
    }

    /// Bereinigt alle Ressourcen einer Verbindung beim Trennen
    ///
    /// Beendet Pool-Eintrag und Session ueber den Matchmaker und
    /// informiert den Session-Partner mit einem SessionEnded-Push.
    pub fn client_cleanup(&self, verbindung: ConnectionId) {
        let trennung = self.state.vermittler.trennen(verbindung);

        if let Some(ende) = &trennung.session_ende {
            if let Some(partner) = ende.session.partner_von(verbindung) {
                self.state.broadcaster.an_verbindung_senden(
                    partner.verbindung,
                    ControlMessage::push(ControlPayload::SessionEnded(SessionEndedNotice {
                        session_id: ende.session.id,
                        grund: SessionEndeGrund::PartnerGetrennt,
                    })),
                );
            }
        }

        self.state.broadcaster.client_entfernen(verbindung);
        tracing::debug!(verbindung = %verbindung, "Client-Ressourcen bereinigt");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
