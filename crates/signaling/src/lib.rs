//! plauderei-signaling – TCP Control Layer
//!
//! Dieser Crate implementiert den Vermittlungs- und Relay-Service fuer
//! Plauderei. Er verwaltet TCP-Verbindungen, den Warte-Pool, die aktiven
//! Gespraechs-Sessions und leitet WebRTC-Signaling sowie Chat-Nachrichten
//! zwischen den Session-Partnern weiter.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (SignalingServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Login -> Bereit -> ImPool -> InSession -> Bereit
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- pool_handler     (Join, Leave, Matched-Push)
//!     +-- signal_handler   (Offer, Answer, ICE-Relay)
//!     +-- chat_handler     (Nachricht an Session-Partner)
//!     +-- session_handler  (Auflegen)
//!
//! ConnectionRegistry – Wer ist verbunden, in welchem Zustand
//! SessionStore       – Aktive 1:1-Sessions
//! Matchmaker         – Lebenszyklus-Uebergaenge unter einem Lock
//! EventBroadcaster   – Pushes an einzelne Verbindungen senden
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod matchmaker;
pub mod registry;
pub mod server_state;
pub mod session;
pub mod tcp;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use dispatcher::MessageDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use matchmaker::{Beitritt, Matchmaker};
pub use registry::{ConnectionRegistry, Verbindung, VerbindungsZustand};
pub use server_state::{SignalingConfig, SignalingState};
pub use session::{Session, SessionEnde, SessionStore, SessionTeilnehmer};
pub use tcp::SignalingServer;
