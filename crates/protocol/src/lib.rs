//! plauderei-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert alle Nachrichtentypen, Enums und Strukturen
//! die zwischen Client und Server ausgetauscht werden, sowie das
//! Frame-basierte Wire-Format fuer die TCP-Verbindung.

pub mod control;
pub mod wire;

pub use control::{ControlMessage, ControlPayload, ErrorCode, SignalKind};
pub use wire::FrameCodec;
