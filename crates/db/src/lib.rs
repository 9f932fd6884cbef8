//! plauderei-db – Persistenz-Abstraktion
//!
//! Das Repository-Pattern entkoppelt den Vermittlungs- und Relay-Kern
//! von der konkreten Ablage. Enthalten sind die Trait-Definitionen fuer
//! Gespraechsverlauf und Chat-Archiv sowie In-Memory-Implementierungen
//! fuer Single-Instance-Betrieb und Tests.

pub mod memory;
pub mod models;
pub mod repository;

pub use memory::{MemoryChatArchiv, MemoryVerlauf};
pub use models::{AnrufRecord, ChatNachrichtRecord};
pub use repository::{ChatArchivRepository, VerlaufRepository};
