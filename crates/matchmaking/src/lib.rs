//! plauderei-matchmaking – Warte-Pool und Vermittlung
//!
//! Dieses Crate enthaelt die reine Vermittlungslogik: den Warte-Pool
//! mit FIFO-Ordnung und den symmetrischen Laender-Filter. Es ist bewusst
//! frei von Nebenlaeufigkeit – der Pool ist eine einfache Datenstruktur,
//! die Serialisierung der Zugriffe uebernimmt der Aufrufer (das
//! Signaling-Crate haelt dafuer ein einziges Lebenszyklus-Lock).

pub mod error;
pub mod filter;
pub mod pool;

pub use error::PoolFehler;
pub use filter::MatchFilter;
pub use pool::{MatchingPool, PoolEintrag, VermittlungsErgebnis};
