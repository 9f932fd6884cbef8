//! plauderei-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Plauderei-Crates gemeinsam genutzt werden: Identifikationstypen,
//! der zentrale Fehler-Enum, Persistenz-Ereignisse und die Schnittstellen
//! zu externen Diensten (Auth, Geo).

pub mod dienste;
pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use dienste::{GeoAufloeser, TokenPruefer};
pub use error::{PlaudereiError, Result};
pub use event::{EreignisSenke, PersistenzEreignis};
pub use types::{ConnectionId, SessionId, UserId};
