//! Fehlertypen des Matchmaking-Crates

use thiserror::Error;

/// Fehler bei Pool-Operationen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolFehler {
    /// Die Verbindung wartet bereits im Pool
    #[error("Verbindung wartet bereits im Pool")]
    BereitsImPool,
}
