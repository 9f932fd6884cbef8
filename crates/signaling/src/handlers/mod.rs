//! Handler-Module fuer die einzelnen Nachrichten-Gruppen

pub mod chat_handler;
pub mod pool_handler;
pub mod session_handler;
pub mod signal_handler;
