//! Repository-Trait-Definitionen
//!
//! Die Traits trennen die Ereignisverarbeitung von der konkreten Ablage.
//! Die mitgelieferte In-Memory-Implementierung genuegt fuer
//! Single-Instance-Betrieb; ein SQL- oder Dokument-Backend kann die
//! Traits spaeter implementieren ohne den Kern anzufassen.

use chrono::{DateTime, Utc};
use plauderei_core::{
    error::Result,
    types::{SessionId, UserId},
};
use std::sync::Arc;

use crate::models::{AnrufRecord, ChatNachrichtRecord};

/// Repository fuer den Gespraechsverlauf
#[allow(async_fn_in_trait)]
pub trait VerlaufRepository: Send + Sync {
    /// Legt beim Session-Start einen neuen Verlaufseintrag an
    async fn anruf_beginnen(
        &self,
        session_id: SessionId,
        teilnehmer: [UserId; 2],
        gestartet_am: DateTime<Utc>,
    ) -> Result<AnrufRecord>;

    /// Vervollstaendigt den Eintrag beim Session-Ende
    ///
    /// Gibt `false` zurueck wenn kein offener Eintrag zur Session
    /// existiert (z.B. nach einem Neustart).
    async fn anruf_beenden(
        &self,
        session_id: SessionId,
        beendet_am: DateTime<Utc>,
        dauer_sek: u64,
    ) -> Result<bool>;

    /// Laedt die juengsten Gespraeche eines Benutzers, neueste zuerst
    async fn verlauf_fuer(&self, benutzer: UserId, limit: usize) -> Result<Vec<AnrufRecord>>;
}

/// Repository fuer das Chat-Archiv
#[allow(async_fn_in_trait)]
pub trait ChatArchivRepository: Send + Sync {
    /// Archiviert eine weitergeleitete Chat-Nachricht
    async fn speichern(
        &self,
        von: UserId,
        an: UserId,
        inhalt: String,
        gesendet_am: DateTime<Utc>,
    ) -> Result<ChatNachrichtRecord>;

    /// Laedt die Nachrichten zwischen zwei Benutzern, aelteste zuerst
    async fn nachrichten_zwischen(
        &self,
        a: UserId,
        b: UserId,
        limit: usize,
    ) -> Result<Vec<ChatNachrichtRecord>>;
}

// Arc-Weiterleitungen, damit Worker und Server dasselbe Repository teilen
// koennen.

impl<T: VerlaufRepository> VerlaufRepository for Arc<T> {
    async fn anruf_beginnen(
        &self,
        session_id: SessionId,
        teilnehmer: [UserId; 2],
        gestartet_am: DateTime<Utc>,
    ) -> Result<AnrufRecord> {
        (**self).anruf_beginnen(session_id, teilnehmer, gestartet_am).await
    }

    async fn anruf_beenden(
        &self,
        session_id: SessionId,
        beendet_am: DateTime<Utc>,
        dauer_sek: u64,
    ) -> Result<bool> {
        (**self).anruf_beenden(session_id, beendet_am, dauer_sek).await
    }

    async fn verlauf_fuer(&self, benutzer: UserId, limit: usize) -> Result<Vec<AnrufRecord>> {
        (**self).verlauf_fuer(benutzer, limit).await
    }
}

impl<T: ChatArchivRepository> ChatArchivRepository for Arc<T> {
    async fn speichern(
        &self,
        von: UserId,
        an: UserId,
        inhalt: String,
        gesendet_am: DateTime<Utc>,
    ) -> Result<ChatNachrichtRecord> {
        (**self).speichern(von, an, inhalt, gesendet_am).await
    }

    async fn nachrichten_zwischen(
        &self,
        a: UserId,
        b: UserId,
        limit: usize,
    ) -> Result<Vec<ChatNachrichtRecord>> {
        (**self).nachrichten_zwischen(a, b, limit).await
    }
}
