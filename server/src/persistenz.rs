//! Persistenz-Brueckenschicht
//!
//! Verbindet die fire-and-forget `EreignisSenke` des Kerns mit den
//! Repositories aus plauderei-db. Ereignisse laufen ueber einen
//! unbounded tokio-Kanal in einen eigenen Worker-Task; eine langsame
//! Ablage kann Matching und Relay dadurch nie blockieren.

use plauderei_core::event::{EreignisSenke, PersistenzEreignis};
use plauderei_db::{ChatArchivRepository, VerlaufRepository};
use tokio::sync::mpsc;

/// EreignisSenke die Ereignisse in einen tokio-Kanal legt
///
/// `aufnehmen` blockiert nie. Ist der Worker bereits beendet, wird das
/// Ereignis mit einer Warnung verworfen.
#[derive(Debug, Clone)]
pub struct KanalSenke {
    tx: mpsc::UnboundedSender<PersistenzEreignis>,
}

impl KanalSenke {
    /// Erstellt die Senke samt Empfaenger fuer den Worker
    pub fn neu() -> (Self, mpsc::UnboundedReceiver<PersistenzEreignis>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EreignisSenke for KanalSenke {
    fn aufnehmen(&self, ereignis: PersistenzEreignis) {
        if self.tx.send(ereignis).is_err() {
            tracing::warn!("Persistenz-Worker beendet, Ereignis verworfen");
        }
    }
}

/// Worker-Loop: liest Ereignisse aus dem Kanal und schreibt sie in die
/// Repositories
///
/// Ablage-Fehler werden nur geloggt. Die Loop endet wenn alle
/// `KanalSenke`-Klone verworfen wurden.
pub async fn persistenz_worker<V, C>(
    mut rx: mpsc::UnboundedReceiver<PersistenzEreignis>,
    verlauf: V,
    archiv: C,
) where
    V: VerlaufRepository,
    C: ChatArchivRepository,
{
    tracing::info!("Persistenz-Worker gestartet");

    while let Some(ereignis) = rx.recv().await {
        match ereignis {
            PersistenzEreignis::SessionGestartet {
                session_id,
                teilnehmer,
                gestartet_am,
            } => {
                if let Err(e) = verlauf
                    .anruf_beginnen(session_id, teilnehmer, gestartet_am)
                    .await
                {
                    tracing::warn!(
                        session = %session_id,
                        fehler = %e,
                        "Verlaufseintrag konnte nicht angelegt werden"
                    );
                }
            }
            PersistenzEreignis::SessionBeendet {
                session_id,
                beendet_am,
                dauer_sek,
            } => {
                match verlauf.anruf_beenden(session_id, beendet_am, dauer_sek).await {
                    Ok(true) => {
                        tracing::debug!(
                            session = %session_id,
                            dauer_sek,
                            "Verlaufseintrag abgeschlossen"
                        );
                    }
                    Ok(false) => {
                        tracing::warn!(
                            session = %session_id,
                            "Kein offener Verlaufseintrag zur Session"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            session = %session_id,
                            fehler = %e,
                            "Verlaufseintrag konnte nicht abgeschlossen werden"
                        );
                    }
                }
            }
            PersistenzEreignis::ChatNachrichtGespeichert {
                von,
                an,
                inhalt,
                zeitstempel,
            } => {
                if let Err(e) = archiv.speichern(von, an, inhalt, zeitstempel).await {
                    tracing::warn!(
                        von = %von,
                        fehler = %e,
                        "Chat-Nachricht konnte nicht archiviert werden"
                    );
                }
            }
        }
    }

    tracing::info!("Persistenz-Worker beendet");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use plauderei_core::types::{SessionId, UserId};
    use plauderei_db::{MemoryChatArchiv, MemoryVerlauf};
    use std::sync::Arc;

    #[tokio::test]
    async fn worker_schreibt_session_lebenszyklus() {
        let (senke, rx) = KanalSenke::neu();
        let verlauf = Arc::new(MemoryVerlauf::neu());
        let archiv = Arc::new(MemoryChatArchiv::neu());

        let session_id = SessionId::new();
        let teilnehmer = [UserId::new(), UserId::new()];
        let start = Utc::now();

        senke.aufnehmen(PersistenzEreignis::SessionGestartet {
            session_id,
            teilnehmer,
            gestartet_am: start,
        });
        senke.aufnehmen(PersistenzEreignis::SessionBeendet {
            session_id,
            beendet_am: start + chrono::Duration::seconds(90),
            dauer_sek: 90,
        });
        drop(senke);

        persistenz_worker(rx, Arc::clone(&verlauf), archiv).await;

        let eintraege = verlauf.verlauf_fuer(teilnehmer[0], 10).await.unwrap();
        assert_eq!(eintraege.len(), 1);
        assert_eq!(eintraege[0].session_id, session_id);
        assert_eq!(eintraege[0].dauer_sek, Some(90));
    }

    #[tokio::test]
    async fn worker_archiviert_chat_nachrichten() {
        let (senke, rx) = KanalSenke::neu();
        let verlauf = Arc::new(MemoryVerlauf::neu());
        let archiv = Arc::new(MemoryChatArchiv::neu());

        let von = UserId::new();
        let an = UserId::new();

        senke.aufnehmen(PersistenzEreignis::ChatNachrichtGespeichert {
            von,
            an,
            inhalt: "Hallo!".into(),
            zeitstempel: Utc::now(),
        });
        drop(senke);

        persistenz_worker(rx, verlauf, Arc::clone(&archiv)).await;

        let nachrichten = archiv.nachrichten_zwischen(von, an, 10).await.unwrap();
        assert_eq!(nachrichten.len(), 1);
        assert_eq!(nachrichten[0].inhalt, "Hallo!");
    }

    #[tokio::test]
    async fn senke_ohne_worker_verwirft_still() {
        let (senke, rx) = KanalSenke::neu();
        drop(rx);
        // Darf nicht panicen
        senke.aufnehmen(PersistenzEreignis::SessionBeendet {
            session_id: SessionId::new(),
            beendet_am: Utc::now(),
            dauer_sek: 1,
        });
    }
}
