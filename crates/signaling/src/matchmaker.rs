//! Matchmaker – Lebenszyklus-Uebergaenge unter einem Lock
//!
//! Alle Uebergaenge zwischen Bereit, ImPool und InSession laufen ueber
//! diesen Service. Das Mutex um den Warte-Pool ist zugleich das
//! Lebenszyklus-Lock: Anmelden, Pool-Beitritt, Vermittlung, Auflegen und
//! Trennen halten es fuer die Dauer ihres gesamten Uebergangs. Damit kann
//! eine Vermittlung nie eine Verbindung erwischen, die gleichzeitig
//! getrennt wird, und keine Verbindung landet in zwei Sessions.
//!
//! Unter dem Lock wird nie awaited und nichts gesendet. Relay-Pfade
//! (Signaling, Chat) lesen Registry und SessionStore direkt und nehmen
//! das Lock nicht.

use parking_lot::Mutex;
use plauderei_core::event::{EreignisSenke, PersistenzEreignis};
use plauderei_core::types::{ConnectionId, SessionId, UserId};
use plauderei_matchmaking::{MatchFilter, MatchingPool, PoolEintrag, PoolFehler, VermittlungsErgebnis};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{SignalingError, SignalingResult};
use crate::registry::{ConnectionRegistry, Verbindung, VerbindungsZustand};
use crate::session::{Session, SessionEnde, SessionStore, SessionTeilnehmer};

// ---------------------------------------------------------------------------
// Ergebnistypen
// ---------------------------------------------------------------------------

/// Ergebnis eines Pool-Beitritts
#[derive(Debug)]
pub enum Beitritt {
    /// Kein Kandidat verfuegbar, die Verbindung wartet im Pool
    Wartend,
    /// Sofort vermittelt
    Vermittelt(Session),
}

/// Ergebnis einer Trennung (kompletter Cleanup einer Verbindung)
#[derive(Debug, Default)]
pub struct Trennung {
    /// Die entfernte Verbindung, `None` wenn sie nie angemeldet war
    pub verbindung: Option<Verbindung>,
    /// Ob ein Pool-Eintrag entfernt wurde
    pub pool_entfernt: bool,
    /// Das Ende der aktiven Session, falls eine lief
    pub session_ende: Option<SessionEnde>,
}

// ---------------------------------------------------------------------------
// Matchmaker
// ---------------------------------------------------------------------------

/// Serialisiert alle Lebenszyklus-Uebergaenge
///
/// Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct Matchmaker {
    inner: Arc<MatchmakerInner>,
}

struct MatchmakerInner {
    /// Warte-Pool; das Mutex ist zugleich das Lebenszyklus-Lock
    pool: Mutex<MatchingPool>,
    registry: ConnectionRegistry,
    sessions: SessionStore,
    senke: Arc<dyn EreignisSenke>,
}

impl Matchmaker {
    /// Erstellt einen neuen Matchmaker
    pub fn neu(
        registry: ConnectionRegistry,
        sessions: SessionStore,
        senke: Arc<dyn EreignisSenke>,
    ) -> Self {
        Self {
            inner: Arc::new(MatchmakerInner {
                pool: Mutex::new(MatchingPool::neu()),
                registry,
                sessions,
                senke,
            }),
        }
    }

    /// Meldet eine neue Verbindung an
    ///
    /// # Fehler
    /// `DoppelteVerbindung` wenn der Benutzer bereits verbunden ist.
    pub fn verbinden(
        &self,
        benutzer: UserId,
        land: impl Into<String>,
    ) -> SignalingResult<Verbindung> {
        let _lock = self.inner.pool.lock();
        self.inner.registry.registrieren(benutzer, land)
    }

    /// Laesst eine Verbindung dem Pool beitreten und versucht sofort
    /// eine Vermittlung
    ///
    /// Vermittlung, Pool-Entnahme und Session-Anlage passieren unter dem
    /// Lebenszyklus-Lock als eine Einheit.
    ///
    /// # Fehler
    /// - `NichtGefunden` wenn die Verbindung nicht angemeldet ist
    /// - `BereitsInSession` wenn sie in einem aktiven Gespraech ist
    /// - `BereitsImPool` wenn sie schon wartet
    pub fn pool_beitreten(
        &self,
        verbindung_id: ConnectionId,
        filter: MatchFilter,
    ) -> SignalingResult<Beitritt> {
        let mut pool = self.inner.pool.lock();

        let verbindung = self
            .inner
            .registry
            .get(verbindung_id)
            .ok_or_else(|| SignalingError::NichtGefunden(format!("Verbindung {}", verbindung_id)))?;

        if let VerbindungsZustand::InSession(_) = verbindung.zustand {
            return Err(SignalingError::BereitsInSession);
        }

        let eintrag = PoolEintrag::neu(
            verbindung.id,
            verbindung.benutzer,
            verbindung.land.clone(),
            filter,
        );

        match pool.vermittlung_suchen(eintrag) {
            Ok(VermittlungsErgebnis::Wartend) => {
                self.inner
                    .registry
                    .zustand_setzen(verbindung_id, VerbindungsZustand::ImPool);
                Ok(Beitritt::Wartend)
            }
            Ok(VermittlungsErgebnis::Vermittelt(partner_eintrag)) => {
                // Der Partner stand im Pool und kann unter dem Lock nicht
                // getrennt worden sein (Trennen entfernt Pool-Eintraege
                // unter demselben Lock)
                let partner = self.inner.registry.get(partner_eintrag.verbindung).ok_or_else(
                    || SignalingError::intern("Pool-Eintrag ohne registrierte Verbindung"),
                )?;

                let session = self.inner.sessions.erstellen(
                    SessionTeilnehmer {
                        verbindung: verbindung.id,
                        benutzer: verbindung.benutzer,
                        land: verbindung.land.clone(),
                    },
                    SessionTeilnehmer {
                        verbindung: partner.id,
                        benutzer: partner.benutzer,
                        land: partner.land.clone(),
                    },
                );
                self.inner
                    .registry
                    .zustand_setzen(verbindung.id, VerbindungsZustand::InSession(session.id));
                self.inner
                    .registry
                    .zustand_setzen(partner.id, VerbindungsZustand::InSession(session.id));

                self.inner.senke.aufnehmen(PersistenzEreignis::SessionGestartet {
                    session_id: session.id,
                    teilnehmer: session.benutzer(),
                    gestartet_am: session.gestartet_am,
                });

                info!(
                    session = %session.id,
                    a = %verbindung.id,
                    b = %partner.id,
                    "Vermittlung abgeschlossen"
                );
                Ok(Beitritt::Vermittelt(session))
            }
            Err(PoolFehler::BereitsImPool) => Err(SignalingError::BereitsImPool),
        }
    }

    /// Entfernt eine Verbindung aus dem Pool
    ///
    /// Gibt `false` zurueck wenn sie nicht wartete (kein Fehler).
    pub fn pool_verlassen(&self, verbindung_id: ConnectionId) -> bool {
        let mut pool = self.inner.pool.lock();
        match pool.entfernen(verbindung_id) {
            Some(_) => {
                self.inner
                    .registry
                    .zustand_setzen(verbindung_id, VerbindungsZustand::Bereit);
                true
            }
            None => false,
        }
    }

    /// Beendet die aktive Session einer Verbindung (Auflegen)
    ///
    /// Gibt `None` zurueck wenn keine Session lief (idempotent).
    pub fn session_beenden(&self, verbindung_id: ConnectionId) -> Option<SessionEnde> {
        let _lock = self.inner.pool.lock();
        let session = self.inner.sessions.session_von(verbindung_id)?;
        self.session_abschliessen(session.id)
    }

    /// Beendet eine Session anhand ihrer ID (Watchdog-Pfad)
    pub fn session_beenden_nach_id(&self, session_id: SessionId) -> Option<SessionEnde> {
        let _lock = self.inner.pool.lock();
        self.session_abschliessen(session_id)
    }

    /// Beendet alle Sessions die laenger als `max_dauer_sek` laufen
    pub fn abgelaufene_beenden(&self, max_dauer_sek: u64) -> Vec<SessionEnde> {
        let _lock = self.inner.pool.lock();
        self.inner
            .sessions
            .aeltere_als(max_dauer_sek)
            .into_iter()
            .filter_map(|id| {
                warn!(session = %id, max_dauer_sek, "Session-Zeitlimit erreicht");
                self.session_abschliessen(id)
            })
            .collect()
    }

    /// Kompletter Cleanup einer Verbindung (Verbindungsabbruch, Logout)
    ///
    /// Entfernt Pool-Eintrag, beendet die aktive Session und meldet die
    /// Verbindung ab – alles unter dem Lebenszyklus-Lock.
    pub fn trennen(&self, verbindung_id: ConnectionId) -> Trennung {
        let mut pool = self.inner.pool.lock();

        let pool_entfernt = pool.entfernen(verbindung_id).is_some();

        let session_ende = self
            .inner
            .sessions
            .session_von(verbindung_id)
            .and_then(|session| self.session_abschliessen(session.id));

        let verbindung = self.inner.registry.entfernen(verbindung_id);

        Trennung {
            verbindung,
            pool_entfernt,
            session_ende,
        }
    }

    /// Anzahl wartender Pool-Eintraege
    pub fn wartende(&self) -> usize {
        self.inner.pool.lock().laenge()
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    /// Schliesst eine Session ab (Aufrufer haelt das Lebenszyklus-Lock)
    fn session_abschliessen(&self, session_id: SessionId) -> Option<SessionEnde> {
        let ende = self.inner.sessions.beenden(session_id)?;

        for teilnehmer in &ende.session.teilnehmer {
            self.inner
                .registry
                .zustand_setzen(teilnehmer.verbindung, VerbindungsZustand::Bereit);
        }

        self.inner.senke.aufnehmen(PersistenzEreignis::SessionBeendet {
            session_id: ende.session.id,
            beendet_am: ende.beendet_am,
            dauer_sek: ende.dauer_sek,
        });

        Some(ende)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PMutex;
    use plauderei_core::event::VerwerfendeSenke;

    /// Senke die alle Ereignisse sammelt
    #[derive(Default)]
    struct SammelSenke {
        ereignisse: PMutex<Vec<PersistenzEreignis>>,
    }

    impl EreignisSenke for SammelSenke {
        fn aufnehmen(&self, ereignis: PersistenzEreignis) {
            self.ereignisse.lock().push(ereignis);
        }
    }

    fn test_matchmaker() -> Matchmaker {
        Matchmaker::neu(
            ConnectionRegistry::neu(),
            SessionStore::neu(),
            Arc::new(VerwerfendeSenke),
        )
    }

    fn matchmaker_mit_senke() -> (Matchmaker, Arc<SammelSenke>) {
        let senke = Arc::new(SammelSenke::default());
        let mm = Matchmaker::neu(
            ConnectionRegistry::neu(),
            SessionStore::neu(),
            senke.clone(),
        );
        (mm, senke)
    }

    #[test]
    fn beitritt_ohne_partner_wartet() {
        let mm = test_matchmaker();
        let v = mm.verbinden(UserId::new(), "DE").unwrap();

        let beitritt = mm.pool_beitreten(v.id, MatchFilter::beliebig()).unwrap();
        assert!(matches!(beitritt, Beitritt::Wartend));
        assert_eq!(mm.wartende(), 1);
        assert_eq!(
            mm.inner.registry.get(v.id).unwrap().zustand,
            VerbindungsZustand::ImPool
        );
    }

    #[test]
    fn zwei_beitritte_ergeben_session() {
        let (mm, senke) = matchmaker_mit_senke();
        let a = mm.verbinden(UserId::new(), "DE").unwrap();
        let b = mm.verbinden(UserId::new(), "FR").unwrap();

        mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap();
        let beitritt = mm.pool_beitreten(b.id, MatchFilter::beliebig()).unwrap();

        let session = match beitritt {
            Beitritt::Vermittelt(s) => s,
            Beitritt::Wartend => panic!("Erwartet Vermittlung"),
        };
        assert!(session.partner_von(a.id).is_some());
        assert_eq!(mm.wartende(), 0);
        assert_eq!(mm.inner.sessions.aktive_anzahl(), 1);
        assert_eq!(
            mm.inner.registry.get(a.id).unwrap().zustand,
            VerbindungsZustand::InSession(session.id)
        );

        let ereignisse = senke.ereignisse.lock();
        assert!(matches!(
            ereignisse.as_slice(),
            [PersistenzEreignis::SessionGestartet { .. }]
        ));
    }

    #[test]
    fn beitritt_in_session_wird_abgelehnt() {
        let mm = test_matchmaker();
        let a = mm.verbinden(UserId::new(), "DE").unwrap();
        let b = mm.verbinden(UserId::new(), "FR").unwrap();
        mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap();
        mm.pool_beitreten(b.id, MatchFilter::beliebig()).unwrap();

        let fehler = mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap_err();
        assert!(matches!(fehler, SignalingError::BereitsInSession));
    }

    #[test]
    fn doppelter_beitritt_wird_abgelehnt() {
        let mm = test_matchmaker();
        let a = mm.verbinden(UserId::new(), "DE").unwrap();
        mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap();

        let fehler = mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap_err();
        assert!(matches!(fehler, SignalingError::BereitsImPool));
    }

    #[test]
    fn auflegen_beendet_fuer_beide() {
        let (mm, senke) = matchmaker_mit_senke();
        let a = mm.verbinden(UserId::new(), "DE").unwrap();
        let b = mm.verbinden(UserId::new(), "FR").unwrap();
        mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap();
        mm.pool_beitreten(b.id, MatchFilter::beliebig()).unwrap();

        let ende = mm.session_beenden(a.id).expect("Session muss laufen");
        assert!(ende.session.partner_von(b.id).is_some());

        // Idempotent: auch der Partner hat keine Session mehr
        assert!(mm.session_beenden(b.id).is_none());
        assert_eq!(
            mm.inner.registry.get(a.id).unwrap().zustand,
            VerbindungsZustand::Bereit
        );
        assert_eq!(
            mm.inner.registry.get(b.id).unwrap().zustand,
            VerbindungsZustand::Bereit
        );

        let ereignisse = senke.ereignisse.lock();
        assert_eq!(ereignisse.len(), 2); // Gestartet + Beendet
        assert!(matches!(
            ereignisse[1],
            PersistenzEreignis::SessionBeendet { .. }
        ));
    }

    #[test]
    fn trennen_raeumt_alles_auf() {
        let mm = test_matchmaker();
        let a = mm.verbinden(UserId::new(), "DE").unwrap();
        let b = mm.verbinden(UserId::new(), "FR").unwrap();
        mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap();
        mm.pool_beitreten(b.id, MatchFilter::beliebig()).unwrap();

        let trennung = mm.trennen(a.id);
        assert!(trennung.verbindung.is_some());
        assert!(!trennung.pool_entfernt);
        let ende = trennung.session_ende.expect("Session muss beendet sein");
        assert!(ende.session.partner_von(b.id).is_some());

        // Partner ist wieder Bereit und kann neu in den Pool
        assert!(mm.pool_beitreten(b.id, MatchFilter::beliebig()).is_ok());
        // Getrennte Verbindung ist abgemeldet
        assert!(!mm.inner.registry.ist_registriert(a.id));
    }

    #[test]
    fn erneutes_trennen_ist_wirkungslos() {
        let mm = test_matchmaker();
        let a = mm.verbinden(UserId::new(), "DE").unwrap();
        let b = mm.verbinden(UserId::new(), "FR").unwrap();
        mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap();
        mm.pool_beitreten(b.id, MatchFilter::beliebig()).unwrap();

        let erste = mm.trennen(a.id);
        assert!(erste.session_ende.is_some());

        // Zweites Trennen derselben Verbindung findet nichts mehr vor
        let zweite = mm.trennen(a.id);
        assert!(zweite.verbindung.is_none());
        assert!(!zweite.pool_entfernt);
        assert!(zweite.session_ende.is_none());

        // Partner und Zustaende bleiben unberuehrt
        assert!(mm.inner.registry.ist_registriert(b.id));
        assert_eq!(mm.inner.sessions.aktive_anzahl(), 0);
        assert_eq!(mm.wartende(), 0);
        assert!(mm.pool_beitreten(b.id, MatchFilter::beliebig()).is_ok());
    }

    #[test]
    fn trennen_entfernt_pool_eintrag() {
        let mm = test_matchmaker();
        let a = mm.verbinden(UserId::new(), "DE").unwrap();
        mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap();

        let trennung = mm.trennen(a.id);
        assert!(trennung.pool_entfernt);
        assert!(trennung.session_ende.is_none());
        assert_eq!(mm.wartende(), 0);
    }

    #[test]
    fn pool_verlassen_setzt_zustand_zurueck() {
        let mm = test_matchmaker();
        let a = mm.verbinden(UserId::new(), "DE").unwrap();
        mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap();

        assert!(mm.pool_verlassen(a.id));
        assert!(!mm.pool_verlassen(a.id));
        assert_eq!(
            mm.inner.registry.get(a.id).unwrap().zustand,
            VerbindungsZustand::Bereit
        );
    }

    #[test]
    fn abgelaufene_beenden_per_zeitlimit() {
        let mm = test_matchmaker();
        let a = mm.verbinden(UserId::new(), "DE").unwrap();
        let b = mm.verbinden(UserId::new(), "FR").unwrap();
        mm.pool_beitreten(a.id, MatchFilter::beliebig()).unwrap();
        mm.pool_beitreten(b.id, MatchFilter::beliebig()).unwrap();

        // Noch nicht abgelaufen
        assert!(mm.abgelaufene_beenden(3600).is_empty());
        assert_eq!(mm.inner.sessions.aktive_anzahl(), 1);
    }

    #[test]
    fn gleichzeitige_beitritte_bilden_disjunkte_paare() {
        let mm = test_matchmaker();
        let verbindungen: Vec<_> = (0..8)
            .map(|_| mm.verbinden(UserId::new(), "DE").unwrap())
            .collect();

        let handles: Vec<_> = verbindungen
            .iter()
            .map(|v| {
                let mm = mm.clone();
                let id = v.id;
                std::thread::spawn(move || mm.pool_beitreten(id, MatchFilter::beliebig()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        // 8 Beitritte ergeben genau 4 Sessions, Pool ist leer
        assert_eq!(mm.inner.sessions.aktive_anzahl(), 4);
        assert_eq!(mm.wartende(), 0);

        // Jede Verbindung ist in genau einer Session
        for v in &verbindungen {
            match mm.inner.registry.get(v.id).unwrap().zustand {
                VerbindungsZustand::InSession(session_id) => {
                    let session = mm.inner.sessions.session_von(v.id).unwrap();
                    assert_eq!(session.id, session_id);
                }
                zustand => panic!("Unerwarteter Zustand: {:?}", zustand),
            }
        }
    }

    #[test]
    fn gleichzeitiges_trennen_und_vermitteln() {
        // Trennen eines Wartenden darf nie mit einer Vermittlung
        // kollidieren: entweder die Vermittlung kam zuerst (Session mit
        // dem Wartenden) oder das Trennen (der Neue wartet)
        for _ in 0..50 {
            let mm = test_matchmaker();
            let wartender = mm.verbinden(UserId::new(), "DE").unwrap();
            let neuer = mm.verbinden(UserId::new(), "FR").unwrap();
            mm.pool_beitreten(wartender.id, MatchFilter::beliebig())
                .unwrap();

            let mm1 = mm.clone();
            let t1 = std::thread::spawn(move || mm1.trennen(wartender.id));
            let mm2 = mm.clone();
            let t2 =
                std::thread::spawn(move || mm2.pool_beitreten(neuer.id, MatchFilter::beliebig()));

            let trennung = t1.join().unwrap();
            let beitritt = t2.join().unwrap().unwrap();

            match beitritt {
                Beitritt::Vermittelt(session) => {
                    // Vermittlung kam zuerst; das Trennen hat die Session beendet
                    assert!(session.partner_von(neuer.id).is_some());
                    assert!(trennung.session_ende.is_some());
                    assert_eq!(mm.inner.sessions.aktive_anzahl(), 0);
                }
                Beitritt::Wartend => {
                    // Trennen kam zuerst; der Neue wartet allein
                    assert!(trennung.pool_entfernt);
                    assert_eq!(mm.wartende(), 1);
                }
            }
        }
    }
}
