//! Standard-Implementierungen der externen Dienst-Schnittstellen
//!
//! Der Kern definiert `TokenPruefer` und `GeoAufloeser` nur als Traits.
//! Dieses Modul liefert die einfachen Implementierungen fuer den
//! Single-Instance-Betrieb: Tokens sind von einem vorgelagerten
//! Auth-Dienst ausgegebene Benutzer-UUIDs, und das Land kommt aus der
//! Konfiguration statt aus einer GeoIP-Datenbank.

use plauderei_core::{
    dienste::{GeoAufloeser, TokenPruefer},
    error::{PlaudereiError, Result},
    types::UserId,
};
use std::net::IpAddr;
use uuid::Uuid;

/// Prueft Tokens die von einem externen Auth-Dienst als Benutzer-UUID
/// ausgegeben wurden
///
/// Das Token muss eine gueltige UUID sein; alles andere wird als
/// Authentifizierungsfehler abgelehnt. Ein echter Token-Dienst
/// (JWT, Opaque-Token-Introspektion) implementiert denselben Trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct EinfacherTokenPruefer;

impl TokenPruefer for EinfacherTokenPruefer {
    async fn pruefen(&self, token: &str) -> Result<UserId> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PlaudereiError::Authentifizierung("leeres Token".into()));
        }

        match Uuid::parse_str(token) {
            Ok(uuid) if !uuid.is_nil() => Ok(UserId(uuid)),
            Ok(_) => Err(PlaudereiError::Authentifizierung(
                "Nil-UUID ist kein gueltiges Token".into(),
            )),
            Err(_) => Err(PlaudereiError::Authentifizierung(
                "Token ist keine gueltige UUID".into(),
            )),
        }
    }
}

/// GeoAufloeser mit festem Laendercode aus der Konfiguration
///
/// Fuer Betrieb hinter einem Proxy, wo die Peer-Adresse nichts aussagt.
/// Ohne konfiguriertes Land gibt er `None` zurueck und der Signaling-Layer
/// faellt auf sein `standard_land` zurueck.
#[derive(Debug, Clone, Default)]
pub struct StatischesGeo {
    land: Option<String>,
}

impl StatischesGeo {
    /// Erstellt einen Aufloeser mit optionalem festen Land
    pub fn neu(land: Option<String>) -> Self {
        Self { land }
    }
}

impl GeoAufloeser for StatischesGeo {
    fn land_fuer(&self, _adresse: IpAddr) -> Option<String> {
        self.land.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gueltige_uuid_wird_akzeptiert() {
        let pruefer = EinfacherTokenPruefer;
        let uuid = Uuid::new_v4();
        let benutzer = pruefer.pruefen(&uuid.to_string()).await.unwrap();
        assert_eq!(benutzer.inner(), uuid);
    }

    #[tokio::test]
    async fn gleicher_token_gleiche_benutzer_id() {
        let pruefer = EinfacherTokenPruefer;
        let token = Uuid::new_v4().to_string();
        let a = pruefer.pruefen(&token).await.unwrap();
        let b = pruefer.pruefen(&token).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn ungueltiges_token_wird_abgelehnt() {
        let pruefer = EinfacherTokenPruefer;
        assert!(pruefer.pruefen("kein-uuid").await.is_err());
        assert!(pruefer.pruefen("").await.is_err());
        assert!(pruefer.pruefen("   ").await.is_err());
    }

    #[tokio::test]
    async fn nil_uuid_wird_abgelehnt() {
        let pruefer = EinfacherTokenPruefer;
        let result = pruefer.pruefen(&Uuid::nil().to_string()).await;
        assert!(matches!(
            result,
            Err(PlaudereiError::Authentifizierung(_))
        ));
    }

    #[test]
    fn statisches_geo_mit_land() {
        let geo = StatischesGeo::neu(Some("DE".into()));
        assert_eq!(
            geo.land_fuer("127.0.0.1".parse().unwrap()),
            Some("DE".to_string())
        );
    }

    #[test]
    fn statisches_geo_ohne_land() {
        let geo = StatischesGeo::default();
        assert_eq!(geo.land_fuer("127.0.0.1".parse().unwrap()), None);
    }
}
