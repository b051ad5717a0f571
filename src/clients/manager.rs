//! Factory for per-service clients.
//!
//! The service registry is a fixed enum: one variant per service the
//! console knows how to hand out, each carrying its catalog type and
//! default API version. `ClientManager` resolves a `(service, version,
//! region)` request against the registry and the session's catalog and
//! constructs a fresh client every call. Nothing is cached, so a client
//! picked up after a token refresh is always current.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::service::ServiceClient;
use super::ClientError;
use crate::auth::Session;

/// Every service the registry can construct a client for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    Compute,
    Identity,
    Image,
    Metering,
    Network,
    ObjectStore,
    Orchestration,
    Volume,
}

impl ServiceType {
    pub const ALL: [ServiceType; 8] = [
        ServiceType::Compute,
        ServiceType::Identity,
        ServiceType::Image,
        ServiceType::Metering,
        ServiceType::Network,
        ServiceType::ObjectStore,
        ServiceType::Orchestration,
        ServiceType::Volume,
    ];

    /// The identifier callers use, which is also the catalog service type.
    pub fn id(&self) -> &'static str {
        match self {
            ServiceType::Compute => "compute",
            ServiceType::Identity => "identity",
            ServiceType::Image => "image",
            ServiceType::Metering => "metering",
            ServiceType::Network => "network",
            ServiceType::ObjectStore => "object-store",
            ServiceType::Orchestration => "orchestration",
            ServiceType::Volume => "volume",
        }
    }

    /// API version used when the caller does not ask for one.
    pub fn default_version(&self) -> &'static str {
        match self {
            ServiceType::Compute => "2",
            ServiceType::Identity => "3",
            ServiceType::Image => "2",
            ServiceType::Metering => "2",
            ServiceType::Network => "2",
            ServiceType::ObjectStore => "1",
            ServiceType::Orchestration => "1",
            ServiceType::Volume => "2",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.id() == id)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A fully resolved client request: which service, at which version, in
/// which region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSpec {
    pub service: ServiceType,
    pub version: String,
    pub region: Option<String>,
}

/// Factory for the per-service clients.
///
/// Stateless beyond its two constructor inputs; every `get_client` call
/// builds a fresh client from the session.
pub struct ClientManager {
    session: Arc<Session>,
    default_region: Option<String>,
}

impl ClientManager {
    pub fn new(session: Arc<Session>, default_region: Option<String>) -> Self {
        Self {
            session,
            default_region,
        }
    }

    /// The services this manager can construct clients for.
    pub fn available_services(&self) -> &'static [ServiceType] {
        &ServiceType::ALL
    }

    /// Resolve a request against the registry and the configured defaults.
    fn resolve(
        &self,
        service: &str,
        version: Option<&str>,
        region: Option<&str>,
    ) -> Result<ClientSpec, ClientError> {
        let service = ServiceType::from_id(service)
            .ok_or_else(|| ClientError::ServiceNotFound(service.to_string()))?;
        Ok(ClientSpec {
            service,
            version: version.unwrap_or_else(|| service.default_version()).to_string(),
            region: region
                .map(str::to_string)
                .or_else(|| self.default_region.clone()),
        })
    }

    /// Construct a client for `service`, at an explicit version and region
    /// or the configured defaults.
    ///
    /// May touch the network: the session's catalog is fetched on first
    /// use. The returned client is never cached; call again for a new one.
    pub async fn get_client(
        &self,
        service: &str,
        version: Option<&str>,
        region: Option<&str>,
    ) -> Result<ServiceClient, ClientError> {
        let spec = self.resolve(service, version, region)?;
        debug!(service = %spec.service, version = %spec.version, region = ?spec.region, "Constructing client");

        let catalog = self.session.catalog().await?;
        let endpoint = catalog
            .endpoint_for(spec.service.id(), spec.region.as_deref())
            .ok_or_else(|| ClientError::EndpointNotFound {
                service: spec.service.id(),
                region: spec.region.clone(),
            })?;

        match spec.service {
            // The object-store backend does not speak the shared session;
            // it gets its own connection derived from the session's token
            // and TLS settings. Callers see the same ServiceClient either
            // way.
            ServiceType::ObjectStore => {
                ServiceClient::direct(&self.session, spec, &endpoint.url).await
            }
            _ => Ok(ServiceClient::via_session(
                Arc::clone(&self.session),
                spec,
                &endpoint.url,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::auth::Credentials;
    use crate::cli::Cli;

    fn manager(default_region: Option<&str>) -> ClientManager {
        let cli = Cli::try_parse_from([
            "osconsole",
            "--os-token",
            "abc123",
            "--os-auth-url",
            "http://keystone.example.com:5000",
        ])
        .expect("failed to parse test args");
        let creds = Credentials::resolve(&cli, &|_| None);
        let session = Session::build(creds).expect("session should build");
        ClientManager::new(Arc::new(session), default_region.map(str::to_string))
    }

    #[test]
    fn every_registered_service_resolves() {
        let manager = manager(Some("RegionOne"));
        for service in ServiceType::ALL {
            let spec = manager
                .resolve(service.id(), None, None)
                .unwrap_or_else(|_| panic!("{} should resolve", service));
            assert_eq!(spec.service, service);
            assert_eq!(spec.version, service.default_version());
        }
    }

    #[test]
    fn unknown_service_reports_the_offending_id() {
        let manager = manager(None);
        let err = manager.resolve("does-not-exist", None, None).unwrap_err();
        match err {
            ClientError::ServiceNotFound(id) => assert_eq!(id, "does-not-exist"),
            other => panic!("expected ServiceNotFound, got {:?}", other),
        }
    }

    #[test]
    fn explicit_version_overrides_registry_default() {
        let manager = manager(None);
        let spec = manager.resolve("compute", Some("3"), None).unwrap();
        assert_eq!(spec.version, "3");

        let spec = manager.resolve("compute", None, None).unwrap();
        assert_eq!(spec.version, "2");
    }

    #[test]
    fn explicit_region_overrides_manager_default() {
        let manager = manager(Some("RegionOne"));
        let spec = manager.resolve("compute", None, Some("RegionTwo")).unwrap();
        assert_eq!(spec.region.as_deref(), Some("RegionTwo"));

        let spec = manager.resolve("compute", None, None).unwrap();
        assert_eq!(spec.region.as_deref(), Some("RegionOne"));
    }

    #[test]
    fn registry_default_versions_match_the_services() {
        assert_eq!(ServiceType::Compute.default_version(), "2");
        assert_eq!(ServiceType::Identity.default_version(), "3");
        assert_eq!(ServiceType::ObjectStore.default_version(), "1");
        assert_eq!(ServiceType::Orchestration.default_version(), "1");
    }

    #[test]
    fn service_ids_round_trip() {
        for service in ServiceType::ALL {
            assert_eq!(ServiceType::from_id(service.id()), Some(service));
        }
        assert_eq!(ServiceType::from_id("object_store"), None);
    }
}
