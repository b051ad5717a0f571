//! Service catalog returned alongside a Keystone token.
//!
//! The catalog maps service types to the endpoints published for each
//! region/interface. Endpoint resolution here is pure; the network side
//! lives in [`super::Session`].

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub interface: String,
    #[serde(default, alias = "region_id")]
    pub region: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    entries: Vec<CatalogEntry>,
}

impl ServiceCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Find the published URL for a service type on the public interface.
    ///
    /// With a region given, only endpoints in that region match. Without
    /// one, the first public endpoint wins, which is what single-region
    /// clouds publish anyway.
    pub fn endpoint_for(&self, service_type: &str, region: Option<&str>) -> Option<&Endpoint> {
        self.entries
            .iter()
            .filter(|entry| entry.service_type == service_type)
            .flat_map(|entry| entry.endpoints.iter())
            .find(|ep| {
                ep.interface == "public"
                    && match region {
                        Some(wanted) => ep.region.as_deref() == Some(wanted),
                        None => true,
                    }
            })
    }
}
