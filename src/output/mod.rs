//! Terminal output helpers: colors, tables, JSON, and command timing.

use std::time::Instant;

use colored::Colorize;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use crate::auth::ServiceCatalog;
use crate::clients::ServiceType;

/// Disable colors when stdout is not a terminal or the user asked us not
/// to. `colored` already honors NO_COLOR; ANSI_COLORS_DISABLED is kept for
/// compatibility with the openstack client family.
pub fn init_colors() {
    if std::env::var_os("ANSI_COLORS_DISABLED").is_some() {
        colored::control::set_override(false);
    }
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red());
}

pub fn print_warning(text: &str) {
    eprintln!("{}", text.yellow());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

/// Indented JSON for shell command results
pub fn json_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format the service registry as an ASCII table
pub fn format_services(services: &[ServiceType]) -> String {
    #[derive(Tabled)]
    struct ServiceRow {
        #[tabled(rename = "SERVICE")]
        service: &'static str,
        #[tabled(rename = "DEFAULT VERSION")]
        version: &'static str,
    }

    let rows: Vec<ServiceRow> = services
        .iter()
        .map(|s| ServiceRow {
            service: s.id(),
            version: s.default_version(),
        })
        .collect();

    Table::new(rows).with(Style::sharp()).to_string()
}

/// Format the session's service catalog as an ASCII table
pub fn format_catalog(catalog: &ServiceCatalog) -> String {
    if catalog.entries().is_empty() {
        return "Catalog is empty (unscoped token?)".to_string();
    }

    #[derive(Tabled)]
    struct EndpointRow {
        #[tabled(rename = "TYPE")]
        service_type: String,
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "REGION")]
        region: String,
        #[tabled(rename = "INTERFACE")]
        interface: String,
        #[tabled(rename = "URL")]
        url: String,
    }

    let mut rows = Vec::new();
    for entry in catalog.entries() {
        for ep in &entry.endpoints {
            rows.push(EndpointRow {
                service_type: entry.service_type.clone(),
                name: entry.name.clone(),
                region: ep.region.clone().unwrap_or_default(),
                interface: ep.interface.clone(),
                url: ep.url.clone(),
            });
        }
    }

    Table::new(rows).with(Style::sharp()).to_string()
}

/// Prints "<desc> took: <elapsed>" when dropped. Wrap a network command
/// in one of these to report how long it ran.
pub struct Timer {
    desc: String,
    start: Instant,
}

impl Timer {
    pub fn start(desc: impl Into<String>) -> Self {
        Timer {
            desc: desc.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        println!("{} took: {:.3}s", self.desc, elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }

    #[test]
    fn services_table_lists_every_service() {
        let table = format_services(&ServiceType::ALL);
        for service in ServiceType::ALL {
            assert!(table.contains(service.id()), "missing {}", service);
        }
        assert!(table.contains("DEFAULT VERSION"));
    }

    #[test]
    fn json_pretty_indents() {
        let value = serde_json::json!({"a": [1, 2]});
        let rendered = json_pretty(&value);
        assert!(rendered.contains("\n"));
        assert!(rendered.contains("\"a\""));
    }
}
