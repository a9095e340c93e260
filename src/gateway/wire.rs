//! Kong Admin API wire records
//!
//! Shapes of the JSON the admin API returns, and their conversion into
//! domain types. Kong reports empty lists as `null`, so every list field is
//! optional on the wire.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Plugin, PluginId, PluginKind, Route, RouteId, Service, ServiceId};

/// Paginated listing envelope
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Cursor for the next page; absent on the last page
    #[serde(default)]
    pub offset: Option<String>,
}

/// Foreign-key reference (`{"id": "..."}`)
#[derive(Debug, Deserialize)]
pub struct ForeignKey {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub name: Option<String>,
    pub host: Option<String>,
    pub protocol: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl From<ServiceRecord> for Service {
    fn from(record: ServiceRecord) -> Self {
        Service {
            name: record.name.unwrap_or_else(|| record.id.clone()),
            id: ServiceId::from_string(record.id),
            host: record.host,
            protocol: record.protocol,
            port: record.port,
            path: record.path,
            tags: record.tags.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RouteRecord {
    pub id: String,
    pub name: Option<String>,
    pub service: Option<ForeignKey>,
    pub hosts: Option<Vec<String>>,
    pub paths: Option<Vec<String>>,
    pub protocols: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl From<RouteRecord> for Route {
    fn from(record: RouteRecord) -> Self {
        Route {
            id: RouteId::from_string(record.id),
            name: record.name.unwrap_or_default(),
            service: record.service.map(|fk| ServiceId::from_string(fk.id)),
            hosts: record.hosts.unwrap_or_default(),
            paths: record.paths.unwrap_or_default(),
            protocols: record.protocols.unwrap_or_default(),
            tags: record.tags.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PluginRecord {
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub route: Option<ForeignKey>,
    pub service: Option<ForeignKey>,
    #[serde(default)]
    pub config: Value,
}

fn default_enabled() -> bool {
    true
}

impl From<PluginRecord> for Plugin {
    fn from(record: PluginRecord) -> Self {
        Plugin {
            id: PluginId::from_string(record.id),
            kind: PluginKind::from_name(&record.name),
            name: record.name,
            enabled: record.enabled,
            route: record.route.map(|fk| RouteId::from_string(fk.id)),
            service: record.service.map(|fk| ServiceId::from_string(fk.id)),
            config: record.config,
        }
    }
}

/// Developer-portal file object
#[derive(Debug, Deserialize)]
pub struct FileRecord {
    pub path: String,
    #[serde(default)]
    pub contents: Option<String>,
}
