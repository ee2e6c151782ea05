//! The mutable configuration data model: sources, device scopes, app scopes.
//!
//! A [`ConfigSource`] is one configuration file's worth of data. Sources are
//! ranked by position in the slice handed to the engine — first is lowest
//! priority, last is highest, the same convention the resolver and the
//! normalizer both rely on. Within a source, later device scopes override
//! earlier ones; every layer is sparse.
//!
//! Scope matching is wildcard-style: an unset `screen`, `driver`, or
//! `executable` matches every concrete value.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// An installed device: a screen and the driver serving it. Produced by the
/// caller's device enumeration; screens without a usable driver are simply
/// absent from the list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device {
    pub screen: u32,
    pub driver: String,
}

impl Device {
    pub fn new(screen: u32, driver: impl Into<String>) -> Self {
        Device {
            screen,
            driver: driver.into(),
        }
    }
}

/// Option overrides for one application on a device. An unset `executable`
/// is the default scope, applying to every application.
///
/// `name` is a display title only; it never influences matching, resolution,
/// or the normalized-form check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppScope {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl AppScope {
    pub fn new(name: impl Into<String>, executable: Option<String>) -> Self {
        AppScope {
            name: name.into(),
            executable,
            options: BTreeMap::new(),
        }
    }
}

/// Option overrides for the devices matching `screen`/`driver`. Unset fields
/// match everything, so a scope with neither set applies to every device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceScope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(rename = "application", default, skip_serializing_if = "Vec::is_empty")]
    pub app_scopes: Vec<AppScope>,
    /// Set only by the normalizer on scopes it synthesized or recognized as
    /// canonical. Runtime state — never persisted, never hand-authored.
    #[serde(skip)]
    pub normalized: bool,
}

impl DeviceScope {
    pub fn new(screen: Option<u32>, driver: Option<String>) -> Self {
        DeviceScope {
            screen,
            driver,
            app_scopes: Vec::new(),
            normalized: false,
        }
    }

    /// The §3 matching rule: each set field must equal the device's value.
    pub fn matches(&self, device: &Device) -> bool {
        self.screen.is_none_or(|s| s == device.screen)
            && self.driver.as_deref().is_none_or(|d| d == device.driver)
    }

    /// Both `screen` and `driver` set — the scope names exactly one device.
    pub fn is_specific(&self) -> bool {
        self.screen.is_some() && self.driver.is_some()
    }

    /// First app scope for `executable` (`None` = the default scope).
    pub fn app_scope(&self, executable: Option<&str>) -> Option<&AppScope> {
        self.app_scopes
            .iter()
            .find(|a| a.executable.as_deref() == executable)
    }
}

/// One configuration source: the in-memory form of a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Stable identity, used to rank and to persist. The precedence order is
    /// positional — the caller passes sources lowest-priority first.
    #[serde(skip)]
    pub origin: PathBuf,
    /// Whether the caller may persist changes back to this origin.
    #[serde(skip)]
    pub writable: bool,
    #[serde(rename = "device", default, skip_serializing_if = "Vec::is_empty")]
    pub device_scopes: Vec<DeviceScope>,
    /// Set by every mutation, cleared on successful persist. Callers editing
    /// the model directly are expected to set it themselves.
    #[serde(skip)]
    pub modified: bool,
}

impl ConfigSource {
    pub fn new(origin: impl Into<PathBuf>, writable: bool) -> Self {
        ConfigSource {
            origin: origin.into(),
            writable,
            device_scopes: Vec::new(),
            modified: false,
        }
    }
}

/// The index of the user's own source: the last writable one, i.e. the
/// highest-priority source the caller may write back.
pub fn user_source_index(sources: &[ConfigSource]) -> Option<usize> {
    sources.iter().rposition(|s| s.writable)
}
