//! Immutable driver option schemas.
//!
//! A [`DriverSchema`] is the externally supplied description of everything a
//! driver lets you tune: option names, types, defaults, valid ranges, and
//! per-language descriptions. It is constructed once — construction fails if
//! a default does not satisfy its own ranges — and never mutated afterwards;
//! resolution and normalization take it by shared reference.
//!
//! Schema *acquisition* (asking the driver stack what it supports) is a
//! collaborator concern behind the [`SchemaSource`] trait. A plain
//! `HashMap<String, DriverSchema>` implements it for tests and for callers
//! that enumerate drivers up front.

use std::collections::{BTreeMap, HashMap};

use crate::error::SchemaError;
use crate::validate::{self, OptKind, OptValue, Range, parse_ranges};

/// A description of an option or section in one language. For enum options
/// the description may label individual values.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub lang: String,
    pub text: String,
    pub enum_labels: BTreeMap<i64, String>,
}

impl Description {
    pub fn new(lang: impl Into<String>, text: impl Into<String>) -> Self {
        Description {
            lang: lang.into(),
            text: text.into(),
            enum_labels: BTreeMap::new(),
        }
    }
}

/// Pick the best description for a preferred-language list: first preference
/// that exists, then English, then anything at all.
fn best_description<'a>(descs: &'a [Description], preferred: &[&str]) -> Option<&'a Description> {
    preferred
        .iter()
        .find_map(|lang| descs.iter().find(|d| d.lang == *lang))
        .or_else(|| descs.iter().find(|d| d.lang == "en"))
        .or_else(|| descs.first())
}

/// Everything a driver advertises about one option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptInfo {
    pub name: String,
    pub kind: OptKind,
    pub default: OptValue,
    pub ranges: Vec<Range>,
    pub descriptions: Vec<Description>,
}

impl OptInfo {
    /// Build an option from its advertised attributes. `valid` is the
    /// driver's textual range list (`"0:10,12"`); `None` means unconstrained.
    ///
    /// Fails if ranges are given for a bool option, if the range syntax is
    /// malformed, or if `default` does not validate — a schema whose default
    /// breaks its own rules is rejected before it becomes usable.
    pub fn new(
        name: impl Into<String>,
        kind: OptKind,
        default: &str,
        valid: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let ranges = match valid {
            Some(_) if kind == OptKind::Bool => return Err(SchemaError::RangeOnBool(name)),
            Some(spec) => parse_ranges(spec, kind)?,
            None => Vec::new(),
        };
        let default_value = OptValue::parse(default, kind)?;
        if !validate::value_in_ranges(default_value, &ranges) {
            return Err(SchemaError::DefaultOutOfRange {
                option: name,
                value: default.to_string(),
            });
        }
        Ok(OptInfo {
            name,
            kind,
            default: default_value,
            ranges,
            descriptions: Vec::new(),
        })
    }

    /// Check a raw config value against this option's kind and ranges.
    ///
    /// Pure and total: parse failure and out-of-range both answer `false`.
    /// An enum value needs only to lie in a range — it does not need a label.
    pub fn validate(&self, raw: &str) -> bool {
        match OptValue::parse(raw, self.kind) {
            Ok(value) => validate::value_in_ranges(value, &self.ranges),
            Err(_) => false,
        }
    }

    /// Attach a per-language description. Enum labels must name values the
    /// option's ranges admit.
    pub fn describe(&mut self, desc: Description) -> Result<(), SchemaError> {
        if matches!(self.kind, OptKind::Int | OptKind::Enum) {
            for value in desc.enum_labels.keys() {
                if !validate::value_in_ranges(OptValue::Int(*value), &self.ranges) {
                    return Err(SchemaError::LabelOutOfRange {
                        option: self.name.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }
        self.descriptions.push(desc);
        Ok(())
    }

    /// The default rendered as a config string.
    pub fn default_str(&self) -> String {
        self.default.to_config_str()
    }

    pub fn description(&self, preferred: &[&str]) -> Option<&Description> {
        best_description(&self.descriptions, preferred)
    }
}

/// A titled group of options, in advertised order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptSection {
    pub descriptions: Vec<Description>,
    pub options: Vec<OptInfo>,
}

impl OptSection {
    pub fn opt_info(&self, name: &str) -> Option<&OptInfo> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn description(&self, preferred: &[&str]) -> Option<&Description> {
        best_description(&self.descriptions, preferred)
    }
}

/// The full option schema one driver advertises.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverSchema {
    pub driver: String,
    pub sections: Vec<OptSection>,
}

impl DriverSchema {
    pub fn new(driver: impl Into<String>, sections: Vec<OptSection>) -> Self {
        DriverSchema {
            driver: driver.into(),
            sections,
        }
    }

    /// Look an option up by name across all sections.
    pub fn opt_info(&self, name: &str) -> Option<&OptInfo> {
        self.sections.iter().find_map(|s| s.opt_info(name))
    }

    /// All options in section order.
    pub fn options(&self) -> impl Iterator<Item = &OptInfo> {
        self.sections.iter().flat_map(|s| s.options.iter())
    }
}

/// Collaborator interface for schema acquisition. Failure means the driver's
/// devices are excluded from schema-based validation and normalization; it
/// never aborts processing of other devices.
pub trait SchemaSource {
    fn schema(&self, driver: &str) -> Result<&DriverSchema, SchemaError>;
}

impl SchemaSource for HashMap<String, DriverSchema> {
    fn schema(&self, driver: &str) -> Result<&DriverSchema, SchemaError> {
        self.get(driver)
            .ok_or_else(|| SchemaError::Unavailable(driver.to_string()))
    }
}
