//! Effective option resolution: cascade ordered sources and scopes into one
//! admitted option map.
//!
//! Operates on pre-loaded sources with no I/O, so the full cascade is
//! testable with synthetic inputs. Steps:
//!
//! 1. Iterate sources in ascending priority (first = lowest, last = highest)
//! 2. Within a source, iterate device scopes in stored order; skip scopes
//!    that don't match the queried device
//! 3. Per matching scope, overlay the default app scope, then — if an
//!    executable was asked for — the scopes matching that executable
//! 4. Validate each pair against the schema; admit it if valid, or
//!    unconditionally if it comes from a trusted fully-specific scope
//! 5. Admitted pairs overwrite earlier values for the same option name
//!
//! The result is an insertion-ordered map of explicitly overridden options.
//! Options no scope touches are absent — callers wanting a complete view
//! fill the gaps from the schema defaults.
//!
//! Trusted admission is the normalizer's view of the user's own data: inside
//! the user's fully-specific device scopes, values are preserved verbatim
//! even when the currently-installed driver's schema would reject them (the
//! driver may simply be older or newer than the one that wrote them). The
//! verdict still records what the schema thinks, so callers can surface
//! unknown or invalid settings instead of silently dropping them.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::model::{ConfigSource, Device, DeviceScope};
use crate::schema::DriverSchema;

/// What the schema has to say about an admitted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Parses under the declared kind and lies within the declared ranges.
    Valid,
    /// The schema knows the option but rejects the value.
    Invalid,
    /// The option name is absent from the schema.
    Unknown,
}

/// How a value got into the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Passed schema validation.
    Validated,
    /// Taken verbatim from a trusted fully-specific scope.
    Trusted,
}

/// One resolved option value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOption {
    pub raw: String,
    pub validity: Validity,
    pub admission: Admission,
}

/// Resolution result: option name to admitted value, ordered by insertion.
pub type ResolvedOptions = IndexMap<String, ResolvedOption>;

/// What to resolve: a device, optionally an executable, and optionally the
/// index of a source whose fully-specific scopes are trusted (the user's own
/// source, during normalization).
#[derive(Debug, Clone)]
pub struct ResolveQuery<'a> {
    pub device: &'a Device,
    pub executable: Option<&'a str>,
    pub trusted_source: Option<usize>,
}

impl<'a> ResolveQuery<'a> {
    /// Plain query: no executable, nothing trusted.
    pub fn device(device: &'a Device) -> Self {
        ResolveQuery {
            device,
            executable: None,
            trusted_source: None,
        }
    }
}

/// Resolve the effective option map for a device and optional executable.
///
/// Pure: identical inputs produce identical output, and no input is mutated.
pub fn resolve(
    query: &ResolveQuery<'_>,
    sources: &[ConfigSource],
    schema: &DriverSchema,
) -> ResolvedOptions {
    let mut resolved = ResolvedOptions::new();
    for (index, source) in sources.iter().enumerate() {
        for scope in &source.device_scopes {
            if !scope.matches(query.device) {
                continue;
            }
            let trusted = query.trusted_source == Some(index) && scope.is_specific();
            overlay_app_scopes(&mut resolved, scope, None, trusted, schema);
            if query.executable.is_some() {
                overlay_app_scopes(&mut resolved, scope, query.executable, trusted, schema);
            }
        }
    }
    resolved
}

/// Resolve overlaying only app scopes whose executable is exactly
/// `executable` (`None` = the default scope, with no executable-specific
/// contributions). This is the restricted cascade normalization uses to build
/// each canonical app scope.
pub(crate) fn resolve_exact(
    device: &Device,
    executable: Option<&str>,
    trusted_source: Option<usize>,
    sources: &[ConfigSource],
    schema: &DriverSchema,
) -> ResolvedOptions {
    let mut resolved = ResolvedOptions::new();
    for (index, source) in sources.iter().enumerate() {
        for scope in &source.device_scopes {
            if !scope.matches(device) {
                continue;
            }
            let trusted = trusted_source == Some(index) && scope.is_specific();
            overlay_app_scopes(&mut resolved, scope, executable, trusted, schema);
        }
    }
    resolved
}

/// Overlay every app scope in `scope` whose executable equals `executable`,
/// in appearance order. Well-formed scopes have at most one, but legacy
/// hand-authored input may repeat an executable; later entries win.
fn overlay_app_scopes(
    resolved: &mut ResolvedOptions,
    scope: &DeviceScope,
    executable: Option<&str>,
    trusted: bool,
    schema: &DriverSchema,
) {
    for app in &scope.app_scopes {
        if app.executable.as_deref() == executable {
            overlay_options(resolved, &app.options, trusted, schema);
        }
    }
}

fn overlay_options(
    resolved: &mut ResolvedOptions,
    options: &BTreeMap<String, String>,
    trusted: bool,
    schema: &DriverSchema,
) {
    for (name, raw) in options {
        let validity = match schema.opt_info(name) {
            None => Validity::Unknown,
            Some(info) if info.validate(raw) => Validity::Valid,
            Some(_) => Validity::Invalid,
        };
        if !trusted && validity != Validity::Valid {
            tracing::debug!(option = %name, value = %raw, ?validity, "value not admitted");
            continue;
        }
        let admission = if trusted {
            Admission::Trusted
        } else {
            Admission::Validated
        };
        resolved.insert(
            name.clone(),
            ResolvedOption {
                raw: raw.clone(),
                validity,
                admission,
            },
        );
    }
}
