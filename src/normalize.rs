//! Canonical configuration synthesis and redundancy elimination.
//!
//! Normalization rewrites the user's source into an explicit, minimal,
//! idempotent form: one fully-specific device scope per installed device,
//! whose default app scope pins every schema option to an explicit value.
//! Because the synthesized scopes are appended (append = highest precedence),
//! they re-establish the entire configuration of each device and make earlier
//! fully-specific scopes for the same device unreachable — those are pruned.
//!
//! [`is_normalized`] answers whether the user's source already has this shape
//! without mutating anything, by re-deriving what synthesis would produce and
//! comparing structurally. App scope display names are ignored throughout —
//! a normalized file is normalized regardless of what the entries are called.
//!
//! Devices whose driver cannot supply a schema are skipped entirely: no
//! synthesized scope, no pruning, no effect on other devices.

use std::collections::BTreeSet;

use crate::model::{AppScope, ConfigSource, Device, DeviceScope, user_source_index};
use crate::resolve::resolve_exact;
use crate::schema::SchemaSource;

/// Synthesize the canonical device scope for every schema-resolvable
/// installed device, without touching any source.
///
/// Each scope carries a default app scope holding every schema option at its
/// default, overlaid with the values resolution admits for the device, then
/// one app scope per executable referenced anywhere in any source's matching
/// scopes. Values from the user's own fully-specific scopes are trusted
/// verbatim; everything else must validate.
///
/// Returns an empty list when there is no user source to normalize into.
pub fn synthesize_device_scopes(
    devices: &[Device],
    sources: &[ConfigSource],
    schemas: &impl SchemaSource,
) -> Vec<DeviceScope> {
    let Some(user_index) = user_source_index(sources) else {
        tracing::debug!("no writable source; nothing to synthesize");
        return Vec::new();
    };

    let mut synthesized = Vec::new();
    for device in devices {
        let schema = match schemas.schema(&device.driver) {
            Ok(schema) => schema,
            Err(err) => {
                tracing::warn!(
                    screen = device.screen,
                    driver = %device.driver,
                    error = %err,
                    "skipping device without a usable option schema"
                );
                continue;
            }
        };

        let mut scope = DeviceScope::new(Some(device.screen), Some(device.driver.clone()));
        scope.normalized = true;

        let mut default_app = AppScope::new("Default", None);
        for opt in schema.options() {
            default_app.options.insert(opt.name.clone(), opt.default_str());
        }
        let admitted = resolve_exact(device, None, Some(user_index), sources, schema);
        for (name, value) in admitted {
            default_app.options.insert(name, value.raw);
        }
        scope.app_scopes.push(default_app);

        for (executable, display_name) in referenced_executables(device, sources) {
            let admitted =
                resolve_exact(device, Some(&executable), Some(user_index), sources, schema);
            let mut app = AppScope::new(display_name, Some(executable));
            for (name, value) in admitted {
                app.options.insert(name, value.raw);
            }
            scope.app_scopes.push(app);
        }

        synthesized.push(scope);
    }
    synthesized
}

/// Every executable referenced by an app scope applying to `device`, in
/// first-appearance order, paired with the display name it first appeared
/// under.
fn referenced_executables(device: &Device, sources: &[ConfigSource]) -> Vec<(String, String)> {
    let mut executables: Vec<(String, String)> = Vec::new();
    for source in sources {
        for scope in &source.device_scopes {
            if !scope.matches(device) {
                continue;
            }
            for app in &scope.app_scopes {
                if let Some(exe) = &app.executable
                    && !executables.iter().any(|(e, _)| e == exe)
                {
                    executables.push((exe.clone(), app.name.clone()));
                }
            }
        }
    }
    executables
}

/// Remove device scopes the canonical set makes redundant: non-normalized,
/// fully-specific scopes naming a `(screen, driver)` pair the canonical set
/// covers. Once the canonical scope exists at higher precedence and
/// re-establishes every default explicitly, such scopes can no longer
/// influence resolution.
///
/// Returns the number of scopes removed; marks the source modified if any.
pub fn remove_redundant_devices(source: &mut ConfigSource, canonical: &[DeviceScope]) -> usize {
    let before = source.device_scopes.len();
    source.device_scopes.retain(|scope| {
        let redundant = !scope.normalized
            && scope.is_specific()
            && canonical
                .iter()
                .any(|c| c.screen == scope.screen && c.driver == scope.driver);
        if redundant {
            tracing::debug!(
                screen = scope.screen,
                driver = scope.driver.as_deref(),
                "removing redundant device scope"
            );
        }
        !redundant
    });
    let removed = before - source.device_scopes.len();
    if removed > 0 {
        source.modified = true;
    }
    removed
}

/// Check whether the user source is already in normalized form.
///
/// On success, returns the canonical scopes found at the end of the user
/// source (an empty list when there is no user source or no resolvable
/// device). Returns `None` — with a diagnostic — when the source is not
/// normalized; nothing is mutated either way.
pub fn is_normalized(
    devices: &[Device],
    sources: &[ConfigSource],
    schemas: &impl SchemaSource,
) -> Option<Vec<DeviceScope>> {
    let canonical = synthesize_device_scopes(devices, sources, schemas);
    let Some(user_index) = user_source_index(sources) else {
        return Some(Vec::new());
    };
    let user = &sources[user_index];
    let run = normalized_run(user, &canonical)?;
    Some(run.iter().map(|&i| user.device_scopes[i].clone()).collect())
}

/// Normalize the user source: append the canonical device scopes and prune
/// the legacy scopes they make redundant. If the source is already
/// normalized, the existing canonical scopes are only marked as such — no
/// re-synthesis is installed — and pruning still runs (it is a no-op on an
/// already-pruned source).
///
/// Returns the canonical scopes (freshly appended or recognized), which
/// callers can use to render what changed. Without a writable user source
/// this is a no-op returning an empty list.
pub fn normalize(
    devices: &[Device],
    sources: &mut [ConfigSource],
    schemas: &impl SchemaSource,
) -> Vec<DeviceScope> {
    let canonical = synthesize_device_scopes(devices, sources, schemas);
    let Some(user_index) = user_source_index(sources) else {
        return Vec::new();
    };
    let existing = normalized_run(&sources[user_index], &canonical);

    let result = match existing {
        Some(run) if !run.is_empty() => {
            let user = &mut sources[user_index];
            for &index in &run {
                user.device_scopes[index].normalized = true;
            }
            run.iter()
                .map(|&index| user.device_scopes[index].clone())
                .collect()
        }
        _ if !canonical.is_empty() => {
            let user = &mut sources[user_index];
            user.device_scopes.extend(canonical.iter().cloned());
            user.modified = true;
            canonical
        }
        _ => return Vec::new(),
    };

    remove_redundant_devices(&mut sources[user_index], &result);
    result
}

/// Locate the canonical run at the end of `user`'s device scopes and verify
/// it matches `canonical` structurally. Returns the matched indices in
/// canonical (device) order.
///
/// The run is the maximal trailing sequence of fully-specific scopes. Run
/// entries naming a device with no canonical counterpart (stale hardware,
/// schema-less drivers) are tolerated and skipped; a canonical device that is
/// missing or matched twice fails the check.
fn normalized_run(user: &ConfigSource, canonical: &[DeviceScope]) -> Option<Vec<usize>> {
    let scopes = &user.device_scopes;
    let mut start = scopes.len();
    while start > 0 && scopes[start - 1].is_specific() {
        start -= 1;
    }

    let mut matched: Vec<Option<usize>> = vec![None; canonical.len()];
    for index in start..scopes.len() {
        let scope = &scopes[index];
        let Some(slot) = canonical
            .iter()
            .position(|c| c.screen == scope.screen && c.driver == scope.driver)
        else {
            continue;
        };
        if matched[slot].replace(index).is_some() {
            tracing::debug!(
                screen = scope.screen,
                driver = scope.driver.as_deref(),
                "not normalized: device configured more than once in the trailing run"
            );
            return None;
        }
    }

    let mut run = Vec::with_capacity(canonical.len());
    for (canonical_scope, slot) in canonical.iter().zip(&matched) {
        match slot {
            Some(index) => run.push(*index),
            None => {
                tracing::debug!(
                    screen = canonical_scope.screen,
                    driver = canonical_scope.driver.as_deref(),
                    "not normalized: installed device missing from the trailing run"
                );
                return None;
            }
        }
    }

    for (&index, canonical_scope) in run.iter().zip(canonical) {
        if !scope_matches_canonical(&scopes[index], canonical_scope) {
            return None;
        }
    }
    Some(run)
}

/// Structural comparison of one observed scope against its canonical
/// counterpart: default app first, every other executable distinct, the same
/// executable set, and identical option maps. Display names are ignored.
fn scope_matches_canonical(observed: &DeviceScope, canonical: &DeviceScope) -> bool {
    let Some(first) = observed.app_scopes.first() else {
        tracing::debug!("not normalized: scope without app scopes");
        return false;
    };
    if first.executable.is_some() {
        tracing::debug!("not normalized: first app scope is not the default");
        return false;
    }

    let mut observed_exes = BTreeSet::new();
    for app in &observed.app_scopes[1..] {
        let Some(exe) = app.executable.as_deref() else {
            tracing::debug!("not normalized: second default app scope");
            return false;
        };
        if !observed_exes.insert(exe) {
            tracing::debug!(executable = exe, "not normalized: executable configured twice");
            return false;
        }
    }

    let canonical_exes: BTreeSet<&str> = canonical.app_scopes[1..]
        .iter()
        .filter_map(|a| a.executable.as_deref())
        .collect();
    if observed_exes != canonical_exes {
        tracing::debug!("not normalized: executable sets differ");
        return false;
    }

    for canonical_app in &canonical.app_scopes {
        let observed_app = observed
            .app_scope(canonical_app.executable.as_deref())
            .expect("executable sets were just compared");
        if observed_app.options != canonical_app.options {
            tracing::debug!(
                executable = canonical_app.executable.as_deref(),
                "not normalized: option map differs from canonical form"
            );
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{app, device_scope, foo_schema, schemas, source, wildcard_scope};
    use crate::model::Device;
    use crate::schema::DriverSchema;
    use std::collections::HashMap;

    fn foo_only() -> HashMap<String, DriverSchema> {
        let mut map = HashMap::new();
        map.insert("foo".to_string(), foo_schema());
        map
    }

    fn opts(pairs: &[(&str, &str)]) -> std::collections::BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn end_to_end_wildcard_override_is_materialized() {
        let devices = vec![Device::new(0, "foo")];
        let mut sources = vec![source(
            "/home/alex/.drirc.toml",
            true,
            vec![wildcard_scope(vec![app(None, &[("aa", "true")])])],
        )];

        let result = normalize(&devices, &mut sources, &schemas());

        assert_eq!(result.len(), 1);
        let canonical = &result[0];
        assert_eq!(canonical.screen, Some(0));
        assert_eq!(canonical.driver.as_deref(), Some("foo"));
        assert!(canonical.normalized);
        assert_eq!(
            canonical.app_scopes[0].options,
            opts(&[("aa", "true"), ("bb", "2")]),
        );

        // The wildcard scope is not fully specific, so it survives pruning.
        let user = &sources[0];
        assert_eq!(user.device_scopes.len(), 2);
        assert!(user.device_scopes[0].screen.is_none());
        assert!(user.device_scopes[1].normalized);
        assert!(user.modified);
    }

    #[test]
    fn redundant_specific_scope_is_pruned() {
        let devices = vec![Device::new(0, "foo")];
        let mut sources = vec![source(
            "/home/alex/.drirc.toml",
            true,
            vec![device_scope(0, "foo", vec![app(None, &[("bb", "4")])])],
        )];

        let result = normalize(&devices, &mut sources, &foo_only());

        assert_eq!(result.len(), 1);
        let user = &sources[0];
        assert_eq!(user.device_scopes.len(), 1);
        assert!(user.device_scopes[0].normalized);
        // The legacy value was folded in before the scope was pruned.
        assert_eq!(
            user.device_scopes[0].app_scopes[0].options,
            opts(&[("aa", "false"), ("bb", "4")]),
        );
    }

    #[test]
    fn normalize_then_is_normalized() {
        let devices = vec![Device::new(0, "foo")];
        let schemas = foo_only();
        let mut sources = vec![
            source(
                "/etc/drirc.toml",
                false,
                vec![wildcard_scope(vec![app(None, &[("bb", "1")])])],
            ),
            source(
                "/home/alex/.drirc.toml",
                true,
                vec![wildcard_scope(vec![app(Some("quake3"), &[("aa", "true")])])],
            ),
        ];

        assert!(is_normalized(&devices, &sources, &schemas).is_none());
        let first = normalize(&devices, &mut sources, &schemas);
        let evidence = is_normalized(&devices, &sources, &schemas)
            .expect("freshly normalized source must pass the check");
        assert_eq!(first, evidence);
    }

    #[test]
    fn second_normalize_is_a_fixed_point() {
        let devices = vec![Device::new(0, "foo")];
        let schemas = foo_only();
        let mut sources = vec![source(
            "/home/alex/.drirc.toml",
            true,
            vec![
                wildcard_scope(vec![app(None, &[("aa", "true")])]),
                device_scope(0, "foo", vec![app(None, &[("bb", "5")])]),
            ],
        )];

        let first = normalize(&devices, &mut sources, &schemas);
        let snapshot = sources[0].device_scopes.clone();

        let second = normalize(&devices, &mut sources, &schemas);
        assert_eq!(first, second);
        assert_eq!(sources[0].device_scopes, snapshot);
    }

    #[test]
    fn duplicate_specific_scopes_converge_in_one_pass() {
        let devices = vec![Device::new(0, "foo")];
        let schemas = foo_only();
        let mut sources = vec![source(
            "/home/alex/.drirc.toml",
            true,
            vec![
                device_scope(0, "foo", vec![app(None, &[("bb", "1")])]),
                device_scope(0, "foo", vec![app(None, &[("bb", "3")])]),
            ],
        )];

        assert!(is_normalized(&devices, &sources, &schemas).is_none());

        let result = normalize(&devices, &mut sources, &schemas);
        assert_eq!(result.len(), 1);
        // Both ambiguous duplicates are gone; the later one's value won.
        assert_eq!(sources[0].device_scopes.len(), 1);
        assert_eq!(
            sources[0].device_scopes[0].app_scopes[0].options,
            opts(&[("aa", "false"), ("bb", "3")]),
        );
        assert!(is_normalized(&devices, &sources, &schemas).is_some());
    }

    #[test]
    fn executables_are_materialized_per_device() {
        let devices = vec![Device::new(0, "foo")];
        let mut sources = vec![
            source(
                "/etc/drirc.toml",
                false,
                vec![wildcard_scope(vec![app(Some("quake3"), &[("bb", "3")])])],
            ),
            source(
                "/home/alex/.drirc.toml",
                true,
                vec![wildcard_scope(vec![app(
                    Some("glxgears"),
                    &[("aa", "true")],
                )])],
            ),
        ];

        let result = normalize(&devices, &mut sources, &foo_only());
        let canonical = &result[0];
        assert_eq!(canonical.app_scopes.len(), 3);
        let quake = canonical.app_scope(Some("quake3")).unwrap();
        assert_eq!(quake.options, opts(&[("bb", "3")]));
        let gears = canonical.app_scope(Some("glxgears")).unwrap();
        assert_eq!(gears.options, opts(&[("aa", "true")]));
    }

    #[test]
    fn executable_scopes_do_not_inherit_default_scope_options() {
        let devices = vec![Device::new(0, "foo")];
        let mut sources = vec![source(
            "/home/alex/.drirc.toml",
            true,
            vec![wildcard_scope(vec![
                app(None, &[("bb", "1")]),
                app(Some("quake3"), &[("aa", "true")]),
            ])],
        )];

        let result = normalize(&devices, &mut sources, &foo_only());
        let quake = result[0].app_scope(Some("quake3")).unwrap();
        assert_eq!(quake.options, opts(&[("aa", "true")]));
    }

    #[test]
    fn unknown_option_in_users_specific_scope_is_carried_verbatim() {
        let devices = vec![Device::new(0, "foo")];
        let mut sources = vec![
            source(
                "/etc/drirc.toml",
                false,
                // Unknown option in an untrusted source: dropped.
                vec![wildcard_scope(vec![app(None, &[("zz", "1")])])],
            ),
            source(
                "/home/alex/.drirc.toml",
                true,
                vec![device_scope(0, "foo", vec![app(None, &[("old_knob", "on")])])],
            ),
        ];

        let result = normalize(&devices, &mut sources, &foo_only());
        let default_app = &result[0].app_scopes[0];
        assert_eq!(default_app.options.get("old_knob").map(String::as_str), Some("on"));
        assert!(!default_app.options.contains_key("zz"));
    }

    #[test]
    fn device_without_schema_is_skipped_not_fatal() {
        let devices = vec![Device::new(0, "foo"), Device::new(1, "mystery")];
        let mut sources = vec![source("/home/alex/.drirc.toml", true, vec![])];

        let result = normalize(&devices, &mut sources, &foo_only());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].driver.as_deref(), Some("foo"));
    }

    #[test]
    fn no_writable_source_is_a_no_op() {
        let devices = vec![Device::new(0, "foo")];
        let mut sources = vec![source(
            "/etc/drirc.toml",
            false,
            vec![wildcard_scope(vec![app(None, &[("aa", "true")])])],
        )];

        let result = normalize(&devices, &mut sources, &foo_only());
        assert!(result.is_empty());
        assert_eq!(sources[0].device_scopes.len(), 1);
        assert!(!sources[0].modified);
        assert_eq!(
            is_normalized(&devices, &sources, &foo_only()),
            Some(Vec::new())
        );
    }

    #[test]
    fn check_fails_when_run_is_not_trailing() {
        let devices = vec![Device::new(0, "foo")];
        let schemas = foo_only();
        let mut sources = vec![source("/home/alex/.drirc.toml", true, vec![])];
        normalize(&devices, &mut sources, &schemas);

        // A wildcard scope appended after the canonical run breaks it.
        sources[0].device_scopes.push(wildcard_scope(vec![]));
        assert!(is_normalized(&devices, &sources, &schemas).is_none());
    }

    #[test]
    fn check_fails_on_second_default_app() {
        let devices = vec![Device::new(0, "foo")];
        let schemas = foo_only();
        let mut sources = vec![source("/home/alex/.drirc.toml", true, vec![])];
        normalize(&devices, &mut sources, &schemas);

        let scope = sources[0].device_scopes.last_mut().unwrap();
        scope.app_scopes.push(app(None, &[]));
        assert!(is_normalized(&devices, &sources, &schemas).is_none());
    }

    #[test]
    fn check_fails_on_option_drift() {
        let devices = vec![Device::new(0, "foo")];
        let schemas = foo_only();
        let mut sources = vec![source("/home/alex/.drirc.toml", true, vec![])];
        normalize(&devices, &mut sources, &schemas);

        // Editing a value inside the run stays self-consistent (the run is
        // trusted input to re-synthesis), but dropping a key is drift: the
        // canonical expectation always carries every schema option.
        let scope = sources[0].device_scopes.last_mut().unwrap();
        scope.app_scopes[0].options.remove("aa");
        assert!(is_normalized(&devices, &sources, &schemas).is_none());
    }

    #[test]
    fn check_ignores_display_names() {
        let devices = vec![Device::new(0, "foo")];
        let schemas = foo_only();
        let mut sources = vec![source(
            "/home/alex/.drirc.toml",
            true,
            vec![wildcard_scope(vec![app(Some("quake3"), &[("aa", "true")])])],
        )];
        normalize(&devices, &mut sources, &schemas);

        let scope = sources[0].device_scopes.last_mut().unwrap();
        scope.app_scopes[0].name = "All my applications".to_string();
        scope.app_scopes[1].name = "Quake III Arena".to_string();
        assert!(is_normalized(&devices, &sources, &schemas).is_some());
    }

    #[test]
    fn stale_device_entry_in_run_is_tolerated() {
        let devices = vec![Device::new(0, "foo")];
        let schemas = foo_only();
        let mut sources = vec![source(
            "/home/alex/.drirc.toml",
            true,
            // A fully-specific scope for hardware that is no longer
            // installed sits right where the canonical run begins.
            vec![device_scope(0, "voodoo", vec![app(None, &[("gamma", "1")])])],
        )];

        normalize(&devices, &mut sources, &schemas);
        assert_eq!(sources[0].device_scopes.len(), 2);
        let evidence = is_normalized(&devices, &sources, &schemas).unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].driver.as_deref(), Some("foo"));
    }

    #[test]
    fn already_normalized_source_is_only_marked_and_pruned() {
        let devices = vec![Device::new(0, "foo")];
        let schemas = foo_only();
        let mut sources = vec![source("/home/alex/.drirc.toml", true, vec![])];
        let first = normalize(&devices, &mut sources, &schemas);
        assert_eq!(sources[0].device_scopes.len(), 1);

        // Reload-equivalent: the normalized flag is runtime state and would
        // be absent after a round-trip through persistence.
        sources[0].device_scopes[0].normalized = false;
        sources[0].modified = false;

        let second = normalize(&devices, &mut sources, &schemas);
        assert_eq!(first, second);
        assert_eq!(sources[0].device_scopes.len(), 1);
        assert!(sources[0].device_scopes[0].normalized);
        // Recognizing an already-normalized file is not a modification.
        assert!(!sources[0].modified);
    }
}
