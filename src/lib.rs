//! Layered configuration for tunable graphics-driver options. Point it at
//! your configuration sources, your installed devices, and your driver
//! schemas, and it tells you what every option is set to — or rewrites the
//! user's file into the canonical form that says so explicitly.
//!
//! Graphics drivers expose tunables — swap intervals, throttling modes,
//! texture quality knobs — that users override per device and per
//! application, across more than one configuration file. This crate is the
//! engine underneath such a tool: resolution across layered, wildcard-scoped
//! sources; validation against the driver's advertised option schema; and
//! normalization of the user's own file into a minimal, explicit, idempotent
//! form. There is no I/O in the core — [`resolve`], [`normalize`], and
//! [`is_normalized`] are deterministic functions over in-memory structures —
//! and no concurrency: callers own their sources for the duration of a call.
//!
//! # Layer precedence
//!
//! ```text
//! System source          /etc, read-only, first in the slice
//!        ↑ overridden by
//! User source            home dotfile, writable, last in the slice
//!        ↑ overridden by
//! Later device scopes    within a source, later entries win
//!        ↑ overridden by
//! Executable app scopes  matching the running program
//! ```
//!
//! Every layer is **sparse**: a scope only mentions the options it wants to
//! override, and anything unset falls through. Resolution therefore returns
//! only explicitly-overridden options; callers wanting the complete picture
//! fill the gaps from the schema defaults.
//!
//! # Scopes and wildcard matching
//!
//! A [`ConfigSource`] holds an ordered list of [`DeviceScope`]s; each device
//! scope holds an ordered list of [`AppScope`]s. An unset `screen`,
//! `driver`, or `executable` is a wildcard matching every concrete value, so
//! a scope with neither screen nor driver applies to every installed device,
//! and an app scope without an executable — the *default* scope — applies to
//! every application on its device.
//!
//! # Validation and admission
//!
//! The option schema ([`DriverSchema`]) is supplied externally — by whatever
//! queries the driver stack — and is immutable once built; construction
//! fails fast if an option's default violates its own ranges. During
//! resolution every raw value is checked against the schema
//! ([`OptInfo::validate`]): parse failure or an out-of-range value means the
//! pair is not admitted. The one exception is **trusted admission**: when
//! the resolver is told which source is the user's own, values inside that
//! source's fully-specific device scopes are admitted verbatim, even ones
//! the current schema rejects or doesn't know. A driver update must not
//! silently eat the settings a user wrote for the previous version; such
//! values are carried through flagged [`Validity::Invalid`] or
//! [`Validity::Unknown`] rather than dropped.
//!
//! # Normalization
//!
//! [`normalize`] rewrites the user's source into canonical form: one
//! fully-specific, schema-complete [`DeviceScope`] per installed device,
//! appended at the end (append = highest precedence), whose default app
//! scope pins every option to an explicit value. Legacy fully-specific
//! scopes the canonical run makes unreachable are pruned. [`is_normalized`]
//! answers whether a source already has that shape — structurally, without
//! mutating anything — so interactive callers can decide whether there is
//! anything to do. Normalization reaches its fixed point in one call:
//! normalize, and `is_normalized` holds from then on.
//!
//! # Errors
//!
//! All failure routing follows one rule: recover at the boundary, keep
//! going. A file that doesn't parse is skipped by [`load_sources`] with a
//! warning; a driver without a schema excludes its devices from
//! normalization but nothing else; a validation failure is a verdict, not an
//! error. The only hard failures are construction of a self-contradictory
//! schema ([`SchemaError`]) and I/O ([`DrircError`]).
//!
//! # Persistence
//!
//! Sources round-trip losslessly through a TOML document form
//! ([`to_document`]/[`from_document`]); [`write_source`] renders the whole
//! document before touching the file, so a failed write never corrupts the
//! previous state. File locations and precedence belong to the surrounding
//! application; [`locations`] provides the conventional system-then-user
//! order.

pub mod error;
pub mod locations;

mod model;
mod normalize;
mod persist;
mod resolve;
mod schema;
mod validate;

#[cfg(test)]
mod fixtures;

pub use error::{DrircError, SchemaError};
pub use model::{AppScope, ConfigSource, Device, DeviceScope, user_source_index};
pub use normalize::{is_normalized, normalize, remove_redundant_devices, synthesize_device_scopes};
pub use persist::{from_document, load_sources, read_source, to_document, write_source};
pub use resolve::{
    Admission, ResolveQuery, ResolvedOption, ResolvedOptions, Validity, resolve,
};
pub use schema::{Description, DriverSchema, OptInfo, OptSection, SchemaSource};
pub use validate::{OptKind, OptValue, Range};
