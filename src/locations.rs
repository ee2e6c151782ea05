//! Conventional configuration file locations.
//!
//! The engine itself is location-agnostic — precedence is whatever order the
//! caller passes sources in. These helpers encode the conventional two-layer
//! setup: a system-wide file under `/etc` (lowest priority, read-only) and a
//! per-user dotfile in the home directory (highest priority, writable).

use std::path::PathBuf;

use directories::BaseDirs;

/// The system-wide configuration file, maintained by the administrator.
pub const SYSTEM_CONFIG_FILE: &str = "/etc/drirc.toml";

/// File name of the per-user configuration, relative to the home directory.
pub const USER_CONFIG_FILE_NAME: &str = ".drirc.toml";

pub fn system_config_file() -> PathBuf {
    PathBuf::from(SYSTEM_CONFIG_FILE)
}

/// The user's own configuration file. `None` when no home directory can be
/// determined (e.g. in a stripped-down service environment).
pub fn user_config_file() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(USER_CONFIG_FILE_NAME))
}

/// The default load order as `(origin, writable)` pairs, lowest priority
/// first — ready to feed to [`load_sources`](crate::persist::load_sources).
pub fn default_search_order() -> Vec<(PathBuf, bool)> {
    let mut order = vec![(system_config_file(), false)];
    if let Some(user) = user_config_file() {
        order.push((user, true));
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_file_lives_in_etc() {
        assert_eq!(system_config_file(), PathBuf::from("/etc/drirc.toml"));
    }

    #[test]
    fn user_file_is_a_home_dotfile() {
        if let Some(path) = user_config_file() {
            assert!(path.ends_with(".drirc.toml"));
            assert_ne!(path, system_config_file());
        }
    }

    #[test]
    fn search_order_puts_the_user_file_last_and_writable() {
        let order = default_search_order();
        assert_eq!(order[0], (system_config_file(), false));
        if order.len() > 1 {
            let (path, writable) = &order[1];
            assert!(*writable);
            assert!(path.ends_with(".drirc.toml"));
        }
    }
}
