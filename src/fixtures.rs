#[cfg(test)]
pub mod test {
    use std::collections::HashMap;

    use crate::model::{AppScope, ConfigSource, DeviceScope};
    use crate::schema::{DriverSchema, OptInfo, OptSection};
    use crate::validate::OptKind;

    /// A schema shaped like the classic radeon tunables: two enum knobs, a
    /// debug bool, and a float with a constrained range.
    pub fn radeon_schema() -> DriverSchema {
        let performance = OptSection {
            descriptions: vec![],
            options: vec![
                OptInfo::new("vblank_mode", OptKind::Enum, "1", Some("0:3")).unwrap(),
                OptInfo::new("fthrottle_mode", OptKind::Enum, "2", Some("0:2")).unwrap(),
            ],
        };
        let quality = OptSection {
            descriptions: vec![],
            options: vec![
                OptInfo::new("def_max_anisotropy", OptKind::Float, "1.0", Some("1.0:16.0"))
                    .unwrap(),
                OptInfo::new("no_rast", OptKind::Bool, "false", None).unwrap(),
            ],
        };
        DriverSchema::new("radeon", vec![performance, quality])
    }

    /// A deliberately tiny schema for normalization tests, where the default
    /// app scope contains every schema option.
    pub fn foo_schema() -> DriverSchema {
        let section = OptSection {
            descriptions: vec![],
            options: vec![
                OptInfo::new("aa", OptKind::Bool, "false", None).unwrap(),
                OptInfo::new("bb", OptKind::Int, "2", Some("0:5")).unwrap(),
            ],
        };
        DriverSchema::new("foo", vec![section])
    }

    pub fn schemas() -> HashMap<String, DriverSchema> {
        let mut map = HashMap::new();
        map.insert("radeon".to_string(), radeon_schema());
        map.insert("foo".to_string(), foo_schema());
        map
    }

    /// An app scope named after its executable ("Default" when unset).
    pub fn app(executable: Option<&str>, options: &[(&str, &str)]) -> AppScope {
        let mut scope = AppScope::new(
            executable.unwrap_or("Default"),
            executable.map(str::to_string),
        );
        for (name, value) in options {
            scope.options.insert((*name).to_string(), (*value).to_string());
        }
        scope
    }

    pub fn wildcard_scope(apps: Vec<AppScope>) -> DeviceScope {
        let mut scope = DeviceScope::new(None, None);
        scope.app_scopes = apps;
        scope
    }

    pub fn device_scope(screen: u32, driver: &str, apps: Vec<AppScope>) -> DeviceScope {
        let mut scope = DeviceScope::new(Some(screen), Some(driver.to_string()));
        scope.app_scopes = apps;
        scope
    }

    pub fn source(origin: &str, writable: bool, scopes: Vec<DeviceScope>) -> ConfigSource {
        let mut source = ConfigSource::new(origin, writable);
        source.device_scopes = scopes;
        source
    }

    #[test]
    fn fixture_schemas_construct() {
        assert_eq!(radeon_schema().options().count(), 4);
        assert_eq!(foo_schema().options().count(), 2);
        assert!(radeon_schema().opt_info("vblank_mode").is_some());
    }
}
