//! Property sources
//!
//! A [`PropertySource`] answers `name -> value` lookups. On device the values
//! come from Android system properties; property files and TOML config files
//! cover host builds and vendor overrides.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Something that can resolve property names to string values
pub trait PropertySource: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Value of `key`, or `None` when unset
    fn get(&self, key: &str) -> Option<String>;
}

/// Android system properties (`__system_property_get`)
///
/// Always empty on other targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProperties;

impl PropertySource for SystemProperties {
    fn name(&self) -> &str {
        "sysprop"
    }

    #[cfg(target_os = "android")]
    fn get(&self, key: &str) -> Option<String> {
        let name = std::ffi::CString::new(key).ok()?;
        let mut value = [0 as libc::c_char; libc::PROP_VALUE_MAX as usize];
        // SAFETY: `name` is NUL-terminated and `value` holds PROP_VALUE_MAX bytes.
        let len = unsafe { libc::__system_property_get(name.as_ptr(), value.as_mut_ptr()) };
        if len <= 0 {
            return None;
        }
        // SAFETY: bionic always NUL-terminates the value.
        let value = unsafe { std::ffi::CStr::from_ptr(value.as_ptr()) };
        Some(value.to_string_lossy().into_owned())
    }

    #[cfg(not(target_os = "android"))]
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}

/// A `build.prop` style file of `key=value` lines
#[derive(Debug, Clone)]
pub struct PropertyFile {
    path: PathBuf,
    props: HashMap<String, String>,
}

impl PropertyFile {
    /// Load properties from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let props = Self::parse(&contents);
        tracing::debug!("Loaded {} properties from {}", props.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            props,
        })
    }

    /// Parse `key=value` lines, skipping blanks, comments and lines without `=`
    pub fn parse(contents: &str) -> HashMap<String, String> {
        let mut props = HashMap::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => {
                    props.insert(key.trim().to_string(), value.trim().to_string());
                }
                None => tracing::warn!("Ignoring malformed property line: {}", line),
            }
        }

        props
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PropertySource for PropertyFile {
    fn name(&self) -> &str {
        "prop-file"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.props.get(key).cloned()
    }
}

/// Environment variable prefix read by [`ConfigFile`]
pub const ENV_PREFIX: &str = "FINGERPRINT";

/// TOML config file layered with `FINGERPRINT_*` environment variables
///
/// Dotted property names resolve as nested tables, so both
/// `sensor_location = "..."` and `[ro.vendor.fingerprint]` sections work.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: config::Config,
}

impl ConfigFile {
    /// Build from an optional TOML file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Ok(Self { config })
    }
}

impl PropertySource for ConfigFile {
    fn name(&self) -> &str {
        "config-file"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.config.get_string(key).ok()
    }
}

/// In-memory properties
#[derive(Debug, Clone, Default)]
pub struct MapProperties {
    props: HashMap<String, String>,
}

impl MapProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.props.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            props: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl PropertySource for MapProperties {
    fn name(&self) -> &str {
        "map"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.props.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_property_lines() {
        let props = PropertyFile::parse(
            "# fingerprint\n\
             ro.vendor.fingerprint.type=side\n\
             \n\
             ro.vendor.fingerprint.sensor_location = 540|1600|100\n\
             garbage\n",
        );

        assert_eq!(props.len(), 2);
        assert_eq!(props["ro.vendor.fingerprint.type"], "side");
        assert_eq!(props["ro.vendor.fingerprint.sensor_location"], "540|1600|100");
    }

    #[test]
    fn test_property_file_load() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ro.vendor.fingerprint.sensor_id=3").unwrap();

        let props = PropertyFile::load(file.path()).unwrap();
        assert_eq!(props.get("ro.vendor.fingerprint.sensor_id").as_deref(), Some("3"));
        assert_eq!(props.get("ro.vendor.fingerprint.type"), None);
        assert_eq!(props.path(), file.path());
    }

    #[test]
    fn test_property_file_missing() {
        let err = PropertyFile::load(Path::new("/nonexistent/fingerprint.prop")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    #[serial]
    fn test_config_file_bare_and_nested_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
type = "home"
sensor_id = 4
detect_interaction = true

[persist.vendor.fingerprint]
sensor_strength = 1
"#
        )
        .unwrap();

        let config = ConfigFile::load(Some(file.path())).unwrap();
        assert_eq!(config.get("type").as_deref(), Some("home"));
        assert_eq!(config.get("sensor_id").as_deref(), Some("4"));
        assert_eq!(config.get("detect_interaction").as_deref(), Some("true"));
        assert_eq!(
            config.get("persist.vendor.fingerprint.sensor_strength").as_deref(),
            Some("1")
        );
        assert_eq!(config.get("sensor_location"), None);
    }

    #[test]
    #[serial]
    fn test_config_file_reads_environment() {
        // SAFETY: serialized with every other test touching the environment.
        unsafe { std::env::set_var("FINGERPRINT_NAVIGATION_GESTURE", "true") };
        let config = ConfigFile::load(None).unwrap();
        unsafe { std::env::remove_var("FINGERPRINT_NAVIGATION_GESTURE") };

        assert_eq!(config.get("navigation_gesture").as_deref(), Some("true"));
    }

    #[test]
    fn test_config_file_missing() {
        let err = ConfigFile::load(Some(Path::new("/nonexistent/fingerprint.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_map_properties() {
        let props: MapProperties = [("a", "1")].into_iter().collect();
        let props = props.with("b", "2");

        assert_eq!(props.get("a").as_deref(), Some("1"));
        assert_eq!(props.get("b").as_deref(), Some("2"));
        assert_eq!(props.get("c"), None);
    }

    #[test]
    fn test_system_properties_off_device() {
        if cfg!(not(target_os = "android")) {
            assert_eq!(SystemProperties.get("ro.vendor.fingerprint.type"), None);
        }
    }
}
