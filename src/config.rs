//! Loads the site-wide configuration from `_config.yml`, filling in any
//! option the file leaves out from [`defaults`].

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// The configuration file's location relative to the project root.
pub const CONFIG_FILE: &str = "_config.yml";

/// The URL pattern used for posts when `postLink` isn't configured.
pub const DEFAULT_POST_LINK: &str = "${name}.html";

/// The built-in options. Every key here is guaranteed to be present in a
/// loaded [`Config`].
pub fn defaults() -> Mapping {
    let mut m = Mapping::new();
    m.insert(
        Value::String("postLink".to_owned()),
        Value::String(DEFAULT_POST_LINK.to_owned()),
    );
    m
}

/// The typed subset of options the build itself consults.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    /// The URL pattern for posts, e.g. `${name}.html`. See [`crate::url`].
    #[serde(rename = "postLink")]
    pub post_link: String,
}

/// The site configuration: the raw option mapping (exposed to templates as
/// `site.config`) and the typed [`Settings`] derived from it.
#[derive(Debug, Clone)]
pub struct Config {
    pub values: Mapping,
    pub settings: Settings,
}

impl Config {
    /// Builds a configuration from explicit options, filling gaps from
    /// [`defaults`]. Explicit values are never overridden.
    pub fn from_mapping(mut values: Mapping) -> Result<Config> {
        for (key, value) in defaults() {
            if !values.contains_key(&key) {
                values.insert(key, value);
            }
        }
        let settings: Settings =
            serde_yaml::from_value(Value::Mapping(values.clone()))
                .map_err(Error::InvalidSettings)?;
        Ok(Config { values, settings })
    }

    /// Loads `_config.yml` from `project_root`. A missing file yields the
    /// defaults; a file that exists but doesn't parse is an error.
    pub fn from_directory(project_root: &Path) -> Result<Config> {
        let path = project_root.join(CONFIG_FILE);
        if !path.is_file() {
            log::debug!("No {} found, using defaults", CONFIG_FILE);
            return Config::from_mapping(Mapping::new());
        }

        let contents = std::fs::read_to_string(&path).map_err(|err| {
            Error::Read {
                path: path.clone(),
                err,
            }
        })?;
        if crate::frontmatter::is_blank_yaml(&contents) {
            return Config::from_mapping(Mapping::new());
        }
        let values = match serde_yaml::from_str::<Value>(&contents) {
            Ok(Value::Null) => Mapping::new(),
            Ok(Value::Mapping(m)) => m,
            Ok(_) => return Err(Error::NotAMapping(path)),
            Err(err) => return Err(Error::Parse { path, err }),
        };
        Config::from_mapping(values)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the site configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the configuration file exists but can't be read.
    #[error("reading configuration file '{}': {err}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the configuration file isn't valid YAML.
    #[error("parsing configuration file '{}': {err}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },

    /// Returned when the configuration file is valid YAML but not a mapping.
    #[error("configuration file '{}' must be a mapping", .0.display())]
    NotAMapping(PathBuf),

    /// Returned when a known option has the wrong type.
    #[error("invalid configuration: {0}")]
    InvalidSettings(#[source] serde_yaml::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn key(s: &str) -> Value {
        Value::String(s.to_owned())
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let config = Config::from_directory(dir.path())?;
        assert_eq!(DEFAULT_POST_LINK, config.settings.post_link);
        assert_eq!(defaults(), config.values);
        Ok(())
    }

    #[test]
    fn test_explicit_value_preserved() -> Result<()> {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "postLink: \"posts/${name}/index.html\"\ntitle: My Site\n",
        )
        .unwrap();
        let config = Config::from_directory(dir.path())?;
        assert_eq!("posts/${name}/index.html", config.settings.post_link);
        assert_eq!(Some(&key("My Site")), config.values.get(&key("title")));
        Ok(())
    }

    #[test]
    fn test_defaults_fill_gaps() -> Result<()> {
        let mut values = Mapping::new();
        values.insert(key("title"), key("My Site"));
        let config = Config::from_mapping(values)?;
        assert_eq!(
            Some(&key(DEFAULT_POST_LINK)),
            config.values.get(&key("postLink"))
        );
        assert_eq!(Some(&key("My Site")), config.values.get(&key("title")));
        Ok(())
    }

    #[test]
    fn test_empty_file_uses_defaults() -> Result<()> {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        let config = Config::from_directory(dir.path())?;
        assert_eq!(DEFAULT_POST_LINK, config.settings.post_link);
        Ok(())
    }

    #[test]
    fn test_comment_only_file_uses_defaults() -> Result<()> {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "# postLink: \"${year}/${name}.html\"\n",
        )
        .unwrap();
        let config = Config::from_directory(dir.path())?;
        assert_eq!(DEFAULT_POST_LINK, config.settings.post_link);
        assert_eq!(defaults(), config.values);
        Ok(())
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "postLink: [oops\n")
            .unwrap();
        assert!(matches!(
            Config::from_directory(dir.path()),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_non_string_post_link_is_an_error() {
        let mut values = Mapping::new();
        values.insert(key("postLink"), Value::Sequence(Vec::new()));
        assert!(matches!(
            Config::from_mapping(values),
            Err(Error::InvalidSettings(_))
        ));
    }
}
