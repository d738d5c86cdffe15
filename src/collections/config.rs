use super::parsers::Parser;
use ini::Properties;
use log::debug;
use serde::Deserialize;
use shellexpand::env_with_context_no_errors;
use std::collections::HashMap;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum number of members expanded when the configuration does not say
pub const DEFAULT_EXPAND_LIMIT: u64 = 1_000_000;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration file: {0}")]
    Ini(#[from] ini::Error),
    #[error("invalid set file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unexpected section '{0}'")]
    UnexpectedSection(String),
    #[error("unexpected property '{0}'")]
    UnexpectedProperty(String),
    #[error("invalid value '{1}' for property '{0}'")]
    InvalidValue(String, String),
    #[error("unknown set '@{0}'")]
    UnknownSet(String),
}

/// Named sets from a set file (setdir/*.yaml)
#[derive(Deserialize, Debug)]
struct SetFile {
    #[serde(flatten)]
    sets: HashMap<String, SetSpec>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum SetSpec {
    Id(u64),
    Single(String),
    Vec(Vec<SetSpec>),
}

impl From<SetSpec> for String {
    fn from(s: SetSpec) -> Self {
        match s {
            SetSpec::Id(id) => id.to_string(),
            SetSpec::Single(s) => s,
            SetSpec::Vec(v) => v.into_iter().map(String::from).collect::<Vec<_>>().join(","),
        }
    }
}

impl SetFile {
    fn from_reader(reader: impl std::io::Read) -> Result<Self, ConfigurationError> {
        let sets: Self = serde_yaml::from_reader(reader)?;
        Ok(sets)
    }

    fn into_sets(self) -> impl Iterator<Item = (String, String)> {
        self.sets.into_iter().map(|(name, spec)| (name, spec.into()))
    }
}

/// Settings from the main configuration file (rangespec.conf)
#[derive(Debug, Default, PartialEq)]
struct MainConfig {
    expand_limit: Option<u64>,
    setdir: Option<String>,
}

impl TryFrom<&Properties> for MainConfig {
    type Error = ConfigurationError;

    fn try_from(props: &Properties) -> Result<Self, Self::Error> {
        let mut res = Self::default();

        for (k, v) in props.iter() {
            match k {
                "expand_limit" => {
                    let limit = v.trim().parse::<u64>().map_err(|_| {
                        ConfigurationError::InvalidValue(k.to_string(), v.to_string())
                    })?;
                    res.expand_limit = Some(limit);
                }
                "setdir" => {
                    res.setdir = Some(v.to_string());
                }
                _ => {
                    return Err(ConfigurationError::UnexpectedProperty(k.to_string()));
                }
            }
        }

        Ok(res)
    }
}

impl MainConfig {
    fn from_reader(mut reader: impl std::io::Read) -> Result<Self, ConfigurationError> {
        use ini::Ini;

        let parser = Ini::read_from_noescape(&mut reader)?;
        let mut config = MainConfig::default();
        for (sec, prop) in parser.iter() {
            match sec {
                Some("Main") => {
                    config.merge(prop.try_into()?);
                }
                Some(sec) => {
                    return Err(ConfigurationError::UnexpectedSection(sec.to_string()));
                }
                None => {
                    if let Some(key) = prop.iter().next().map(|(k, _)| k) {
                        return Err(ConfigurationError::UnexpectedProperty(key.to_string()));
                    }
                }
            }
        }

        Ok(config)
    }

    /// Reads a configuration file, expanding $CFGDIR to the directory holding it
    fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let file = fs::File::open(path)?;
        let mut config = Self::from_reader(BufReader::new(file))?;

        if let Some(cfgdir) = config_dir(path).to_str() {
            config.set_cfgdir(cfgdir);
        }

        Ok(config)
    }

    fn set_cfgdir(&mut self, cfgdir: &str) {
        let context = |s: &str| match s {
            "CFGDIR" => Some(cfgdir),
            _ => None,
        };

        self.setdir = self
            .setdir
            .as_ref()
            .map(|s| env_with_context_no_errors(s, context).to_string());
    }

    fn merge(&mut self, other: Self) {
        if let Some(expand_limit) = other.expand_limit {
            self.expand_limit = Some(expand_limit);
        }
        if let Some(setdir) = other.setdir {
            self.setdir = Some(setdir);
        }
    }

    fn setdirs(&self) -> Vec<String> {
        self.setdir
            .as_ref()
            .and_then(|setdir| shlex::split(setdir))
            .unwrap_or_default()
    }
}

static CONFIG_PATHS: &[&str] = &[
    "$HOME/.local/etc/rangespec",
    "/etc/rangespec",
    "$XDG_CONFIG_HOME/rangespec",
];

static CONFIG_FILE: &str = "rangespec.conf";

// Expand environment variables in a path
// Returns None in case of non-utf8 path
fn resolve_config_path(path: &Path) -> Option<PathBuf> {
    let context = |s: &str| match s {
        "HOME" => std::env::var("HOME").ok(),
        "XDG_CONFIG_HOME" => std::env::var("XDG_CONFIG_HOME").ok().or_else(|| {
            std::env::var("HOME")
                .ok()
                .and_then(|h| Path::new(&h).join(".config").to_str().map(String::from))
        }),
        _ => None,
    };

    Some(PathBuf::from(
        env_with_context_no_errors(path.to_str()?, context).as_ref(),
    ))
}

// Absolute directory holding a configuration file, the current directory for
// a bare file name
fn config_dir(path: &Path) -> PathBuf {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}

fn find_files_with_ext(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let it = match fs::read_dir(dir) {
        Ok(it) => it,
        Err(e) => {
            debug!("skipping set directory {}: {}", dir.display(), e);
            return vec![];
        }
    };

    let mut files: Vec<PathBuf> = it
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(ext)
        })
        .collect();

    // Later files override earlier ones
    files.sort();
    files
}

/// Named range sets and expansion settings loaded from configuration files
///
/// Set files are YAML mappings from a set name to a range specification,
/// given either as a string or as a list of strings:
///
/// ```yaml
/// weekend: 6-7
/// ports:
///   - 22
///   - 8000-8080
/// ```
///
/// Names are referenced as `@name` tokens in a range specification and
/// substituted by [`Resolver::resolve_references`].
#[derive(Debug, Clone)]
pub struct Resolver {
    sets: HashMap<String, String>,
    expand_limit: u64,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            sets: HashMap::default(),
            expand_limit: DEFAULT_EXPAND_LIMIT,
        }
    }
}

impl Resolver {
    /// Create a new resolver from the default configuration files
    ///
    /// Missing files are skipped; later files override settings of earlier
    /// ones.
    pub fn from_config() -> Result<Self, ConfigurationError> {
        let mut config = MainConfig::default();

        for &path in CONFIG_PATHS {
            let Some(path) = resolve_config_path(&Path::new(path).join(CONFIG_FILE)) else {
                continue;
            };

            if path.is_file() {
                debug!("loading configuration from {}", path.display());
                config.merge(MainConfig::from_path(&path)?);
            }
        }

        Resolver::from_main_config(config)
    }

    /// Create a new resolver from a single configuration file
    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        debug!("loading configuration from {}", path.display());
        Resolver::from_main_config(MainConfig::from_path(path)?)
    }

    fn from_main_config(config: MainConfig) -> Result<Self, ConfigurationError> {
        let mut resolver = Resolver {
            sets: Default::default(),
            expand_limit: config.expand_limit.unwrap_or(DEFAULT_EXPAND_LIMIT),
        };

        for setdir in config.setdirs() {
            for path in find_files_with_ext(Path::new(&setdir), "yaml") {
                debug!("loading sets from {}", path.display());
                let file = fs::File::open(&path)?;
                resolver.add_sets(SetFile::from_reader(BufReader::new(file))?.into_sets());
            }
        }

        Ok(resolver)
    }

    /// Maximum number of members to expand a set into
    pub fn expand_limit(&self) -> u64 {
        self.expand_limit
    }

    /// Returns the range specification of a named set
    pub fn resolve(&self, name: &str) -> Result<&str, ConfigurationError> {
        self.sets
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConfigurationError::UnknownSet(name.to_string()))
    }

    /// Replaces every `@name` token of a range specification with the
    /// specification of the named set
    ///
    /// Substitution is not recursive: references inside a set definition
    /// are kept as literals.
    pub fn resolve_references(&self, text: &str) -> Result<String, ConfigurationError> {
        if !text.contains('@') {
            return Ok(text.to_string());
        }

        let tokens = Parser::tokens(text)
            .map(|token| match token.strip_prefix('@') {
                Some(name) if !name.is_empty() => self.resolve(name).map(String::from),
                _ => Ok(token.to_string()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tokens.join(","))
    }

    /// Returns the named sets sorted by name
    pub fn sets(&self) -> Vec<(&str, &str)> {
        let mut sets: Vec<_> = self
            .sets
            .iter()
            .map(|(name, spec)| (name.as_str(), spec.as_str()))
            .collect();
        sets.sort_unstable();
        sets
    }

    fn add_sets(&mut self, sets: impl IntoIterator<Item = (String, String)>) {
        self.sets.extend(sets);
    }
}
