use std::{env, fs, path::PathBuf, time::Duration};

use directories::BaseDirs;
use lazy_static::lazy_static;
use serde::Deserialize;

const CONFIG: &str = include_str!("../.config/config.json5");

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub config_dir: PathBuf,
}

/// Network settings for the data source
#[derive(Clone, Debug, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FetchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Result grid settings
#[derive(Clone, Debug, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_column_width")]
    pub column_width: u16,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            column_width: default_column_width(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    100
}

fn default_column_width() -> u16 {
    16
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub grid: GridConfig,
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref DATA_FOLDER: Option<PathBuf> =
        env::var(format!("{}_DATA", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

impl Config {
    /// Layer embedded defaults, the user config file and `FILTERDECK_*` env vars
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let data_dir = get_data_dir();
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5));

        // Determine primary config file path
        let selected_path = if let Some(p) = config_path {
            expand_tilde(p)
        } else {
            // Ensure default file exists at ~/.filterdeck-config.json5
            let home_cfg = default_home_config_path();
            if !home_cfg.exists() {
                if let Some(parent) = home_cfg.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                let _ = fs::write(&home_cfg, CONFIG);
            }
            home_cfg
        };

        builder = builder
            .add_source(
                config::File::from(selected_path)
                    .format(config::FileFormat::Json5)
                    .required(config_path.is_some()),
            )
            .add_source(
                config::Environment::with_prefix(&PROJECT_NAME)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Some(s) = path.to_str() {
        if s.starts_with('~') {
            if let Some(base) = BaseDirs::new() {
                return PathBuf::from(s.replacen('~', base.home_dir().to_str().unwrap_or(""), 1));
            }
        }
    }
    path.clone()
}

fn default_home_config_path() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        return base.home_dir().join(".filterdeck-config.json5");
    }
    PathBuf::from(".filterdeck-config.json5")
}

pub fn get_data_dir() -> PathBuf {
    if let Some(s) = DATA_FOLDER.clone() {
        s
    } else if let Some(dirs) = project_directory() {
        dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

pub fn get_config_dir() -> PathBuf {
    if let Some(s) = CONFIG_FOLDER.clone() {
        s
    } else if let Some(dirs) = project_directory() {
        dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}

fn project_directory() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "filterdeck", env!("CARGO_PKG_NAME"))
}

/// Version string shown by `--version` and the About dialog
pub fn version() -> String {
    let describe = option_env!("VERGEN_GIT_DESCRIBE")
        .filter(|d| !d.is_empty() && !d.starts_with("VERGEN"))
        .unwrap_or(env!("CARGO_PKG_VERSION"));
    let build_date = option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown");
    format!(
        "{describe} (built {build_date})\n\nConfig directory: {}\nData directory: {}",
        get_config_dir().display(),
        get_data_dir().display()
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let parsed: Config = config::Config::builder()
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(parsed.fetch.debounce_ms, 400);
        assert_eq!(parsed.grid.page_size, 100);
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json5");
        fs::write(&path, "{ fetch: { debounce_ms: 50 }, grid: { page_size: 25 } }").unwrap();

        let cfg = Config::from_path(Some(&path)).unwrap();
        assert_eq!(cfg.fetch.debounce_ms, 50);
        assert_eq!(cfg.fetch.timeout_secs, 30);
        assert_eq!(cfg.grid.page_size, 25);
        assert_eq!(cfg.grid.column_width, 16);
        assert_eq!(cfg.fetch.debounce(), Duration::from_millis(50));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json5");
        assert!(Config::from_path(Some(&path)).is_err());
    }

    #[test]
    fn test_version_mentions_directories() {
        let v = version();
        assert!(v.contains("Config directory"));
        assert!(v.contains("Data directory"));
    }
}
