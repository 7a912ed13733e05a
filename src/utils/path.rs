use std::path::{Path, PathBuf};

/// Overrides the config directory (used by tests and portable setups).
pub const CONFIG_DIR_ENV: &str = "PAINTQUOTE_CONFIG_DIR";
/// Overrides the data directory the default store lives in.
pub const DATA_DIR_ENV: &str = "PAINTQUOTE_DATA_DIR";

/// Get the home directory, with fallback to "/"
pub fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

/// Get the config directory path (~/.config/paintquote unless overridden)
pub fn get_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    get_home_dir().join(".config").join("paintquote")
}

/// Get the config file path
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.toml")
}

/// Default store directory (<data dir>/paintquote/store)
pub fn get_default_store_dir() -> PathBuf {
    let base = std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .or_else(dirs::data_dir)
        .unwrap_or_else(|| get_home_dir().join(".local").join("share"));
    base.join("paintquote").join("store")
}

/// Directory log files are written to
pub fn get_log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(get_home_dir)
        .join("paintquote")
}

/// Expand a path string, handling ~ and relative paths
///
/// Relative paths are resolved against the current directory, unlike `~`
/// which resolves against the home directory.
pub fn expand_path(path_str: &str) -> PathBuf {
    if let Some(rest) = path_str.strip_prefix("~/") {
        get_home_dir().join(rest)
    } else if path_str == "~" {
        get_home_dir()
    } else {
        PathBuf::from(path_str)
    }
}

/// Format a path for display (show ~ for home)
pub fn format_path_for_display(path: &Path) -> String {
    let home_dir = get_home_dir();

    if let Ok(relative) = path.strip_prefix(&home_dir) {
        if relative.as_os_str().is_empty() {
            "~".to_string()
        } else {
            format!("~/{}", relative.to_string_lossy())
        }
    } else {
        path.to_string_lossy().to_string()
    }
}
