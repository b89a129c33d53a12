use std::path::PathBuf;

use directories::ProjectDirs;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "ChokepointImpact";
const APP_NAME: &str = "ChokepointImpact";

pub const USER_CONFIG_FILE: &str = "config.json";

/// Environment variable that, when set, replaces the platform config directory.
pub const CONFIG_DIR_ENV: &str = "CHOKEPOINT_IMPACT_CONFIG_DIR";

/// Directory searched for a user override of the bundled tables.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn user_config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(USER_CONFIG_FILE))
}
