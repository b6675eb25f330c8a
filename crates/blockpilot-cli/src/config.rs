//! Demo settings – reads/writes `~/.blockpilot/config.toml`.
//!
//! ```toml
//! tick_millis = 50
//! max_ticks = 2400
//!
//! [bot.nav]
//! search_radius = 32
//!
//! [bot.behavior]
//! reach = 4.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use blockpilot_runtime::BotConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Wall-clock length of one tick.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// The demo stops after this many ticks even if the intent is still running.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    #[serde(default)]
    pub bot: BotConfig,
}

fn default_tick_millis() -> u64 {
    50
}

fn default_max_ticks() -> u64 {
    2400
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            max_ticks: default_max_ticks(),
            bot: BotConfig::default(),
        }
    }
}

pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".blockpilot").join("config.toml")
}

/// Load the config with environment overrides applied.  `None` when the file
/// does not exist.
pub fn load() -> Result<Option<Config>, String> {
    let mut cfg = load_from(&config_path())?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("Failed to parse config: {}", e))
}

/// Apply `BLOCKPILOT_*` overrides from the process environment.
///
/// | Variable | Config field |
/// |---|---|
/// | `BLOCKPILOT_TICK_MILLIS` | `tick_millis` |
/// | `BLOCKPILOT_MAX_TICKS` | `max_ticks` |
/// | `BLOCKPILOT_SEARCH_RADIUS` | `bot.nav.search_radius` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides_from(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides_from(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(ms) = lookup("BLOCKPILOT_TICK_MILLIS").and_then(|v| v.parse::<u64>().ok())
        && ms > 0
    {
        cfg.tick_millis = ms;
    }
    if let Some(n) = lookup("BLOCKPILOT_MAX_TICKS").and_then(|v| v.parse::<u64>().ok()) {
        cfg.max_ticks = n;
    }
    if let Some(r) = lookup("BLOCKPILOT_SEARCH_RADIUS").and_then(|v| v.parse::<i32>().ok())
        && r > 0
    {
        cfg.bot.nav.search_radius = r;
    }
}

pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn sparse_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "tick_millis = 20\n\n[bot.behavior]\nreach = 3.0\n\n[bot.nav]\nsprint = true\n",
        )
        .unwrap();

        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.tick_millis, 20);
        assert_eq!(cfg.max_ticks, 2400);
        assert_eq!(cfg.bot.behavior.reach, 3.0);
        assert_eq!(cfg.bot.behavior.dig_ticks, 20);
        assert!(cfg.bot.nav.sprint);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tick_millis = \"soon\"").unwrap();
        assert!(load_from(&path).is_err());
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn config_path_points_to_blockpilot_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".blockpilot"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let mut cfg = Config::default();
        apply_overrides_from(
            &mut cfg,
            vars(&[
                ("BLOCKPILOT_TICK_MILLIS", "10"),
                ("BLOCKPILOT_MAX_TICKS", "many"),
                ("BLOCKPILOT_SEARCH_RADIUS", "24"),
            ]),
        );
        assert_eq!(cfg.tick_millis, 10);
        assert_eq!(cfg.max_ticks, 2400);
        assert_eq!(cfg.bot.nav.search_radius, 24);

        apply_overrides_from(&mut cfg, vars(&[("BLOCKPILOT_TICK_MILLIS", "0")]));
        assert_eq!(cfg.tick_millis, 10);
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = std::fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }
}
