use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::config_types::UserConfig;
use crate::error::MonitorErr;
use crate::error::Result;
use crate::presets::NetworkPreset;

pub const OZMON_HOME_ENV: &str = "OZMON_HOME";
pub const CONFIG_TOML_FILE: &str = "config.toml";

pub const DEFAULT_RELEASE_REPO: &str = "OpenZeppelin/openzeppelin-monitor";
pub const DEFAULT_RELEASE_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_MONITOR_LOG_LEVEL: &str = "info";
pub const DEFAULT_STARTUP_GRACE_MS: u64 = 2_000;
pub const DEFAULT_STELLAR_CLI: &str = "stellar";

/// Returns the directory that holds all state for this tool.
///
/// `$OZMON_HOME` wins when set and non-empty; the directory must already
/// exist. Otherwise falls back to `~/.ozmon`, which need not exist yet.
pub fn find_ozmon_home() -> Result<PathBuf> {
    if let Ok(val) = std::env::var(OZMON_HOME_ENV)
        && !val.is_empty()
    {
        return Ok(PathBuf::from(val).canonicalize()?);
    }

    let mut home = dirs::home_dir().ok_or(MonitorErr::HomeNotFound)?;
    home.push(".ozmon");
    Ok(home)
}

/// Typed view over the on-disk layout rooted at the home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLayout {
    root: PathBuf,
}

impl HomeLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_toml(&self) -> PathBuf {
        self.root.join(CONFIG_TOML_FILE)
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.root.join("tools")
    }

    pub fn tool_config(&self, tool: &str) -> PathBuf {
        self.tools_dir().join(format!("{tool}.json"))
    }

    pub fn sessions_file(&self) -> PathBuf {
        self.root.join("sessions.json")
    }

    pub fn sessions_lock(&self) -> PathBuf {
        self.root.join("sessions.lock")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn session_dir(&self, id: &str) -> PathBuf {
        self.sessions_dir().join(id)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("log")
    }
}

/// Global settings read from `<home>/config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Use this executable instead of downloading a release.
    pub monitor_binary: Option<PathBuf>,
    pub release_repo: Option<String>,
    pub release_api_base: Option<String>,
    pub monitor_log_level: Option<String>,
    pub startup_grace_ms: Option<u64>,
    pub stellar_cli: Option<String>,
    /// Per network slug RPC endpoint overrides.
    pub rpc_urls: HashMap<String, String>,
}

impl AppConfig {
    pub fn load(layout: &HomeLayout) -> Result<Self> {
        let path = layout.config_toml();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        Ok(toml::from_str(&contents)?)
    }

    pub fn release_repo(&self) -> &str {
        self.release_repo.as_deref().unwrap_or(DEFAULT_RELEASE_REPO)
    }

    pub fn release_api_base(&self) -> &str {
        self.release_api_base
            .as_deref()
            .unwrap_or(DEFAULT_RELEASE_API_BASE)
            .trim_end_matches('/')
    }

    pub fn monitor_log_level(&self) -> &str {
        self.monitor_log_level
            .as_deref()
            .unwrap_or(DEFAULT_MONITOR_LOG_LEVEL)
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms.unwrap_or(DEFAULT_STARTUP_GRACE_MS))
    }

    pub fn stellar_cli(&self) -> &str {
        self.stellar_cli.as_deref().unwrap_or(DEFAULT_STELLAR_CLI)
    }

    pub fn rpc_url_for<'a>(&'a self, preset: &'a NetworkPreset) -> &'a str {
        self.rpc_urls
            .get(preset.slug)
            .map(String::as_str)
            .unwrap_or(preset.rpc_url)
    }
}

pub fn validate_tool_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(MonitorErr::InvalidToolName(name.to_string()))
    }
}

/// Loads the saved settings for `tool`. Returns `Ok(None)` when the tool has
/// never been configured.
pub fn load_user_config(layout: &HomeLayout, tool: &str) -> Result<Option<UserConfig>> {
    validate_tool_name(tool)?;
    let path = layout.tool_config(tool);
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(serde_json::from_slice(&data)?))
}

pub fn write_user_config(layout: &HomeLayout, tool: &str, config: &UserConfig) -> Result<()> {
    validate_tool_name(tool)?;
    let json = serde_json::to_vec_pretty(config)?;
    write_atomically(&layout.tools_dir(), &layout.tool_config(tool), &json)
}

/// Writes `data` to `path` through a temp file in `dir` so readers never see
/// a partially written document.
pub(crate) fn write_atomically(dir: &Path, path: &Path, data: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_types::NotificationChannel;
    use crate::presets::find_preset;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use tempfile::TempDir;

    fn sample_config() -> UserConfig {
        UserConfig {
            network: "stellar_testnet".to_string(),
            contract_address: "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC"
                .to_string(),
            display_name: Some("USDC whale watch".to_string()),
            threshold: "1000000".to_string(),
            notification: NotificationChannel::Telegram {
                bot_token: "123456:ABC-DEF".to_string(),
                chat_id: "-1001234".to_string(),
            },
            function_signature: None,
            threshold_argument: None,
        }
    }

    #[test]
    fn user_config_round_trips() {
        let tmp = TempDir::new().expect("tempdir");
        let layout = HomeLayout::new(tmp.path());
        let config = sample_config();

        write_user_config(&layout, "whale-watch", &config).expect("write");
        let loaded = load_user_config(&layout, "whale-watch").expect("load");

        assert_eq!(Some(config), loaded);
    }

    #[test]
    fn missing_user_config_is_none() {
        let tmp = TempDir::new().expect("tempdir");
        let layout = HomeLayout::new(tmp.path());
        assert_eq!(None, load_user_config(&layout, "never").expect("load"));
    }

    #[test]
    fn rejects_path_like_tool_names() {
        let tmp = TempDir::new().expect("tempdir");
        let layout = HomeLayout::new(tmp.path());
        let err = load_user_config(&layout, "../escape").expect_err("invalid name");
        assert!(matches!(err, MonitorErr::InvalidToolName(_)));
        assert!(validate_tool_name("").is_err());
        assert!(validate_tool_name("large_transfer-2").is_ok());
    }

    #[test]
    fn app_config_defaults_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let config = AppConfig::load(&HomeLayout::new(tmp.path())).expect("load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.release_repo(), DEFAULT_RELEASE_REPO);
        assert_eq!(config.startup_grace(), Duration::from_secs(2));
        assert_eq!(config.stellar_cli(), "stellar");
    }

    #[test]
    fn app_config_reads_overrides() {
        let tmp = TempDir::new().expect("tempdir");
        fs::write(
            tmp.path().join(CONFIG_TOML_FILE),
            r#"
monitor_log_level = "debug"
startup_grace_ms = 500
release_api_base = "http://127.0.0.1:9000/"

[rpc_urls]
stellar_testnet = "https://rpc.example.org"
"#,
        )
        .expect("write config");

        let config = AppConfig::load(&HomeLayout::new(tmp.path())).expect("load");
        let preset = find_preset("stellar_testnet").expect("preset");
        let other = find_preset("stellar_mainnet").expect("preset");

        assert_eq!(config.monitor_log_level(), "debug");
        assert_eq!(config.startup_grace(), Duration::from_millis(500));
        assert_eq!(config.release_api_base(), "http://127.0.0.1:9000");
        assert_eq!(config.rpc_url_for(preset), "https://rpc.example.org");
        assert_eq!(config.rpc_url_for(other), other.rpc_url);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let tmp = TempDir::new().expect("tempdir");
        fs::write(tmp.path().join(CONFIG_TOML_FILE), "startup_grace_ms = \"soon\"")
            .expect("write config");
        let err = AppConfig::load(&HomeLayout::new(tmp.path())).expect_err("invalid");
        assert!(matches!(err, MonitorErr::Toml(_)));
    }

    #[test]
    #[serial]
    fn home_env_override_is_canonicalized() {
        let tmp = TempDir::new().expect("tempdir");
        // SAFETY: serialized with the other env-mutating tests.
        unsafe { std::env::set_var(OZMON_HOME_ENV, tmp.path()) };
        let found = find_ozmon_home();
        unsafe { std::env::remove_var(OZMON_HOME_ENV) };
        assert_eq!(
            found.expect("home"),
            tmp.path().canonicalize().expect("canonical")
        );
    }
}
