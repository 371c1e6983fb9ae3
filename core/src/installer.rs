//! Locates or downloads the OpenZeppelin Monitor executable.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::config::HomeLayout;
use crate::config::write_atomically;
use crate::error::MonitorErr;
use crate::error::Result;

pub const MONITOR_BINARY_NAME: &str = "openzeppelin-monitor";
const VERSION_FILE: &str = "VERSION";
const USER_AGENT: &str = concat!("ozmon/", env!("CARGO_PKG_VERSION"));

/// A platform the monitor project publishes release archives for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    target: &'static str,
}

impl Platform {
    pub fn current() -> Result<Self> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn from_parts(os: &str, arch: &str) -> Result<Self> {
        let target = match (os, arch) {
            ("linux", "x86_64") => "x86_64-unknown-linux-gnu",
            ("linux", "aarch64") => "aarch64-unknown-linux-gnu",
            ("macos", "x86_64") => "x86_64-apple-darwin",
            ("macos", "aarch64") => "aarch64-apple-darwin",
            _ => {
                return Err(MonitorErr::UnsupportedPlatform {
                    os: os.to_string(),
                    arch: arch.to_string(),
                });
            }
        };
        Ok(Self { target })
    }

    pub fn target(self) -> &'static str {
        self.target
    }

    pub fn asset_name(self, tag: &str) -> String {
        format!("{MONITOR_BINARY_NAME}-{tag}-{}.tar.gz", self.target)
    }
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

#[derive(Debug, Clone)]
pub struct Installer {
    bin_dir: PathBuf,
    binary_override: Option<PathBuf>,
    repo: String,
    api_base: String,
    platform: Option<Platform>,
    client: reqwest::Client,
}

impl Installer {
    pub fn new(layout: &HomeLayout, config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            bin_dir: layout.bin_dir(),
            binary_override: config.monitor_binary.clone(),
            repo: config.release_repo().to_string(),
            api_base: config.release_api_base().to_string(),
            platform: None,
            client,
        })
    }

    /// Pins the platform instead of detecting the host.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn installed_binary(&self) -> PathBuf {
        self.bin_dir.join(MONITOR_BINARY_NAME)
    }

    pub fn installed_version(&self) -> Option<String> {
        fs::read_to_string(self.bin_dir.join(VERSION_FILE))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Returns a runnable monitor binary, downloading the latest release on
    /// first use.
    pub async fn ensure_binary(&self) -> Result<PathBuf> {
        if let Some(path) = &self.binary_override {
            debug!("using configured monitor binary {}", path.display());
            return Ok(path.clone());
        }
        let installed = self.installed_binary();
        if installed.is_file() {
            return Ok(installed);
        }
        self.install_latest().await
    }

    async fn install_latest(&self) -> Result<PathBuf> {
        let platform = match self.platform {
            Some(platform) => platform,
            None => Platform::current()?,
        };

        let release = self.latest_release().await?;
        let asset_name = platform.asset_name(&release.tag_name);
        let asset = release
            .assets
            .iter()
            .find(|asset| asset.name == asset_name)
            .ok_or_else(|| MonitorErr::ReleaseAssetMissing {
                version: release.tag_name.clone(),
                asset: asset_name.clone(),
            })?;

        info!("downloading {} {}", asset.name, release.tag_name);
        let archive = self
            .client
            .get(&asset.browser_download_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let binary = extract_monitor_binary(&archive)?;
        let path = self.installed_binary();
        write_atomically(&self.bin_dir, &path, &binary)?;
        make_executable(&path)?;
        write_atomically(
            &self.bin_dir,
            &self.bin_dir.join(VERSION_FILE),
            release.tag_name.as_bytes(),
        )?;
        info!("installed monitor {} at {}", release.tag_name, path.display());
        Ok(path)
    }

    async fn latest_release(&self) -> Result<Release> {
        let url = format!("{}/repos/{}/releases/latest", self.api_base, self.repo);
        debug!("querying {url}");
        let release = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json::<Release>()
            .await?;
        Ok(release)
    }
}

/// Pulls the monitor executable out of a `.tar.gz` release archive. The entry
/// may sit at the archive root or inside a top-level directory.
fn extract_monitor_binary(archive: &[u8]) -> Result<Vec<u8>> {
    let mut tar = tar::Archive::new(GzDecoder::new(archive));
    let entries = tar
        .entries()
        .map_err(|e| MonitorErr::Extract(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| MonitorErr::Extract(e.to_string()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let is_monitor = entry
            .path()
            .map_err(|e| MonitorErr::Extract(e.to_string()))?
            .file_name()
            .is_some_and(|name| name == MONITOR_BINARY_NAME);
        if is_monitor {
            let mut binary = Vec::new();
            entry
                .read_to_end(&mut binary)
                .map_err(|e| MonitorErr::Extract(e.to_string()))?;
            return Ok(binary);
        }
    }
    Err(MonitorErr::Extract(format!(
        "archive does not contain {MONITOR_BINARY_NAME}"
    )))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
