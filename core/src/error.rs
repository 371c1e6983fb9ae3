use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorErr>;

#[derive(Debug, Error)]
pub enum MonitorErr {
    #[error("unknown network '{0}'")]
    UnknownNetwork(String),

    #[error("template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("template {} did not render to valid JSON: {source}", path.display())]
    TemplateParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no saved configuration for tool '{0}'")]
    UserConfigMissing(String),

    #[error("invalid tool name '{0}': use letters, digits, '-' or '_'")]
    InvalidToolName(String),

    #[error("no monitor release is published for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("release {version} has no asset named {asset}")]
    ReleaseAssetMissing { version: String, asset: String },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to extract monitor archive: {0}")]
    Extract(String),

    #[error("failed to launch {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("monitor exited during startup ({status}); see {}", log.display())]
    EarlyExit { status: String, log: PathBuf },

    #[error("contract introspection failed: {0}")]
    ContractSpec(String),

    #[error("could not determine the home directory; set OZMON_HOME")]
    HomeNotFound,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config.toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("xdr decode error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
}
