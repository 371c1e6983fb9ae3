//! Renders the three configuration documents the monitor binary reads from
//! its working directory.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value as JsonValue;

use crate::config_types::NotificationChannel;
use crate::config_types::UserConfig;
use crate::error::Result;
use crate::presets::NetworkKind;
use crate::presets::NetworkPreset;
use crate::templates::TemplateCategory;
use crate::templates::TemplateStore;
use crate::templates::TemplateVars;

const CONFIG_DIR: &str = "config";

/// Builds the placeholder map for one tool on one network.
pub fn template_vars(
    tool: &str,
    config: &UserConfig,
    preset: &NetworkPreset,
    rpc_url: &str,
) -> TemplateVars {
    let mut vars = TemplateVars::new();
    let kind = config.notification.kind();

    vars.insert("TOOL_NAME", tool);
    vars.insert(
        "MONITOR_NAME",
        config.display_name.as_deref().unwrap_or(tool),
    );
    vars.insert("TRIGGER_ID", trigger_id(tool, config));
    vars.insert("NOTIFICATION_TYPE", kind.to_string());

    vars.insert("NETWORK_SLUG", preset.slug);
    vars.insert("NETWORK_NAME", preset.name);
    vars.insert("NETWORK_TYPE", preset.kind.to_string());
    vars.insert("RPC_URL", rpc_url);
    vars.insert("BLOCK_TIME_MS", preset.block_time_ms.to_string());
    vars.insert("CONFIRMATION_BLOCKS", preset.confirmation_blocks.to_string());
    vars.insert("CRON_SCHEDULE", preset.cron_schedule);
    vars.insert("MAX_PAST_BLOCKS", preset.max_past_blocks.to_string());
    if let Some(chain_id) = preset.chain_id {
        vars.insert("CHAIN_ID", chain_id.to_string());
    }
    if let Some(passphrase) = preset.network_passphrase {
        vars.insert("NETWORK_PASSPHRASE", passphrase);
    }

    vars.insert("CONTRACT_ADDRESS", config.contract_address.as_str());
    vars.insert("THRESHOLD", config.threshold.as_str());
    vars.insert(
        "FUNCTION_SIGNATURE",
        config
            .function_signature
            .as_deref()
            .unwrap_or(preset.kind.default_function_signature()),
    );
    vars.insert(
        "THRESHOLD_ARG",
        config
            .threshold_argument
            .as_deref()
            .unwrap_or(default_threshold_argument(preset.kind)),
    );

    match &config.notification {
        NotificationChannel::Discord { webhook_url }
        | NotificationChannel::Slack { webhook_url } => {
            vars.insert("WEBHOOK_URL", webhook_url.as_str());
        }
        NotificationChannel::Telegram { bot_token, chat_id } => {
            vars.insert("TELEGRAM_BOT_TOKEN", bot_token.as_str());
            vars.insert("TELEGRAM_CHAT_ID", chat_id.as_str());
        }
    }

    vars
}

fn trigger_id(tool: &str, config: &UserConfig) -> String {
    format!("{tool}_{}", config.notification.kind())
}

fn default_threshold_argument(kind: NetworkKind) -> &'static str {
    match kind {
        NetworkKind::Stellar => "amount",
        NetworkKind::Evm => "value",
    }
}

/// The rendered network, monitor and trigger documents for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDocuments {
    pub network_slug: String,
    pub tool: String,
    pub network: JsonValue,
    pub monitor: JsonValue,
    pub trigger: JsonValue,
}

impl SessionDocuments {
    /// Writes the documents below `session_dir/config` and returns the paths
    /// in network, monitor, trigger order.
    pub fn write_to(&self, session_dir: &Path) -> Result<[PathBuf; 3]> {
        let config_dir = session_dir.join(CONFIG_DIR);
        let paths = [
            config_dir
                .join(TemplateCategory::Networks.dir_name())
                .join(format!("{}.json", self.network_slug)),
            config_dir
                .join(TemplateCategory::Monitors.dir_name())
                .join(format!("{}.json", self.tool)),
            config_dir
                .join(TemplateCategory::Triggers.dir_name())
                .join(format!("{}.json", self.tool)),
        ];
        for (path, document) in paths.iter().zip([&self.network, &self.monitor, &self.trigger]) {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_vec_pretty(document)?)?;
        }
        Ok(paths)
    }
}

/// Renders all three documents in memory. Nothing touches the session
/// directory until every template rendered successfully.
pub fn render_session_documents(
    store: &TemplateStore,
    tool: &str,
    config: &UserConfig,
    preset: &NetworkPreset,
    rpc_url: &str,
) -> Result<SessionDocuments> {
    let vars = template_vars(tool, config, preset, rpc_url);
    let family = preset.kind.template_name();
    let trigger_template = config.notification.kind().trigger_template();

    Ok(SessionDocuments {
        network_slug: preset.slug.to_string(),
        tool: tool.to_string(),
        network: store.render(TemplateCategory::Networks, family, Some(&vars))?,
        monitor: store.render(TemplateCategory::Monitors, family, Some(&vars))?,
        trigger: store.render(TemplateCategory::Triggers, trigger_template, Some(&vars))?,
    })
}
