//! Types persisted per monitoring tool under `<home>/tools/`.

use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;

/// Discrete notification channel selected in the wizard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    Discord,
    Slack,
    Telegram,
}

impl NotificationKind {
    pub fn label(self) -> &'static str {
        match self {
            NotificationKind::Discord => "Discord",
            NotificationKind::Slack => "Slack",
            NotificationKind::Telegram => "Telegram",
        }
    }

    /// Name of the trigger template rendered for this channel.
    pub fn trigger_template(self) -> &'static str {
        match self {
            NotificationKind::Discord => "discord",
            NotificationKind::Slack => "slack",
            NotificationKind::Telegram => "telegram",
        }
    }
}

/// Channel-specific credentials. Each variant carries exactly the fields its
/// channel needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationChannel {
    Discord { webhook_url: String },
    Slack { webhook_url: String },
    Telegram { bot_token: String, chat_id: String },
}

impl NotificationChannel {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationChannel::Discord { .. } => NotificationKind::Discord,
            NotificationChannel::Slack { .. } => NotificationKind::Slack,
            NotificationChannel::Telegram { .. } => NotificationKind::Telegram,
        }
    }
}

/// Last-used settings for one monitoring tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub network: String,
    pub contract_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Kept as entered; the monitor expression consumes it verbatim.
    pub threshold: String,
    pub notification: NotificationChannel,
    /// Function picked from the contract interface, when introspection ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_signature: Option<String>,
    /// Numeric argument of that function compared against the threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_argument: Option<String>,
}

impl UserConfig {
    /// Apply command-line overrides on top of a saved configuration.
    pub fn apply_overrides(
        &mut self,
        network: Option<&str>,
        threshold: Option<&str>,
        contract: Option<&str>,
    ) {
        if let Some(network) = network.map(str::trim)
            && network != self.network
        {
            self.network = network.to_string();
            // A function picked for one network's contract does not carry over.
            self.clear_function();
        }
        if let Some(threshold) = threshold.map(str::trim) {
            self.threshold = threshold.to_string();
        }
        if let Some(contract) = contract.map(str::trim)
            && contract != self.contract_address
        {
            self.contract_address = contract.to_string();
            self.clear_function();
        }
    }

    fn clear_function(&mut self) {
        self.function_signature = None;
        self.threshold_argument = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> UserConfig {
        UserConfig {
            network: "stellar_testnet".to_string(),
            contract_address: "CABC".to_string(),
            display_name: None,
            threshold: "1000000".to_string(),
            notification: NotificationChannel::Discord {
                webhook_url: "https://discord.com/api/webhooks/123/abc".to_string(),
            },
            function_signature: Some("transfer(Address,Address,I128)".to_string()),
            threshold_argument: Some("amount".to_string()),
        }
    }

    #[test]
    fn notification_is_tagged_by_channel() {
        let telegram = NotificationChannel::Telegram {
            bot_token: "123:abc".to_string(),
            chat_id: "-100".to_string(),
        };
        let value = serde_json::to_value(&telegram).expect("serialize");
        assert_eq!(
            value,
            json!({"type": "telegram", "bot_token": "123:abc", "chat_id": "-100"})
        );
        assert_eq!(telegram.kind(), NotificationKind::Telegram);
    }

    #[test]
    fn overrides_replace_fields_and_reset_signature() {
        let mut cfg = sample();
        cfg.apply_overrides(None, Some("5"), None);
        assert_eq!(cfg.threshold, "5");
        assert!(cfg.function_signature.is_some());

        cfg.apply_overrides(Some("stellar_mainnet"), None, None);
        assert_eq!(cfg.network, "stellar_mainnet");
        assert_eq!(cfg.function_signature, None);
        assert_eq!(cfg.threshold_argument, None);
    }

    #[test]
    fn overrides_are_trimmed() {
        let mut cfg = sample();
        let contract = cfg.contract_address.clone();
        let padded = format!(" {contract} ");
        cfg.apply_overrides(Some(" stellar_testnet "), Some(" 7 "), Some(&padded));
        assert_eq!(cfg.threshold, "7");
        assert_eq!(cfg.contract_address, contract);
        assert_eq!(cfg.network, "stellar_testnet");
        assert!(cfg.function_signature.is_some());
    }

    #[test]
    fn kind_parses_from_snake_case() {
        assert_eq!(
            "slack".parse::<NotificationKind>().expect("parse"),
            NotificationKind::Slack
        );
        assert_eq!(NotificationKind::Discord.to_string(), "discord");
    }
}
