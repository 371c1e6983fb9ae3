use std::fmt;

use anyhow::Result;
use anyhow::anyhow;
use inquire::Confirm;
use inquire::InquireError;
use inquire::Select;
use inquire::Text;
use inquire::validator::ErrorMessage;
use inquire::validator::Validation;
use strum::IntoEnumIterator;
use tracing::warn;

use ozmon_core::AppConfig;
use ozmon_core::NETWORK_PRESETS;
use ozmon_core::NetworkKind;
use ozmon_core::NetworkPreset;
use ozmon_core::NotificationChannel;
use ozmon_core::NotificationKind;
use ozmon_core::UserConfig;
use ozmon_core::stellar::ContractFunction;
use ozmon_core::stellar::fetch_contract_interface;

pub const DISCORD_WEBHOOK_PREFIX: &str = "https://discord.com/api/webhooks/";
pub const SLACK_WEBHOOK_PREFIX: &str = "https://hooks.slack.com/";

const STELLAR_ADDRESS_LEN: usize = 56;
const EVM_ADDRESS_HEX_LEN: usize = 40;

type ValidatorResult = std::result::Result<Validation, Box<dyn std::error::Error + Send + Sync>>;

pub fn validate_contract_address(
    kind: NetworkKind,
    input: &str,
) -> std::result::Result<(), String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Contract address must not be empty.".to_string());
    }
    match kind {
        NetworkKind::Stellar => {
            let well_formed = input.len() == STELLAR_ADDRESS_LEN
                && (input.starts_with('C') || input.starts_with('G'))
                && input
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
            if well_formed {
                Ok(())
            } else {
                Err("Stellar addresses are 56 characters starting with C or G.".to_string())
            }
        }
        NetworkKind::Evm => {
            let well_formed = input
                .strip_prefix("0x")
                .is_some_and(|hex| {
                    hex.len() == EVM_ADDRESS_HEX_LEN && hex.chars().all(|c| c.is_ascii_hexdigit())
                });
            if well_formed {
                Ok(())
            } else {
                Err("EVM addresses are 0x followed by 40 hex characters.".to_string())
            }
        }
    }
}

/// Accepts plain positive decimals such as `1000000` or `2.5`.
pub fn validate_threshold(input: &str) -> std::result::Result<(), String> {
    let input = input.trim();
    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (input, None),
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let well_formed = digits(whole) && fraction.is_none_or(digits);
    if !well_formed {
        return Err("Threshold must be a positive number.".to_string());
    }
    if input.chars().all(|c| c == '0' || c == '.') {
        return Err("Threshold must be greater than zero.".to_string());
    }
    Ok(())
}

pub fn validate_webhook(kind: NotificationKind, input: &str) -> std::result::Result<(), String> {
    let input = input.trim();
    let prefix = match kind {
        NotificationKind::Discord => DISCORD_WEBHOOK_PREFIX,
        NotificationKind::Slack => SLACK_WEBHOOK_PREFIX,
        NotificationKind::Telegram => return validate_non_empty("Webhook URL", input),
    };
    if input.starts_with(prefix) && input.len() > prefix.len() {
        Ok(())
    } else {
        Err(format!("{} webhooks start with {prefix}", kind.label()))
    }
}

pub fn validate_non_empty(label: &str, input: &str) -> std::result::Result<(), String> {
    if input.trim().is_empty() {
        Err(format!("{label} must not be empty."))
    } else {
        Ok(())
    }
}

fn to_validation(result: std::result::Result<(), String>) -> ValidatorResult {
    Ok(match result {
        Ok(()) => Validation::Valid,
        Err(message) => Validation::Invalid(ErrorMessage::Custom(message)),
    })
}

/// Unwraps a prompt answer. Esc or Ctrl-C ends the process right here.
fn answered<T>(result: std::result::Result<T, InquireError>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            eprintln!("Setup cancelled.");
            std::process::exit(1);
        }
        Err(err) => Err(anyhow!("prompt failed: {err}")),
    }
}

struct NetworkChoice(&'static NetworkPreset);

impl fmt::Display for NetworkChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0.name, self.0.kind)
    }
}

struct ChannelChoice(NotificationKind);

impl fmt::Display for ChannelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.label())
    }
}

struct FunctionChoice(ContractFunction);

impl fmt::Display for FunctionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.monitor_signature())
    }
}

/// Walks the user through every setting, pre-filling answers from `existing`.
pub async fn run_interactive(existing: Option<&UserConfig>, app: &AppConfig) -> Result<UserConfig> {
    let preset = prompt_network(existing)?;
    let kind = preset.kind;

    let contract_address = answered(
        Text::new("Contract address")
            .with_initial_value(
                existing
                    .filter(|cfg| cfg.network == preset.slug)
                    .map(|cfg| cfg.contract_address.as_str())
                    .unwrap_or_default(),
            )
            .with_validator(move |input: &str| {
                to_validation(validate_contract_address(kind, input))
            })
            .prompt(),
    )?
    .trim()
    .to_string();

    let display_name = answered(
        Text::new("Display name (Enter to skip)")
            .with_initial_value(
                existing
                    .and_then(|cfg| cfg.display_name.as_deref())
                    .unwrap_or_default(),
            )
            .prompt(),
    )?
    .trim()
    .to_string();

    let threshold = answered(
        Text::new("Alert when the amount exceeds")
            .with_initial_value(
                existing
                    .map(|cfg| cfg.threshold.as_str())
                    .unwrap_or_default(),
            )
            .with_validator(|input: &str| to_validation(validate_threshold(input)))
            .prompt(),
    )?
    .trim()
    .to_string();

    let (function_signature, threshold_argument) = match kind {
        NetworkKind::Stellar => prompt_contract_function(app, preset, &contract_address).await?,
        NetworkKind::Evm => (None, None),
    };

    let notification = prompt_notification(existing.map(|cfg| &cfg.notification))?;

    Ok(UserConfig {
        network: preset.slug.to_string(),
        contract_address,
        display_name: Some(display_name).filter(|name| !name.is_empty()),
        threshold,
        notification,
        function_signature,
        threshold_argument,
    })
}

fn prompt_network(existing: Option<&UserConfig>) -> Result<&'static NetworkPreset> {
    let options: Vec<NetworkChoice> = NETWORK_PRESETS.iter().map(NetworkChoice).collect();
    let start = existing
        .and_then(|cfg| NETWORK_PRESETS.iter().position(|p| p.slug == cfg.network))
        .unwrap_or(0);
    let choice = answered(
        Select::new("Network", options)
            .with_starting_cursor(start)
            .prompt(),
    )?;
    Ok(choice.0)
}

/// Offers to read the contract's interface and pick the watched function.
/// Any failure falls back to the default transfer signature.
async fn prompt_contract_function(
    app: &AppConfig,
    preset: &NetworkPreset,
    contract_address: &str,
) -> Result<(Option<String>, Option<String>)> {
    let inspect = answered(
        Confirm::new("Inspect the contract to choose the watched function?")
            .with_default(true)
            .prompt(),
    )?;
    if !inspect {
        return Ok((None, None));
    }

    let fallback = preset.kind.default_function_signature();
    let interface = match fetch_contract_interface(
        app.stellar_cli(),
        contract_address,
        preset,
        app.rpc_url_for(preset),
    )
    .await
    {
        Ok(interface) => interface,
        Err(err) => {
            warn!("contract introspection failed: {err}");
            println!("Could not read the contract interface; watching {fallback}.");
            return Ok((None, None));
        }
    };

    let functions: Vec<FunctionChoice> = interface
        .thresholdable_functions()
        .cloned()
        .map(FunctionChoice)
        .collect();
    if functions.is_empty() {
        println!("The contract has no function with an integer argument; watching {fallback}.");
        return Ok((None, None));
    }

    let FunctionChoice(function) = answered(Select::new("Function to watch", functions).prompt())?;
    let mut numeric: Vec<String> = function
        .numeric_inputs()
        .map(|param| param.name.clone())
        .collect();
    let argument = if numeric.len() == 1 {
        numeric.remove(0)
    } else {
        answered(Select::new("Argument compared against the threshold", numeric).prompt())?
    };

    Ok((Some(function.monitor_signature()), Some(argument)))
}

fn prompt_notification(existing: Option<&NotificationChannel>) -> Result<NotificationChannel> {
    let options: Vec<ChannelChoice> = NotificationKind::iter().map(ChannelChoice).collect();
    let start = existing
        .and_then(|channel| NotificationKind::iter().position(|k| k == channel.kind()))
        .unwrap_or(0);
    let ChannelChoice(kind) = answered(
        Select::new("Notification channel", options)
            .with_starting_cursor(start)
            .prompt(),
    )?;

    let previous = existing.filter(|channel| channel.kind() == kind);
    let channel = match kind {
        NotificationKind::Discord | NotificationKind::Slack => {
            let initial = match previous {
                Some(
                    NotificationChannel::Discord { webhook_url }
                    | NotificationChannel::Slack { webhook_url },
                ) => webhook_url.as_str(),
                _ => "",
            };
            let webhook_url = answered(
                Text::new(&format!("{} webhook URL", kind.label()))
                    .with_initial_value(initial)
                    .with_validator(move |input: &str| to_validation(validate_webhook(kind, input)))
                    .prompt(),
            )?
            .trim()
            .to_string();
            if kind == NotificationKind::Discord {
                NotificationChannel::Discord { webhook_url }
            } else {
                NotificationChannel::Slack { webhook_url }
            }
        }
        NotificationKind::Telegram => {
            let (token, chat) = match previous {
                Some(NotificationChannel::Telegram { bot_token, chat_id }) => {
                    (bot_token.as_str(), chat_id.as_str())
                }
                _ => ("", ""),
            };
            let bot_token = answered(
                Text::new("Telegram bot token")
                    .with_initial_value(token)
                    .with_validator(|input: &str| {
                        to_validation(validate_non_empty("Bot token", input))
                    })
                    .prompt(),
            )?
            .trim()
            .to_string();
            let chat_id = answered(
                Text::new("Telegram chat id")
                    .with_initial_value(chat)
                    .with_validator(|input: &str| {
                        to_validation(validate_non_empty("Chat id", input))
                    })
                    .prompt(),
            )?
            .trim()
            .to_string();
            NotificationChannel::Telegram { bot_token, chat_id }
        }
    };
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STELLAR_CONTRACT: &str = "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC";

    #[test]
    fn stellar_addresses() {
        assert_eq!(validate_contract_address(NetworkKind::Stellar, STELLAR_CONTRACT), Ok(()));
        assert_eq!(
            validate_contract_address(
                NetworkKind::Stellar,
                "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ"
            ),
            Ok(())
        );
        assert!(validate_contract_address(NetworkKind::Stellar, "CDLZFC3").is_err());
        assert!(
            validate_contract_address(NetworkKind::Stellar, &STELLAR_CONTRACT.to_lowercase())
                .is_err()
        );
        assert!(validate_contract_address(NetworkKind::Stellar, "").is_err());
    }

    #[test]
    fn evm_addresses() {
        assert_eq!(
            validate_contract_address(
                NetworkKind::Evm,
                "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"
            ),
            Ok(())
        );
        assert!(
            validate_contract_address(NetworkKind::Evm, "1c7D4B196Cb0C7B01d743Fbc6116a902379C7238")
                .is_err()
        );
        assert!(validate_contract_address(NetworkKind::Evm, "0x1234").is_err());
        assert!(validate_contract_address(NetworkKind::Evm, STELLAR_CONTRACT).is_err());
    }

    #[test]
    fn thresholds_must_be_positive_numbers() {
        for ok in ["1000000", "2.5", "0.01", " 7 "] {
            assert_eq!(validate_threshold(ok), Ok(()), "{ok}");
        }
        for bad in ["", "0", "0.0", "-5", "abc", "1e6", "1.", ".5", "1.2.3"] {
            assert!(validate_threshold(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn webhook_prefixes_match_channel() {
        assert_eq!(
            validate_webhook(NotificationKind::Discord, "https://discord.com/api/webhooks/123/abc"),
            Ok(())
        );
        assert!(
            validate_webhook(NotificationKind::Discord, "https://hooks.slack.com/services/x")
                .is_err()
        );
        assert!(validate_webhook(NotificationKind::Discord, DISCORD_WEBHOOK_PREFIX).is_err());
        assert_eq!(
            validate_webhook(NotificationKind::Slack, "https://hooks.slack.com/services/T/B/x"),
            Ok(())
        );
        assert!(
            validate_webhook(NotificationKind::Slack, "http://hooks.slack.com/services/x").is_err()
        );
    }

    #[test]
    fn telegram_fields_must_be_present() {
        assert!(validate_non_empty("Chat id", "  ").is_err());
        assert_eq!(validate_non_empty("Chat id", "-1001"), Ok(()));
    }
}
