//! Built-in, read-only descriptions of the networks the wizard offers.

use serde::Serialize;
use strum_macros::Display;

use crate::error::MonitorErr;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum NetworkKind {
    Stellar,
    #[strum(serialize = "EVM")]
    #[serde(rename = "EVM")]
    Evm,
}

impl NetworkKind {
    /// Name shared by the network and monitor templates of this family.
    pub fn template_name(self) -> &'static str {
        match self {
            NetworkKind::Stellar => "stellar",
            NetworkKind::Evm => "evm",
        }
    }

    /// Function watched when the user does not pick one.
    pub fn default_function_signature(self) -> &'static str {
        match self {
            NetworkKind::Stellar => "transfer(Address,Address,I128)",
            NetworkKind::Evm => "transfer(address,uint256)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkPreset {
    pub slug: &'static str,
    pub name: &'static str,
    pub kind: NetworkKind,
    pub rpc_url: &'static str,
    pub chain_id: Option<u64>,
    pub network_passphrase: Option<&'static str>,
    pub block_time_ms: u64,
    pub confirmation_blocks: u64,
    pub cron_schedule: &'static str,
    pub max_past_blocks: u64,
}

pub const NETWORK_PRESETS: &[NetworkPreset] = &[
    NetworkPreset {
        slug: "stellar_mainnet",
        name: "Stellar Mainnet",
        kind: NetworkKind::Stellar,
        rpc_url: "https://mainnet.sorobanrpc.com",
        chain_id: None,
        network_passphrase: Some("Public Global Stellar Network ; September 2015"),
        block_time_ms: 5_000,
        confirmation_blocks: 2,
        cron_schedule: "0 */1 * * * *",
        max_past_blocks: 20,
    },
    NetworkPreset {
        slug: "stellar_testnet",
        name: "Stellar Testnet",
        kind: NetworkKind::Stellar,
        rpc_url: "https://soroban-testnet.stellar.org",
        chain_id: None,
        network_passphrase: Some("Test SDF Network ; September 2015"),
        block_time_ms: 5_000,
        confirmation_blocks: 2,
        cron_schedule: "0 */1 * * * *",
        max_past_blocks: 20,
    },
    NetworkPreset {
        slug: "ethereum_mainnet",
        name: "Ethereum Mainnet",
        kind: NetworkKind::Evm,
        rpc_url: "https://eth.drpc.org",
        chain_id: Some(1),
        network_passphrase: None,
        block_time_ms: 12_000,
        confirmation_blocks: 12,
        cron_schedule: "0 */1 * * * *",
        max_past_blocks: 18,
    },
    NetworkPreset {
        slug: "ethereum_sepolia",
        name: "Ethereum Sepolia",
        kind: NetworkKind::Evm,
        rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
        chain_id: Some(11155111),
        network_passphrase: None,
        block_time_ms: 12_000,
        confirmation_blocks: 6,
        cron_schedule: "0 */1 * * * *",
        max_past_blocks: 18,
    },
];

pub fn find_preset(slug: &str) -> Option<&'static NetworkPreset> {
    NETWORK_PRESETS.iter().find(|preset| preset.slug == slug)
}

pub fn require_preset(slug: &str) -> Result<&'static NetworkPreset> {
    find_preset(slug).ok_or_else(|| MonitorErr::UnknownNetwork(slug.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn slugs_are_unique() {
        let slugs: HashSet<_> = NETWORK_PRESETS.iter().map(|p| p.slug).collect();
        assert_eq!(slugs.len(), NETWORK_PRESETS.len());
    }

    #[test]
    fn chain_metadata_matches_kind() {
        for preset in NETWORK_PRESETS {
            match preset.kind {
                NetworkKind::Stellar => {
                    assert!(preset.network_passphrase.is_some(), "{}", preset.slug);
                    assert_eq!(preset.chain_id, None);
                }
                NetworkKind::Evm => {
                    assert!(preset.chain_id.is_some(), "{}", preset.slug);
                    assert_eq!(preset.network_passphrase, None);
                }
            }
        }
    }

    #[test]
    fn unknown_slug_is_rejected() {
        let err = require_preset("solana_mainnet").expect_err("unknown");
        assert_eq!(err.to_string(), "unknown network 'solana_mainnet'");
        assert_eq!(
            require_preset("stellar_testnet").expect("known").kind,
            NetworkKind::Stellar
        );
    }
}
