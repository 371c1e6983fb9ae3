//! Soroban contract interface introspection.
//!
//! A deployed contract's interface is a stream of `ScSpecEntry` XDR values.
//! The Stellar CLI fetches it from the network; this module decodes the
//! stream into functions and events the wizard can offer.

use std::io::Cursor;
use std::io::ErrorKind;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use stellar_xdr::curr::Limited;
use stellar_xdr::curr::Limits;
use stellar_xdr::curr::ReadXdr;
use stellar_xdr::curr::ScSpecEntry;
use stellar_xdr::curr::ScSpecEventParamLocationV0;
use stellar_xdr::curr::ScSpecTypeDef;
use tracing::debug;

use crate::error::MonitorErr;
use crate::error::Result;
use crate::presets::NetworkPreset;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractParam {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Integer typed, so usable on the left of a threshold comparison.
    pub numeric: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractFunction {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub doc: String,
    pub inputs: Vec<ContractParam>,
    pub outputs: Vec<String>,
}

impl ContractFunction {
    /// Signature in the form the monitor matches on, e.g.
    /// `transfer(Address,Address,I128)`.
    pub fn monitor_signature(&self) -> String {
        let types: Vec<&str> = self
            .inputs
            .iter()
            .map(|input| input.type_name.as_str())
            .collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn numeric_inputs(&self) -> impl Iterator<Item = &ContractParam> {
        self.inputs.iter().filter(|input| input.numeric)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractEventParam {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub topic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractEvent {
    pub name: String,
    pub params: Vec<ContractEventParam>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContractInterface {
    pub functions: Vec<ContractFunction>,
    pub events: Vec<ContractEvent>,
}

impl ContractInterface {
    pub fn function(&self, name: &str) -> Option<&ContractFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Functions with at least one integer argument to compare against a
    /// threshold.
    pub fn thresholdable_functions(&self) -> impl Iterator<Item = &ContractFunction> {
        self.functions
            .iter()
            .filter(|f| f.numeric_inputs().next().is_some())
    }
}

/// Decodes a concatenated stream of `ScSpecEntry` values. Entry kinds other
/// than functions and events are skipped.
pub fn decode_spec(bytes: &[u8]) -> Result<ContractInterface> {
    let mut interface = ContractInterface::default();
    let mut reader = Limited::new(Cursor::new(bytes), Limits::none());
    let len = bytes.len() as u64;

    while reader.inner.position() < len {
        match ScSpecEntry::read_xdr(&mut reader)? {
            ScSpecEntry::FunctionV0(function) => {
                interface.functions.push(ContractFunction {
                    name: function.name.0.to_utf8_string_lossy(),
                    doc: function.doc.to_utf8_string_lossy(),
                    inputs: function
                        .inputs
                        .iter()
                        .map(|input| ContractParam {
                            name: input.name.to_utf8_string_lossy(),
                            type_name: type_name(&input.type_),
                            numeric: is_numeric(&input.type_),
                        })
                        .collect(),
                    outputs: function.outputs.iter().map(type_name).collect(),
                });
            }
            ScSpecEntry::EventV0(event) => {
                interface.events.push(ContractEvent {
                    name: event.name.0.to_utf8_string_lossy(),
                    params: event
                        .params
                        .iter()
                        .map(|param| ContractEventParam {
                            name: param.name.to_utf8_string_lossy(),
                            type_name: type_name(&param.type_),
                            topic: matches!(
                                param.location,
                                ScSpecEventParamLocationV0::TopicList
                            ),
                        })
                        .collect(),
                });
            }
            _ => {}
        }
    }

    debug!(
        "decoded contract spec: {} function(s), {} event(s)",
        interface.functions.len(),
        interface.events.len()
    );
    Ok(interface)
}

/// Like [`decode_spec`] but takes base64 text. Embedded whitespace and line
/// breaks are ignored.
pub fn decode_spec_base64(text: &str) -> Result<ContractInterface> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| MonitorErr::ContractSpec(format!("invalid base64 interface: {e}")))?;
    decode_spec(&bytes)
}

/// Asks the Stellar CLI for the deployed interface of `contract_id`.
pub async fn fetch_contract_interface(
    stellar_cli: &str,
    contract_id: &str,
    preset: &NetworkPreset,
    rpc_url: &str,
) -> Result<ContractInterface> {
    let passphrase = preset.network_passphrase.ok_or_else(|| {
        MonitorErr::ContractSpec(format!("{} is not a Stellar network", preset.slug))
    })?;

    debug!("fetching interface of {contract_id} via {stellar_cli}");
    let output = tokio::process::Command::new(stellar_cli)
        .args(["contract", "info", "interface", "--contract-id"])
        .arg(contract_id)
        .arg("--rpc-url")
        .arg(rpc_url)
        .arg("--network-passphrase")
        .arg(passphrase)
        .args(["--output", "xdr-base64"])
        .output()
        .await
        .map_err(|err| match err.kind() {
            ErrorKind::NotFound => {
                MonitorErr::ContractSpec(format!("'{stellar_cli}' was not found on PATH"))
            }
            _ => MonitorErr::ContractSpec(format!("failed to run '{stellar_cli}': {err}")),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MonitorErr::ContractSpec(format!(
            "'{stellar_cli}' exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    decode_spec_base64(&String::from_utf8_lossy(&output.stdout))
}

fn is_numeric(def: &ScSpecTypeDef) -> bool {
    matches!(
        def,
        ScSpecTypeDef::U32
            | ScSpecTypeDef::I32
            | ScSpecTypeDef::U64
            | ScSpecTypeDef::I64
            | ScSpecTypeDef::U128
            | ScSpecTypeDef::I128
            | ScSpecTypeDef::U256
            | ScSpecTypeDef::I256
    )
}

fn type_name(def: &ScSpecTypeDef) -> String {
    match def {
        ScSpecTypeDef::Option(option) => format!("Option<{}>", type_name(&option.value_type)),
        ScSpecTypeDef::Vec(vec) => format!("Vec<{}>", type_name(&vec.element_type)),
        ScSpecTypeDef::Map(map) => format!(
            "Map<{},{}>",
            type_name(&map.key_type),
            type_name(&map.value_type)
        ),
        ScSpecTypeDef::Result(result) => format!(
            "Result<{},{}>",
            type_name(&result.ok_type),
            type_name(&result.error_type)
        ),
        ScSpecTypeDef::Tuple(tuple) => {
            let items: Vec<String> = tuple.value_types.iter().map(type_name).collect();
            format!("Tuple<{}>", items.join(","))
        }
        ScSpecTypeDef::BytesN(bytes) => format!("BytesN<{}>", bytes.n),
        ScSpecTypeDef::Udt(udt) => udt.name.to_utf8_string_lossy(),
        other => other.name().to_string(),
    }
}
