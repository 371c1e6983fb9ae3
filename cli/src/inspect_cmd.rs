use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use ozmon_cli::output;
use ozmon_core::AppConfig;
use ozmon_core::HomeLayout;
use ozmon_core::NetworkKind;
use ozmon_core::presets::require_preset;
use ozmon_core::stellar::fetch_contract_interface;

#[derive(Debug, clap::Parser)]
pub struct InspectArgs {
    /// Soroban contract id (C...).
    #[arg(value_name = "CONTRACT")]
    pub contract: String,

    /// Stellar network slug.
    #[arg(long, value_name = "SLUG", default_value = "stellar_testnet")]
    pub network: String,

    /// Output the interface as JSON.
    #[arg(long)]
    pub json: bool,
}

pub async fn run(layout: &HomeLayout, args: InspectArgs) -> Result<()> {
    let app = AppConfig::load(layout)?;
    let preset = require_preset(&args.network)?;
    if preset.kind != NetworkKind::Stellar {
        bail!("contract inspection is only available on Stellar networks");
    }

    let interface = fetch_contract_interface(
        app.stellar_cli(),
        &args.contract,
        preset,
        app.rpc_url_for(preset),
    )
    .await
    .with_context(|| format!("failed to inspect {}", args.contract))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&interface)?);
        return Ok(());
    }

    if interface.functions.is_empty() {
        println!("No functions exported by {}.", args.contract);
    } else {
        let rows: Vec<Vec<String>> = interface
            .functions
            .iter()
            .map(|function| {
                let numeric: Vec<&str> = function
                    .numeric_inputs()
                    .map(|param| param.name.as_str())
                    .collect();
                vec![
                    function.name.clone(),
                    function.monitor_signature(),
                    if numeric.is_empty() {
                        "-".to_string()
                    } else {
                        numeric.join(", ")
                    },
                ]
            })
            .collect();
        output::render_table(&["Function", "Signature", "Numeric args"], &rows);
    }

    if !interface.events.is_empty() {
        println!();
        let rows: Vec<Vec<String>> = interface
            .events
            .iter()
            .map(|event| {
                let params: Vec<String> = event
                    .params
                    .iter()
                    .map(|p| {
                        let marker = if p.topic { " (topic)" } else { "" };
                        format!("{}: {}{marker}", p.name, p.type_name)
                    })
                    .collect();
                vec![event.name.clone(), params.join(", ")]
            })
            .collect();
        output::render_table(&["Event", "Params"], &rows);
    }
    Ok(())
}
