use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use ozmon_cli::output;
use ozmon_cli::wizard;
use ozmon_core::AppConfig;
use ozmon_core::HomeLayout;
use ozmon_core::SessionId;
use ozmon_core::SessionManager;
use ozmon_core::TemplateStore;
use ozmon_core::config::load_user_config;
use ozmon_core::config::validate_tool_name;
use ozmon_core::config::write_user_config;
use ozmon_core::monitor::render_session_documents;
use ozmon_core::presets::require_preset;
use tracing::info;

pub const DEFAULT_TOOL: &str = "large-transfer";

#[derive(Debug, clap::Parser)]
pub struct StartArgs {
    /// Name of the monitoring tool whose settings are used and saved.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_TOOL)]
    pub tool: String,

    /// Run the setup wizard even when saved settings exist.
    #[arg(long)]
    pub reconfigure: bool,

    /// Network slug to use instead of the saved one (e.g. stellar_testnet).
    #[arg(long, value_name = "SLUG")]
    pub network: Option<String>,

    /// Alert threshold to use instead of the saved one.
    #[arg(long, value_name = "AMOUNT", allow_hyphen_values = true)]
    pub threshold: Option<String>,

    /// Contract address to use instead of the saved one.
    #[arg(long, value_name = "ADDRESS")]
    pub contract: Option<String>,
}

pub async fn run(layout: &HomeLayout, args: StartArgs) -> Result<()> {
    validate_tool_name(&args.tool)?;
    let app = AppConfig::load(layout).context("failed to load config.toml")?;

    let saved = load_user_config(layout, &args.tool)
        .with_context(|| format!("failed to read settings for '{}'", args.tool))?;
    let mut config = match saved {
        Some(saved) if !args.reconfigure => saved,
        saved => {
            println!("Configuring monitor '{}'", args.tool);
            wizard::run_interactive(saved.as_ref(), &app).await?
        }
    };

    if let Some(threshold) = args.threshold.as_deref() {
        wizard::validate_threshold(threshold).map_err(anyhow::Error::msg)?;
    }
    config.apply_overrides(
        args.network.as_deref(),
        args.threshold.as_deref(),
        args.contract.as_deref(),
    );

    let preset = require_preset(&config.network)?;
    // A saved address must still fit the network when either one changes.
    if args.network.is_some() || args.contract.is_some() {
        wizard::validate_contract_address(preset.kind, &config.contract_address)
            .map_err(anyhow::Error::msg)?;
    }
    write_user_config(layout, &args.tool, &config)
        .with_context(|| format!("failed to save settings for '{}'", args.tool))?;

    let store = TemplateStore::new(layout.templates_dir());
    store
        .install_builtin()
        .context("failed to install templates")?;
    let documents = render_session_documents(
        &store,
        &args.tool,
        &config,
        preset,
        app.rpc_url_for(preset),
    )?;

    let id = SessionId::generate();
    let session_dir = layout.session_dir(id.as_str());
    if session_dir.exists() {
        bail!("session directory {} already exists", session_dir.display());
    }
    documents
        .write_to(&session_dir)
        .with_context(|| format!("failed to write {}", session_dir.display()))?;
    info!("wrote monitor configuration to {}", session_dir.display());

    let manager = SessionManager::new(layout.clone(), app)?;
    let session = manager
        .start(id, &session_dir, &args.tool)
        .await
        .context("monitor failed to start")?;

    println!(
        "{}",
        output::success(&format!(
            "Monitor '{}' watching {} on {}",
            args.tool, config.contract_address, preset.name
        ))
    );
    println!("  session: {}", session.id);
    if let Some(pid) = session.pid {
        println!("  pid:     {pid}");
    }
    println!("  dir:     {}", session.session_dir.display());
    println!(
        "{}",
        output::dim(&format!("Stop it with `ozmon stop {}`.", session.id))
    );
    Ok(())
}
