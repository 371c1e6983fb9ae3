use anyhow::Context;
use anyhow::Result;
use ozmon_cli::output;
use ozmon_core::AppConfig;
use ozmon_core::HomeLayout;
use ozmon_core::SessionId;
use ozmon_core::SessionManager;

#[derive(Debug, clap::Parser)]
pub struct StopArgs {
    /// Session id as shown by `ozmon list`.
    #[arg(value_name = "ID")]
    pub id: String,
}

pub fn run(layout: &HomeLayout, args: StopArgs) -> Result<()> {
    let manager = SessionManager::new(layout.clone(), AppConfig::load(layout)?)?;
    let id = SessionId::from(args.id.as_str());

    let stopped = manager
        .stop(&id)
        .with_context(|| format!("failed to stop session {id}"))?;
    if stopped {
        println!("{}", output::success(&format!("Stopped session {id}")));
    } else {
        println!("No session with id '{id}'.");
    }
    Ok(())
}
