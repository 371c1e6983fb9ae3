use anyhow::Result;
use anyhow::bail;
use ozmon_cli::output;
use ozmon_core::AppConfig;
use ozmon_core::HomeLayout;
use ozmon_core::SessionId;
use ozmon_core::SessionLiveness;
use ozmon_core::SessionManager;
use ozmon_core::session::manager::STDERR_LOG;

#[derive(Debug, clap::Parser)]
pub struct StatusArgs {
    /// Session id as shown by `ozmon list`.
    #[arg(value_name = "ID")]
    pub id: String,
}

pub fn run(layout: &HomeLayout, args: StatusArgs) -> Result<()> {
    let manager = SessionManager::new(layout.clone(), AppConfig::load(layout)?)?;
    let id = SessionId::from(args.id.as_str());

    match manager.liveness(&id)? {
        SessionLiveness::NotFound => bail!("no session with id '{id}'"),
        SessionLiveness::Running => {
            println!("{}", output::success(&format!("Session {id} is running")));
        }
        SessionLiveness::NotRunning => {
            println!("{}", output::failure(&format!("Session {id} is not running")));
            if let Some(session) = manager.registry().get(&id)? {
                let stderr = session.session_dir.join(STDERR_LOG);
                println!("  recorded status: {}", session.status);
                println!("  stderr log:      {}", stderr.display());
            }
        }
    }
    Ok(())
}
