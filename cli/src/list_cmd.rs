use anyhow::Result;
use ozmon_cli::output;
use ozmon_core::AppConfig;
use ozmon_core::HomeLayout;
use ozmon_core::SessionManager;

#[derive(Debug, clap::Parser)]
pub struct ListArgs {
    /// Output the sessions as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(layout: &HomeLayout, args: ListArgs) -> Result<()> {
    let manager = SessionManager::new(layout.clone(), AppConfig::load(layout)?)?;
    let sessions = manager.sessions_with_liveness()?;

    if args.json {
        let json: Vec<_> = sessions
            .iter()
            .map(|(session, liveness)| {
                serde_json::json!({
                    "id": session.id,
                    "tool": session.tool,
                    "pid": session.pid,
                    "status": session.status,
                    "state": output::display_status(session.status, *liveness),
                    "started_at": session.started_at,
                    "session_dir": session.session_dir,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No monitor sessions. Start one with `ozmon start`.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|(session, liveness)| {
            vec![
                session.id.to_string(),
                session.tool.clone(),
                session
                    .pid
                    .map(|pid| pid.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                output::display_status(session.status, *liveness).to_string(),
                session
                    .started_at
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string(),
                session.session_dir.display().to_string(),
            ]
        })
        .collect();
    output::render_table(&["ID", "Tool", "PID", "Status", "Started", "Dir"], &rows);
    Ok(())
}
