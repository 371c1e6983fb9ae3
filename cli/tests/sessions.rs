use std::fs;
use std::path::Path;

use anyhow::Result;
use predicates::str::contains;
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;
use serde_json::json;
use tempfile::TempDir;

fn ozmon_command(home: &Path) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("ozmon")?;
    cmd.env("OZMON_HOME", home);
    cmd.env_remove("RUST_LOG");
    Ok(cmd)
}

fn seed_dead_session(home: &Path, id: &str) -> Result<std::path::PathBuf> {
    let mut child = std::process::Command::new("true").spawn()?;
    let pid = child.id();
    child.wait()?;

    let session_dir = home.join("sessions").join(id);
    fs::create_dir_all(session_dir.join("config"))?;
    let sessions = json!([{
        "id": id,
        "tool": "large-transfer",
        "session_dir": session_dir,
        "pid": pid,
        "started_at": "2025-03-01T12:00:00Z",
        "status": "running",
    }]);
    fs::write(home.join("sessions.json"), serde_json::to_vec_pretty(&sessions)?)?;
    Ok(session_dir)
}

#[test]
fn list_shows_empty_state() -> Result<()> {
    let home = TempDir::new()?;

    ozmon_command(home.path())?
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No monitor sessions."));

    Ok(())
}

#[test]
fn list_json_is_an_empty_array() -> Result<()> {
    let home = TempDir::new()?;

    let output = ozmon_command(home.path())?.args(["list", "--json"]).output()?;
    assert!(output.status.success());
    let value: JsonValue = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value, json!([]));

    Ok(())
}

#[test]
fn stop_unknown_session_is_not_an_error() -> Result<()> {
    let home = TempDir::new()?;

    ozmon_command(home.path())?
        .args(["stop", "nope1234"])
        .assert()
        .success()
        .stdout(contains("No session with id 'nope1234'."));

    Ok(())
}

#[test]
fn status_unknown_session_fails() -> Result<()> {
    let home = TempDir::new()?;

    ozmon_command(home.path())?
        .args(["status", "nope1234"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Error: no session with id 'nope1234'"));

    Ok(())
}

#[test]
fn dead_session_is_listed_as_exited_and_can_be_stopped() -> Result<()> {
    let home = TempDir::new()?;
    let session_dir = seed_dead_session(home.path(), "dead0001")?;

    let output = ozmon_command(home.path())?.arg("list").output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("ID"), "{stdout}");
    assert!(stdout.contains("dead0001"), "{stdout}");
    assert!(stdout.contains("exited"), "{stdout}");

    ozmon_command(home.path())?
        .args(["status", "dead0001"])
        .assert()
        .success()
        .stdout(contains("is not running"));

    ozmon_command(home.path())?
        .args(["stop", "dead0001"])
        .assert()
        .success()
        .stdout(contains("Stopped session dead0001"));

    assert!(!session_dir.exists());
    let remaining: JsonValue =
        serde_json::from_slice(&fs::read(home.path().join("sessions.json"))?)?;
    assert_eq!(remaining, json!([]));

    Ok(())
}
