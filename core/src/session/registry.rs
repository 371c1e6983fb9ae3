//! On-disk list of monitor sessions.
//!
//! The whole list lives in one JSON document. Every read-modify-write runs
//! while holding an exclusive lock on a sibling lock file, so two CLI
//! invocations never lose each other's updates.

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::ErrorKind;

use tracing::debug;

use super::SessionId;
use super::SessionInfo;
use super::SessionStatus;
use crate::config::HomeLayout;
use crate::config::write_atomically;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct SessionRegistry {
    layout: HomeLayout,
}

impl SessionRegistry {
    pub fn new(layout: HomeLayout) -> Self {
        Self { layout }
    }

    pub fn load_all(&self) -> Result<Vec<SessionInfo>> {
        let _lock = self.lock()?;
        self.read()
    }

    pub fn get(&self, id: &SessionId) -> Result<Option<SessionInfo>> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|session| &session.id == id))
    }

    /// Appends `session`, replacing any record that already uses its id.
    pub fn add(&self, session: SessionInfo) -> Result<()> {
        self.mutate(|sessions| {
            sessions.retain(|existing| existing.id != session.id);
            sessions.push(session);
            true
        })
        .map(|_| ())
    }

    /// Returns false when no record has `id`.
    pub fn update_status(&self, id: &SessionId, status: SessionStatus) -> Result<bool> {
        self.mutate(|sessions| match sessions.iter_mut().find(|s| &s.id == id) {
            Some(session) => {
                session.status = status;
                true
            }
            None => false,
        })
    }

    /// Returns false when no record has `id`.
    pub fn remove(&self, id: &SessionId) -> Result<bool> {
        self.mutate(|sessions| {
            let before = sessions.len();
            sessions.retain(|session| &session.id != id);
            sessions.len() != before
        })
    }

    fn mutate(&self, apply: impl FnOnce(&mut Vec<SessionInfo>) -> bool) -> Result<bool> {
        let _lock = self.lock()?;
        let mut sessions = self.read()?;
        let changed = apply(&mut sessions);
        if changed {
            let json = serde_json::to_vec_pretty(&sessions)?;
            write_atomically(
                self.layout.root(),
                &self.layout.sessions_file(),
                &json,
            )?;
            debug!("session registry now holds {} record(s)", sessions.len());
        }
        Ok(changed)
    }

    fn read(&self) -> Result<Vec<SessionInfo>> {
        match fs::read(self.layout.sessions_file()) {
            Ok(data) if data.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn lock(&self) -> Result<RegistryLock> {
        fs::create_dir_all(self.layout.root())?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.layout.sessions_lock())?;
        lock_exclusive(&file)?;
        Ok(RegistryLock { _file: file })
    }
}

/// Held for the duration of one registry operation. Closing the file
/// releases the lock.
struct RegistryLock {
    _file: File,
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;

    loop {
        // SAFETY: the descriptor comes from `file`, which stays open for the
        // whole call. LOCK_EX without LOCK_NB blocks until the lock is ours.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn session(id: &str) -> SessionInfo {
        SessionInfo {
            id: SessionId::from(id),
            tool: "large-transfer".to_string(),
            session_dir: format!("/tmp/sessions/{id}").into(),
            pid: Some(4242),
            started_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("ts"),
            status: SessionStatus::Running,
        }
    }

    fn registry() -> (TempDir, SessionRegistry) {
        let tmp = TempDir::new().expect("tempdir");
        let registry = SessionRegistry::new(HomeLayout::new(tmp.path()));
        (tmp, registry)
    }

    #[test]
    fn empty_when_file_missing() {
        let (_tmp, registry) = registry();
        assert_eq!(registry.load_all().expect("load"), Vec::new());
    }

    #[test]
    fn add_then_load_contains_record_once() {
        let (_tmp, registry) = registry();
        registry.add(session("aaaa1111")).expect("add");
        registry.add(session("bbbb2222")).expect("add");
        registry.add(session("aaaa1111")).expect("re-add");

        let ids: Vec<_> = registry
            .load_all()
            .expect("load")
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, vec!["bbbb2222".to_string(), "aaaa1111".to_string()]);
    }

    #[test]
    fn remove_drops_record() {
        let (_tmp, registry) = registry();
        registry.add(session("aaaa1111")).expect("add");

        assert!(registry.remove(&SessionId::from("aaaa1111")).expect("remove"));
        assert!(!registry.remove(&SessionId::from("aaaa1111")).expect("remove again"));
        assert_eq!(registry.load_all().expect("load"), Vec::new());
    }

    #[test]
    fn update_status_changes_only_target() {
        let (_tmp, registry) = registry();
        registry.add(session("aaaa1111")).expect("add");
        registry.add(session("bbbb2222")).expect("add");

        assert!(
            registry
                .update_status(&SessionId::from("bbbb2222"), SessionStatus::Error)
                .expect("update")
        );
        assert!(
            !registry
                .update_status(&SessionId::from("zzzz9999"), SessionStatus::Error)
                .expect("update missing")
        );

        let a = registry.get(&SessionId::from("aaaa1111")).expect("get");
        let b = registry.get(&SessionId::from("bbbb2222")).expect("get");
        assert_eq!(a.map(|s| s.status), Some(SessionStatus::Running));
        assert_eq!(b.map(|s| s.status), Some(SessionStatus::Error));
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let (_tmp, registry) = registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .add(session(&format!("thread{n:02}")))
                        .expect("add");
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("join");
        }

        assert_eq!(registry.load_all().expect("load").len(), 8);
    }

    #[test]
    fn file_is_a_json_array() {
        let (tmp, registry) = registry();
        registry.add(session("aaaa1111")).expect("add");

        let raw = fs::read_to_string(tmp.path().join("sessions.json")).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("parse");
        assert_eq!(value[0]["id"], serde_json::json!("aaaa1111"));
        assert_eq!(value[0]["status"], serde_json::json!("running"));
    }
}
