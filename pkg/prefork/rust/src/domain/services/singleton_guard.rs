// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Singleton Guard
//! Decides whether an instance owning a pid file is already running

use super::pid_file::{PidFile, PidFileContent};
use crate::domain::ports::ProcessControl;
use crate::domain::{PreforkError, Result};

pub struct SingletonGuard<'a> {
    pid_file: &'a PidFile,
    process: &'a dyn ProcessControl,
}

impl<'a> SingletonGuard<'a> {
    pub fn new(pid_file: &'a PidFile, process: &'a dyn ProcessControl) -> Self {
        Self { pid_file, process }
    }

    /// Returns the pid of the live instance, if any.
    ///
    /// A pid file naming a dead process (or holding garbage) is stale and is
    /// removed; failing to remove it is fatal for startup.
    pub fn active_pid(&self) -> Result<Option<u32>> {
        match self.pid_file.read()? {
            PidFileContent::Missing => Ok(None),
            PidFileContent::Pid(pid) if self.process.is_alive(pid) => Ok(Some(pid)),
            PidFileContent::Pid(_) | PidFileContent::Invalid => {
                self.pid_file
                    .remove()
                    .map_err(|e| PreforkError::StalePidFile {
                        path: self.pid_file.path().to_path_buf(),
                        source: e,
                    })?;
                Ok(None)
            }
        }
    }

    pub fn is_active(&self) -> Result<bool> {
        Ok(self.active_pid()?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ScriptedProcessControl;
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_no_pid_file_is_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::new(dir.path().join("svc.pid"));
        let process = ScriptedProcessControl::new();

        let guard = SingletonGuard::new(&pid_file, &process);
        assert!(!guard.is_active().unwrap());
    }

    #[test]
    fn test_live_pid_is_active_and_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::new(dir.path().join("svc.pid"));
        pid_file.write(555).unwrap();
        let process = ScriptedProcessControl::new().with_live_pid(555);

        let guard = SingletonGuard::new(&pid_file, &process);
        assert_eq!(guard.active_pid().unwrap(), Some(555));
        assert_eq!(std::fs::read_to_string(pid_file.path()).unwrap(), "555");
    }

    #[test]
    fn test_dead_pid_removes_stale_file() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::new(dir.path().join("svc.pid"));
        pid_file.write(556).unwrap();
        let process = ScriptedProcessControl::new();

        let guard = SingletonGuard::new(&pid_file, &process);
        assert!(!guard.is_active().unwrap());
        assert!(!pid_file.exists());
    }

    #[test]
    fn test_garbage_pid_file_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::new(dir.path().join("svc.pid"));
        std::fs::write(pid_file.path(), "garbage").unwrap();
        let process = ScriptedProcessControl::new();

        let guard = SingletonGuard::new(&pid_file, &process);
        assert!(!guard.is_active().unwrap());
        assert!(!pid_file.exists());
    }

    #[test]
    fn test_unreadable_pid_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the pid file path cannot be read as a pid file
        let path = dir.path().join("svc.pid");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("inner"), "x").unwrap();
        let pid_file = PidFile::new(&path);
        let process = ScriptedProcessControl::new();

        let guard = SingletonGuard::new(&pid_file, &process);
        assert!(guard.is_active().is_err());
        assert!(path.exists());
    }

    #[test]
    fn test_stale_file_that_cannot_be_removed_is_fatal() {
        // Directory permissions do not bind root
        if nix::unistd::geteuid().is_root() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("run");
        std::fs::create_dir(&run_dir).unwrap();
        let pid_file = PidFile::new(run_dir.join("svc.pid"));
        pid_file.write(557).unwrap();
        std::fs::set_permissions(&run_dir, Permissions::from_mode(0o555)).unwrap();
        let process = ScriptedProcessControl::new();

        let result = SingletonGuard::new(&pid_file, &process).is_active();
        std::fs::set_permissions(&run_dir, Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(err, PreforkError::StalePidFile { .. }), "{:?}", err);
        assert!(err.is_fatal());
        assert!(pid_file.exists());
    }
}
