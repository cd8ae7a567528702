// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Daemon configuration
//!
//! Immutable once built. Paths default to `/var/run/<name>.pid` and
//! `/var/log/<name>.log` and are made absolute at build time, because the
//! controller changes its working directory to `/` after detaching.

use crate::constants::{logging, paths, supervision};
use crate::domain::ports::LogLevel;
use crate::domain::{PreforkError, Result};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    name: String,
    pid_file: PathBuf,
    log_file: PathBuf,
    log_level: LogLevel,
    reap_interval: Duration,
    shutdown_grace: Duration,
    process_titles: bool,
}

impl DaemonConfig {
    pub fn builder(name: impl Into<String>) -> DaemonConfigBuilder {
        DaemonConfigBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Idle wait between reap attempts when a loop iteration did no work
    pub fn reap_interval(&self) -> Duration {
        self.reap_interval
    }

    /// How long the controller keeps reaping workers after signalling them
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    pub fn process_titles(&self) -> bool {
        self.process_titles
    }

    /// Check that the directories holding the pid file and the log file
    /// exist and are writable by the current user.
    pub fn validate_paths(&self) -> Result<()> {
        ensure_parent_writable(&self.pid_file)?;
        ensure_parent_writable(&self.log_file)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DaemonConfigBuilder {
    name: String,
    pid_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
    log_level: Option<LogLevel>,
    reap_interval: Duration,
    shutdown_grace: Duration,
    process_titles: bool,
}

impl DaemonConfigBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pid_file: None,
            log_file: None,
            log_level: None,
            reap_interval: Duration::from_millis(supervision::DEFAULT_REAP_INTERVAL_MS),
            shutdown_grace: Duration::from_secs(supervision::DEFAULT_SHUTDOWN_GRACE_SEC),
            process_titles: true,
        }
    }

    pub fn pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pid_file = Some(path.into());
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// `Duration::ZERO` polls the reap call without any idle wait
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn process_titles(mut self, enabled: bool) -> Self {
        self.process_titles = enabled;
        self
    }

    pub fn build(self) -> Result<DaemonConfig> {
        let name = self.name.trim().to_string();
        validate_name(&name)?;

        let pid_file = match self.pid_file {
            Some(path) => path,
            None => default_path(paths::DEFAULT_RUNTIME_DIR, &name, paths::PID_FILE_EXTENSION),
        };
        let log_file = match self.log_file {
            Some(path) => path,
            None => default_path(paths::DEFAULT_LOG_DIR, &name, paths::LOG_FILE_EXTENSION),
        };

        let log_level = match self.log_level {
            Some(level) => level,
            None => LogLevel::parse(logging::DEFAULT_LOG_LEVEL).unwrap_or(LogLevel::Info),
        };

        Ok(DaemonConfig {
            name,
            pid_file: absolute(pid_file)?,
            log_file: absolute(log_file)?,
            log_level,
            reap_interval: self.reap_interval,
            shutdown_grace: self.shutdown_grace,
            process_titles: self.process_titles,
        })
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PreforkError::InvalidName(
            "Name cannot be empty".to_string(),
        ));
    }
    if name.contains('/') || name.contains('\0') {
        return Err(PreforkError::InvalidName(format!(
            "'{}' must not contain '/' or NUL",
            name
        )));
    }
    Ok(())
}

fn default_path(dir: &str, name: &str, extension: &str) -> PathBuf {
    Path::new(dir).join(format!("{}.{}", name, extension))
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(PreforkError::InvalidConfiguration(
            "File path cannot be empty".to_string(),
        ));
    }
    std::path::absolute(&path).map_err(|e| {
        PreforkError::InvalidConfiguration(format!("Cannot resolve path {:?}: {}", path, e))
    })
}

fn ensure_parent_writable(file: &Path) -> Result<()> {
    let dir = file.parent().unwrap_or_else(|| Path::new("/"));

    if !dir.is_dir() {
        return Err(PreforkError::DirectoryNotWritable {
            path: dir.to_path_buf(),
            reason: "directory does not exist".to_string(),
        });
    }

    let dir_cstr = CString::new(dir.as_os_str().as_bytes()).map_err(|_| {
        PreforkError::InvalidConfiguration(format!("Path {:?} contains a NUL byte", dir))
    })?;

    // SAFETY: `dir_cstr` is a valid NUL-terminated path
    if unsafe { libc::access(dir_cstr.as_ptr(), libc::W_OK) } != 0 {
        return Err(PreforkError::DirectoryNotWritable {
            path: dir.to_path_buf(),
            reason: std::io::Error::last_os_error().to_string(),
        });
    }

    Ok(())
}
