// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! PID file I/O
//! The file holds exactly one integer: the controller's process id

use crate::domain::{PreforkError, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// What was found at the pid file location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidFileContent {
    Missing,
    Pid(u32),
    /// File exists but does not hold a positive integer
    Invalid,
}

#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn read(&self) -> Result<PidFileContent> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PidFileContent::Missing),
            Err(e) => {
                return Err(PreforkError::PidFile {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        match content.trim().parse::<u32>() {
            Ok(pid) if pid > 0 => Ok(PidFileContent::Pid(pid)),
            _ => Ok(PidFileContent::Invalid),
        }
    }

    /// Write `pid`, replacing any previous content
    pub fn write(&self, pid: u32) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| PreforkError::PidFile {
                path: self.path.clone(),
                source: e,
            })?;

        write!(file, "{}", pid).map_err(|e| PreforkError::PidFile {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }

    /// Remove the file. Returns false if it was already gone.
    pub fn remove(&self) -> std::io::Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
