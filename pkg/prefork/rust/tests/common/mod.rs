// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Shared utilities for the E2E tests
//!
//! Every test gets its own temporary directory holding the pid file, the log
//! file and the runners' trace file, and drives the real `dd-preforkd`
//! binary through environment variables.
//!
//! Process inspection reads `/proc`, so these helpers are Linux only. Zombies
//! count as dead: the detached controller is re-parented and may linger
//! unreaped in minimal containers.
//!
//! `DaemonGuard` kills whatever is left of the daemon on drop and, when the
//! test is failing, prints the tail of the daemon log.

#![allow(dead_code)]

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const DAEMON_NAME: &str = "e2e-prefork";
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// RAII guard around one daemon instance
#[must_use = "DaemonGuard must be held for the duration of the test"]
pub struct DaemonGuard {
    dir: TempDir,
    name: String,
    env: Vec<(String, String)>,
}

impl DaemonGuard {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
            name: DAEMON_NAME.to_string(),
            env: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn pid_file(&self) -> PathBuf {
        self.dir.path().join("daemon.pid")
    }

    pub fn log_file(&self) -> PathBuf {
        self.dir.path().join("daemon.log")
    }

    pub fn trace_file(&self) -> PathBuf {
        self.dir.path().join("trace.log")
    }

    /// Run `dd-preforkd` and wait for the invoking process to exit
    pub fn start(&self, workers: usize) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dd-preforkd"));
        cmd.env_remove("RUST_LOG")
            .env("DD_PREFORK_NAME", &self.name)
            .env("DD_PREFORK_PID_FILE", self.pid_file())
            .env("DD_PREFORK_LOG_FILE", self.log_file())
            .env("DD_PREFORK_TRACE_FILE", self.trace_file())
            .env("DD_PREFORK_WORKERS", workers.to_string())
            .env("DD_PREFORK_REAP_INTERVAL_MS", "10");
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd.output().expect("run dd-preforkd")
    }

    /// Start and return the controller pid announced on stdout
    pub fn start_detached(&self, workers: usize) -> u32 {
        let output = self.start(workers);
        assert!(
            output.status.success(),
            "dd-preforkd failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let pid = announced_pid(&String::from_utf8_lossy(&output.stdout))
            .expect("started-with-pid line on stdout");
        assert!(
            wait_for(WAIT_TIMEOUT, || self.read_pid() == Some(pid)),
            "controller {} never wrote its pid file",
            pid
        );
        pid
    }

    pub fn read_pid(&self) -> Option<u32> {
        fs::read_to_string(self.pid_file())
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }

    pub fn log_contents(&self) -> String {
        fs::read_to_string(self.log_file()).unwrap_or_default()
    }

    pub fn trace_lines(&self) -> Vec<(u32, String)> {
        fs::read_to_string(self.trace_file())
            .unwrap_or_default()
            .lines()
            .filter_map(|line| {
                let (pid, runner) = line.split_once(' ')?;
                Some((pid.parse().ok()?, runner.to_string()))
            })
            .collect()
    }

    /// SIGTERM the controller and wait until it and its workers are gone
    pub fn stop(&self, controller: u32) -> bool {
        let workers = children_of(controller);
        send(controller, Signal::SIGTERM);
        wait_for(WAIT_TIMEOUT, || {
            !is_running(controller) && workers.iter().all(|pid| !is_running(*pid))
        })
    }
}

impl Drop for DaemonGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            let log = self.log_contents();
            let lines: Vec<&str> = log.lines().collect();
            let start = lines.len().saturating_sub(50);
            eprintln!("\n========== DAEMON LOG (Test Failed) ==========");
            for line in &lines[start..] {
                eprintln!("{}", line);
            }
            eprintln!("===============================================\n");
        }

        if let Some(pid) = self.read_pid() {
            if is_running(pid) && pid != std::process::id() {
                for worker in children_of(pid) {
                    send(worker, Signal::SIGKILL);
                }
                send(pid, Signal::SIGKILL);
            }
        }
    }
}

/// Parse `"<name> started with pid <pid>"`
pub fn announced_pid(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .find(|line| line.contains("started with pid"))?
        .rsplit(' ')
        .next()?
        .trim()
        .parse()
        .ok()
}

pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(POLL_INTERVAL);
    }
    condition()
}

pub fn send(pid: u32, signal: Signal) {
    let _ = kill(Pid::from_raw(pid as i32), signal);
}

/// `(state, ppid)` from `/proc/<pid>/stat`
fn stat(pid: u32) -> Option<(char, u32)> {
    let raw = fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    // comm may contain spaces and parentheses; fields resume after the last ')'
    let rest = &raw[raw.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    let state = fields.next()?.chars().next()?;
    let ppid = fields.next()?.parse().ok()?;
    Some((state, ppid))
}

pub fn is_running(pid: u32) -> bool {
    matches!(stat(pid), Some((state, _)) if state != 'Z' && state != 'X')
}

/// Live (non-zombie) children of `parent`
pub fn children_of(parent: u32) -> Vec<u32> {
    let Ok(entries) = fs::read_dir("/proc") else {
        return Vec::new();
    };
    let mut children: Vec<u32> = entries
        .filter_map(|entry| entry.ok()?.file_name().to_str()?.parse::<u32>().ok())
        .filter(|pid| {
            matches!(stat(*pid), Some((state, ppid)) if ppid == parent && state != 'Z' && state != 'X')
        })
        .collect();
    children.sort_unstable();
    children
}
