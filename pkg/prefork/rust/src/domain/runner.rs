// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Runners and the ordered runner registry
//!
//! A runner is one named unit of repeated work. Every worker invokes all
//! registered runners, in registration order, on every pass.

use crate::domain::ports::LoggerPort;
use crate::domain::StopFlag;
use std::fmt;
use std::sync::Arc;

/// Capability implemented by every unit of work.
///
/// `stop` is the worker's own cancellation token; long-running bodies should
/// poll [`StopFlag::is_stopped`] and return early once it is raised.
pub trait Runner: Send + Sync {
    fn invoke(&self, logger: &dyn LoggerPort, stop: &StopFlag) -> anyhow::Result<()>;
}

impl<F> Runner for F
where
    F: Fn(&dyn LoggerPort, &StopFlag) -> anyhow::Result<()> + Send + Sync,
{
    fn invoke(&self, logger: &dyn LoggerPort, stop: &StopFlag) -> anyhow::Result<()> {
        self(logger, stop)
    }
}

/// Name -> runner mapping that remembers first-seen order
#[derive(Clone, Default)]
pub struct RunnerRegistry {
    entries: Vec<(String, Arc<dyn Runner>)>,
}

impl RunnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a runner under `name`.
    ///
    /// A new name is appended; an existing name keeps its position and has
    /// its unit replaced.
    ///
    /// Blank names are dropped without any report. This is a deliberate
    /// extension: the registry otherwise only refuses units it cannot invoke.
    pub fn register(&mut self, name: impl Into<String>, runner: Arc<dyn Runner>) {
        let name = name.into();
        if name.trim().is_empty() {
            return;
        }

        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = runner,
            None => self.entries.push((name, runner)),
        }
    }

    pub fn register_all<I, S>(&mut self, runners: I)
    where
        I: IntoIterator<Item = (S, Arc<dyn Runner>)>,
        S: Into<String>,
    {
        for (name, runner) in runners {
            self.register(name, runner);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Runners in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Runner)> {
        self.entries
            .iter()
            .map(|(name, runner)| (name.as_str(), runner.as_ref()))
    }
}

impl fmt::Debug for RunnerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerRegistry")
            .field("runners", &self.names())
            .finish()
    }
}
