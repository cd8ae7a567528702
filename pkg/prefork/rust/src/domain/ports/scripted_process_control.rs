// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Scripted ProcessControl implementation for unit tests
//! Never forks: every fork hands out a fake pid on the parent side

use super::{ExitKind, ForkOutcome, ProcessControl, ReapStatus};
use crate::domain::{PreforkError, Result, StopFlag};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};

pub struct ScriptedProcessControl {
    next_pid: Cell<u32>,
    own_pid: u32,
    alive: RefCell<BTreeSet<u32>>,
    max_alive: Cell<usize>,
    forks: Cell<usize>,
    fork_failures: Cell<usize>,
    reap_script: RefCell<VecDeque<ReapStatus>>,
    reap_error: Cell<bool>,
    terminated: RefCell<Vec<u32>>,
    titles: RefCell<Vec<String>>,
    detach_outcome: Cell<ForkOutcome>,
    detach_error: Cell<bool>,
    watched: RefCell<Option<StopFlag>>,
    held: Cell<bool>,
    // None: raise whatever flag is being watched
    stop_after_idle: RefCell<Option<(usize, Option<StopFlag>)>>,
}

impl ScriptedProcessControl {
    pub fn new() -> Self {
        Self {
            next_pid: Cell::new(1000),
            own_pid: 900,
            alive: RefCell::new(BTreeSet::new()),
            max_alive: Cell::new(0),
            forks: Cell::new(0),
            fork_failures: Cell::new(0),
            reap_script: RefCell::new(VecDeque::new()),
            reap_error: Cell::new(false),
            terminated: RefCell::new(Vec::new()),
            titles: RefCell::new(Vec::new()),
            detach_outcome: Cell::new(ForkOutcome::Parent { child: 900 }),
            detach_error: Cell::new(false),
            watched: RefCell::new(None),
            held: Cell::new(false),
            stop_after_idle: RefCell::new(None),
        }
    }

    /// Mark an unrelated pid as alive for liveness probes
    pub fn with_live_pid(self, pid: u32) -> Self {
        self.alive.borrow_mut().insert(pid);
        self
    }

    /// Fail the next `count` forks
    pub fn fail_forks(&self, count: usize) {
        self.fork_failures.set(count);
    }

    /// Fail the next reap call with an error
    pub fn fail_next_reap(&self) {
        self.reap_error.set(true);
    }

    pub fn push_reap(&self, status: ReapStatus) {
        self.reap_script.borrow_mut().push_back(status);
    }

    /// Simulate a worker dying on its own
    pub fn kill_child(&self, pid: u32) {
        self.push_reap(ReapStatus::Reaped {
            pid,
            exit: ExitKind::Signaled(libc::SIGKILL),
        });
    }

    pub fn set_detach_error(&self) {
        self.detach_error.set(true);
    }

    /// Make detach land on the background side
    pub fn detach_as_child(&self) {
        self.detach_outcome.set(ForkOutcome::Child);
    }

    /// Raise `flag` after `iterations` reap rounds that found nothing to collect
    pub fn stop_after_idle_reaps(&self, iterations: usize, flag: StopFlag) {
        *self.stop_after_idle.borrow_mut() = Some((iterations, Some(flag)));
    }

    /// Deliver termination to the watched flag after `iterations` idle reap rounds
    pub fn terminate_after_idle_reaps(&self, iterations: usize) {
        *self.stop_after_idle.borrow_mut() = Some((iterations, None));
    }

    pub fn forks(&self) -> usize {
        self.forks.get()
    }

    pub fn max_alive(&self) -> usize {
        self.max_alive.get()
    }

    pub fn alive_children(&self) -> Vec<u32> {
        self.alive
            .borrow()
            .iter()
            .copied()
            .filter(|pid| *pid >= 1000)
            .collect()
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.borrow().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.titles.borrow().clone()
    }

    /// Deliver the termination signal to whatever flag is being watched
    pub fn deliver_termination(&self) {
        if let Some(flag) = self.watched.borrow().as_ref() {
            flag.raise();
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    fn count_idle_round(&self) {
        let mut guard = self.stop_after_idle.borrow_mut();
        let Some((remaining, _)) = guard.as_mut() else {
            return;
        };
        if *remaining > 1 {
            *remaining -= 1;
            return;
        }
        match guard.take() {
            Some((_, Some(flag))) => {
                flag.raise();
            }
            _ => self.deliver_termination(),
        }
    }
}

impl ProcessControl for ScriptedProcessControl {
    fn fork(&self) -> Result<ForkOutcome> {
        if self.fork_failures.get() > 0 {
            self.fork_failures.set(self.fork_failures.get() - 1);
            return Err(PreforkError::Fork("EAGAIN: scripted failure".to_string()));
        }

        let pid = self.next_pid.get();
        self.next_pid.set(pid + 1);
        self.forks.set(self.forks.get() + 1);

        let mut alive = self.alive.borrow_mut();
        alive.insert(pid);
        let children = alive.iter().filter(|p| **p >= 1000).count();
        if children > self.max_alive.get() {
            self.max_alive.set(children);
        }

        Ok(ForkOutcome::Parent { child: pid })
    }

    fn detach(&self) -> Result<ForkOutcome> {
        if self.detach_error.get() {
            return Err(PreforkError::Detach("setsid: EPERM".to_string()));
        }
        Ok(self.detach_outcome.get())
    }

    fn reap(&self) -> Result<ReapStatus> {
        if self.reap_error.replace(false) {
            return Err(PreforkError::Reap("EINTR: scripted failure".to_string()));
        }

        let next = self.reap_script.borrow_mut().pop_front();
        match next {
            Some(ReapStatus::Reaped { pid, exit }) => {
                self.alive.borrow_mut().remove(&pid);
                Ok(ReapStatus::Reaped { pid, exit })
            }
            Some(ReapStatus::NoChildren) => {
                self.alive.borrow_mut().retain(|p| *p < 1000);
                self.count_idle_round();
                Ok(ReapStatus::NoChildren)
            }
            Some(ReapStatus::NoneReady) | None => {
                self.count_idle_round();
                Ok(ReapStatus::NoneReady)
            }
        }
    }

    fn terminate(&self, pid: u32) -> Result<()> {
        self.terminated.borrow_mut().push(pid);
        if self.alive.borrow().contains(&pid) {
            self.push_reap(ReapStatus::Reaped {
                pid,
                exit: ExitKind::Exited(0),
            });
            Ok(())
        } else {
            Err(PreforkError::Signal {
                pid,
                reason: "ESRCH".to_string(),
            })
        }
    }

    fn watch_termination(&self, flag: &StopFlag) -> Result<()> {
        *self.watched.borrow_mut() = Some(flag.clone());
        Ok(())
    }

    fn hold_termination(&self, held: bool) -> Result<()> {
        self.held.set(held);
        Ok(())
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.alive.borrow().contains(&pid)
    }

    fn current_pid(&self) -> u32 {
        self.own_pid
    }

    fn set_title(&self, title: &str) {
        self.titles.borrow_mut().push(title.to_string());
    }

    fn exit(&self, code: i32) -> ! {
        panic!("scripted process asked to exit with {}", code);
    }
}
