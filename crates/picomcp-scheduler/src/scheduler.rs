use picomcp_core::{reached, SharedClock};
use serde::Serialize;
use thiserror::Error;

type TaskCallback = Box<dyn FnMut(&mut SchedulerCtl) + Send>;

/// Errors returned when installing a scheduled task.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The task table is at capacity.
    #[error("scheduler is full")]
    Full,
    /// An active task already carries this name.
    #[error("scheduled task {0:?} already exists")]
    DuplicateName(String),
}

struct ScheduledTask {
    name: String,
    callback: TaskCallback,
    /// 0 means one-shot.
    interval_ms: u32,
    next_run_ms: u32,
    last_run_ms: u32,
    exec_count: u32,
    /// 0 means unlimited.
    max_executions: u32,
    paused: bool,
    one_shot: bool,
    active: bool,
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStats {
    pub task_count: usize,
    pub capacity: usize,
    pub total_runs: u64,
    pub dropped_staged: u64,
}

enum StagedOp {
    Install {
        name: String,
        callback: TaskCallback,
        interval_ms: u32,
        next_run_ms: Option<u32>,
        max_executions: u32,
        one_shot: bool,
    },
    Cancel {
        name: String,
    },
}

/// Staging handle passed to scheduled callbacks.
///
/// Operations requested through it are applied after the current pass
/// completes, never mid-iteration.
pub struct SchedulerCtl {
    ops: Vec<StagedOp>,
}

impl SchedulerCtl {
    fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Requests a repeating task starting on the next pass.
    pub fn every<F>(&mut self, name: &str, interval_ms: u32, callback: F)
    where
        F: FnMut(&mut SchedulerCtl) + Send + 'static,
    {
        self.ops.push(StagedOp::Install {
            name: name.to_string(),
            callback: Box::new(callback),
            interval_ms,
            next_run_ms: None,
            max_executions: 0,
            one_shot: false,
        });
    }

    /// Requests a one-shot task at an absolute deadline.
    pub fn at<F>(&mut self, name: &str, deadline_ms: u32, callback: F)
    where
        F: FnMut(&mut SchedulerCtl) + Send + 'static,
    {
        self.ops.push(StagedOp::Install {
            name: name.to_string(),
            callback: Box::new(callback),
            interval_ms: 0,
            next_run_ms: Some(deadline_ms),
            max_executions: 0,
            one_shot: true,
        });
    }

    /// Requests cancellation of every task with this name.
    pub fn cancel(&mut self, name: &str) {
        self.ops.push(StagedOp::Cancel {
            name: name.to_string(),
        });
    }
}

/// Fixed-capacity cooperative scheduler.
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
    capacity: usize,
    clock: SharedClock,
    total_runs: u64,
    dropped_staged: u64,
}

impl Scheduler {
    /// Creates a scheduler holding at most `capacity` tasks.
    pub fn new(capacity: usize, clock: SharedClock) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            clock,
            total_runs: 0,
            dropped_staged: 0,
        }
    }

    /// Installs a repeater running every `interval_ms`, first due
    /// immediately.
    pub fn every<F>(&mut self, name: &str, interval_ms: u32, callback: F) -> Result<(), SchedulerError>
    where
        F: FnMut(&mut SchedulerCtl) + Send + 'static,
    {
        let now = self.clock.now_ms();
        self.install(name, Box::new(callback), interval_ms, now, 0, false)
    }

    /// Installs a one-shot firing at the absolute deadline.
    pub fn at<F>(&mut self, name: &str, deadline_ms: u32, callback: F) -> Result<(), SchedulerError>
    where
        F: FnMut(&mut SchedulerCtl) + Send + 'static,
    {
        self.install(name, Box::new(callback), 0, deadline_ms, 0, true)
    }

    /// Installs a repeater that stops after `count` executions.
    pub fn times<F>(
        &mut self,
        name: &str,
        interval_ms: u32,
        count: u32,
        callback: F,
    ) -> Result<(), SchedulerError>
    where
        F: FnMut(&mut SchedulerCtl) + Send + 'static,
    {
        let now = self.clock.now_ms();
        self.install(name, Box::new(callback), interval_ms, now, count.max(1), false)
    }

    fn install(
        &mut self,
        name: &str,
        callback: TaskCallback,
        interval_ms: u32,
        next_run_ms: u32,
        max_executions: u32,
        one_shot: bool,
    ) -> Result<(), SchedulerError> {
        if self.tasks.iter().any(|t| t.active && t.name == name) {
            return Err(SchedulerError::DuplicateName(name.to_string()));
        }
        if self.tasks.len() >= self.capacity {
            return Err(SchedulerError::Full);
        }
        self.tasks.push(ScheduledTask {
            name: name.to_string(),
            callback,
            interval_ms,
            next_run_ms,
            last_run_ms: 0,
            exec_count: 0,
            max_executions,
            paused: false,
            one_shot,
            active: true,
        });
        Ok(())
    }

    /// Runs every due task, in insertion order, then applies staged
    /// mutations and compacts finished tasks out of the table.
    ///
    /// Returns the number of callbacks invoked. A due interval task is
    /// rescheduled from the current tick (`next = now + interval`), so
    /// missed intervals are absorbed, not replayed.
    pub fn run_pending(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut ctl = SchedulerCtl::new();
        let mut executed = 0;

        for index in 0..self.tasks.len() {
            let task = &mut self.tasks[index];
            if !task.active || task.paused || !reached(now, task.next_run_ms) {
                continue;
            }
            (task.callback)(&mut ctl);
            executed += 1;
            task.exec_count += 1;
            task.last_run_ms = now;
            task.next_run_ms = now.wrapping_add(task.interval_ms);
            if task.one_shot || (task.max_executions > 0 && task.exec_count >= task.max_executions)
            {
                task.active = false;
            }
        }
        self.total_runs += executed as u64;

        self.apply_staged(ctl);
        self.tasks.retain(|t| t.active);
        executed
    }

    fn apply_staged(&mut self, ctl: SchedulerCtl) {
        for op in ctl.ops {
            match op {
                StagedOp::Install {
                    name,
                    callback,
                    interval_ms,
                    next_run_ms,
                    max_executions,
                    one_shot,
                } => {
                    let due = next_run_ms.unwrap_or_else(|| self.clock.now_ms());
                    if self
                        .install(&name, callback, interval_ms, due, max_executions, one_shot)
                        .is_err()
                    {
                        self.dropped_staged += 1;
                        #[cfg(feature = "tracing")]
                        tracing::warn!(task = %name, "dropped staged scheduler install");
                    }
                }
                StagedOp::Cancel { name } => {
                    self.cancel(&name);
                }
            }
        }
    }

    /// Pauses the named task. Returns false if absent.
    pub fn pause(&mut self, name: &str) -> bool {
        match self.tasks.iter_mut().find(|t| t.active && t.name == name) {
            Some(task) => {
                task.paused = true;
                true
            }
            None => false,
        }
    }

    /// Resumes the named task, rescheduling it from the current tick.
    pub fn resume(&mut self, name: &str) -> bool {
        let now = self.clock.now_ms();
        match self.tasks.iter_mut().find(|t| t.active && t.name == name) {
            Some(task) => {
                task.paused = false;
                task.next_run_ms = now.wrapping_add(task.interval_ms);
                true
            }
            None => false,
        }
    }

    /// Cancels the named task. Returns false if absent.
    pub fn cancel(&mut self, name: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.name != name);
        self.tasks.len() != before
    }

    /// Executions recorded for the named task, if present.
    pub fn exec_count(&self, name: &str) -> Option<u32> {
        self.tasks
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.exec_count)
    }

    /// Tick at which the named task last ran, if present.
    pub fn last_run_ms(&self, name: &str) -> Option<u32> {
        self.tasks
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.last_run_ms)
    }

    /// Number of installed tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true when no tasks are installed.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns a snapshot of the scheduler.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            task_count: self.tasks.len(),
            capacity: self.capacity,
            total_runs: self.total_runs,
            dropped_staged: self.dropped_staged,
        }
    }
}
