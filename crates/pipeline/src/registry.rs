//! In-memory registry of tasks awaiting a result.
//!
//! Both completion paths resolve a task through
//! [`JobRegistry::take_if_present`]: a single locked remove, so whichever
//! path gets there first owns the delivery and every later signal sees
//! nothing. The lock is a plain [`std::sync::Mutex`] and is never held
//! across an `.await`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use melody_core::error::CoreError;
use melody_core::job::JobParams;
use melody_core::types::{ConversationRef, TaskId, Timestamp};

use crate::watchdog::WatchdogHandle;

/// How many resolved task ids are remembered for stale-signal reporting.
const RESOLVED_HISTORY: usize = 256;

/// A submitted task whose result has not been delivered yet.
#[derive(Debug)]
pub struct PendingTask {
    pub conversation: ConversationRef,
    pub params: JobParams,
    /// Poll timer; attached right after registration.
    pub watchdog: Option<WatchdogHandle>,
    pub registered_at: Timestamp,
}

impl PendingTask {
    /// Cancel the poll timer, if one is attached.
    pub fn cancel_watchdog(&self) {
        if let Some(watchdog) = &self.watchdog {
            watchdog.cancel();
        }
    }
}

#[derive(Default)]
struct Inner {
    pending: HashMap<TaskId, PendingTask>,
    /// Recently resolved ids, oldest first; mirrored in `resolved_set`.
    resolved: VecDeque<TaskId>,
    resolved_set: HashSet<TaskId>,
}

impl Inner {
    fn remember_resolved(&mut self, task_id: &str) {
        if self.resolved_set.insert(task_id.to_string()) {
            self.resolved.push_back(task_id.to_string());
            if self.resolved.len() > RESOLVED_HISTORY {
                if let Some(oldest) = self.resolved.pop_front() {
                    self.resolved_set.remove(&oldest);
                }
            }
        }
    }
}

/// Table of pending tasks keyed by task id.
#[derive(Default)]
pub struct JobRegistry {
    inner: Mutex<Inner>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly submitted task. An existing entry is never
    /// overwritten.
    pub fn register(
        &self,
        task_id: &str,
        conversation: ConversationRef,
        params: JobParams,
    ) -> Result<(), CoreError> {
        let mut inner = self.lock();
        if inner.pending.contains_key(task_id) {
            return Err(CoreError::Conflict(format!(
                "task {task_id} is already registered"
            )));
        }
        inner.pending.insert(
            task_id.to_string(),
            PendingTask {
                conversation,
                params,
                watchdog: None,
                registered_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Attach the poll timer to an entry.
    ///
    /// If the entry is already gone (a fast push won), the handle is
    /// cancelled and `false` is returned.
    pub fn attach_watchdog(&self, task_id: &str, handle: WatchdogHandle) -> bool {
        let orphan = {
            let mut inner = self.lock();
            match inner.pending.get_mut(task_id) {
                Some(task) => {
                    if let Some(previous) = task.watchdog.replace(handle) {
                        previous.cancel();
                    }
                    None
                }
                None => Some(handle),
            }
        };

        match orphan {
            Some(handle) => {
                handle.cancel();
                false
            }
            None => true,
        }
    }

    /// Atomically remove and return a task.
    ///
    /// Returns `None` when another path already took it or it was never
    /// registered.
    pub fn take_if_present(&self, task_id: &str) -> Option<PendingTask> {
        let mut inner = self.lock();
        let task = inner.pending.remove(task_id)?;
        inner.remember_resolved(task_id);
        Some(task)
    }

    /// Read-only view of a pending task.
    pub fn snapshot(&self, task_id: &str) -> Option<(ConversationRef, JobParams)> {
        self.lock()
            .pending
            .get(task_id)
            .map(|task| (task.conversation, task.params.clone()))
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.lock().pending.contains_key(task_id)
    }

    /// Whether the task was resolved recently (as opposed to never known).
    pub fn was_resolved(&self, task_id: &str) -> bool {
        self.lock().resolved_set.contains(task_id)
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// Remove every pending task, cancelling their timers.
    pub fn drain(&self) -> Vec<(TaskId, PendingTask)> {
        let drained: Vec<_> = self.lock().pending.drain().collect();
        for (_, task) in &drained {
            task.cancel_watchdog();
        }
        drained
    }

    // A panic while holding the lock cannot leave the map half-updated,
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
