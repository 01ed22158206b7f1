//! Deferred work queues.
//!
//! The graph never runs deferred work itself. When it needs a flush it asks its [Scheduler] to
//! arrange one; the owner then calls [crate::graph::Graph::run_queue] (or
//! [crate::graph::Graph::flush]) on the same thread before the next observable read.

use enumset::{EnumSet, EnumSetType};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Named deferred queues. Declaration order is run order: coalesce before sync.
#[derive(Debug, Hash, EnumSetType, Serialize, Deserialize)]
pub enum FlushQueue {
    /// Remote pushes, applied as one transaction.
    Coalesce,
    /// Local reconciliation of collection edges touched by remote writes.
    Sync,
}

impl fmt::Display for FlushQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushQueue::Coalesce => write!(f, "coalesce"),
            FlushQueue::Sync => write!(f, "sync"),
        }
    }
}

pub type FlushQueueSet = EnumSet<FlushQueue>;

/// The scheduling contract the graph consumes.
pub trait Scheduler: Send + Sync {
    /// Request exactly one run of `queue`. The graph never asks twice for a queue that has not run
    /// since the last request.
    fn schedule(&self, queue: FlushQueue);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullScheduler;

impl Scheduler for NullScheduler {
    fn schedule(&self, _queue: FlushQueue) {}
}

/// Records requests so the owner can drain them at a turn boundary.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler(Arc<Mutex<Vec<FlushQueue>>>);

impl ManualScheduler {
    pub fn new() -> Self {
        ManualScheduler::default()
    }

    pub fn requests(&self) -> Vec<FlushQueue> {
        self.0.lock().clone()
    }

    /// Drain outstanding requests in run order (coalesce before sync), each queue at most once.
    pub fn drain(&self) -> Vec<FlushQueue> {
        let requested: FlushQueueSet = self.0.lock().drain(..).collect();
        requested.iter().collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, queue: FlushQueue) {
        tracing::trace!("[ManualScheduler] {queue} requested");
        self.0.lock().push(queue);
    }
}
