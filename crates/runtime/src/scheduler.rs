use std::collections::VecDeque;

use tracing::trace;

use crate::event_bus::{EventBus, EventKind};
use crate::frame::Frame;
use crate::job::Job;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FlushSummary {
    pub frame: Frame,
    pub ran_jobs: usize,
}

/// Deferred-effect queue.
///
/// Renders enqueue effects; `flush` runs them in FIFO order and closes the
/// current frame. Writes performed by effects notify cell listeners
/// synchronously, so anything they dirty is visible to the next render pass.
#[derive(Debug, Default)]
pub struct Scheduler {
    frame: Frame,
    jobs: VecDeque<Job>,
    bus: EventBus,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, label: &'static str, run: impl FnOnce() + 'static) {
        self.jobs.push_back(Job::new(label, run));
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Records a trace event in the current frame.
    pub fn emit(&mut self, kind: EventKind, message: impl Into<String>) {
        self.bus.emit(self.frame, kind, message);
    }

    /// Runs every queued job in insertion order, then advances the frame.
    pub fn flush(&mut self) -> FlushSummary {
        let frame = self.frame;
        let mut ran = 0usize;
        while let Some(job) = self.jobs.pop_front() {
            trace!(frame = frame.index, job = job.label, "run effect");
            self.bus.emit(frame, EventKind::Effect, job.label);
            job.run();
            ran += 1;
        }
        self.frame = frame.next();
        FlushSummary {
            frame,
            ran_jobs: ran,
        }
    }
}
