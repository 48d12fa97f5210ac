use std::fmt;

/// A deferred unit of work queued on the [`Scheduler`](crate::Scheduler).
///
/// Jobs run once, in the order they were queued.
pub struct Job {
    pub label: &'static str,
    run: Box<dyn FnOnce()>,
}

impl Job {
    pub fn new(label: &'static str, run: impl FnOnce() + 'static) -> Self {
        Self {
            label,
            run: Box::new(run),
        }
    }

    pub(crate) fn run(self) {
        (self.run)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("label", &self.label).finish()
    }
}
