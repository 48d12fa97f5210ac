use crate::scheduler::Scheduler;

/// Per-instance memory for a deferred effect keyed on its dependencies.
///
/// The effect is scheduled on the first call and on every call whose `deps`
/// differ from the previous call; it runs on the next `Scheduler::flush`.
#[derive(Debug, Default)]
pub struct EffectSlot<D> {
    deps: Option<D>,
}

impl<D: PartialEq + Clone> EffectSlot<D> {
    pub fn new() -> Self {
        Self { deps: None }
    }

    /// Returns `true` if the effect was scheduled.
    pub fn schedule_if_changed(
        &mut self,
        deps: &D,
        scheduler: &mut Scheduler,
        label: &'static str,
        effect: impl FnOnce() + 'static,
    ) -> bool {
        if self.deps.as_ref() == Some(deps) {
            return false;
        }
        self.deps = Some(deps.clone());
        scheduler.enqueue(label, effect);
        true
    }

    pub fn deps(&self) -> Option<&D> {
        self.deps.as_ref()
    }
}
