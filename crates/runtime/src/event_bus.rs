use crate::frame::Frame;

/// What a trace event records.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// An effect job ran during a flush.
    Effect,
    /// A view was rendered and produced output.
    Render,
    /// A view was rendered and produced nothing.
    Skip,
    /// A rendering widget reported a load.
    Load,
}

/// Structured trace of what the runtime did, tagged with the frame it happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub kind: EventKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, frame: Frame, kind: EventKind, message: impl Into<String>) {
        self.events.push(Event {
            frame_index: frame.index,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Messages of all events of `kind`, in emission order.
    pub fn messages(&self, kind: EventKind) -> Vec<&str> {
        self.events
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.message.as_str())
            .collect()
    }

}
