/// Structured trace of what the dashboard core did, in order.
///
/// Every event carries a monotonically increasing sequence number so tests and
/// debug views can reason about ordering without wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub seq: u64,
    pub kind: EventKind,
    pub message: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A fetch was handed out for a key.
    Request,
    /// A response was applied to visible state.
    Deliver,
    /// A response arrived for an input that is no longer current.
    Drop,
    /// The selected profile changed.
    Selection,
    /// A fetch failed.
    Failure,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Request => "request",
            EventKind::Deliver => "deliver",
            EventKind::Drop => "drop",
            EventKind::Selection => "selection",
            EventKind::Failure => "failure",
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_seq: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, kind: EventKind, message: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            seq,
            kind,
            message: message.into(),
        });
        seq
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Removes and returns buffered events. Sequence numbers keep counting.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
