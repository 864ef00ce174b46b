// all nodes are dense indices into the graph so they can index per-node vectors directly
pub type NodeId = usize;

/// Discrete simulation step. Round 0 is the seeding round.
pub type Round = usize;

/// Number of times a node has been called so far.
pub type CallCount = u32;

/// One row of the call history: the call count of every node after a round.
pub type Snapshot = Vec<CallCount>;

// ============================================================================
// Event Logging
// ============================================================================

/// Events emitted by the simulator while it runs
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A caller placed a call to one of its neighbors
    CallPlaced { caller: NodeId, callee: NodeId },
    /// A round finished
    RoundCompleted {
        callers: usize,
        reached: usize,
        newly_reached: usize,
    },
    /// Reach stopped growing; `rounds` is the number of history rows kept
    Terminated { reached: usize, rounds: usize },
}

/// Receives simulation events; the round is passed alongside the event
pub trait EventSink {
    fn log(&mut self, round: Round, event: Event);
}

/// No-op event sink (zero overhead)
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn log(&mut self, _round: Round, _event: Event) {}
}

/// Collects every event in memory. Mostly useful in tests and small runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<(Round, Event)>,
}

impl EventSink for RecordingSink {
    fn log(&mut self, round: Round, event: Event) {
        self.events.push((round, event));
    }
}
