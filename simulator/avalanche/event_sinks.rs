//! Console output for simulation events

use ta_rust::{Event, EventSink, Round};

/// Prints every event as one aligned line
pub struct ConsoleEventSink {
    enabled: bool,
}

impl ConsoleEventSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl EventSink for ConsoleEventSink {
    fn log(&mut self, round: Round, event: Event) {
        if !self.enabled {
            return;
        }

        // Format: round event_type event_details
        match event {
            Event::CallPlaced { caller, callee } => {
                println!("{:>5} CallPlaced       {:>6} -> {:<6}", round, caller, callee);
            }
            Event::RoundCompleted {
                callers,
                reached,
                newly_reached,
            } => {
                println!(
                    "{:>5} RoundCompleted   callers:{} reached:{} new:{}",
                    round, callers, reached, newly_reached
                );
            }
            Event::Terminated { reached, rounds } => {
                println!(
                    "{:>5} Terminated       reached:{} rounds:{}",
                    round, reached, rounds
                );
            }
        }
    }
}
