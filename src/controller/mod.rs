// Orchestration between observers, the interpreter and the bus

mod event_log;
mod orchestrator;

pub use event_log::{EventLog, LogEntry};
pub use orchestrator::Controller;

#[cfg(test)]
mod tests;
