//! Periodic price checks over every subscription.

mod gate;
mod orchestrator;

pub use orchestrator::{CycleReport, Orchestrator};
