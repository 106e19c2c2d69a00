/// Roll Drop core: grid action-queue movement and collision routing.
///
/// `domain` holds value types and pure rules (no world state).
/// `sim` owns the per-level session and the step functions that mutate it.
/// Presentation lives in the binary and talks to the core only through
/// `sim::step` and the `GameEvent` stream.

pub mod config;
pub mod domain;
pub mod sim;
