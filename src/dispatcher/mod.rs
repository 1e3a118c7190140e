//! Event dispatcher: classifies inbound events and routes them.

pub mod engine;
pub mod event;

pub use engine::{EventDispatcher, Routed};
pub use event::Event;

#[cfg(test)]
mod tests;
