//! Topic router: subscriptions and fan-out on top of the connection registry.

pub mod engine;
pub mod topic;

pub use engine::{DeliveryReport, SharedRouter, TopicRouter, lock};
