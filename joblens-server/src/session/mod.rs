//! Per-identity session state: registry and log broadcast bus

pub mod bus;
pub mod registry;

pub use bus::{LogBus, SubscriberGuard};
pub use registry::{Session, SessionRegistry};
