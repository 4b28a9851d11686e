//! Events - 状态订阅总线

mod state_publisher;

pub use state_publisher::{StateListener, StatePublisher, Subscription};
