//! Lifecycle events and the topic channel they travel on.
//!
//! Every state-affecting operation emits one [`OrderLifecycleEvent`] after its write commits. Events are routed by
//! key (`order.event.<placed|cancelled|status.updated|rated>`) over an in-process topic channel; consumers bind by
//! exact key or wildcard and the publisher knows nothing about them.

mod channel;
mod event_types;
mod publisher;

pub use channel::{pattern_matches, TopicChannel};
pub use event_types::{
    EventKind,
    LifecycleEventItem,
    OrderLifecycleEvent,
    ROUTING_KEY_ALL,
    ROUTING_KEY_CANCELLED,
    ROUTING_KEY_PLACED,
    ROUTING_KEY_RATED,
    ROUTING_KEY_STATUS_UPDATED,
};
pub use publisher::EventPublisher;
