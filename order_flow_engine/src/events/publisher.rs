use std::sync::Arc;

use log::*;

use crate::{
    db_types::{Order, OrderItem},
    events::{
        channel::TopicChannel,
        event_types::{EventKind, OrderLifecycleEvent},
    },
};

/// Converts a persisted order into a lifecycle event and routes it on the topic channel.
///
/// Publishing happens strictly after the triggering operation's commit. A publish problem is logged and absorbed;
/// it never fails or rolls back the already-committed order write.
#[derive(Clone)]
pub struct EventPublisher {
    channel: Arc<TopicChannel<OrderLifecycleEvent>>,
}

impl EventPublisher {
    pub fn new(channel: Arc<TopicChannel<OrderLifecycleEvent>>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &Arc<TopicChannel<OrderLifecycleEvent>> {
        &self.channel
    }

    pub async fn publish(&self, kind: EventKind, order: &Order, items: &[OrderItem]) {
        let event = OrderLifecycleEvent::new(kind, order, items);
        let key = kind.routing_key();
        info!("📬️ Publishing {} event for order #{} on [{key}]", kind.wire_name(), order.id);
        let delivered = self.channel.publish(key, event).await;
        if delivered == 0 {
            // Nobody is listening right now. The order write stands regardless.
            warn!("📬️ {} event for order #{} reached no subscribers", kind.wire_name(), order.id);
        }
    }
}
