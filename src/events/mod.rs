//! Post-commit order notifications.
//!
//! Interested components register hooks before the server starts; the
//! conversion engine publishes an event after its transaction commits. Each
//! hook gets its own channel and its own spawned task per event, so a slow
//! or failing receiver can neither delay the response nor starve another
//! receiver. Publish failures are logged and swallowed — notification
//! delivery is best effort by design.

use std::{future::Future, pin::Pin, sync::Arc};

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, error};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Clone, Debug)]
pub struct OrderCreatedEvent {
    pub order_id: i32,
    pub profile_id: i32,
    pub total: Decimal,
}

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        //Drop the internal sender so the loop ends once every producer is
        //gone.
        drop(self.sender);
        while let Some(event) = self.listener.recv().await {
            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move {
                (handler)(event).await;
            });
        }
        debug!("Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("Failed to publish event: {e}");
        }
    }
}

#[derive(Clone, Default)]
pub struct EventHooks {
    pub on_order_created: Vec<Handler<OrderCreatedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_created.push(Arc::new(f));
        self
    }
}

pub struct EventHandlers {
    order_created: Vec<EventHandler<OrderCreatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let order_created = hooks
            .on_order_created
            .into_iter()
            .map(|f| EventHandler::new(buffer_size, f))
            .collect();
        Self { order_created }
    }

    pub fn producers(&self) -> EventProducers {
        EventProducers {
            order_created: self.order_created.iter().map(|h| h.subscribe()).collect(),
        }
    }

    pub async fn start_handlers(self) {
        for handler in self.order_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Clone, Default)]
pub struct EventProducers {
    pub order_created: Vec<EventProducer<OrderCreatedEvent>>,
}

impl EventProducers {
    /// Fans the event out to every registered receiver, one at a time.
    /// Failures are isolated per receiver and never reach the caller.
    pub async fn publish_order_created(&self, event: OrderCreatedEvent) {
        for producer in &self.order_created {
            producer.publish_event(event.clone()).await;
        }
    }
}
