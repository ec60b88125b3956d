//! Event channel between the store owner and the presentation context.
//!
//! # Responsibility
//! - Queue notification batches produced by store mutations.
//! - Run subscriber handlers only when the consumer drains the pump.
//!
//! # Invariants
//! - Handlers never run inside `Outbox::publish`.
//! - A batch reaches each subscriber bound at publish time at most once, and
//!   only if that subscriber was not replaced or removed before dispatch.

use crate::store::event::StoreNotification;
use crate::store::subscribers::{BoundHandler, Subscriptions};
use log::{debug, info};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

struct Batch {
    notification: StoreNotification,
    recipients: Vec<BoundHandler>,
}

/// Producer side, owned by `HabitStore`.
pub(crate) struct Outbox {
    sender: Sender<Batch>,
    subscriptions: Subscriptions,
}

impl Outbox {
    pub(crate) fn publish(&self, notification: StoreNotification) {
        let recipients = self.subscriptions.bind_current();
        if recipients.is_empty() {
            debug!("event=notify_enqueue module=store status=skip reason=no_subscribers");
            return;
        }
        if self
            .sender
            .send(Batch {
                notification,
                recipients,
            })
            .is_err()
        {
            debug!("event=notify_enqueue module=store status=skip reason=pump_dropped");
        }
    }
}

/// Consumer side, drained on the presentation context.
pub struct EventPump {
    receiver: Receiver<Batch>,
    subscriptions: Subscriptions,
}

impl EventPump {
    /// Delivers every queued batch. Returns the number of handler calls.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        while let Ok(batch) = self.receiver.try_recv() {
            delivered += self.deliver(&batch);
        }
        delivered
    }

    /// Waits up to `timeout` for one batch, delivers it and everything
    /// queued behind it. Returns the number of handler calls.
    pub fn wait_and_dispatch(&self, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(batch) => self.deliver(&batch) + self.dispatch_pending(),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    fn deliver(&self, batch: &Batch) -> usize {
        let mut delivered = 0;
        for recipient in &batch.recipients {
            if !self.subscriptions.is_still_registered(recipient) {
                debug!(
                    "event=notify_dispatch module=store status=skip reason=unsubscribed subscriber={}",
                    recipient.subscriber_id
                );
                continue;
            }
            recipient.call(&batch.notification);
            delivered += 1;
        }
        info!(
            "event=notify_dispatch module=store status=ok kind={} recipients={}",
            notification_kind(&batch.notification),
            delivered
        );
        delivered
    }
}

pub(crate) fn channel(subscriptions: Subscriptions) -> (Outbox, EventPump) {
    let (sender, receiver) = mpsc::channel();
    (
        Outbox {
            sender,
            subscriptions: subscriptions.clone(),
        },
        EventPump {
            receiver,
            subscriptions,
        },
    )
}

fn notification_kind(notification: &StoreNotification) -> &'static str {
    match notification {
        StoreNotification::Changes(_) => "changes",
        StoreNotification::WriteFailed { .. } => "write_failed",
    }
}
