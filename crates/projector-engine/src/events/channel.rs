use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crossbeam_channel::{Receiver, Sender};

struct Subscriber<E> {
    id: u64,
    sender: Sender<E>,
}

struct Subscribers<E> {
    next_id: u64,
    entries: Vec<Subscriber<E>>,
}

/// Single-threaded fan-out channel.
///
/// Every live subscription receives a clone of each published event, queued until
/// the subscriber drains it. Publishing never blocks.
pub struct EventChannel<E> {
    subscribers: Rc<RefCell<Subscribers<E>>>,
}

impl<E: Clone> EventChannel<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Subscribers {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers a new subscriber. Events published before this call are not seen.
    pub fn subscribe(&self) -> Subscription<E> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut subs = self.subscribers.borrow_mut();
        let id = subs.next_id;
        subs.next_id += 1;
        subs.entries.push(Subscriber { id, sender });

        Subscription {
            id,
            receiver,
            channel: Rc::downgrade(&self.subscribers),
        }
    }

    /// Delivers `event` to every live subscriber.
    pub fn publish(&self, event: E) {
        let subs = self.subscribers.borrow();
        for sub in &subs.entries {
            // Unbounded and the receiver lives as long as the entry.
            let _ = sub.sender.send(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().entries.len()
    }
}

impl<E: Clone> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped subscription to an [`EventChannel`].
///
/// Dropping it removes the subscriber from the channel.
pub struct Subscription<E> {
    id: u64,
    receiver: Receiver<E>,
    channel: Weak<RefCell<Subscribers<E>>>,
}

impl<E> Subscription<E> {
    /// Drains every queued event in publish order.
    pub fn drain(&self) -> impl Iterator<Item = E> + '_ {
        self.receiver.try_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<E> Drop for Subscription<E> {
    fn drop(&mut self) {
        let Some(channel) = self.channel.upgrade() else { return };
        // A subscription dropped from inside `publish` would re-borrow; skip instead of panicking.
        if let Ok(mut subs) = channel.try_borrow_mut() {
            subs.entries.retain(|s| s.id != self.id);
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_events_in_order() {
        let channel = EventChannel::new();
        let sub = channel.subscribe();

        channel.publish(1);
        channel.publish(2);

        assert_eq!(sub.drain().collect::<Vec<_>>(), vec![1, 2]);
        assert!(sub.is_empty());
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let channel = EventChannel::new();
        channel.publish("early");
        let sub = channel.subscribe();
        channel.publish("late");

        assert_eq!(sub.drain().collect::<Vec<_>>(), vec!["late"]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let channel = EventChannel::<u8>::new();
        let a = channel.subscribe();
        let b = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);

        drop(a);
        assert_eq!(channel.subscriber_count(), 1);

        channel.publish(7);
        assert_eq!(b.drain().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn subscription_outliving_channel_is_harmless() {
        let channel = EventChannel::<u8>::new();
        let sub = channel.subscribe();
        drop(channel);
        assert_eq!(sub.drain().count(), 0);
    }
}
