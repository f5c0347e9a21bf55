/// Push notifications to connected dashboards
use crate::error::LoggerError;
use crate::messages::{PushMessage, UpdateTag};
use std::collections::HashMap;
use uuid::Uuid;

/// Opaque handle returned by [`SubscriberSet::subscribe`]
pub type SubscriberId = Uuid;

/// A long-lived observer connection
pub trait Subscriber {
    fn deliver(&self, message: &PushMessage) -> Result<(), LoggerError>;
}

/// Outcome of one [`SubscriberSet::notify`] call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub evicted: usize,
}

/// Live subscribers. A subscriber whose delivery fails is dropped on the spot.
pub struct SubscriberSet<S> {
    members: HashMap<SubscriberId, S>,
}

impl<S: Subscriber> SubscriberSet<S> {
    pub fn new() -> Self {
        SubscriberSet {
            members: HashMap::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: S) -> SubscriberId {
        let id = Uuid::new_v4();
        self.members.insert(id, subscriber);
        id
    }

    pub fn unsubscribe(&mut self, id: &SubscriberId) -> bool {
        self.members.remove(id).is_some()
    }

    pub fn get(&self, id: &SubscriberId) -> Option<&S> {
        self.members.get(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Send `{type: "logsUpdated", tag}` to every subscriber.
    pub fn notify(&mut self, tag: UpdateTag) -> NotifyReport {
        let message = PushMessage::LogsUpdated { tag };
        let mut report = NotifyReport::default();
        let mut dead = Vec::new();

        for (id, subscriber) in &self.members {
            match subscriber.deliver(&message) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    log::warn!("Dropping subscriber {}: {}", id, e);
                    dead.push(*id);
                }
            }
        }

        for id in dead {
            self.members.remove(&id);
            report.evicted += 1;
        }
        report
    }
}

impl<S: Subscriber> Default for SubscriberSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every message; fails every delivery when `broken` is set.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingSubscriber {
        pub received: Rc<RefCell<Vec<PushMessage>>>,
        pub broken: bool,
    }

    impl RecordingSubscriber {
        pub fn broken() -> Self {
            RecordingSubscriber {
                broken: true,
                ..Default::default()
            }
        }

        pub fn tags(&self) -> Vec<UpdateTag> {
            self.received
                .borrow()
                .iter()
                .map(|PushMessage::LogsUpdated { tag }| *tag)
                .collect()
        }
    }

    impl Subscriber for RecordingSubscriber {
        fn deliver(&self, message: &PushMessage) -> Result<(), LoggerError> {
            if self.broken {
                return Err(LoggerError::DeliveryFailure("port closed".to_string()));
            }
            self.received.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    #[test]
    fn test_notify_reaches_every_subscriber() {
        let mut set = SubscriberSet::new();
        let first = RecordingSubscriber::default();
        let second = RecordingSubscriber::default();
        set.subscribe(first.clone());
        set.subscribe(second.clone());

        let report = set.notify(UpdateTag::Tab(4));

        assert_eq!(report, NotifyReport { delivered: 2, evicted: 0 });
        assert_eq!(first.tags(), vec![UpdateTag::Tab(4)]);
        assert_eq!(second.tags(), vec![UpdateTag::Tab(4)]);
    }

    #[test]
    fn test_failed_delivery_evicts_only_that_subscriber() {
        let mut set = SubscriberSet::new();
        let healthy_a = RecordingSubscriber::default();
        let healthy_b = RecordingSubscriber::default();
        set.subscribe(healthy_a.clone());
        let dead_id = set.subscribe(RecordingSubscriber::broken());
        set.subscribe(healthy_b.clone());

        let report = set.notify(UpdateTag::All);

        assert_eq!(report, NotifyReport { delivered: 2, evicted: 1 });
        assert_eq!(set.len(), 2);
        assert!(set.get(&dead_id).is_none());
        assert_eq!(healthy_a.tags(), vec![UpdateTag::All]);
        assert_eq!(healthy_b.tags(), vec![UpdateTag::All]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut set = SubscriberSet::new();
        let subscriber = RecordingSubscriber::default();
        let id = set.subscribe(subscriber.clone());

        assert!(set.unsubscribe(&id));
        assert!(!set.unsubscribe(&id));

        set.notify(UpdateTag::All);
        assert!(subscriber.tags().is_empty());
        assert!(set.is_empty());
    }

    #[test]
    fn test_notify_with_no_subscribers() {
        let mut set: SubscriberSet<RecordingSubscriber> = SubscriberSet::new();
        assert_eq!(set.notify(UpdateTag::All), NotifyReport::default());
    }
}
