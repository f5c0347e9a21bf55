/// Central per-tab log store
use super::broadcast::{Subscriber, SubscriberId, SubscriberSet};
use crate::error::LoggerError;
use crate::messages::{PushMessage, UpdateTag};
use crate::storage::Persistence;
use crate::tab_data::{TabId, TabLogs, TabMeta};
use std::collections::BTreeSet;

/// Result of a successful [`LogStore::append`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub tab_id: TabId,
    pub added: usize,
    pub total: usize,
}

/// Removals and clears seen before the stored snapshot was loaded
#[derive(Debug, Default)]
struct PendingDeletes {
    cleared: bool,
    removed: BTreeSet<TabId>,
}

impl PendingDeletes {
    fn is_empty(&self) -> bool {
        !self.cleared && self.removed.is_empty()
    }

    /// Drop from `loaded` whatever was deleted before it arrived
    fn apply_to(self, mut loaded: TabLogs) -> TabLogs {
        if self.cleared {
            return TabLogs::new();
        }
        for tab_id in self.removed {
            loaded.remove(tab_id);
        }
        loaded
    }
}

/// Owns every tab log, saves after each mutation and tells subscribers about it.
///
/// Mutations are single steps (update, persist, notify) with no yield point,
/// so the single-threaded background context never sees a half-applied change.
pub struct LogStore<P, S> {
    logs: TabLogs,
    persistence: P,
    subscribers: SubscriberSet<S>,
    restored: bool,
    pending: PendingDeletes,
}

impl<P: Persistence, S: Subscriber> LogStore<P, S> {
    pub fn new(persistence: P) -> Self {
        LogStore {
            logs: TabLogs::new(),
            persistence,
            subscribers: SubscriberSet::new(),
            restored: false,
            pending: PendingDeletes::default(),
        }
    }

    /// Install the snapshot loaded from durable storage.
    ///
    /// Removals and clears made before the load finished are replayed on the
    /// snapshot, then early appends are merged on top of it. The result is
    /// saved if anything happened early, and subscribers are told about it.
    pub fn restore(&mut self, loaded: TabLogs) {
        let pending = std::mem::take(&mut self.pending);
        let had_deletes = !pending.is_empty();
        let early = std::mem::replace(&mut self.logs, pending.apply_to(loaded));
        let had_early = !early.is_empty();
        for (tab_id, early_log) in early.into_inner() {
            let meta = TabMeta::new(early_log.url.clone(), early_log.title.clone());
            self.logs.get_or_insert(tab_id, meta).append_unique(early_log.entries);
        }
        self.restored = true;
        log::info!(
            "Restored {} tab log(s), {} entries",
            self.logs.len(),
            self.logs.total_entries()
        );
        if had_early || had_deletes {
            self.save();
        }
        self.subscribers.notify(UpdateTag::All);
    }

    pub fn is_restored(&self) -> bool {
        self.restored
    }

    /// Append the candidates not yet in the tab's log.
    ///
    /// The log is created from `fallback` on first sight of the tab; its
    /// metadata is never refreshed afterwards.
    pub fn append<I>(
        &mut self,
        tab_id: Option<TabId>,
        candidates: I,
        fallback: TabMeta,
    ) -> Result<AppendOutcome, LoggerError>
    where
        I: IntoIterator<Item = String>,
    {
        let tab_id = tab_id.ok_or(LoggerError::InvalidTarget)?;
        let tab_log = self.logs.get_or_insert(tab_id, fallback);
        let added = tab_log.append_unique(candidates);
        let total = tab_log.entries.len();

        if added > 0 {
            log::debug!("Tab {}: {} new entries ({} total)", tab_id, added, total);
            self.save();
            self.subscribers.notify(UpdateTag::Tab(tab_id));
        }
        Ok(AppendOutcome { tab_id, added, total })
    }

    pub fn get_all(&self) -> &TabLogs {
        &self.logs
    }

    /// Drop one tab's log. Always saves and broadcasts `all`, even if the tab was unknown.
    pub fn remove_tab(&mut self, tab_id: TabId) {
        if self.logs.remove(tab_id).is_some() {
            log::debug!("Removed log for tab {}", tab_id);
        }
        if !self.restored {
            self.pending.removed.insert(tab_id);
        }
        self.save();
        self.subscribers.notify(UpdateTag::All);
    }

    pub fn clear_all(&mut self) {
        self.logs.clear();
        if !self.restored {
            self.pending = PendingDeletes {
                cleared: true,
                removed: BTreeSet::new(),
            };
        }
        log::info!("Cleared all tab logs");
        self.save();
        self.subscribers.notify(UpdateTag::All);
    }

    pub fn subscribe(&mut self, subscriber: S) -> SubscriberId {
        self.subscribers.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: &SubscriberId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Push directly to one subscriber, evicting it if the push fails.
    pub fn notify_one(&mut self, id: &SubscriberId, tag: UpdateTag) -> bool {
        let delivered = match self.subscribers.get(id) {
            Some(subscriber) => subscriber.deliver(&PushMessage::LogsUpdated { tag }),
            None => return false,
        };
        match delivered {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Dropping subscriber {}: {}", id, e);
                self.subscribers.unsubscribe(id);
                false
            }
        }
    }

    fn save(&self) {
        if let Err(e) = self.persistence.persist(&self.logs) {
            log::warn!("{}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::background::broadcast::tests::RecordingSubscriber;
    use crate::tab_data::TabLog;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Keeps every saved snapshot; fails every save when `failing` is set.
    #[derive(Clone, Default)]
    pub(crate) struct MemoryPersistence {
        pub saves: Rc<RefCell<Vec<TabLogs>>>,
        pub failing: bool,
    }

    impl MemoryPersistence {
        pub fn save_count(&self) -> usize {
            self.saves.borrow().len()
        }

        pub fn last(&self) -> Option<TabLogs> {
            self.saves.borrow().last().cloned()
        }
    }

    impl Persistence for MemoryPersistence {
        fn persist(&self, logs: &TabLogs) -> Result<(), LoggerError> {
            if self.failing {
                return Err(LoggerError::PersistenceFailure("quota exceeded".to_string()));
            }
            self.saves.borrow_mut().push(logs.clone());
            Ok(())
        }
    }

    pub(crate) type TestStore = LogStore<MemoryPersistence, RecordingSubscriber>;

    pub(crate) fn test_store() -> (TestStore, MemoryPersistence, RecordingSubscriber) {
        let persistence = MemoryPersistence::default();
        let subscriber = RecordingSubscriber::default();
        let mut store = LogStore::new(persistence.clone());
        store.subscribe(subscriber.clone());
        (store, persistence, subscriber)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn meta() -> TabMeta {
        TabMeta::new("https://chatgpt.com/c/1", "ChatGPT")
    }

    #[test]
    fn test_append_creates_log_with_fallback_meta() {
        let (mut store, persistence, subscriber) = test_store();

        let outcome = store.append(Some(7), strings(&["a", "b"]), meta()).unwrap();

        assert_eq!(outcome, AppendOutcome { tab_id: 7, added: 2, total: 2 });
        let log = store.get_all().get(7).unwrap();
        assert_eq!(log.entries, vec!["a", "b"]);
        assert_eq!(log.url, "https://chatgpt.com/c/1");
        assert_eq!(log.title, "ChatGPT");
        assert_eq!(persistence.save_count(), 1);
        assert_eq!(subscriber.tags(), vec![UpdateTag::Tab(7)]);
    }

    #[test]
    fn test_append_dedups_and_keeps_first_order() {
        let (mut store, _, _) = test_store();

        store.append(Some(7), strings(&["a", "b"]), meta()).unwrap();
        let outcome = store.append(Some(7), strings(&["b", "c", "a", "c"]), meta()).unwrap();

        assert_eq!(outcome, AppendOutcome { tab_id: 7, added: 1, total: 3 });
        assert_eq!(store.get_all().get(7).unwrap().entries, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_append_nothing_new_is_silent() {
        let (mut store, persistence, subscriber) = test_store();
        store.append(Some(7), strings(&["a"]), meta()).unwrap();

        let outcome = store.append(Some(7), strings(&["a"]), meta()).unwrap();

        assert_eq!(outcome, AppendOutcome { tab_id: 7, added: 0, total: 1 });
        assert_eq!(persistence.save_count(), 1);
        assert_eq!(subscriber.tags().len(), 1);
    }

    #[test]
    fn test_append_keeps_first_meta() {
        let (mut store, _, _) = test_store();
        store.append(Some(3), strings(&["x"]), meta()).unwrap();

        store
            .append(Some(3), strings(&["y"]), TabMeta::new("https://claude.ai/new", "Claude"))
            .unwrap();

        let log = store.get_all().get(3).unwrap();
        assert_eq!(log.title, "ChatGPT");
        assert_eq!(log.url, "https://chatgpt.com/c/1");
    }

    #[test]
    fn test_append_without_tab_id() {
        let (mut store, persistence, subscriber) = test_store();

        let result = store.append(None, strings(&["a"]), meta());

        assert_eq!(result, Err(LoggerError::InvalidTarget));
        assert!(store.get_all().is_empty());
        assert_eq!(persistence.save_count(), 0);
        assert!(subscriber.tags().is_empty());
    }

    #[test]
    fn test_remove_tab_is_idempotent_and_always_broadcasts() {
        let (mut store, persistence, subscriber) = test_store();
        store.append(Some(1), strings(&["a"]), meta()).unwrap();
        store.append(Some(2), strings(&["b"]), meta()).unwrap();

        store.remove_tab(1);
        let after_first = store.get_all().clone();
        store.remove_tab(1);

        assert_eq!(store.get_all(), &after_first);
        assert_eq!(store.get_all().tab_ids(), vec![2]);
        assert_eq!(persistence.save_count(), 4);
        assert_eq!(
            subscriber.tags(),
            vec![UpdateTag::Tab(1), UpdateTag::Tab(2), UpdateTag::All, UpdateTag::All]
        );
    }

    #[test]
    fn test_clear_all() {
        let (mut store, persistence, subscriber) = test_store();
        store.append(Some(1), strings(&["a"]), meta()).unwrap();
        store.append(Some(2), strings(&["b", "c"]), meta()).unwrap();

        store.clear_all();

        assert!(store.get_all().is_empty());
        assert_eq!(persistence.last(), Some(TabLogs::new()));
        assert_eq!(subscriber.tags().last(), Some(&UpdateTag::All));
    }

    #[test]
    fn test_persistence_failure_is_contained() {
        let persistence = MemoryPersistence {
            failing: true,
            ..Default::default()
        };
        let subscriber = RecordingSubscriber::default();
        let mut store: TestStore = LogStore::new(persistence);
        store.subscribe(subscriber.clone());

        let outcome = store.append(Some(5), strings(&["a"]), meta()).unwrap();
        store.remove_tab(9);

        assert_eq!(outcome.total, 1);
        assert_eq!(store.get_all().get(5).unwrap().entries, vec!["a"]);
        assert_eq!(subscriber.tags(), vec![UpdateTag::Tab(5), UpdateTag::All]);
    }

    #[test]
    fn test_dead_subscriber_evicted_during_append() {
        let (mut store, _, healthy) = test_store();
        store.subscribe(RecordingSubscriber::broken());
        assert_eq!(store.subscriber_count(), 2);

        store.append(Some(1), strings(&["a"]), meta()).unwrap();

        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(healthy.tags(), vec![UpdateTag::Tab(1)]);
    }

    #[test]
    fn test_restore_merges_early_appends() {
        let (mut store, persistence, _) = test_store();
        store.append(Some(7), strings(&["late", "shared"]), meta()).unwrap();

        let mut loaded = TabLogs::new();
        loaded.insert(
            7,
            TabLog {
                url: "https://grok.com/".to_string(),
                title: "Grok".to_string(),
                entries: strings(&["stored", "shared"]),
            },
        );
        loaded.insert(8, TabLog::default());
        store.restore(loaded);

        assert!(store.is_restored());
        let log = store.get_all().get(7).unwrap();
        assert_eq!(log.entries, vec!["stored", "shared", "late"]);
        assert_eq!(log.title, "Grok");
        assert_eq!(store.get_all().tab_ids(), vec![7, 8]);
        assert_eq!(persistence.save_count(), 2);
    }

    fn stored(ids: &[TabId]) -> TabLogs {
        ids.iter()
            .map(|id| {
                (
                    *id,
                    TabLog {
                        url: format!("https://claude.ai/chat/{}", id),
                        title: "Claude".to_string(),
                        entries: strings(&["stored"]),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_restore_replays_early_remove() {
        let (mut store, persistence, _) = test_store();
        store.remove_tab(5);

        store.restore(stored(&[5, 6]));

        assert_eq!(store.get_all().tab_ids(), vec![6]);
        assert_eq!(persistence.last().map(|logs| logs.tab_ids()), Some(vec![6]));
    }

    #[test]
    fn test_restore_replays_early_clear() {
        let (mut store, persistence, _) = test_store();
        store.clear_all();

        store.restore(stored(&[5, 6]));

        assert!(store.get_all().is_empty());
        assert_eq!(persistence.save_count(), 2);
        assert_eq!(persistence.last(), Some(TabLogs::new()));
    }

    #[test]
    fn test_restore_keeps_appends_made_after_early_clear() {
        let (mut store, persistence, _) = test_store();
        store.append(Some(5), strings(&["before clear"]), meta()).unwrap();
        store.clear_all();
        store.append(Some(9), strings(&["after clear"]), meta()).unwrap();

        store.restore(stored(&[5, 6]));

        assert_eq!(store.get_all().tab_ids(), vec![9]);
        assert_eq!(store.get_all().get(9).unwrap().entries, vec!["after clear"]);
        assert_eq!(persistence.last().map(|logs| logs.tab_ids()), Some(vec![9]));
    }

    #[test]
    fn test_restore_keeps_tab_logged_again_after_early_remove() {
        let (mut store, _, _) = test_store();
        store.remove_tab(5);
        store.append(Some(5), strings(&["fresh"]), meta()).unwrap();

        store.restore(stored(&[5, 6]));

        assert_eq!(store.get_all().tab_ids(), vec![5, 6]);
        assert_eq!(store.get_all().get(5).unwrap().entries, vec!["fresh"]);
    }

    #[test]
    fn test_restore_broadcasts_all() {
        let (mut store, _, subscriber) = test_store();

        store.restore(stored(&[1]));

        assert_eq!(subscriber.tags(), vec![UpdateTag::All]);
    }

    #[test]
    fn test_restore_into_empty_store_does_not_save() {
        let (mut store, persistence, _) = test_store();
        let mut loaded = TabLogs::new();
        loaded.insert(1, TabLog::default());

        store.restore(loaded.clone());

        assert_eq!(store.get_all(), &loaded);
        assert_eq!(persistence.save_count(), 0);
    }

    #[test]
    fn test_notify_one_evicts_on_failure() {
        let persistence = MemoryPersistence::default();
        let mut store: TestStore = LogStore::new(persistence);
        let healthy = RecordingSubscriber::default();
        let healthy_id = store.subscribe(healthy.clone());
        let dead_id = store.subscribe(RecordingSubscriber::broken());

        assert!(store.notify_one(&healthy_id, UpdateTag::All));
        assert!(!store.notify_one(&dead_id, UpdateTag::All));

        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(healthy.tags(), vec![UpdateTag::All]);
    }
}
