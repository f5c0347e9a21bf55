/// Data structures for captured tab logs
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Host-assigned browser tab id
pub type TabId = i32;

/// Last-known page metadata for a tab
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabMeta {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl TabMeta {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> TabMeta {
        TabMeta {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Everything captured for one tab
///
/// `entries` keeps first-observed order and never holds the same string twice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabLog {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub entries: Vec<String>,
}

impl TabLog {
    pub fn new(meta: TabMeta) -> TabLog {
        TabLog {
            url: meta.url,
            title: meta.title,
            entries: Vec::new(),
        }
    }

    /// Append every candidate that is not already present. Returns how many were added.
    pub fn append_unique<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for candidate in candidates {
            if !self.entries.contains(&candidate) {
                self.entries.push(candidate);
                added += 1;
            }
        }
        added
    }

    /// Entries joined the way the dashboard shows and copies them
    pub fn joined(&self) -> String {
        self.entries.join("\n\n")
    }
}

/// The whole store: one log per tab, ordered by tab id.
///
/// Serialized as an object keyed by the decimal tab id, which is the layout
/// `chrome.storage.local` and the message payloads use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabLogs(BTreeMap<TabId, TabLog>);

impl TabLogs {
    pub fn new() -> Self {
        TabLogs(BTreeMap::new())
    }

    pub fn get(&self, tab_id: TabId) -> Option<&TabLog> {
        self.0.get(&tab_id)
    }

    pub fn get_or_insert(&mut self, tab_id: TabId, meta: TabMeta) -> &mut TabLog {
        self.0.entry(tab_id).or_insert_with(|| TabLog::new(meta))
    }

    pub fn insert(&mut self, tab_id: TabId, log: TabLog) -> Option<TabLog> {
        self.0.insert(tab_id, log)
    }

    pub fn remove(&mut self, tab_id: TabId) -> Option<TabLog> {
        self.0.remove(&tab_id)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tab ids in ascending numeric order
    pub fn tab_ids(&self) -> Vec<TabId> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TabId, &TabLog)> {
        self.0.iter().map(|(id, log)| (*id, log))
    }

    pub fn total_entries(&self) -> usize {
        self.0.values().map(|log| log.entries.len()).sum()
    }

    pub fn into_inner(self) -> BTreeMap<TabId, TabLog> {
        self.0
    }
}

impl FromIterator<(TabId, TabLog)> for TabLogs {
    fn from_iter<T: IntoIterator<Item = (TabId, TabLog)>>(iter: T) -> Self {
        TabLogs(iter.into_iter().collect())
    }
}

impl Serialize for TabLogs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (tab_id, log) in &self.0 {
            map.serialize_entry(&tab_id.to_string(), log)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TabLogs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TabLogsVisitor;

        impl<'de> Visitor<'de> for TabLogsVisitor {
            type Value = TabLogs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object keyed by tab id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TabLogs, A::Error> {
                let mut logs = BTreeMap::new();
                while let Some((key, tab_log)) = access.next_entry::<String, TabLog>()? {
                    match key.parse::<TabId>() {
                        Ok(tab_id) => {
                            logs.insert(tab_id, tab_log);
                        }
                        Err(_) => {
                            log::warn!("Skipping stored log with non-numeric tab id {:?}", key)
                        }
                    }
                }
                Ok(TabLogs(logs))
            }
        }

        deserializer.deserialize_map(TabLogsVisitor)
    }
}

/// An open browser tab as reported by `chrome.tabs.query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenTab {
    #[serde(default)]
    pub id: Option<TabId>,
    #[serde(default)]
    pub url: Option<String>,
}
