/// Broadcast typed text into every open chat tab
use crate::messages::Request;
use crate::patterns::matches_any;
use crate::tab_data::{OpenTab, TabId};

/// Sends one message to one tab, fire-and-forget
pub trait TabMessenger {
    fn send(&self, tab_id: TabId, request: &Request);
}

/// Fans dashboard input out to the tabs matching the allow-list
#[derive(Debug, Clone)]
pub struct Dispatcher {
    patterns: Vec<String>,
}

impl Dispatcher {
    pub fn new(patterns: Vec<String>) -> Self {
        Dispatcher { patterns }
    }

    /// Ids of open tabs whose URL matches a chat pattern. URL-less tabs are skipped.
    pub fn targets(&self, tabs: &[OpenTab]) -> Vec<TabId> {
        tabs.iter()
            .filter_map(|tab| match (tab.id, tab.url.as_deref()) {
                (Some(id), Some(url)) if matches_any(&self.patterns, url) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Mirror `text` into every chat tab's input box. Returns the number of tabs reached.
    pub fn broadcast_text<M: TabMessenger>(
        &self,
        tabs: &[OpenTab],
        text: &str,
        messenger: &M,
    ) -> usize {
        let targets = self.targets(tabs);
        let inject = Request::InjectInput {
            text: text.to_string(),
        };
        for tab_id in &targets {
            messenger.send(*tab_id, &inject);
        }
        targets.len()
    }

    /// Inject `text` (when non-empty) and then submit, tab by tab.
    pub fn broadcast_submit<M: TabMessenger>(
        &self,
        tabs: &[OpenTab],
        text: &str,
        messenger: &M,
    ) -> usize {
        let targets = self.targets(tabs);
        for tab_id in &targets {
            if !text.is_empty() {
                messenger.send(
                    *tab_id,
                    &Request::InjectInput {
                        text: text.to_string(),
                    },
                );
            }
            messenger.send(*tab_id, &Request::TriggerSubmit);
        }
        log::debug!("Submitted to {} chat tab(s)", targets.len());
        targets.len()
    }
}

/// Lets at most one live broadcast through per interval
#[derive(Debug, Clone)]
pub struct InputThrottle {
    interval_ms: f64,
    last_ms: Option<f64>,
}

impl InputThrottle {
    pub fn new(interval_ms: u32) -> Self {
        InputThrottle {
            interval_ms: f64::from(interval_ms),
            last_ms: None,
        }
    }

    pub fn allow(&mut self, now_ms: f64) -> bool {
        match self.last_ms {
            Some(last) if now_ms - last < self.interval_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }
}

/// Sends through `chrome.tabs.sendMessage`
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeTabs;

impl TabMessenger for ChromeTabs {
    fn send(&self, tab_id: TabId, request: &Request) {
        match crate::storage::to_js(request) {
            Ok(message) => crate::bridge::postTabMessage(tab_id, message),
            Err(e) => log::warn!("Could not encode message for tab {}: {}", tab_id, e),
        }
    }
}

/// All open tabs, or an empty list if the query fails
pub async fn query_open_tabs() -> Vec<OpenTab> {
    let tabs = match crate::bridge::queryTabs().await {
        Ok(tabs) => tabs,
        Err(e) => {
            log::warn!("Failed to query tabs: {:?}", e);
            return Vec::new();
        }
    };
    serde_wasm_bindgen::from_value(tabs).unwrap_or_else(|e| {
        log::warn!("Failed to parse tabs: {}", e);
        Vec::new()
    })
}
