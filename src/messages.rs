/// Message contract between the content scripts, the background worker and the dashboard
use crate::error::LoggerError;
use crate::tab_data::{TabId, TabLogs, TabMeta};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// One-shot requests sent with `chrome.runtime.sendMessage` / `chrome.tabs.sendMessage`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    LogEntries {
        #[serde(default)]
        entries: Vec<String>,
    },
    GetAllLogs,
    ClearLogs,
    RemoveTabLogs {
        #[serde(rename = "tabId", default)]
        tab_id: Option<TabId>,
    },
    InjectInput {
        #[serde(default)]
        text: String,
    },
    TriggerSubmit,
}

/// The tab part of a `chrome.runtime.MessageSender`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SenderTab {
    #[serde(default)]
    pub id: Option<TabId>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageSender {
    #[serde(default)]
    pub tab: Option<SenderTab>,
}

impl MessageSender {
    pub fn from_tab(id: TabId, url: &str, title: &str) -> MessageSender {
        MessageSender {
            tab: Some(SenderTab {
                id: Some(id),
                url: Some(url.to_string()),
                title: Some(title.to_string()),
            }),
        }
    }

    pub fn tab_id(&self) -> Option<TabId> {
        self.tab.as_ref().and_then(|tab| tab.id)
    }

    /// Metadata used to seed a log the first time a tab reports in
    pub fn meta(&self) -> TabMeta {
        self.tab
            .as_ref()
            .map(|tab| {
                TabMeta::new(
                    tab.url.clone().unwrap_or_default(),
                    tab.title.clone().unwrap_or_default(),
                )
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedResponse {
    pub ok: bool,
    pub total: usize,
    pub tab_id: TabId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedResponse {
    pub ok: bool,
    pub error: String,
}

impl From<&LoggerError> for FailedResponse {
    fn from(err: &LoggerError) -> Self {
        FailedResponse {
            ok: false,
            error: err.code().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllLogsResponse {
    #[serde(default)]
    pub tab_logs: TabLogs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// Anything a handler sends back through `sendResponse`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Logged(LoggedResponse),
    Failed(FailedResponse),
    AllLogs(AllLogsResponse),
    Ack(AckResponse),
}

impl Response {
    pub fn ack(ok: bool) -> Response {
        Response::Ack(AckResponse { ok })
    }

    pub fn failed(err: &LoggerError) -> Response {
        Response::Failed(err.into())
    }
}

/// Which part of the store changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateTag {
    Tab(TabId),
    All,
}

impl Serialize for UpdateTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UpdateTag::Tab(tab_id) => serializer.serialize_i32(*tab_id),
            UpdateTag::All => serializer.serialize_str("all"),
        }
    }
}

impl<'de> Deserialize<'de> for UpdateTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTag {
            Id(TabId),
            Word(String),
        }

        match RawTag::deserialize(deserializer)? {
            RawTag::Id(tab_id) => Ok(UpdateTag::Tab(tab_id)),
            RawTag::Word(word) if word == "all" => Ok(UpdateTag::All),
            RawTag::Word(word) => Err(serde::de::Error::custom(format!(
                "unknown update tag {:?}",
                word
            ))),
        }
    }
}

/// Server to client traffic on the dashboard port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PushMessage {
    LogsUpdated { tag: UpdateTag },
}
