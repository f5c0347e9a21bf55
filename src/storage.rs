/// Storage serialization utilities for chrome.storage.local

use crate::config::{LOGS_STORAGE_KEY, SETTINGS_STORAGE_KEY, Settings};
use crate::error::LoggerError;
use crate::tab_data::TabLogs;
use serde::Serialize;
use wasm_bindgen::JsValue;

/// Durable sink for whole-store snapshots.
///
/// Saves are best-effort: an `Err` is logged by the caller and never retried,
/// the next mutation simply saves again.
pub trait Persistence {
    fn persist(&self, logs: &TabLogs) -> Result<(), LoggerError>;
}

/// Writes snapshots to `chrome.storage.local` under [`LOGS_STORAGE_KEY`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeStorage;

impl Persistence for ChromeStorage {
    fn persist(&self, logs: &TabLogs) -> Result<(), LoggerError> {
        let value = to_js(logs)?;
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = crate::bridge::setStorage(LOGS_STORAGE_KEY, value).await {
                log::warn!("{}", LoggerError::PersistenceFailure(format!("{:?}", e)));
            }
        });
        Ok(())
    }
}

/// Serialize into a plain JS value (objects, not `Map`s)
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, LoggerError> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(LoggerError::from)
}

/// Load the persisted snapshot. A missing record is an empty store.
pub async fn load_logs() -> Result<TabLogs, LoggerError> {
    let stored = crate::bridge::getStorage(LOGS_STORAGE_KEY)
        .await
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))?;

    if stored.is_null() || stored.is_undefined() {
        Ok(TabLogs::new())
    } else {
        serde_wasm_bindgen::from_value(stored).map_err(LoggerError::from)
    }
}

/// Load settings, falling back to defaults on any failure.
pub async fn load_settings() -> Settings {
    match crate::bridge::getStorage(SETTINGS_STORAGE_KEY).await {
        Ok(stored) if !stored.is_null() && !stored.is_undefined() => {
            Settings::from_stored(serde_wasm_bindgen::from_value(stored).ok())
        }
        Ok(_) => Settings::default(),
        Err(e) => {
            log::warn!("Failed to read settings, using defaults: {:?}", e);
            Settings::default()
        }
    }
}

pub async fn save_settings(settings: &Settings) -> Result<(), LoggerError> {
    let value = to_js(settings)?;
    crate::bridge::setStorage(SETTINGS_STORAGE_KEY, value)
        .await
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))
}
