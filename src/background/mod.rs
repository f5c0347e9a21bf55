/// Background service worker: owns the log store and talks to every other context

mod broadcast;
mod router;
mod store;

pub use broadcast::{NotifyReport, Subscriber, SubscriberId, SubscriberSet};
pub use router::handle_request;
pub use store::{AppendOutcome, LogStore};

use crate::bridge;
use crate::config::DASHBOARD_PORT_NAME;
use crate::error::LoggerError;
use crate::messages::{MessageSender, PushMessage, Request, UpdateTag};
use crate::storage::{self, ChromeStorage};
use crate::tab_data::TabLogs;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

type BackgroundStore = LogStore<ChromeStorage, PortSubscriber>;

thread_local! {
    static STORE: RefCell<BackgroundStore> = RefCell::new(LogStore::new(ChromeStorage));
}

/// A connected dashboard port
pub struct PortSubscriber {
    port: JsValue,
}

impl Subscriber for PortSubscriber {
    fn deliver(&self, message: &PushMessage) -> Result<(), LoggerError> {
        let value = storage::to_js(message)?;
        bridge::postToPort(&self.port, value)
            .map_err(|e| LoggerError::DeliveryFailure(format!("{:?}", e)))
    }
}

pub fn start() {
    let on_message =
        Closure::wrap(Box::new(on_runtime_message) as Box<dyn Fn(JsValue, JsValue) -> JsValue>);
    bridge::onRuntimeMessage(on_message.as_ref().unchecked_ref());
    on_message.forget();

    let on_connect = Closure::wrap(Box::new(on_port_connect) as Box<dyn Fn(JsValue)>);
    bridge::onConnect(on_connect.as_ref().unchecked_ref());
    on_connect.forget();

    spawn_local(async {
        let loaded = storage::load_logs().await.unwrap_or_else(|e| {
            log::warn!("Starting with an empty store, snapshot unreadable: {}", e);
            TabLogs::new()
        });
        STORE.with(|store| store.borrow_mut().restore(loaded));
    });

    log::info!("AI Response Logger background started");
}

fn on_runtime_message(message: JsValue, sender: JsValue) -> JsValue {
    let request: Request = match serde_wasm_bindgen::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            log::debug!("Ignoring unrecognized message: {}", e);
            return JsValue::UNDEFINED;
        }
    };
    let sender: MessageSender = serde_wasm_bindgen::from_value(sender).unwrap_or_default();

    let response = STORE.with(|store| {
        let mut store = store.borrow_mut();
        handle_request(&mut *store, request, &sender)
    });

    match response.map(|r| storage::to_js(&r)) {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            log::warn!("Failed to encode response: {}", e);
            JsValue::UNDEFINED
        }
        None => JsValue::UNDEFINED,
    }
}

fn on_port_connect(port: JsValue) {
    if bridge::portName(&port) != DASHBOARD_PORT_NAME {
        return;
    }

    let subscriber = PortSubscriber { port: port.clone() };
    let id = STORE.with(|store| {
        let mut store = store.borrow_mut();
        let id = store.subscribe(subscriber);
        log::info!(
            "Dashboard connected ({} subscriber(s), snapshot restored: {})",
            store.subscriber_count(),
            store.is_restored()
        );
        id
    });

    let on_disconnect = Closure::once_into_js(move || {
        STORE.with(|store| store.borrow_mut().unsubscribe(&id));
        log::info!("Dashboard {} disconnected", id);
    });
    bridge::onPortDisconnect(&port, on_disconnect.unchecked_ref());

    // the new dashboard fetches its first snapshot on this push
    STORE.with(|store| store.borrow_mut().notify_one(&id, UpdateTag::All));
}
