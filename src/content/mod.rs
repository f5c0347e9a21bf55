/// Content script: captures response text on chat pages and types into them on request

pub mod capture;
pub mod sites;

use crate::bridge;
use crate::error::LoggerError;
use crate::messages::{Request, Response};
use crate::storage;
use capture::{CaptureSession, FlushSchedule};
use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    Document, Element, HtmlElement, MutationObserver, MutationObserverInit, MutationRecord, Node,
};

const SUBMIT_BUTTON_SELECTOR: &str = "button[type=\"submit\"]";
const LISTENER_MARKER: &str = "data-listener-attached";

thread_local! {
    static SESSION: RefCell<Option<CaptureSession>> = const { RefCell::new(None) };
}

pub fn start() {
    spawn_local(async {
        let settings = storage::load_settings().await;
        SESSION.with(|session| {
            session.replace(Some(CaptureSession::new(settings.flush_delay_ms)));
        });
        if let Err(e) = attach_observers() {
            log::warn!("Response capture not started: {}", e);
        }
    });

    let on_message =
        Closure::wrap(Box::new(on_runtime_message) as Box<dyn Fn(JsValue, JsValue) -> JsValue>);
    bridge::onRuntimeMessage(on_message.as_ref().unchecked_ref());
    on_message.forget();
}

fn document() -> Result<Document, LoggerError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| LoggerError::Bridge("no document".to_string()))
}

fn page_host() -> String {
    web_sys::window()
        .and_then(|w| w.location().hostname().ok())
        .unwrap_or_default()
}

fn observe(
    target: &Node,
    options: &MutationObserverInit,
    callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
) -> Result<(), LoggerError> {
    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))?;
    observer
        .observe_with_options(target, options)
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))?;
    callback.forget();
    Ok(())
}

fn attach_observers() -> Result<(), LoggerError> {
    let document = document()?;
    let body: Node = document
        .body()
        .ok_or_else(|| LoggerError::Bridge("page has no body".to_string()))?
        .into();

    let text_options = MutationObserverInit::new();
    text_options.set_character_data(true);
    text_options.set_child_list(true);
    text_options.set_subtree(true);
    observe(
        &body,
        &text_options,
        Closure::wrap(Box::new(|records: js_sys::Array, _observer: MutationObserver| {
            on_mutations(records)
        }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>),
    )?;

    let button_options = MutationObserverInit::new();
    button_options.set_child_list(true);
    button_options.set_subtree(true);
    observe(
        &body,
        &button_options,
        Closure::wrap(Box::new(move |_records: js_sys::Array, _observer: MutationObserver| {
            hook_submit_button(&document)
        }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>),
    )?;

    log::info!("Capturing responses on {}", page_host());
    Ok(())
}

/// Candidate text carried by one mutation record
fn candidates(record: &MutationRecord) -> Vec<String> {
    match record.type_().as_str() {
        "characterData" => record
            .target()
            .and_then(|node| node.text_content())
            .into_iter()
            .collect(),
        "childList" => {
            let added = record.added_nodes();
            (0..added.length())
                .filter_map(|i| added.item(i))
                .filter_map(|node| node_text(&node))
                .collect()
        }
        _ => Vec::new(),
    }
}

fn node_text(node: &Node) -> Option<String> {
    match node.node_type() {
        Node::TEXT_NODE => node.text_content(),
        Node::ELEMENT_NODE => node
            .dyn_ref::<HtmlElement>()
            .map(|element| element.inner_text())
            .filter(|text| !text.trim().is_empty())
            .or_else(|| node.text_content()),
        _ => None,
    }
}

fn on_mutations(records: js_sys::Array) {
    let texts: Vec<String> = records
        .iter()
        .filter_map(|value| value.dyn_into::<MutationRecord>().ok())
        .flat_map(|record| candidates(&record))
        .collect();

    let schedule = SESSION.with(|session| {
        session
            .borrow_mut()
            .as_mut()
            .map(|s| s.record(texts, js_sys::Date::now()))
    });

    if let Some(FlushSchedule::Arm(delay_ms)) = schedule {
        if let Err(e) = arm_flush_timer(delay_ms) {
            log::warn!("Could not schedule flush: {}", e);
        }
    }
}

fn arm_flush_timer(delay_ms: u32) -> Result<(), LoggerError> {
    let window = web_sys::window().ok_or_else(|| LoggerError::Bridge("no window".to_string()))?;
    let callback = Closure::once_into_js(flush);
    window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            delay_ms as i32,
        )
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))?;
    Ok(())
}

fn flush() {
    let batch = SESSION.with(|session| session.borrow_mut().as_mut().and_then(|s| s.flush()));
    let Some(entries) = batch else {
        return;
    };

    log::debug!("Sending {} new entries", entries.len());
    let message = match storage::to_js(&Request::LogEntries { entries }) {
        Ok(message) => message,
        Err(e) => {
            log::warn!("Dropping batch: {}", e);
            return;
        }
    };
    spawn_local(async move {
        if let Err(e) = bridge::sendRuntimeMessage(message).await {
            log::debug!("logEntries not delivered: {:?}", e);
        }
    });
}

/// Reset the session buffer. Text still pending is dropped, never sent.
pub fn mark_prompt_submitted() {
    SESSION.with(|session| {
        if let Some(s) = session.borrow_mut().as_mut() {
            s.mark_prompt_submitted();
        }
    });
    log::info!("=== Prompt submitted, session reset ===");
}

fn hook_submit_button(document: &Document) {
    let Ok(Some(button)) = document.query_selector(SUBMIT_BUTTON_SELECTOR) else {
        return;
    };
    if button.has_attribute(LISTENER_MARKER) {
        return;
    }
    if let Err(e) = listen_for_submit(&button) {
        log::warn!("Could not hook submit button: {}", e);
    }
}

fn listen_for_submit(button: &Element) -> Result<(), LoggerError> {
    let on_click = Closure::wrap(Box::new(|_event: web_sys::Event| {
        mark_prompt_submitted();
    }) as Box<dyn FnMut(web_sys::Event)>);
    button
        .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))?;
    on_click.forget();
    button
        .set_attribute(LISTENER_MARKER, "true")
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))?;
    log::info!("Submit button found, listener attached");
    Ok(())
}

fn on_runtime_message(message: JsValue, _sender: JsValue) -> JsValue {
    let outcome = match serde_wasm_bindgen::from_value::<Request>(message) {
        Ok(Request::InjectInput { text }) => {
            document().and_then(|doc| sites::inject_text(&doc, &page_host(), &text))
        }
        Ok(Request::TriggerSubmit) => {
            document().and_then(|doc| sites::trigger_submit(&doc, &page_host()))
        }
        _ => return JsValue::UNDEFINED,
    };

    let ok = match outcome {
        Ok(()) => true,
        Err(e) => {
            log::warn!("{}", e);
            false
        }
    };
    storage::to_js(&Response::ack(ok)).unwrap_or(JsValue::UNDEFINED)
}
