/// AI Response Logger - Chrome extension that collects AI chat responses per tab
/// Built with Rust + WASM + Yew

pub mod background;
mod bridge;
pub mod config;
pub mod content;
pub mod dispatch;
pub mod error;
pub mod messages;
pub mod patterns;
pub mod storage;
pub mod tab_data;
pub mod ui;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Service worker: log store, message router and dashboard ports
#[wasm_bindgen]
pub fn start_background() {
    background::start();
}

// Content script on every matched chat page
#[wasm_bindgen]
pub fn start_content_script() {
    content::start();
}

// Start the Yew app for the dashboard (options page)
#[wasm_bindgen]
pub fn start_dashboard() {
    yew::Renderer::<ui::dashboard::Dashboard>::new().render();
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Re-export the URL pattern matcher for JavaScript access
#[wasm_bindgen]
pub fn match_pattern(pattern: &str, url: &str) -> bool {
    patterns::match_pattern(pattern, url)
}
