/// Bindings to the Chrome extension APIs, reached through `js/chrome_bridge.js`
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/js/chrome_bridge.js")]
extern "C" {
    // chrome.storage.local
    #[wasm_bindgen(catch)]
    pub async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    // chrome.runtime one-shot messages
    #[wasm_bindgen(catch)]
    pub async fn sendRuntimeMessage(message: JsValue) -> Result<JsValue, JsValue>;

    /// `handler(message, sender)` returns the response, or `undefined` for none
    pub fn onRuntimeMessage(handler: &js_sys::Function);

    // chrome.runtime ports
    pub fn onConnect(handler: &js_sys::Function);

    pub fn portName(port: &JsValue) -> String;

    #[wasm_bindgen(catch)]
    pub fn postToPort(port: &JsValue, message: JsValue) -> Result<(), JsValue>;

    pub fn onPortDisconnect(port: &JsValue, handler: &js_sys::Function);

    #[wasm_bindgen(catch)]
    pub fn connectPort(
        name: &str,
        on_message: &js_sys::Function,
        on_disconnect: &js_sys::Function,
    ) -> Result<JsValue, JsValue>;

    // chrome.tabs
    #[wasm_bindgen(catch)]
    pub async fn queryTabs() -> Result<JsValue, JsValue>;

    /// Fire-and-forget; delivery errors are swallowed on the JS side
    pub fn postTabMessage(tab_id: i32, message: JsValue);

    // misc
    #[wasm_bindgen(catch)]
    pub async fn copyToClipboard(text: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    pub async fn openOptionsPage() -> Result<(), JsValue>;
}
