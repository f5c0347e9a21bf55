/// Per-provider input adapters: where to type and what to click
use crate::error::LoggerError;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventInit, HtmlElement, HtmlInputElement, HtmlTextAreaElement,
    KeyboardEvent, KeyboardEventInit,
};

/// Selectors for one chat provider, most specific first
#[derive(Debug, PartialEq, Eq)]
pub struct SiteAdapter {
    pub name: &'static str,
    pub hosts: &'static [&'static str],
    pub input_selectors: &'static [&'static str],
    pub submit_selectors: &'static [&'static str],
}

pub static SITE_ADAPTERS: [SiteAdapter; 5] = [
    SiteAdapter {
        name: "ChatGPT",
        hosts: &["chatgpt.com", "chat.openai.com"],
        input_selectors: &["#prompt-textarea", "textarea[data-id]", "textarea"],
        submit_selectors: &["button[data-testid=\"send-button\"]", "button[type=\"submit\"]"],
    },
    SiteAdapter {
        name: "Claude",
        hosts: &["claude.ai"],
        input_selectors: &[
            "div.ProseMirror[contenteditable=\"true\"]",
            "[contenteditable=\"true\"]",
        ],
        submit_selectors: &[
            "button[aria-label=\"Send message\"]",
            "button[aria-label=\"Send Message\"]",
        ],
    },
    SiteAdapter {
        name: "Grok",
        hosts: &["grok.com"],
        input_selectors: &["textarea[aria-label]", "textarea"],
        submit_selectors: &["button[type=\"submit\"]", "button[aria-label=\"Submit\"]"],
    },
    SiteAdapter {
        name: "Gemini",
        hosts: &["gemini.google.com"],
        input_selectors: &[
            "rich-textarea div[contenteditable=\"true\"]",
            "[contenteditable=\"true\"]",
        ],
        submit_selectors: &["button.send-button", "button[aria-label=\"Send message\"]"],
    },
    SiteAdapter {
        name: "DeepSeek",
        hosts: &["chat.deepseek.com"],
        input_selectors: &["textarea#chat-input", "textarea"],
        submit_selectors: &[
            "div[role=\"button\"][aria-disabled=\"false\"]",
            "button[type=\"submit\"]",
        ],
    },
];

/// Tried on any page once the provider-specific selectors come up empty
const GENERIC_INPUT_SELECTORS: [&str; 2] = ["textarea", "[contenteditable=\"true\"]"];
const GENERIC_SUBMIT_SELECTORS: [&str; 1] = ["button[type=\"submit\"]"];

/// Find the adapter for a page hostname
pub fn adapter_for_host(host: &str) -> Option<&'static SiteAdapter> {
    let host = host.trim().to_lowercase();
    SITE_ADAPTERS
        .iter()
        .find(|adapter| adapter.hosts.iter().any(|h| *h == host))
}

/// Selector order to try for the input box on `host`
pub fn input_selectors(host: &str) -> Vec<&'static str> {
    let mut selectors: Vec<&'static str> = adapter_for_host(host)
        .map(|a| a.input_selectors.to_vec())
        .unwrap_or_default();
    selectors.extend(GENERIC_INPUT_SELECTORS);
    selectors
}

/// Selector order to try for the submit control on `host`
pub fn submit_selectors(host: &str) -> Vec<&'static str> {
    let mut selectors: Vec<&'static str> = adapter_for_host(host)
        .map(|a| a.submit_selectors.to_vec())
        .unwrap_or_default();
    selectors.extend(GENERIC_SUBMIT_SELECTORS);
    selectors
}

fn first_match(document: &Document, selectors: &[&str]) -> Option<Element> {
    selectors
        .iter()
        .find_map(|selector| document.query_selector(selector).ok().flatten())
}

fn find_input(document: &Document, host: &str) -> Result<Element, LoggerError> {
    first_match(document, &input_selectors(host))
        .ok_or_else(|| LoggerError::AdapterNotFound(format!("no input box on {}", host)))
}

fn bubbling_event(kind: &str) -> Result<Event, LoggerError> {
    let init = EventInit::new();
    init.set_bubbles(true);
    Event::new_with_event_init_dict(kind, &init)
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))
}

/// Put `text` into the provider's input box and let the page know it changed.
pub fn inject_text(document: &Document, host: &str, text: &str) -> Result<(), LoggerError> {
    let input = find_input(document, host)?;

    if let Some(area) = input.dyn_ref::<HtmlTextAreaElement>() {
        area.set_value(text);
    } else if let Some(field) = input.dyn_ref::<HtmlInputElement>() {
        field.set_value(text);
    } else {
        input.set_text_content(Some(text));
    }

    if let Some(element) = input.dyn_ref::<HtmlElement>() {
        if let Err(e) = element.focus() {
            log::debug!("Could not focus chat input: {:?}", e);
        }
    }
    input
        .dispatch_event(&bubbling_event("input")?)
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))?;
    Ok(())
}

/// Click the provider's send control, or press Enter in the input box.
pub fn trigger_submit(document: &Document, host: &str) -> Result<(), LoggerError> {
    if let Some(button) = first_match(document, &submit_selectors(host))
        .and_then(|element| element.dyn_into::<HtmlElement>().ok())
    {
        button.click();
        return Ok(());
    }

    let input = find_input(document, host)?;
    let init = KeyboardEventInit::new();
    init.set_key("Enter");
    init.set_code("Enter");
    init.set_bubbles(true);
    let enter = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init)
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))?;
    input
        .dispatch_event(&enter)
        .map_err(|e| LoggerError::Bridge(format!("{:?}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_for_host() {
        assert_eq!(adapter_for_host("chatgpt.com").unwrap().name, "ChatGPT");
        assert_eq!(adapter_for_host("chat.openai.com").unwrap().name, "ChatGPT");
        assert_eq!(adapter_for_host("Claude.AI").unwrap().name, "Claude");
        assert_eq!(adapter_for_host("gemini.google.com").unwrap().name, "Gemini");
        assert!(adapter_for_host("google.com").is_none());
    }

    #[test]
    fn test_input_selectors_put_provider_first() {
        let selectors = input_selectors("chat.deepseek.com");

        assert_eq!(selectors[0], "textarea#chat-input");
        assert_eq!(selectors.last(), Some(&"[contenteditable=\"true\"]"));
    }

    #[test]
    fn test_unknown_host_uses_generic_selectors() {
        assert_eq!(input_selectors("example.org"), GENERIC_INPUT_SELECTORS.to_vec());
        assert_eq!(submit_selectors("example.org"), vec!["button[type=\"submit\"]"]);
    }

    #[test]
    fn test_every_adapter_host_is_in_default_patterns() {
        use crate::config::DEFAULT_CHAT_PATTERNS;
        use crate::patterns::matches_any;

        for adapter in &SITE_ADAPTERS {
            let url = format!("https://{}/", adapter.hosts[0]);
            assert!(matches_any(&DEFAULT_CHAT_PATTERNS, &url), "{} not covered", adapter.name);
        }
    }
}
