/// DOM access for the content script
use crate::scanner::editable::EditableProbe;
use crate::scanner::{PageContext, TextNode};
use std::cell::Cell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement, Text, Window};

/// NodeFilter.SHOW_TEXT
const SHOW_TEXT: u32 = 0x4;

/// Expando property holding the debounce key assigned to an element
const KEY_PROPERTY: &str = "__linkMonetizerKey";

const NOTIFICATION_STYLE: &str = "position: fixed; top: 20px; right: 20px; background: #4CAF50; color: white; padding: 8px 16px; border-radius: 4px; font-size: 12px; font-family: -apple-system, BlinkMacSystemFont, sans-serif; z-index: 10000; opacity: 0; transition: opacity 0.3s ease; pointer-events: none;";

thread_local! {
    static NEXT_KEY: Cell<u32> = const { Cell::new(0) };
}

/// Editable text on the page: a text node, or the value of a form control
#[derive(Debug, Clone)]
pub enum DomText {
    Node(Text),
    Input(HtmlInputElement),
    TextArea(HtmlTextAreaElement),
}

impl TextNode for DomText {
    fn text(&self) -> String {
        match self {
            DomText::Node(node) => node.text_content().unwrap_or_default(),
            DomText::Input(input) => input.value(),
            DomText::TextArea(area) => area.value(),
        }
    }

    fn set_text(&self, text: &str) {
        match self {
            DomText::Node(node) => node.set_text_content(Some(text)),
            DomText::Input(input) => input.set_value(text),
            DomText::TextArea(area) => area.set_value(text),
        }
    }
}

/// All text runs under `element`, in document order
pub fn text_runs(element: &Element) -> Vec<DomText> {
    if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        return vec![DomText::TextArea(area.clone())];
    }
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return vec![DomText::Input(input.clone())];
    }

    let Some(document) = element.owner_document() else {
        return Vec::new();
    };
    let walker = match document.create_tree_walker_with_what_to_show(element, SHOW_TEXT) {
        Ok(walker) => walker,
        Err(e) => {
            log::warn!("Failed to walk text nodes: {:?}", e);
            return Vec::new();
        }
    };

    let mut runs = Vec::new();
    while let Ok(Some(node)) = walker.next_node() {
        if let Ok(text) = node.dyn_into::<Text>() {
            runs.push(DomText::Node(text));
        }
    }
    runs
}

pub fn editable_probe(element: &Element) -> EditableProbe {
    EditableProbe {
        content_editable: element
            .dyn_ref::<HtmlElement>()
            .map(|e| e.content_editable())
            .unwrap_or_default(),
        tag_name: element.tag_name(),
        has_notranslate_class: element.class_list().contains("notranslate"),
        role: element.get_attribute("role"),
    }
}

/// Stable per-element key for debouncing, stored on the element itself
pub fn element_key(element: &Element) -> u32 {
    let property = JsValue::from_str(KEY_PROPERTY);
    if let Some(existing) = js_sys::Reflect::get(element, &property).ok().and_then(|v| v.as_f64()) {
        return existing as u32;
    }

    let key = NEXT_KEY.with(|next| {
        let key = next.get().wrapping_add(1);
        next.set(key);
        key
    });
    if js_sys::Reflect::set(element, &property, &JsValue::from(key)).is_err() {
        log::debug!("Could not tag element for debouncing");
    }
    key
}

/// Resolve after `ms` milliseconds via `setTimeout`
pub async fn sleep(ms: i32) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let mut timer_error = None;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms) {
            timer_error = Some(e);
        }
    });
    if let Some(e) = timer_error {
        return Err(e);
    }
    JsFuture::from(promise).await.map(|_| ())
}

/// The live page: location, clock and the conversion toast
pub struct BrowserPage {
    window: Window,
    notification_ms: i32,
}

impl BrowserPage {
    pub fn new(window: Window, notification_ms: i32) -> Self {
        BrowserPage { window, notification_ms }
    }

    fn build_notification(&self, program: &str) -> Result<HtmlElement, JsValue> {
        let document = self.window.document().ok_or_else(|| JsValue::from_str("No document"))?;
        let body = document.body().ok_or_else(|| JsValue::from_str("No body"))?;

        let notification: HtmlElement = document.create_element("div")?.dyn_into()?;
        notification.style().set_css_text(NOTIFICATION_STYLE);
        notification.set_text_content(Some(&format!("✓ Link converted to {} affiliate", program)));
        body.append_child(&notification)?;
        Ok(notification)
    }
}

impl PageContext for BrowserPage {
    fn hostname(&self) -> String {
        self.window.location().hostname().unwrap_or_default()
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    fn show_notification(&self, program: &str) {
        let notification = match self.build_notification(program) {
            Ok(notification) => notification,
            Err(e) => {
                log::debug!("Could not show notification: {:?}", e);
                return;
            }
        };

        let visible_ms = self.notification_ms;
        spawn_local(async move {
            let shown = async {
                sleep(10).await?;
                notification.style().set_property("opacity", "1")?;
                sleep(visible_ms).await?;
                notification.style().set_property("opacity", "0")?;
                sleep(300).await
            };
            if let Err(e) = shown.await {
                log::debug!("Notification animation interrupted: {:?}", e);
            }
            notification.remove();
        });
    }
}
