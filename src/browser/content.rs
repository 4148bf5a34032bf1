/// Content script: arms the scanner and wires it to page events
use super::bridge::RuntimeChannel;
use super::dom::{BrowserPage, editable_probe, element_key, sleep, text_runs};
use crate::config::ScannerConfig;
use crate::scanner::sites::is_supported_host;
use crate::scanner::{PageScanner, ScannerState};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{ClipboardEvent, Document, Element, Event, MutationObserver, MutationObserverInit, MutationRecord, Node};

pub fn start(config: ScannerConfig) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let hostname = window.location().hostname()?;
    if !is_supported_host(&hostname) {
        log::debug!("Link conversion not offered on {}", hostname);
        return Ok(());
    }

    let page = Rc::new(BrowserPage::new(window.clone(), config.notification_ms));
    let scanner = Rc::new(PageScanner::new(Rc::new(RuntimeChannel), page, config));

    spawn_local(async move {
        if scanner.arm().await != ScannerState::Armed {
            return;
        }
        let Some(document) = window.document() else {
            log::error!("Content script has no document");
            return;
        };
        if let Err(e) = attach(&document, scanner) {
            log::error!("Failed to attach URL listeners: {:?}", e);
        }
    });

    Ok(())
}

fn attach(document: &Document, scanner: Rc<PageScanner>) -> Result<(), JsValue> {
    listen_for_paste(document, scanner.clone())?;
    listen_for_input(document, scanner.clone())?;
    observe_mutations(document, scanner)?;
    log::info!("Link Monetizer armed");
    Ok(())
}

fn scan_element(scanner: Rc<PageScanner>, element: Element) {
    spawn_local(async move {
        let report = scanner.scan(&text_runs(&element)).await;
        if report.converted > 0 {
            log::debug!("Converted {} of {} links", report.converted, report.urls_found);
        }
    });
}

fn event_element(event: &Event) -> Option<Element> {
    event.target().and_then(|target| target.dyn_into::<Element>().ok())
}

fn listen_for_paste(document: &Document, scanner: Rc<PageScanner>) -> Result<(), JsValue> {
    let on_paste = Closure::wrap(Box::new(move |event: Event| {
        let pasted = event
            .dyn_ref::<ClipboardEvent>()
            .and_then(|e| e.clipboard_data())
            .and_then(|data| data.get_data("text").ok())
            .unwrap_or_default();
        if !scanner.wants_paste(&pasted) {
            return;
        }
        let Some(target) = event_element(&event) else {
            return;
        };

        // Let the browser finish inserting the pasted text first
        let scanner = scanner.clone();
        spawn_local(async move {
            match sleep(scanner.config().paste_delay_ms).await {
                Ok(()) => scan_element(scanner, target),
                Err(e) => log::warn!("Paste timer failed: {:?}", e),
            }
        });
    }) as Box<dyn FnMut(Event)>);

    document.add_event_listener_with_callback_and_bool("paste", on_paste.as_ref().unchecked_ref(), true)?;
    on_paste.forget();
    Ok(())
}

fn listen_for_input(document: &Document, scanner: Rc<PageScanner>) -> Result<(), JsValue> {
    let on_input = Closure::wrap(Box::new(move |event: Event| {
        let Some(target) = event_element(&event) else {
            return;
        };
        if !scanner.wants_input(&editable_probe(&target)) {
            return;
        }

        let key = element_key(&target);
        let ticket = scanner.schedule_input(key);
        let scanner = scanner.clone();
        spawn_local(async move {
            if let Err(e) = sleep(scanner.config().input_debounce_ms).await {
                log::warn!("Input timer failed: {:?}", e);
                return;
            }
            if scanner.take_input(key, ticket) {
                scan_element(scanner, target);
            }
        });
    }) as Box<dyn FnMut(Event)>);

    document.add_event_listener_with_callback_and_bool("input", on_input.as_ref().unchecked_ref(), true)?;
    on_input.forget();
    Ok(())
}

fn observe_mutations(document: &Document, scanner: Rc<PageScanner>) -> Result<(), JsValue> {
    let body = document.body().ok_or_else(|| JsValue::from_str("No body"))?;

    let on_mutations = Closure::wrap(Box::new(move |records: js_sys::Array, _observer: MutationObserver| {
        for record in records.iter() {
            let Ok(record) = record.dyn_into::<MutationRecord>() else {
                continue;
            };
            if record.type_() != "childList" {
                continue;
            }

            let added = record.added_nodes();
            for i in 0..added.length() {
                let Some(node) = added.get(i) else {
                    continue;
                };
                if node.node_type() != Node::TEXT_NODE {
                    continue;
                }
                let text = node.text_content().unwrap_or_default();
                if !scanner.wants_mutation(&text) {
                    continue;
                }
                if let Some(parent) = node.parent_element() {
                    scan_element(scanner.clone(), parent);
                }
            }
        }
    }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

    let observer = MutationObserver::new(on_mutations.as_ref().unchecked_ref())?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    options.set_character_data(true);
    observer.observe_with_options(&body, &options)?;

    on_mutations.forget();
    Ok(())
}
