/// Background service worker: owns settings and answers page messages
use super::bridge::{ExtensionStorage, listen};
use super::to_js;
use crate::background::Background;
use crate::config::STORAGE_KEY;
use crate::link_data::User;
use crate::programs::ProgramRegistry;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

/// Handle returned to the service worker script for the auth glue to call into
#[wasm_bindgen]
pub struct BackgroundHandle {
    inner: Rc<Background<ExtensionStorage>>,
}

#[wasm_bindgen]
impl BackgroundHandle {
    /// Record the signed-in user (or `null` on sign-out)
    #[wasm_bindgen(js_name = setUser)]
    pub fn set_user(&self, user: JsValue) -> js_sys::Promise {
        let background = self.inner.clone();
        future_to_promise(async move {
            let user: Option<User> = if user.is_null() || user.is_undefined() {
                None
            } else {
                Some(serde_wasm_bindgen::from_value(user).map_err(|e| JsValue::from_str(&e.to_string()))?)
            };
            background
                .set_user(user)
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            Ok(JsValue::UNDEFINED)
        })
    }
}

pub fn start() -> Result<BackgroundHandle, JsValue> {
    let registry = ProgramRegistry::builtin().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let background = Rc::new(Background::new(
        Rc::new(registry),
        ExtensionStorage::new(STORAGE_KEY),
        js_sys::Date::now,
    ));

    let handler_background = background.clone();
    let on_message = Closure::wrap(Box::new(move |request: JsValue| -> js_sys::Promise {
        let background = handler_background.clone();
        future_to_promise(async move {
            let message: serde_json::Value = serde_wasm_bindgen::from_value(request).unwrap_or_default();
            let response = background.handle_value(message).await;
            to_js(&response).map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }) as Box<dyn FnMut(JsValue) -> js_sys::Promise>);

    listen(on_message.as_ref().unchecked_ref());
    on_message.forget();

    log::info!("Link Monetizer background loaded");
    Ok(BackgroundHandle { inner: background })
}
