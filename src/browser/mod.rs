/// Browser bindings: extension messaging, storage and the page DOM
pub mod bridge;
pub mod content;
pub mod dom;
pub mod service;

use serde::Serialize;
use wasm_bindgen::JsValue;

/// Serialize as plain JS objects (not `Map`s) so values survive extension messaging
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}
