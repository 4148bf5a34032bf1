/// Extension messaging and chrome.storage.local behind the crate's traits
use super::to_js;
use crate::messaging::{MessageChannel, MessageError, Request, Response};
use crate::storage::{StorageBackend, StorageData, StorageError};
use futures::future::{FutureExt, LocalBoxFuture};
use wasm_bindgen::prelude::*;

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn sendMessage(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    fn onMessage(handler: &js_sys::Function);
}

/// Register the background's message handler with the runtime
pub fn listen(handler: &js_sys::Function) {
    onMessage(handler);
}

/// Page-to-background channel over `chrome.runtime.sendMessage`
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeChannel;

impl MessageChannel for RuntimeChannel {
    fn send(&self, request: Request) -> LocalBoxFuture<'_, Result<Response, MessageError>> {
        async move {
            let message = to_js(&request).map_err(|e| MessageError::Serialization(e.to_string()))?;

            let reply = sendMessage(message)
                .await
                .map_err(|e| MessageError::Transport(format!("{:?}", e)))?;

            if reply.is_null() || reply.is_undefined() {
                return Err(MessageError::NoResponse);
            }

            serde_wasm_bindgen::from_value(reply).map_err(|e| MessageError::Serialization(e.to_string()))
        }
        .boxed_local()
    }
}

/// `StorageData` kept under a single chrome.storage.local key
#[derive(Debug, Clone)]
pub struct ExtensionStorage {
    key: String,
}

impl ExtensionStorage {
    pub fn new(key: impl Into<String>) -> Self {
        ExtensionStorage { key: key.into() }
    }
}

impl StorageBackend for ExtensionStorage {
    fn load(&self) -> LocalBoxFuture<'_, Result<StorageData, StorageError>> {
        async move {
            let storage_js = getStorage(&self.key)
                .await
                .map_err(|e| StorageError::Backend(format!("Failed to get storage: {:?}", e)))?;

            if storage_js.is_null() || storage_js.is_undefined() {
                return Ok(StorageData::new());
            }

            serde_wasm_bindgen::from_value(storage_js).map_err(|e| StorageError::Serialization(e.to_string()))
        }
        .boxed_local()
    }

    fn save<'a>(&'a self, data: &'a StorageData) -> LocalBoxFuture<'a, Result<(), StorageError>> {
        async move {
            let storage_js = to_js(data).map_err(|e| StorageError::Serialization(e.to_string()))?;

            setStorage(&self.key, storage_js)
                .await
                .map_err(|e| StorageError::Backend(format!("Failed to save storage: {:?}", e)))
        }
        .boxed_local()
    }
}
