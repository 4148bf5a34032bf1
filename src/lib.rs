/// Link Monetizer - Chrome Extension that turns pasted links into affiliate links
/// Built with Rust + WASM

pub mod background;
pub mod browser;
pub mod config;
pub mod converter;
mod domain;
pub mod link_data;
pub mod messaging;
pub mod programs;
pub mod scanner;
pub mod stats;
pub mod storage;
pub mod validation;

use config::ScannerConfig;
use programs::ProgramRegistry;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Start the privileged-context message handler (service worker)
#[wasm_bindgen]
pub fn start_background() -> Result<browser::service::BackgroundHandle, JsValue> {
    browser::service::start()
}

/// Start the in-page URL scanner. `config` may be `undefined` for defaults.
#[wasm_bindgen]
pub fn start_content_script(config: JsValue) -> Result<(), JsValue> {
    let config: ScannerConfig = if config.is_null() || config.is_undefined() {
        ScannerConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&format!("Invalid scanner config: {}", e)))?
    };
    browser::content::start(config)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgramInfo<'a> {
    id: &'a str,
    name: &'a str,
    icon: &'a str,
    param_name: &'a str,
}

// Program list for the options page
#[wasm_bindgen]
pub fn list_programs() -> Result<JsValue, JsValue> {
    let registry = ProgramRegistry::builtin().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let programs: Vec<ProgramInfo> = registry
        .programs()
        .iter()
        .map(|p| ProgramInfo {
            id: &p.id,
            name: &p.name,
            icon: &p.icon,
            param_name: &p.param_name,
        })
        .collect();

    browser::to_js(&programs).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Check one affiliate id as the user types it. Returns `null` when valid.
#[wasm_bindgen]
pub fn check_affiliate_id(program_id: &str, affiliate_id: &str) -> Result<JsValue, JsValue> {
    let registry = ProgramRegistry::builtin().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let program = registry
        .find_by_id(program_id)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown affiliate program: {}", program_id)))?;

    match validation::validate_affiliate_id(program, affiliate_id) {
        Ok(()) => Ok(JsValue::NULL),
        Err(e) => {
            let problem = serde_json::json!({ "error": e.message, "suggestion": e.suggestion });
            browser::to_js(&problem).map_err(|e| JsValue::from_str(&e.to_string()))
        }
    }
}
