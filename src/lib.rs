/// Site Data Cleaner - Chrome Extension for per-site data cleanup
/// Built with Rust + WASM + Yew

mod background;
mod chrome;
mod content;
mod dates;
mod deletion;
mod domain;
mod error;
mod export;
mod fetcher;
mod host;
mod i18n;
mod messages;
mod pipeline;
mod session;
mod settings;
mod site_data;
mod workers;
pub mod ui;

#[cfg(test)]
mod testing;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export hostname extraction for JavaScript access
#[wasm_bindgen]
pub fn extract_hostname(url: &str) -> String {
    domain::extract_hostname(url).unwrap_or_else(|| "invalid".to_string())
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

// Register the background service worker listeners
#[wasm_bindgen]
pub fn start_background() {
    background::start();
}

// Register the content script's message listener
#[wasm_bindgen]
pub fn start_content_script() {
    content::start();
}
