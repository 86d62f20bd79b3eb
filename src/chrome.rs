/// Bindings to the `chrome.*` extension APIs
use js_sys::{Function, Object, Promise, Reflect};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::error::{HostError, HostResult};
use crate::host::{BrowsingDataApi, Clock, CookieApi, DataTypeSet, HistoryApi, HistoryQuery, RemovalOptions, TabsApi};
use crate::messages::{ContentRequest, ContentResponse};
use crate::settings::{ExtensionSettings, SETTINGS_KEY};
use crate::site_data::{Cookie, HistoryItem, TabInfo};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "history"], js_name = search)]
    async fn history_search(query: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "cookies"], js_name = getAll)]
    async fn cookies_get_all(details: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "cookies"], js_name = remove)]
    async fn cookies_remove(details: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "browsingData"], js_name = remove)]
    async fn browsing_data_remove(options: JsValue, data_to_remove: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    async fn tabs_query(query_info: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = sendMessage)]
    async fn tabs_send_message(tab_id: i32, message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    async fn storage_local_get(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    async fn storage_local_set(items: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "downloads"], js_name = download)]
    async fn downloads_download(options: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "notifications"], js_name = create)]
    async fn notifications_create(options: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "contextMenus"], js_name = create)]
    pub fn context_menus_create(properties: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "contextMenus", "onClicked"], js_name = addListener)]
    pub fn add_context_menu_listener(callback: &Closure<dyn FnMut(JsValue, JsValue)>);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onInstalled"], js_name = addListener)]
    pub fn add_installed_listener(callback: &Closure<dyn FnMut(JsValue)>);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    pub fn add_message_listener(callback: &Closure<dyn FnMut(JsValue, JsValue, Function) -> bool>);

    #[wasm_bindgen(js_name = setTimeout)]
    fn set_timeout(handler: &Function, timeout: i32) -> JsValue;
}

/// Best-effort text of a rejected promise or thrown value
pub fn js_error_text(error: &JsValue) -> String {
    Reflect::get(error, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{:?}", error))
}

/// Serialize to a plain JS object (no `Map`s, no `BigInt`s)
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> HostResult<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| HostError::Decode(format!("Failed to serialize: {:?}", e)))
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> HostResult<T> {
    serde_wasm_bindgen::from_value(value).map_err(|e| HostError::Decode(format!("Failed to parse: {:?}", e)))
}

#[derive(Serialize)]
struct CookieFilter<'a> {
    domain: &'a str,
}

#[derive(Serialize)]
struct CookieDetails<'a> {
    url: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct TabQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadOptions<'a> {
    url: &'a str,
    filename: &'a str,
    save_as: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationOptions<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    icon_url: &'a str,
    title: &'a str,
    message: &'a str,
}

/// The running browser, reached through the extension APIs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChromeHost;

impl HistoryApi for ChromeHost {
    async fn search_history(&self, query: &HistoryQuery) -> HostResult<Vec<HistoryItem>> {
        let items = history_search(to_js(query)?)
            .await
            .map_err(|e| HostError::Lookup(js_error_text(&e)))?;
        from_js(items)
    }
}

impl CookieApi for ChromeHost {
    async fn get_cookies(&self, domain: &str) -> HostResult<Vec<Cookie>> {
        let cookies = cookies_get_all(to_js(&CookieFilter { domain })?)
            .await
            .map_err(|e| HostError::Lookup(js_error_text(&e)))?;
        from_js(cookies)
    }

    async fn remove_cookie(&self, url: &str, name: &str) -> HostResult<()> {
        cookies_remove(to_js(&CookieDetails { url, name })?)
            .await
            .map_err(|e| HostError::Deletion(js_error_text(&e)))?;
        Ok(())
    }
}

impl BrowsingDataApi for ChromeHost {
    async fn remove_browsing_data(&self, options: &RemovalOptions, types: &DataTypeSet) -> HostResult<()> {
        browsing_data_remove(to_js(options)?, to_js(types)?)
            .await
            .map_err(|e| HostError::Deletion(js_error_text(&e)))?;
        Ok(())
    }
}

impl TabsApi for ChromeHost {
    async fn query_tabs(&self, url_pattern: Option<&str>) -> HostResult<Vec<TabInfo>> {
        let tabs = tabs_query(to_js(&TabQuery { url: url_pattern })?)
            .await
            .map_err(|e| HostError::Lookup(js_error_text(&e)))?;
        from_js(tabs)
    }

    async fn send_tab_message(&self, tab_id: i32, request: &ContentRequest) -> HostResult<ContentResponse> {
        let response = tabs_send_message(tab_id, to_js(request)?)
            .await
            .map_err(|e| HostError::Messaging(js_error_text(&e)))?;
        if response.is_undefined() || response.is_null() {
            return Err(HostError::Messaging(format!("No response from tab {}", tab_id)));
        }
        from_js(response)
    }
}

impl Clock for ChromeHost {
    fn now(&self) -> f64 {
        js_sys::Date::now()
    }

    async fn sleep(&self, ms: u32) {
        let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
        let promise = Promise::new(&mut |resolve, _reject| {
            set_timeout(&resolve, timeout);
        });
        let _ = JsFuture::from(promise).await;
    }
}

impl ChromeHost {
    /// Read the settings record; absent or unreadable records give defaults
    pub async fn load_settings(&self) -> ExtensionSettings {
        let stored = match storage_local_get(SETTINGS_KEY).await {
            Ok(items) => Reflect::get(&items, &JsValue::from_str(SETTINGS_KEY)).ok(),
            Err(e) => {
                log::warn!("Reading settings failed: {}", js_error_text(&e));
                None
            }
        };

        let value = stored
            .filter(|value| !value.is_undefined())
            .and_then(|value| from_js::<serde_json::Value>(value).ok());
        ExtensionSettings::from_stored(value)
    }

    pub async fn save_settings(&self, settings: &ExtensionSettings) -> HostResult<()> {
        let items = Object::new();
        Reflect::set(&items, &JsValue::from_str(SETTINGS_KEY), &to_js(settings)?)
            .map_err(|e| HostError::Storage(js_error_text(&e)))?;
        storage_local_set(items.into())
            .await
            .map_err(|e| HostError::Storage(js_error_text(&e)))?;
        Ok(())
    }

    /// Start a download with a save-as dialog
    pub async fn download(&self, url: &str, filename: &str) -> HostResult<()> {
        let options = DownloadOptions {
            url,
            filename,
            save_as: true,
        };
        downloads_download(to_js(&options)?)
            .await
            .map_err(|e| HostError::Download(js_error_text(&e)))?;
        Ok(())
    }

    pub async fn notify(&self, title: &str, message: &str) -> HostResult<()> {
        let options = NotificationOptions {
            kind: "basic",
            icon_url: "icons/icon48.png",
            title,
            message,
        };
        notifications_create(to_js(&options)?)
            .await
            .map_err(|e| HostError::Messaging(js_error_text(&e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_query_without_pattern_is_empty_object() {
        let json = serde_json::to_value(TabQuery { url: None }).unwrap();
        assert_eq!(json, serde_json::json!({}));

        let json = serde_json::to_value(TabQuery { url: Some("*://example.com/*") }).unwrap();
        assert_eq!(json, serde_json::json!({ "url": "*://example.com/*" }));
    }

    #[test]
    fn test_download_options_wire_format() {
        let options = DownloadOptions {
            url: "data:application/json,{}",
            filename: "export.json",
            save_as: true,
        };

        let json = serde_json::to_value(options).unwrap();

        assert_eq!(json["saveAs"], true);
        assert_eq!(json["filename"], "export.json");
    }
}
