/// Background service worker: install defaults and the page context menu
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::chrome::{
    ChromeHost, add_context_menu_listener, add_installed_listener, context_menus_create, from_js, js_error_text, to_js,
};
use crate::deletion::{DataCategories, clear_site_data};
use crate::domain::{extract_hostname, is_valid_domain};
use crate::error::HostResult;
use crate::host::BrowsingDataApi;
use crate::i18n::{Lang, site_deleted};
use crate::settings::ExtensionSettings;

pub const CONTEXT_MENU_ID: &str = "removeCookieForSite";

const CONTEXT_MENU_TITLE: &str = "Delete this site's data";

const NOTIFICATION_TITLE: &str = "Site Data Cleaner";

#[derive(Debug, Deserialize)]
struct InstallDetails {
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuClick {
    #[serde(default)]
    menu_item_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClickedTab {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct MenuProperties<'a> {
    id: &'a str,
    title: &'a str,
    contexts: &'a [&'a str],
}

/// Whether an install event should write default settings
pub fn is_first_install(reason: &str) -> bool {
    reason == "install"
}

/// Host whose data a context-menu click deletes, if the click is ours
pub fn context_menu_target(menu_item_id: Option<&str>, tab_url: Option<&str>) -> Option<String> {
    if menu_item_id != Some(CONTEXT_MENU_ID) {
        return None;
    }
    tab_url
        .and_then(extract_hostname)
        .filter(|domain| is_valid_domain(domain))
}

/// Delete every category for the page's host; history is left alone
pub async fn delete_page_data<H: BrowsingDataApi>(host: &H, domain: &str) -> HostResult<()> {
    clear_site_data(host, domain, DataCategories::all()).await?;
    info!("Deleted data for {} from the context menu", domain);
    Ok(())
}

async fn on_installed(details: JsValue) {
    let reason = from_js::<InstallDetails>(details)
        .map(|details| details.reason)
        .unwrap_or_default();
    info!("Extension installed/updated: {}", reason);

    if is_first_install(&reason) {
        if let Err(e) = ChromeHost.save_settings(&ExtensionSettings::new()).await {
            warn!("Saving default settings failed: {}", e);
        }
    }

    let properties = MenuProperties {
        id: CONTEXT_MENU_ID,
        title: CONTEXT_MENU_TITLE,
        contexts: &["page"],
    };
    match to_js(&properties) {
        Ok(properties) => {
            if let Err(e) = context_menus_create(properties) {
                warn!("Creating context menu failed: {}", js_error_text(&e));
            }
        }
        Err(e) => warn!("Creating context menu failed: {}", e),
    }
}

async fn on_menu_clicked(info: JsValue, tab: JsValue) {
    let menu_item_id = from_js::<MenuClick>(info).ok().and_then(|click| click.menu_item_id);
    let tab_url = from_js::<Option<ClickedTab>>(tab).ok().flatten().and_then(|tab| tab.url);

    let Some(domain) = context_menu_target(menu_item_id.as_deref(), tab_url.as_deref()) else {
        debug!("Ignoring context menu click on {:?}", tab_url);
        return;
    };

    let host = ChromeHost;
    if let Err(e) = delete_page_data(&host, &domain).await {
        warn!("Context menu deletion for {} failed: {}", domain, e);
        return;
    }

    if host.load_settings().await.show_notifications {
        let message = site_deleted(Lang::detect(), &domain);
        if let Err(e) = host.notify(NOTIFICATION_TITLE, &message).await {
            warn!("Notification failed: {}", e);
        }
    }
}

/// Register the background listeners
pub fn start() {
    let installed = Closure::<dyn FnMut(JsValue)>::new(|details: JsValue| {
        spawn_local(on_installed(details));
    });
    add_installed_listener(&installed);
    installed.forget();

    let clicked = Closure::<dyn FnMut(JsValue, JsValue)>::new(|info: JsValue, tab: JsValue| {
        spawn_local(on_menu_clicked(info, tab));
    });
    add_context_menu_listener(&clicked);
    clicked.forget();

    info!("Site data background script loaded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use futures::executor::block_on;

    #[test]
    fn test_is_first_install() {
        assert!(is_first_install("install"));
        assert!(!is_first_install("update"));
        assert!(!is_first_install(""));
    }

    #[test]
    fn test_context_menu_target() {
        assert_eq!(
            context_menu_target(Some(CONTEXT_MENU_ID), Some("https://Shop.Example.com/cart?id=1")),
            Some("shop.example.com".to_string())
        );
        assert_eq!(context_menu_target(Some("other"), Some("https://example.com/")), None);
        assert_eq!(context_menu_target(Some(CONTEXT_MENU_ID), None), None);
        assert_eq!(context_menu_target(None, Some("https://example.com/")), None);
    }

    #[test]
    fn test_delete_page_data_removes_all_categories() {
        let host = FakeHost::new();

        block_on(delete_page_data(&host, "example.com")).unwrap();

        let removals = host.removals();
        assert_eq!(removals.len(), 1);
        let (options, types) = &removals[0];
        assert_eq!(options.origins().len(), 4);
        assert_eq!(types, &DataCategories::all().to_data_types());
        assert!(types.cookies);
        assert!(!types.history);
    }

    #[test]
    fn test_menu_properties_wire_format() {
        let properties = MenuProperties {
            id: CONTEXT_MENU_ID,
            title: CONTEXT_MENU_TITLE,
            contexts: &["page"],
        };

        let json = serde_json::to_value(properties).unwrap();

        assert_eq!(json["id"], "removeCookieForSite");
        assert_eq!(json["contexts"], serde_json::json!(["page"]));
    }
}
