/// Content script: inspects the page it runs in and answers extension requests
use js_sys::{Array, Function, Reflect};
use log::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Cache, CacheStorage, CustomEvent, CustomEventInit, HtmlScriptElement, Request, ServiceWorker,
    ServiceWorkerRegistration, ServiceWorkerState, Storage, Window,
};

use crate::chrome::{add_message_listener, js_error_text, to_js};
use crate::dates::iso_timestamp;
use crate::messages::{ContentRequest, ContentResponse};
use crate::site_data::{CacheInfo, KeySummary, ServiceWorkerInfo, SiteDataReport, StorageSummary, WebWorkerScript};

/// Cached request URLs listed per cache
const CACHE_URL_SAMPLE: usize = 5;

/// Storage keys listed per storage area
const STORAGE_KEY_SAMPLE: usize = 10;

const WORKER_SCRIPT_KIND: &str = "detected-worker-script";

/// Event dispatched on `document` to ask the page to stop one of its workers
pub const TERMINATE_EVENT: &str = "terminateWorker";

/// Next step of a termination request once service workers were checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateStep {
    /// A matching registration was unregistered
    Done,
    /// Nothing was unregistered; ask the page to stop the worker
    DispatchEvent,
}

/// Decide from the unregister attempt; a failed attempt still notifies the page
pub fn step_after_unregister<E>(attempt: &Result<bool, E>) -> TerminateStep {
    match attempt {
        Ok(true) => TerminateStep::Done,
        Ok(false) | Err(_) => TerminateStep::DispatchEvent,
    }
}

/// Whether a script source looks like it starts a worker
pub fn is_worker_script(src: &str) -> bool {
    src.contains("worker") || src.contains("sw.js") || src.contains("service-worker")
}

/// Registrations are attributed to the page when their scope names its host
pub fn scope_belongs_to_host(scope: &str, hostname: &str) -> bool {
    !hostname.is_empty() && scope.contains(hostname)
}

/// Whether a termination request names this registration
pub fn registration_matches(scope: &str, active_script: Option<&str>, worker_id: &str) -> bool {
    scope == worker_id || active_script == Some(worker_id)
}

fn state_name(state: ServiceWorkerState) -> &'static str {
    match state {
        ServiceWorkerState::Parsed => "parsed",
        ServiceWorkerState::Installing => "installing",
        ServiceWorkerState::Installed => "installed",
        ServiceWorkerState::Activating => "activating",
        ServiceWorkerState::Activated => "activated",
        ServiceWorkerState::Redundant => "redundant",
        _ => "unknown",
    }
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window"))
}

fn page_hostname(window: &Window) -> String {
    window.location().hostname().unwrap_or_default().to_lowercase()
}

async fn registrations(window: &Window) -> Result<Vec<ServiceWorkerRegistration>, JsValue> {
    let navigator = window.navigator();
    if !Reflect::has(&navigator, &JsValue::from_str("serviceWorker"))? {
        return Ok(Vec::new());
    }

    let list = JsFuture::from(navigator.service_worker().get_registrations()).await?;
    Ok(Array::from(&list)
        .iter()
        .map(|registration| registration.unchecked_into::<ServiceWorkerRegistration>())
        .collect())
}

fn describe_registration(registration: &ServiceWorkerRegistration) -> ServiceWorkerInfo {
    let active = registration.active();
    let waiting = registration.waiting();
    let installing = registration.installing();

    // The most advanced worker speaks for the registration
    let current: Option<&ServiceWorker> = active.as_ref().or(waiting.as_ref()).or(installing.as_ref());

    ServiceWorkerInfo {
        scope: registration.scope(),
        script_url: current.map(|worker| worker.script_url()),
        state: current.map(|worker| state_name(worker.state()).to_string()),
        update_via_cache: Reflect::get(registration, &JsValue::from_str("updateViaCache"))
            .ok()
            .and_then(|value| value.as_string()),
        active: active.is_some(),
        waiting: waiting.is_some(),
        installing: installing.is_some(),
        ..Default::default()
    }
}

async fn service_workers(window: &Window) -> Result<Vec<ServiceWorkerInfo>, JsValue> {
    let hostname = page_hostname(window);
    Ok(registrations(window)
        .await?
        .iter()
        .map(describe_registration)
        .filter(|info| scope_belongs_to_host(&info.scope, &hostname))
        .collect())
}

async fn cache_info(caches: &CacheStorage, name: String) -> Result<CacheInfo, JsValue> {
    let cache: Cache = JsFuture::from(caches.open(&name)).await?.unchecked_into();
    let requests = Array::from(&JsFuture::from(cache.keys()).await?);

    let urls = requests
        .iter()
        .take(CACHE_URL_SAMPLE)
        .map(|request| request.unchecked_into::<Request>().url())
        .collect();

    Ok(CacheInfo {
        name,
        size: requests.length() as usize,
        urls,
    })
}

async fn cache_storage(window: &Window) -> Result<Vec<CacheInfo>, JsValue> {
    let caches = window.caches()?;
    let names = Array::from(&JsFuture::from(caches.keys()).await?);

    let mut infos = Vec::new();
    for name in names.iter().filter_map(|name| name.as_string()) {
        match cache_info(&caches, name.clone()).await {
            Ok(info) => infos.push(info),
            Err(e) => warn!("Reading cache {} failed: {}", name, js_error_text(&e)),
        }
    }
    Ok(infos)
}

fn summarize_storage(storage: Option<Storage>) -> KeySummary {
    let Some(storage) = storage else {
        return KeySummary::default();
    };

    let count = storage.length().unwrap_or(0);
    let keys = (0..count.min(STORAGE_KEY_SAMPLE as u32))
        .filter_map(|index| storage.key(index).ok().flatten())
        .collect();

    KeySummary {
        count: count as usize,
        keys,
    }
}

fn storage_summary(window: &Window) -> StorageSummary {
    StorageSummary {
        local_storage: summarize_storage(window.local_storage().ok().flatten()),
        session_storage: summarize_storage(window.session_storage().ok().flatten()),
    }
}

fn web_worker_scripts(window: &Window) -> Vec<WebWorkerScript> {
    let Some(document) = window.document() else {
        return Vec::new();
    };
    let Ok(scripts) = document.query_selector_all("script[src]") else {
        return Vec::new();
    };

    (0..scripts.length())
        .filter_map(|index| scripts.get(index))
        .filter_map(|node| node.dyn_into::<HtmlScriptElement>().ok())
        .map(|script| script.src())
        .filter(|src| is_worker_script(src))
        .map(|src| WebWorkerScript {
            src,
            kind: WORKER_SCRIPT_KIND.to_string(),
        })
        .collect()
}

/// Everything this page exposes; failing sources are left empty
pub async fn collect_site_data() -> SiteDataReport {
    let timestamp = iso_timestamp(js_sys::Date::now());
    let window = match window() {
        Ok(window) => window,
        Err(e) => {
            return SiteDataReport {
                timestamp,
                error: Some(js_error_text(&e)),
                ..Default::default()
            };
        }
    };

    let service_workers = service_workers(&window).await.unwrap_or_else(|e| {
        warn!("Reading service workers failed: {}", js_error_text(&e));
        Vec::new()
    });
    let cache_storage = cache_storage(&window).await.unwrap_or_else(|e| {
        warn!("Reading cache storage failed: {}", js_error_text(&e));
        Vec::new()
    });

    SiteDataReport {
        domain: page_hostname(&window),
        url: window.location().href().unwrap_or_default(),
        service_workers,
        cache_storage,
        storage: storage_summary(&window),
        web_workers: web_worker_scripts(&window),
        timestamp,
        error: None,
    }
}

fn dispatch_terminate_event(window: &Window, worker_id: &str) -> Result<(), JsValue> {
    let detail = js_sys::Object::new();
    Reflect::set(&detail, &JsValue::from_str("workerId"), &JsValue::from_str(worker_id))?;

    let init = CustomEventInit::new();
    init.set_detail(&detail);
    let event = CustomEvent::new_with_event_init_dict(TERMINATE_EVENT, &init)?;

    let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;
    document.dispatch_event(&event)?;
    Ok(())
}

/// Unregister the service worker named by `worker_id`, if this page has one
async fn unregister_matching(window: &Window, worker_id: &str) -> Result<bool, JsValue> {
    for registration in registrations(window).await? {
        let active_script = registration.active().map(|worker| worker.script_url());
        if registration_matches(&registration.scope(), active_script.as_deref(), worker_id) {
            JsFuture::from(registration.unregister()?).await?;
            info!("Unregistered service worker {}", worker_id);
            return Ok(true);
        }
    }
    Ok(false)
}

async fn terminate_worker(worker_id: &str) -> Result<ContentResponse, JsValue> {
    let window = window()?;

    let attempt = unregister_matching(&window, worker_id).await;
    if let Err(e) = &attempt {
        warn!("Service worker unregister for {} failed: {}", worker_id, js_error_text(e));
    }
    if step_after_unregister(&attempt) == TerminateStep::Done {
        return Ok(ContentResponse::done("Service Worker unregistered"));
    }

    dispatch_terminate_event(&window, worker_id)?;
    debug!("Asked page to stop worker {}", worker_id);
    Ok(ContentResponse::done("Worker termination event dispatched"))
}

/// Answer one request from the extension
pub async fn handle_request(request: ContentRequest) -> ContentResponse {
    match request {
        ContentRequest::GetAllSiteData => ContentResponse::site_data(collect_site_data().await),
        ContentRequest::GetServiceWorkers => {
            let result = match window() {
                Ok(window) => service_workers(&window).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(workers) => ContentResponse::service_workers(workers),
                Err(e) => ContentResponse::failed(&js_error_text(&e)),
            }
        }
        ContentRequest::TerminateWorker { worker_id } => match terminate_worker(&worker_id).await {
            Ok(response) => response,
            Err(e) => ContentResponse::failed(&js_error_text(&e)),
        },
    }
}

fn reply(send_response: &Function, response: &ContentResponse) {
    let sent = to_js(response)
        .map_err(|e| JsValue::from_str(&e.to_string()))
        .and_then(|value| send_response.call1(&JsValue::NULL, &value));
    if let Err(e) = sent {
        warn!("Replying to extension failed: {}", js_error_text(&e));
    }
}

/// Install the message listener; replies are sent asynchronously
pub fn start() {
    let listener = Closure::<dyn FnMut(JsValue, JsValue, Function) -> bool>::new(
        move |message: JsValue, _sender: JsValue, send_response: Function| {
            match serde_wasm_bindgen::from_value::<ContentRequest>(message) {
                Ok(request) => {
                    spawn_local(async move {
                        let response = handle_request(request).await;
                        reply(&send_response, &response);
                    });
                }
                Err(e) => {
                    debug!("Ignoring message: {:?}", e);
                    reply(&send_response, &ContentResponse::failed("Unknown action"));
                }
            }
            true
        },
    );
    add_message_listener(&listener);
    listener.forget();

    info!("Site data content script ready");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_worker_script() {
        assert!(is_worker_script("https://example.com/js/worker.bundle.js"));
        assert!(is_worker_script("https://example.com/sw.js"));
        assert!(is_worker_script("https://example.com/service-worker-v2.js"));
        assert!(!is_worker_script("https://example.com/app.js"));
        assert!(!is_worker_script(""));
    }

    #[test]
    fn test_scope_belongs_to_host() {
        assert!(scope_belongs_to_host("https://app.example.com/", "app.example.com"));
        assert!(!scope_belongs_to_host("https://cdn.other.com/", "app.example.com"));
        assert!(!scope_belongs_to_host("https://app.example.com/", ""));
    }

    #[test]
    fn test_failed_unregister_still_notifies_page() {
        let failed: Result<bool, String> = Err("storage blocked".to_string());
        assert_eq!(step_after_unregister(&failed), TerminateStep::DispatchEvent);

        let no_match: Result<bool, String> = Ok(false);
        assert_eq!(step_after_unregister(&no_match), TerminateStep::DispatchEvent);

        let removed: Result<bool, String> = Ok(true);
        assert_eq!(step_after_unregister(&removed), TerminateStep::Done);
    }

    #[test]
    fn test_registration_matches_scope_or_script() {
        let scope = "https://app.example.com/";
        let script = Some("https://app.example.com/sw.js");

        assert!(registration_matches(scope, script, "https://app.example.com/"));
        assert!(registration_matches(scope, script, "https://app.example.com/sw.js"));
        assert!(!registration_matches(scope, script, "https://app.example.com/worker.js"));
        assert!(!registration_matches(scope, None, "https://app.example.com/sw.js"));
    }
}
