/// Data structures for Site Data Cleaner
use serde::{Deserialize, Serialize};

/// A history entry as returned by `chrome.history.search`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub last_visit_time: f64,
    #[serde(default)]
    pub visit_count: u32,
}

/// The most recent visit seen for one hostname
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub domain: String,
    pub last_visit_time: f64,
    pub title: String,
    pub url: String,
}

/// A cookie snapshot from `chrome.cookies.getAll`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub expiration_date: Option<f64>,
    #[serde(default)]
    pub host_only: bool,
    #[serde(default)]
    pub session: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl Cookie {
    /// URL that addresses exactly this cookie for `chrome.cookies.remove`.
    ///
    /// Domain cookies are stored with a leading dot, which is not a valid host.
    pub fn removal_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        let host = self.domain.trim_start_matches('.');
        format!("{}://{}{}", scheme, host, self.path)
    }
}

/// A service worker registration reported by a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWorkerInfo {
    pub scope: String,
    #[serde(default, rename = "scriptURL")]
    pub script_url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub update_via_cache: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub waiting: bool,
    #[serde(default)]
    pub installing: bool,
    /// Set when the worker list was fetched for the detail panel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_at: Option<String>,
}

/// Kinds of removable data a site is believed to hold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    Cookies,
    ServiceWorker,
    LocalStorage,
    Cache,
}

impl DataType {
    pub fn tag(&self) -> &'static str {
        match self {
            DataType::Cookies => "cookies",
            DataType::ServiceWorker => "service-worker",
            DataType::LocalStorage => "local-storage",
            DataType::Cache => "cache",
        }
    }
}

/// A site with some removable trace, as shown in the site list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub domain: String,
    pub last_visit_time: f64,
    pub title: String,
    pub url: String,
    pub cookie_count: usize,
    pub cookies: Vec<Cookie>,
    pub service_workers: Vec<ServiceWorkerInfo>,
    pub service_worker_count: usize,
    pub visit_frequency: usize,
    pub data_types: Vec<DataType>,
}

/// Information about a browser tab
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabInfo {
    pub id: i32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl TabInfo {
    pub fn new(id: i32, url: String, title: String) -> TabInfo {
        TabInfo { id, url, title }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    #[serde(rename = "Service Worker")]
    ServiceWorker,
    #[serde(rename = "Web Worker")]
    WebWorker,
}

impl WorkerKind {
    pub fn label(&self) -> &'static str {
        match self {
            WorkerKind::ServiceWorker => "Service Worker",
            WorkerKind::WebWorker => "Web Worker",
        }
    }
}

/// A worker found in one of the open tabs
///
/// `id` is the scope for service workers and the script URL for web workers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WorkerKind,
    pub domain: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default, rename = "scriptURL")]
    pub script_url: Option<String>,
    pub state: String,
    pub tab_id: i32,
    pub tab_title: String,
    pub tab_url: String,
    pub timestamp: String,
}

/// One named cache in the page's Cache Storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheInfo {
    pub name: String,
    pub size: usize,
    /// First few cached request URLs
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KeySummary {
    pub count: usize,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    pub local_storage: KeySummary,
    pub session_storage: KeySummary,
}

/// A script tag that looks like it starts a worker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebWorkerScript {
    pub src: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Everything a content script can see about its page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SiteDataReport {
    pub domain: String,
    pub url: String,
    #[serde(default)]
    pub service_workers: Vec<ServiceWorkerInfo>,
    #[serde(default)]
    pub cache_storage: Vec<CacheInfo>,
    #[serde(default)]
    pub storage: StorageSummary,
    #[serde(default)]
    pub web_workers: Vec<WebWorkerScript>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_cookie(name: &str, domain: &str, secure: bool) -> Cookie {
        Cookie {
            name: name.to_string(),
            domain: domain.to_string(),
            path: "/account".to_string(),
            secure,
            http_only: false,
            expiration_date: None,
            host_only: false,
            session: true,
        }
    }

    #[test]
    fn test_cookie_removal_url() {
        let cookie = create_test_cookie("sid", "example.com", true);
        assert_eq!(cookie.removal_url(), "https://example.com/account");

        let cookie = create_test_cookie("sid", ".example.com", false);
        assert_eq!(cookie.removal_url(), "http://example.com/account");
    }

    #[test]
    fn test_cookie_from_host_json() {
        let json = r#"{
            "name": "sid",
            "value": "abc",
            "domain": ".example.com",
            "path": "/",
            "secure": true,
            "httpOnly": true,
            "hostOnly": false,
            "session": false,
            "expirationDate": 1767225600.5,
            "storeId": "0"
        }"#;

        let cookie: Cookie = serde_json::from_str(json).unwrap();

        assert_eq!(cookie.name, "sid");
        assert_eq!(cookie.domain, ".example.com");
        assert!(cookie.http_only);
        assert_eq!(cookie.expiration_date, Some(1767225600.5));
    }

    #[test]
    fn test_worker_record_serialization() {
        let record = WorkerRecord {
            id: "https://app.example.com/".to_string(),
            kind: WorkerKind::ServiceWorker,
            domain: "app.example.com".to_string(),
            scope: Some("https://app.example.com/".to_string()),
            script_url: Some("https://app.example.com/sw.js".to_string()),
            state: "activated".to_string(),
            tab_id: 7,
            tab_title: "App".to_string(),
            tab_url: "https://app.example.com/home".to_string(),
            timestamp: "2024-10-28T10:30:00.000Z".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["type"], "Service Worker");
        assert_eq!(json["scriptURL"], "https://app.example.com/sw.js");
        assert_eq!(json["tabId"], 7);
    }

    #[test]
    fn test_site_report_tolerates_missing_lists() {
        let json = r#"{
            "domain": "example.com",
            "url": "https://example.com/",
            "timestamp": "2024-10-28T10:30:00.000Z"
        }"#;

        let report: SiteDataReport = serde_json::from_str(json).unwrap();

        assert!(report.service_workers.is_empty());
        assert!(report.web_workers.is_empty());
        assert_eq!(report.storage.local_storage.count, 0);
    }

    #[test]
    fn test_data_type_tags() {
        let tags: Vec<&str> = [DataType::Cookies, DataType::ServiceWorker, DataType::LocalStorage, DataType::Cache]
            .iter()
            .map(|t| t.tag())
            .collect();

        assert_eq!(tags, vec!["cookies", "service-worker", "local-storage", "cache"]);
        assert_eq!(serde_json::to_string(&DataType::ServiceWorker).unwrap(), "\"service-worker\"");
    }
}
