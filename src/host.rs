//! Host browser capabilities the coordination logic is written against
//!
//! `chrome::ChromeHost` implements these over the extension APIs; tests use an
//! in-memory fake. Everything runs on one cooperative thread, so the futures
//! returned here are not required to be `Send`.
#![allow(async_fn_in_trait)]

use serde::Serialize;

use crate::error::HostResult;
use crate::messages::{ContentRequest, ContentResponse};
use crate::site_data::{Cookie, HistoryItem, TabInfo};

/// Arguments for `chrome.history.search`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub text: String,
    pub max_results: u32,
    pub start_time: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OriginTypes {
    unprotected_web: bool,
    protected_web: bool,
    extension: bool,
}

impl OriginTypes {
    /// Ordinary web origins only; hosted apps and extensions are never touched
    fn unprotected_web() -> Self {
        OriginTypes {
            unprotected_web: true,
            protected_web: false,
            extension: false,
        }
    }
}

/// Scope of a `chrome.browsingData.remove` call
///
/// Either a list of origins (always limited to unprotected web origins) or a
/// start time, never both.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemovalOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_types: Option<OriginTypes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<f64>,
}

impl RemovalOptions {
    pub fn for_origins(origins: Vec<String>) -> Self {
        RemovalOptions {
            origins: Some(origins),
            origin_types: Some(OriginTypes::unprotected_web()),
            since: None,
        }
    }

    pub fn since(since: f64) -> Self {
        RemovalOptions {
            origins: None,
            origin_types: None,
            since: Some(since),
        }
    }

    pub fn origins(&self) -> &[String] {
        self.origins.as_deref().unwrap_or(&[])
    }

    pub fn since_time(&self) -> Option<f64> {
        self.since
    }
}

/// Data categories for `chrome.browsingData.remove`
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataTypeSet {
    pub cookies: bool,
    pub local_storage: bool,
    #[serde(rename = "indexedDB")]
    pub indexed_db: bool,
    pub cache: bool,
    pub cache_storage: bool,
    pub service_workers: bool,
    #[serde(rename = "webSQL")]
    pub web_sql: bool,
    pub history: bool,
}

/// `chrome.history`
pub trait HistoryApi {
    async fn search_history(&self, query: &HistoryQuery) -> HostResult<Vec<HistoryItem>>;
}

/// `chrome.cookies`
pub trait CookieApi {
    async fn get_cookies(&self, domain: &str) -> HostResult<Vec<Cookie>>;
    async fn remove_cookie(&self, url: &str, name: &str) -> HostResult<()>;
}

/// `chrome.browsingData`
pub trait BrowsingDataApi {
    async fn remove_browsing_data(&self, options: &RemovalOptions, types: &DataTypeSet) -> HostResult<()>;
}

/// `chrome.tabs`
pub trait TabsApi {
    /// All tabs, or only those matching a `*://host/*` style pattern
    async fn query_tabs(&self, url_pattern: Option<&str>) -> HostResult<Vec<TabInfo>>;
    async fn send_tab_message(&self, tab_id: i32, request: &ContentRequest) -> HostResult<ContentResponse>;
}

/// Wall clock and timer
pub trait Clock {
    /// Milliseconds since the Unix epoch
    fn now(&self) -> f64;
    async fn sleep(&self, ms: u32);
}

/// Everything the site and worker operations need from the browser
pub trait BrowserHost: HistoryApi + CookieApi + BrowsingDataApi + TabsApi + Clock {}

impl<T> BrowserHost for T where T: HistoryApi + CookieApi + BrowsingDataApi + TabsApi + Clock {}
