/// In-memory browser host for exercising the async operations in unit tests
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::domain::extract_hostname;
use crate::error::{HostError, HostResult};
use crate::host::{BrowsingDataApi, Clock, CookieApi, DataTypeSet, HistoryApi, HistoryQuery, RemovalOptions, TabsApi};
use crate::messages::{ContentRequest, ContentResponse};
use crate::site_data::{Cookie, HistoryItem, ServiceWorkerInfo, TabInfo};

pub const NOW: f64 = 1_700_000_000_000.0;

/// A host call as the fake saw it
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    SearchHistory(HistoryQuery),
    GetCookies(String),
    RemoveCookie { url: String, name: String },
    RemoveBrowsingData { options: RemovalOptions, types: DataTypeSet },
    QueryTabs(Option<String>),
    SendTabMessage { tab_id: i32, request: ContentRequest },
    Sleep(u32),
}

pub struct FakeHost {
    pub now: f64,
    pub history: Vec<HistoryItem>,
    pub history_error: Option<String>,
    /// Keyed by the exact `domain` argument (`example.com` or `.example.com`)
    pub cookies: HashMap<String, Vec<Cookie>>,
    pub failing_cookie_queries: HashSet<String>,
    pub tabs: Vec<TabInfo>,
    /// Tabs without an entry behave like tabs with no content script
    pub tab_responses: HashMap<i32, ContentResponse>,
    /// Domains whose origin-scoped removal is rejected
    pub failing_deletions: HashSet<String>,
    calls: RefCell<Vec<HostCall>>,
}

impl FakeHost {
    pub fn new() -> Self {
        FakeHost {
            now: NOW,
            history: Vec::new(),
            history_error: None,
            cookies: HashMap::new(),
            failing_cookie_queries: HashSet::new(),
            tabs: Vec::new(),
            tab_responses: HashMap::new(),
            failing_deletions: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_visit(mut self, url: &str, minutes_ago: f64) -> Self {
        self.history.push(HistoryItem {
            url: url.to_string(),
            title: Some(format!("Page {}", url)),
            last_visit_time: self.now - minutes_ago * 60_000.0,
            visit_count: 1,
        });
        self
    }

    pub fn with_cookies(mut self, query_domain: &str, cookies: Vec<Cookie>) -> Self {
        self.cookies.insert(query_domain.to_string(), cookies);
        self
    }

    pub fn with_tab(mut self, id: i32, url: &str, response: Option<ContentResponse>) -> Self {
        self.tabs.push(TabInfo::new(id, url.to_string(), format!("Tab {}", id)));
        if let Some(response) = response {
            self.tab_responses.insert(id, response);
        }
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    pub fn cookie_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::GetCookies(domain) => Some(domain),
                _ => None,
            })
            .collect()
    }

    pub fn removals(&self) -> Vec<(RemovalOptions, DataTypeSet)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::RemoveBrowsingData { options, types } => Some((options, types)),
                _ => None,
            })
            .collect()
    }

    pub fn cookie_removals(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::RemoveCookie { url, name } => Some((url, name)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl HistoryApi for FakeHost {
    async fn search_history(&self, query: &HistoryQuery) -> HostResult<Vec<HistoryItem>> {
        self.record(HostCall::SearchHistory(query.clone()));
        if let Some(error) = &self.history_error {
            return Err(HostError::Lookup(error.clone()));
        }
        Ok(self
            .history
            .iter()
            .filter(|item| item.last_visit_time >= query.start_time)
            .filter(|item| query.text.is_empty() || item.url.contains(&query.text))
            .take(query.max_results as usize)
            .cloned()
            .collect())
    }
}

impl CookieApi for FakeHost {
    async fn get_cookies(&self, domain: &str) -> HostResult<Vec<Cookie>> {
        self.record(HostCall::GetCookies(domain.to_string()));
        if self.failing_cookie_queries.contains(domain) {
            return Err(HostError::Lookup(format!("cookies for {}", domain)));
        }
        Ok(self.cookies.get(domain).cloned().unwrap_or_default())
    }

    async fn remove_cookie(&self, url: &str, name: &str) -> HostResult<()> {
        self.record(HostCall::RemoveCookie {
            url: url.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }
}

impl BrowsingDataApi for FakeHost {
    async fn remove_browsing_data(&self, options: &RemovalOptions, types: &DataTypeSet) -> HostResult<()> {
        self.record(HostCall::RemoveBrowsingData {
            options: options.clone(),
            types: types.clone(),
        });
        let rejected = self
            .failing_deletions
            .iter()
            .any(|domain| options.origins().contains(&format!("https://{}", domain)));
        if rejected {
            return Err(HostError::Deletion("removal rejected".to_string()));
        }
        Ok(())
    }
}

impl TabsApi for FakeHost {
    async fn query_tabs(&self, url_pattern: Option<&str>) -> HostResult<Vec<TabInfo>> {
        self.record(HostCall::QueryTabs(url_pattern.map(str::to_string)));
        let host_filter = url_pattern.map(|pattern| {
            pattern
                .trim_start_matches("*://")
                .trim_end_matches("/*")
                .to_string()
        });
        Ok(self
            .tabs
            .iter()
            .filter(|tab| match &host_filter {
                Some(host) => extract_hostname(&tab.url).as_deref() == Some(host.as_str()),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn send_tab_message(&self, tab_id: i32, request: &ContentRequest) -> HostResult<ContentResponse> {
        self.record(HostCall::SendTabMessage {
            tab_id,
            request: request.clone(),
        });
        self.tab_responses
            .get(&tab_id)
            .cloned()
            .ok_or_else(|| HostError::Messaging("Receiving end does not exist.".to_string()))
    }
}

impl Clock for FakeHost {
    fn now(&self) -> f64 {
        self.now
    }

    async fn sleep(&self, ms: u32) {
        self.record(HostCall::Sleep(ms));
    }
}

pub fn create_test_cookie(name: &str, domain: &str) -> Cookie {
    Cookie {
        name: name.to_string(),
        domain: domain.to_string(),
        path: "/".to_string(),
        secure: true,
        http_only: false,
        expiration_date: None,
        host_only: !domain.starts_with('.'),
        session: true,
    }
}

pub fn create_test_service_worker(scope: &str) -> ServiceWorkerInfo {
    ServiceWorkerInfo {
        scope: scope.to_string(),
        script_url: Some(format!("{}sw.js", scope)),
        state: Some("activated".to_string()),
        active: true,
        ..Default::default()
    }
}
