/// Per-site lookups: cookies, visit frequency and service workers
use std::collections::HashSet;

use futures::join;
use log::{debug, warn};

use crate::dates::iso_timestamp;
use crate::domain::{DAY_MS, HISTORY_LOOKBACK_MS, tab_pattern, url_matches_domain};
use crate::host::{BrowserHost, Clock, CookieApi, HistoryApi, HistoryQuery, TabsApi};
use crate::messages::ContentRequest;
use crate::site_data::{Cookie, DataType, DomainRecord, HistoryItem, ServiceWorkerInfo, SiteEntry};

/// A visit inside this window counts as recent
pub const RECENT_VISIT_MS: f64 = 7.0 * DAY_MS;

/// More visits than this count as frequent
pub const FREQUENT_VISIT_THRESHOLD: usize = 3;

const VISIT_SEARCH_LIMIT: u32 = 50;
const DETAIL_VISIT_LIMIT: u32 = 20;

/// Merge exact-domain and dot-domain cookie lists, first `(name, domain)` wins
pub fn merge_cookies(exact: Vec<Cookie>, dotted: Vec<Cookie>) -> Vec<Cookie> {
    let mut seen: HashSet<(String, String)> = HashSet::new();

    exact
        .into_iter()
        .chain(dotted)
        .filter(|cookie| seen.insert((cookie.name.clone(), cookie.domain.clone())))
        .collect()
}

/// Cookies set for `domain` itself and for `.domain`
///
/// Each of the two queries degrades to an empty list on its own.
pub async fn cookies_for_domain<H: CookieApi>(host: &H, domain: &str) -> Vec<Cookie> {
    let dotted = format!(".{}", domain);
    let (exact, subdomains) = join!(host.get_cookies(domain), host.get_cookies(&dotted));

    let exact = exact.unwrap_or_else(|e| {
        warn!("Cookie lookup for {} failed: {}", domain, e);
        Vec::new()
    });
    let subdomains = subdomains.unwrap_or_else(|e| {
        warn!("Cookie lookup for {} failed: {}", dotted, e);
        Vec::new()
    });

    merge_cookies(exact, subdomains)
}

/// History entries in the lookback window whose host is exactly `domain`
async fn matching_visits<H: HistoryApi + Clock>(host: &H, domain: &str, max_results: u32) -> Vec<HistoryItem> {
    let query = HistoryQuery {
        text: domain.to_string(),
        max_results,
        start_time: host.now() - HISTORY_LOOKBACK_MS,
    };

    match host.search_history(&query).await {
        Ok(items) => items
            .into_iter()
            .filter(|item| url_matches_domain(&item.url, domain))
            .collect(),
        Err(e) => {
            warn!("Visit lookup for {} failed: {}", domain, e);
            Vec::new()
        }
    }
}

/// Number of recent history entries on exactly this host
pub async fn visit_frequency<H: HistoryApi + Clock>(host: &H, domain: &str) -> usize {
    matching_visits(host, domain, VISIT_SEARCH_LIMIT).await.len()
}

/// Service worker registrations for a domain, read through an open tab
///
/// Only a page on the domain can enumerate its registrations, so a domain with
/// no open tab reports none.
pub async fn service_workers_for_domain<H: TabsApi>(host: &H, domain: &str) -> Vec<ServiceWorkerInfo> {
    let pattern = tab_pattern(domain);
    let tabs = match host.query_tabs(Some(&pattern)).await {
        Ok(tabs) => tabs,
        Err(e) => {
            warn!("Tab lookup for {} failed: {}", domain, e);
            return Vec::new();
        }
    };

    let Some(tab) = tabs.first() else {
        return Vec::new();
    };

    match host.send_tab_message(tab.id, &ContentRequest::GetServiceWorkers).await {
        Ok(response) => response.service_workers,
        Err(e) => {
            debug!("No service worker report from tab {}: {}", tab.id, e);
            Vec::new()
        }
    }
}

pub fn has_frequent_visits(visit_frequency: usize) -> bool {
    visit_frequency > FREQUENT_VISIT_THRESHOLD
}

pub fn is_recent_visit(last_visit_time: f64, now: f64) -> bool {
    now - last_visit_time < RECENT_VISIT_MS
}

/// Whether a site has anything worth showing
///
/// Cookies or service workers always qualify. Without them, only a site visited
/// frequently and recently is listed.
pub fn should_include(
    cookie_count: usize,
    service_worker_count: usize,
    visit_frequency: usize,
    last_visit_time: f64,
    now: f64,
) -> bool {
    cookie_count > 0
        || service_worker_count > 0
        || (has_frequent_visits(visit_frequency) && is_recent_visit(last_visit_time, now))
}

/// Data type tags for a site
///
/// Local storage and cache of a background origin cannot be probed from the
/// extension, so frequent visits stand in for both.
pub fn data_types(cookie_count: usize, service_worker_count: usize, frequent_visits: bool) -> Vec<DataType> {
    let mut types = Vec::new();
    if cookie_count > 0 {
        types.push(DataType::Cookies);
    }
    if service_worker_count > 0 {
        types.push(DataType::ServiceWorker);
    }
    if frequent_visits {
        types.push(DataType::LocalStorage);
        types.push(DataType::Cache);
    }
    types
}

/// Look up one domain and build its site entry, if it has any removable trace
pub async fn fetch_site<H: BrowserHost>(host: &H, record: &DomainRecord) -> Option<SiteEntry> {
    let (cookies, visit_frequency, service_workers) = join!(
        cookies_for_domain(host, &record.domain),
        visit_frequency(host, &record.domain),
        service_workers_for_domain(host, &record.domain)
    );

    let cookie_count = cookies.len();
    let service_worker_count = service_workers.len();

    if !should_include(cookie_count, service_worker_count, visit_frequency, record.last_visit_time, host.now()) {
        return None;
    }

    Some(SiteEntry {
        domain: record.domain.clone(),
        last_visit_time: record.last_visit_time,
        title: record.title.clone(),
        url: record.url.clone(),
        cookie_count,
        cookies,
        service_workers,
        service_worker_count,
        visit_frequency,
        data_types: data_types(cookie_count, service_worker_count, has_frequent_visits(visit_frequency)),
    })
}

/// Everything the detail panel shows for one site
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiteDetail {
    pub cookies: Vec<Cookie>,
    /// Newest first
    pub visits: Vec<HistoryItem>,
    pub service_workers: Vec<ServiceWorkerInfo>,
}

pub async fn fetch_site_detail<H: BrowserHost>(host: &H, domain: &str) -> SiteDetail {
    let (cookies, mut visits, service_workers) = join!(
        cookies_for_domain(host, domain),
        matching_visits(host, domain, DETAIL_VISIT_LIMIT),
        service_workers_for_domain(host, domain)
    );

    visits.sort_by(|a, b| b.last_visit_time.total_cmp(&a.last_visit_time));

    let detected_at = iso_timestamp(host.now());
    let service_workers = service_workers
        .into_iter()
        .map(|worker| ServiceWorkerInfo {
            domain: Some(domain.to_string()),
            detected_at: Some(detected_at.clone()),
            ..worker
        })
        .collect();

    SiteDetail {
        cookies,
        visits,
        service_workers,
    }
}
